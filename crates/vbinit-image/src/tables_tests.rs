use crate::{
    ConditionEntry, ImageError, IoConditionEntry, IoFlagConditionEntry, MacroEntry,
    ProgramImage, TableDirectory, TableId,
};

fn image_with(bytes: Vec<u8>, dir: TableDirectory) -> ProgramImage {
    ProgramImage::with_tables(bytes, dir)
}

#[test]
fn zero_offsets_are_not_recorded() {
    let dir = TableDirectory::new()
        .with(TableId::Conditions, 0x10)
        .with(TableId::Macros, 0);

    assert!(dir.contains(TableId::Conditions));
    assert!(!dir.contains(TableId::Macros));
    assert_eq!(dir.len(), 1);
}

#[test]
fn directory_keeps_insertion_order() {
    let dir = TableDirectory::new()
        .with(TableId::Xlat, 0x30)
        .with(TableId::InitScripts, 0x10)
        .with(TableId::Conditions, 0x20);

    let ids: Vec<_> = dir.iter().map(|(id, _)| id.name()).collect();
    assert_eq!(ids, ["xlat", "init-scripts", "conditions"]);
}

#[test]
fn missing_table_error() {
    let image = ProgramImage::from_script(vec![0x71]);
    let err = image.condition(0).unwrap_err();

    assert!(matches!(err, ImageError::MissingTable(TableId::Conditions)));
    assert_eq!(err.to_string(), "image has no conditions table");
}

#[test]
fn script_pointers_stop_at_zero() {
    let mut b = vec![0u8; 0x20];
    b[0x10..0x16].copy_from_slice(&[0x00, 0x01, 0x80, 0x01, 0x00, 0x00]);
    let image = image_with(b, TableDirectory::new().with(TableId::InitScripts, 0x10));

    assert_eq!(image.script_pointers().unwrap(), [0x0100, 0x0180]);
    assert_eq!(image.script_pointer(1).unwrap(), 0x0180);
}

#[test]
fn script_pointers_stop_at_image_end() {
    let b = vec![0x00, 0x00, 0x34, 0x12, 0x78];
    let image = image_with(b, TableDirectory::new().with(TableId::InitScripts, 2));

    assert_eq!(image.script_pointers().unwrap(), [0x1234]);
}

#[test]
fn condition_entries() {
    let mut b = vec![0u8; 0x40];
    let at = 0x10 + 12;
    b[at..at + 4].copy_from_slice(&0x0010_1000u32.to_le_bytes());
    b[at + 4..at + 8].copy_from_slice(&0x0000_00f0u32.to_le_bytes());
    b[at + 8..at + 12].copy_from_slice(&0x0000_0030u32.to_le_bytes());
    let image = image_with(b, TableDirectory::new().with(TableId::Conditions, 0x10));

    assert_eq!(
        image.condition(1).unwrap(),
        ConditionEntry {
            reg: 0x0010_1000,
            mask: 0xf0,
            value: 0x30,
        }
    );
    assert!(matches!(
        image.condition(4),
        Err(ImageError::OutOfBounds { .. })
    ));
}

#[test]
fn io_condition_entries() {
    let mut b = vec![0u8; 0x20];
    b[0x05..0x0a].copy_from_slice(&[0xd4, 0x03, 0x44, 0x0f, 0x02]);
    b[0x10..0x19].copy_from_slice(&[0xc4, 0x03, 0x01, 0x30, 0x04, 0x18, 0x00, 0x80, 0x80]);
    let dir = TableDirectory::new()
        .with(TableId::IoConditions, 0x05)
        .with(TableId::IoFlagConditions, 0x10);
    let image = image_with(b, dir);

    assert_eq!(
        image.io_condition(0).unwrap(),
        IoConditionEntry {
            port: 0x3d4,
            index: 0x44,
            mask: 0x0f,
            value: 0x02,
        }
    );
    assert_eq!(
        image.io_flag_condition(0).unwrap(),
        IoFlagConditionEntry {
            port: 0x3c4,
            index: 0x01,
            mask: 0x30,
            shift: 4,
            flag_array: 0x0018,
            flag_mask: 0x80,
            value: 0x80,
        }
    );
}

#[test]
fn macro_tables() {
    let mut b = vec![0u8; 0x30];
    b[0x02..0x04].copy_from_slice(&[1, 2]);
    b[0x18..0x1c].copy_from_slice(&0x0000_1540u32.to_le_bytes());
    b[0x1c..0x20].copy_from_slice(&0xdead_beefu32.to_le_bytes());
    let dir = TableDirectory::new()
        .with(TableId::MacroIndex, 0x02)
        .with(TableId::Macros, 0x10);
    let image = image_with(b, dir);

    assert_eq!(image.macro_range(0).unwrap(), (1, 2));
    assert_eq!(
        image.macro_entry(1).unwrap(),
        MacroEntry {
            reg: 0x1540,
            value: 0xdead_beef,
        }
    );
}

#[test]
fn xlat_reads_through_pointer_array() {
    let mut b = vec![0u8; 0x30];
    b[0x02..0x04].copy_from_slice(&0x0020u16.to_le_bytes());
    b[0x23] = 0x5a;
    let image = image_with(b, TableDirectory::new().with(TableId::Xlat, 0x02));

    assert_eq!(image.xlat(0, 3).unwrap(), 0x5a);
}

#[test]
fn ram_restrict_column_mapping() {
    let unmapped = ProgramImage::from_script(vec![0x71]);
    assert_eq!(unmapped.ram_restrict_column(5).unwrap(), 5);

    let b = vec![0x71, 0x00, 0x01, 0x01, 0x00];
    let mapped = image_with(b, TableDirectory::new().with(TableId::RamRestrict, 1));
    assert_eq!(mapped.ram_restrict_column(2).unwrap(), 1);
    assert_eq!(mapped.ram_restrict_column(3).unwrap(), 0);
    assert!(mapped.ram_restrict_column(4).is_err());
}

#[test]
fn mem_init_and_sequences() {
    let mut b = vec![0u8; 0x200];
    let entry = 0x10 + 66;
    b[entry] = 0x01;
    b[entry + 2..entry + 4].copy_from_slice(&16_000u16.to_le_bytes());
    b[entry + 4..entry + 6].copy_from_slice(&20_000u16.to_le_bytes());

    let regs = [0x0010_0200u32, 0x0010_0204, 0xffff_ffff];
    for (i, reg) in regs.iter().enumerate() {
        let at = 0x100 + i * 4;
        b[at..at + 4].copy_from_slice(&reg.to_le_bytes());
    }
    let dir = TableDirectory::new()
        .with(TableId::MemInit, 0x10)
        .with(TableId::DdrSequence, 0x100)
        .with_legacy(true);
    let image = image_with(b, dir);

    let e = image.mem_init_entry(1).unwrap();
    assert!(e.is_ddr());
    assert_eq!(e.mpll, 16_000);
    assert_eq!(e.nvpll, 20_000);
    assert_eq!(e.data_offset(), entry + 6);

    assert_eq!(
        image.sequence_registers(true).unwrap(),
        [0x0010_0200, 0x0010_0204]
    );
    assert!(matches!(
        image.sequence_registers(false),
        Err(ImageError::MissingTable(TableId::SdrSequence))
    ));
    assert!(image.is_legacy());
}

#[test]
fn table_id_names_are_kebab_case() {
    for id in TableId::ALL {
        assert_eq!(id.to_string(), id.name());
        assert!(id.name().chars().all(|c| c.is_ascii_lowercase() || c == '-'));
    }
}
