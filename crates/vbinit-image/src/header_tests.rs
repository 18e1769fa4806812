use crate::{
    BIT_SIGNATURE, BMP_SIGNATURE, ImageError, ImageFormat, ProgramImage, TableId, find_signature,
};

fn put16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

/// BIT header at 0x10 with 'I', 'M' (v2) and 'C' entries.
fn bit_image() -> Vec<u8> {
    let mut b = vec![0u8; 0x100];
    b[0x10..0x15].copy_from_slice(&BIT_SIGNATURE);
    put16(&mut b, 0x16, 0x0100);
    b[0x18] = 12; // header length
    b[0x19] = 6; // entry length
    b[0x1a] = 3; // entry count

    b[0x1c..0x22].copy_from_slice(&[b'I', 1, 16, 0, 0x40, 0]);
    b[0x22..0x28].copy_from_slice(&[b'M', 2, 3, 0, 0x60, 0]);
    b[0x28..0x2e].copy_from_slice(&[b'C', 1, 10, 0, 0x70, 0]);

    put16(&mut b, 0x40, 0x0080); // init scripts
    put16(&mut b, 0x42, 0x0090); // macro index
    put16(&mut b, 0x44, 0x00a0); // macros
    put16(&mut b, 0x46, 0x00b0); // conditions
    put16(&mut b, 0x48, 0x0000); // io conditions: absent
    put16(&mut b, 0x4a, 0x00c0); // io flag conditions
    put16(&mut b, 0x4e, 0x00d0); // xlat

    b[0x60] = 2;
    put16(&mut b, 0x61, 0x00e0);

    put16(&mut b, 0x78, 0x00f0);
    b
}

#[test]
fn resolve_bit_directory() {
    let image = ProgramImage::resolve(bit_image()).unwrap();

    let ImageFormat::Bit(bit) = image.format() else {
        panic!("expected BIT, got {:?}", image.format());
    };
    assert_eq!(bit.offset, 0x10);
    assert_eq!(bit.version, 0x0100);
    assert_eq!(bit.entries.len(), 3);
    assert_eq!(bit.entry(b'M').map(|e| e.version), Some(2));

    let t = image.tables();
    assert_eq!(t.get(TableId::InitScripts), Some(0x80));
    assert_eq!(t.get(TableId::MacroIndex), Some(0x90));
    assert_eq!(t.get(TableId::Macros), Some(0xa0));
    assert_eq!(t.get(TableId::Conditions), Some(0xb0));
    assert_eq!(t.get(TableId::IoConditions), None);
    assert_eq!(t.get(TableId::IoFlagConditions), Some(0xc0));
    assert_eq!(t.get(TableId::Xlat), Some(0xd0));
    assert_eq!(t.get(TableId::RamRestrict), Some(0xe0));
    assert_eq!(t.get(TableId::PllLimits), Some(0xf0));
    assert_eq!(t.ram_restrict_groups(), 2);
    assert!(!image.is_legacy());
}

#[test]
fn short_init_entry_has_no_xlat() {
    let mut b = bit_image();
    b[0x1e] = 12; // 'I' length
    let image = ProgramImage::resolve(b).unwrap();

    assert_eq!(image.tables().get(TableId::Conditions), Some(0xb0));
    assert_eq!(image.tables().get(TableId::Xlat), None);
}

#[test]
fn memory_entry_v1_layout() {
    let mut b = bit_image();
    b[0x22..0x28].copy_from_slice(&[b'M', 1, 5, 0, 0x60, 0]);
    b[0x60..0x65].copy_from_slice(&[0, 0, 4, 0xe8, 0x00]);
    let image = ProgramImage::resolve(b).unwrap();

    assert_eq!(image.tables().ram_restrict_groups(), 4);
    assert_eq!(image.tables().get(TableId::RamRestrict), Some(0xe8));
}

#[test]
fn bit_wins_over_bmp() {
    let mut b = bit_image();
    b[0x90..0x95].copy_from_slice(&BMP_SIGNATURE);
    let image = ProgramImage::resolve(b).unwrap();

    assert_eq!(image.format().name(), "BIT");
}

#[test]
fn resolve_legacy_bmp() {
    let mut b = vec![0u8; 0x200];
    b[0..5].copy_from_slice(&BMP_SIGNATURE);
    b[5] = 2;
    b[6] = 1;
    put16(&mut b, 24, 0x0100);
    put16(&mut b, 26, 0x0180);
    put16(&mut b, 28, 0x0190);
    put16(&mut b, 75, 0x01a0);
    put16(&mut b, 81, 0x01b0);
    put16(&mut b, 142, 0x01c0);
    let image = ProgramImage::resolve(b).unwrap();

    let ImageFormat::Bmp(bmp) = image.format() else {
        panic!("expected BMP, got {:?}", image.format());
    };
    assert_eq!((bmp.major, bmp.minor), (2, 1));
    assert!(image.is_legacy());

    let t = image.tables();
    assert_eq!(t.get(TableId::MemInit), Some(0x100));
    assert_eq!(t.get(TableId::SdrSequence), Some(0x180));
    assert_eq!(t.get(TableId::DdrSequence), Some(0x190));
    assert_eq!(t.get(TableId::InitScripts), Some(0x1a0));
    assert_eq!(t.get(TableId::Conditions), Some(0x1b0));
    assert_eq!(t.get(TableId::PllLimits), Some(0x1c0));
}

#[test]
fn modern_bmp_has_no_memory_tables() {
    let mut b = vec![0u8; 0x100];
    b[0..5].copy_from_slice(&BMP_SIGNATURE);
    b[5] = 5;
    put16(&mut b, 24, 0x0100);
    put16(&mut b, 75, 0x00a0);
    let image = ProgramImage::resolve(b).unwrap();

    assert!(!image.is_legacy());
    assert_eq!(image.tables().get(TableId::MemInit), None);
    assert_eq!(image.tables().get(TableId::InitScripts), Some(0xa0));
    assert_eq!(image.tables().get(TableId::PllLimits), None);
}

#[test]
fn short_bmp_header_resolves_without_pointers() {
    let mut b = vec![0u8; 16];
    b[0..5].copy_from_slice(&BMP_SIGNATURE);
    b[5] = 5;
    let image = ProgramImage::resolve(b).unwrap();

    assert!(image.tables().is_empty());
}

#[test]
fn missing_signature_is_format_error() {
    let err = ProgramImage::resolve(vec![0x55, 0xaa, 0x00, 0x71]).unwrap_err();

    assert!(matches!(err, ImageError::Format { len: 4 }));
    assert_eq!(err.to_string(), "no BIT or BMP signature found in 4-byte image");
}

#[test]
fn truncated_bit_header_is_out_of_bounds() {
    let mut b = vec![0u8; 8];
    b[0..5].copy_from_slice(&BIT_SIGNATURE);
    let err = ProgramImage::resolve(b).unwrap_err();

    assert!(matches!(err, ImageError::OutOfBounds { .. }));
}

#[test]
fn find_signature_positions() {
    assert_eq!(find_signature(b"xxBITxx", b"BIT"), Some(2));
    assert_eq!(find_signature(b"BI", b"BIT"), None);
    assert_eq!(find_signature(b"abc", b""), None);
}

#[test]
fn from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vbios.rom");
    std::fs::write(&path, bit_image()).unwrap();

    let image = ProgramImage::from_path(&path).unwrap();
    assert_eq!(image.len(), 0x100);

    let err = ProgramImage::from_path(dir.path().join("missing.rom")).unwrap_err();
    assert!(matches!(err, ImageError::Io(_)));
}

#[test]
fn format_serializes_with_kind_tag() {
    let image = ProgramImage::resolve(bit_image()).unwrap();
    let json = serde_json::to_value(image.format()).unwrap();

    assert_eq!(json["kind"], "bit");
    assert_eq!(json["version"], 0x0100);
    assert_eq!(json["entries"][1]["id"], u32::from(b'M'));

    let tables = serde_json::to_value(image.tables()).unwrap();
    assert_eq!(tables["tables"]["init-scripts"], 0x80);
    assert_eq!(tables["ram_restrict_groups"], 2);
}
