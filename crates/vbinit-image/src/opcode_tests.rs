use std::collections::HashSet;

use crate::{ImageError, MAX_NAME_LEN, Opcode, ProgramImage, TableDirectory, TailCount};

#[test]
fn opcode_table_is_consistent() {
    assert_eq!(Opcode::ALL.len(), 68);

    let ids: HashSet<u8> = Opcode::ALL.iter().map(|op| op.id()).collect();
    assert_eq!(ids.len(), Opcode::ALL.len());

    for &op in Opcode::ALL {
        assert_eq!(Opcode::from_u8(op.id()), Some(op));
        assert!(op.name().len() <= MAX_NAME_LEN, "{} too long", op.name());
    }
}

#[test]
fn unassigned_ids_are_unknown() {
    for id in [0x00, 0x31, 0x35, 0x55, 0x70, 0x7b, 0xab, 0xff] {
        assert_eq!(Opcode::from_u8(id), None, "0x{id:02x}");
    }
}

#[test]
fn reserved_opcodes_share_a_name() {
    let reserved: Vec<u8> = Opcode::ALL
        .iter()
        .filter(|op| op.name() == "RESERVED")
        .map(|op| op.id())
        .collect();
    assert_eq!(reserved, [0x8c, 0x8d, 0x92, 0xaa]);
}

#[test]
fn skip_classes() {
    let running: Vec<_> = Opcode::ALL
        .iter()
        .filter(|op| op.runs_while_skipping())
        .map(|op| op.name())
        .collect();
    assert_eq!(running, ["END_REPEAT", "NOT", "DONE", "RESUME"]);

    let legacy: Vec<_> = Opcode::ALL
        .iter()
        .filter(|op| op.legacy_only())
        .map(|op| op.name())
        .collect();
    assert_eq!(
        legacy,
        ["CONFIGURE_MEM", "CONFIGURE_CLK", "CONFIGURE_PREINIT"]
    );

    assert!(Opcode::I2cLongIf.is_condition());
    assert!(!Opcode::Not.is_condition());
}

#[test]
fn fixed_lengths() {
    let cases = [
        (Opcode::Done, 1),
        (Opcode::Condition, 2),
        (Opcode::Jump, 3),
        (Opcode::Cr, 4),
        (Opcode::Io, 5),
        (Opcode::ZmRegSequence, 6),
        (Opcode::Pll, 7),
        (Opcode::ZmReg, 9),
        (Opcode::Copy, 11),
        (Opcode::IoRestrictPll, 12),
        (Opcode::Reset, 13),
        (Opcode::Xlat, 17),
        (Opcode::IndexAddressLatched, 18),
        (Opcode::CopyNvReg, 22),
    ];
    for (op, len) in cases {
        assert_eq!(op.fixed_len(), len, "{}", op.name());
    }
}

#[test]
fn tail_count_operand_lies_inside_fixed_part() {
    for &op in Opcode::ALL {
        let Some(tail) = op.tail() else { continue };
        match tail.count {
            TailCount::Operand(rel) | TailCount::OperandByRamGroups(rel) => {
                assert!(rel < op.fixed_len(), "{}", op.name());
            }
            TailCount::RamGroups => {}
        }
        assert!(tail.element > 0);
    }
}

#[test]
fn encoded_len_reads_count() {
    // ZM_REG_SEQUENCE base=0x1000, 2 values
    let image = ProgramImage::from_script(vec![
        0x58, 0x00, 0x10, 0x00, 0x00, 0x02, //
        0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
    ]);
    assert_eq!(Opcode::ZmRegSequence.encoded_len(&image, 0).unwrap(), 14);
    assert_eq!(Opcode::Done.encoded_len(&image, 0).unwrap(), 1);
}

#[test]
fn encoded_len_ignores_tail_overrun() {
    // ZM_CR_GROUP claiming 0x10 pairs with none present
    let image = ProgramImage::from_script(vec![0x54, 0x10]);
    assert_eq!(Opcode::ZmCrGroup.encoded_len(&image, 0).unwrap(), 2 + 0x20);
}

#[test]
fn encoded_len_fails_on_missing_count() {
    let image = ProgramImage::from_script(vec![0x58, 0x00, 0x10]);
    let err = Opcode::ZmRegSequence.encoded_len(&image, 0).unwrap_err();

    assert!(matches!(
        err,
        ImageError::OutOfBounds {
            offset: 5,
            width: 1,
            len: 3
        }
    ));
}

#[test]
fn encoded_len_uses_ram_groups() {
    let dir = TableDirectory::new().with_ram_restrict_groups(3);
    let image = ProgramImage::with_tables(vec![0x87, 0x00, 0x8f, 0, 0, 0, 0, 0, 2], dir);

    assert_eq!(Opcode::RamRestrictPll.encoded_len(&image, 0).unwrap(), 2 + 3 * 4);
    assert_eq!(
        Opcode::RamRestrictZmRegGroup.encoded_len(&image, 2).unwrap(),
        7 + 2 * 3 * 4
    );
}
