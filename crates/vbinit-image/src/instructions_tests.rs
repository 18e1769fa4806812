use proptest::prelude::*;

use crate::{DecodeError, ImageError, Instruction, Opcode, ProgramImage, TableDirectory};

fn decode(bytes: &[u8]) -> Instruction {
    Instruction::decode(&ProgramImage::from_script(bytes.to_vec()), 0).unwrap()
}

#[test]
fn decode_cr() {
    let instr = decode(&[0x52, 0x01, 0xf0, 0x0c]);

    assert_eq!(
        instr,
        Instruction::Cr {
            index: 0x01,
            mask: 0xf0,
            data: 0x0c,
        }
    );
    assert_eq!(instr.len(), 4);
    assert_eq!(instr.to_string(), "CR CR[0x01] &= 0xf0 |= 0x0c");
}

#[test]
fn decode_little_endian_operands() {
    let instr = decode(&[0x7a, 0x00, 0x02, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]);
    assert_eq!(
        instr,
        Instruction::ZmReg {
            reg: 0x200,
            value: 1,
        }
    );

    let instr = decode(&[0x5c, 0x34, 0x12]);
    assert_eq!(instr, Instruction::Jump { target: 0x1234 });
    assert_eq!(instr.to_string(), "JUMP 0x1234");
}

#[test]
fn decode_i2c_byte_triples() {
    let instr = decode(&[0x4c, 0xff, 0xa0, 0x02, 0x10, 0xff, 0x01, 0x11, 0x0f, 0x02]);

    assert_eq!(
        instr,
        Instruction::I2cByte {
            bus: 0xff,
            addr: 0xa0,
            writes: vec![(0x10, 0xff, 0x01), (0x11, 0x0f, 0x02)],
        }
    );
    assert_eq!(instr.len(), 10);
    assert_eq!(
        instr.to_string(),
        "I2C_BYTE I2C[0xff][0xa0] {[0x10] &= 0xff |= 0x01, [0x11] &= 0x0f |= 0x02}"
    );
}

#[test]
fn decode_ram_restrict_group_rows() {
    let mut bytes = vec![0x8f, 0x00, 0x10, 0x00, 0x00, 0x04, 0x02];
    for v in 1u32..=4 {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let dir = TableDirectory::new().with_ram_restrict_groups(2);
    let image = ProgramImage::with_tables(bytes, dir);
    let instr = Instruction::decode(&image, 0).unwrap();

    assert_eq!(
        instr,
        Instruction::RamRestrictZmRegGroup {
            reg: 0x1000,
            increment: 4,
            count: 2,
            values: vec![1, 2, 3, 4],
        }
    );
    assert_eq!(instr.len(), 23);
}

#[test]
fn operand_rendering() {
    let cases: [(&[u8], &str); 8] = [
        (&[0x71], "DONE"),
        (&[0x74, 0x0a, 0x00], "TIME 10 us"),
        (&[0x57, 0xe8, 0x03], "LTIME 1000 ms"),
        (
            &[0x79, 0x00, 0x05, 0x68, 0x00, 0xa8, 0x61],
            "PLL R[0x680500] = 250000 kHz",
        ),
        (&[0x33, 0x03], "REPEAT 3"),
        (&[0x8c], "RESERVED 0x8c"),
        (&[0x3b, 0x44], "IO_MASK_OR CR[0x44] &= ~(1 << OR)"),
        (
            &[0x58, 0x00, 0x10, 0x00, 0x00, 0x01, 0xef, 0xbe, 0xad, 0xde],
            "ZM_REG_SEQUENCE R[0x001000].. = {0xdeadbeef}",
        ),
    ];
    for (bytes, text) in cases {
        assert_eq!(decode(bytes).to_string(), text);
    }
}

#[test]
fn shifted_copy_rendering() {
    let instr = decode(&[
        0x37, 0x00, 0x10, 0x10, 0x00, 0xfe, 0x0f, 0xd4, 0x03, 0x44, 0xf0,
    ]);
    assert_eq!(
        instr.operands(),
        "IO[0x03d4][0x44] = (IO[0x03d4][0x44] & 0xf0) | ((R[0x101000] << 2) & 0x0f)"
    );
}

#[test]
fn unknown_opcode_is_reported() {
    let image = ProgramImage::from_script(vec![0x71, 0xff]);
    let err = Instruction::decode(&image, 1).unwrap_err();

    assert!(matches!(
        err,
        DecodeError::UnknownOpcode {
            offset: 1,
            id: 0xff
        }
    ));
    assert_eq!(err.to_string(), "unknown opcode 0xff at 0x0001");
}

#[test]
fn truncated_operands_are_reported() {
    let image = ProgramImage::from_script(vec![0x7a, 0x00, 0x02]);
    let err = Instruction::decode(&image, 0).unwrap_err();

    assert!(matches!(
        err,
        DecodeError::Image(ImageError::OutOfBounds { offset: 1, .. })
    ));
}

#[test]
fn truncated_tail_is_reported() {
    let image = ProgramImage::from_script(vec![0x54, 0x02, 0x01, 0x02]);
    assert!(Instruction::decode(&image, 0).is_err());
}

proptest! {
    /// The skip path and the decoder must agree on every instruction size.
    #[test]
    fn decoded_len_matches_encoded_len(
        bytes in prop::collection::vec(any::<u8>(), 1..1200),
        groups in 0u8..4,
    ) {
        let dir = TableDirectory::new().with_ram_restrict_groups(groups);
        let image = ProgramImage::with_tables(bytes, dir);
        if let Ok(instr) = Instruction::decode(&image, 0) {
            let opcode = Opcode::from_u8(image.bytes()[0]).unwrap();
            prop_assert_eq!(instr.opcode(), opcode);
            prop_assert_eq!(instr.len(), opcode.encoded_len(&image, 0).unwrap());
        }
    }
}
