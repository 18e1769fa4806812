use std::io::Write;

use indoc::indoc;

use crate::engine::OutputContext;
use crate::hardware::{Hardware, HardwareFixture, MemoryHardware};

fn build(json: &str) -> MemoryHardware {
    HardwareFixture::from_json(json).unwrap().build().unwrap()
}

fn build_err(json: &str) -> String {
    match HardwareFixture::from_json(json).and_then(|f| f.build()) {
        Ok(_) => panic!("fixture should be rejected"),
        Err(err) => err.to_string(),
    }
}

#[test]
fn empty_fixture() {
    let hw = build("{}");

    assert_eq!(hw.reg(0x101000), 0);
    assert!(hw.calls().is_empty());
}

#[test]
fn full_fixture() {
    let mut hw = build(indoc! {r#"
        {
          "registers": { "0x101000": "0x3c", "4096": 7 },
          "indexed": { "0x3d4": { "0x3c": "0x10" } },
          "ports": { "0x3c2": 1 },
          "i2c": [
            { "bus": 0, "addr": "0x50", "registers": { "0x10": 1 } },
            { "bus": 1, "addr": 32, "nak": true }
          ],
          "aux": [{ "bus": 0, "registers": { "0x0d": "0b101" } }],
          "tmds": { "0": "0x6100b0" },
          "head_tmds": { "1": { "0": "0x6108b0" } },
          "failing_plls": ["0x680504"]
        }
    "#});

    assert_eq!(hw.reg(0x101000), 0x3c);
    assert_eq!(hw.reg(0x1000), 7);
    assert_eq!(hw.indexed(0x3d4, 0x3c), 0x10);
    assert_eq!(hw.port(0x3c2), 1);
    assert_eq!(hw.i2c_register(0, 0x50, 0x10), Some(1));
    assert!(hw.i2c_write(1, 0x20, &[0x00]).is_err());
    assert_eq!(hw.aux_byte(0, 0x0d), Some(0b101));
    let head1 = OutputContext {
        head: 1,
        ..OutputContext::default()
    };
    assert_eq!(hw.tmds_register(0, &OutputContext::default()), Some(0x6100b0));
    assert_eq!(hw.tmds_register(0, &head1), Some(0x6108b0));
    assert!(hw.program_pll(0x680504, 1000).is_err());
    assert!(hw.program_pll(0x680500, 1000).is_ok());
}

#[test]
fn from_path_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"{ "registers": { "0x200": "0xff" } }"#)
        .unwrap();

    let hw = HardwareFixture::from_path(file.path())
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(hw.reg(0x200), 0xff);
}

#[test]
fn from_path_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    let err = HardwareFixture::from_path(dir.path().join("absent.json")).unwrap_err();

    assert!(err.to_string().starts_with("cannot read fixture:"));
}

#[test]
fn i2c_address_must_be_seven_bit() {
    let res = build_err(r#"{ "i2c": [{ "bus": 0, "addr": "0x80" }] }"#);

    insta::assert_snapshot!(res, @"i2c address 0x80 is out of range");
}

#[test]
fn value_wider_than_its_field() {
    let res = build_err(r#"{ "ports": { "0x3c2": "0x100" } }"#);

    insta::assert_snapshot!(res, @"port value 0x100 is out of range");
}

#[test]
fn unknown_field_rejected() {
    let res = build_err(r#"{ "registres": {} }"#);

    assert!(res.starts_with("invalid fixture: unknown field `registres`"), "{res}");
}

#[test]
fn malformed_number_rejected() {
    let res = build_err(r#"{ "registers": { "0x10": "zz" } }"#);

    assert!(res.starts_with("invalid fixture:"), "{res}");
}
