use vbinit_core::Colors;

use crate::dump::{dump, dump_script, dump_tables};
use crate::{ProgramImage, TableDirectory, TableId};

fn sample() -> ProgramImage {
    let bytes = vec![
        0x00, // padding so the script starts at 1
        0x75, 0x00, // CONDITION 0
        0x52, 0x01, 0xf0, 0x0c, // CR
        0x7a, 0x00, 0x02, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, // ZM_REG
        0x74, 0x0a, 0x00, // TIME
        0x71, // DONE
    ];
    ProgramImage::from_script(bytes)
}

#[test]
fn script_listing() {
    let res = dump_script(&sample(), 1, Colors::OFF);

    insta::assert_snapshot!(res, @r#"
    [script 0x0001]
    0001  CONDITION                 0x00
    0003  CR                        CR[0x01] &= 0xf0 |= 0x0c
    0007  ZM_REG                    R[0x000200] = 0x00000001
    0010  TIME                      10 us
    0013  DONE
    "#);
}

#[test]
fn script_listing_stops_at_unknown_opcode() {
    let image = ProgramImage::from_script(vec![0x00, 0x38, 0xee, 0x71]);
    let res = dump_script(&image, 1, Colors::OFF);

    insta::assert_snapshot!(res, @r#"
    [script 0x0001]
    0001  NOT
    0002  ?? 0xee
    "#);
}

#[test]
fn script_listing_marks_truncation() {
    let image = ProgramImage::from_script(vec![0x00, 0x72, 0x7a, 0x00]);
    let res = dump_script(&image, 1, Colors::OFF);

    insta::assert_snapshot!(res, @r#"
    [script 0x0001]
    0001  RESUME
    0002  ZM_REG (truncated)
    "#);
}

#[test]
fn script_listing_runs_off_the_end() {
    let image = ProgramImage::from_script(vec![0x00, 0x38]);
    let res = dump_script(&image, 1, Colors::OFF);

    insta::assert_snapshot!(res, @r#"
    [script 0x0001]
    0001  NOT
    0002  (end of image)
    "#);
}

#[test]
fn no_script_at_zero() {
    let res = dump_script(&sample(), 0, Colors::OFF);

    insta::assert_snapshot!(res, @r#"
    [script 0x0000]
    (no script)
    "#);
}

#[test]
fn table_listing() {
    let mut bytes = sample().bytes().to_vec();
    bytes.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);
    let dir = TableDirectory::new()
        .with(TableId::InitScripts, 0x14)
        .with(TableId::Conditions, 0x20)
        .with_ram_restrict_groups(4);
    let image = ProgramImage::with_tables(bytes, dir);
    let res = dump_tables(&image, Colors::OFF);

    insta::assert_snapshot!(res, @r#"
    [header]
    format   raw
    size     24

    [tables]
    init-scripts        0x0014
    conditions          0x0020
    ram-restrict-groups 4

    [scripts]
    0   0x0001
    "#);
}

#[test]
fn full_dump_includes_every_script() {
    let mut bytes = sample().bytes().to_vec();
    bytes.extend_from_slice(&[0x01, 0x00, 0x13, 0x00, 0x00, 0x00]);
    let dir = TableDirectory::new().with(TableId::InitScripts, 0x14);
    let image = ProgramImage::with_tables(bytes, dir);
    let res = dump(&image, Colors::OFF);

    assert!(res.contains("[script 0x0001]"));
    assert!(res.contains("[script 0x0013]\n0013  DONE\n"));
}

#[test]
fn empty_directory_listing() {
    let res = dump_tables(&sample(), Colors::OFF);

    assert!(res.contains("[tables]\n(none)\n"));
    assert!(!res.contains("[scripts]"));
}

#[test]
fn colored_listing_wraps_names() {
    let res = dump_script(&sample(), 0x13, Colors::ON);

    assert!(res.contains(&format!("{}DONE{}", Colors::ON.blue, Colors::ON.reset)));
}
