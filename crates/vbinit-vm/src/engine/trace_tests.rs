use vbinit_core::Colors;
use vbinit_image::{ProgramImage, TableDirectory, TableId};

use crate::engine::{ExecutionState, Interpreter, PrintTracer, Verbosity};
use crate::hardware::MemoryHardware;

/// CONDITION 0; CR 0x01 &= 0xf0 |= 0x0c; DONE, with condition 0 testing R[0x1000].
fn conditional_image() -> ProgramImage {
    let mut b = vec![0x00, 0x75, 0x00, 0x52, 0x01, 0xf0, 0x0c, 0x71];
    b.resize(0x80, 0);
    b.extend_from_slice(&0x1000u32.to_le_bytes());
    b.extend_from_slice(&0xffu32.to_le_bytes());
    b.extend_from_slice(&0x12u32.to_le_bytes());
    ProgramImage::with_tables(b, TableDirectory::new().with(TableId::Conditions, 0x80))
}

fn trace(image: &ProgramImage, hw: &mut MemoryHardware, verbosity: Verbosity) -> String {
    let mut tracer = PrintTracer::new(image, verbosity, Colors::OFF);
    let mut state = ExecutionState::new();
    Interpreter::builder(image, hw)
        .build()
        .execute_script_with(1, &mut state, &mut tracer)
        .unwrap();
    tracer.lines().join("\n")
}

#[test]
fn executed_instructions() {
    let image = conditional_image();
    let mut hw = MemoryHardware::new().with_reg(0x1000, 0x12);

    let res = trace(&image, &mut hw, Verbosity::Default);

    insta::assert_snapshot!(res, @r"
    [script 0x0001]
    0001  CONDITION                 0x00
          execute = true
    0003  CR                        CR[0x01] &= 0xf0 |= 0x0c
    0007  DONE
    ");
}

#[test]
fn skipped_instructions_hidden_by_default() {
    let image = conditional_image();
    let mut hw = MemoryHardware::new();

    let res = trace(&image, &mut hw, Verbosity::Default);

    insta::assert_snapshot!(res, @r"
    [script 0x0001]
    0001  CONDITION                 0x00
          execute = false
    0007  DONE
    ");
}

#[test]
fn verbose_shows_skipped_instructions() {
    let image = conditional_image();
    let mut hw = MemoryHardware::new();

    let res = trace(&image, &mut hw, Verbosity::Verbose);

    insta::assert_snapshot!(res, @r"
    [script 0x0001]
    0001  CONDITION                 0x00
          execute = false
    0003  CR (skipped)
    0007  DONE
    ");
}

#[test]
fn sub_calls_are_indented_with_raw_bytes() {
    let mut b = vec![0x00, 0x5b, 0x10, 0x00, 0x71];
    b.resize(0x10, 0);
    b.extend_from_slice(&[0x7a, 0x00, 0x02, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x71]);
    let image = ProgramImage::from_script(b);
    let mut hw = MemoryHardware::new();

    let res = trace(&image, &mut hw, Verbosity::VeryVerbose);

    insta::assert_snapshot!(res, @r"
    [script 0x0001]
    0001  SUB_DIRECT                0x0010
          5b 10 00
          -> 0x0010
      0010  ZM_REG                    R[0x000200] = 0x00000001
            7a 00 02 00 00 01 00 00 00
      0019  DONE
            71
    0004  DONE
          71
    ");
}

#[test]
fn failures_are_annotated() {
    let image = ProgramImage::from_script(vec![
        0x00, 0x79, 0x00, 0x05, 0x68, 0x00, 0xc4, 0x09, 0x71,
    ]);
    let mut hw = MemoryHardware::new().with_failing_pll(0x680500);

    let res = trace(&image, &mut hw, Verbosity::Default);

    insta::assert_snapshot!(res, @r"
    [script 0x0001]
    0001  PLL                       R[0x680500] = 25000 kHz
          ! pll programming failed: 25000 kHz is out of range for PLL 0x680500
    0008  DONE
    ");
}

#[test]
fn init_tables_are_separated() {
    let mut b = vec![0x00, 0x71, 0x38, 0x71];
    b.resize(0x10, 0);
    b.extend_from_slice(&[0x01, 0x00, 0x02, 0x00, 0x00, 0x00]);
    let image = ProgramImage::with_tables(b, TableDirectory::new().with(TableId::InitScripts, 0x10));
    let mut hw = MemoryHardware::new();
    let mut tracer = PrintTracer::new(&image, Verbosity::Default, Colors::OFF);

    Interpreter::builder(&image, &mut hw)
        .build()
        .run_init_tables_with(&mut tracer)
        .unwrap();

    insta::assert_snapshot!(tracer.lines().join("\n"), @r"
    [script 0x0001]
    0001  DONE

    [script 0x0002]
    0002  NOT
          execute = false
    0003  DONE
    ");
}

#[test]
fn colored_output() {
    let image = ProgramImage::from_script(vec![0x00, 0x71]);
    let mut hw = MemoryHardware::new();
    let mut tracer = PrintTracer::new(&image, Verbosity::Default, Colors::ON);
    let mut state = ExecutionState::new();

    Interpreter::builder(&image, &mut hw)
        .build()
        .execute_script_with(1, &mut state, &mut tracer)
        .unwrap();

    assert_eq!(
        tracer.lines(),
        [
            "\x1b[34m[script 0x0001]\x1b[0m",
            "\x1b[2m0001\x1b[0m  \x1b[34mDONE\x1b[0m",
        ]
    );
}
