#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Shared helpers for the vbinit crates.
//!
//! Nothing here knows about firmware images: only terminal colors and the
//! number parsing/formatting used by the dumper, the hardware fixtures and
//! the command line.

mod colors;
pub mod utils;


pub use colors::Colors;
pub use utils::{ParseNumberError, parse_number};
