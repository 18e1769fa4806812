pub mod dump;
pub mod exec;
pub mod run_common;
pub mod tables;
pub mod trace;
