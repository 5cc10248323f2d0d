//! pivc-driver: SMT-backed verification of pivc programs.
//!
//! The `pivc` binary is a thin clap wrapper around [`pipeline`]. The
//! library is exposed so integration tests can drive the same steps.

pub mod checker;
pub mod error;
pub mod json_output;
pub mod output;
pub mod pipeline;

pub use checker::SmtChecker;
pub use error::DriverError;
pub use pipeline::{CfgTarget, load_program, parse_program, verify_program, write_cfg};
