//! # pivc-smtlib
//!
//! SMT-LIB2 abstract syntax for the verification conditions produced by
//! `pivc-analysis`, plus `Display` implementations that render valid
//! SMT-LIB2 text for external solvers.

pub mod command;
pub mod formatter;
pub mod script;
pub mod sort;
pub mod term;

pub use command::Command;
pub use script::Script;
pub use sort::Sort;
pub use term::Term;
