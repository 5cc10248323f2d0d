//! Abstraction over SMT solver backends.
//!
//! `SolverBackend` lets the verifier talk to any solver that answers
//! SMT-LIB2 scripts. The subprocess-based [`CliSolver`] covers Z3, CVC5
//! and Yices.

use pivc_smtlib::Script;

use crate::config::SolverKind;
use crate::error::SolverError;
use crate::result::SolverResult;
use crate::solver::CliSolver;

/// Something that can decide satisfiability of an SMT-LIB2 script.
pub trait SolverBackend {
    /// Check satisfiability of the given script.
    ///
    /// Returns:
    /// - `Ok(SolverResult::Sat(model))` if satisfiable
    /// - `Ok(SolverResult::Unsat)` if unsatisfiable
    /// - `Ok(SolverResult::Unknown(reason))` if the solver gave up
    /// - `Err(SolverError)` if the solver invocation failed
    fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError>;
}

impl SolverBackend for CliSolver {
    fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
        CliSolver::check_sat(self, script)
    }
}

impl<B: SolverBackend + ?Sized> SolverBackend for Box<B> {
    fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
        (**self).check_sat(script)
    }
}

/// Create a subprocess backend for the given solver kind.
pub fn create_backend(kind: SolverKind) -> Result<Box<dyn SolverBackend>, SolverError> {
    tracing::debug!("Using {kind} subprocess backend");
    let solver = CliSolver::with_default_config_for(kind)?;
    Ok(Box::new(solver))
}

/// Create the default backend (Z3).
pub fn create_default_backend() -> Result<Box<dyn SolverBackend>, SolverError> {
    create_backend(SolverKind::Z3)
}
