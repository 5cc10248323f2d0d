use std::path::PathBuf;

use thiserror::Error;

use crate::config::SolverKind;

/// Errors from solver interaction.
#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    /// Solver binary not found at the specified path.
    #[error("{0} binary not found at: {path}", path = .1.display())]
    NotFound(SolverKind, PathBuf),
    /// Process failed to start or crashed.
    #[error("Solver process error: {0}")]
    ProcessError(String),
    /// Failed to parse solver output.
    #[error("Failed to parse solver output: {0}")]
    ParseError(String),
    /// Timeout exceeded.
    #[error("Solver timeout exceeded")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_found() {
        let err = SolverError::NotFound(SolverKind::Z3, PathBuf::from("/no/z3"));
        assert_eq!(err.to_string(), "Z3 binary not found at: /no/z3");
        let err = SolverError::NotFound(SolverKind::Cvc5, PathBuf::from("cvc5"));
        assert_eq!(err.to_string(), "CVC5 binary not found at: cvc5");
    }

    #[test]
    fn display_process_and_parse_errors() {
        let err = SolverError::ProcessError("crashed".to_string());
        assert_eq!(err.to_string(), "Solver process error: crashed");
        let err = SolverError::ParseError("bad output".to_string());
        assert_eq!(err.to_string(), "Failed to parse solver output: bad output");
    }

    #[test]
    fn error_equality() {
        assert_eq!(SolverError::Timeout, SolverError::Timeout);
        assert_ne!(SolverError::Timeout, SolverError::ProcessError("x".into()));
    }
}
