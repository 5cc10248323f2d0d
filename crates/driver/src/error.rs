use std::path::PathBuf;

use pivc_analysis::{IrError, VerifyError};
use pivc_solver::SolverError;
use thiserror::Error;

/// Errors that stop the driver before a verdict is produced.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("cannot read {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] std::io::Error),

    #[error("cannot write {}: {}", .0.display(), .1)]
    Write(PathBuf, #[source] std::io::Error),

    #[error("malformed program: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Ir(#[from] IrError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}
