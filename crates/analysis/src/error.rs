use thiserror::Error;

use crate::ir::{BlockId, FunctionId};
use crate::types::Ty;

/// Structural defects in a program, found while building or validating it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IrError {
    #[error("function `{function}`: {message}")]
    Malformed { function: String, message: String },

    #[error("predicate `{predicate}`: {message}")]
    MalformedPredicate { predicate: String, message: String },

    #[error("function `{function}`: type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        function: String,
        context: String,
        expected: Ty,
        found: Ty,
    },

    #[error("unknown function {0:?}")]
    UnknownFunction(FunctionId),

    #[error("unknown predicate `{0}`")]
    UnknownPredicate(String),

    #[error("duplicate definition of `{0}`")]
    Duplicate(String),

    #[error("function `{function}`: block {block:?} does not exist")]
    UnknownBlock { function: String, block: BlockId },
}

/// Fatal contract violations hit while generating or folding VCs.
///
/// These abort the whole verification run; a wrong verdict would be worse.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VerifyError {
    #[error("function `{function}`: {message}")]
    Structure { function: String, message: String },

    #[error("cannot substitute `{variable}: {expected}` with an expression of type {found}")]
    SubstitutionType {
        variable: String,
        expected: Ty,
        found: Ty,
    },

    #[error("call to `{callee}` has {found} {what}, expected {expected}")]
    Arity {
        callee: String,
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("unknown function {0:?}")]
    UnknownFunction(FunctionId),

    #[error(transparent)]
    Ir(#[from] IrError),
}

impl VerifyError {
    pub(crate) fn structure(function: &str, message: impl Into<String>) -> Self {
        VerifyError::Structure {
            function: function.to_string(),
            message: message.into(),
        }
    }
}
