use crate::model::Model;

/// Result of a satisfiability check.
///
/// Verification conditions are checked by asserting their negation, so
/// `Unsat` means the condition is valid and `Sat` carries a counterexample.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverResult {
    /// Formula is satisfiable (the negated VC has a witness).
    Sat(Option<Model>),
    /// Formula is unsatisfiable (the VC is valid).
    Unsat,
    /// Solver couldn't determine (timeout, incomplete theory, resource limit).
    Unknown(String),
}

impl SolverResult {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolverResult::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, SolverResult::Unsat)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SolverResult::Unknown(_))
    }

    /// Returns the model if the result is `Sat` with a model.
    pub fn model(&self) -> Option<&Model> {
        match self {
            SolverResult::Sat(Some(model)) => Some(model),
            _ => None,
        }
    }
}
