/// The seam between VC generation and a decision procedure.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::ir::Predicate;

/// Variable assignment falsifying a verification condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterModel {
    pub assignments: BTreeMap<String, String>,
}

impl CounterModel {
    pub fn new(assignments: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            assignments: assignments.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.assignments.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl fmt::Display for CounterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*** COUNTER MODEL")?;
        for (name, value) in &self.assignments {
            writeln!(f, "{name} := {value}")?;
        }
        write!(f, "*** END COUNTER MODEL")
    }
}

/// Outcome of a single validity query.
#[derive(Debug, Clone, PartialEq)]
pub enum Validity {
    Valid,
    Invalid(CounterModel),
    /// The checker gave up; the payload is its reason.
    Unknown(String),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

/// Decides validity of closed boolean formulas.
///
/// Predicates are registered once, before any formula mentioning them is
/// checked.
pub trait ValidityChecker {
    type Error: fmt::Display;

    fn define_predicate(&mut self, predicate: &Predicate) -> Result<(), Self::Error>;

    fn check_valid(&mut self, formula: &Expr) -> Result<Validity, Self::Error>;
}

impl<C: ValidityChecker + ?Sized> ValidityChecker for &mut C {
    type Error = C::Error;

    fn define_predicate(&mut self, predicate: &Predicate) -> Result<(), Self::Error> {
        (**self).define_predicate(predicate)
    }

    fn check_valid(&mut self, formula: &Expr) -> Result<Validity, Self::Error> {
        (**self).check_valid(formula)
    }
}
