/// The verification loop: enumerate, fold, discharge.
use std::fmt;
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::basic_path::{ObligationKind, PathEnumerator};
use crate::error::VerifyError;
use crate::expr::Expr;
use crate::ir::{Function, Program};
use crate::validity::{CounterModel, Validity, ValidityChecker};
use crate::wlp::fold_path;

/// Overall outcome, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Verified,
    Unknown,
    Unverified,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Verdict::Verified => "VERIFIED",
            Verdict::Unknown => "UNKNOWN",
            Verdict::Unverified => "UNVERIFIED",
        };
        f.write_str(word)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Verify the remaining functions after one fails.
    pub keep_going: bool,
}

/// The obligation that decided a function's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ObligationKind,
    pub description: String,
    pub vc: String,
    pub counterexample: Option<CounterModel>,
    /// Why the checker could not decide, for `Unknown` verdicts.
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionReport {
    pub name: String,
    pub verdict: Verdict,
    /// Number of verification conditions sent to the checker.
    pub checked: usize,
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramReport {
    pub functions: Vec<FunctionReport>,
}

impl ProgramReport {
    /// Worst verdict over all checked functions; `Verified` when empty.
    pub fn verdict(&self) -> Verdict {
        self.functions
            .iter()
            .map(|f| f.verdict)
            .max()
            .unwrap_or(Verdict::Verified)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionReport> {
        self.functions.iter().find(|f| f.name == name)
    }
}

pub struct Verifier<C> {
    checker: C,
    options: VerifyOptions,
}

impl<C: ValidityChecker> Verifier<C> {
    pub fn new(checker: C) -> Self {
        Self {
            checker,
            options: VerifyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: VerifyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn checker(&self) -> &C {
        &self.checker
    }

    pub fn into_checker(self) -> C {
        self.checker
    }

    /// Verify every function of `program`.
    ///
    /// `Err` means the program itself is malformed; failed proofs are
    /// reported through the verdicts.
    pub fn verify(&mut self, program: &Program) -> Result<ProgramReport, VerifyError> {
        program.validate()?;

        for predicate in &program.predicates {
            if let Err(err) = self.checker.define_predicate(predicate) {
                // every VC could mention it, so nothing can be decided
                tracing::warn!(predicate = %predicate.name, error = %err, "predicate registration failed");
                return Ok(ProgramReport {
                    functions: program
                        .functions
                        .iter()
                        .map(|f| FunctionReport {
                            name: f.name.clone(),
                            verdict: Verdict::Unknown,
                            checked: 0,
                            failure: None,
                        })
                        .collect(),
                });
            }
        }

        let mut report = ProgramReport::default();
        for function in &program.functions {
            let outcome = self.verify_function(program, function)?;
            let stop = outcome.verdict == Verdict::Unverified && !self.options.keep_going;
            report.functions.push(outcome);
            if stop {
                tracing::info!(function = %function.name, "stopping after first unverified function");
                break;
            }
        }
        Ok(report)
    }

    /// Check every basic path of one function until the first failure.
    pub fn verify_function(
        &mut self,
        program: &Program,
        function: &Function,
    ) -> Result<FunctionReport, VerifyError> {
        tracing::info!(function = %function.name, "verifying function");

        let mut checked = 0;
        let mut failure = None;
        let mut verdict = Verdict::Verified;
        let checker = &mut self.checker;

        let _ = PathEnumerator::new(program, function).walk(|path| {
            let vc = fold_path(program, function, &path)?;
            checked += 1;
            tracing::debug!(
                function = %function.name,
                obligation = %path.kind,
                route = %path.route(function),
                vc = %vc,
                "checking verification condition"
            );

            let (outcome, counterexample, reason) = match checker.check_valid(&vc) {
                Ok(Validity::Valid) => return Ok(ControlFlow::Continue(())),
                Ok(Validity::Invalid(model)) => (Verdict::Unverified, Some(model), None),
                Ok(Validity::Unknown(reason)) => (Verdict::Unknown, None, Some(reason)),
                Err(err) => {
                    tracing::warn!(function = %function.name, error = %err, "validity check failed");
                    (Verdict::Unknown, None, Some(err.to_string()))
                }
            };
            verdict = outcome;
            failure = Some(Failure {
                description: path.describe(function),
                kind: path.kind,
                vc: vc.to_string(),
                counterexample,
                reason,
            });
            Ok(ControlFlow::Break(()))
        })?;

        tracing::info!(function = %function.name, %verdict, checked, "function done");
        Ok(FunctionReport {
            name: function.name.clone(),
            verdict,
            checked,
            failure,
        })
    }
}

/// Check a single closed formula, mostly useful for ad-hoc obligations.
pub fn check_formula<C: ValidityChecker>(checker: &mut C, formula: &Expr) -> Verdict {
    match checker.check_valid(formula) {
        Ok(Validity::Valid) => Verdict::Verified,
        Ok(Validity::Invalid(_)) => Verdict::Unverified,
        Ok(Validity::Unknown(_)) | Err(_) => Verdict::Unknown,
    }
}
