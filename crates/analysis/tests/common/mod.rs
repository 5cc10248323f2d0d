//! Shared helpers for the analysis integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;

use pivc_analysis::eval::{ArrayValue, Evaluator, Valuation, Value};
use pivc_analysis::{CounterModel, Expr, Predicate, Program, ScalarTy, Ty, Validity, ValidityChecker};

/// Decides validity by trying every assignment of the free variables over a
/// small domain. Sound for "invalid", optimistic for "valid"; good enough
/// for small hand-written programs.
#[derive(Default)]
pub struct BoundedChecker {
    program: Program,
    pub queries: Vec<Expr>,
}

const INTS: [i64; 9] = [-4, -3, -2, -1, 0, 1, 2, 3, 4];
const FLOATS: [f64; 4] = [-1.0, 0.0, 0.5, 2.0];

impl BoundedChecker {
    pub fn new() -> Self {
        Self::default()
    }

    fn candidates(ty: Ty) -> Vec<Value> {
        match ty {
            Ty::Int => INTS.iter().copied().map(Value::Int).collect(),
            Ty::Float => FLOATS.iter().copied().map(Value::Float).collect(),
            Ty::Bool => vec![Value::Bool(false), Value::Bool(true)],
            Ty::Array(elem) => {
                let base = match elem {
                    ScalarTy::Int => vec![Value::Int(0), Value::Int(1)],
                    ScalarTy::Float => vec![Value::Float(0.0), Value::Float(1.0)],
                    ScalarTy::Bool => vec![Value::Bool(false), Value::Bool(true)],
                };
                base.into_iter()
                    .map(|v| Value::Array(ArrayValue::constant(v)))
                    .collect()
            }
        }
    }
}

impl ValidityChecker for BoundedChecker {
    type Error = String;

    fn define_predicate(&mut self, predicate: &Predicate) -> Result<(), String> {
        self.program.predicates.push(predicate.clone());
        Ok(())
    }

    fn check_valid(&mut self, formula: &Expr) -> Result<Validity, String> {
        self.queries.push(formula.clone());
        let evaluator = Evaluator::new(&self.program).with_domain(-4..=4);
        let vars: Vec<(String, Ty)> = formula.free_variables().into_iter().collect();

        let mut assignment = vec![0usize; vars.len()];
        let choices: Vec<Vec<Value>> = vars.iter().map(|(_, ty)| Self::candidates(*ty)).collect();
        loop {
            let env: Valuation = vars
                .iter()
                .zip(&assignment)
                .zip(&choices)
                .map(|(((name, _), &k), options)| (name.clone(), options[k].clone()))
                .collect();
            if !evaluator.eval_bool(formula, &env).map_err(|e| e.to_string())? {
                let model: BTreeMap<String, String> =
                    env.into_iter().map(|(k, v)| (k, v.to_string())).collect();
                return Ok(Validity::Invalid(CounterModel { assignments: model }));
            }

            // odometer step
            let mut pos = 0;
            loop {
                if pos == assignment.len() {
                    return Ok(Validity::Valid);
                }
                assignment[pos] += 1;
                if assignment[pos] < choices[pos].len() {
                    break;
                }
                assignment[pos] = 0;
                pos += 1;
            }
        }
    }
}
