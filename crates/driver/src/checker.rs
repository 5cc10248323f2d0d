/// `ValidityChecker` backed by an SMT solver.
///
/// A formula is valid when its negation is unsatisfiable, so every query
/// asserts `(not vc)` and reads the answer backwards.
use std::collections::BTreeMap;

use pivc_analysis::encode_sort::encode_type;
use pivc_analysis::encode_term::{declarations, encode_expr, predicate_definition};
use pivc_analysis::eval::Evaluator;
use pivc_analysis::{CounterModel, Expr, Predicate, Program, Validity, ValidityChecker};
use pivc_smtlib::{Command, Script, Term};
use pivc_solver::{SolverBackend, SolverError, SolverResult};

pub struct SmtChecker<B> {
    backend: B,
    /// Registered predicates, kept for their definitions and for replay.
    predicates: Program,
    queries: usize,
}

impl<B: SolverBackend> SmtChecker<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            predicates: Program::default(),
            queries: 0,
        }
    }

    /// Number of formulas sent to the solver so far.
    pub fn queries(&self) -> usize {
        self.queries
    }

    /// The script deciding validity of `formula`.
    pub fn script_for(&self, formula: &Expr) -> Script {
        let mut script = Script::new();
        script.push(Command::SetOption("produce-models".into(), "true".into()));
        script.push(Command::SetLogic("ALL".into()));

        // predicate bodies may use function symbols too
        let mut functions = BTreeMap::new();
        for predicate in &self.predicates.predicates {
            functions.extend(predicate.expression.function_symbols());
        }
        let mut commands = declarations(formula);
        commands.retain(|c| !matches!(c, Command::DeclareFun(name, ..) if functions.contains_key(name)));
        script.extend(commands);
        script.extend(functions.into_iter().map(|(name, (params, result))| {
            Command::DeclareFun(
                name,
                params.into_iter().map(encode_type).collect(),
                encode_type(result),
            )
        }));

        script.extend(self.predicates.predicates.iter().map(predicate_definition));
        script.assert(Term::not(encode_expr(formula)));
        script.push(Command::CheckSat);
        script.push(Command::GetModel);
        script
    }

    fn replay(&self, formula: &Expr, model: &CounterModel) {
        match Evaluator::new(&self.predicates).replay(formula, model) {
            Ok(false) => tracing::debug!("counter model falsifies the formula"),
            Ok(true) => tracing::warn!("counter model does not falsify the formula on replay"),
            Err(err) => tracing::trace!(error = %err, "counter model not replayable"),
        }
    }
}

impl<B: SolverBackend> ValidityChecker for SmtChecker<B> {
    type Error = SolverError;

    fn define_predicate(&mut self, predicate: &Predicate) -> Result<(), SolverError> {
        tracing::debug!(predicate = %predicate.name, "registering predicate");
        self.predicates.predicates.push(predicate.clone());
        Ok(())
    }

    fn check_valid(&mut self, formula: &Expr) -> Result<Validity, SolverError> {
        let script = self.script_for(formula);
        self.queries += 1;
        tracing::trace!(query = self.queries, script = %script, "solver query");

        match self.backend.check_sat(&script)? {
            SolverResult::Unsat => Ok(Validity::Valid),
            SolverResult::Sat(model) => {
                let free = formula.free_variables();
                let model = CounterModel::new(
                    model
                        .into_iter()
                        .flat_map(|m| m.assignments)
                        .filter(|(name, _)| free.contains_key(name)),
                );
                self.replay(formula, &model);
                Ok(Validity::Invalid(model))
            }
            SolverResult::Unknown(reason) => Ok(Validity::Unknown(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivc_analysis::{ScalarTy, Ty, Variable};
    use pivc_analysis::types::SigId;
    use pivc_solver::Model;
    use std::cell::RefCell;

    /// Replays canned solver answers and records the scripts it was given.
    struct Canned {
        answers: RefCell<Vec<SolverResult>>,
        scripts: RefCell<Vec<String>>,
    }

    impl Canned {
        fn new(mut answers: Vec<SolverResult>) -> Self {
            answers.reverse();
            Self {
                answers: RefCell::new(answers),
                scripts: RefCell::new(Vec::new()),
            }
        }
    }

    impl SolverBackend for Canned {
        fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
            self.scripts.borrow_mut().push(script.to_string());
            self.answers
                .borrow_mut()
                .pop()
                .ok_or_else(|| SolverError::ProcessError("no answer".into()))
        }
    }

    fn x() -> Variable {
        Variable::local("x", Ty::Int)
    }

    #[test]
    fn unsat_means_valid() {
        let mut checker = SmtChecker::new(Canned::new(vec![SolverResult::Unsat]));
        let vc = Expr::implies(
            Expr::gt(Expr::var(&x()), Expr::int(0)),
            Expr::ge(Expr::var(&x()), Expr::int(0)),
        );
        assert_eq!(checker.check_valid(&vc).unwrap(), Validity::Valid);
        assert_eq!(checker.queries(), 1);

        let scripts = checker.backend.scripts.borrow();
        assert_eq!(
            scripts[0],
            "(set-option :produce-models true)\n\
             (set-logic ALL)\n\
             (declare-const x Int)\n\
             (assert (not (=> (> x 0) (>= x 0))))\n\
             (check-sat)\n\
             (get-model)"
        );
    }

    #[test]
    fn sat_gives_counter_model_for_free_variables() {
        let model = Model::with_assignments(vec![
            ("x".to_string(), "(- 1)".to_string()),
            ("unrelated".to_string(), "3".to_string()),
        ]);
        let mut checker = SmtChecker::new(Canned::new(vec![SolverResult::Sat(Some(model))]));
        let vc = Expr::ge(Expr::var(&x()), Expr::int(0));
        let Validity::Invalid(cex) = checker.check_valid(&vc).unwrap() else {
            panic!("expected invalid");
        };
        assert_eq!(cex.get("x"), Some("(- 1)"));
        assert_eq!(cex.get("unrelated"), None);
    }

    #[test]
    fn unknown_and_errors_pass_through() {
        let mut checker = SmtChecker::new(Canned::new(vec![SolverResult::Unknown(
            "timeout".into(),
        )]));
        let vc = Expr::bool(true);
        assert_eq!(
            checker.check_valid(&vc).unwrap(),
            Validity::Unknown("timeout".into())
        );
        assert!(checker.check_valid(&vc).is_err());
    }

    #[test]
    fn predicates_are_defined_before_the_query() {
        let a = Variable::array("a", ScalarTy::Int);
        let len = a.length_var().unwrap();
        let pred = Predicate {
            name: "nonempty".into(),
            ty: SigId(0),
            parameters: vec![a.clone()],
            expression: Expr::gt(Expr::var(&len), Expr::int(0)),
        };
        let mut checker = SmtChecker::new(Canned::new(vec![SolverResult::Unsat]));
        checker.define_predicate(&pred).unwrap();

        let b = Variable::array("b", ScalarTy::Int);
        let vc = Expr::app("nonempty", vec![Expr::var(&b)]);
        let script = checker.script_for(&vc).to_string();
        let define = script.find("(define-fun nonempty").unwrap();
        let declare = script.find("(declare-const b$length Int)").unwrap();
        let assert = script.find("(assert (not (nonempty b b$length)))").unwrap();
        assert!(declare < define && define < assert, "{script}");
    }
}
