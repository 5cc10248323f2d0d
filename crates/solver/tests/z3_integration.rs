//! Integration tests for the subprocess solver interface.
//!
//! These tests call the real Z3 binary. They return early when Z3 cannot be
//! found so the suite stays green on machines without it.

use std::path::PathBuf;

use pivc_smtlib::{Command as SmtCmd, Script, Sort, Term};

use pivc_solver::{CliSolver, SolverConfig, SolverError, SolverKind, SolverResult};

fn make_solver() -> Option<CliSolver> {
    match CliSolver::with_default_config() {
        Ok(solver) => Some(solver),
        Err(err) => {
            eprintln!("skipping: {err}");
            None
        }
    }
}

fn int(n: i128) -> Box<Term> {
    Box::new(Term::IntLit(n))
}

fn var(name: &str) -> Box<Term> {
    Box::new(Term::var(name))
}

#[test]
fn raw_simple_sat() {
    let Some(solver) = make_solver() else { return };
    let result = solver
        .check_sat_raw(
            "\
(declare-const x Int)
(assert (> x 0))
(assert (< x 10))
(check-sat)
(get-model)
",
        )
        .unwrap();

    assert!(result.is_sat(), "Expected SAT, got: {result:?}");
    let model = result.model().expect("Expected model in SAT result");
    let x: i64 = model.get("x").unwrap().parse().unwrap();
    assert!(x > 0 && x < 10, "x = {x}, expected 0 < x < 10");
}

#[test]
fn raw_simple_unsat() {
    let Some(solver) = make_solver() else { return };
    let result = solver
        .check_sat_raw(
            "\
(declare-const x Int)
(assert (> x 5))
(assert (< x 3))
(check-sat)
",
        )
        .unwrap();

    assert!(result.is_unsat(), "Expected UNSAT, got: {result:?}");
}

#[test]
fn script_negated_validity_query_is_unsat() {
    // not (x > 0 => x + 1 > 1)
    let Some(solver) = make_solver() else { return };
    let mut script = Script::new();
    script.push(SmtCmd::SetLogic("ALL".to_string()));
    script.push(SmtCmd::DeclareConst("x".to_string(), Sort::Int));
    script.assert(Term::not(Term::implies(
        Term::Gt(var("x"), int(0)),
        Term::Gt(Box::new(Term::Add(var("x"), int(1))), int(1)),
    )));

    let result = solver.check_sat(&script).unwrap();
    assert_eq!(result, SolverResult::Unsat);
}

#[test]
fn script_counterexample_has_model() {
    // not (x = 5 => x = 6) is satisfiable with x = 5
    let Some(solver) = make_solver() else { return };
    let mut script = Script::new();
    script.push(SmtCmd::DeclareConst("x".to_string(), Sort::Int));
    script.assert(Term::not(Term::implies(
        Term::eq(Term::var("x"), Term::IntLit(5)),
        Term::eq(Term::var("x"), Term::IntLit(6)),
    )));

    let result = solver.check_sat(&script).unwrap();
    let model = result.model().expect("Expected model");
    assert_eq!(model.get("x"), Some("5"));
}

#[test]
fn script_arrays_and_define_fun() {
    // sorted(a) := a[0] <= a[1]; store a 1 (a[0]) keeps it sorted
    let Some(solver) = make_solver() else { return };
    let arr = Sort::int_array(Sort::Int);
    let mut script = Script::new();
    script.push(SmtCmd::DefineFun(
        "sorted".to_string(),
        vec![("b".to_string(), arr.clone())],
        Sort::Bool,
        Term::Le(
            Box::new(Term::Select(var("b"), int(0))),
            Box::new(Term::Select(var("b"), int(1))),
        ),
    ));
    script.push(SmtCmd::DeclareConst("a".to_string(), arr));
    let updated = Term::Store(var("a"), int(1), Box::new(Term::Select(var("a"), int(0))));
    script.assert(Term::not(Term::App("sorted".to_string(), vec![updated])));

    let result = solver.check_sat(&script).unwrap();
    assert!(result.is_unsat(), "Expected UNSAT, got: {result:?}");
}

#[test]
fn script_quantifier() {
    let Some(solver) = make_solver() else { return };
    let mut script = Script::new();
    script.assert(Term::not(Term::Forall(
        vec![("i".to_string(), Sort::Int)],
        Box::new(Term::implies(
            Term::Gt(var("i"), int(0)),
            Term::Ge(var("i"), int(1)),
        )),
    )));

    let result = solver.check_sat(&script).unwrap();
    assert!(result.is_unsat(), "Expected UNSAT, got: {result:?}");
}

#[test]
fn script_real_arithmetic() {
    let Some(solver) = make_solver() else { return };
    let mut script = Script::new();
    script.push(SmtCmd::DeclareConst("r".to_string(), Sort::Real));
    script.assert(Term::eq(
        Term::Mul(Box::new(Term::RealLit(2.0)), var("r")),
        Term::RealLit(1.0),
    ));

    let result = solver.check_sat(&script).unwrap();
    assert!(result.is_sat(), "Expected SAT, got: {result:?}");
}

#[test]
fn nonexistent_binary_returns_not_found() {
    let config = SolverConfig::new(SolverKind::Z3, PathBuf::from("/nonexistent/z3"));
    let solver = CliSolver::new(config);
    let err = solver.check_sat_raw("(check-sat)").unwrap_err();
    assert!(matches!(err, SolverError::NotFound(SolverKind::Z3, _)));
}
