//! Driver pipeline tests.
//!
//! Solver-backed tests call the real Z3 binary and return early when it
//! cannot be found.

use std::path::PathBuf;

use pivc_analysis::{
    Expr, ObligationKind, Program, ProgramBuilder, ScalarTy, Ty, Variable, Verdict, VerifyOptions,
};
use pivc_driver::json_output::JsonReport;
use pivc_driver::output::render_report;
use pivc_driver::{CfgTarget, load_program, verify_program, write_cfg};
use pivc_solver::{CliSolver, SolverKind};

fn make_solver() -> Option<CliSolver> {
    match CliSolver::with_default_config_for(SolverKind::Z3) {
        Ok(solver) => Some(solver),
        Err(err) => {
            eprintln!("skipping: {err}");
            None
        }
    }
}

fn int(name: &str) -> Variable {
    Variable::local(name, Ty::Int)
}

fn v(var: &Variable) -> Expr {
    Expr::var(var)
}

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pivc-{}-{name}", std::process::id()))
}

/// `i := 0; while i < n (inv 0 <= i) { i := i + 1 }; rv := i` with
/// postcondition `rv >= bound`.
fn counting_loop(bound: i64) -> Program {
    let n = int("n");
    let i = int("i");
    let rv = int("rv");
    let mut b = ProgramBuilder::new();
    let f = b.declare_function(
        "count",
        vec![n.clone()],
        vec![rv.clone()],
        Expr::ge(v(&n), Expr::int(0)),
        Expr::ge(v(&rv), Expr::int(bound)),
    );
    let mut body = b.body(f);
    let (pre, post) = (body.precondition(), body.postcondition());
    let init = body.basic_block();
    let head = body.loop_head(Expr::le(Expr::int(0), v(&i)), vec![]);
    let step = body.basic_block();
    let exit = body.basic_block();
    body.edge(pre, init)
        .assign(init, &i, Expr::int(0))
        .edge(init, head)
        .edge(head, step)
        .assume(step, Expr::lt(v(&i), v(&n)))
        .assign(step, &i, Expr::add(v(&i), Expr::int(1)))
        .edge(step, head)
        .edge(head, exit)
        .assume(exit, Expr::not(Expr::lt(v(&i), v(&n))))
        .assign(exit, &rv, v(&i))
        .edge(exit, post);
    b.finish().unwrap()
}

#[test]
fn program_file_round_trip_and_cfg() {
    let program = counting_loop(0);
    let source = scratch("count.json");
    std::fs::write(&source, serde_json::to_string(&program).unwrap()).unwrap();

    let loaded = load_program(&source).unwrap();
    assert_eq!(loaded, program);

    let cfg = scratch("count.cfg");
    write_cfg(&loaded, &CfgTarget::File(cfg.clone())).unwrap();
    let text = std::fs::read_to_string(&cfg).unwrap();
    assert!(text.starts_with("[function] count("), "{text}");
    assert!(text.contains("@invariant"), "{text}");

    let _ = std::fs::remove_file(source);
    let _ = std::fs::remove_file(cfg);
}

#[test]
fn loop_with_invariant_verifies() {
    let Some(solver) = make_solver() else { return };
    let report = verify_program(&counting_loop(0), solver, VerifyOptions::default()).unwrap();
    assert_eq!(report.verdict(), Verdict::Verified, "{report:?}");
    assert_eq!(report.functions[0].checked, 3);
}

#[test]
fn weak_invariant_leaves_postcondition_unproven() {
    let Some(solver) = make_solver() else { return };
    // 0 <= i and !(i < n) do not give i >= 1 when n = 0
    let report = verify_program(&counting_loop(1), solver, VerifyOptions::default()).unwrap();
    assert_eq!(report.verdict(), Verdict::Unverified);

    let failure = report.functions[0].failure.as_ref().unwrap();
    assert_eq!(failure.kind, ObligationKind::Postcondition);
    let model = failure.counterexample.as_ref().unwrap();
    assert!(model.get("i").is_some() || model.get("n").is_some(), "{model}");

    colored::control::set_override(false);
    let text = render_report(&report, false);
    assert!(text.contains("*** COUNTER MODEL"), "{text}");
    assert!(text.ends_with("UNVERIFIED\n"), "{text}");

    let json = serde_json::to_value(JsonReport::from(&report)).unwrap();
    assert_eq!(json["verdict"], "unverified");
    assert_eq!(json["functions"][0]["failure"]["vc_kind"], "postcondition");
}

#[test]
fn array_predicate_uses_the_length() {
    let Some(solver) = make_solver() else { return };
    let a = Variable::array("a", ScalarTy::Int);
    let p = Variable::array("p", ScalarTy::Int);
    let len = p.length_var().unwrap();
    let mut b = ProgramBuilder::new();
    b.predicate(
        "nonempty",
        vec![p.clone()],
        Expr::gt(Expr::var(&len), Expr::int(0)),
    );
    let f = b.declare_function(
        "first",
        vec![a.clone()],
        vec![],
        Expr::app("nonempty", vec![v(&a)]),
        Expr::and(
            Expr::eq(Expr::read(v(&a), Expr::int(0)), Expr::int(7)),
            Expr::app("nonempty", vec![v(&a)]),
        ),
    );
    let mut body = b.body(f);
    let (pre, post) = (body.precondition(), body.postcondition());
    let blk = body.basic_block();
    body.edge(pre, blk)
        .assign_index(blk, &a, Expr::int(0), Expr::int(7))
        .edge(blk, post);
    let program = b.finish().unwrap();

    let report = verify_program(&program, solver, VerifyOptions::default()).unwrap();
    assert_eq!(report.verdict(), Verdict::Verified, "{report:?}");
}

#[test]
fn keep_going_reports_every_function() {
    let Some(solver) = make_solver() else { return };
    let mut program = counting_loop(1);
    let mut ok = counting_loop(0);
    ok.functions[0].name = "count_ok".into();
    program.functions.push(ok.functions.remove(0));

    let report = verify_program(&program, solver, VerifyOptions { keep_going: true }).unwrap();
    assert_eq!(report.functions.len(), 2);
    assert_eq!(report.function("count").unwrap().verdict, Verdict::Unverified);
    assert_eq!(report.function("count_ok").unwrap().verdict, Verdict::Verified);
}
