//! SMT-LIB2 text formatting for AST types.
//!
//! Implements `Display` for [`Sort`], [`Term`], [`Command`], and [`Script`],
//! producing valid SMT-LIB2 output that can be parsed by solvers such as Z3.

use std::fmt;

use crate::command::Command;
use crate::script::Script;
use crate::sort::Sort;
use crate::term::Term;

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Int => write!(f, "Int"),
            Sort::Real => write!(f, "Real"),
            Sort::Array(index, element) => write!(f, "(Array {index} {element})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// Format a real literal. SMT-LIB decimals need a fractional part and
/// negative values are written as `(- N)`.
fn fmt_real_lit(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let magnitude = value.abs();
    let mut text = format!("{magnitude}");
    if !text.contains('.') {
        text.push_str(".0");
    }
    if value.is_sign_negative() && magnitude != 0.0 {
        write!(f, "(- {text})")
    } else {
        write!(f, "{text}")
    }
}

/// Write a binary SMT-LIB operator: `(op lhs rhs)`.
fn fmt_binop(op: &str, lhs: &Term, rhs: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({op} {lhs} {rhs})")
}

/// Write a unary SMT-LIB operator: `(op arg)`.
fn fmt_unop(op: &str, arg: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({op} {arg})")
}

/// Write sorted variable bindings: `((x Sort) (y Sort) ...)`.
fn fmt_sorted_vars(vars: &[(String, Sort)], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(")?;
    for (i, (name, sort)) in vars.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "({name} {sort})")?;
    }
    write!(f, ")")
}

/// Write a space-separated list of terms.
fn fmt_term_list(terms: &[Term], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, t) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{t}")?;
    }
    Ok(())
}

/// Write an n-ary connective, falling back to its unit for empty operand lists.
fn fmt_nary(op: &str, unit: &str, terms: &[Term], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match terms {
        [] => write!(f, "{unit}"),
        [single] => write!(f, "{single}"),
        _ => {
            write!(f, "({op} ")?;
            fmt_term_list(terms, f)?;
            write!(f, ")")
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // --- Literals ---
            Term::BoolLit(true) => write!(f, "true"),
            Term::BoolLit(false) => write!(f, "false"),
            Term::IntLit(n) => {
                if *n < 0 {
                    // SMT-LIB represents negative integers as `(- N)`
                    write!(f, "(- {})", n.unsigned_abs())
                } else {
                    write!(f, "{n}")
                }
            }
            Term::RealLit(r) => fmt_real_lit(*r, f),

            // --- Variables ---
            Term::Const(name) => write!(f, "{name}"),

            // --- Boolean operations ---
            Term::Not(inner) => fmt_unop("not", inner, f),
            Term::And(terms) => fmt_nary("and", "true", terms, f),
            Term::Or(terms) => fmt_nary("or", "false", terms, f),
            Term::Implies(lhs, rhs) => fmt_binop("=>", lhs, rhs, f),
            Term::Iff(lhs, rhs) => fmt_binop("=", lhs, rhs, f),

            // --- Core ---
            Term::Eq(lhs, rhs) => fmt_binop("=", lhs, rhs, f),
            Term::Distinct(terms) => {
                write!(f, "(distinct ")?;
                fmt_term_list(terms, f)?;
                write!(f, ")")
            }
            Term::Ite(cond, then_branch, else_branch) => {
                write!(f, "(ite {cond} {then_branch} {else_branch})")
            }

            // --- Arithmetic ---
            Term::Add(a, b) => fmt_binop("+", a, b, f),
            Term::Sub(a, b) => fmt_binop("-", a, b, f),
            Term::Mul(a, b) => fmt_binop("*", a, b, f),
            Term::Neg(a) => fmt_unop("-", a, f),
            Term::IntDiv(a, b) => fmt_binop("div", a, b, f),
            Term::IntMod(a, b) => fmt_binop("mod", a, b, f),
            Term::RealDiv(a, b) => fmt_binop("/", a, b, f),
            Term::Lt(a, b) => fmt_binop("<", a, b, f),
            Term::Le(a, b) => fmt_binop("<=", a, b, f),
            Term::Gt(a, b) => fmt_binop(">", a, b, f),
            Term::Ge(a, b) => fmt_binop(">=", a, b, f),

            // --- Array operations ---
            Term::Select(arr, idx) => fmt_binop("select", arr, idx, f),
            Term::Store(arr, idx, val) => {
                write!(f, "(store {arr} {idx} {val})")
            }

            // --- Quantifiers ---
            Term::Forall(vars, body) => {
                write!(f, "(forall ")?;
                fmt_sorted_vars(vars, f)?;
                write!(f, " {body})")
            }
            Term::Exists(vars, body) => {
                write!(f, "(exists ")?;
                fmt_sorted_vars(vars, f)?;
                write!(f, " {body})")
            }

            // --- Function application ---
            Term::App(name, args) => {
                if args.is_empty() {
                    write!(f, "{name}")
                } else {
                    write!(f, "({name} ")?;
                    fmt_term_list(args, f)?;
                    write!(f, ")")
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetLogic(logic) => write!(f, "(set-logic {logic})"),
            Command::SetOption(key, value) => write!(f, "(set-option :{key} {value})"),
            Command::DeclareConst(name, sort) => {
                write!(f, "(declare-const {name} {sort})")
            }
            Command::DeclareFun(name, param_sorts, return_sort) => {
                write!(f, "(declare-fun {name} (")?;
                for (i, s) in param_sorts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{s}")?;
                }
                write!(f, ") {return_sort})")
            }
            Command::DefineFun(name, params, return_sort, body) => {
                write!(f, "(define-fun {name} ")?;
                fmt_sorted_vars(params, f)?;
                write!(f, " {return_sort} {body})")
            }
            Command::Assert(term) => write!(f, "(assert {term})"),
            Command::CheckSat => write!(f, "(check-sat)"),
            Command::GetModel => write!(f, "(get-model)"),
            Command::Push(n) => write!(f, "(push {n})"),
            Command::Pop(n) => write!(f, "(pop {n})"),
            Command::Comment(text) => write!(f, ";; {text}"),
            Command::Exit => write!(f, "(exit)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{cmd}")?;
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
