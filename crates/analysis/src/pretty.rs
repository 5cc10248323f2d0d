/// Textual dump of the control-flow IR, for `--print-cfg`.
use std::fmt::{self, Write};

use crate::expr::Expr;
use crate::ir::{
    Block, BlockId, BlockKind, Function, Predicate, Program, Statement, StatementKind, Variable,
};

pub fn print_program(program: &Program, out: &mut impl Write) -> fmt::Result {
    for predicate in &program.predicates {
        print_predicate(predicate, out)?;
        writeln!(out)?;
    }
    for function in &program.functions {
        print_function(program, function, out)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Render the whole program into a string.
pub fn program_to_string(program: &Program) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = print_program(program, &mut out);
    out
}

fn print_predicate(predicate: &Predicate, out: &mut impl Write) -> fmt::Result {
    writeln!(
        out,
        "[predicate] {}({})",
        predicate.name,
        declarations(&predicate.parameters)
    )?;
    writeln!(out, "\t{}", predicate.expression)
}

pub fn print_function(program: &Program, function: &Function, out: &mut impl Write) -> fmt::Result {
    writeln!(
        out,
        "[function] {}({}) -> ({})",
        function.name,
        declarations(&function.parameters),
        declarations(&function.rvs)
    )?;
    for block in &function.blocks {
        print_block(program, function, block, out)?;
    }
    Ok(())
}

fn print_block(
    program: &Program,
    function: &Function,
    block: &Block,
    out: &mut impl Write,
) -> fmt::Result {
    writeln!(out, "{}:", block.label())?;
    if !matches!(block.kind, BlockKind::Precondition { .. }) {
        print_edges(out, "predecessors", &block.predecessors, function)?;
    }
    if !matches!(block.kind, BlockKind::Postcondition { .. }) {
        print_edges(out, "successors", &block.successors, function)?;
    }
    match &block.kind {
        BlockKind::Precondition {
            condition,
            ranking_function,
        } => {
            writeln!(out, "\t@pre {condition}")?;
            print_ranking_function(ranking_function, out)?;
        }
        BlockKind::Postcondition { condition } => writeln!(out, "\t@post {condition}")?,
        BlockKind::LoopHead {
            invariant,
            ranking_function,
        } => {
            writeln!(out, "\t@invariant {invariant}")?;
            print_ranking_function(ranking_function, out)?;
        }
        BlockKind::Basic => {}
    }
    for stmt in &block.statements {
        print_statement(program, stmt, out)?;
    }
    Ok(())
}

fn print_edges(
    out: &mut impl Write,
    name: &str,
    ids: &[BlockId],
    function: &Function,
) -> fmt::Result {
    write!(out, "\t{name}:")?;
    for id in ids {
        let label = function
            .block(*id)
            .map_or_else(|| format!("{id:?}"), Block::label);
        write!(out, " {label}")?;
    }
    writeln!(out)
}

fn print_ranking_function(ranking: &[Expr], out: &mut impl Write) -> fmt::Result {
    if ranking.is_empty() {
        return Ok(());
    }
    writeln!(out, "\t#rankingfunction")?;
    writeln!(out, "\t(")?;
    for (i, e) in ranking.iter().enumerate() {
        let sep = if i + 1 < ranking.len() { "," } else { "" };
        writeln!(out, "\t\t{e}{sep}")?;
    }
    writeln!(out, "\t)")
}

fn print_statement(program: &Program, stmt: &Statement, out: &mut impl Write) -> fmt::Result {
    match &stmt.kind {
        StatementKind::VariableAssign { variable, rhs } => {
            writeln!(out, "\t({}: {}) := {rhs}", variable.name, variable.ty)
        }
        StatementKind::SubscriptAssign { array, index, rhs } => {
            let elem = array.ty.element().unwrap_or(array.ty);
            writeln!(out, "\t({}[{index}]: {elem}) := {rhs}", array.name)
        }
        StatementKind::FunctionCall { lhs, call } => {
            write!(out, "\t")?;
            for v in lhs {
                write!(out, "({}: {}) := ", v.name, v.ty)?;
            }
            let callee = program
                .function(call.function)
                .map_or_else(|| format!("{:?}", call.function), |f| f.name.clone());
            let args: Vec<String> = call.args.iter().map(ToString::to_string).collect();
            writeln!(out, "{callee}({})", args.join(", "))
        }
        StatementKind::Assert { annotation } => writeln!(out, "\t@assert {annotation}"),
        StatementKind::Assume { condition } => writeln!(out, "\tassume {condition}"),
    }
}

fn declarations(vars: &[Variable]) -> String {
    vars.iter()
        .map(|v| format!("{}: {}", v.name, v.ty))
        .collect::<Vec<_>>()
        .join(", ")
}
