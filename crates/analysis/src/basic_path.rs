/// Basic-path enumeration.
///
/// A basic path is a straight-line run of blocks between two obligation
/// points. Runs start at the function precondition or at a loop head
/// (assuming its invariant) and end at the postcondition, at a loop head
/// (establishing or maintaining its invariant), or just before an
/// `assert` or call statement (whose obligation is checked on the spot).
///
/// The search is depth first over successor lists. At each block the
/// obligations of postcondition and loop-head successors are emitted before
/// any ordinary successor is explored, so the order in which paths are
/// reported is fully determined by the IR.
use std::fmt;
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::error::VerifyError;
use crate::expr::Expr;
use crate::ir::{Block, BlockId, BlockKind, Function, Program, Statement, StatementKind};
use crate::wlp::bind_parameters;

/// Where a basic path begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStart {
    Precondition,
    LoopHead(BlockId),
}

/// What the end of a basic path has to establish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObligationKind {
    Postcondition,
    /// Invariant holds on first arrival at the loop head.
    InvariantEstablished(BlockId),
    /// Invariant holds again after one trip around the loop.
    InvariantMaintained(BlockId),
    Assertion { ordinal: usize },
    /// The callee's precondition holds at the call site.
    CallPrecondition { ordinal: usize, callee: String },
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObligationKind::Postcondition => write!(f, "postcondition"),
            ObligationKind::InvariantEstablished(head) => {
                write!(f, "invariant of _LOOPHEAD#{} on entry", head.0)
            }
            ObligationKind::InvariantMaintained(head) => {
                write!(f, "invariant of _LOOPHEAD#{} preserved", head.0)
            }
            ObligationKind::Assertion { ordinal } => write!(f, "assertion #{ordinal}"),
            ObligationKind::CallPrecondition { ordinal, callee } => {
                write!(f, "precondition of `{callee}` at call #{ordinal}")
            }
        }
    }
}

/// A block on a path and the prefix of its statements that the path covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSegment<'a> {
    pub block: BlockId,
    pub statements: &'a [Statement],
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicPath<'a> {
    pub start: PathStart,
    /// Fact assumed at the start: the precondition or a loop invariant.
    pub precondition: Expr,
    pub segments: Vec<PathSegment<'a>>,
    pub obligation: Expr,
    pub kind: ObligationKind,
}

impl BasicPath<'_> {
    /// Block labels along the path, e.g. `_PRECOND#0 -> _BASIC#2`.
    pub fn route(&self, function: &Function) -> String {
        let label = |id: BlockId| {
            function
                .block(id)
                .map_or_else(|| format!("#{}", id.0), Block::label)
        };
        let start = match self.start {
            PathStart::Precondition => label(function.precondition),
            PathStart::LoopHead(head) => label(head),
        };
        let mut route = vec![start];
        route.extend(
            self.segments
                .iter()
                .filter(|s| PathStart::LoopHead(s.block) != self.start)
                .map(|s| label(s.block)),
        );
        route.join(" -> ")
    }

    /// One-line description for diagnostics.
    pub fn describe(&self, function: &Function) -> String {
        format!("{} along {}", self.kind, self.route(function))
    }
}

/// The run of blocks being extended on the current search branch.
///
/// Cloned at every fan-out so sibling branches never share statements.
#[derive(Debug, Clone)]
struct Run<'a> {
    start: PathStart,
    precondition: &'a Expr,
    segments: Vec<PathSegment<'a>>,
    /// Ordinary blocks already on this run.
    visited: Vec<BlockId>,
    /// Loop heads entered on this branch, innermost last.
    open_loops: Vec<BlockId>,
}

/// Depth-first basic-path search over one function.
pub struct PathEnumerator<'a> {
    program: &'a Program,
    function: &'a Function,
}

type Flow = Result<ControlFlow<()>, VerifyError>;

impl<'a> PathEnumerator<'a> {
    pub fn new(program: &'a Program, function: &'a Function) -> Self {
        Self { program, function }
    }

    /// Emit every basic path to `visit`, in exploration order.
    ///
    /// The walk stops as soon as `visit` breaks or fails.
    pub fn walk<F>(&self, mut visit: F) -> Flow
    where
        F: FnMut(BasicPath<'a>) -> Flow,
    {
        let entry = self.block(self.function.precondition)?;
        let BlockKind::Precondition { condition, .. } = &entry.kind else {
            return Err(self.defect(format!("{} is not a precondition block", entry.label())));
        };
        if entry.successors.len() != 1 {
            return Err(self.defect(format!(
                "{} has {} successors, expected exactly one",
                entry.label(),
                entry.successors.len()
            )));
        }

        let run = Run {
            start: PathStart::Precondition,
            precondition: condition,
            segments: Vec::new(),
            visited: Vec::new(),
            open_loops: Vec::new(),
        };
        self.fan_out(run, entry, &mut visit)
    }

    fn block(&self, id: BlockId) -> Result<&'a Block, VerifyError> {
        self.function
            .block(id)
            .ok_or_else(|| self.defect(format!("block {id:?} does not exist")))
    }

    fn defect(&self, message: String) -> VerifyError {
        VerifyError::structure(&self.function.name, message)
    }

    fn emit<F>(&self, run: &Run<'a>, obligation: Expr, kind: ObligationKind, visit: &mut F) -> Flow
    where
        F: FnMut(BasicPath<'a>) -> Flow,
    {
        tracing::trace!(function = %self.function.name, obligation = %kind, "emit basic path");
        visit(BasicPath {
            start: run.start,
            precondition: run.precondition.clone(),
            segments: run.segments.clone(),
            obligation,
            kind,
        })
    }

    /// Append `block` to the run, emit its statement-level obligations, then
    /// continue with its successors.
    fn extend<F>(&self, mut run: Run<'a>, block: &'a Block, visit: &mut F) -> Flow
    where
        F: FnMut(BasicPath<'a>) -> Flow,
    {
        if !block.is_loop_head() {
            if run.visited.contains(&block.id) {
                return Err(self.defect(format!(
                    "cycle through {} does not pass through a loop head",
                    block.label()
                )));
            }
            run.visited.push(block.id);
        }

        run.segments.push(PathSegment {
            block: block.id,
            statements: &[],
        });

        for (index, stmt) in block.statements.iter().enumerate() {
            let Some((obligation, kind)) = self.statement_obligation(stmt)? else {
                continue;
            };
            if let Some(last) = run.segments.last_mut() {
                last.statements = &block.statements[..index];
            }
            if self.emit(&run, obligation, kind, visit)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        if let Some(last) = run.segments.last_mut() {
            last.statements = &block.statements;
        }
        self.fan_out(run, block, visit)
    }

    /// Obligation checked just before `stmt`, if any.
    fn statement_obligation(
        &self,
        stmt: &Statement,
    ) -> Result<Option<(Expr, ObligationKind)>, VerifyError> {
        match &stmt.kind {
            StatementKind::Assert { annotation } => Ok(Some((
                annotation.clone(),
                ObligationKind::Assertion {
                    ordinal: stmt.ordinal,
                },
            ))),
            StatementKind::FunctionCall { call, .. } => {
                let callee = self
                    .program
                    .function(call.function)
                    .ok_or(VerifyError::UnknownFunction(call.function))?;
                let pre = callee.precondition_expr().ok_or_else(|| {
                    VerifyError::structure(&callee.name, "missing precondition block")
                })?;
                // Nothing to prove for an unconstrained callee.
                if *pre == Expr::BoolLit(true) {
                    return Ok(None);
                }
                let bindings = bind_parameters(callee, &call.args)?;
                Ok(Some((
                    pre.substitute_all(&bindings),
                    ObligationKind::CallPrecondition {
                        ordinal: stmt.ordinal,
                        callee: callee.name.clone(),
                    },
                )))
            }
            StatementKind::VariableAssign { .. }
            | StatementKind::SubscriptAssign { .. }
            | StatementKind::Assume { .. } => Ok(None),
        }
    }

    fn fan_out<F>(&self, run: Run<'a>, block: &'a Block, visit: &mut F) -> Flow
    where
        F: FnMut(BasicPath<'a>) -> Flow,
    {
        if block.successors.is_empty() {
            return Err(self.defect(format!(
                "{} has no successors and is not the postcondition",
                block.label()
            )));
        }

        // Obligations at this fan-out come before any deeper exploration.
        for &succ in &block.successors {
            let target = self.block(succ)?;
            let terminal = match &target.kind {
                BlockKind::Postcondition { condition } => {
                    Some((condition.clone(), ObligationKind::Postcondition))
                }
                BlockKind::LoopHead { invariant, .. } => {
                    let kind = if run.open_loops.contains(&succ) {
                        ObligationKind::InvariantMaintained(succ)
                    } else {
                        ObligationKind::InvariantEstablished(succ)
                    };
                    Some((invariant.clone(), kind))
                }
                BlockKind::Precondition { .. } => {
                    return Err(self.defect(format!(
                        "{} is reached from {}",
                        target.label(),
                        block.label()
                    )));
                }
                BlockKind::Basic => None,
            };
            if let Some((obligation, kind)) = terminal
                && self.emit(&run, obligation, kind, visit)?.is_break()
            {
                return Ok(ControlFlow::Break(()));
            }
        }

        for &succ in &block.successors {
            let target = self.block(succ)?;
            let flow = match &target.kind {
                BlockKind::Basic => self.extend(run.clone(), target, visit)?,
                BlockKind::LoopHead { invariant, .. } if !run.open_loops.contains(&succ) => {
                    let mut open_loops = run.open_loops.clone();
                    open_loops.push(succ);
                    let inner = Run {
                        start: PathStart::LoopHead(succ),
                        precondition: invariant,
                        segments: Vec::new(),
                        visited: Vec::new(),
                        open_loops,
                    };
                    self.extend(inner, target, visit)?
                }
                _ => ControlFlow::Continue(()),
            };
            if flow.is_break() {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

/// Collect every basic path of `function` in exploration order.
pub fn collect_basic_paths<'a>(
    program: &'a Program,
    function: &'a Function,
) -> Result<Vec<BasicPath<'a>>, VerifyError> {
    let mut paths = Vec::new();
    PathEnumerator::new(program, function).walk(|path| {
        paths.push(path);
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ProgramBuilder;
    use crate::ir::{BlockKind, Variable};
    use crate::types::Ty;

    fn i() -> Variable {
        Variable::local("i", Ty::Int)
    }

    fn kinds(paths: &[BasicPath<'_>]) -> Vec<ObligationKind> {
        paths.iter().map(|p| p.kind.clone()).collect()
    }

    #[test]
    fn straight_line_has_one_path() {
        let mut b = ProgramBuilder::new();
        let f = b.declare_function("f", vec![], vec![i()], Expr::bool(true), Expr::bool(true));
        let mut body = b.body(f);
        let (pre, post) = (body.precondition(), body.postcondition());
        let b1 = body.basic_block();
        body.edge(pre, b1).assign(b1, &i(), Expr::int(1)).edge(b1, post);
        let program = b.finish().unwrap();

        let paths = collect_basic_paths(&program, &program.functions[0]).unwrap();
        assert_eq!(kinds(&paths), vec![ObligationKind::Postcondition]);
        assert_eq!(paths[0].segments.len(), 1);
        assert_eq!(paths[0].segments[0].statements.len(), 1);
        assert_eq!(paths[0].route(&program.functions[0]), "_PRECOND#0 -> _BASIC#2");
    }

    #[test]
    fn loop_emits_entry_and_maintenance_before_exit() {
        // pre -> init -> head -> {body -> head, exit -> post}
        let mut b = ProgramBuilder::new();
        let inv = Expr::ge(Expr::var(&i()), Expr::int(0));
        let f = b.declare_function("f", vec![], vec![i()], Expr::bool(true), Expr::bool(true));
        let mut body = b.body(f);
        let (pre, post) = (body.precondition(), body.postcondition());
        let init = body.basic_block();
        let head = body.loop_head(inv.clone(), vec![]);
        let inner = body.basic_block();
        let exit = body.basic_block();
        body.edge(pre, init)
            .assign(init, &i(), Expr::int(0))
            .edge(init, head)
            .edge(head, inner)
            .edge(head, exit)
            .assume(inner, Expr::lt(Expr::var(&i()), Expr::int(10)))
            .assign(inner, &i(), Expr::add(Expr::var(&i()), Expr::int(1)))
            .edge(inner, head)
            .assume(exit, Expr::not(Expr::lt(Expr::var(&i()), Expr::int(10))))
            .edge(exit, post);
        let program = b.finish().unwrap();

        let paths = collect_basic_paths(&program, &program.functions[0]).unwrap();
        assert_eq!(
            kinds(&paths),
            vec![
                ObligationKind::InvariantEstablished(head),
                ObligationKind::InvariantMaintained(head),
                ObligationKind::Postcondition,
            ]
        );
        assert_eq!(paths[1].start, PathStart::LoopHead(head));
        assert_eq!(paths[1].precondition, inv);
        assert_eq!(
            paths[1].route(&program.functions[0]),
            "_LOOPHEAD#3 -> _BASIC#4"
        );
    }

    #[test]
    fn branches_do_not_share_statements() {
        let mut b = ProgramBuilder::new();
        let f = b.declare_function("f", vec![], vec![i()], Expr::bool(true), Expr::bool(true));
        let mut body = b.body(f);
        let (pre, post) = (body.precondition(), body.postcondition());
        let fork = body.basic_block();
        let left = body.basic_block();
        let right = body.basic_block();
        body.edge(pre, fork)
            .edge(fork, left)
            .edge(fork, right)
            .assign(left, &i(), Expr::int(1))
            .assign(right, &i(), Expr::int(2))
            .edge(left, post)
            .edge(right, post);
        let program = b.finish().unwrap();

        let paths = collect_basic_paths(&program, &program.functions[0]).unwrap();
        assert_eq!(paths.len(), 2);
        let blocks: Vec<Vec<BlockId>> = paths
            .iter()
            .map(|p| p.segments.iter().map(|s| s.block).collect())
            .collect();
        assert_eq!(blocks, vec![vec![fork, left], vec![fork, right]]);
    }

    #[test]
    fn obligations_at_fan_out_precede_recursion() {
        // fork -> {deep -> post, post}: the direct postcondition edge is
        // reported first even though `deep` is listed first.
        let mut b = ProgramBuilder::new();
        let f = b.declare_function("f", vec![], vec![], Expr::bool(true), Expr::bool(true));
        let mut body = b.body(f);
        let (pre, post) = (body.precondition(), body.postcondition());
        let fork = body.basic_block();
        let deep = body.basic_block();
        body.edge(pre, fork)
            .edge(fork, deep)
            .edge(fork, post)
            .edge(deep, post);
        let program = b.finish().unwrap();

        let paths = collect_basic_paths(&program, &program.functions[0]).unwrap();
        let last_blocks: Vec<BlockId> = paths
            .iter()
            .map(|p| p.segments.last().unwrap().block)
            .collect();
        assert_eq!(last_blocks, vec![fork, deep]);
    }

    #[test]
    fn nested_loops_use_a_stack_of_open_heads() {
        // outer -> inner -> {inner_body -> inner, inner_exit -> outer}
        // outer -> exit -> post
        let mut b = ProgramBuilder::new();
        let f = b.declare_function("f", vec![], vec![], Expr::bool(true), Expr::bool(true));
        let mut body = b.body(f);
        let (pre, post) = (body.precondition(), body.postcondition());
        let outer = body.loop_head(Expr::bool(true), vec![]);
        let outer_body = body.basic_block();
        let inner = body.loop_head(Expr::bool(true), vec![]);
        let inner_body = body.basic_block();
        let inner_exit = body.basic_block();
        let exit = body.basic_block();
        body.edge(pre, outer)
            .edge(outer, outer_body)
            .edge(outer, exit)
            .edge(outer_body, inner)
            .edge(inner, inner_body)
            .edge(inner, inner_exit)
            .edge(inner_body, inner)
            .edge(inner_exit, outer)
            .edge(exit, post);
        let program = b.finish().unwrap();

        let paths = collect_basic_paths(&program, &program.functions[0]).unwrap();
        assert_eq!(
            kinds(&paths),
            vec![
                ObligationKind::InvariantEstablished(outer),
                ObligationKind::InvariantEstablished(inner),
                ObligationKind::InvariantMaintained(inner),
                ObligationKind::InvariantMaintained(outer),
                ObligationKind::Postcondition,
            ]
        );
    }

    #[test]
    fn asserts_and_calls_emit_prefix_paths() {
        let x = Variable::local("x", Ty::Int);
        let mut b = ProgramBuilder::new();
        let g = b.declare_function(
            "g",
            vec![x.clone()],
            vec![],
            Expr::gt(Expr::var(&x), Expr::int(0)),
            Expr::bool(true),
        );
        let f = b.declare_function("f", vec![], vec![i()], Expr::bool(true), Expr::bool(true));
        {
            let mut body = b.body(g);
            let (pre, post) = (body.precondition(), body.postcondition());
            body.edge(pre, post);
        }
        let mut body = b.body(f);
        let (pre, post) = (body.precondition(), body.postcondition());
        let blk = body.basic_block();
        body.edge(pre, blk)
            .assign(blk, &i(), Expr::int(1))
            .assert(blk, Expr::eq(Expr::var(&i()), Expr::int(1)))
            .call(blk, vec![], g, vec![Expr::var(&i())])
            .edge(blk, post);
        let program = b.finish().unwrap();

        let func = program.function_by_name("f").unwrap();
        let paths = collect_basic_paths(&program, func).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(matches!(paths[0].kind, ObligationKind::Assertion { .. }));
        assert_eq!(paths[0].segments[0].statements.len(), 1);
        assert!(matches!(
            &paths[1].kind,
            ObligationKind::CallPrecondition { callee, .. } if callee == "g"
        ));
        assert_eq!(paths[1].segments[0].statements.len(), 2);
        assert_eq!(paths[1].obligation, Expr::gt(Expr::var(&i()), Expr::int(0)));
        assert_eq!(paths[2].kind, ObligationKind::Postcondition);
        assert_eq!(paths[2].segments[0].statements.len(), 3);
    }

    #[test]
    fn visitor_break_stops_the_walk() {
        let mut b = ProgramBuilder::new();
        let f = b.declare_function("f", vec![], vec![], Expr::bool(true), Expr::bool(true));
        let mut body = b.body(f);
        let (pre, post) = (body.precondition(), body.postcondition());
        let fork = body.basic_block();
        let l = body.basic_block();
        let r = body.basic_block();
        body.edge(pre, fork)
            .edge(fork, l)
            .edge(fork, r)
            .edge(l, post)
            .edge(r, post);
        let program = b.finish().unwrap();

        let mut seen = 0;
        let flow = PathEnumerator::new(&program, &program.functions[0])
            .walk(|_| {
                seen += 1;
                Ok(ControlFlow::Break(()))
            })
            .unwrap();
        assert!(flow.is_break());
        assert_eq!(seen, 1);
    }

    #[test]
    fn structural_defects_are_fatal() {
        // A cycle of ordinary blocks. Built by hand: the builder accepts it,
        // only the walk can tell.
        let mut b = ProgramBuilder::new();
        let f = b.declare_function("f", vec![], vec![], Expr::bool(true), Expr::bool(true));
        let mut body = b.body(f);
        let (pre, post) = (body.precondition(), body.postcondition());
        let a = body.basic_block();
        let c = body.basic_block();
        body.edge(pre, a).edge(a, c).edge(c, a).edge(c, post);
        let program = b.finish().unwrap();
        let err = collect_basic_paths(&program, &program.functions[0]).unwrap_err();
        assert!(err.to_string().contains("does not pass through a loop head"));

        // Dead end.
        let mut program = program.clone();
        let func = &mut program.functions[0];
        func.blocks[c.0].successors.clear();
        func.blocks[a.0].successors.retain(|s| *s == c);
        let err = collect_basic_paths(&program, &program.functions[0]).unwrap_err();
        assert!(err.to_string().contains("no successors"));

        // Precondition with two successors.
        let mut program = program.clone();
        program.functions[0].blocks[pre.0].successors.push(post);
        assert!(collect_basic_paths(&program, &program.functions[0]).is_err());

        // Back edge into the precondition.
        let mut program = program.clone();
        let func = &mut program.functions[0];
        func.blocks[pre.0].successors.truncate(1);
        func.blocks[c.0].successors.push(pre);
        assert!(matches!(func.blocks[pre.0].kind, BlockKind::Precondition { .. }));
        let err = collect_basic_paths(&program, &program.functions[0]).unwrap_err();
        assert!(err.to_string().contains("is reached from"));
    }
}
