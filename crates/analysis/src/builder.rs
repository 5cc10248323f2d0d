/// Construction API for programs.
///
/// Functions are declared first (contract and signature), bodies filled in
/// afterwards, so call statements can reference any declared function,
/// including mutually recursive ones.
///
/// ```
/// use pivc_analysis::builder::ProgramBuilder;
/// use pivc_analysis::expr::Expr;
/// use pivc_analysis::ir::Variable;
/// use pivc_analysis::types::Ty;
///
/// let x = Variable::local("x", Ty::Int);
/// let mut builder = ProgramBuilder::new();
/// let f = builder.declare_function(
///     "five",
///     vec![],
///     vec![x.clone()],
///     Expr::bool(true),
///     Expr::eq(Expr::var(&x), Expr::int(5)),
/// );
/// let mut body = builder.body(f);
/// let entry = body.basic_block();
/// let (pre, post) = (body.precondition(), body.postcondition());
/// body.edge(pre, entry)
///     .assign(entry, &x, Expr::int(5))
///     .edge(entry, post);
/// let program = builder.finish().unwrap();
/// assert_eq!(program.functions.len(), 1);
/// ```
use crate::error::IrError;
use crate::expr::Expr;
use crate::ir::{
    Block, BlockId, BlockKind, CallExpr, Function, FunctionId, Predicate, Program, Statement,
    StatementKind, Variable,
};
use crate::types::Signature;

/// Builds a [`Program`] and validates it on [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
    next_ordinal: usize,
    error: Option<IrError>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a function with its contract. The precondition and
    /// postcondition blocks are created here.
    pub fn declare_function(
        &mut self,
        name: impl Into<String>,
        parameters: Vec<Variable>,
        rvs: Vec<Variable>,
        precondition: Expr,
        postcondition: Expr,
    ) -> FunctionId {
        let sig = Signature::new(
            parameters.iter().map(|p| p.ty).collect(),
            rvs.iter().map(|r| r.ty).collect(),
        );
        let ty = self.program.types.intern(sig);
        let pre = BlockId(0);
        let post = BlockId(1);
        let id = FunctionId(self.program.functions.len());
        self.program.functions.push(Function {
            name: name.into(),
            ty,
            parameters,
            rvs,
            precondition: pre,
            postcondition: post,
            blocks: vec![
                Block::new(
                    pre,
                    BlockKind::Precondition {
                        condition: precondition,
                        ranking_function: Vec::new(),
                    },
                ),
                Block::new(
                    post,
                    BlockKind::Postcondition {
                        condition: postcondition,
                    },
                ),
            ],
        });
        id
    }

    /// Body builder for a declared function.
    ///
    /// An unknown `id` is reported by [`finish`](Self::finish).
    pub fn body(&mut self, id: FunctionId) -> FunctionBodyBuilder<'_> {
        if id.0 >= self.program.functions.len() && self.error.is_none() {
            self.error = Some(IrError::UnknownFunction(id));
        }
        FunctionBodyBuilder {
            function: self.program.functions.get_mut(id.0),
            next_ordinal: &mut self.next_ordinal,
            error: &mut self.error,
        }
    }

    pub fn predicate(
        &mut self,
        name: impl Into<String>,
        parameters: Vec<Variable>,
        expression: Expr,
    ) -> &mut Self {
        let ty = self
            .program
            .types
            .intern(Signature::predicate(parameters.iter().map(|p| p.ty).collect()));
        self.program.predicates.push(Predicate {
            name: name.into(),
            ty,
            parameters,
            expression,
        });
        self
    }

    /// Validate and return the program.
    pub fn finish(self) -> Result<Program, IrError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.program.validate()?;
        Ok(self.program)
    }
}

/// Adds blocks, edges and statements to one function.
#[derive(Debug)]
pub struct FunctionBodyBuilder<'a> {
    function: Option<&'a mut Function>,
    next_ordinal: &'a mut usize,
    error: &'a mut Option<IrError>,
}

impl FunctionBodyBuilder<'_> {
    pub fn precondition(&self) -> BlockId {
        self.function
            .as_ref()
            .map_or(BlockId(0), |f| f.precondition)
    }

    pub fn postcondition(&self) -> BlockId {
        self.function
            .as_ref()
            .map_or(BlockId(1), |f| f.postcondition)
    }

    pub fn basic_block(&mut self) -> BlockId {
        self.add_block(BlockKind::Basic)
    }

    pub fn loop_head(&mut self, invariant: Expr, ranking_function: Vec<Expr>) -> BlockId {
        self.add_block(BlockKind::LoopHead {
            invariant,
            ranking_function,
        })
    }

    fn add_block(&mut self, kind: BlockKind) -> BlockId {
        match self.function.as_deref_mut() {
            Some(f) => {
                let id = BlockId(f.blocks.len());
                f.blocks.push(Block::new(id, kind));
                id
            }
            None => BlockId(usize::MAX),
        }
    }

    /// Record `from -> to` in both adjacency lists.
    pub fn edge(&mut self, from: BlockId, to: BlockId) -> &mut Self {
        let Some(f) = self.function.as_deref_mut() else {
            return self;
        };
        if from.0 >= f.blocks.len() || to.0 >= f.blocks.len() {
            let block = if from.0 >= f.blocks.len() { from } else { to };
            let err = IrError::UnknownBlock {
                function: f.name.clone(),
                block,
            };
            self.fail(err);
            return self;
        }
        f.blocks[from.0].successors.push(to);
        f.blocks[to.0].predecessors.push(from);
        self
    }

    pub fn assign(&mut self, block: BlockId, variable: &Variable, rhs: Expr) -> &mut Self {
        self.push(
            block,
            StatementKind::VariableAssign {
                variable: variable.clone(),
                rhs,
            },
        )
    }

    pub fn assign_index(
        &mut self,
        block: BlockId,
        array: &Variable,
        index: Expr,
        rhs: Expr,
    ) -> &mut Self {
        self.push(
            block,
            StatementKind::SubscriptAssign {
                array: array.clone(),
                index,
                rhs,
            },
        )
    }

    pub fn call(
        &mut self,
        block: BlockId,
        lhs: Vec<Variable>,
        function: FunctionId,
        args: Vec<Expr>,
    ) -> &mut Self {
        self.push(
            block,
            StatementKind::FunctionCall {
                lhs,
                call: CallExpr { function, args },
            },
        )
    }

    pub fn assert(&mut self, block: BlockId, annotation: Expr) -> &mut Self {
        self.push(block, StatementKind::Assert { annotation })
    }

    pub fn assume(&mut self, block: BlockId, condition: Expr) -> &mut Self {
        self.push(block, StatementKind::Assume { condition })
    }

    /// Attach a ranking function to the precondition or a loop head.
    pub fn set_ranking_function(&mut self, block: BlockId, ranking: Vec<Expr>) -> &mut Self {
        let Some(f) = self.function.as_deref_mut() else {
            return self;
        };
        let name = f.name.clone();
        let failure = match f.blocks.get_mut(block.0).map(|b| &mut b.kind) {
            Some(BlockKind::Precondition {
                ranking_function, ..
            })
            | Some(BlockKind::LoopHead {
                ranking_function, ..
            }) => {
                *ranking_function = ranking;
                None
            }
            Some(_) => Some(IrError::Malformed {
                function: name,
                message: format!("block {block:?} cannot carry a ranking function"),
            }),
            None => Some(IrError::UnknownBlock {
                function: name,
                block,
            }),
        };
        if let Some(err) = failure {
            self.fail(err);
        }
        self
    }

    fn push(&mut self, block: BlockId, kind: StatementKind) -> &mut Self {
        let Some(f) = self.function.as_deref_mut() else {
            return self;
        };
        let name = &f.name;
        let failure = match f.blocks.get_mut(block.0) {
            Some(b) => {
                *self.next_ordinal += 1;
                b.statements.push(Statement {
                    ordinal: *self.next_ordinal,
                    kind,
                });
                None
            }
            None => Some(IrError::UnknownBlock {
                function: name.clone(),
                block,
            }),
        };
        if let Some(err) = failure {
            self.fail(err);
        }
        self
    }

    fn fail(&mut self, err: IrError) {
        if self.error.is_none() {
            *self.error = Some(err);
        }
    }
}
