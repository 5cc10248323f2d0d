/// The control-flow IR handed to the verifier.
///
/// A front end lowers surface programs into a [`Program`]: functions made of
/// blocks, blocks made of statements, statements over typed [`Variable`]s and
/// [`Expr`]essions. The verifier reads the IR and never mutates it.
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IrError;
use crate::expr::{BinOp, Expr, UnOp};
use crate::types::{ScalarTy, SigId, Ty, TypeTable};

/// Suffix of the implicit length variable paired with every array.
pub const LENGTH_SUFFIX: &str = "$length";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    Local,
    /// An array; `length` names the paired integer length variable.
    Array { length: String },
    /// Bound by a quantifier. Always `Int`, never assigned.
    Quantified,
}

/// A typed name. Names are unique within a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: Ty,
    pub kind: VariableKind,
}

impl Variable {
    /// A scalar local variable.
    pub fn local(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: VariableKind::Local,
        }
    }

    /// An array variable together with its length variable `<name>$length`.
    pub fn array(name: impl Into<String>, element: ScalarTy) -> Self {
        let name = name.into();
        let length = format!("{name}{LENGTH_SUFFIX}");
        Self {
            name,
            ty: Ty::Array(element),
            kind: VariableKind::Array { length },
        }
    }

    pub fn quantified(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: Ty::Int,
            kind: VariableKind::Quantified,
        }
    }

    /// The integer length variable of an array.
    pub fn length_var(&self) -> Option<Variable> {
        match &self.kind {
            VariableKind::Array { length } => Some(Variable::local(length.clone(), Ty::Int)),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, VariableKind::Array { .. })
    }

    /// `true` when this variable may be the target of an assignment.
    pub fn is_assignable(&self) -> bool {
        !matches!(self.kind, VariableKind::Quantified)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// Index of a block inside its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub usize);

/// Index of a function inside its program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub usize);

/// Callee and actual arguments of a call statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub function: FunctionId,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    VariableAssign { variable: Variable, rhs: Expr },
    SubscriptAssign {
        array: Variable,
        index: Expr,
        rhs: Expr,
    },
    /// `lhs` receive the callee's return values, positionally.
    FunctionCall { lhs: Vec<Variable>, call: CallExpr },
    /// Proof obligation at this point.
    Assert { annotation: Expr },
    /// Fact known on entry; encodes branch conditions.
    Assume { condition: Expr },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Program-wide diagnostic ordinal. Carries no logical meaning.
    pub ordinal: usize,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Entry block: no predecessors, one successor, no statements.
    Precondition {
        condition: Expr,
        ranking_function: Vec<Expr>,
    },
    /// Exit block: no successors, no statements.
    Postcondition { condition: Expr },
    Basic,
    /// Dominates its loop body. Its own statements compute the loop
    /// condition and run on every iteration.
    LoopHead {
        invariant: Expr,
        ranking_function: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub predecessors: Vec<BlockId>,
    pub successors: Vec<BlockId>,
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            predecessors: Vec::new(),
            successors: Vec::new(),
            statements: Vec::new(),
        }
    }

    pub fn is_loop_head(&self) -> bool {
        matches!(self.kind, BlockKind::LoopHead { .. })
    }

    /// Display label, e.g. `_LOOPHEAD#3`.
    pub fn label(&self) -> String {
        let prefix = match self.kind {
            BlockKind::Precondition { .. } => "_PRECOND",
            BlockKind::Postcondition { .. } => "_POSTCOND",
            BlockKind::Basic => "_BASIC",
            BlockKind::LoopHead { .. } => "_LOOPHEAD",
        };
        format!("{prefix}#{}", self.id.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub ty: SigId,
    pub parameters: Vec<Variable>,
    /// Return-value variables, possibly none.
    pub rvs: Vec<Variable>,
    pub precondition: BlockId,
    pub postcondition: BlockId,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    /// The `@pre` condition.
    pub fn precondition_expr(&self) -> Option<&Expr> {
        match &self.block(self.precondition)?.kind {
            BlockKind::Precondition { condition, .. } => Some(condition),
            _ => None,
        }
    }

    /// The `@post` condition.
    pub fn postcondition_expr(&self) -> Option<&Expr> {
        match &self.block(self.postcondition)?.kind {
            BlockKind::Postcondition { condition } => Some(condition),
            _ => None,
        }
    }
}

/// A named boolean macro usable inside annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub name: String,
    pub ty: SigId,
    pub parameters: Vec<Variable>,
    pub expression: Expr,
}

/// The IR root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub types: TypeTable,
    pub functions: Vec<Function>,
    pub predicates: Vec<Predicate>,
}

impl Program {
    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.0)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn predicate(&self, name: &str) -> Option<&Predicate> {
        self.predicates.iter().find(|p| p.name == name)
    }

    /// Check the structural invariants the verifier relies on.
    ///
    /// Loop-head domination is not checked here; the path enumerator
    /// rejects cycles that bypass a loop head.
    pub fn validate(&self) -> Result<(), IrError> {
        let mut names = HashSet::new();
        for name in self
            .functions
            .iter()
            .map(|f| &f.name)
            .chain(self.predicates.iter().map(|p| &p.name))
        {
            if !names.insert(name) {
                return Err(IrError::Duplicate(name.clone()));
            }
        }

        for predicate in &self.predicates {
            self.validate_predicate(predicate)?;
        }
        for function in &self.functions {
            FunctionValidator {
                program: self,
                function,
            }
            .validate()?;
        }
        Ok(())
    }

    fn validate_predicate(&self, predicate: &Predicate) -> Result<(), IrError> {
        let malformed = |message: String| IrError::MalformedPredicate {
            predicate: predicate.name.clone(),
            message,
        };

        let sig = self
            .types
            .get(predicate.ty)
            .ok_or_else(|| malformed(format!("unknown signature {:?}", predicate.ty)))?;
        let param_tys: Vec<Ty> = predicate.parameters.iter().map(|p| p.ty).collect();
        if sig.params != param_tys || sig.returns != [Ty::Bool] {
            return Err(malformed(format!("signature {sig} does not match parameters")));
        }

        let ty = self.check_expr(&predicate.expression).map_err(malformed)?;
        if ty != Ty::Bool {
            return Err(malformed(format!("body has type {ty}, expected bool")));
        }
        if predicate.expression.predicate_names().contains(&predicate.name) {
            return Err(malformed("predicates may not be recursive".into()));
        }

        let mut allowed: HashSet<String> = HashSet::new();
        for p in &predicate.parameters {
            allowed.insert(p.name.clone());
            if let Some(length) = p.length_var() {
                allowed.insert(length.name);
            }
        }
        if let Some(name) = predicate
            .expression
            .free_variables()
            .into_keys()
            .find(|name| !allowed.contains(name))
        {
            return Err(malformed(format!("free variable `{name}` is not a parameter")));
        }
        Ok(())
    }

    /// Type-check an expression against this program's predicates.
    pub fn check_expr(&self, expr: &Expr) -> Result<Ty, String> {
        match expr {
            Expr::Var(v) => Ok(v.ty),
            Expr::IntLit(_) => Ok(Ty::Int),
            Expr::FloatLit(_) => Ok(Ty::Float),
            Expr::BoolLit(_) => Ok(Ty::Bool),
            Expr::Unary(op, e) => {
                let ty = self.check_expr(e)?;
                match op {
                    UnOp::Neg if ty.is_numeric() => Ok(ty),
                    UnOp::Not if ty == Ty::Bool => Ok(Ty::Bool),
                    _ => Err(format!("operand of `{expr}` has type {ty}")),
                }
            }
            Expr::Binary(op, l, r) => {
                let (lt, rt) = (self.check_expr(l)?, self.check_expr(r)?);
                if lt != rt {
                    return Err(format!("operands of `{expr}` have types {lt} and {rt}"));
                }
                let ok = match op {
                    BinOp::Mod => lt == Ty::Int,
                    _ if op.is_arithmetic() => lt.is_numeric(),
                    BinOp::Eq | BinOp::Ne => !lt.is_array(),
                    _ if op.is_comparison() => lt.is_numeric(),
                    _ => lt == Ty::Bool,
                };
                if !ok {
                    return Err(format!("operator `{}` does not apply to {lt}", op.symbol()));
                }
                Ok(if op.is_arithmetic() { lt } else { Ty::Bool })
            }
            Expr::Quantified { variable, body, .. } => {
                if variable.kind != VariableKind::Quantified || variable.ty != Ty::Int {
                    return Err(format!("`{}` is not a quantified int variable", variable.name));
                }
                match self.check_expr(body)? {
                    Ty::Bool => Ok(Ty::Bool),
                    ty => Err(format!("quantifier body has type {ty}")),
                }
            }
            Expr::ArrayRead { array, index } => {
                let elem = self
                    .check_expr(array)?
                    .element()
                    .ok_or_else(|| format!("`{array}` is not an array"))?;
                match self.check_expr(index)? {
                    Ty::Int => Ok(elem),
                    ty => Err(format!("index `{index}` has type {ty}")),
                }
            }
            Expr::ArrayUpdate {
                array,
                index,
                value,
                length,
            } => {
                let array_ty = self.check_expr(array)?;
                let elem = array_ty
                    .element()
                    .ok_or_else(|| format!("`{array}` is not an array"))?;
                if self.check_expr(index)? != Ty::Int || self.check_expr(length)? != Ty::Int {
                    return Err(format!("index and length of `{expr}` must be int"));
                }
                let value_ty = self.check_expr(value)?;
                if value_ty != elem {
                    return Err(format!("stored value has type {value_ty}, expected {elem}"));
                }
                Ok(array_ty)
            }
            Expr::Call { function, args, ty } => {
                for arg in args {
                    self.check_expr(arg)?;
                }
                if ty.is_array() {
                    return Err(format!("function term `{function}` returns an array"));
                }
                Ok(*ty)
            }
            Expr::PredicateApp { predicate, args } => {
                let pred = self
                    .predicate(predicate)
                    .ok_or_else(|| format!("unknown predicate `{predicate}`"))?;
                if pred.parameters.len() != args.len() {
                    return Err(format!(
                        "`{predicate}` takes {} arguments, {} given",
                        pred.parameters.len(),
                        args.len()
                    ));
                }
                for (param, arg) in pred.parameters.iter().zip(args) {
                    let ty = self.check_expr(arg)?;
                    if ty != param.ty {
                        return Err(format!(
                            "argument `{arg}` of `{predicate}` has type {ty}, expected {}",
                            param.ty
                        ));
                    }
                }
                Ok(Ty::Bool)
            }
        }
    }
}

struct FunctionValidator<'a> {
    program: &'a Program,
    function: &'a Function,
}

impl FunctionValidator<'_> {
    fn malformed(&self, message: impl Into<String>) -> IrError {
        IrError::Malformed {
            function: self.function.name.clone(),
            message: message.into(),
        }
    }

    fn mismatch(&self, context: impl Into<String>, expected: Ty, found: Ty) -> IrError {
        IrError::TypeMismatch {
            function: self.function.name.clone(),
            context: context.into(),
            expected,
            found,
        }
    }

    fn expect_ty(&self, expr: &Expr, expected: Ty, context: &str) -> Result<(), IrError> {
        let found = self
            .program
            .check_expr(expr)
            .map_err(|message| self.malformed(message))?;
        if found != expected {
            return Err(self.mismatch(context, expected, found));
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), IrError> {
        let f = self.function;
        let sig = self
            .program
            .types
            .get(f.ty)
            .ok_or_else(|| self.malformed(format!("unknown signature {:?}", f.ty)))?;
        let params: Vec<Ty> = f.parameters.iter().map(|v| v.ty).collect();
        let returns: Vec<Ty> = f.rvs.iter().map(|v| v.ty).collect();
        if sig.params != params || sig.returns != returns {
            return Err(self.malformed(format!(
                "signature {sig} does not match parameters and return values"
            )));
        }

        for (index, block) in f.blocks.iter().enumerate() {
            if block.id != BlockId(index) {
                return Err(self.malformed(format!(
                    "block at index {index} is labelled {:?}",
                    block.id
                )));
            }
            self.validate_edges(block)?;
            self.validate_block(block)?;
        }

        self.validate_entry_exit()?;
        self.validate_reachability()
    }

    fn validate_edges(&self, block: &Block) -> Result<(), IrError> {
        let f = self.function;
        for &succ in &block.successors {
            let target = f.block(succ).ok_or(IrError::UnknownBlock {
                function: f.name.clone(),
                block: succ,
            })?;
            if !target.predecessors.contains(&block.id) {
                return Err(self.malformed(format!(
                    "edge {} -> {} is missing its predecessor entry",
                    block.label(),
                    target.label()
                )));
            }
        }
        for &pred in &block.predecessors {
            let source = f.block(pred).ok_or(IrError::UnknownBlock {
                function: f.name.clone(),
                block: pred,
            })?;
            if !source.successors.contains(&block.id) {
                return Err(self.malformed(format!(
                    "edge {} -> {} is missing its successor entry",
                    source.label(),
                    block.label()
                )));
            }
        }
        Ok(())
    }

    fn validate_block(&self, block: &Block) -> Result<(), IrError> {
        let label = block.label();
        match &block.kind {
            BlockKind::Precondition {
                condition,
                ranking_function,
            } => {
                if block.id != self.function.precondition {
                    return Err(self.malformed(format!("stray precondition block {label}")));
                }
                self.expect_ty(condition, Ty::Bool, "precondition")?;
                for rank in ranking_function {
                    self.expect_ty(rank, Ty::Int, "ranking function")?;
                }
            }
            BlockKind::Postcondition { condition } => {
                if block.id != self.function.postcondition {
                    return Err(self.malformed(format!("stray postcondition block {label}")));
                }
                self.expect_ty(condition, Ty::Bool, "postcondition")?;
            }
            BlockKind::Basic => {}
            BlockKind::LoopHead {
                invariant,
                ranking_function,
            } => {
                self.expect_ty(invariant, Ty::Bool, &format!("invariant of {label}"))?;
                for rank in ranking_function {
                    self.expect_ty(rank, Ty::Int, "ranking function")?;
                }
            }
        }

        for stmt in &block.statements {
            self.validate_statement(stmt)?;
        }
        Ok(())
    }

    fn validate_statement(&self, stmt: &Statement) -> Result<(), IrError> {
        match &stmt.kind {
            StatementKind::VariableAssign { variable, rhs } => {
                if !variable.is_assignable() {
                    return Err(self.malformed(format!(
                        "quantified variable `{}` is assigned",
                        variable.name
                    )));
                }
                self.expect_ty(rhs, variable.ty, &format!("assignment to `{}`", variable.name))
            }
            StatementKind::SubscriptAssign { array, index, rhs } => {
                let elem = array
                    .ty
                    .element()
                    .filter(|_| array.is_array())
                    .ok_or_else(|| self.malformed(format!("`{}` is not an array", array.name)))?;
                self.expect_ty(index, Ty::Int, "array index")?;
                self.expect_ty(rhs, elem, &format!("store into `{}`", array.name))
            }
            StatementKind::FunctionCall { lhs, call } => {
                let callee = self
                    .program
                    .function(call.function)
                    .ok_or(IrError::UnknownFunction(call.function))?;
                if callee.parameters.len() != call.args.len() {
                    return Err(self.malformed(format!(
                        "call to `{}` passes {} arguments, expected {}",
                        callee.name,
                        call.args.len(),
                        callee.parameters.len()
                    )));
                }
                if callee.rvs.len() != lhs.len() {
                    return Err(self.malformed(format!(
                        "call to `{}` binds {} results, expected {}",
                        callee.name,
                        lhs.len(),
                        callee.rvs.len()
                    )));
                }
                for (param, arg) in callee.parameters.iter().zip(&call.args) {
                    self.expect_ty(arg, param.ty, &format!("argument `{}`", param.name))?;
                }
                for (rv, target) in callee.rvs.iter().zip(lhs) {
                    if !target.is_assignable() {
                        return Err(self.malformed(format!(
                            "quantified variable `{}` is assigned",
                            target.name
                        )));
                    }
                    if rv.ty != target.ty {
                        return Err(self.mismatch(
                            format!("result of `{}`", callee.name),
                            target.ty,
                            rv.ty,
                        ));
                    }
                }
                Ok(())
            }
            StatementKind::Assert { annotation } => {
                self.expect_ty(annotation, Ty::Bool, "assertion")
            }
            StatementKind::Assume { condition } => self.expect_ty(condition, Ty::Bool, "assume"),
        }
    }

    fn validate_entry_exit(&self) -> Result<(), IrError> {
        let f = self.function;
        let unknown = |block| IrError::UnknownBlock {
            function: f.name.clone(),
            block,
        };

        let pre = f.block(f.precondition).ok_or_else(|| unknown(f.precondition))?;
        if !matches!(pre.kind, BlockKind::Precondition { .. }) {
            return Err(self.malformed(format!("{} is not a precondition block", pre.label())));
        }
        if !pre.predecessors.is_empty() || pre.successors.len() != 1 || !pre.statements.is_empty()
        {
            return Err(self.malformed(format!(
                "{} must have no predecessors, exactly one successor and no statements",
                pre.label()
            )));
        }

        let post = f.block(f.postcondition).ok_or_else(|| unknown(f.postcondition))?;
        if !matches!(post.kind, BlockKind::Postcondition { .. }) {
            return Err(self.malformed(format!("{} is not a postcondition block", post.label())));
        }
        if !post.successors.is_empty() || !post.statements.is_empty() {
            return Err(self.malformed(format!(
                "{} must have no successors and no statements",
                post.label()
            )));
        }
        if post.predecessors.is_empty() {
            return Err(self.malformed(format!("{} is unreachable", post.label())));
        }
        Ok(())
    }

    fn validate_reachability(&self) -> Result<(), IrError> {
        let f = self.function;
        let mut seen = vec![false; f.blocks.len()];
        let mut stack = vec![f.precondition];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            if let Some(block) = f.block(id) {
                stack.extend(block.successors.iter().copied());
            }
        }
        match seen.iter().position(|reached| !reached) {
            Some(index) => Err(self.malformed(format!(
                "{} is unreachable from the precondition",
                f.blocks[index].label()
            ))),
            None => Ok(()),
        }
    }
}
