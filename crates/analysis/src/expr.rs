/// Symbolic expressions over program variables.
///
/// Expressions are immutable trees. Substitution never mutates a tree in
/// place; it builds a new one, sharing nothing with the input.
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ir::Variable;
use crate::types::Ty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Implies,
    Iff,
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne
        )
    }

    pub fn is_connective(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or | BinOp::Implies | BinOp::Iff)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Implies => "==>",
            BinOp::Iff => "<==>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantifier {
    Forall,
    Exists,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Var(Variable),
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Quantification over a bound integer variable.
    Quantified {
        quantifier: Quantifier,
        variable: Variable,
        body: Box<Expr>,
    },
    ArrayRead {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    /// `array` with `index` mapped to `value`; `length` is carried over
    /// unchanged from the original array.
    ArrayUpdate {
        array: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
        length: Box<Expr>,
    },
    /// Uninterpreted function term.
    Call {
        function: String,
        args: Vec<Expr>,
        ty: Ty,
    },
    PredicateApp {
        predicate: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn var(variable: &Variable) -> Self {
        Expr::Var(variable.clone())
    }

    pub fn int(value: i64) -> Self {
        Expr::IntLit(value)
    }

    pub fn float(value: f64) -> Self {
        Expr::FloatLit(value)
    }

    pub fn bool(value: bool) -> Self {
        Expr::BoolLit(value)
    }

    pub fn unary(op: UnOp, operand: Expr) -> Self {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn not(operand: Expr) -> Self {
        Self::unary(UnOp::Not, operand)
    }

    pub fn neg(operand: Expr) -> Self {
        Self::unary(UnOp::Neg, operand)
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::And, lhs, rhs)
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Or, lhs, rhs)
    }

    pub fn implies(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Implies, lhs, rhs)
    }

    pub fn iff(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Iff, lhs, rhs)
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Eq, lhs, rhs)
    }

    pub fn ne(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Ne, lhs, rhs)
    }

    pub fn lt(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Lt, lhs, rhs)
    }

    pub fn le(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Le, lhs, rhs)
    }

    pub fn gt(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Gt, lhs, rhs)
    }

    pub fn ge(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Ge, lhs, rhs)
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Mul, lhs, rhs)
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Div, lhs, rhs)
    }

    pub fn modulo(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Mod, lhs, rhs)
    }

    pub fn read(array: Expr, index: Expr) -> Self {
        Expr::ArrayRead {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn update(array: Expr, index: Expr, value: Expr, length: Expr) -> Self {
        Expr::ArrayUpdate {
            array: Box::new(array),
            index: Box::new(index),
            value: Box::new(value),
            length: Box::new(length),
        }
    }

    pub fn forall(variable: &Variable, body: Expr) -> Self {
        Expr::Quantified {
            quantifier: Quantifier::Forall,
            variable: variable.clone(),
            body: Box::new(body),
        }
    }

    pub fn exists(variable: &Variable, body: Expr) -> Self {
        Expr::Quantified {
            quantifier: Quantifier::Exists,
            variable: variable.clone(),
            body: Box::new(body),
        }
    }

    pub fn call(function: impl Into<String>, args: Vec<Expr>, ty: Ty) -> Self {
        Expr::Call {
            function: function.into(),
            args,
            ty,
        }
    }

    pub fn app(predicate: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::PredicateApp {
            predicate: predicate.into(),
            args,
        }
    }

    /// Conjunction of all `exprs`; `true` when empty.
    pub fn conjoin(exprs: impl IntoIterator<Item = Expr>) -> Self {
        exprs
            .into_iter()
            .reduce(Expr::and)
            .unwrap_or(Expr::BoolLit(true))
    }

    /// Static type. Assumes the expression is well typed.
    pub fn ty(&self) -> Ty {
        match self {
            Expr::Var(v) => v.ty,
            Expr::IntLit(_) => Ty::Int,
            Expr::FloatLit(_) => Ty::Float,
            Expr::BoolLit(_) => Ty::Bool,
            Expr::Unary(UnOp::Neg, e) => e.ty(),
            Expr::Unary(UnOp::Not, _) => Ty::Bool,
            Expr::Binary(op, lhs, _) if op.is_arithmetic() => lhs.ty(),
            Expr::Binary(..) | Expr::Quantified { .. } | Expr::PredicateApp { .. } => Ty::Bool,
            Expr::ArrayRead { array, .. } => {
                let array_ty = array.ty();
                array_ty.element().unwrap_or(array_ty)
            }
            Expr::ArrayUpdate { array, .. } => array.ty(),
            Expr::Call { ty, .. } => *ty,
        }
    }

    /// Length term of an array-typed expression.
    ///
    /// Array-typed expressions are array variables and updates of them, so
    /// this is `Some` for every well-typed array expression.
    pub fn array_length(&self) -> Option<Expr> {
        match self {
            Expr::Var(v) => v.length_var().map(Expr::Var),
            Expr::ArrayUpdate { length, .. } => Some((**length).clone()),
            _ => None,
        }
    }

    /// Direct subexpressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::IntLit(_) | Expr::FloatLit(_) | Expr::BoolLit(_) => Vec::new(),
            Expr::Unary(_, e) => vec![e.as_ref()],
            Expr::Binary(_, l, r) => vec![l.as_ref(), r.as_ref()],
            Expr::Quantified { body, .. } => vec![body.as_ref()],
            Expr::ArrayRead { array, index } => vec![array.as_ref(), index.as_ref()],
            Expr::ArrayUpdate {
                array,
                index,
                value,
                length,
            } => vec![
                array.as_ref(),
                index.as_ref(),
                value.as_ref(),
                length.as_ref(),
            ],
            Expr::Call { args, .. } | Expr::PredicateApp { args, .. } => args.iter().collect(),
        }
    }

    /// Replace every free occurrence of `variable` by `replacement`.
    ///
    /// Occurrences bound by a quantifier over the same name are left alone.
    /// Type agreement is the caller's responsibility.
    pub fn substitute(&self, variable: &Variable, replacement: &Expr) -> Expr {
        let lookup = |name: &str| (name == variable.name).then(|| replacement.clone());
        self.rewrite(&lookup, &mut Vec::new())
    }

    /// Simultaneous substitution keyed by variable name.
    pub fn substitute_all(&self, substitutions: &HashMap<String, Expr>) -> Expr {
        if substitutions.is_empty() {
            return self.clone();
        }
        let lookup = |name: &str| substitutions.get(name).cloned();
        self.rewrite(&lookup, &mut Vec::new())
    }

    fn rewrite<'e>(
        &'e self,
        lookup: &dyn Fn(&str) -> Option<Expr>,
        shadowed: &mut Vec<&'e str>,
    ) -> Expr {
        let go = |e: &'e Expr, shadowed: &mut Vec<&'e str>| Box::new(e.rewrite(lookup, shadowed));
        match self {
            Expr::Var(v) => {
                if !shadowed.contains(&v.name.as_str())
                    && let Some(replacement) = lookup(&v.name)
                {
                    replacement
                } else {
                    self.clone()
                }
            }
            Expr::IntLit(_) | Expr::FloatLit(_) | Expr::BoolLit(_) => self.clone(),
            Expr::Unary(op, e) => Expr::Unary(*op, go(e, shadowed)),
            Expr::Binary(op, l, r) => Expr::Binary(*op, go(l, shadowed), go(r, shadowed)),
            Expr::Quantified {
                quantifier,
                variable,
                body,
            } => {
                shadowed.push(&variable.name);
                let body = go(body, shadowed);
                shadowed.pop();
                Expr::Quantified {
                    quantifier: *quantifier,
                    variable: variable.clone(),
                    body,
                }
            }
            Expr::ArrayRead { array, index } => Expr::ArrayRead {
                array: go(array, shadowed),
                index: go(index, shadowed),
            },
            Expr::ArrayUpdate {
                array,
                index,
                value,
                length,
            } => Expr::ArrayUpdate {
                array: go(array, shadowed),
                index: go(index, shadowed),
                value: go(value, shadowed),
                length: go(length, shadowed),
            },
            Expr::Call { function, args, ty } => Expr::Call {
                function: function.clone(),
                args: args.iter().map(|a| a.rewrite(lookup, shadowed)).collect(),
                ty: *ty,
            },
            Expr::PredicateApp { predicate, args } => Expr::PredicateApp {
                predicate: predicate.clone(),
                args: args.iter().map(|a| a.rewrite(lookup, shadowed)).collect(),
            },
        }
    }

    /// Free variables with their types, in name order.
    ///
    /// Includes the length variables that predicate applications pass
    /// implicitly alongside array arguments.
    pub fn free_variables(&self) -> BTreeMap<String, Ty> {
        let mut out = BTreeMap::new();
        self.collect_free(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free<'e>(&'e self, bound: &mut Vec<&'e str>, out: &mut BTreeMap<String, Ty>) {
        match self {
            Expr::Var(v) => {
                if !bound.contains(&v.name.as_str()) {
                    out.insert(v.name.clone(), v.ty);
                }
            }
            Expr::Quantified { variable, body, .. } => {
                bound.push(&variable.name);
                body.collect_free(bound, out);
                bound.pop();
            }
            Expr::PredicateApp { args, .. } => {
                for arg in args {
                    arg.collect_free(bound, out);
                    if arg.ty().is_array()
                        && let Some(length) = arg.array_length()
                    {
                        out.extend(length.free_variables());
                    }
                }
            }
            _ => {
                for child in self.children() {
                    child.collect_free(bound, out);
                }
            }
        }
    }

    pub fn contains_var(&self, name: &str) -> bool {
        self.free_variables().contains_key(name)
    }

    /// Uninterpreted function symbols used in this expression, with their
    /// argument and result types.
    pub fn function_symbols(&self) -> BTreeMap<String, (Vec<Ty>, Ty)> {
        let mut out = BTreeMap::new();
        self.visit(&mut |e| {
            if let Expr::Call { function, args, ty } = e {
                out.entry(function.clone())
                    .or_insert_with(|| (args.iter().map(Expr::ty).collect(), *ty));
            }
        });
        out
    }

    /// Names of all predicates applied in this expression.
    pub fn predicate_names(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        self.visit(&mut |e| {
            if let Expr::PredicateApp { predicate, .. } = e
                && !out.contains(predicate)
            {
                out.push(predicate.clone());
            }
        });
        out
    }

    /// Pre-order traversal.
    pub fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(v) => write!(f, "{}", v.name),
            Expr::IntLit(n) => write!(f, "{n}"),
            Expr::FloatLit(x) => write!(f, "{x:?}"),
            Expr::BoolLit(b) => write!(f, "{b}"),
            Expr::Unary(UnOp::Neg, e) => write!(f, "-{e}"),
            Expr::Unary(UnOp::Not, e) => write!(f, "!{e}"),
            Expr::Binary(op, l, r) => write!(f, "({l} {} {r})", op.symbol()),
            Expr::Quantified {
                quantifier,
                variable,
                body,
            } => {
                let q = match quantifier {
                    Quantifier::Forall => "forall",
                    Quantifier::Exists => "exists",
                };
                write!(f, "({q} {}. {body})", variable.name)
            }
            Expr::ArrayRead { array, index } => write!(f, "{array}[{index}]"),
            Expr::ArrayUpdate {
                array,
                index,
                value,
                ..
            } => write!(f, "{array}{{{index} <- {value}}}"),
            Expr::Call { function, args, .. } => {
                write!(f, "{function}(")?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::PredicateApp { predicate, args } => {
                write!(f, "{predicate}(")?;
                write_args(f, args)?;
                write!(f, ")")
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl From<&Variable> for Expr {
    fn from(variable: &Variable) -> Self {
        Expr::var(variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarTy;

    fn x() -> Variable {
        Variable::local("x", Ty::Int)
    }

    fn y() -> Variable {
        Variable::local("y", Ty::Int)
    }

    #[test]
    fn substitute_replaces_free_occurrences() {
        let e = Expr::add(Expr::var(&x()), Expr::mul(Expr::var(&x()), Expr::int(2)));
        let r = e.substitute(&x(), &Expr::var(&y()));
        assert_eq!(
            r,
            Expr::add(Expr::var(&y()), Expr::mul(Expr::var(&y()), Expr::int(2)))
        );
        // input untouched
        assert!(e.contains_var("x"));
    }

    #[test]
    fn substitute_stops_at_binding_quantifier() {
        let i = Variable::quantified("i");
        let bound = Expr::forall(&i, Expr::ge(Expr::var(&i), Expr::int(0)));
        let r = bound.substitute(&i, &Expr::int(5));
        assert_eq!(r, bound);
    }

    #[test]
    fn substitute_all_is_simultaneous() {
        // x := y, y := x swaps rather than collapsing
        let e = Expr::lt(Expr::var(&x()), Expr::var(&y()));
        let map = HashMap::from([
            ("x".to_string(), Expr::var(&y())),
            ("y".to_string(), Expr::var(&x())),
        ]);
        assert_eq!(
            e.substitute_all(&map),
            Expr::lt(Expr::var(&y()), Expr::var(&x()))
        );
    }

    #[test]
    fn free_variables_skip_bound_and_include_predicate_lengths() {
        let a = Variable::array("a", ScalarTy::Int);
        let i = Variable::quantified("i");
        let e = Expr::and(
            Expr::forall(
                &i,
                Expr::ge(Expr::read(Expr::var(&a), Expr::var(&i)), Expr::var(&x())),
            ),
            Expr::app("sorted", vec![Expr::var(&a)]),
        );
        let free = e.free_variables();
        let names: Vec<&str> = free.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "a$length", "x"]);
        assert_eq!(free["a"], Ty::Array(ScalarTy::Int));
    }

    #[test]
    fn types() {
        let a = Variable::array("a", ScalarTy::Float);
        assert_eq!(Expr::read(Expr::var(&a), Expr::int(0)).ty(), Ty::Float);
        let upd = Expr::update(
            Expr::var(&a),
            Expr::int(0),
            Expr::float(1.0),
            Expr::var(&a.length_var().unwrap()),
        );
        assert_eq!(upd.ty(), Ty::Array(ScalarTy::Float));
        assert_eq!(upd.array_length(), Some(Expr::var(&a.length_var().unwrap())));
        assert_eq!(Expr::lt(Expr::int(1), Expr::int(2)).ty(), Ty::Bool);
        assert_eq!(Expr::neg(Expr::float(2.0)).ty(), Ty::Float);
        assert_eq!(Expr::call("f", vec![], Ty::Int).ty(), Ty::Int);
    }

    #[test]
    fn display() {
        let a = Variable::array("a", ScalarTy::Int);
        let i = Variable::quantified("i");
        let e = Expr::implies(
            Expr::not(Expr::bool(false)),
            Expr::exists(&i, Expr::eq(Expr::read(Expr::var(&a), Expr::var(&i)), Expr::int(-3))),
        );
        assert_eq!(e.to_string(), "(!false ==> (exists i. (a[i] == -3)))");
        assert_eq!(Expr::float(2.0).to_string(), "2.0");
    }

    #[test]
    fn conjoin_and_symbols() {
        assert_eq!(Expr::conjoin(vec![]), Expr::bool(true));
        let e = Expr::conjoin(vec![
            Expr::gt(Expr::call("f", vec![Expr::var(&x())], Ty::Int), Expr::int(0)),
            Expr::app("p", vec![Expr::var(&y())]),
            Expr::app("p", vec![Expr::var(&x())]),
        ]);
        assert_eq!(e.function_symbols()["f"], (vec![Ty::Int], Ty::Int));
        assert_eq!(e.predicate_names(), vec!["p".to_string()]);
    }
}
