use crate::sort::Sort;

/// SMT-LIB term (expression) representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    // === Literals ===
    /// Boolean literal
    BoolLit(bool),
    /// Integer literal (unbounded)
    IntLit(i128),
    /// Real literal
    RealLit(f64),

    // === Variables ===
    /// Named constant/variable reference
    Const(String),

    // === Boolean operations ===
    /// Logical NOT
    Not(Box<Term>),
    /// Logical AND (n-ary)
    And(Vec<Term>),
    /// Logical OR (n-ary)
    Or(Vec<Term>),
    /// Logical implication: `(=> a b)`
    Implies(Box<Term>, Box<Term>),
    /// Logical if-and-only-if: `(= a b)` for Bool
    Iff(Box<Term>, Box<Term>),

    // === Core ===
    /// Equality: `(= a b)`
    Eq(Box<Term>, Box<Term>),
    /// Distinct: `(distinct a b ...)`
    Distinct(Vec<Term>),
    /// If-then-else: `(ite cond then else)`
    Ite(Box<Term>, Box<Term>, Box<Term>),

    // === Arithmetic (Int and Real share the overloaded symbols) ===
    /// `(+ a b)`
    Add(Box<Term>, Box<Term>),
    /// `(- a b)`
    Sub(Box<Term>, Box<Term>),
    /// `(* a b)`
    Mul(Box<Term>, Box<Term>),
    /// `(- a)`
    Neg(Box<Term>),
    /// `(div a b)` -- integer division
    IntDiv(Box<Term>, Box<Term>),
    /// `(mod a b)`
    IntMod(Box<Term>, Box<Term>),
    /// `(/ a b)` -- real division
    RealDiv(Box<Term>, Box<Term>),
    /// `(< a b)`
    Lt(Box<Term>, Box<Term>),
    /// `(<= a b)`
    Le(Box<Term>, Box<Term>),
    /// `(> a b)`
    Gt(Box<Term>, Box<Term>),
    /// `(>= a b)`
    Ge(Box<Term>, Box<Term>),

    // === Array operations ===
    /// `(select array index)`
    Select(Box<Term>, Box<Term>),
    /// `(store array index value)`
    Store(Box<Term>, Box<Term>, Box<Term>),

    // === Quantifiers ===
    /// `(forall ((x Sort) ...) body)`
    Forall(Vec<(String, Sort)>, Box<Term>),
    /// `(exists ((x Sort) ...) body)`
    Exists(Vec<(String, Sort)>, Box<Term>),

    // === Function application ===
    /// `(f arg1 arg2 ...)`
    App(String, Vec<Term>),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Const(name.into())
    }

    pub fn not(t: Term) -> Self {
        Term::Not(Box::new(t))
    }

    pub fn implies(lhs: Term, rhs: Term) -> Self {
        Term::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn eq(lhs: Term, rhs: Term) -> Self {
        Term::Eq(Box::new(lhs), Box::new(rhs))
    }
}
