/// Concrete evaluation of expressions.
///
/// Integer division and modulus are Euclidean, matching SMT-LIB `div` and
/// `mod`. Quantifiers range over a bounded integer domain, so a `true`
/// result for a quantified formula only speaks for that domain.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::expr::{BinOp, Expr, Quantifier, UnOp};
use crate::ir::{Predicate, Program};
use crate::types::{ScalarTy, Ty};
use crate::validity::CounterModel;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(ArrayValue),
}

/// A total map from indices to values: explicit entries over a default.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    elements: BTreeMap<i64, Value>,
    default: Box<Value>,
}

impl ArrayValue {
    pub fn constant(default: Value) -> Self {
        Self {
            elements: BTreeMap::new(),
            default: Box::new(default),
        }
    }

    pub fn from_elements(default: Value, elements: impl IntoIterator<Item = Value>) -> Self {
        let mut array = Self::constant(default);
        for (i, v) in (0..).zip(elements) {
            array = array.store(i, v);
        }
        array
    }

    pub fn select(&self, index: i64) -> &Value {
        self.elements.get(&index).unwrap_or(&self.default)
    }

    /// Functional update. Entries equal to the default are not kept, so
    /// equal arrays compare equal.
    pub fn store(&self, index: i64, value: Value) -> Self {
        let mut next = self.clone();
        if value == *next.default {
            next.elements.remove(&index);
        } else {
            next.elements.insert(index, value);
        }
        next
    }
}

impl Value {
    pub fn ty_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Array(_) => "array",
        }
    }

    /// The zero of a scalar type.
    pub fn default_for(ty: ScalarTy) -> Value {
        match ty {
            ScalarTy::Int => Value::Int(0),
            ScalarTy::Float => Value::Float(0.0),
            ScalarTy::Bool => Value::Bool(false),
        }
    }

    /// Parse a scalar as printed in a solver model: `5`, `(- 5)`, `true`,
    /// `1.5`, `(/ 1.0 4.0)`, `(- (/ 1.0 4.0))`.
    pub fn parse_scalar(text: &str, ty: Ty) -> Option<Value> {
        let text = text.trim();
        if let Some(inner) = text.strip_prefix("(-").and_then(|t| t.strip_suffix(')')) {
            return match Value::parse_scalar(inner, ty)? {
                Value::Int(n) => n.checked_neg().map(Value::Int),
                Value::Float(x) => Some(Value::Float(-x)),
                _ => None,
            };
        }
        match ty {
            Ty::Int => text.parse().ok().map(Value::Int),
            Ty::Bool => text.parse().ok().map(Value::Bool),
            Ty::Float => {
                if let Some(inner) = text.strip_prefix("(/").and_then(|t| t.strip_suffix(')')) {
                    let mut parts = inner.split_whitespace();
                    let num: f64 = parts.next()?.parse().ok()?;
                    let den: f64 = parts.next()?.parse().ok()?;
                    return Some(Value::Float(num / den));
                }
                text.parse().ok().map(Value::Float)
            }
            Ty::Array(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, (k, v)) in a.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                if !a.elements.is_empty() {
                    write!(f, ", ")?;
                }
                write!(f, "_: {}]", a.default)
            }
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("variable `{0}` has no value")]
    Unbound(String),

    #[error("expected {expected} in `{expr}`, found {found}")]
    Type {
        expr: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("division by zero in `{0}`")]
    DivisionByZero(String),

    #[error("integer overflow in `{0}`")]
    Overflow(String),

    #[error("function `{0}` has no interpretation")]
    Uninterpreted(String),

    #[error("unknown predicate `{0}`")]
    UnknownPredicate(String),

    #[error("cannot read value of `{name}` from `{text}`")]
    Model { name: String, text: String },
}

/// Variable values, keyed by name. Array lengths are ordinary `Int` entries
/// under `<name>$length`.
pub type Valuation = HashMap<String, Value>;

pub struct Evaluator<'p> {
    predicates: HashMap<&'p str, &'p Predicate>,
    domain: RangeInclusive<i64>,
}

impl<'p> Evaluator<'p> {
    pub const DEFAULT_DOMAIN: RangeInclusive<i64> = -8..=8;

    pub fn new(program: &'p Program) -> Self {
        Self {
            predicates: program
                .predicates
                .iter()
                .map(|p| (p.name.as_str(), p))
                .collect(),
            domain: Self::DEFAULT_DOMAIN,
        }
    }

    /// Range quantified variables are drawn from.
    pub fn with_domain(mut self, domain: RangeInclusive<i64>) -> Self {
        self.domain = domain;
        self
    }

    pub fn domain(&self) -> &RangeInclusive<i64> {
        &self.domain
    }

    pub fn eval_bool(&self, expr: &Expr, env: &Valuation) -> Result<bool, EvalError> {
        match self.eval(expr, env)? {
            Value::Bool(b) => Ok(b),
            other => Err(type_error(expr, "bool", &other)),
        }
    }

    pub fn eval(&self, expr: &Expr, env: &Valuation) -> Result<Value, EvalError> {
        match expr {
            Expr::Var(v) => env
                .get(&v.name)
                .cloned()
                .ok_or_else(|| EvalError::Unbound(v.name.clone())),
            Expr::IntLit(n) => Ok(Value::Int(*n)),
            Expr::FloatLit(x) => Ok(Value::Float(*x)),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::Unary(op, e) => match (op, self.eval(e, env)?) {
                (UnOp::Neg, Value::Int(n)) => n
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| EvalError::Overflow(expr.to_string())),
                (UnOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
                (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (UnOp::Neg, other) => Err(type_error(expr, "number", &other)),
                (UnOp::Not, other) => Err(type_error(expr, "bool", &other)),
            },
            Expr::Binary(op, lhs, rhs) => self.binary(expr, *op, lhs, rhs, env),
            Expr::Quantified {
                quantifier,
                variable,
                body,
            } => {
                let mut scope = env.clone();
                for i in self.domain.clone() {
                    scope.insert(variable.name.clone(), Value::Int(i));
                    let holds = self.eval_bool(body, &scope)?;
                    match quantifier {
                        Quantifier::Forall if !holds => return Ok(Value::Bool(false)),
                        Quantifier::Exists if holds => return Ok(Value::Bool(true)),
                        _ => {}
                    }
                }
                Ok(Value::Bool(*quantifier == Quantifier::Forall))
            }
            Expr::ArrayRead { array, index } => {
                let array = self.eval_array(array, env)?;
                let index = self.eval_int(index, env)?;
                Ok(array.select(index).clone())
            }
            Expr::ArrayUpdate {
                array,
                index,
                value,
                ..
            } => {
                let array = self.eval_array(array, env)?;
                let index = self.eval_int(index, env)?;
                let value = self.eval(value, env)?;
                Ok(Value::Array(array.store(index, value)))
            }
            Expr::Call { function, .. } => Err(EvalError::Uninterpreted(function.clone())),
            Expr::PredicateApp { predicate, args } => {
                let pred = self
                    .predicates
                    .get(predicate.as_str())
                    .ok_or_else(|| EvalError::UnknownPredicate(predicate.clone()))?;
                let mut scope = Valuation::new();
                for (param, arg) in pred.parameters.iter().zip(args) {
                    scope.insert(param.name.clone(), self.eval(arg, env)?);
                    if let (Some(length), Some(arg_length)) = (param.length_var(), arg.array_length()) {
                        scope.insert(length.name, self.eval(&arg_length, env)?);
                    }
                }
                self.eval_bool(&pred.expression, &scope).map(Value::Bool)
            }
        }
    }

    fn binary(
        &self,
        expr: &Expr,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        env: &Valuation,
    ) -> Result<Value, EvalError> {
        // connectives short-circuit so guarded reads stay in bounds
        match op {
            BinOp::And => {
                return Ok(Value::Bool(
                    self.eval_bool(lhs, env)? && self.eval_bool(rhs, env)?,
                ));
            }
            BinOp::Or => {
                return Ok(Value::Bool(
                    self.eval_bool(lhs, env)? || self.eval_bool(rhs, env)?,
                ));
            }
            BinOp::Implies => {
                return Ok(Value::Bool(
                    !self.eval_bool(lhs, env)? || self.eval_bool(rhs, env)?,
                ));
            }
            _ => {}
        }

        let l = self.eval(lhs, env)?;
        let r = self.eval(rhs, env)?;
        let overflow = || EvalError::Overflow(expr.to_string());
        let value = match (op, &l, &r) {
            (BinOp::Eq, _, _) => Value::Bool(l == r),
            (BinOp::Ne, _, _) => Value::Bool(l != r),
            (BinOp::Iff, Value::Bool(a), Value::Bool(b)) => Value::Bool(a == b),

            (BinOp::Div | BinOp::Mod, Value::Int(_), Value::Int(0)) => {
                return Err(EvalError::DivisionByZero(expr.to_string()));
            }
            (BinOp::Add, Value::Int(a), Value::Int(b)) => Value::Int(a.checked_add(*b).ok_or_else(overflow)?),
            (BinOp::Sub, Value::Int(a), Value::Int(b)) => Value::Int(a.checked_sub(*b).ok_or_else(overflow)?),
            (BinOp::Mul, Value::Int(a), Value::Int(b)) => Value::Int(a.checked_mul(*b).ok_or_else(overflow)?),
            (BinOp::Div, Value::Int(a), Value::Int(b)) => {
                Value::Int(a.checked_div_euclid(*b).ok_or_else(overflow)?)
            }
            (BinOp::Mod, Value::Int(a), Value::Int(b)) => {
                Value::Int(a.checked_rem_euclid(*b).ok_or_else(overflow)?)
            }
            (BinOp::Lt, Value::Int(a), Value::Int(b)) => Value::Bool(a < b),
            (BinOp::Le, Value::Int(a), Value::Int(b)) => Value::Bool(a <= b),
            (BinOp::Gt, Value::Int(a), Value::Int(b)) => Value::Bool(a > b),
            (BinOp::Ge, Value::Int(a), Value::Int(b)) => Value::Bool(a >= b),

            (BinOp::Div, Value::Float(_), Value::Float(b)) if *b == 0.0 => {
                return Err(EvalError::DivisionByZero(expr.to_string()));
            }
            (BinOp::Add, Value::Float(a), Value::Float(b)) => Value::Float(a + b),
            (BinOp::Sub, Value::Float(a), Value::Float(b)) => Value::Float(a - b),
            (BinOp::Mul, Value::Float(a), Value::Float(b)) => Value::Float(a * b),
            (BinOp::Div, Value::Float(a), Value::Float(b)) => Value::Float(a / b),
            (BinOp::Lt, Value::Float(a), Value::Float(b)) => Value::Bool(a < b),
            (BinOp::Le, Value::Float(a), Value::Float(b)) => Value::Bool(a <= b),
            (BinOp::Gt, Value::Float(a), Value::Float(b)) => Value::Bool(a > b),
            (BinOp::Ge, Value::Float(a), Value::Float(b)) => Value::Bool(a >= b),

            _ => {
                return Err(EvalError::Type {
                    expr: expr.to_string(),
                    expected: "matching operands",
                    found: r.ty_name(),
                });
            }
        };
        Ok(value)
    }

    fn eval_int(&self, expr: &Expr, env: &Valuation) -> Result<i64, EvalError> {
        match self.eval(expr, env)? {
            Value::Int(n) => Ok(n),
            other => Err(type_error(expr, "int", &other)),
        }
    }

    fn eval_array(&self, expr: &Expr, env: &Valuation) -> Result<ArrayValue, EvalError> {
        match self.eval(expr, env)? {
            Value::Array(a) => Ok(a),
            other => Err(type_error(expr, "array", &other)),
        }
    }

    /// Evaluate `formula` under the scalar values of a counter model.
    ///
    /// Free variables the model leaves out default to zero, as solvers
    /// omit variables whose value does not matter.
    pub fn replay(&self, formula: &Expr, model: &CounterModel) -> Result<bool, EvalError> {
        let mut env = Valuation::new();
        for (name, ty) in formula.free_variables() {
            let value = match (model.get(&name), ty) {
                (Some(text), _) => {
                    Value::parse_scalar(text, ty).ok_or_else(|| EvalError::Model {
                        name: name.clone(),
                        text: text.to_string(),
                    })?
                }
                (None, Ty::Int) => Value::Int(0),
                (None, Ty::Float) => Value::Float(0.0),
                (None, Ty::Bool) => Value::Bool(false),
                (None, Ty::Array(elem)) => Value::Array(ArrayValue::constant(Value::default_for(elem))),
            };
            env.insert(name, value);
        }
        self.eval_bool(formula, &env)
    }
}

fn type_error(expr: &Expr, expected: &'static str, found: &Value) -> EvalError {
    EvalError::Type {
        expr: expr.to_string(),
        expected,
        found: found.ty_name(),
    }
}
