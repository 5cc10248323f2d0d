/// Encode IR expressions as SMT-LIB terms.
use pivc_smtlib::{Command, Sort, Term};

use crate::encode_sort::encode_type;
use crate::expr::{BinOp, Expr, Quantifier, UnOp};
use crate::ir::Predicate;
use crate::types::Ty;

/// Convert an expression to an SMT-LIB term.
///
/// Array updates become `store`; the length argument only matters to the
/// evaluator. Predicate applications pass the length of every array
/// argument after the arguments themselves.
pub fn encode_expr(expr: &Expr) -> Term {
    match expr {
        Expr::Var(v) => Term::Const(v.name.clone()),
        Expr::IntLit(n) => Term::IntLit(i128::from(*n)),
        Expr::FloatLit(x) => Term::RealLit(*x),
        Expr::BoolLit(b) => Term::BoolLit(*b),
        Expr::Unary(UnOp::Neg, e) => Term::Neg(Box::new(encode_expr(e))),
        Expr::Unary(UnOp::Not, e) => Term::not(encode_expr(e)),
        Expr::Binary(op, lhs, rhs) => encode_binop(*op, lhs.ty(), encode_expr(lhs), encode_expr(rhs)),
        Expr::Quantified {
            quantifier,
            variable,
            body,
        } => {
            let bound = vec![(variable.name.clone(), Sort::Int)];
            let body = Box::new(encode_expr(body));
            match quantifier {
                Quantifier::Forall => Term::Forall(bound, body),
                Quantifier::Exists => Term::Exists(bound, body),
            }
        }
        Expr::ArrayRead { array, index } => {
            Term::Select(Box::new(encode_expr(array)), Box::new(encode_expr(index)))
        }
        Expr::ArrayUpdate {
            array,
            index,
            value,
            ..
        } => Term::Store(
            Box::new(encode_expr(array)),
            Box::new(encode_expr(index)),
            Box::new(encode_expr(value)),
        ),
        Expr::Call { function, args, .. } => {
            Term::App(function.clone(), args.iter().map(encode_expr).collect())
        }
        Expr::PredicateApp { predicate, args } => {
            let mut terms: Vec<Term> = args.iter().map(encode_expr).collect();
            terms.extend(
                args.iter()
                    .filter(|a| a.ty().is_array())
                    .filter_map(Expr::array_length)
                    .map(|len| encode_expr(&len)),
            );
            Term::App(predicate.clone(), terms)
        }
    }
}

/// Encode a binary operator. `operand_ty` picks integer or real division.
pub fn encode_binop(op: BinOp, operand_ty: Ty, lhs: Term, rhs: Term) -> Term {
    let (l, r) = (Box::new(lhs), Box::new(rhs));
    match op {
        BinOp::Add => Term::Add(l, r),
        BinOp::Sub => Term::Sub(l, r),
        BinOp::Mul => Term::Mul(l, r),
        BinOp::Div if operand_ty == Ty::Float => Term::RealDiv(l, r),
        BinOp::Div => Term::IntDiv(l, r),
        BinOp::Mod => Term::IntMod(l, r),
        BinOp::Lt => Term::Lt(l, r),
        BinOp::Le => Term::Le(l, r),
        BinOp::Gt => Term::Gt(l, r),
        BinOp::Ge => Term::Ge(l, r),
        BinOp::Eq => Term::Eq(l, r),
        BinOp::Ne => Term::not(Term::Eq(l, r)),
        BinOp::And => Term::And(vec![*l, *r]),
        BinOp::Or => Term::Or(vec![*l, *r]),
        BinOp::Implies => Term::Implies(l, r),
        BinOp::Iff => Term::Iff(l, r),
    }
}

/// `define-fun` for a predicate. Array parameters are followed by one
/// `Int` parameter per array carrying its length.
pub fn predicate_definition(predicate: &Predicate) -> Command {
    let mut params: Vec<(String, Sort)> = predicate
        .parameters
        .iter()
        .map(|p| (p.name.clone(), encode_type(p.ty)))
        .collect();
    params.extend(
        predicate
            .parameters
            .iter()
            .filter_map(|p| p.length_var())
            .map(|len| (len.name, Sort::Int)),
    );
    Command::DefineFun(
        predicate.name.clone(),
        params,
        Sort::Bool,
        encode_expr(&predicate.expression),
    )
}

/// Declarations for the free variables and function symbols of `expr`.
pub fn declarations(expr: &Expr) -> Vec<Command> {
    let mut commands: Vec<Command> = expr
        .free_variables()
        .into_iter()
        .map(|(name, ty)| Command::DeclareConst(name, encode_type(ty)))
        .collect();
    commands.extend(
        expr.function_symbols()
            .into_iter()
            .map(|(name, (params, result))| {
                Command::DeclareFun(
                    name,
                    params.into_iter().map(encode_type).collect(),
                    encode_type(result),
                )
            }),
    );
    commands
}
