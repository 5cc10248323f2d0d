/// Encode IR types as SMT-LIB sorts.
use pivc_smtlib::Sort;

use crate::types::{ScalarTy, Ty};

/// Convert an IR type to an SMT-LIB sort.
///
/// - `int` → `Int`
/// - `float` → `Real` (exact rationals, no rounding)
/// - `bool` → `Bool`
/// - `T[]` → `(Array Int T)`; the length lives in a separate `Int` constant
pub fn encode_type(ty: Ty) -> Sort {
    match ty {
        Ty::Int => Sort::Int,
        Ty::Float => Sort::Real,
        Ty::Bool => Sort::Bool,
        Ty::Array(elem) => Sort::int_array(encode_scalar(elem)),
    }
}

pub fn encode_scalar(ty: ScalarTy) -> Sort {
    encode_type(Ty::from(ty))
}
