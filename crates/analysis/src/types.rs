//! Value types and the interned signature table.
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Element type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarTy {
    Int,
    Float,
    Bool,
}

/// Type of a variable or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ty {
    Int,
    Float,
    Bool,
    /// Arrays are indexed by `Int`.
    Array(ScalarTy),
}

impl Ty {
    pub fn is_numeric(self) -> bool {
        matches!(self, Ty::Int | Ty::Float)
    }

    pub fn is_array(self) -> bool {
        matches!(self, Ty::Array(_))
    }

    /// Element type for arrays, `None` for scalars.
    pub fn element(self) -> Option<Ty> {
        match self {
            Ty::Array(elem) => Some(elem.into()),
            _ => None,
        }
    }
}

impl From<ScalarTy> for Ty {
    fn from(ty: ScalarTy) -> Self {
        match ty {
            ScalarTy::Int => Ty::Int,
            ScalarTy::Float => Ty::Float,
            ScalarTy::Bool => Ty::Bool,
        }
    }
}

impl fmt::Display for ScalarTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarTy::Int => write!(f, "int"),
            ScalarTy::Float => write!(f, "float"),
            ScalarTy::Bool => write!(f, "bool"),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "int"),
            Ty::Float => write!(f, "float"),
            Ty::Bool => write!(f, "bool"),
            Ty::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

/// Parameter and return types of a function or predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Ty>,
    pub returns: Vec<Ty>,
}

impl Signature {
    pub fn new(params: Vec<Ty>, returns: Vec<Ty>) -> Self {
        Self { params, returns }
    }

    /// Signature of a predicate over `params`.
    pub fn predicate(params: Vec<Ty>) -> Self {
        Self {
            params,
            returns: vec![Ty::Bool],
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |tys: &[Ty]| {
            tys.iter()
                .map(Ty::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "({}) -> ({})", join(&self.params), join(&self.returns))
    }
}

/// Handle into a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SigId(pub usize);

/// Interned signatures, keyed by structural identity.
///
/// Structurally equal signatures share one `SigId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Signature>", into = "Vec<Signature>")]
pub struct TypeTable {
    signatures: Vec<Signature>,
    index: HashMap<Signature, SigId>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, sig: Signature) -> SigId {
        if let Some(id) = self.index.get(&sig) {
            return *id;
        }
        let id = SigId(self.signatures.len());
        self.signatures.push(sig.clone());
        self.index.insert(sig, id);
        id
    }

    pub fn get(&self, id: SigId) -> Option<&Signature> {
        self.signatures.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl From<Vec<Signature>> for TypeTable {
    fn from(signatures: Vec<Signature>) -> Self {
        let mut table = TypeTable::new();
        for sig in signatures {
            table.intern(sig);
        }
        table
    }
}

impl From<TypeTable> for Vec<Signature> {
    fn from(table: TypeTable) -> Self {
        table.signatures
    }
}
