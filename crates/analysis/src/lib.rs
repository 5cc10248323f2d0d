//! # pivc-analysis
//!
//! Deductive verification of annotated imperative programs.
//!
//! A front end hands over a [`Program`]: functions lowered to control-flow
//! graphs whose entry, exit and loop-head blocks carry the pre/postconditions
//! and loop invariants. The engine splits every function into basic paths
//! between those annotations, folds each path into a verification condition
//! by weakest liberal precondition, and asks a [`ValidityChecker`] to prove it.
//!
//! ## Usage
//!
//! ```
//! use pivc_analysis::{Expr, ProgramBuilder, Ty, Variable};
//!
//! let x = Variable::local("x", Ty::Int);
//! let mut builder = ProgramBuilder::new();
//! let f = builder.declare_function(
//!     "five",
//!     vec![],
//!     vec![x.clone()],
//!     Expr::bool(true),
//!     Expr::eq(Expr::var(&x), Expr::int(5)),
//! );
//! let mut body = builder.body(f);
//! let (pre, post) = (body.precondition(), body.postcondition());
//! let b = body.basic_block();
//! body.edge(pre, b).assign(b, &x, Expr::int(5)).edge(b, post);
//! let program = builder.finish().unwrap();
//!
//! let paths = pivc_analysis::collect_basic_paths(&program, &program.functions[0]).unwrap();
//! assert_eq!(paths.len(), 1);
//! ```

pub mod basic_path;
pub mod builder;
pub mod encode_sort;
pub mod encode_term;
pub mod error;
pub mod eval;
pub mod expr;
pub mod ir;
pub mod pretty;
pub mod types;
pub mod validity;
pub mod verifier;
pub mod wlp;

pub use basic_path::{BasicPath, ObligationKind, PathEnumerator, collect_basic_paths};
pub use builder::ProgramBuilder;
pub use error::{IrError, VerifyError};
pub use expr::{BinOp, Expr, Quantifier, UnOp};
pub use ir::{BlockId, Function, FunctionId, Predicate, Program, Variable};
pub use types::{ScalarTy, Ty};
pub use validity::{CounterModel, Validity, ValidityChecker};
pub use verifier::{FunctionReport, ProgramReport, Verdict, Verifier, VerifyOptions};
