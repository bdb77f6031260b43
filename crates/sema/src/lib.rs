//! BUG semantic analysis.
//!
//! Resolves types and identifier bindings for a parsed [`Program`](bugc_ast::Program).

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(test, allow(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

mod error;
pub use error::TypeError;

mod ty;
pub use ty::{StructType, Type, WORD_SIZE};

pub mod typeck;
pub use typeck::{Bindings, TypeMap, Typed, check};
