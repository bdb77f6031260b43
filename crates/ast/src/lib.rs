//! BUG Abstract Syntax Tree (AST) definitions.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod ast;
pub mod token;

pub use ast::*;
