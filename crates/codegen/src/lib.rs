//! BUG middle and back end.
//!
//! - [`lower`] turns a checked [`Program`](bugc_ast::Program) into the SSA [`ir`];
//! - [`transform`] optimizes the IR at a given [`OptLevel`](bugc_config::OptLevel);
//! - [`evm`] generates EVM bytecode from the IR.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(test, allow(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod evm;
pub mod ir;
pub mod lower;
pub mod transform;
