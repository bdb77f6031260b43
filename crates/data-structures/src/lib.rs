//! Common data structures shared by the BUG compiler crates.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod index;
pub mod map;

pub use smallvec;
