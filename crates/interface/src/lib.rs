//! Source locations and diagnostics shared by every stage of the BUG compiler.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticId, Diagnostics, Level};

mod span;
pub use span::{Span, Spanned};
