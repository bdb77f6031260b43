//! The BUG compiler pipeline.
//!
//! Source text goes through the passes in [`passes`], chained by the typed framework in [`pass`]
//! into the [`sequence`]s. [`compile`] runs the sequence that stops at a given stage:
//!
//! ```
//! use bugc::{Input, Output, compile, config::{CompilerStage, OptLevel}};
//!
//! let input = Input::new("name Counter; storage { [0] n: uint256; } code { n = n + 1; }")
//!     .with_level(OptLevel::O2);
//! let Output::Bytecode(artifacts) = compile(input, CompilerStage::Bytecode).unwrap() else {
//!     unreachable!()
//! };
//! assert!(!artifacts.stage.runtime_code().is_empty());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(test, allow(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

#[doc(inline)]
pub use bugc_ast as ast;
#[doc(inline)]
pub use bugc_codegen as codegen;
#[doc(inline)]
pub use bugc_config as config;
#[doc(inline)]
pub use bugc_interface as interface;
#[doc(inline)]
pub use bugc_parse as parse;
#[doc(inline)]
pub use bugc_sema as sema;

mod artifacts;
pub use artifacts::{Artifacts, Checked, Generated, Input, Lowered, Parsed};

pub mod pass;
pub mod passes;
pub mod sequence;

use bugc_codegen::{evm::Bytecode, ir::Module};
use bugc_config::CompilerStage;
use bugc_interface::{Diagnostic, Diagnostics};
use pass::Stage;

/// The artifacts of a compilation, by the stage it stopped at.
#[derive(Clone, Debug)]
pub enum Output {
    Ast(Artifacts<Parsed>),
    Types(Artifacts<Checked>),
    Ir(Artifacts<Lowered>),
    Bytecode(Artifacts<Generated>),
}

impl Output {
    /// Returns the stage the compilation stopped at.
    pub fn stage(&self) -> CompilerStage {
        match self {
            Self::Ast(_) => CompilerStage::Ast,
            Self::Types(_) => CompilerStage::Types,
            Self::Ir(_) => CompilerStage::Ir,
            Self::Bytecode(_) => CompilerStage::Bytecode,
        }
    }

    /// Returns the warnings of every pass that ran.
    pub fn warnings(&self) -> &[Diagnostic] {
        match self {
            Self::Ast(a) => &a.warnings,
            Self::Types(a) => &a.warnings,
            Self::Ir(a) => &a.warnings,
            Self::Bytecode(a) => &a.warnings,
        }
    }

    /// Returns the IR, if the compilation got that far.
    pub fn ir(&self) -> Option<&Module> {
        match self {
            Self::Ast(_) | Self::Types(_) => None,
            Self::Ir(a) => Some(&a.stage.ir),
            Self::Bytecode(a) => Some(&a.stage.ir),
        }
    }

    /// Returns the bytecode, if the compilation got that far.
    pub fn bytecode(&self) -> Option<&Bytecode> {
        match self {
            Self::Bytecode(a) => Some(&a.stage.bytecode),
            Self::Ast(_) | Self::Types(_) | Self::Ir(_) => None,
        }
    }
}

/// Compiles `input` up to and including `stage`.
#[instrument(
    name = "compile",
    level = "debug",
    skip_all,
    fields(stage = %stage, level = %input.optimizer.level)
)]
pub fn compile(input: Input, stage: CompilerStage) -> Result<Output, Diagnostics> {
    let output = match stage {
        CompilerStage::Ast => sequence::ast().execute(input).map(Output::Ast),
        CompilerStage::Types => sequence::types().execute(input).map(Output::Types),
        CompilerStage::Ir => sequence::ir().execute(input).map(Output::Ir),
        CompilerStage::Bytecode => sequence::bytecode().execute(input).map(Output::Bytecode),
    }?;
    debug!(warnings = output.warnings().len(), "compiled");
    Ok(output)
}
