//! The pipeline prefixes, one per [`CompilerStage`](bugc_config::CompilerStage).
//!
//! Each sequence extends the previous one with the passes of the next stage.

use crate::{
    passes::{Codegen, IrGen, Optimize, Parse, TypeCheck},
    pass::{Step, Then},
};

/// Parses.
pub type AstSequence = Step<Parse>;
/// Parses and type checks.
pub type TypesSequence = Then<AstSequence, Step<TypeCheck>>;
/// Also generates and optimizes the IR.
pub type IrSequence = Then<Then<TypesSequence, Step<IrGen>>, Step<Optimize>>;
/// Also generates bytecode.
pub type BytecodeSequence = Then<IrSequence, Step<Codegen>>;

/// Returns the sequence stopping after parsing.
pub const fn ast() -> AstSequence {
    Step::new(Parse)
}

/// Returns the sequence stopping after type checking.
pub fn types() -> TypesSequence {
    ast().then(TypeCheck)
}

/// Returns the sequence stopping after IR optimization.
pub fn ir() -> IrSequence {
    types().then(IrGen).then(Optimize)
}

/// Returns the full pipeline.
pub fn bytecode() -> BytecodeSequence {
    ir().then(Codegen)
}
