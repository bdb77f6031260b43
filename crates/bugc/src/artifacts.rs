//! Pipeline input and the artifact records accumulated by each stage.

use bugc_ast::Program;
use bugc_codegen::{
    evm::{self, Bytecode},
    ir::Module,
};
use bugc_config::{OptLevel, OptimizerSettings, Opts};
use bugc_interface::Diagnostic;
use bugc_sema::Typed;

/// The input of a compilation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Input {
    /// The program source.
    pub source: String,
    pub optimizer: OptimizerSettings,
}

impl Input {
    /// Creates an input with the default optimizer settings.
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into(), optimizer: OptimizerSettings::default() }
    }

    /// Sets the optimization level.
    #[must_use]
    pub fn with_level(mut self, level: OptLevel) -> Self {
        self.optimizer.level = level;
        self
    }

    /// Creates an input with the optimizer settings of `opts`.
    pub fn from_opts(source: impl Into<String>, opts: &Opts) -> Self {
        Self { source: source.into(), optimizer: opts.optimizer }
    }
}

/// The input plus everything the passes run so far have produced.
#[derive(Clone, Debug)]
pub struct Artifacts<S> {
    pub input: Input,
    /// Warnings of every pass run so far.
    pub warnings: Vec<Diagnostic>,
    /// Stage-specific artifacts.
    pub stage: S,
}

impl<S> Artifacts<S> {
    /// Replaces the stage-specific artifacts, keeping the input and warnings.
    pub(crate) fn advance<T>(self, f: impl FnOnce(S) -> T) -> Artifacts<T> {
        Artifacts { input: self.input, warnings: self.warnings, stage: f(self.stage) }
    }
}

/// Artifacts after parsing.
#[derive(Clone, Debug)]
pub struct Parsed {
    pub ast: Program,
}

/// Artifacts after type checking.
#[derive(Clone, Debug)]
pub struct Checked {
    pub ast: Program,
    /// Types and bindings. Its warnings are moved to [`Artifacts::warnings`].
    pub typed: Typed,
}

/// Artifacts after IR generation and optimization.
#[derive(Clone, Debug)]
pub struct Lowered {
    pub ast: Program,
    pub typed: Typed,
    pub ir: Module,
}

/// Artifacts after code generation.
#[derive(Clone, Debug)]
pub struct Generated {
    pub ast: Program,
    pub typed: Typed,
    pub ir: Module,
    pub bytecode: Bytecode,
}

impl Generated {
    /// Returns the serialized runtime code.
    pub fn runtime_code(&self) -> Vec<u8> {
        evm::serialize(&self.bytecode.runtime)
    }

    /// Returns the serialized init code, which deploys the runtime.
    pub fn deployment_code(&self) -> Vec<u8> {
        evm::serialize(&self.bytecode.deployment())
    }
}
