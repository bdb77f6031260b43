use crate::ir::TempId;
use bugc_interface::{Diagnostic, Diagnostics, error_code};

/// An EVM code generation error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvmgenError {
    #[error("stack shape mismatch: expected [{expected}], found [{found}]")]
    StackShapeMismatch { expected: String, found: String },
    #[error("{temp} is {depth} slots deep on the stack, beyond the reach of `DUP16`")]
    DupDepthExceeded { temp: TempId, depth: usize },
    #[error("{temp} is neither on the stack nor in memory")]
    ValueNotFound { temp: TempId },
    #[error("function `{function}` is recursive, which static frames cannot support")]
    RecursiveCall { function: String },
    #[error("call to unknown function `{name}`")]
    UnknownFunction { name: String },
    #[error("constant {value} does not fit in a single word")]
    UnsupportedConstant { value: String },
    #[error("code size {size} exceeds the range of a two-byte jump target")]
    CodeTooLarge { size: usize },
    #[error("{message}")]
    Internal { message: String },
}

impl EvmgenError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Converts the error into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Self::StackShapeMismatch { .. } => error_code!(E4001),
            Self::DupDepthExceeded { .. } => error_code!(E4002),
            Self::ValueNotFound { .. } => error_code!(E4003),
            Self::RecursiveCall { .. } => error_code!(E4004),
            Self::UnknownFunction { .. } => error_code!(E4005),
            Self::UnsupportedConstant { .. } => error_code!(E4006),
            Self::CodeTooLarge { .. } => error_code!(E4007),
            Self::Internal { message } => return Diagnostic::internal(message),
        };
        Diagnostic::error(code, self.to_string())
    }
}

impl From<EvmgenError> for Diagnostic {
    fn from(err: EvmgenError) -> Self {
        err.to_diagnostic()
    }
}

impl From<EvmgenError> for Diagnostics {
    fn from(err: EvmgenError) -> Self {
        err.to_diagnostic().into()
    }
}
