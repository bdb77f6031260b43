use bugc_interface::{Diagnostic, Diagnostics, Span, error_code};
use bugc_sema::Type;

/// An IR generation error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IrgenError {
    #[error("unknown identifier `{name}`")]
    UnknownIdentifier { name: String, span: Span },
    #[error("expression cannot be assigned to")]
    InvalidLvalue { span: Span },
    #[error("unsupported storage access: {what}")]
    UnsupportedStorageAccess { what: String, span: Span },
    #[error("cannot write through `{name}` of type `{ty}`, which refers to storage")]
    StorageAliasWrite { name: String, ty: Type, span: Span },
    #[error("function `{function}` may reach its end without returning a value")]
    MissingReturn { function: String, span: Span },
    #[error("{message}")]
    Internal { message: String, span: Span },
}

impl IrgenError {
    pub(crate) fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::Internal { message: message.into(), span }
    }

    /// Returns the primary span of the error.
    pub fn span(&self) -> Span {
        match self {
            Self::UnknownIdentifier { span, .. }
            | Self::InvalidLvalue { span }
            | Self::UnsupportedStorageAccess { span, .. }
            | Self::StorageAliasWrite { span, .. }
            | Self::MissingReturn { span, .. }
            | Self::Internal { span, .. } => *span,
        }
    }

    /// Converts the error into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Self::UnknownIdentifier { .. } => error_code!(E3001),
            Self::InvalidLvalue { .. } => error_code!(E3002),
            Self::UnsupportedStorageAccess { .. } => error_code!(E3003),
            Self::StorageAliasWrite { .. } => error_code!(E3004),
            Self::MissingReturn { .. } => error_code!(E3005),
            Self::Internal { message, span } => {
                return Diagnostic::internal(message).span(*span);
            }
        };
        Diagnostic::error(code, self.to_string()).span(self.span())
    }
}

impl From<IrgenError> for Diagnostic {
    fn from(err: IrgenError) -> Self {
        err.to_diagnostic()
    }
}

impl From<IrgenError> for Diagnostics {
    fn from(err: IrgenError) -> Self {
        err.to_diagnostic().into()
    }
}
