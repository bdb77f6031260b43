use crate::Type;
use bugc_interface::{Diagnostic, Diagnostics, Span, error_code};

/// A type checking error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("cannot find `{name}` in this scope")]
    UndefinedIdentifier { name: String, span: Span },
    #[error("mismatched types: expected `{expected}`, found `{found}`")]
    NotAssignable { expected: Type, found: Type, span: Span },
    #[error("cannot apply `{op}` to a value of type `{ty}`")]
    InvalidOperand { op: &'static str, ty: Type, span: Span },
    #[error("no common type for `{left}` and `{right}` in `{op}` expression")]
    NoCommonType { op: &'static str, left: Type, right: Type, span: Span },
    #[error("function `{name}` takes {expected} argument(s) but {found} were supplied")]
    ArgumentCount { name: String, expected: usize, found: usize, span: Span },
    #[error("no member `{member}` on type `{ty}`")]
    UnknownMember { ty: Type, member: String, span: Span },
    #[error("cannot find type `{name}`")]
    UnknownType { name: String, span: Span },
    #[error("`{keyword}` outside of a loop")]
    LoopControlOutsideLoop { keyword: &'static str, span: Span },
    #[error("missing return value of type `{expected}`")]
    MissingReturnValue { expected: Type, span: Span },
    #[error("unexpected return value")]
    UnexpectedReturnValue { span: Span },
    #[error("cannot index into a value of type `{ty}`")]
    NotIndexable { ty: Type, span: Span },
    #[error("expression is not callable")]
    NotCallable { span: Span },
    #[error("function `{name}` does not return a value")]
    NoValue { name: String, span: Span },
    #[error("function `{name}` cannot be used as a value")]
    FunctionAsValue { name: String, span: Span },
    #[error("cannot cast `{from}` to `{to}`")]
    InvalidCast { from: Type, to: Type, span: Span },
    #[error("invalid left-hand side of assignment")]
    InvalidAssignmentTarget { span: Span },
    #[error("`{name}` is defined multiple times")]
    DuplicateDefinition { name: String, span: Span },
    #[error("cannot infer the element type of an empty array literal")]
    EmptyArrayLiteral { span: Span },
    #[error("recursive struct `{name}` has infinite size")]
    RecursiveStruct { name: String, span: Span },
    #[error("literal out of range for `{ty}`")]
    LiteralOutOfRange { ty: Type, span: Span },
    #[error("functions can only take and return value types, found `{ty}`")]
    UnsupportedParameterType { ty: Type, span: Span },
}

impl TypeError {
    /// Returns the primary span of the error.
    pub fn span(&self) -> Span {
        match self {
            Self::UndefinedIdentifier { span, .. }
            | Self::NotAssignable { span, .. }
            | Self::InvalidOperand { span, .. }
            | Self::NoCommonType { span, .. }
            | Self::ArgumentCount { span, .. }
            | Self::UnknownMember { span, .. }
            | Self::UnknownType { span, .. }
            | Self::LoopControlOutsideLoop { span, .. }
            | Self::MissingReturnValue { span, .. }
            | Self::UnexpectedReturnValue { span }
            | Self::NotIndexable { span, .. }
            | Self::NotCallable { span }
            | Self::NoValue { span, .. }
            | Self::FunctionAsValue { span, .. }
            | Self::InvalidCast { span, .. }
            | Self::InvalidAssignmentTarget { span }
            | Self::DuplicateDefinition { span, .. }
            | Self::EmptyArrayLiteral { span }
            | Self::RecursiveStruct { span, .. }
            | Self::LiteralOutOfRange { span, .. }
            | Self::UnsupportedParameterType { span, .. } => *span,
        }
    }

    /// Converts the error into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Self::UndefinedIdentifier { .. } => error_code!(E2001),
            Self::NotAssignable { .. } => error_code!(E2002),
            Self::InvalidOperand { .. } => error_code!(E2003),
            Self::NoCommonType { .. } => error_code!(E2004),
            Self::ArgumentCount { .. } => error_code!(E2005),
            Self::UnknownMember { .. } => error_code!(E2006),
            Self::UnknownType { .. } => error_code!(E2007),
            Self::LoopControlOutsideLoop { .. } => error_code!(E2008),
            Self::MissingReturnValue { .. } => error_code!(E2009),
            Self::UnexpectedReturnValue { .. } => error_code!(E2010),
            Self::NotIndexable { .. } => error_code!(E2011),
            Self::NotCallable { .. } => error_code!(E2012),
            Self::NoValue { .. } => error_code!(E2013),
            Self::FunctionAsValue { .. } => error_code!(E2014),
            Self::InvalidCast { .. } => error_code!(E2015),
            Self::InvalidAssignmentTarget { .. } => error_code!(E2016),
            Self::DuplicateDefinition { .. } => error_code!(E2017),
            Self::EmptyArrayLiteral { .. } => error_code!(E2018),
            Self::RecursiveStruct { .. } => error_code!(E2019),
            Self::LiteralOutOfRange { .. } => error_code!(E2020),
            Self::UnsupportedParameterType { .. } => error_code!(E2021),
        };
        Diagnostic::error(code, self.to_string()).span(self.span())
    }
}

impl From<TypeError> for Diagnostic {
    fn from(err: TypeError) -> Self {
        err.to_diagnostic()
    }
}

impl From<TypeError> for Diagnostics {
    fn from(err: TypeError) -> Self {
        err.to_diagnostic().into()
    }
}

/// Returns the warning emitted when a `let` binding shadows an outer variable.
pub(crate) fn shadowed_variable(name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(error_code!(W2001), format!("`{name}` shadows an outer variable"))
        .span(span)
}
