use bugc_interface::{Diagnostic, Diagnostics, Span, error_code};

/// Parser result type.
pub type PResult<T> = Result<T, ParseError>;

/// An error produced while lexing or parsing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {}, found {found}", format_expected(.expected))]
    UnexpectedToken { found: String, expected: Vec<String>, span: Span },
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },
    #[error("unknown start of token: {c:?}")]
    UnknownCharacter { c: char, span: Span },
    #[error("invalid number literal `{literal}`: {reason}")]
    InvalidNumber { literal: String, reason: &'static str, span: Span },
    #[error("unknown character escape: `\\{escape}`")]
    InvalidEscape { escape: String, span: Span },
    #[error("unknown member `{base}.{member}`")]
    UnknownSpecial { base: String, member: String, span: Span },
    #[error("invalid type name `{name}`")]
    InvalidType { name: String, span: Span },
}

impl ParseError {
    /// Returns the primary span of the error.
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnterminatedString { span }
            | Self::UnterminatedComment { span }
            | Self::UnknownCharacter { span, .. }
            | Self::InvalidNumber { span, .. }
            | Self::InvalidEscape { span, .. }
            | Self::UnknownSpecial { span, .. }
            | Self::InvalidType { span, .. } => *span,
        }
    }

    /// Converts the error into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Self::UnexpectedToken { .. } => error_code!(E1001),
            Self::UnterminatedString { .. } => error_code!(E1002),
            Self::UnterminatedComment { .. } => error_code!(E1003),
            Self::UnknownCharacter { .. } => error_code!(E1004),
            Self::InvalidNumber { .. } => error_code!(E1005),
            Self::InvalidEscape { .. } => error_code!(E1006),
            Self::UnknownSpecial { .. } => error_code!(E1007),
            Self::InvalidType { .. } => error_code!(E1008),
        };
        Diagnostic::error(code, self.to_string()).span(self.span())
    }
}

impl From<ParseError> for Diagnostics {
    fn from(err: ParseError) -> Self {
        err.to_diagnostic().into()
    }
}

fn format_expected(expected: &[String]) -> String {
    match expected {
        [] => "something else".into(),
        [one] => one.clone(),
        [init @ .., last] => format!("one of {}, or {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_message() {
        let err = ParseError::UnexpectedToken {
            found: "`}`".into(),
            expected: vec!["`;`".into(), "`=`".into()],
            span: Span::new(3, 4),
        };
        assert_eq!(err.to_string(), "expected one of `;`, or `=`, found `}`");
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.to_string(), "E1001");
        assert_eq!(diag.span, Some(Span::new(3, 4)));
    }
}
