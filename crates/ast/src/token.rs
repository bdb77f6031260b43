//! BUG source code token.

use bugc_interface::Span;
use std::fmt;

/// A delimiter token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// `( ... )`
    Parenthesis,
    /// `{ ... }`
    Brace,
    /// `[ ... ]`
    Bracket,
}

impl Delimiter {
    /// Returns the string representation of the opening delimiter.
    pub const fn to_open_str(self) -> &'static str {
        match self {
            Self::Parenthesis => "(",
            Self::Brace => "{",
            Self::Bracket => "[",
        }
    }

    /// Returns the string representation of the closing delimiter.
    pub const fn to_close_str(self) -> &'static str {
        match self {
            Self::Parenthesis => ")",
            Self::Brace => "}",
            Self::Bracket => "]",
        }
    }
}

/// A **bin**ary **op**eration token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOpToken {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
}

impl BinOpToken {
    /// Returns the string representation of the binary operator token.
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
        }
    }
}

/// A reserved word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Name,
    Define,
    Storage,
    Create,
    Code,
    Struct,
    Function,
    Let,
    If,
    Else,
    For,
    While,
    Return,
    Break,
    Continue,
    As,
    True,
    False,
    Msg,
    Block,
    #[strum(serialize = "keccak256")]
    Keccak256,
    Array,
    Mapping,
}

impl Keyword {
    /// Returns the keyword spelled by `s`, if any.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Returns the source spelling of the keyword.
    pub fn to_str(self) -> &'static str {
        self.into()
    }
}

/// A literal token kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LitKind {
    /// A decimal integer: `42`.
    Integer,
    /// A `0x`-prefixed hexadecimal integer: `0x2a`. Exactly 40 digits make an address.
    HexInteger,
    /// A double-quoted string: `"foo"`.
    Str,
}

/// The kind of a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Not,
    /// A binary operator.
    BinOp(BinOpToken),

    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `:`
    Colon,
    /// `->`
    Arrow,

    /// An opening delimiter.
    OpenDelim(Delimiter),
    /// A closing delimiter.
    CloseDelim(Delimiter),

    /// A literal, with its unescaped text. Hex integers keep their `0x` prefix.
    Literal(LitKind, String),
    /// An identifier.
    Ident(String),
    /// A reserved word.
    Keyword(Keyword),

    /// End of file.
    Eof,
}

impl TokenKind {
    /// Returns a description of the token for use in diagnostics.
    pub fn description(&self) -> String {
        match self {
            Self::Literal(LitKind::Str, s) => format!("\"{s}\""),
            Self::Literal(_, s) | Self::Ident(s) => format!("`{s}`"),
            Self::Keyword(kw) => format!("`{}`", kw.to_str()),
            Self::Eof => "end of file".into(),
            _ => format!("`{self}`"),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Not => "!",
            Self::BinOp(op) => op.to_str(),
            Self::Dot => ".",
            Self::Comma => ",",
            Self::Semi => ";",
            Self::Colon => ":",
            Self::Arrow => "->",
            Self::OpenDelim(d) => d.to_open_str(),
            Self::CloseDelim(d) => d.to_close_str(),
            Self::Literal(_, s) | Self::Ident(s) => s,
            Self::Keyword(kw) => kw.to_str(),
            Self::Eof => "<eof>",
        };
        f.write_str(s)
    }
}

/// A single token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// The [EOF](TokenKind::Eof) token.
    pub const EOF: Self = Self { kind: TokenKind::Eof, span: Span::DUMMY };

    /// Creates a new token.
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns `true` if the token is the given keyword.
    #[inline]
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    /// Returns `true` if the token is end of file.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(Keyword::from_str_opt("storage"), Some(Keyword::Storage));
        assert_eq!(Keyword::from_str_opt("keccak256"), Some(Keyword::Keccak256));
        assert_eq!(Keyword::from_str_opt("uint256"), None);
        assert_eq!(Keyword::Continue.to_str(), "continue");
    }

    #[test]
    fn test_description() {
        assert_eq!(TokenKind::Semi.description(), "`;`");
        assert_eq!(TokenKind::Ident("x".into()).description(), "`x`");
        assert_eq!(TokenKind::Eof.description(), "end of file");
    }
}
