//! IR values.

use super::TempId;
use alloy_primitives::U256;
use bugc_interface::Span;
use bugc_sema::Type;
use std::fmt;

/// Ties a value or instruction back to the program construct it came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DebugContext {
    /// The source-level variable name, if any.
    pub name: Option<String>,
    pub span: Span,
}

impl DebugContext {
    /// Creates a context pointing at `span`.
    pub fn new(span: Span) -> Self {
        Self { name: None, span }
    }

    /// Creates a context for the named variable.
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        Self { name: Some(name.into()), span }
    }
}

/// A compile-time constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    /// An integer, two's complement for negative values.
    Int(U256),
    /// A string literal.
    Str(String),
    Bool(bool),
}

impl Constant {
    /// Returns the constant as a single EVM word.
    ///
    /// Strings are left-aligned like `bytesN`; `None` if longer than 32 bytes.
    pub fn to_word(&self) -> Option<U256> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Bool(b) => Some(U256::from(*b as u8)),
            Self::Str(s) => {
                let bytes = s.as_bytes();
                if bytes.len() > 32 {
                    return None;
                }
                let mut word = [0u8; 32];
                word[..bytes.len()].copy_from_slice(bytes);
                Some(U256::from_be_bytes(word))
            }
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// An operand: either a constant or an SSA temporary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Const { value: Constant, ty: Type, debug: Option<DebugContext> },
    Temp { id: TempId, ty: Type, debug: Option<DebugContext> },
}

/// The identity of a value, ignoring types and debug information.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Const(Constant),
    Temp(TempId),
}

impl Value {
    /// Creates an integer constant.
    pub fn int(value: U256, ty: Type) -> Self {
        Self::Const { value: Constant::Int(value), ty, debug: None }
    }

    /// Creates a `uint256` constant.
    pub fn uint(value: u64) -> Self {
        Self::int(U256::from(value), Type::UINT256)
    }

    /// Creates a boolean constant.
    pub fn bool(b: bool) -> Self {
        Self::Const { value: Constant::Bool(b), ty: Type::Bool, debug: None }
    }

    /// Creates a temporary reference.
    pub fn temp(id: TempId, ty: Type) -> Self {
        Self::Temp { id, ty, debug: None }
    }

    /// Attaches a debug context.
    #[must_use]
    pub fn with_debug(mut self, context: DebugContext) -> Self {
        match &mut self {
            Self::Const { debug, .. } | Self::Temp { debug, .. } => *debug = Some(context),
        }
        self
    }

    /// Replaces the type of the value.
    #[must_use]
    pub fn with_type(mut self, new_ty: Type) -> Self {
        match &mut self {
            Self::Const { ty, .. } | Self::Temp { ty, .. } => *ty = new_ty,
        }
        self
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        match self {
            Self::Const { ty, .. } | Self::Temp { ty, .. } => ty,
        }
    }

    #[inline]
    pub fn debug(&self) -> Option<&DebugContext> {
        match self {
            Self::Const { debug, .. } | Self::Temp { debug, .. } => debug.as_ref(),
        }
    }

    /// Returns the temporary ID if this is a temporary.
    #[inline]
    pub fn as_temp(&self) -> Option<TempId> {
        match self {
            Self::Temp { id, .. } => Some(*id),
            Self::Const { .. } => None,
        }
    }

    /// Returns the constant if this is a constant.
    #[inline]
    pub fn as_const(&self) -> Option<&Constant> {
        match self {
            Self::Const { value, .. } => Some(value),
            Self::Temp { .. } => None,
        }
    }

    /// Returns the constant word if this is a word-sized constant.
    pub fn as_word(&self) -> Option<U256> {
        self.as_const().and_then(Constant::to_word)
    }

    /// Returns the identity of the value.
    pub fn key(&self) -> ValueKey {
        match self {
            Self::Const { value, .. } => ValueKey::Const(value.clone()),
            Self::Temp { id, .. } => ValueKey::Temp(*id),
        }
    }

    /// Returns `true` if both values denote the same constant or temporary.
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Temp { id: a, .. }, Self::Temp { id: b, .. }) => a == b,
            (Self::Const { value: a, .. }, Self::Const { value: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const { value, .. } => value.fmt(f),
            Self::Temp { id, .. } => id.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_words() {
        assert_eq!(Constant::Bool(true).to_word(), Some(U256::from(1)));
        assert_eq!(Constant::Int(U256::from(7)).to_word(), Some(U256::from(7)));
        let word = Constant::Str("ab".into()).to_word().unwrap();
        assert_eq!(word.to_be_bytes::<32>()[..3], [b'a', b'b', 0]);
        assert_eq!(Constant::Str("x".repeat(33)).to_word(), None);
    }

    #[test]
    fn test_value_identity() {
        let t = TempId::new(3);
        let a = Value::temp(t, Type::UINT256);
        let b = Value::temp(t, Type::Uint(8)).with_debug(DebugContext::named("x", Span::DUMMY));
        assert!(a.same(&b));
        assert_eq!(a.key(), b.key());
        assert!(!a.same(&Value::uint(3)));
        assert_eq!(b.debug().and_then(|d| d.name.as_deref()), Some("x"));
        assert_eq!(a.to_string(), "t3");
        assert_eq!(Value::bool(false).to_string(), "false");
    }
}
