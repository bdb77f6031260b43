use super::Ident;
use bugc_interface::Span;
use std::fmt;

/// A type name as written in the source.
#[derive(Clone, Debug)]
pub struct TypeExpr {
    pub span: Span,
    pub kind: TypeKind,
}

/// The kind of a type name.
#[derive(Clone, Debug)]
pub enum TypeKind {
    /// An elementary type: `uint256`, `address`.
    Elementary(ElementaryType),
    /// `array<T>` or `array<T, N>`.
    Array(Box<TypeExpr>, Option<u64>),
    /// `mapping<K, V>`.
    Mapping(Box<TypeExpr>, Box<TypeExpr>),
    /// A struct name.
    Custom(Ident),
}

/// Elementary types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementaryType {
    /// `address`
    Address,
    /// `bool`
    Bool,
    /// `string`
    String,
    /// `bytes`
    Bytes,
    /// `bytesN`
    FixedBytes(u8),
    /// `intN`
    Int(u16),
    /// `uintN`
    UInt(u16),
}

impl ElementaryType {
    /// Parses an elementary type name such as `uint64` or `bytes32`.
    ///
    /// Integer widths must be multiples of 8 in `8..=256`; fixed bytes lengths must be in `1..=32`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "address" => return Some(Self::Address),
            "bool" => return Some(Self::Bool),
            "string" => return Some(Self::String),
            "bytes" => return Some(Self::Bytes),
            _ => {}
        }
        let int_bits = |digits: &str| -> Option<u16> {
            if digits.is_empty() {
                return Some(256);
            }
            if digits.starts_with('0') {
                return None;
            }
            let bits = digits.parse::<u16>().ok()?;
            (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(bits)
        };
        if let Some(digits) = s.strip_prefix("uint") {
            return int_bits(digits).map(Self::UInt);
        }
        if let Some(digits) = s.strip_prefix("int") {
            return int_bits(digits).map(Self::Int);
        }
        if let Some(digits) = s.strip_prefix("bytes") {
            if digits.starts_with('0') {
                return None;
            }
            let n = digits.parse::<u8>().ok()?;
            return (1..=32).contains(&n).then_some(Self::FixedBytes(n));
        }
        None
    }
}

impl fmt::Display for ElementaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::FixedBytes(n) => write!(f, "bytes{n}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::UInt(bits) => write!(f, "uint{bits}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elementary() {
        assert_eq!(ElementaryType::parse("uint256"), Some(ElementaryType::UInt(256)));
        assert_eq!(ElementaryType::parse("uint"), Some(ElementaryType::UInt(256)));
        assert_eq!(ElementaryType::parse("int8"), Some(ElementaryType::Int(8)));
        assert_eq!(ElementaryType::parse("bytes32"), Some(ElementaryType::FixedBytes(32)));
        assert_eq!(ElementaryType::parse("bytes"), Some(ElementaryType::Bytes));
        assert_eq!(ElementaryType::parse("address"), Some(ElementaryType::Address));
        assert_eq!(ElementaryType::parse("uint7"), None);
        assert_eq!(ElementaryType::parse("uint264"), None);
        assert_eq!(ElementaryType::parse("uint08"), None);
        assert_eq!(ElementaryType::parse("bytes33"), None);
        assert_eq!(ElementaryType::parse("foo"), None);
    }

    #[test]
    fn test_display_roundtrip() {
        for name in ["uint8", "int128", "bytes4", "bool", "address", "string"] {
            assert_eq!(ElementaryType::parse(name).unwrap().to_string(), name);
        }
    }
}
