//! Semantic types.

use alloy_primitives::U256;
use bugc_ast::ElementaryType;
use std::fmt;

/// Number of bytes in an EVM word.
pub const WORD_SIZE: u64 = 32;

/// A resolved BUG type.
///
/// Equality is structural: two struct types are equal when their names and fields are.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// `uintN`.
    Uint(u16),
    /// `intN`.
    Int(u16),
    /// `bool`.
    Bool,
    /// `address`.
    Address,
    /// `bytesN`.
    FixedBytes(u8),
    /// `bytes`.
    Bytes,
    /// `string`.
    String,
    /// `array<T>` or `array<T, N>`.
    Array { element: Box<Type>, size: Option<u64> },
    /// A user-defined struct.
    Struct(StructType),
    /// `mapping<K, V>`.
    Mapping { key: Box<Type>, value: Box<Type> },
}

/// A struct type with its fields in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<(String, Type)>,
}

impl StructType {
    /// Returns the slot offset and type of the named field.
    pub fn field(&self, name: &str) -> Option<(u64, &Type)> {
        let mut offset = 0u64;
        for (field, ty) in &self.fields {
            if field == name {
                return Some((offset, ty));
            }
            offset = offset.saturating_add(ty.storage_slots());
        }
        None
    }
}

impl Type {
    /// `uint256`.
    pub const UINT256: Self = Self::Uint(256);
    /// `int256`.
    pub const INT256: Self = Self::Int(256);
    /// `bytes32`.
    pub const BYTES32: Self = Self::FixedBytes(32);

    /// Converts a parsed elementary type.
    pub fn from_elementary(ty: ElementaryType) -> Self {
        match ty {
            ElementaryType::Address => Self::Address,
            ElementaryType::Bool => Self::Bool,
            ElementaryType::String => Self::String,
            ElementaryType::Bytes => Self::Bytes,
            ElementaryType::FixedBytes(n) => Self::FixedBytes(n),
            ElementaryType::Int(bits) => Self::Int(bits),
            ElementaryType::UInt(bits) => Self::Uint(bits),
        }
    }

    /// Returns `true` for signed and unsigned integer types.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Uint(_) | Self::Int(_))
    }

    /// Returns `true` for signed integer types.
    #[inline]
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Returns the bit width of an integer type.
    #[inline]
    pub fn bits(&self) -> Option<u16> {
        match self {
            Self::Uint(bits) | Self::Int(bits) => Some(*bits),
            _ => None,
        }
    }

    /// Returns `true` if values of this type fit in a single stack word.
    pub fn is_word(&self) -> bool {
        matches!(
            self,
            Self::Uint(_) | Self::Int(_) | Self::Bool | Self::Address | Self::FixedBytes(_)
        )
    }

    /// Returns `true` for dynamically sized types.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Bytes | Self::String | Self::Array { size: None, .. })
    }

    /// Returns `true` if the type can only be accessed by reference into storage or memory.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Array { .. } | Self::Struct(_) | Self::Mapping { .. })
    }

    /// Returns the number of 32-byte storage slots occupied by a value of this type.
    pub fn storage_slots(&self) -> u64 {
        match self {
            Self::Struct(s) => {
                s.fields.iter().fold(0u64, |acc, (_, ty)| acc.saturating_add(ty.storage_slots()))
            }
            Self::Array { element, size: Some(size) } => {
                size.saturating_mul(element.storage_slots())
            }
            _ => 1,
        }
    }

    /// Returns the number of bytes a fixed-size value of this type occupies in memory.
    pub fn memory_size(&self) -> u64 {
        self.storage_slots().saturating_mul(WORD_SIZE)
    }

    /// Returns `true` if a value of type `source` may be stored into a location of type `self`.
    ///
    /// Integers widen implicitly within the same signedness; everything else requires equality.
    pub fn is_assignable(&self, source: &Self) -> bool {
        match (self, source) {
            (Self::Uint(target), Self::Uint(source)) | (Self::Int(target), Self::Int(source)) => {
                target >= source
            }
            _ => self == source,
        }
    }

    /// Returns the common type of two operands, that is the wider of two integer types of the
    /// same signedness.
    pub fn common_type(a: &Self, b: &Self) -> Option<Self> {
        match (a, b) {
            (Self::Uint(x), Self::Uint(y)) => Some(Self::Uint(*x.max(y))),
            (Self::Int(x), Self::Int(y)) => Some(Self::Int(*x.max(y))),
            _ => None,
        }
    }

    /// Returns `true` if the non-negative literal `value` is representable in this type.
    pub fn fits(&self, value: U256) -> bool {
        match *self {
            Self::Uint(bits) => value.bit_len() <= bits as usize,
            Self::Int(bits) => value.bit_len() < bits as usize,
            _ => false,
        }
    }

    /// Returns `true` if the negated literal `-value` is representable in this type.
    pub fn fits_negated(&self, value: U256) -> bool {
        match *self {
            Self::Int(bits) => value <= U256::from(1u8) << (bits as usize - 1),
            _ => false,
        }
    }

    /// Returns `true` if an explicit `as` conversion from `self` to `to` is allowed.
    pub fn can_cast_to(&self, to: &Self) -> bool {
        let castable = |ty: &Self| ty.is_word();
        castable(self) && castable(to)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Bool => f.write_str("bool"),
            Self::Address => f.write_str("address"),
            Self::FixedBytes(n) => write!(f, "bytes{n}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::Array { element, size: Some(size) } => write!(f, "array<{element}, {size}>"),
            Self::Array { element, size: None } => write!(f, "array<{element}>"),
            Self::Struct(s) => f.write_str(&s.name),
            Self::Mapping { key, value } => write!(f, "mapping<{key}, {value}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn user() -> Type {
        Type::Struct(StructType {
            name: "User".into(),
            fields: vec![
                ("id".into(), Type::UINT256),
                ("scores".into(), Type::Array { element: Box::new(Type::Bool), size: Some(3) }),
                ("owner".into(), Type::Address),
            ],
        })
    }

    #[test]
    fn test_storage_slots() {
        assert_eq!(Type::UINT256.storage_slots(), 1);
        assert_eq!(Type::Bytes.storage_slots(), 1);
        assert_eq!(Type::Array { element: Box::new(Type::Bool), size: None }.storage_slots(), 1);
        assert_eq!(user().storage_slots(), 5);
        let users = Type::Array { element: Box::new(user()), size: Some(4) };
        assert_eq!(users.storage_slots(), 20);
        assert_eq!(users.memory_size(), 640);
    }

    #[test]
    fn test_field_offsets() {
        let Type::Struct(s) = user() else { unreachable!() };
        assert_eq!(s.field("id"), Some((0, &Type::UINT256)));
        assert_eq!(s.field("owner"), Some((4, &Type::Address)));
        assert_eq!(s.field("missing"), None);
    }

    #[test]
    fn test_assignability() {
        assert!(Type::UINT256.is_assignable(&Type::Uint(8)));
        assert!(!Type::Uint(8).is_assignable(&Type::UINT256));
        assert!(!Type::INT256.is_assignable(&Type::Uint(8)));
        assert!(Type::Address.is_assignable(&Type::Address));
        assert!(!Type::Address.is_assignable(&Type::Uint(160)));
        assert!(user().is_assignable(&user()));
    }

    #[test]
    fn test_common_type() {
        assert_eq!(Type::common_type(&Type::Uint(8), &Type::Uint(64)), Some(Type::Uint(64)));
        assert_eq!(Type::common_type(&Type::Int(128), &Type::Int(16)), Some(Type::Int(128)));
        assert_eq!(Type::common_type(&Type::Int(8), &Type::Uint(8)), None);
        assert_eq!(Type::common_type(&Type::Bool, &Type::Bool), None);
    }

    #[test]
    fn test_literal_fits() {
        assert!(Type::Uint(8).fits(U256::from(255)));
        assert!(!Type::Uint(8).fits(U256::from(256)));
        assert!(Type::Int(8).fits(U256::from(127)));
        assert!(!Type::Int(8).fits(U256::from(128)));
        assert!(Type::Int(8).fits_negated(U256::from(128)));
        assert!(!Type::Int(8).fits_negated(U256::from(129)));
        assert!(Type::UINT256.fits(U256::MAX));
    }

    #[test]
    fn test_display() {
        let ty = Type::Mapping {
            key: Box::new(Type::Address),
            value: Box::new(Type::Array { element: Box::new(Type::Uint(8)), size: Some(2) }),
        };
        assert_eq!(ty.to_string(), "mapping<address, array<uint8, 2>>");
        assert_eq!(user().to_string(), "User");
    }

    fn int_type() -> impl Strategy<Value = Type> {
        (any::<bool>(), 1u16..=32).prop_map(|(signed, bytes)| {
            if signed { Type::Int(bytes * 8) } else { Type::Uint(bytes * 8) }
        })
    }

    proptest! {
        #[test]
        fn assignability_is_reflexive(ty in int_type()) {
            prop_assert!(ty.is_assignable(&ty));
        }

        #[test]
        fn assignability_is_transitive(a in int_type(), b in int_type(), c in int_type()) {
            if a.is_assignable(&b) && b.is_assignable(&c) {
                prop_assert!(a.is_assignable(&c));
            }
        }

        #[test]
        fn common_type_accepts_both(a in int_type(), b in int_type()) {
            if let Some(common) = Type::common_type(&a, &b) {
                prop_assert!(common.is_assignable(&a));
                prop_assert!(common.is_assignable(&b));
                prop_assert!(common == a || common == b);
            } else {
                prop_assert_ne!(a.is_signed(), b.is_signed());
            }
        }
    }
}
