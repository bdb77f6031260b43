//! Index types.

use std::fmt;

pub use index_vec::*;

/// A `u32` index that reserves zero so `Option<Index>` stays four bytes wide.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BaseIndex32 {
    value: std::num::NonZeroU32,
}

impl fmt::Display for BaseIndex32 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}

impl fmt::Debug for BaseIndex32 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}

impl Idx for BaseIndex32 {
    #[inline]
    fn from_usize(value: usize) -> Self {
        assert!(value <= Self::MAX_AS as usize);
        Self::new(value as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.get() as usize
    }
}

impl BaseIndex32 {
    /// The maximum raw index value.
    pub const MAX_AS: u32 = 0xFFFF_FF00;

    /// The maximum index value.
    pub const MAX: Self = Self::new(Self::MAX_AS);

    /// Creates a new index from the given `value`.
    ///
    /// # Panics
    ///
    /// Panics if `value` exceeds `MAX`.
    #[inline]
    pub const fn new(value: u32) -> Self {
        assert!(value <= Self::MAX_AS);
        match std::num::NonZeroU32::new(value + 1) {
            Some(value) => Self { value },
            None => panic!("index overflowed"),
        }
    }

    /// Gets the underlying index value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.value.get() - 1
    }
}

/// Declares one or more index newtypes backed by [`BaseIndex32`].
///
/// The literal is the prefix used when formatting the index, e.g. `t3` or `bb0`.
///
/// ```
/// bugc_data_structures::newtype_index! {
///     /// A temporary.
///     pub struct TempId("t");
/// }
///
/// let id = TempId::new(3);
/// assert_eq!(id.to_string(), "t3");
/// ```
#[macro_export]
macro_rules! newtype_index {
    ($($(#[$attr:meta])* $vis:vis struct $name:ident($prefix:literal);)*) => {$(
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name($crate::index::BaseIndex32);

        impl $name {
            /// The maximum index value.
            pub const MAX: Self = Self($crate::index::BaseIndex32::MAX);

            /// Creates a new index from the given `value`.
            #[inline]
            pub const fn new(value: usize) -> Self {
                Self($crate::index::BaseIndex32::new(value as u32))
            }

            /// Gets the underlying index value.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0.get()
            }

            /// Gets the underlying index value as a `usize`.
            #[inline]
            pub const fn index(self) -> usize {
                self.0.get() as usize
            }
        }

        impl $crate::index::Idx for $name {
            #[inline]
            fn from_usize(value: usize) -> Self {
                Self($crate::index::Idx::from_usize(value))
            }

            #[inline]
            fn index(self) -> usize {
                $crate::index::Idx::index(self.0)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.get())
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(self, f)
            }
        }
    )*};
}

#[cfg(test)]
mod tests {
    use super::*;

    newtype_index! {
        struct TestId("x");
    }

    #[test]
    fn test_base_index_roundtrip() {
        let idx = BaseIndex32::new(7);
        assert_eq!(idx.get(), 7);
        assert_eq!(std::mem::size_of::<Option<BaseIndex32>>(), 4);
    }

    #[test]
    fn test_newtype_index() {
        let id = TestId::new(12);
        assert_eq!(id.index(), 12);
        assert_eq!(id.to_string(), "x12");
        assert_eq!(format!("{id:?}"), "x12");

        let mut v: IndexVec<TestId, &str> = IndexVec::new();
        let a = v.push("a");
        let b = v.push("b");
        assert_eq!(a, TestId::new(0));
        assert_eq!(v[b], "b");
    }

    #[test]
    #[should_panic]
    fn test_overflow() {
        let _ = BaseIndex32::new(u32::MAX);
    }
}
