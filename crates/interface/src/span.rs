use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Deref, DerefMut, Range},
};

/// A source code location.
///
/// A `lo..hi` byte range into the compiled source text. Spans are attached to AST nodes, IR values
/// and instructions so that generated code can be mapped back to the program text. They are never
/// mutated after creation.
///
/// Serializes as `{ "offset": lo, "length": hi - lo }`.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    lo: u32,
    hi: u32,
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.lo, self.hi)
    }
}

impl Span {
    /// A dummy span.
    pub const DUMMY: Self = Self { lo: 0, hi: 0 };

    /// Creates a new span from two byte positions.
    #[inline]
    pub const fn new(lo: u32, hi: u32) -> Self {
        if lo > hi { Self { lo: hi, hi: lo } } else { Self { lo, hi } }
    }

    /// Creates a new span from an offset and a length.
    #[inline]
    pub const fn from_offset(offset: u32, length: u32) -> Self {
        Self { lo: offset, hi: offset + length }
    }

    /// Returns the start of the span.
    #[inline]
    pub const fn lo(self) -> u32 {
        self.lo
    }

    /// Returns the end of the span.
    #[inline]
    pub const fn hi(self) -> u32 {
        self.hi
    }

    /// Returns the byte offset of the span.
    #[inline]
    pub const fn offset(self) -> u32 {
        self.lo
    }

    /// Returns the length of the span in bytes.
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(self) -> u32 {
        self.hi - self.lo
    }

    /// Returns `true` if this is a dummy span.
    #[inline]
    pub const fn is_dummy(self) -> bool {
        self.lo == 0 && self.hi == 0
    }

    /// Returns the span as a `Range<usize>`, suitable for indexing into the source text.
    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.lo as usize..self.hi as usize
    }

    /// Returns a new span representing just the start of this span.
    #[inline]
    pub const fn shrink_to_lo(self) -> Self {
        Self { lo: self.lo, hi: self.lo }
    }

    /// Returns a new span representing just the end of this span.
    #[inline]
    pub const fn shrink_to_hi(self) -> Self {
        Self { lo: self.hi, hi: self.hi }
    }

    /// Returns a new span that encloses both `self` and `end`.
    ///
    /// ```text
    ///     ____             ___
    ///     self lorem ipsum end
    ///     ^^^^^^^^^^^^^^^^^^^^
    /// ```
    #[inline]
    pub fn to(self, end: Self) -> Self {
        Self::new(self.lo.min(end.lo), self.hi.max(end.hi))
    }

    /// Returns a new span from the start of `self` to the start of `end`.
    #[inline]
    pub fn until(self, end: Self) -> Self {
        Self::new(self.lo, end.lo)
    }
}

#[derive(Serialize, Deserialize)]
struct SpanRepr {
    offset: u32,
    length: u32,
}

impl Serialize for Span {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SpanRepr { offset: self.offset(), length: self.len() }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let SpanRepr { offset, length } = SpanRepr::deserialize(deserializer)?;
        offset
            .checked_add(length)
            .map(|hi| Self::new(offset, hi))
            .ok_or_else(|| serde::de::Error::custom("span end overflows"))
    }
}

/// A value paired with a span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Spanned<T> {
    pub span: Span,
    pub data: T,
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for Spanned<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<T> Spanned<T> {
    /// Creates a new spanned value.
    pub const fn new(span: Span, data: T) -> Self {
        Self { span, data }
    }

    /// Maps the inner value, keeping the span.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned { span: self.span, data: f(self.data) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_ops() {
        let a = Span::new(4, 10);
        let b = Span::new(12, 20);
        assert_eq!(a.offset(), 4);
        assert_eq!(a.len(), 6);
        assert_eq!(a.to(b), Span::new(4, 20));
        assert_eq!(a.until(b), Span::new(4, 12));
        assert_eq!(Span::new(10, 4), a);
        assert_eq!(a.shrink_to_hi(), Span::from_offset(10, 0));
        assert!(Span::DUMMY.is_dummy());
        assert_eq!(&"0123456789abc"[a.to_range()], "456789");
    }

    #[test]
    fn test_span_json() {
        let span = Span::from_offset(3, 5);
        let json = serde_json::to_string(&span).unwrap();
        assert_eq!(json, r#"{"offset":3,"length":5}"#);
        assert_eq!(serde_json::from_str::<Span>(&json).unwrap(), span);
    }
}
