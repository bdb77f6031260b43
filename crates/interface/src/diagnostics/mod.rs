//! Diagnostics implementation.
//!
//! Every compiler stage reports failures as a typed error that converts into a [`Diagnostic`].
//! A stage that cannot complete hands back a non-empty [`Diagnostics`] collection, which may also
//! carry the warnings gathered so far.

use crate::Span;
use serde::{Serialize, Serializer, ser::SerializeStruct};
use std::fmt;

/// Diagnostic ID.
///
/// Use [`error_code!`](crate::error_code) to create a diagnostic ID.
///
/// # Examples
///
/// ```
/// # use bugc_interface::error_code;
/// assert_eq!(error_code!(E1234).id(), 1234);
/// assert_eq!(error_code!(W2001).to_string(), "W2001");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiagnosticId {
    /// `b'E'` or `b'W'`.
    prefix: u8,
    /// The ID of the diagnostic.
    id: u32,
}

impl DiagnosticId {
    /// Creates a diagnostic ID.
    ///
    /// Use [`error_code!`](crate::error_code) instead.
    #[doc(hidden)]
    #[track_caller]
    pub const fn new_from_macro(s: &'static str) -> Self {
        let [prefix @ (b'E' | b'W'), bytes @ ..] = s.as_bytes() else {
            panic!("diagnostic codes must start with 'E' or 'W'")
        };
        assert!(bytes.len() == 4, "diagnostic codes must be exactly 4 digits long");

        let mut bytes = bytes;
        let mut id = 0;
        while let &[byte, ref rest @ ..] = bytes {
            assert!(byte.is_ascii_digit(), "diagnostic codes must be decimal");
            id = id * 10 + (byte - b'0') as u32;
            bytes = rest;
        }
        Self { prefix: *prefix, id }
    }

    /// Returns the numeric ID.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns `true` if this is the internal compiler error code.
    #[inline]
    pub const fn is_internal(&self) -> bool {
        self.prefix == b'E' && self.id == INTERNAL_ERROR.id
    }
}

impl fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.prefix as char, self.id)
    }
}

impl Serialize for DiagnosticId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Used for creating a diagnostic code.
#[macro_export]
macro_rules! error_code {
    ($id:ident) => {{
        const $id: $crate::diagnostics::DiagnosticId =
            $crate::diagnostics::DiagnosticId::new_from_macro(stringify!($id));
        $id
    }};
}

/// The code shared by all internal compiler errors, regardless of the stage that raised them.
pub const INTERNAL_ERROR: DiagnosticId = error_code!(E9000);

/// Diagnostic level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// An error in the code being compiled, which prevents compilation from finishing.
    Error,
    /// A warning about the code being compiled. Does not prevent compilation from finishing.
    Warning,
}

impl Level {
    /// Returns the string representation of the level.
    pub fn to_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }

    /// Returns whether this level is an error.
    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A single compiler message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticId,
    pub message: String,
    pub span: Option<Span>,
    pub level: Level,
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticId, message: impl Into<String>) -> Self {
        Self::new(Level::Error, code, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticId, message: impl Into<String>) -> Self {
        Self::new(Level::Warning, code, message)
    }

    /// Creates an internal compiler error.
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::error(INTERNAL_ERROR, format!("internal compiler error: {message}"))
    }

    fn new(level: Level, code: DiagnosticId, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), span: None, level, notes: Vec::new() }
    }

    /// Sets the primary span.
    #[must_use]
    pub fn span(mut self, span: impl Into<Option<Span>>) -> Self {
        self.span = span.into().filter(|span| !span.is_dummy());
        self
    }

    /// Adds a note.
    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Returns `true` if this diagnostic is an error.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.level.is_error()
    }

    /// Returns `true` if this diagnostic is an internal compiler error.
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.code.is_internal()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.level, self.code, self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {}..{}", span.lo(), span.hi())?;
        }
        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }
        Ok(())
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 3 + self.span.is_some() as usize;
        let mut s = serializer.serialize_struct("Diagnostic", len)?;
        s.serialize_field("code", &self.code)?;
        s.serialize_field("message", &self.message)?;
        if let Some(span) = &self.span {
            s.serialize_field("location", span)?;
        } else {
            s.skip_field("location")?;
        }
        s.serialize_field("severity", &self.level)?;
        s.end()
    }
}

/// An ordered collection of diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    pub const fn new() -> Self {
        Self { diagnostics: Vec::new() }
    }

    /// Adds a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Appends all diagnostics from `other`.
    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }

    /// Returns `true` if the collection contains at least one error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Returns the number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` if there are no diagnostics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterates over all diagnostics.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Iterates over the errors.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| d.is_error())
    }

    /// Iterates over the warnings.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| !d.is_error())
    }

    /// Returns the first error, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.errors().next()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self { diagnostics: vec![diagnostic] }
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl From<std::convert::Infallible> for Diagnostics {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self { diagnostics: iter.into_iter().collect() }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}
