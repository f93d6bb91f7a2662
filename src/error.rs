//! Parse and navigation errors.
//!
//! Every fallible operation in the crate returns `Result<T, Error>`; there is
//! no separate success code. Errors reported by a [`crate::Parser`] are
//! sticky: the parser stays invalid until the next successful parse.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors raised while parsing or navigating a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Error {
    /// The input is larger than the parser's allocated capacity.
    Capacity,
    /// A buffer allocation failed.
    MemAlloc,
    /// JSON grammar violation: misplaced token, bracket mismatch, or trailing
    /// content after the root value.
    TapeError,
    /// Object/array nesting exceeds the configured maximum depth.
    DepthError,
    /// Invalid escape sequence or unpaired surrogate in a string.
    StringError,
    /// A token starting with `t` is not the literal `true`.
    TrueAtomError,
    /// A token starting with `f` is not the literal `false`.
    FalseAtomError,
    /// A token starting with `n` is not the literal `null`.
    NullAtomError,
    /// Malformed number: bad grammar, leading zeros, or integer overflow.
    NumberError,
    /// The input contains an invalid UTF-8 sequence.
    Utf8Error,
    /// A typed accessor was called on an element of a different type.
    UnexpectedType,
    /// An integer does not fit the requested width or sign.
    NumberOutOfRange,
    /// Object lookup found no field with the given key.
    NoSuchField,
    /// The parser has not produced a document yet.
    Uninitialized,
    /// The input is empty or contains only whitespace.
    Empty,
    /// A string contains an unescaped control character.
    UnescapedChars,
    /// A string is missing its closing quote.
    UnclosedString,
}

impl Error {
    /// A short human-readable description of the error.
    pub fn message(&self) -> &'static str {
        match self {
            Error::Capacity => "document exceeds the parser's capacity",
            Error::MemAlloc => "memory allocation failed",
            Error::TapeError => "the JSON document has an improper structure",
            Error::DepthError => "nesting exceeds the maximum depth",
            Error::StringError => "invalid escape sequence or unpaired surrogate in a string",
            Error::TrueAtomError => "malformed 'true' literal",
            Error::FalseAtomError => "malformed 'false' literal",
            Error::NullAtomError => "malformed 'null' literal",
            Error::NumberError => "malformed number",
            Error::Utf8Error => "the input is not valid UTF-8",
            Error::UnexpectedType => "the element does not have the requested type",
            Error::NumberOutOfRange => "integer value out of range for the requested type",
            Error::NoSuchField => "no field with the given key",
            Error::Uninitialized => "no document has been parsed yet",
            Error::Empty => "empty input",
            Error::UnescapedChars => "unescaped control character in a string",
            Error::UnclosedString => "string is missing its closing quote",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_message() {
        let err = Error::UnclosedString;
        assert_eq!(err.to_string(), err.message());
        assert_eq!(Error::Empty.to_string(), "empty input");
    }
}
