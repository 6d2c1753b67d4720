// SPDX-License-Identifier: Apache-2.0

use crate::unicode::UnicodeError;

/// Errors surfaced while turning bytes into a value tree. Positions count
/// decoded code points from the start of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The active allocator could not hold the next node.
    OutOfMemory,
    /// The input byte stream is not valid in the configured encoding.
    InvalidUnicode(UnicodeError),
    /// A code point the grammar does not allow here.
    UnexpectedCharacter { character: char, position: usize },
    /// An unknown character after a backslash in a string.
    InvalidEscape { character: char, position: usize },
    /// A number the grammar accepted but the number parser did not.
    InvalidNumber { position: usize },
    /// The stream ended inside a value or before any value.
    UnexpectedEndOfInput,
    /// A second top-level value after the document was complete.
    TrailingInput { position: usize },
}

impl From<UnicodeError> for ParseError {
    fn from(err: UnicodeError) -> Self {
        ParseError::InvalidUnicode(err)
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParseError::OutOfMemory => f.write_str("allocator exhausted"),
            ParseError::InvalidUnicode(err) => write!(f, "invalid input encoding: {err}"),
            ParseError::UnexpectedCharacter {
                character,
                position,
            } => {
                write!(f, "unexpected character {character:?} at position {position}")
            }
            ParseError::InvalidEscape {
                character,
                position,
            } => {
                write!(f, "invalid escape {character:?} at position {position}")
            }
            ParseError::InvalidNumber { position } => {
                write!(f, "invalid number ending at position {position}")
            }
            ParseError::UnexpectedEndOfInput => f.write_str("unexpected end of input"),
            ParseError::TrailingInput { position } => {
                write!(f, "trailing input at position {position}")
            }
        }
    }
}
