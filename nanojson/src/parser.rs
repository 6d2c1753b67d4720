// SPDX-License-Identifier: Apache-2.0

//! Streaming JSON parser building allocator-backed value trees.

use core::ptr::{self, NonNull};

use log::trace;

use crate::allocator::{default_allocator, Allocator, AllocatorExt};
use crate::json_string::JsonString;
use crate::parse_error::ParseError;
use crate::unicode::{
    combine_surrogates, is_high_surrogate, is_low_surrogate, DecodeObserver, Decoder, Encoding,
    UnicodeError,
};
use crate::value::{Document, Value};

/// Capacity of the number-token scratch buffer, surfaced to callers as
/// [`Parser::MAX_NUMBER_LENGTH`].
const NUMBER_BUFFER: usize = 40;

/// Lexical state, driven one code point at a time.
#[derive(Debug, Clone, Copy)]
enum Lexer {
    /// Between tokens.
    Idle,
    /// Inside a quoted string.
    InString { is_key: bool },
    /// Just consumed a backslash.
    Escape { is_key: bool },
    /// Collecting the four hex digits of `\uXXXX`. A buffered high
    /// surrogate waits for its low half.
    UnicodeEscape {
        is_key: bool,
        acc: u32,
        digits: u8,
        high: Option<u32>,
    },
    /// A high surrogate escape just completed; the next code point must
    /// open the low-half escape.
    LowSurrogateBackslash { is_key: bool, high: u32 },
    LowSurrogateU { is_key: bool, high: u32 },
    /// Accumulating a number token into the parser's number buffer.
    Number { len: usize, float: bool },
    /// Matching the tail of `true`, `false` or `null`.
    Literal { text: &'static str, matched: usize },
}

/// What the grammar allows at the next token boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    RootValue,
    Value,
    ValueOrEnd,
    Key,
    KeyOrEnd,
    Colon,
    CommaOrEnd,
    Done,
}

/// The grammar and tree-building half of the parser. Split from the
/// decoder so the decoder can borrow it as its observer.
struct ParserCore<'alloc> {
    alloc: &'alloc dyn Allocator,
    /// Root value pinned in allocator storage once the first value starts.
    root_slot: Option<NonNull<Value<'alloc>>>,
    /// Innermost open container, tracked through the parent links instead
    /// of a stack. Null at root level.
    current: *mut Value<'alloc>,
    lexer: Lexer,
    expect: Expect,
    scratch: Option<JsonString<'alloc>>,
    pending_key: Option<JsonString<'alloc>>,
    num_buf: [u8; NUMBER_BUFFER],
    /// Code points consumed so far; used in error positions.
    position: usize,
    error: Option<ParseError>,
}

impl<'alloc> ParserCore<'alloc> {
    fn new(alloc: &'alloc dyn Allocator) -> Self {
        Self {
            alloc,
            root_slot: None,
            current: ptr::null_mut(),
            lexer: Lexer::Idle,
            expect: Expect::RootValue,
            scratch: None,
            pending_key: None,
            num_buf: [0; NUMBER_BUFFER],
            position: 0,
            error: None,
        }
    }

    fn unexpected(&self, cp: u32) -> ParseError {
        ParseError::UnexpectedCharacter {
            character: char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER),
            position: self.position,
        }
    }

    fn step(&mut self, cp: u32) -> Result<(), ParseError> {
        match self.lexer {
            Lexer::Idle => self.step_idle(cp),
            Lexer::InString { is_key } => self.step_string(is_key, cp),
            Lexer::Escape { is_key } => self.step_escape(is_key, cp),
            Lexer::UnicodeEscape {
                is_key,
                acc,
                digits,
                high,
            } => self.step_unicode_escape(is_key, acc, digits, high, cp),
            Lexer::LowSurrogateBackslash { is_key, high } => {
                if cp == u32::from('\\') {
                    self.lexer = Lexer::LowSurrogateU { is_key, high };
                    Ok(())
                } else {
                    Err(UnicodeError::InvalidUtf16Surrogate.into())
                }
            }
            Lexer::LowSurrogateU { is_key, high } => {
                if cp == u32::from('u') {
                    self.lexer = Lexer::UnicodeEscape {
                        is_key,
                        acc: 0,
                        digits: 0,
                        high: Some(high),
                    };
                    Ok(())
                } else {
                    Err(UnicodeError::InvalidUtf16Surrogate.into())
                }
            }
            Lexer::Number { len, float } => self.step_number(len, float, cp),
            Lexer::Literal { text, matched } => self.step_literal(text, matched, cp),
        }
    }

    fn step_idle(&mut self, cp: u32) -> Result<(), ParseError> {
        if matches!(cp, 0x20 | 0x09 | 0x0A | 0x0D) {
            return Ok(());
        }
        // A leading byte-order mark survives UTF-8 decoding as U+FEFF.
        if cp == 0xFEFF && self.position == 1 {
            return Ok(());
        }
        match self.expect {
            Expect::Done => Err(ParseError::TrailingInput {
                position: self.position,
            }),
            Expect::Colon => {
                if cp == u32::from(':') {
                    self.expect = Expect::Value;
                    Ok(())
                } else {
                    Err(self.unexpected(cp))
                }
            }
            Expect::CommaOrEnd => match cp {
                0x2C => {
                    // SAFETY: a comma is only expected inside an open
                    // container, which current points at.
                    let in_object = !self.current.is_null()
                        && unsafe { (*self.current).is_object() };
                    self.expect = if in_object { Expect::Key } else { Expect::Value };
                    Ok(())
                }
                0x5D => self.close_container(true, cp),
                0x7D => self.close_container(false, cp),
                _ => Err(self.unexpected(cp)),
            },
            Expect::Key | Expect::KeyOrEnd => match cp {
                0x22 => {
                    self.start_string(true);
                    Ok(())
                }
                0x7D if self.expect == Expect::KeyOrEnd => self.close_container(false, cp),
                _ => Err(self.unexpected(cp)),
            },
            Expect::RootValue | Expect::Value | Expect::ValueOrEnd => {
                if cp == 0x5D && self.expect == Expect::ValueOrEnd {
                    self.close_container(true, cp)
                } else {
                    self.begin_value(cp)
                }
            }
        }
    }

    fn begin_value(&mut self, cp: u32) -> Result<(), ParseError> {
        match cp {
            0x22 => {
                self.start_string(false);
                Ok(())
            }
            0x7B => self.open_container(false),
            0x5B => self.open_container(true),
            0x74 => {
                self.lexer = Lexer::Literal {
                    text: "true",
                    matched: 1,
                };
                Ok(())
            }
            0x66 => {
                self.lexer = Lexer::Literal {
                    text: "false",
                    matched: 1,
                };
                Ok(())
            }
            0x6E => {
                self.lexer = Lexer::Literal {
                    text: "null",
                    matched: 1,
                };
                Ok(())
            }
            0x2D | 0x30..=0x39 => {
                self.num_buf[0] = cp as u8;
                self.lexer = Lexer::Number {
                    len: 1,
                    float: false,
                };
                Ok(())
            }
            _ => Err(self.unexpected(cp)),
        }
    }

    fn start_string(&mut self, is_key: bool) {
        self.scratch = Some(JsonString::new_in(self.alloc));
        self.lexer = Lexer::InString { is_key };
    }

    /// Pin `value` into the tree: the root slot at top level, otherwise a
    /// new item of the open container. Returns the pinned address.
    fn place(&mut self, value: Value<'alloc>) -> Result<*mut Value<'alloc>, ParseError> {
        if self.current.is_null() {
            let slot: NonNull<Value<'alloc>> = self
                .alloc
                .allocate_one()
                .ok_or(ParseError::OutOfMemory)?;
            // SAFETY: fresh storage; the root stays pinned there until the
            // document (or the parser) is dropped.
            unsafe {
                ptr::write(slot.as_ptr(), value);
                (*slot.as_ptr()).clear_parent();
                (*slot.as_ptr()).reparent_children();
            }
            self.root_slot = Some(slot);
            return Ok(slot.as_ptr());
        }
        let owner = self.current;
        // SAFETY: current points at a live open container, pinned in
        // allocator storage.
        let container = unsafe { &mut *self.current };
        let slot = if container.is_array() {
            container.push(value)
        } else if let Some(object) = container.as_object_mut() {
            let name = match self.pending_key.take() {
                Some(name) => name,
                // Unreachable through the grammar.
                None => JsonString::new_in(self.alloc),
            };
            object.insert_pair(name, value).map(|slot| {
                slot.set_parent(owner);
                slot
            })
        } else {
            None
        };
        let slot = slot.ok_or(ParseError::OutOfMemory)?;
        Ok(slot as *mut Value<'alloc>)
    }

    fn place_scalar(&mut self, value: Value<'alloc>) -> Result<(), ParseError> {
        self.place(value)?;
        self.expect = if self.current.is_null() {
            Expect::Done
        } else {
            Expect::CommaOrEnd
        };
        Ok(())
    }

    fn open_container(&mut self, array: bool) -> Result<(), ParseError> {
        trace!("open {}", if array { "array" } else { "object" });
        let value = if array {
            Value::array_in(self.alloc)
        } else {
            Value::object_in(self.alloc)
        };
        self.current = self.place(value)?;
        self.expect = if array {
            Expect::ValueOrEnd
        } else {
            Expect::KeyOrEnd
        };
        Ok(())
    }

    fn close_container(&mut self, array: bool, cp: u32) -> Result<(), ParseError> {
        if self.current.is_null() {
            return Err(self.unexpected(cp));
        }
        // SAFETY: current points at a live open container.
        let cur = unsafe { &*self.current };
        if array != cur.is_array() {
            return Err(self.unexpected(cp));
        }
        trace!("close {}", if array { "array" } else { "object" });
        self.current = cur.parent_ptr();
        self.expect = if self.current.is_null() {
            Expect::Done
        } else {
            Expect::CommaOrEnd
        };
        Ok(())
    }

    fn step_string(&mut self, is_key: bool, cp: u32) -> Result<(), ParseError> {
        match cp {
            0x22 => self.finish_string(is_key),
            0x5C => {
                self.lexer = Lexer::Escape { is_key };
                Ok(())
            }
            0x00..=0x1F => Err(self.unexpected(cp)),
            _ => self.push_scratch(cp),
        }
    }

    fn finish_string(&mut self, is_key: bool) -> Result<(), ParseError> {
        let alloc = self.alloc;
        let text = self
            .scratch
            .take()
            .unwrap_or_else(|| JsonString::new_in(alloc));
        self.lexer = Lexer::Idle;
        if is_key {
            self.pending_key = Some(text);
            self.expect = Expect::Colon;
            Ok(())
        } else {
            self.place_scalar(Value::from(text))
        }
    }

    fn push_scratch(&mut self, cp: u32) -> Result<(), ParseError> {
        let ch = char::from_u32(cp).ok_or(ParseError::InvalidUnicode(UnicodeError::InvalidCode))?;
        let alloc = self.alloc;
        let text = self
            .scratch
            .get_or_insert_with(|| JsonString::new_in(alloc));
        if text.push(ch) {
            Ok(())
        } else {
            Err(ParseError::OutOfMemory)
        }
    }

    fn step_escape(&mut self, is_key: bool, cp: u32) -> Result<(), ParseError> {
        self.lexer = Lexer::InString { is_key };
        match cp {
            0x22 | 0x5C | 0x2F => self.push_scratch(cp),
            0x62 => self.push_scratch(0x08),
            0x66 => self.push_scratch(0x0C),
            0x6E => self.push_scratch(0x0A),
            0x72 => self.push_scratch(0x0D),
            0x74 => self.push_scratch(0x09),
            0x75 => {
                self.lexer = Lexer::UnicodeEscape {
                    is_key,
                    acc: 0,
                    digits: 0,
                    high: None,
                };
                Ok(())
            }
            _ => Err(ParseError::InvalidEscape {
                character: char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER),
                position: self.position,
            }),
        }
    }

    fn step_unicode_escape(
        &mut self,
        is_key: bool,
        acc: u32,
        digits: u8,
        high: Option<u32>,
        cp: u32,
    ) -> Result<(), ParseError> {
        let digit = char::from_u32(cp)
            .and_then(|ch| ch.to_digit(16))
            .ok_or(ParseError::InvalidEscape {
                character: char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER),
                position: self.position,
            })?;
        let acc = (acc << 4) | digit;
        let digits = digits + 1;
        if digits < 4 {
            self.lexer = Lexer::UnicodeEscape {
                is_key,
                acc,
                digits,
                high,
            };
            return Ok(());
        }
        match high {
            None if is_high_surrogate(acc) => {
                self.lexer = Lexer::LowSurrogateBackslash { is_key, high: acc };
                Ok(())
            }
            None if is_low_surrogate(acc) => Err(UnicodeError::InvalidUtf16Surrogate.into()),
            None => {
                self.lexer = Lexer::InString { is_key };
                self.push_scratch(acc)
            }
            Some(high) if is_low_surrogate(acc) => {
                self.lexer = Lexer::InString { is_key };
                self.push_scratch(combine_surrogates(high, acc))
            }
            Some(_) => Err(UnicodeError::InvalidUtf16Surrogate.into()),
        }
    }

    fn step_number(&mut self, len: usize, float: bool, cp: u32) -> Result<(), ParseError> {
        match cp {
            0x30..=0x39 | 0x2B | 0x2D | 0x2E | 0x45 | 0x65 => {
                if len >= self.num_buf.len() {
                    return Err(ParseError::InvalidNumber {
                        position: self.position,
                    });
                }
                self.num_buf[len] = cp as u8;
                self.lexer = Lexer::Number {
                    len: len + 1,
                    float: float || matches!(cp, 0x2E | 0x45 | 0x65),
                };
                Ok(())
            }
            _ => {
                // The delimiter ends the token and is reprocessed.
                self.finish_number(len, float)?;
                self.step(cp)
            }
        }
    }

    fn finish_number(&mut self, len: usize, float: bool) -> Result<(), ParseError> {
        self.lexer = Lexer::Idle;
        let invalid = ParseError::InvalidNumber {
            position: self.position,
        };
        let value = {
            let text = core::str::from_utf8(&self.num_buf[..len]).map_err(|_| invalid)?;
            if float {
                Value::from(text.parse::<f64>().map_err(|_| invalid)?)
            } else {
                match text.parse::<i64>() {
                    Ok(i) => Value::from(i),
                    // Magnitudes past i64 degrade to floating point.
                    Err(_) => Value::from(text.parse::<f64>().map_err(|_| invalid)?),
                }
            }
        };
        self.place_scalar(value)
    }

    fn step_literal(&mut self, text: &'static str, matched: usize, cp: u32) -> Result<(), ParseError> {
        if text.as_bytes().get(matched).copied() != Some(cp as u8) || cp > 0x7F {
            return Err(self.unexpected(cp));
        }
        let matched = matched + 1;
        if matched < text.len() {
            self.lexer = Lexer::Literal { text, matched };
            return Ok(());
        }
        self.lexer = Lexer::Idle;
        let value = match text {
            "true" => Value::from(true),
            "false" => Value::from(false),
            _ => Value::null(),
        };
        self.place_scalar(value)
    }
}

impl DecodeObserver for ParserCore<'_> {
    fn unicode_decoded(&mut self, code_point: u32) {
        if self.error.is_some() {
            return;
        }
        self.position += 1;
        if let Err(err) = self.step(code_point) {
            self.error = Some(err);
        }
    }

    fn unicode_decode_failed(&mut self, _unit: u32, error: UnicodeError) {
        if self.error.is_none() {
            self.position += 1;
            self.error = Some(error.into());
        }
    }
}

impl Drop for ParserCore<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.root_slot.take() {
            // SAFETY: the parser still owns the (possibly partial) tree.
            unsafe { self.alloc.destroy(slot) };
        }
    }
}

/// Incremental JSON parser.
///
/// Bytes fed through [`Parser::feed`] run through a [`Decoder`] for the
/// configured input encoding and the decoded code points drive the grammar.
/// Input may be split at any byte boundary. The first error is sticky;
/// [`Parser::finish`] hands over the completed tree as a [`Document`].
///
/// Number tokens are accumulated in a fixed internal buffer of
/// [`Parser::MAX_NUMBER_LENGTH`] code points; longer tokens report
/// [`ParseError::InvalidNumber`].
pub struct Parser<'alloc> {
    decoder: Decoder,
    core: ParserCore<'alloc>,
}

impl Parser<'static> {
    /// A UTF-8 parser backed by the process-wide default allocator.
    pub fn new() -> Self {
        Self::new_in(default_allocator())
    }
}

impl<'alloc> Parser<'alloc> {
    /// Longest accepted number token, in code points. Covers every i64 and
    /// every shortest-round-trip f64 with room to spare.
    pub const MAX_NUMBER_LENGTH: usize = NUMBER_BUFFER;

    /// A UTF-8 parser backed by an explicit allocator.
    pub fn new_in(alloc: &'alloc dyn Allocator) -> Self {
        Self::with_encoding_in(Encoding::Utf8, alloc)
    }

    pub fn with_encoding_in(encoding: Encoding, alloc: &'alloc dyn Allocator) -> Self {
        Self {
            decoder: Decoder::new(encoding),
            core: ParserCore::new(alloc),
        }
    }

    /// Consume a chunk of input. Returns the first error hit so far; once
    /// an error is reported every further call reports it again.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        self.decoder.decode_bytes(bytes, &mut self.core);
        match self.core.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// End of input: flush any trailing number token and hand over the
    /// finished document.
    pub fn finish(mut self) -> Result<Document<'alloc>, ParseError> {
        if let Some(err) = self.core.error {
            return Err(err);
        }
        if let Lexer::Number { len, float } = self.core.lexer {
            self.core.finish_number(len, float)?;
        }
        if !matches!(self.core.lexer, Lexer::Idle) || !self.core.current.is_null() {
            return Err(ParseError::UnexpectedEndOfInput);
        }
        match self.core.root_slot.take() {
            // SAFETY: the slot holds the completed root in storage from the
            // parser's allocator; ownership moves to the document.
            Some(slot) => Ok(unsafe { Document::from_raw(slot, self.core.alloc) }),
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }
}

impl Default for Parser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::PoolAllocator;
    use crate::json_number::Number;
    use test_log::test;

    fn parse_str<'alloc>(
        input: &str,
        alloc: &'alloc dyn Allocator,
    ) -> Result<Document<'alloc>, ParseError> {
        let mut parser = Parser::new_in(alloc);
        parser.feed(input.as_bytes())?;
        parser.finish()
    }

    #[test]
    fn scalar_roots() {
        let mut mem = [0u8; 1024];
        let pool = PoolAllocator::new(&mut mem);
        assert!(parse_str("null", &pool).unwrap().is_null());
        assert_eq!(parse_str("true", &pool).unwrap().as_bool(), Some(true));
        assert_eq!(parse_str("42", &pool).unwrap().as_i64(), Some(42));
        assert_eq!(parse_str("-2.5e1", &pool).unwrap().as_f64(), Some(-25.0));
        assert_eq!(parse_str("\"hi\"", &pool).unwrap().as_str(), Some("hi"));
    }

    #[test]
    fn nested_containers() {
        let mut mem = [0u8; 4096];
        let pool = PoolAllocator::new(&mut mem);
        let doc = parse_str(r#"{"a": [1, 2, {"b": null}], "c": false}"#, &pool).unwrap();
        let obj = doc.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        let a = obj.get("a").unwrap().as_array().unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(0).unwrap().as_i64(), Some(1));
        assert!(a.get(2).unwrap().as_object().unwrap().get("b").unwrap().is_null());
        assert_eq!(obj.get("c").unwrap().as_bool(), Some(false));
    }

    #[test]
    fn parent_links_reach_the_root() {
        let mut mem = [0u8; 4096];
        let pool = PoolAllocator::new(&mut mem);
        let doc = parse_str(r#"[[["deep"]]]"#, &pool).unwrap();
        let deep = doc
            .as_array()
            .and_then(|a| a.first())
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .unwrap();
        assert_eq!(deep.as_str(), Some("deep"));
        assert!(deep.is_array_item());
        assert!(core::ptr::eq(deep.root(), doc.root()));
    }

    #[test]
    fn string_escapes() {
        let mut mem = [0u8; 2048];
        let pool = PoolAllocator::new(&mut mem);
        let doc = parse_str(r#""a\"b\\c\/d\n\tA€""#, &pool).unwrap();
        assert_eq!(doc.as_str(), Some("a\"b\\c/d\n\tA\u{20AC}"));
    }

    #[test]
    fn surrogate_pair_escape() {
        let mut mem = [0u8; 1024];
        let pool = PoolAllocator::new(&mut mem);
        let doc = parse_str(r#""😀""#, &pool).unwrap();
        assert_eq!(doc.as_str(), Some("\u{1F600}"));
    }

    #[test]
    fn lone_surrogate_escape_is_rejected() {
        let mut mem = [0u8; 1024];
        let pool = PoolAllocator::new(&mut mem);
        assert_eq!(
            parse_str(r#""\uD83D x""#, &pool).unwrap_err(),
            ParseError::InvalidUnicode(UnicodeError::InvalidUtf16Surrogate)
        );
        assert_eq!(
            parse_str(r#""\uDE00""#, &pool).unwrap_err(),
            ParseError::InvalidUnicode(UnicodeError::InvalidUtf16Surrogate)
        );
    }

    #[test]
    fn numbers_choose_integer_or_float() {
        let mut mem = [0u8; 4096];
        let pool = PoolAllocator::new(&mut mem);
        let doc = parse_str("[0, -7, 3.5, 1e3, 9223372036854775807]", &pool).unwrap();
        let arr = doc.as_array().unwrap();
        assert_eq!(arr.get(0).unwrap().as_number(), Some(Number::Integer(0)));
        assert_eq!(arr.get(1).unwrap().as_i64(), Some(-7));
        assert_eq!(arr.get(2).unwrap().as_number(), Some(Number::Float(3.5)));
        assert_eq!(arr.get(3).unwrap().as_f64(), Some(1000.0));
        assert_eq!(arr.get(4).unwrap().as_i64(), Some(i64::MAX));
    }

    #[test]
    fn number_tokens_longer_than_the_buffer_are_rejected() {
        let mut mem = [0u8; 1024];
        let pool = PoolAllocator::new(&mut mem);
        let longest = "1".repeat(Parser::MAX_NUMBER_LENGTH);
        let parsed = parse_str(&longest, &pool).unwrap().as_f64().unwrap();
        assert!(parsed > 1e39);
        let too_long = "1".repeat(Parser::MAX_NUMBER_LENGTH + 1);
        assert!(matches!(
            parse_str(&too_long, &pool).unwrap_err(),
            ParseError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn trailing_number_is_flushed_by_finish() {
        let mut mem = [0u8; 1024];
        let pool = PoolAllocator::new(&mut mem);
        let mut parser = Parser::new_in(&pool);
        parser.feed(b"12").unwrap();
        parser.feed(b"3").unwrap();
        assert_eq!(parser.finish().unwrap().as_i64(), Some(123));
    }

    #[test]
    fn input_split_inside_a_multibyte_sequence() {
        let mut mem = [0u8; 1024];
        let pool = PoolAllocator::new(&mut mem);
        let bytes = "\"\u{1F600}\"".as_bytes();
        let mut parser = Parser::new_in(&pool);
        parser.feed(&bytes[..3]).unwrap();
        parser.feed(&bytes[3..]).unwrap();
        assert_eq!(parser.finish().unwrap().as_str(), Some("\u{1F600}"));
    }

    #[test]
    fn utf16_input() {
        let mut mem = [0u8; 1024];
        let pool = PoolAllocator::new(&mut mem);
        let mut bytes = Vec::new();
        for unit in "\"ok\"".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let mut parser = Parser::with_encoding_in(Encoding::Utf16Be, &pool);
        parser.feed(&bytes).unwrap();
        assert_eq!(parser.finish().unwrap().as_str(), Some("ok"));
    }

    #[test]
    fn grammar_errors() {
        let mut mem = [0u8; 2048];
        let pool = PoolAllocator::new(&mut mem);
        assert!(matches!(
            parse_str("[1,]", &pool).unwrap_err(),
            ParseError::UnexpectedCharacter { character: ']', .. }
        ));
        assert!(matches!(
            parse_str("{\"a\" 1}", &pool).unwrap_err(),
            ParseError::UnexpectedCharacter { character: '1', .. }
        ));
        assert!(matches!(
            parse_str("1 2", &pool).unwrap_err(),
            ParseError::TrailingInput { .. }
        ));
        assert_eq!(
            parse_str("[1, 2", &pool).unwrap_err(),
            ParseError::UnexpectedEndOfInput
        );
        assert_eq!(
            parse_str("", &pool).unwrap_err(),
            ParseError::UnexpectedEndOfInput
        );
        assert!(matches!(
            parse_str("nul", &pool).unwrap_err(),
            ParseError::UnexpectedEndOfInput
        ));
    }

    #[test]
    fn decode_errors_surface() {
        let mut mem = [0u8; 1024];
        let pool = PoolAllocator::new(&mut mem);
        let mut parser = Parser::new_in(&pool);
        assert_eq!(
            parser.feed(&[0x22, 0xE0, 0x41, 0x22]).unwrap_err(),
            ParseError::InvalidUnicode(UnicodeError::InvalidUtf8NextCode)
        );
    }

    #[test]
    fn exhaustion_reports_out_of_memory() {
        let mut mem = [0u8; 96];
        let pool = PoolAllocator::new(&mut mem);
        let mut parser = Parser::new_in(&pool);
        let err = parser
            .feed(br#"["roomy", "roomier", "roomiest", "overflow"]"#)
            .err();
        assert_eq!(err, Some(ParseError::OutOfMemory));
    }

    #[test]
    fn abandoned_parser_returns_its_memory() {
        let mut mem = [0u8; 4096];
        let pool = PoolAllocator::new(&mut mem);
        {
            let mut parser = Parser::new_in(&pool);
            parser.feed(br#"{"a": [1, 2, 3"#).unwrap();
        }
        assert!(pool.empty());
    }

    #[test]
    fn byte_order_mark_before_the_root_is_skipped() {
        let mut mem = [0u8; 1024];
        let pool = PoolAllocator::new(&mut mem);
        let mut parser = Parser::new_in(&pool);
        parser.feed(&[0xEF, 0xBB, 0xBF]).unwrap();
        parser.feed(b"7").unwrap();
        assert_eq!(parser.finish().unwrap().as_i64(), Some(7));
    }
}
