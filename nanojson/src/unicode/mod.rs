// SPDX-License-Identifier: Apache-2.0

//! Streaming Unicode transcoding.
//!
//! [`Decoder`] turns UTF-8/16/32 code units into UTF-32 code points and
//! [`Encoder`] does the reverse, both one unit at a time through observer
//! callbacks so neither side ever buffers a whole stream. Errors are
//! reported to the observer and the state machines reset and keep going;
//! a bad unit never halts the stream.

mod decoder;
mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;

/// Source or target encoding. The plain `Utf16`/`Utf32` variants sense a
/// leading byte-order mark and default to big-endian when none is present;
/// the `Be`/`Le` variants pin the byte order up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16,
    Utf16Be,
    Utf16Le,
    Utf32,
    Utf32Be,
    Utf32Le,
}

impl Encoding {
    /// Width of one code unit in bytes.
    pub fn unit_bytes(self) -> usize {
        match self {
            Encoding::Utf8 => 1,
            Encoding::Utf16 | Encoding::Utf16Be | Encoding::Utf16Le => 2,
            Encoding::Utf32 | Encoding::Utf32Be | Encoding::Utf32Le => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnicodeError {
    /// A UTF-8 leading byte with no valid sequence-length pattern.
    InvalidUtf8FirstCode,
    /// A UTF-8 continuation byte that does not match `10xxxxxx`.
    InvalidUtf8NextCode,
    /// A lone or mismatched UTF-16 surrogate unit.
    InvalidUtf16Surrogate,
    /// A value outside the Unicode scalar range.
    InvalidCode,
}

impl core::fmt::Display for UnicodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            UnicodeError::InvalidUtf8FirstCode => "invalid UTF-8 leading byte",
            UnicodeError::InvalidUtf8NextCode => "invalid UTF-8 continuation byte",
            UnicodeError::InvalidUtf16Surrogate => "invalid UTF-16 surrogate",
            UnicodeError::InvalidCode => "code point outside the Unicode scalar range",
        };
        f.write_str(msg)
    }
}

/// Receiver for decoded code points.
pub trait DecodeObserver {
    fn unicode_decoded(&mut self, code_point: u32);
    fn unicode_decode_failed(&mut self, unit: u32, error: UnicodeError);
}

impl<F: FnMut(Result<u32, UnicodeError>)> DecodeObserver for F {
    fn unicode_decoded(&mut self, code_point: u32) {
        self(Ok(code_point));
    }

    fn unicode_decode_failed(&mut self, _unit: u32, error: UnicodeError) {
        self(Err(error));
    }
}

/// Receiver for encoded code units.
pub trait EncodeObserver {
    fn unicode_encoded(&mut self, unit: u32);
    fn unicode_encode_failed(&mut self, code_point: u32, error: UnicodeError);
}

impl<F: FnMut(Result<u32, UnicodeError>)> EncodeObserver for F {
    fn unicode_encoded(&mut self, unit: u32) {
        self(Ok(unit));
    }

    fn unicode_encode_failed(&mut self, _code_point: u32, error: UnicodeError) {
        self(Err(error));
    }
}

pub(crate) const fn is_scalar(code_point: u32) -> bool {
    code_point <= 0x10FFFF && !is_surrogate(code_point)
}

pub(crate) const fn is_surrogate(code_point: u32) -> bool {
    code_point >= 0xD800 && code_point <= 0xDFFF
}

pub(crate) const fn is_high_surrogate(unit: u32) -> bool {
    unit >= 0xD800 && unit <= 0xDBFF
}

pub(crate) const fn is_low_surrogate(unit: u32) -> bool {
    unit >= 0xDC00 && unit <= 0xDFFF
}

pub(crate) const fn combine_surrogates(high: u32, low: u32) -> u32 {
    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
}

pub(crate) const fn swap16(unit: u32) -> u32 {
    ((unit & 0xFF) << 8) | ((unit >> 8) & 0xFF)
}
