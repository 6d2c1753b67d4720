// SPDX-License-Identifier: Apache-2.0

//! Code-point to code-unit mirror of the decoder.

use super::{is_scalar, swap16, EncodeObserver, Encoding, UnicodeError};

/// Streaming encoder producing code units of the configured encoding.
///
/// Units are delivered to the observer as big-endian-assembled values; for
/// the little-endian encodings every unit is byte-swapped before delivery,
/// so writing the units out high-byte-first yields a correct byte stream
/// for any configuration.
pub struct Encoder {
    encoding: Encoding,
}

impl Encoder {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Encode one code point. Surrogate-range and out-of-range values are
    /// reported to the observer and produce no units.
    pub fn encode<O: EncodeObserver + ?Sized>(&self, code_point: u32, observer: &mut O) {
        if !is_scalar(code_point) {
            observer.unicode_encode_failed(code_point, UnicodeError::InvalidCode);
            return;
        }
        match self.encoding {
            Encoding::Utf8 => self.encode_utf8(code_point, observer),
            Encoding::Utf16 | Encoding::Utf16Be => self.encode_utf16(code_point, false, observer),
            Encoding::Utf16Le => self.encode_utf16(code_point, true, observer),
            Encoding::Utf32 | Encoding::Utf32Be => observer.unicode_encoded(code_point),
            Encoding::Utf32Le => observer.unicode_encoded(code_point.swap_bytes()),
        }
    }

    /// Emit `U+FEFF` in the configured encoding, marking the byte order of
    /// everything that follows.
    pub fn insert_byte_order_mark<O: EncodeObserver + ?Sized>(&self, observer: &mut O) {
        self.encode(0xFEFF, observer);
    }

    fn encode_utf8<O: EncodeObserver + ?Sized>(&self, cp: u32, observer: &mut O) {
        if cp < 0x80 {
            observer.unicode_encoded(cp);
        } else if cp < 0x800 {
            observer.unicode_encoded(0xC0 | (cp >> 6));
            observer.unicode_encoded(0x80 | (cp & 0x3F));
        } else if cp < 0x10000 {
            observer.unicode_encoded(0xE0 | (cp >> 12));
            observer.unicode_encoded(0x80 | ((cp >> 6) & 0x3F));
            observer.unicode_encoded(0x80 | (cp & 0x3F));
        } else {
            observer.unicode_encoded(0xF0 | (cp >> 18));
            observer.unicode_encoded(0x80 | ((cp >> 12) & 0x3F));
            observer.unicode_encoded(0x80 | ((cp >> 6) & 0x3F));
            observer.unicode_encoded(0x80 | (cp & 0x3F));
        }
    }

    fn encode_utf16<O: EncodeObserver + ?Sized>(&self, cp: u32, swap: bool, observer: &mut O) {
        let put = |observer: &mut O, unit: u32| {
            observer.unicode_encoded(if swap { swap16(unit) } else { unit });
        };
        if cp < 0x10000 {
            put(observer, cp);
        } else {
            let v = cp - 0x10000;
            put(observer, 0xD800 + (v >> 10));
            put(observer, 0xDC00 + (v & 0x3FF));
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(Encoding::Utf8)
    }
}
