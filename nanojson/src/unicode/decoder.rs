// SPDX-License-Identifier: Apache-2.0

//! Code-unit to code-point state machine.

use super::{
    combine_surrogates, is_high_surrogate, is_low_surrogate, is_scalar, swap16, DecodeObserver,
    Encoding, UnicodeError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Expecting a UTF-8 leading byte.
    Utf8First,
    /// Inside a UTF-8 multi-byte sequence.
    Utf8Next { acc: u32, remaining: u8 },
    /// First UTF-16 unit, may be a byte-order mark.
    DetectBom16,
    /// Expecting any UTF-16 unit.
    Utf16Unit { swap: bool },
    /// A high surrogate is buffered, expecting its low half.
    Utf16LowSurrogate { swap: bool, high: u32 },
    /// First UTF-32 unit, may be a byte-order mark.
    DetectBom32,
    /// Expecting any UTF-32 unit.
    Utf32Unit { swap: bool },
}

impl DecodeState {
    fn initial(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Utf8 => DecodeState::Utf8First,
            Encoding::Utf16 => DecodeState::DetectBom16,
            Encoding::Utf16Be => DecodeState::Utf16Unit { swap: false },
            Encoding::Utf16Le => DecodeState::Utf16Unit { swap: true },
            Encoding::Utf32 => DecodeState::DetectBom32,
            Encoding::Utf32Be => DecodeState::Utf32Unit { swap: false },
            Encoding::Utf32Le => DecodeState::Utf32Unit { swap: true },
        }
    }
}

/// Streaming decoder producing UTF-32 code points.
///
/// Units passed to [`Decoder::decode`] are big-endian-assembled values (the
/// first byte on the wire in the high bits); for the little-endian
/// encodings the decoder swaps them internally. [`Decoder::decode_bytes`]
/// does the assembly from a raw byte stream, carrying partial units across
/// calls so chunk boundaries may fall anywhere.
pub struct Decoder {
    encoding: Encoding,
    state: DecodeState,
    pending: [u8; 4],
    pending_len: usize,
}

impl Decoder {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            state: DecodeState::initial(encoding),
            pending: [0; 4],
            pending_len: 0,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Drop any partial sequence and return to the initial state for the
    /// configured encoding, including byte-order-mark detection.
    pub fn reset(&mut self) {
        self.state = DecodeState::initial(self.encoding);
        self.pending_len = 0;
    }

    /// Feed one code unit.
    pub fn decode<O: DecodeObserver + ?Sized>(&mut self, unit: u32, observer: &mut O) {
        match self.state {
            DecodeState::Utf8First => self.utf8_first(unit, observer),
            DecodeState::Utf8Next { acc, remaining } => {
                self.utf8_next(acc, remaining, unit, observer)
            }
            DecodeState::DetectBom16 => match unit {
                0xFEFF => self.state = DecodeState::Utf16Unit { swap: false },
                0xFFFE => self.state = DecodeState::Utf16Unit { swap: true },
                _ => {
                    // No mark: big-endian, and this unit is payload.
                    self.state = DecodeState::Utf16Unit { swap: false };
                    self.utf16_unit(false, unit, observer);
                }
            },
            DecodeState::Utf16Unit { swap } => self.utf16_unit(swap, unit, observer),
            DecodeState::Utf16LowSurrogate { swap, high } => {
                self.utf16_low_surrogate(swap, high, unit, observer)
            }
            DecodeState::DetectBom32 => match unit {
                0x0000_FEFF => self.state = DecodeState::Utf32Unit { swap: false },
                0xFFFE_0000 => self.state = DecodeState::Utf32Unit { swap: true },
                _ => {
                    self.state = DecodeState::Utf32Unit { swap: false };
                    self.utf32_unit(false, unit, observer);
                }
            },
            DecodeState::Utf32Unit { swap } => self.utf32_unit(swap, unit, observer),
        }
    }

    /// Feed raw bytes, assembling code units of the configured width.
    pub fn decode_bytes<O: DecodeObserver + ?Sized>(&mut self, bytes: &[u8], observer: &mut O) {
        let width = self.encoding.unit_bytes();
        for &byte in bytes {
            self.pending[self.pending_len] = byte;
            self.pending_len += 1;
            if self.pending_len == width {
                let mut unit = 0u32;
                for &b in &self.pending[..width] {
                    unit = (unit << 8) | u32::from(b);
                }
                self.pending_len = 0;
                self.decode(unit, observer);
            }
        }
    }

    fn utf8_first<O: DecodeObserver + ?Sized>(&mut self, unit: u32, observer: &mut O) {
        if unit < 0x80 {
            observer.unicode_decoded(unit);
        } else if unit & 0xFFFF_FFE0 == 0xC0 {
            self.state = DecodeState::Utf8Next {
                acc: unit & 0x1F,
                remaining: 1,
            };
        } else if unit & 0xFFFF_FFF0 == 0xE0 {
            self.state = DecodeState::Utf8Next {
                acc: unit & 0x0F,
                remaining: 2,
            };
        } else if unit & 0xFFFF_FFF8 == 0xF0 {
            self.state = DecodeState::Utf8Next {
                acc: unit & 0x07,
                remaining: 3,
            };
        } else {
            observer.unicode_decode_failed(unit, UnicodeError::InvalidUtf8FirstCode);
        }
    }

    fn utf8_next<O: DecodeObserver + ?Sized>(
        &mut self,
        acc: u32,
        remaining: u8,
        unit: u32,
        observer: &mut O,
    ) {
        if unit & 0xFFFF_FFC0 != 0x80 {
            // The offending unit is consumed by the error.
            self.state = DecodeState::Utf8First;
            observer.unicode_decode_failed(unit, UnicodeError::InvalidUtf8NextCode);
            return;
        }
        let acc = (acc << 6) | (unit & 0x3F);
        if remaining > 1 {
            self.state = DecodeState::Utf8Next {
                acc,
                remaining: remaining - 1,
            };
        } else {
            self.state = DecodeState::Utf8First;
            self.emit_checked(acc, unit, observer);
        }
    }

    fn utf16_unit<O: DecodeObserver + ?Sized>(&mut self, swap: bool, unit: u32, observer: &mut O) {
        let value = if swap { swap16(unit & 0xFFFF) } else { unit & 0xFFFF };
        if is_high_surrogate(value) {
            self.state = DecodeState::Utf16LowSurrogate { swap, high: value };
        } else if is_low_surrogate(value) {
            observer.unicode_decode_failed(unit, UnicodeError::InvalidUtf16Surrogate);
        } else {
            observer.unicode_decoded(value);
        }
    }

    fn utf16_low_surrogate<O: DecodeObserver + ?Sized>(
        &mut self,
        swap: bool,
        high: u32,
        unit: u32,
        observer: &mut O,
    ) {
        self.state = DecodeState::Utf16Unit { swap };
        let value = if swap { swap16(unit & 0xFFFF) } else { unit & 0xFFFF };
        if is_low_surrogate(value) {
            observer.unicode_decoded(combine_surrogates(high, value));
        } else {
            observer.unicode_decode_failed(unit, UnicodeError::InvalidUtf16Surrogate);
        }
    }

    fn utf32_unit<O: DecodeObserver + ?Sized>(&mut self, swap: bool, unit: u32, observer: &mut O) {
        let value = if swap { unit.swap_bytes() } else { unit };
        self.emit_checked(value, unit, observer);
    }

    fn emit_checked<O: DecodeObserver + ?Sized>(
        &mut self,
        code_point: u32,
        raw_unit: u32,
        observer: &mut O,
    ) {
        if is_scalar(code_point) {
            observer.unicode_decoded(code_point);
        } else {
            observer.unicode_decode_failed(raw_unit, UnicodeError::InvalidCode);
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(Encoding::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn collect(encoding: Encoding, bytes: &[u8]) -> Vec<Result<u32, UnicodeError>> {
        let mut out = Vec::new();
        let mut sink = |r: Result<u32, UnicodeError>| out.push(r);
        let mut decoder = Decoder::new(encoding);
        decoder.decode_bytes(bytes, &mut sink);
        out
    }

    #[test]
    fn ascii_passes_through() {
        assert_eq!(collect(Encoding::Utf8, b"Hi"), vec![Ok(0x48), Ok(0x69)]);
    }

    #[test]
    fn four_byte_sequence_decodes_grinning_face() {
        assert_eq!(
            collect(Encoding::Utf8, &[0xF0, 0x9F, 0x98, 0x80]),
            vec![Ok(0x1F600)]
        );
    }

    #[test]
    fn two_and_three_byte_sequences() {
        // U+00E9, U+20AC
        assert_eq!(
            collect(Encoding::Utf8, &[0xC3, 0xA9, 0xE2, 0x82, 0xAC]),
            vec![Ok(0xE9), Ok(0x20AC)]
        );
    }

    #[test]
    fn truncated_sequence_recovers() {
        // 0xE0 opens a 3-byte sequence; 'A' is not a continuation byte.
        // The error consumes 'A' and the following sequence still decodes.
        assert_eq!(
            collect(Encoding::Utf8, &[0xE0, 0x41, 0xC3, 0xA9]),
            vec![Err(UnicodeError::InvalidUtf8NextCode), Ok(0xE9)]
        );
    }

    #[test]
    fn bare_continuation_byte_is_a_first_code_error() {
        assert_eq!(
            collect(Encoding::Utf8, &[0x80, 0x42]),
            vec![Err(UnicodeError::InvalidUtf8FirstCode), Ok(0x42)]
        );
    }

    #[test]
    fn utf16_bom_selects_little_endian() {
        // FF FE is the swapped mark, then 'A' as 41 00.
        assert_eq!(
            collect(Encoding::Utf16, &[0xFF, 0xFE, 0x41, 0x00]),
            vec![Ok(0x41)]
        );
    }

    #[test]
    fn utf16_without_bom_defaults_to_big_endian() {
        assert_eq!(
            collect(Encoding::Utf16, &[0x00, 0x41, 0x00, 0x42]),
            vec![Ok(0x41), Ok(0x42)]
        );
    }

    #[test]
    fn utf32_without_bom_defaults_to_big_endian() {
        // The first unit is not a byte order mark, so it must be replayed
        // as big-endian data rather than swallowed.
        assert_eq!(
            collect(
                Encoding::Utf32,
                &[0x00, 0x00, 0x00, 0x41, 0x00, 0x01, 0xF6, 0x00]
            ),
            vec![Ok(0x41), Ok(0x1F600)]
        );
    }

    #[test]
    fn utf16_surrogate_pair_combines() {
        // D83D DE00 big-endian.
        assert_eq!(
            collect(Encoding::Utf16Be, &[0xD8, 0x3D, 0xDE, 0x00]),
            vec![Ok(0x1F600)]
        );
    }

    #[test]
    fn lone_low_surrogate_is_rejected() {
        assert_eq!(
            collect(Encoding::Utf16Be, &[0xDE, 0x00, 0x00, 0x41]),
            vec![Err(UnicodeError::InvalidUtf16Surrogate), Ok(0x41)]
        );
    }

    #[test]
    fn high_surrogate_followed_by_scalar_is_rejected() {
        assert_eq!(
            collect(Encoding::Utf16Be, &[0xD8, 0x3D, 0x00, 0x41]),
            vec![Err(UnicodeError::InvalidUtf16Surrogate), Ok(0x41)]
        );
    }

    #[test]
    fn utf32_bom_and_swap() {
        // Swapped mark then U+1F600 little-endian.
        assert_eq!(
            collect(Encoding::Utf32, &[0xFF, 0xFE, 0x00, 0x00, 0x00, 0xF6, 0x01, 0x00]),
            vec![Ok(0x1F600)]
        );
    }

    #[test]
    fn utf32_out_of_range_value() {
        assert_eq!(
            collect(Encoding::Utf32Be, &[0x00, 0x11, 0x00, 0x00]),
            vec![Err(UnicodeError::InvalidCode)]
        );
    }

    #[test]
    fn chunk_boundary_inside_a_unit() {
        let mut out = Vec::new();
        let mut sink = |r: Result<u32, UnicodeError>| out.push(r);
        let mut decoder = Decoder::new(Encoding::Utf16Be);
        decoder.decode_bytes(&[0x00], &mut sink);
        decoder.decode_bytes(&[0x41], &mut sink);
        assert_eq!(out, vec![Ok(0x41)]);
    }

    #[test]
    fn reset_restores_bom_detection() {
        let mut out = Vec::new();
        let mut sink = |r: Result<u32, UnicodeError>| out.push(r);
        let mut decoder = Decoder::new(Encoding::Utf16);
        decoder.decode_bytes(&[0xFF, 0xFE, 0x41, 0x00], &mut sink);
        decoder.reset();
        decoder.decode_bytes(&[0x00, 0x42], &mut sink);
        assert_eq!(out, vec![Ok(0x41), Ok(0x42)]);
    }
}
