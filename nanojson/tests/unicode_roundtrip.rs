// SPDX-License-Identifier: Apache-2.0

//! Encoder/decoder round trips over the full scalar range.

use nanojson::unicode::{Decoder, Encoder};
use nanojson::{Encoding, UnicodeError};
use test_log::test;

fn scalars() -> impl Iterator<Item = u32> {
    (0..=0x10FFFFu32).filter(|cp| !(0xD800..=0xDFFF).contains(cp))
}

/// Pipe every scalar code point through encoder and decoder of the same
/// encoding and demand an identical, error-free sequence back. BOM-sensing
/// encodings get a byte-order mark up front, exercising that path too.
fn round_trip(encoding: Encoding) {
    let encoder = Encoder::new(encoding);
    let mut decoder = Decoder::new(encoding);
    let mut decoded: Vec<u32> = Vec::new();

    {
        let mut on_unit = |unit: Result<u32, UnicodeError>| {
            let unit = unit.expect("encode failed");
            decoder.decode(unit, &mut |cp: Result<u32, UnicodeError>| {
                decoded.push(cp.expect("decode failed"));
            });
        };
        if matches!(encoding, Encoding::Utf16 | Encoding::Utf32) {
            encoder.insert_byte_order_mark(&mut on_unit);
        }
        for cp in scalars() {
            encoder.encode(cp, &mut on_unit);
        }
    }

    assert!(decoded.iter().copied().eq(scalars()));
}

#[test]
fn utf8_round_trip() {
    round_trip(Encoding::Utf8);
}

#[test]
fn utf16_round_trip_with_byte_order_mark() {
    round_trip(Encoding::Utf16);
}

#[test]
fn utf16_fixed_order_round_trips() {
    round_trip(Encoding::Utf16Be);
    round_trip(Encoding::Utf16Le);
}

#[test]
fn utf32_round_trip_with_byte_order_mark() {
    round_trip(Encoding::Utf32);
}

#[test]
fn utf32_fixed_order_round_trips() {
    round_trip(Encoding::Utf32Be);
    round_trip(Encoding::Utf32Le);
}

/// The same trip taken at byte granularity: units written out
/// high-byte-first and reassembled by `decode_bytes`.
#[test]
fn byte_stream_round_trip() {
    let samples = [0x24u32, 0xA2, 0x939, 0x20AC, 0xD55C, 0x10348, 0x1F600, 0x10FFFF];
    for encoding in [
        Encoding::Utf8,
        Encoding::Utf16Be,
        Encoding::Utf16Le,
        Encoding::Utf32Be,
        Encoding::Utf32Le,
    ] {
        let encoder = Encoder::new(encoding);
        let width = encoding.unit_bytes();
        let mut bytes: Vec<u8> = Vec::new();
        {
            let mut on_unit = |unit: Result<u32, UnicodeError>| {
                let unit = unit.expect("encode failed");
                bytes.extend_from_slice(&unit.to_be_bytes()[4 - width..]);
            };
            for &cp in &samples {
                encoder.encode(cp, &mut on_unit);
            }
        }

        let mut decoded: Vec<u32> = Vec::new();
        let mut decoder = Decoder::new(encoding);
        decoder.decode_bytes(&bytes, &mut |cp: Result<u32, UnicodeError>| {
            decoded.push(cp.expect("decode failed"));
        });
        assert_eq!(decoded, samples, "{encoding:?}");
    }
}

#[test]
fn grinning_face_decodes_from_utf8_bytes() {
    let mut calls: Vec<Result<u32, UnicodeError>> = Vec::new();
    let mut decoder = Decoder::new(Encoding::Utf8);
    decoder.decode_bytes(
        &[0xF0, 0x9F, 0x98, 0x80],
        &mut |r: Result<u32, UnicodeError>| calls.push(r),
    );
    assert_eq!(calls, vec![Ok(0x1F600)]);
}

#[test]
fn truncated_utf8_recovers_mid_stream() {
    let mut calls: Vec<Result<u32, UnicodeError>> = Vec::new();
    let mut decoder = Decoder::new(Encoding::Utf8);
    decoder.decode_bytes(
        &[0xE0, 0x41, 0xF0, 0x9F, 0x98, 0x80, 0x42],
        &mut |r: Result<u32, UnicodeError>| calls.push(r),
    );
    assert_eq!(
        calls,
        vec![
            Err(UnicodeError::InvalidUtf8NextCode),
            Ok(0x1F600),
            Ok(0x42)
        ]
    );
}
