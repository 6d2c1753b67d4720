// SPDX-License-Identifier: Apache-2.0

// Transcode a UTF-8 string to UTF-16LE (with byte-order mark) and decode
// it back, one unit at a time.

use nanojson::unicode::{Decoder, Encoder};
use nanojson::{Encoding, UnicodeError};

fn main() {
    env_logger::init();

    let text = "gr\u{00fc}n \u{1F600}";
    println!("input: {text}");

    let encoder = Encoder::new(Encoding::Utf16Le);
    let mut units: Vec<u32> = Vec::new();
    let mut collect = |r: Result<u32, UnicodeError>| match r {
        Ok(unit) => units.push(unit),
        Err(err) => println!("encode error: {err}"),
    };
    encoder.insert_byte_order_mark(&mut collect);
    for ch in text.chars() {
        encoder.encode(ch as u32, &mut collect);
    }
    drop(collect);

    print!("utf-16le units:");
    for unit in &units {
        print!(" {unit:04X}");
    }
    println!();

    // The mark was swapped with everything else, so the BOM-sensing
    // decoder picks little-endian up on its own.
    let mut decoder = Decoder::new(Encoding::Utf16);
    let mut round_trip = String::new();
    for &unit in &units {
        decoder.decode(unit, &mut |r: Result<u32, UnicodeError>| match r {
            Ok(cp) => {
                if let Some(ch) = char::from_u32(cp) {
                    round_trip.push(ch);
                }
            }
            Err(err) => println!("decode error: {err}"),
        });
    }
    println!("round trip: {round_trip}");
}
