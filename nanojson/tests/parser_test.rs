// SPDX-License-Identifier: Apache-2.0

//! End-to-end parsing: bytes in, navigable documents out.

use nanojson::{
    parse, parse_in, BlockAllocator, Encoding, ParseError, Parser, PoolAllocator, UnicodeError,
};
use test_log::test;

const CONFIG: &str = r#"
{
    "device": "th-probe",
    "interval_ms": 250,
    "calibration": { "offset": -0.35, "gain": 1.002 },
    "channels": [0, 1, 4],
    "labels": ["temp °C", "rh %"],
    "enabled": true,
    "comment": null
}
"#;

#[test]
fn realistic_document_via_the_global_allocator() {
    let doc = parse(CONFIG.as_bytes()).unwrap();
    let obj = doc.as_object().unwrap();
    assert_eq!(obj.get("device").unwrap().as_str(), Some("th-probe"));
    assert_eq!(obj.get("interval_ms").unwrap().as_i64(), Some(250));
    let cal = obj.get("calibration").unwrap().as_object().unwrap();
    assert_eq!(cal.get("offset").unwrap().as_f64(), Some(-0.35));
    let channels = obj.get("channels").unwrap().as_array().unwrap();
    assert_eq!(channels.len(), 3);
    assert_eq!(channels.get(2).unwrap().as_i64(), Some(4));
    let labels = obj.get("labels").unwrap().as_array().unwrap();
    assert_eq!(labels.get(0).unwrap().as_str(), Some("temp \u{b0}C"));
    assert!(obj.get("comment").unwrap().is_null());
}

#[test]
fn pool_backed_parse_frees_on_drop() {
    let mut mem = [0u8; 8192];
    let pool = PoolAllocator::new(&mut mem);
    {
        let doc = parse_in(CONFIG.as_bytes(), &pool).unwrap();
        assert!(doc.is_object());
        assert!(!pool.empty());
    }
    assert!(pool.empty());
}

#[test]
fn block_backed_parse_releases_blocks() {
    let alloc = BlockAllocator::with_block_size(512);
    {
        let doc = parse_in(CONFIG.as_bytes(), &alloc).unwrap();
        assert!(doc.as_object().unwrap().len() == 7);
        assert!(alloc.block_count() > 0);
    }
    assert_eq!(alloc.block_count(), 0);
}

#[test]
fn one_byte_at_a_time() {
    let mut mem = [0u8; 8192];
    let pool = PoolAllocator::new(&mut mem);
    let mut parser = Parser::new_in(&pool);
    for byte in CONFIG.as_bytes() {
        parser.feed(core::slice::from_ref(byte)).unwrap();
    }
    let doc = parser.finish().unwrap();
    assert_eq!(doc.as_object().unwrap().len(), 7);
}

#[test]
fn utf16_document_with_byte_order_mark() {
    let mut mem = [0u8; 4096];
    let pool = PoolAllocator::new(&mut mem);
    let mut bytes = vec![0xFF, 0xFE]; // little-endian mark
    for unit in r#"{"k": [true]}"#.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let mut parser = Parser::with_encoding_in(Encoding::Utf16, &pool);
    parser.feed(&bytes).unwrap();
    let doc = parser.finish().unwrap();
    let k = doc.as_object().unwrap().get("k").unwrap();
    assert_eq!(k.as_array().unwrap().first().unwrap().as_bool(), Some(true));
}

#[test]
fn errors_carry_positions() {
    let mut mem = [0u8; 2048];
    let pool = PoolAllocator::new(&mut mem);
    match parse_in(b"[1, x]", &pool).unwrap_err() {
        ParseError::UnexpectedCharacter {
            character,
            position,
        } => {
            assert_eq!(character, 'x');
            assert_eq!(position, 5);
        }
        other => panic!("wrong error: {other:?}"),
    }
}

#[test]
fn bad_encoding_stops_the_parse() {
    let mut mem = [0u8; 2048];
    let pool = PoolAllocator::new(&mut mem);
    assert_eq!(
        parse_in(&[0x5B, 0xFF, 0x5D], &pool).unwrap_err(),
        ParseError::InvalidUnicode(UnicodeError::InvalidUtf8FirstCode)
    );
}

#[test]
fn failed_parse_leaves_the_pool_empty() {
    let mut mem = [0u8; 4096];
    let pool = PoolAllocator::new(&mut mem);
    assert!(parse_in(br#"{"a": [1, 2, oops"#, &pool).is_err());
    assert!(pool.empty());
}
