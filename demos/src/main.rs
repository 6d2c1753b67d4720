// SPDX-License-Identifier: Apache-2.0

// Parse a configuration document and walk the resulting tree.

use nanojson::{parse, ParseError, ValueData};

fn main() -> Result<(), ParseError> {
    env_logger::init();

    let json = r#"
    {
        "device": "th-probe",
        "interval_ms": 250,
        "channels": [0, 1, 4],
        "enabled": true
    }
    "#;

    let doc = parse(json.as_bytes())?;
    println!("Input: {}", json.trim());
    println!();

    let Some(config) = doc.as_object() else {
        println!("expected an object at the root");
        return Ok(());
    };
    for (name, value) in config.iter() {
        match value.data() {
            ValueData::Null => println!("{name}: null"),
            ValueData::Bool(b) => println!("{name}: {b}"),
            ValueData::Number(n) => println!("{name}: {n:?}"),
            ValueData::String(s) => println!("{name}: \"{s}\""),
            ValueData::Array(a) => println!("{name}: array with {} elements", a.len()),
            ValueData::Object(o) => println!("{name}: object with {} members", o.len()),
        }
    }

    let channels = config.get("channels").and_then(|v| v.as_array());
    if let Some(channels) = channels {
        print!("channel list:");
        for ch in channels.iter() {
            if let Some(n) = ch.as_i64() {
                print!(" {n}");
            }
        }
        println!();
    }
    Ok(())
}
