// SPDX-License-Identifier: Apache-2.0

// Build a value tree by hand inside a fixed 1 KiB pool, with no heap
// involvement at any point.

use nanojson::{Document, PoolAllocator, Value};

fn main() {
    env_logger::init();

    let mut memory = [0u8; 1024];
    let pool = PoolAllocator::new(&mut memory);

    let mut root = Value::object_in(&pool);
    let Some(name) = Value::string_in("fixed-pool", &pool) else {
        println!("pool too small for the name");
        return;
    };
    root.insert("name", name);
    if let Some(readings) = root.insert("readings", Value::array_in(&pool)) {
        for n in [21, 22, 24] {
            readings.push(Value::from(n as i64));
        }
    }

    let Some(doc) = Document::new(root, &pool) else {
        println!("pool exhausted before the root could be pinned");
        return;
    };
    println!("tree: {:?}", doc);
    println!("pool capacity: {} bytes", pool.capacity());

    drop(doc);
    println!("pool empty after drop: {}", pool.empty());
}
