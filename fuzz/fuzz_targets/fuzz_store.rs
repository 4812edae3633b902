//! Fuzz the store and its query network
//!
//! Each input line is either a pattern (`?` somewhere in it), which extends
//! the current query, or a triple, which is added to the databank. Neither
//! may panic, and the final rows must render.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rdfquery::{DatabankOptions, Store, WhereOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut store = Store::new();
        let bank = store.databank([], DatabankOptions::default().prefix("ex", "http://example.org/"));
        let mut query = store.top(bank);

        for (i, line) in input.lines().enumerate() {
            if line.contains('?') {
                let opts = WhereOptions {
                    optional: i % 2 == 1,
                    ..WhereOptions::default()
                };
                if let Ok(q) = store.where_(query, line, opts) {
                    query = q;
                }
            } else {
                let _ = store.add(bank, line);
            }
        }

        let _ = store.table(query);
    }
});
