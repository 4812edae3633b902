//! Fuzz the triple and pattern parsers
//!
//! This target exercises the lexer, term classification and literal
//! recognition to find edge cases and potential panics.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rdfquery::{parse_pattern, parse_triple, TermContext, TermPool};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut pool = TermPool::new();
        let ctx = TermContext::new("http://example.org/").with_prefix("ex", "http://example.org/");

        // Malformed text must come back as an error, and its report must render
        if let Err(e) = parse_triple(&mut pool, input, &ctx) {
            let _ = e.report();
        }
        if let Err(e) = parse_pattern(&mut pool, input, &ctx) {
            let _ = e.report();
        }
    }
});
