//! Property tests for canonical text round-trips
//!
//! A term or triple printed in its canonical form and parsed back must yield
//! the very same interned handle.


use generators::*;
use proptest::prelude::*;
use rdfquery::{parse_term, parse_triple, Position, TermContext, TermId, TermPool};

fn build(pool: &mut TermPool, spec: &TermSpec) -> TermId {
    match spec {
        TermSpec::Resource(iri) => pool.iri(iri.clone()),
        TermSpec::Blank(id) => pool.blank(&format!("_:{}", id)).unwrap(),
        TermSpec::Plain(value) => pool.literal_plain(value.clone()),
        TermSpec::Lang(value, lang) => pool.literal_lang(value.clone(), lang.clone()),
        TermSpec::Integer(n) => pool.literal_integer(*n),
        TermSpec::Bool(b) => pool.literal_bool(*b),
    }
}

proptest! {
    #[test]
    fn term_text_roundtrips(spec in arb_term_spec()) {
        let mut pool = TermPool::new();
        let ctx = TermContext::default();
        let id = build(&mut pool, &spec);
        let text = pool.term(id).to_string();

        let reparsed = parse_term(&mut pool, &text, Position::Object, &ctx).unwrap();
        prop_assert_eq!(reparsed, id, "text was {}", text);
    }

    #[test]
    fn triple_text_roundtrips(
        subject in arb_node_spec(),
        predicate in arb_iri(),
        object in arb_term_spec(),
    ) {
        let mut pool = TermPool::new();
        let ctx = TermContext::default();
        let s = build(&mut pool, &subject);
        let p = pool.iri(predicate);
        let o = build(&mut pool, &object);
        let id = pool.triple(s, p, o, None).unwrap();
        let text = pool.triple_text(id);

        let reparsed = parse_triple(&mut pool, &text, &ctx).unwrap();
        prop_assert_eq!(reparsed, id, "text was {}", text);
        prop_assert_eq!(pool.triple_count(), 1);
    }

    #[test]
    fn interning_is_idempotent(spec in arb_term_spec()) {
        let mut pool = TermPool::new();
        let first = build(&mut pool, &spec);
        let size = pool.len();
        let second = build(&mut pool, &spec);
        prop_assert_eq!(first, second);
        prop_assert_eq!(pool.len(), size);
    }
}
