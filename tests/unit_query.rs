//! Unit tests for the query network: joins, optionals, filters and unions

use std::collections::BTreeSet;

use rdfquery::{
    BankId, Bindings, DatabankOptions, Error, FilterInput, FilterValue, Pattern, QueryId, Slot,
    Store, TermId, WhereOptions,
};

const EX: &str = "http://example.org/";

/// `RUST_LOG=rdfquery=trace` shows propagation through the network.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup() -> (Store, BankId) {
    init_tracing();
    let mut store = Store::new();
    let bank = store.databank([], DatabankOptions::default().base(EX).prefix("ex", EX));
    (store, bank)
}

fn add(store: &mut Store, bank: BankId, text: &str) {
    store.add(bank, text).unwrap();
}

fn where_(store: &mut Store, q: QueryId, text: &str) -> QueryId {
    store.where_(q, text, WhereOptions::default()).unwrap()
}

fn iri(store: &mut Store, local: &str) -> TermId {
    store.pool_mut().iri(format!("{}{}", EX, local))
}

/// Rows as sets of (var, lexical) pairs, so tests don't depend on row order.
fn rows(store: &Store, q: QueryId) -> BTreeSet<Vec<(String, String)>> {
    store
        .bindings(q)
        .into_iter()
        .map(|b| {
            b.into_iter()
                .map(|(var, id)| (var, store.term(id).lexical().to_string()))
                .collect()
        })
        .collect()
}

fn row(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut row: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    row.sort();
    row
}

#[test]
fn test_chained_join() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:knows ex:b");
    add(&mut store, bank, "ex:b ex:knows ex:c");

    let top = store.top(bank);
    let q1 = where_(&mut store, top, "?x ex:knows ?y");
    let q2 = where_(&mut store, q1, "?y ex:knows ?z");

    assert_eq!(store.size(q1), 2);
    assert_eq!(
        rows(&store, q2),
        BTreeSet::from([row(&[
            ("x", "http://example.org/a"),
            ("y", "http://example.org/b"),
            ("z", "http://example.org/c"),
        ])])
    );
    assert_eq!(store.triples(q2)[0].len(), 2);
}

#[test]
fn test_top_has_no_rows() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:knows ex:b");
    let top = store.top(bank);
    assert_eq!(store.size(top), 0);
    assert_eq!(store.root(top), top);
    assert_eq!(store.end(top), None);
}

#[test]
fn test_nodes_on_top_see_the_empty_match() {
    let (mut store, bank) = setup();
    let top = store.top(bank);

    // an optional pattern straight on top keeps the empty row until it matches
    let aged = store.optional(top, "?x ex:age ?a").unwrap();
    assert_eq!(store.size(aged), 1);
    assert!(store.row(aged, 0).unwrap().bindings.is_empty());

    // so does a filter that accepts the empty binding set
    let unfiltered = store.filter(top, FilterInput::func(|b: &Bindings, _| b.is_empty()));
    assert_eq!(store.size(unfiltered), 1);
    let bound = store.filter(top, FilterInput::equals("x", "anything"));
    assert_eq!(store.size(bound), 0);

    add(&mut store, bank, "ex:a ex:age 30");
    assert_eq!(store.size(aged), 1);
    let age = store.row(aged, 0).unwrap().get("a").unwrap();
    assert_eq!(store.term(age).lexical(), "30");
    assert_eq!(store.size(top), 0);
}

#[test]
fn test_query_sees_later_triples() {
    let (mut store, bank) = setup();
    let top = store.top(bank);
    let q1 = where_(&mut store, top, "?x ex:knows ?y");
    let q2 = where_(&mut store, q1, "?y ex:knows ?z");
    assert_eq!(store.size(q2), 0);

    add(&mut store, bank, "ex:b ex:knows ex:c");
    assert_eq!(store.size(q1), 1);
    assert_eq!(store.size(q2), 0);

    add(&mut store, bank, "ex:a ex:knows ex:b");
    assert_eq!(store.size(q1), 2);
    assert_eq!(store.size(q2), 1);
}

#[test]
fn test_optional_row_updates_in_place() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:name \"Ann\"");

    let top = store.top(bank);
    let named = where_(&mut store, top, "?x ex:name ?n");
    let aged = store.optional(named, "?x ex:age ?age").unwrap();
    assert_eq!(
        rows(&store, aged),
        BTreeSet::from([row(&[("n", "Ann"), ("x", "http://example.org/a")])])
    );

    add(&mut store, bank, "ex:a ex:age 30");
    assert_eq!(store.size(aged), 1);
    assert_eq!(
        rows(&store, aged),
        BTreeSet::from([row(&[
            ("age", "30"),
            ("n", "Ann"),
            ("x", "http://example.org/a"),
        ])])
    );
}

#[test]
fn test_optional_keeps_both_matches() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:name \"Ann\"");
    add(&mut store, bank, "ex:b ex:name \"Bob\"");
    add(&mut store, bank, "ex:a ex:mbox <mailto:a1>");

    let top = store.top(bank);
    let named = where_(&mut store, top, "?x ex:name ?n");
    let mboxed = store.optional(named, "?x ex:mbox ?m").unwrap();
    assert_eq!(store.size(mboxed), 2);

    add(&mut store, bank, "ex:a ex:mbox <mailto:a2>");
    assert_eq!(store.size(mboxed), 3);
    let bob_rows = store
        .bindings(mboxed)
        .into_iter()
        .filter(|b| !b.contains_key("m"))
        .count();
    assert_eq!(bob_rows, 1);
}

#[test]
fn test_optional_subtree_recomputes() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:name \"Ann\"");
    add(&mut store, bank, "ex:a ex:likes ex:tea");

    let top = store.top(bank);
    let named = where_(&mut store, top, "?x ex:name ?n");
    let aged = store.optional(named, "?x ex:age ?age").unwrap();
    let likes = where_(&mut store, aged, "?x ex:likes ?what");
    assert_eq!(store.size(likes), 1);
    assert!(store.row(likes, 0).unwrap().get("age").is_none());

    add(&mut store, bank, "ex:a ex:age 30");
    assert_eq!(store.size(likes), 1);
    assert!(store.row(likes, 0).unwrap().get("age").is_some());
}

#[test]
fn test_repeated_variable() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:knows ex:b");
    let top = store.top(bank);
    let selfish = where_(&mut store, top, "?x ex:knows ?x");
    assert_eq!(store.size(selfish), 0);

    add(&mut store, bank, "ex:a ex:knows ex:a");
    assert_eq!(
        rows(&store, selfish),
        BTreeSet::from([row(&[("x", "http://example.org/a")])])
    );
}

#[test]
fn test_incremental_insert_only_adds_new_joins() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:knows ex:b");
    add(&mut store, bank, "ex:b ex:knows ex:c");
    add(&mut store, bank, "ex:c ex:knows ex:d");
    let top = store.top(bank);
    let q1 = where_(&mut store, top, "?x ex:knows ?y");
    let q2 = where_(&mut store, q1, "?y ex:knows ?z");

    let before: Vec<_> = store.rows(q2).cloned().collect();
    assert_eq!(before.len(), 2);

    // joins with b→c on the left and with nothing on the right
    add(&mut store, bank, "ex:e ex:knows ex:b");
    let after: Vec<_> = store.rows(q2).cloned().collect();
    assert_eq!(after.len(), 3);
    assert_eq!(&after[..2], &before[..]);

    // already present: nothing changes
    add(&mut store, bank, "ex:e ex:knows ex:b");
    assert_eq!(store.size(q2), 3);
}

#[test]
fn test_structured_pattern_source() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:knows ex:b");
    let knows = iri(&mut store, "knows");
    let top = store.top(bank);
    let pattern = Pattern::new(Slot::var("s"), knows, Slot::var("o"));
    let q = store.where_(top, pattern, WhereOptions::default()).unwrap();
    assert_eq!(store.size(q), 1);
}

#[test]
fn test_where_options_prefixes() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a <http://xmlns.com/foaf/0.1/name> \"A\"");
    let top = store.top(bank);
    let opts = WhereOptions::default().prefix("foaf", "http://xmlns.com/foaf/0.1/");
    let q = store.where_(top, "?x foaf:name ?n", opts).unwrap();
    assert_eq!(store.size(q), 1);

    let err = store
        .where_(top, "?x foaf:name ?n", WhereOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::MalformedFilter { .. }));
}

#[test]
fn test_root_and_end() {
    let (mut store, bank) = setup();
    let top = store.top(bank);
    let q1 = where_(&mut store, top, "?x ex:p ?y");
    let q2 = where_(&mut store, q1, "?y ex:p ?z");
    assert_eq!(store.root(q2), top);
    assert_eq!(store.end(q2), Some(q1));
    assert_eq!(store.query_bank(q2), bank);
}

// ============================================================================
// Filters
// ============================================================================

fn people() -> (Store, BankId, QueryId) {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:ann ex:name \"Ann\"");
    add(&mut store, bank, "ex:bob ex:name \"Bob\"");
    add(&mut store, bank, "ex:amy ex:name \"Amy\"@en");
    let top = store.top(bank);
    let q = where_(&mut store, top, "?who ex:name ?name");
    (store, bank, q)
}

#[test]
fn test_filter_regex() {
    let (mut store, bank, q) = people();
    let filter = FilterInput::matches("name", "^A").unwrap();
    let f = store.filter(q, filter);
    assert_eq!(store.size(f), 2);

    add(&mut store, bank, "ex:al ex:name \"Al\"");
    add(&mut store, bank, "ex:cy ex:name \"Cy\"");
    assert_eq!(store.size(f), 3);
}

#[test]
fn test_filter_regex_on_resource_iri() {
    let (mut store, _, q) = people();
    let f = store.filter(q, FilterInput::matches("who", "/b").unwrap());
    assert_eq!(
        rows(&store, f),
        BTreeSet::from([row(&[("name", "Bob"), ("who", "http://example.org/bob")])])
    );
}

#[test]
fn test_filter_bad_regex() {
    assert!(matches!(
        FilterInput::matches("x", "("),
        Err(Error::MalformedFilter { .. })
    ));
}

#[test]
fn test_filter_unbound_variable_never_passes() {
    let (mut store, _, q) = people();
    let f = store.filter(q, FilterInput::matches("nope", ".*").unwrap());
    assert_eq!(store.size(f), 0);
    let g = store.filter(q, FilterInput::equals("nope", "Ann"));
    assert_eq!(store.size(g), 0);
}

#[test]
fn test_filter_equals() {
    let (mut store, _, q) = people();
    let by_text = store.filter(q, FilterInput::equals("name", "Amy"));
    assert_eq!(store.size(by_text), 1);

    let by_iri = store.filter(q, FilterInput::equals("who", "http://example.org/bob"));
    assert_eq!(store.size(by_iri), 1);

    let ann = iri(&mut store, "ann");
    let by_term = store.filter(q, FilterInput::equals("who", FilterValue::Term(ann)));
    assert_eq!(
        rows(&store, by_term),
        BTreeSet::from([row(&[("name", "Ann"), ("who", "http://example.org/ann")])])
    );
}

#[test]
fn test_filter_closure() {
    let (mut store, _, q) = people();
    let f = store.filter(
        q,
        FilterInput::func(|b: &Bindings, pool| {
            b.get("name")
                .and_then(|id| pool.term(*id).as_literal())
                .is_some_and(|lit| lit.lang.is_some())
        }),
    );
    assert_eq!(store.size(f), 1);
}

#[test]
fn test_filter_then_where() {
    let (mut store, bank, q) = people();
    let f = store.filter(q, FilterInput::matches("name", "^A").unwrap());
    let aged = where_(&mut store, f, "?who ex:age ?age");
    add(&mut store, bank, "ex:ann ex:age 30");
    add(&mut store, bank, "ex:bob ex:age 40");
    assert_eq!(
        rows(&store, aged),
        BTreeSet::from([row(&[
            ("age", "30"),
            ("name", "Ann"),
            ("who", "http://example.org/ann"),
        ])])
    );
}

// ============================================================================
// Unions
// ============================================================================

#[test]
fn test_union_of_independent_queries() {
    let mut store = Store::new();
    let opts = || DatabankOptions::default().prefix("ex", EX);
    let left = store.databank([], opts());
    let right = store.databank([], opts());
    add(&mut store, left, "ex:a ex:p ex:b");
    add(&mut store, left, "ex:c ex:p ex:d");
    add(&mut store, right, "ex:a ex:p ex:b");

    let lt = store.top(left);
    let rt = store.top(right);
    let lq = where_(&mut store, lt, "?s ex:p ?o");
    let rq = where_(&mut store, rt, "?s ex:p ?o");
    let both = store.union(lq, rq);
    assert_eq!(store.size(both), 2);
    assert!(store.banks().is_union(store.query_bank(both)));

    add(&mut store, right, "ex:e ex:p ex:f");
    assert_eq!(store.size(both), 3);
    add(&mut store, left, "ex:e ex:p ex:f");
    assert_eq!(store.size(both), 3);
    add(&mut store, left, "ex:g ex:p ex:h");
    assert_eq!(store.size(both), 4);
}

#[test]
fn test_union_with_itself() {
    let (mut store, bank) = setup();
    let top = store.top(bank);
    let q = where_(&mut store, top, "?s ex:p ?o");
    assert_eq!(store.union(q, q), q);
}

#[test]
fn test_union_extends_in_place() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:p ex:b");
    add(&mut store, bank, "ex:a ex:q ex:c");
    add(&mut store, bank, "ex:a ex:r ex:d");
    let top = store.top(bank);
    let p = where_(&mut store, top, "?s ex:p ?o");
    let q = where_(&mut store, top, "?s ex:q ?o");
    let r = where_(&mut store, top, "?s ex:r ?o");

    let pq = store.union(p, q);
    assert_eq!(store.size(pq), 2);
    let pqr = store.union(pq, r);
    assert_eq!(pqr, pq);
    assert_eq!(store.size(pqr), 3);
    assert_eq!(store.query_bank(pqr), bank);
}

#[test]
fn test_union_with_own_descendant_is_a_new_node() {
    let (mut store, bank) = setup();
    let top = store.top(bank);
    let p = where_(&mut store, top, "?s ex:p ?o");
    let q = where_(&mut store, top, "?s ex:q ?o");
    let pq = store.union(p, q);
    let chained = where_(&mut store, pq, "?o ex:r ?z");

    // extending pq with its own child would feed pq back into itself
    let both = store.union(pq, chained);
    assert_ne!(both, pq);

    add(&mut store, bank, "ex:a ex:p ex:b");
    add(&mut store, bank, "ex:b ex:r ex:c");
    assert_eq!(store.size(pq), 1);
    assert_eq!(store.size(chained), 1);
    assert_eq!(store.size(both), 2);
}

#[test]
fn test_union_feeds_children() {
    let (mut store, bank) = setup();
    let top = store.top(bank);
    let p = where_(&mut store, top, "?s ex:p ?o");
    let q = where_(&mut store, top, "?s ex:q ?o");
    let pq = store.union(p, q);
    let typed = where_(&mut store, pq, "?o a ex:Thing");

    add(&mut store, bank, "ex:a ex:p ex:b");
    add(&mut store, bank, "ex:c ex:q ex:d");
    assert_eq!(store.size(typed), 0);
    add(&mut store, bank, "ex:d a ex:Thing");
    assert_eq!(store.size(typed), 1);
}

#[test]
fn test_union_survives_optional_reset() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:name \"Ann\"");
    add(&mut store, bank, "ex:b ex:title \"Dr\"");
    let top = store.top(bank);
    let named = where_(&mut store, top, "?x ex:name ?n");
    let aged = store.optional(named, "?x ex:age ?age").unwrap();
    let titled = where_(&mut store, top, "?x ex:title ?n");
    let both = store.union(aged, titled);
    assert_eq!(store.size(both), 2);

    add(&mut store, bank, "ex:a ex:age 30");
    assert_eq!(store.size(both), 2);
    assert_eq!(
        store
            .bindings(both)
            .iter()
            .filter(|b| b.contains_key("age"))
            .count(),
        1
    );
}

#[test]
fn test_union_with_top_merges_databanks() {
    let mut store = Store::new();
    let opts = || DatabankOptions::default().prefix("ex", EX);
    let left = store.databank([], opts());
    let right = store.databank([], opts());
    add(&mut store, left, "ex:a ex:p ex:b");
    add(&mut store, right, "ex:c ex:p ex:d");
    let lt = store.top(left);
    let rt = store.top(right);

    let merged = store.union(lt, rt);
    assert_ne!(merged, lt);
    let bank = store.query_bank(merged);
    assert_eq!(store.bank_len(bank), 2);
    let q = where_(&mut store, merged, "?s ex:p ?o");
    assert_eq!(store.size(q), 2);
}

// ============================================================================
// Template insertion
// ============================================================================

#[test]
fn test_insert_one_triple_per_row() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:knows ex:b");
    add(&mut store, bank, "ex:b ex:knows ex:c");
    let top = store.top(bank);
    let q = where_(&mut store, top, "?x ex:knows ?y");
    let back = where_(&mut store, top, "?y ex:knownBy ?x");

    store.insert(q, "?y ex:knownBy ?x").unwrap();
    assert_eq!(store.bank_len(bank), 4);
    assert_eq!(store.size(back), 2);
}

#[test]
fn test_insert_ground_template() {
    let (mut store, bank) = setup();
    let top = store.top(bank);
    store.insert(top, "ex:a ex:p ex:b .").unwrap();
    assert_eq!(store.bank_len(bank), 1);
}

#[test]
fn test_insert_skips_rows_with_unbound_variables() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:name \"Ann\"");
    add(&mut store, bank, "ex:b ex:name \"Bob\"");
    add(&mut store, bank, "ex:a ex:age 30");
    let top = store.top(bank);
    let named = where_(&mut store, top, "?x ex:name ?n");
    let aged = store.optional(named, "?x ex:age ?age").unwrap();

    store.insert(aged, "?x ex:hasAge ?age").unwrap();
    assert_eq!(store.bank_len(bank), 4);
}

#[test]
fn test_insert_failure_adds_nothing() {
    let (mut store, bank) = setup();
    add(&mut store, bank, "ex:a ex:name \"Ann\"");
    let top = store.top(bank);
    let named = where_(&mut store, top, "?x ex:name ?n");

    let err = store.insert(named, "?n ex:nameOf ?x").unwrap_err();
    assert!(matches!(err, Error::MalformedTriple { .. }));
    assert_eq!(store.bank_len(bank), 1);

    let err = store.insert(named, "?x ex:p").unwrap_err();
    assert!(matches!(err, Error::MalformedTriple { .. }));
}

#[test]
fn test_rows_table() {
    let (store, _, q) = people();
    let table = store.table(q);
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("?name"));
}
