//! Databanks: append-only triple stores with query subscriptions.
//!
//! A plain databank keeps its triples in per-subject buckets (in insertion
//! order) and an index of the pattern-filtered query nodes that want to hear
//! about new triples. The index is keyed by which slots of the node's pattern
//! are bound; a new triple is offered to the nodes under each of the 8
//! bound/wildcard combinations of its own slots.
//!
//! A union databank owns nothing: it lists plain member databanks, reads
//! through to them and fans writes out to all of them.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::id::{BankId, NumericId, QueryId, TermId, TripleId};
use crate::pattern::IndexKey;
use crate::resolve::{Namespaces, TermContext};
use crate::triple::Triple;

/// Pattern-filtered query nodes subscribed to a databank.
#[derive(Debug, Default)]
pub struct QueryIndex {
    entries: HashMap<IndexKey, Vec<QueryId>>,
}

impl QueryIndex {
    pub fn register(&mut self, key: IndexKey, query: QueryId) {
        self.entries.entry(key).or_default().push(query);
    }

    /// Every node whose bound slots the triple satisfies.
    pub fn subscribers(&self, triple: &Triple) -> Vec<QueryId> {
        let mut out = Vec::new();
        for s in [Some(triple.subject), None] {
            for p in [Some(triple.predicate), None] {
                for o in [Some(triple.object), None] {
                    if let Some(queries) = self.entries.get(&(s, p, o)) {
                        out.extend(queries.iter().copied());
                    }
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Options for a new databank.
#[derive(Debug, Clone, Default)]
pub struct DatabankOptions {
    /// Base IRI for resolving relative references in text. Falls back to the
    /// store's default base.
    pub base: Option<String>,
    pub namespaces: Namespaces,
}

impl DatabankOptions {
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), namespace.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct TripleBank {
    /// subject → triples with that subject, in insertion order
    buckets: IndexMap<TermId, Vec<TripleId>>,
    len: usize,
    queries: QueryIndex,
    context: TermContext,
}

impl TripleBank {
    fn new(context: TermContext) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    fn contains(&self, id: TripleId, triple: &Triple) -> bool {
        self.buckets
            .get(&triple.subject)
            .is_some_and(|bucket| bucket.contains(&id))
    }

    /// Append a triple. Returns false if it was already present.
    fn insert(&mut self, id: TripleId, triple: &Triple) -> bool {
        let bucket = self.buckets.entry(triple.subject).or_default();
        if bucket.contains(&id) {
            return false;
        }
        bucket.push(id);
        self.len += 1;
        true
    }

    fn iter(&self) -> impl Iterator<Item = TripleId> + '_ {
        self.buckets.values().flatten().copied()
    }

    pub fn queries(&self) -> &QueryIndex {
        &self.queries
    }
}

#[derive(Debug)]
pub enum Databank {
    Plain(TripleBank),
    /// Plain member databanks; never nested.
    Union(Vec<BankId>),
}

/// All databanks of a store.
#[derive(Debug, Default)]
pub struct Databanks {
    banks: Vec<Databank>,
}

impl Databanks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, context: TermContext) -> BankId {
        self.push(Databank::Plain(TripleBank::new(context)))
    }

    fn push(&mut self, bank: Databank) -> BankId {
        let id = BankId::from_usize(self.banks.len());
        self.banks.push(bank);
        id
    }

    pub fn get(&self, id: BankId) -> &Databank {
        &self.banks[id.index()]
    }

    pub fn is_union(&self, id: BankId) -> bool {
        matches!(self.get(id), Databank::Union(_))
    }

    /// The plain databanks behind `id`: itself, or its union members.
    pub fn members(&self, id: BankId) -> Vec<BankId> {
        match self.get(id) {
            Databank::Plain(_) => vec![id],
            Databank::Union(members) => members.clone(),
        }
    }

    /// Lazily merge two databanks into a union, flattening existing unions.
    /// A union with the same members, in the same order, is reused.
    pub fn merge(&mut self, a: BankId, b: BankId) -> BankId {
        if a == b {
            return a;
        }
        let mut members = self.members(a);
        for member in self.members(b) {
            if !members.contains(&member) {
                members.push(member);
            }
        }
        if let [only] = members[..] {
            return only;
        }
        let existing = self
            .banks
            .iter()
            .position(|bank| matches!(bank, Databank::Union(m) if *m == members));
        if let Some(idx) = existing {
            return BankId::from_usize(idx);
        }
        let id = self.push(Databank::Union(members));
        debug!(union = ?id, left = ?a, right = ?b, "merged databanks");
        id
    }

    /// Subscribe a query node to triples matching `key`.
    pub fn register(&mut self, bank: BankId, key: IndexKey, query: QueryId) {
        for member in self.members(bank) {
            if let Databank::Plain(plain) = &mut self.banks[member.index()] {
                plain.queries.register(key, query);
            }
        }
    }

    /// Add a triple, returning the query nodes that must be told about it.
    /// Empty if every target databank already held the triple.
    pub fn insert(&mut self, bank: BankId, id: TripleId, triple: &Triple) -> Vec<QueryId> {
        let mut notify = Vec::new();
        for member in self.members(bank) {
            if let Databank::Plain(plain) = &mut self.banks[member.index()] {
                if plain.insert(id, triple) {
                    notify.extend(plain.queries.subscribers(triple));
                }
            }
        }
        notify
    }

    pub fn contains(&self, bank: BankId, id: TripleId, triple: &Triple) -> bool {
        self.members(bank).into_iter().any(|m| match self.get(m) {
            Databank::Plain(plain) => plain.contains(id, triple),
            Databank::Union(_) => false,
        })
    }

    /// All triples, bucket by bucket. A union concatenates its members and
    /// skips triples an earlier member already produced.
    pub fn triples(&self, bank: BankId) -> Box<dyn Iterator<Item = TripleId> + '_> {
        match self.get(bank) {
            Databank::Plain(plain) => Box::new(plain.iter()),
            Databank::Union(members) => {
                let mut seen = HashSet::new();
                Box::new(
                    members
                        .iter()
                        .flat_map(move |m| self.triples(*m))
                        .filter(move |t| seen.insert(*t)),
                )
            }
        }
    }

    pub fn len(&self, bank: BankId) -> usize {
        match self.get(bank) {
            Databank::Plain(plain) => plain.len,
            Databank::Union(_) => self.triples(bank).count(),
        }
    }

    /// Base and prefixes for parsing text against this databank. A union takes
    /// its base from the first member and merges all members' prefixes.
    pub fn context(&self, bank: BankId) -> TermContext {
        let mut contexts = self
            .members(bank)
            .into_iter()
            .filter_map(|m| match self.get(m) {
                Databank::Plain(plain) => Some(&plain.context),
                Databank::Union(_) => None,
            });
        let Some(first) = contexts.next() else {
            return TermContext::default();
        };
        let mut merged = first.clone();
        for ctx in contexts {
            for (prefix, ns) in &ctx.namespaces {
                merged
                    .namespaces
                    .entry(prefix.clone())
                    .or_insert_with(|| ns.clone());
            }
        }
        merged
    }

    pub fn set_base(&mut self, bank: BankId, base: &str) {
        for member in self.members(bank) {
            if let Databank::Plain(plain) = &mut self.banks[member.index()] {
                plain.context.base = base.to_string();
            }
        }
    }

    pub fn set_prefix(&mut self, bank: BankId, prefix: &str, namespace: &str) {
        for member in self.members(bank) {
            if let Databank::Plain(plain) = &mut self.banks[member.index()] {
                plain
                    .context
                    .namespaces
                    .insert(prefix.to_string(), namespace.to_string());
            }
        }
    }
}
