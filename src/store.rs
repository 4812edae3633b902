//! The store: one term pool, its databanks, and the query network over them.
//!
//! Everything a caller touches is a handle (`TermId`, `TripleId`, `BankId`,
//! `QueryId`) issued by one `Store`. Adding a triple runs the whole dependent
//! network to completion before returning, so query rows are always current.

use std::env;

use indexmap::IndexSet;
use tracing::debug;

use crate::databank::{DatabankOptions, Databanks};
use crate::error::{Outer, Result};
use crate::filter::FilterInput;
use crate::id::{BankId, QueryId, TermId, TripleId};
use crate::network::Network;
use crate::parser::{parse_pattern, parse_term, parse_triple, Position};
use crate::pattern::{Bindings, Match, Pattern};
use crate::pool::{LiteralOptions, PoolConfig, TermPool};
use crate::pretty::Pretty;
use crate::resolve::{Namespaces, TermContext};
use crate::term::Term;

/// Environment variable holding the default base IRI.
pub const BASE_ENV: &str = "RDFQUERY_BASE";

#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub pool: PoolConfig,
    /// Base IRI for databanks created without one.
    pub default_base: String,
}

impl StoreConfig {
    /// Default configuration, with the base IRI taken from `RDFQUERY_BASE`
    /// when it is set.
    pub fn from_env() -> Self {
        Self {
            default_base: env::var(BASE_ENV).unwrap_or_default(),
            ..Self::default()
        }
    }
}

/// Something to add to a databank.
#[derive(Debug, Clone)]
pub enum Insert {
    Triple(TripleId),
    /// Triple text, parsed with the databank's base and prefixes.
    Text(String),
    /// Merge another databank in, producing a union.
    Databank(BankId),
}

impl From<TripleId> for Insert {
    fn from(id: TripleId) -> Self {
        Insert::Triple(id)
    }
}

impl From<&str> for Insert {
    fn from(text: &str) -> Self {
        Insert::Text(text.to_string())
    }
}

impl From<String> for Insert {
    fn from(text: String) -> Self {
        Insert::Text(text)
    }
}

impl From<BankId> for Insert {
    fn from(id: BankId) -> Self {
        Insert::Databank(id)
    }
}

#[derive(Debug, Clone)]
pub enum PatternSource {
    Text(String),
    Pattern(Pattern),
}

impl From<&str> for PatternSource {
    fn from(text: &str) -> Self {
        PatternSource::Text(text.to_string())
    }
}

impl From<String> for PatternSource {
    fn from(text: String) -> Self {
        PatternSource::Text(text)
    }
}

impl From<Pattern> for PatternSource {
    fn from(pattern: Pattern) -> Self {
        PatternSource::Pattern(pattern)
    }
}

/// Options for [`Store::where_`]. Base and prefixes are laid over the
/// databank's own when parsing pattern text.
#[derive(Debug, Clone, Default)]
pub struct WhereOptions {
    pub optional: bool,
    pub base: Option<String>,
    pub namespaces: Namespaces,
}

impl WhereOptions {
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Self::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), namespace.into());
        self
    }
}

#[derive(Debug)]
pub struct Store {
    config: StoreConfig,
    pool: TermPool,
    banks: Databanks,
    network: Network,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            pool: TermPool::with_config(config.pool.clone()),
            config,
            banks: Databanks::new(),
            network: Network::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn pool(&self) -> &TermPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut TermPool {
        &mut self.pool
    }

    pub fn banks(&self) -> &Databanks {
        &self.banks
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    // ------------------------------------------------------------------
    // Terms and triples
    // ------------------------------------------------------------------

    /// The context used for text outside any databank.
    pub fn default_context(&self) -> TermContext {
        TermContext::new(self.config.default_base.clone())
    }

    pub fn resource(&mut self, text: &str, ctx: &TermContext) -> Result<TermId> {
        self.pool.resource(text, ctx)
    }

    pub fn blank(&mut self, text: &str) -> Result<TermId> {
        self.pool.blank(text)
    }

    pub fn literal(&mut self, value: &str, opts: &LiteralOptions, ctx: &TermContext) -> Result<TermId> {
        self.pool.literal(value, opts, ctx)
    }

    pub fn parse_term(&mut self, token: &str, position: Position, ctx: &TermContext) -> Result<TermId> {
        parse_term(&mut self.pool, token, position, ctx)
    }

    pub fn term(&self, id: TermId) -> &Term {
        self.pool.term(id)
    }

    /// Intern a triple. `source` is recorded as its provenance if this is the
    /// first time the triple is built.
    pub fn triple(
        &mut self,
        subject: TermId,
        predicate: TermId,
        object: TermId,
        source: Option<&str>,
    ) -> Result<TripleId> {
        self.pool.triple(subject, predicate, object, source)
    }

    pub fn parse_triple(&mut self, text: &str, ctx: &TermContext) -> Result<TripleId> {
        parse_triple(&mut self.pool, text, ctx)
    }

    // ------------------------------------------------------------------
    // Databanks
    // ------------------------------------------------------------------

    pub fn databank(
        &mut self,
        initial: impl IntoIterator<Item = TripleId>,
        opts: DatabankOptions,
    ) -> BankId {
        let ctx = TermContext {
            base: opts.base.unwrap_or_else(|| self.config.default_base.clone()),
            namespaces: opts.namespaces,
        };
        let bank = self.banks.create(ctx);
        for id in initial {
            self.add_triple(bank, id);
        }
        debug!(?bank, triples = self.banks.len(bank), "created databank");
        bank
    }

    /// Add a triple, triple text, or another databank.
    ///
    /// Returns the databank to keep using: `bank` itself, or the union
    /// produced when merging in another databank.
    pub fn add(&mut self, bank: BankId, item: impl Into<Insert>) -> Result<BankId> {
        match item.into() {
            Insert::Triple(id) => self.add_triple(bank, id),
            Insert::Text(text) => {
                let ctx = self.banks.context(bank);
                let id = parse_triple(&mut self.pool, &text, &ctx)?;
                self.add_triple(bank, id);
            }
            Insert::Databank(other) => return Ok(self.banks.merge(bank, other)),
        }
        Ok(bank)
    }

    fn add_triple(&mut self, bank: BankId, id: TripleId) {
        let triple = self.pool.triple_at(id);
        for query in self.banks.insert(bank, id, &triple) {
            self.network.notify(query, id, &triple, &self.pool);
        }
    }

    pub fn bank_len(&self, bank: BankId) -> usize {
        self.banks.len(bank)
    }

    pub fn bank_triples(&self, bank: BankId) -> impl Iterator<Item = TripleId> + '_ {
        self.banks.triples(bank)
    }

    pub fn contains(&self, bank: BankId, id: TripleId) -> bool {
        self.banks.contains(bank, id, &self.pool.triple_at(id))
    }

    pub fn base(&self, bank: BankId) -> String {
        self.banks.context(bank).base
    }

    pub fn set_base(&mut self, bank: BankId, base: &str) {
        self.banks.set_base(bank, base);
    }

    pub fn prefix(&self, bank: BankId, prefix: &str) -> Option<String> {
        self.banks.context(bank).namespaces.get(prefix).cloned()
    }

    pub fn prefixes(&self, bank: BankId) -> Namespaces {
        self.banks.context(bank).namespaces
    }

    pub fn set_prefix(&mut self, bank: BankId, prefix: &str, namespace: &str) {
        self.banks.set_prefix(bank, prefix, namespace);
    }

    /// Base and prefixes for parsing text against `bank`.
    pub fn context(&self, bank: BankId) -> TermContext {
        self.banks.context(bank)
    }

    /// `[Databank with N triples]`
    pub fn describe(&self, bank: BankId) -> String {
        Pretty::describe_bank(self.banks.len(bank))
    }

    /// The databank as N-Triples text.
    pub fn dump(&self, bank: BankId) -> String {
        let mut pretty = Pretty::new();
        pretty.bank(&self.pool, self.banks.triples(bank));
        pretty.finish()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn top(&mut self, bank: BankId) -> QueryId {
        self.network.add_top(bank)
    }

    /// Narrow `q` to rows that also match `pattern`.
    pub fn where_(
        &mut self,
        q: QueryId,
        source: impl Into<PatternSource>,
        opts: WhereOptions,
    ) -> Result<QueryId> {
        let bank = self.network.node(q).bank();
        let pattern = match source.into() {
            PatternSource::Pattern(pattern) => pattern,
            PatternSource::Text(text) => {
                let ctx = self
                    .banks
                    .context(bank)
                    .overlay(opts.base.as_deref(), &opts.namespaces);
                parse_pattern(&mut self.pool, &text, &ctx)?
            }
        };

        let alpha: IndexSet<Match> = self
            .banks
            .triples(bank)
            .filter_map(|id| pattern.matches(id, &self.pool.triple_at(id)))
            .collect();
        let key = pattern.index_key();
        let id = self
            .network
            .add_pattern(q, pattern, opts.optional, alpha, &self.pool);
        self.banks.register(bank, key, id);
        Ok(id)
    }

    /// Extend rows of `q` with `pattern` where it matches, keeping them
    /// unchanged where it doesn't.
    pub fn optional(&mut self, q: QueryId, source: impl Into<PatternSource>) -> Result<QueryId> {
        self.where_(q, source, WhereOptions::optional())
    }

    pub fn filter(&mut self, q: QueryId, input: FilterInput) -> QueryId {
        self.network.add_predicate(q, input, &self.pool)
    }

    /// Rows of either query.
    ///
    /// Two queries over the same node give that node back. If either side is a
    /// top node, the result is a top node over the merged databanks. A union
    /// node on the left is extended in place, unless `b` is downstream of it:
    /// then a new union node is built so the union never feeds itself.
    pub fn union(&mut self, a: QueryId, b: QueryId) -> QueryId {
        if a == b {
            return a;
        }
        let (left, right) = (self.network.node(a), self.network.node(b));
        let bank = self.banks.merge(left.bank(), right.bank());
        if left.is_top() || right.is_top() {
            return self.network.add_top(bank);
        }
        if left.is_union() && !self.network.is_downstream(a, b) {
            self.network.extend_union(a, b, bank, &self.pool);
            return a;
        }
        self.network.add_union(&[a, b], bank, &self.pool)
    }

    /// Add one triple per row of `q`, built by filling `template` from the
    /// row. A template without variables is added once as is.
    ///
    /// All triples are built before any is added, so a template that can't
    /// be filled (say, a literal landing in subject position) adds nothing.
    pub fn insert(&mut self, q: QueryId, template: &str) -> Result<QueryId> {
        let bank = self.network.node(q).bank();
        let ctx = self.banks.context(bank);
        let pattern = parse_pattern(&mut self.pool, template, &ctx).map_err(|e| e.within(Outer::Triple))?;

        let fills: Vec<_> = if pattern.is_ground() {
            pattern.fill(&Bindings::new()).into_iter().collect()
        } else {
            self.network
                .rows(q)
                .iter()
                .filter_map(|row| pattern.fill(&row.bindings))
                .collect()
        };
        let source = template.trim();
        let triples = fills
            .into_iter()
            .map(|(s, p, o)| self.pool.triple(s, p, o, Some(source)))
            .collect::<Result<Vec<_>>>()?;

        debug!(query = ?q, triples = triples.len(), "template insert");
        for id in triples {
            self.add_triple(bank, id);
        }
        Ok(q)
    }

    /// The top node of the chain `q` belongs to. A union node is its own root.
    pub fn root(&self, q: QueryId) -> QueryId {
        let mut current = q;
        while let Some(parent) = self.network.node(current).parent() {
            current = parent;
        }
        current
    }

    /// The query `q` was built from, if any.
    pub fn end(&self, q: QueryId) -> Option<QueryId> {
        self.network.node(q).parent()
    }

    pub fn query_bank(&self, q: QueryId) -> BankId {
        self.network.node(q).bank()
    }

    // ------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------

    pub fn rows(&self, q: QueryId) -> impl Iterator<Item = &Match> + '_ {
        self.network.rows(q).iter()
    }

    pub fn row(&self, q: QueryId, n: usize) -> Option<&Match> {
        self.network.rows(q).get_index(n)
    }

    pub fn size(&self, q: QueryId) -> usize {
        self.network.rows(q).len()
    }

    pub fn bindings(&self, q: QueryId) -> Vec<Bindings> {
        self.rows(q).map(|row| row.bindings.clone()).collect()
    }

    /// The triples behind each row.
    pub fn triples(&self, q: QueryId) -> Vec<Vec<TripleId>> {
        self.rows(q)
            .map(|row| row.triples.iter().copied().collect())
            .collect()
    }

    /// The rows of `q` as a table, one column per variable.
    pub fn table(&self, q: QueryId) -> String {
        let mut pretty = Pretty::new();
        pretty.rows(&self.pool, self.network.rows(q));
        pretty.finish()
    }
}
