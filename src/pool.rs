//! The term and triple pool.
//!
//! Every term and triple in a session is interned here, so that two values
//! with the same canonical text share one handle:
//! - `intern(term)` → TermId (get or create)
//! - `term(id)` → &Term
//! - `lookup(&term)` → Option<TermId>
//!
//! A pool is owned by one [`Store`](crate::store::Store) and lives as long as
//! it does. Nothing is ever evicted. Separate stores have separate pools, so
//! handles must not be mixed between them.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::datatype::DatatypeRegistry;
use crate::error::{Error, Result};
use crate::id::{NumericId, TermId, TripleId};
use crate::resolve::{CurieResolver, IriResolver, PrefixExpander, Rfc3986Resolver, TermContext};
use crate::term::{Literal, Term, TermKind, RDF_TYPE, XSD_BOOLEAN, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER};
use crate::triple::Triple;

/// `"value"`, `"""value"""`, optionally followed by `@lang` or `^^datatype`.
const LITERAL_SYNTAX: &str = r#"(?s)^(?:"""(?P<long>(?:\\"|[^"])*)"""|"(?P<short>(?:\\"|[^"])*)")(?:@(?P<lang>[a-zA-Z]+(?:-[a-zA-Z0-9]+)*)|\^\^(?P<datatype>.+))?$"#;

#[derive(Debug, Clone, Default)]
pub struct PoolConfig {
    /// Starting point of the fresh blank-node counter. Defaults to the wall
    /// clock in milliseconds, modulo 1000.
    pub blank_seed: Option<u64>,
}

/// Language tag or datatype for [`TermPool::literal`]; at most one may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiteralOptions {
    pub lang: Option<String>,
    pub datatype: Option<String>,
}

impl LiteralOptions {
    pub fn lang(lang: impl Into<String>) -> Self {
        Self {
            lang: Some(lang.into()),
            datatype: None,
        }
    }

    pub fn datatype(datatype: impl Into<String>) -> Self {
        Self {
            lang: None,
            datatype: Some(datatype.into()),
        }
    }
}

pub struct TermPool {
    /// TermId → Term (and via IndexSet, Term → TermId)
    terms: IndexSet<Term>,
    /// TripleId → (Triple, provenance of its first construction)
    triples: IndexMap<Triple, Option<String>>,
    next_blank: u64,
    iri_resolver: Box<dyn IriResolver>,
    curie_resolver: Box<dyn CurieResolver>,
    datatypes: DatatypeRegistry,
    literal_syntax: Regex,
}

impl TermPool {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        let seed = config.blank_seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| (d.as_millis() % 1000) as u64)
                .unwrap_or(0)
        });
        Self {
            terms: IndexSet::new(),
            triples: IndexMap::new(),
            next_blank: seed,
            iri_resolver: Box::new(Rfc3986Resolver),
            curie_resolver: Box::new(PrefixExpander),
            datatypes: DatatypeRegistry::new(),
            literal_syntax: Regex::new(LITERAL_SYNTAX).expect("literal syntax pattern compiles"),
        }
    }

    /// Replace the IRI-base resolver.
    pub fn with_iri_resolver(mut self, resolver: impl IriResolver + 'static) -> Self {
        self.iri_resolver = Box::new(resolver);
        self
    }

    /// Replace the compact-name resolver.
    pub fn with_curie_resolver(mut self, resolver: impl CurieResolver + 'static) -> Self {
        self.curie_resolver = Box::new(resolver);
        self
    }

    pub fn datatypes(&self) -> &DatatypeRegistry {
        &self.datatypes
    }

    pub fn datatypes_mut(&mut self) -> &mut DatatypeRegistry {
        &mut self.datatypes
    }

    // ------------------------------------------------------------------
    // Interning
    // ------------------------------------------------------------------

    /// Intern a term, returning its TermId (creating if new)
    pub fn intern(&mut self, term: Term) -> TermId {
        let (idx, _) = self.terms.insert_full(term);
        TermId::from_usize(idx)
    }

    /// Look up the TermId for a term (if known)
    pub fn lookup(&self, term: &Term) -> Option<TermId> {
        self.terms.get_index_of(term).map(TermId::from_usize)
    }

    pub fn get(&self, id: TermId) -> Option<&Term> {
        self.terms.get_index(id.index())
    }

    /// The term behind a handle issued by this pool.
    ///
    /// Panics on a handle from another pool.
    pub fn term(&self, id: TermId) -> &Term {
        &self.terms[id.index()]
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &Term)> + '_ {
        self.terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (TermId::from_usize(idx), term))
    }

    // ------------------------------------------------------------------
    // Resources and blanks
    // ------------------------------------------------------------------

    /// Intern an already-absolute IRI without any parsing.
    pub fn iri(&mut self, iri: impl Into<String>) -> TermId {
        self.intern(Term::resource(iri))
    }

    pub fn rdf_type(&mut self) -> TermId {
        self.iri(RDF_TYPE)
    }

    /// Build a resource from `<iri>` (resolved against the context base),
    /// `:local`, `prefix:` or `prefix:local`.
    pub fn resource(&mut self, text: &str, ctx: &TermContext) -> Result<TermId> {
        let iri = self.resource_iri(text, ctx)?;
        Ok(self.iri(iri))
    }

    /// Expand resource text to an absolute IRI without interning it.
    pub fn resource_iri(&self, text: &str, ctx: &TermContext) -> Result<String> {
        if let Some(inner) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            let reference = inner.replace("\\>", ">");
            return Ok(self.iri_resolver.resolve(&reference, &ctx.base));
        }
        self.curie_resolver.expand(text, &ctx.namespaces)
    }

    /// Build a blank node from `_:id`, or a fresh one from `[]`.
    pub fn blank(&mut self, text: &str) -> Result<TermId> {
        if text == "[]" {
            return Ok(self.fresh_blank());
        }
        match text.strip_prefix("_:") {
            Some(id) if !id.is_empty() => Ok(self.intern(Term::blank(id))),
            _ => Err(Error::malformed_term(format!(
                "{:?} is not a legal format for a blank node",
                text
            ))),
        }
    }

    /// Allocate a blank node whose id has not been used in this pool.
    pub fn fresh_blank(&mut self) -> TermId {
        loop {
            self.next_blank += 1;
            let candidate = Term::blank(format!("b{:x}", self.next_blank));
            if self.lookup(&candidate).is_none() {
                return self.intern(candidate);
            }
        }
    }

    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------

    /// Build a literal.
    ///
    /// With a datatype, `value` is the lexical form and is validated and
    /// canonicalized by the datatype registry. With a language, it is the
    /// plain value. With neither, `value` is literal syntax: a boolean or
    /// number, or a quoted string with an optional `@lang` / `^^datatype`.
    pub fn literal(&mut self, value: &str, opts: &LiteralOptions, ctx: &TermContext) -> Result<TermId> {
        let literal = match (&opts.lang, &opts.datatype) {
            (Some(lang), Some(datatype)) => {
                return Err(Error::ConflictingLiteralOptions {
                    value: value.to_string(),
                    lang: lang.clone(),
                    datatype: datatype.clone(),
                })
            }
            (None, Some(datatype)) => {
                let datatype = self.datatype_iri(datatype, ctx)?;
                let canonical = self.datatypes.canonicalize(value, &datatype)?;
                Literal::typed(canonical, datatype)
            }
            (Some(lang), None) => Literal::lang(value, lang.clone()),
            (None, None) => self.parse_literal(value, ctx)?,
        };
        Ok(self.intern(Term::Literal(literal)))
    }

    pub fn literal_plain(&mut self, value: impl Into<String>) -> TermId {
        self.intern(Term::Literal(Literal::plain(value)))
    }

    pub fn literal_lang(&mut self, value: impl Into<String>, lang: impl Into<String>) -> TermId {
        self.intern(Term::Literal(Literal::lang(value, lang)))
    }

    /// A typed literal from an absolute datatype IRI.
    pub fn literal_typed(&mut self, value: &str, datatype: &str) -> Result<TermId> {
        let canonical = self.datatypes.canonicalize(value, datatype)?;
        Ok(self.intern(Term::Literal(Literal::typed(canonical, datatype))))
    }

    pub fn literal_bool(&mut self, value: bool) -> TermId {
        self.intern(Term::Literal(Literal::typed(value.to_string(), XSD_BOOLEAN)))
    }

    pub fn literal_integer(&mut self, value: i64) -> TermId {
        self.intern(Term::Literal(Literal::typed(value.to_string(), XSD_INTEGER)))
    }

    pub fn literal_double(&mut self, value: f64) -> TermId {
        let lexical = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            let lexical = if value > 0.0 { "INF" } else { "-INF" };
            lexical.to_string()
        } else {
            format!("{:?}", value)
        };
        self.intern(Term::Literal(Literal::typed(lexical, XSD_DOUBLE)))
    }

    fn datatype_iri(&self, datatype: &str, ctx: &TermContext) -> Result<String> {
        if datatype.starts_with('<') {
            return self.resource_iri(datatype, ctx);
        }
        match datatype.split_once(':') {
            Some((prefix, _)) if ctx.namespaces.contains_key(prefix) => {
                self.curie_resolver.expand(datatype, &ctx.namespaces)
            }
            _ => Ok(datatype.to_string()),
        }
    }

    fn lexically(&self, text: &str, datatype: &str) -> bool {
        self.datatypes
            .handler(datatype)
            .is_some_and(|h| h.is_valid(text))
    }

    fn parse_literal(&self, text: &str, ctx: &TermContext) -> Result<Literal> {
        if text == "true" || text == "false" {
            return Ok(Literal::typed(text, XSD_BOOLEAN));
        }
        for datatype in [XSD_INTEGER, XSD_DECIMAL] {
            if self.lexically(text, datatype) {
                let canonical = self.datatypes.canonicalize(text, datatype)?;
                return Ok(Literal::typed(canonical, datatype));
            }
        }
        // INF and NaN have no bare form in Turtle
        let special = matches!(text.trim(), "INF" | "-INF" | "+INF" | "NaN");
        if !special && self.lexically(text, XSD_DOUBLE) {
            let canonical = self.datatypes.canonicalize(text, XSD_DOUBLE)?;
            return Ok(Literal::typed(canonical, XSD_DOUBLE));
        }

        let Some(caps) = self.literal_syntax.captures(text) else {
            return Err(Error::malformed_term(format!(
                "couldn't recognise the literal {}",
                text
            )));
        };
        let body = caps
            .name("long")
            .or_else(|| caps.name("short"))
            .map_or("", |m| m.as_str());
        let value = body.replace("\\\"", "\"");

        if let Some(datatype) = caps.name("datatype") {
            let datatype = self.resource_iri(datatype.as_str(), ctx)?;
            let canonical = self.datatypes.canonicalize(&value, &datatype)?;
            Ok(Literal::typed(canonical, datatype))
        } else if let Some(lang) = caps.name("lang") {
            Ok(Literal::lang(value, lang.as_str()))
        } else {
            Ok(Literal::plain(value))
        }
    }

    // ------------------------------------------------------------------
    // Triples
    // ------------------------------------------------------------------

    /// Intern a triple over existing terms.
    ///
    /// The first construction's `source` is kept as provenance; later
    /// constructions of the same triple return the same id and leave it alone.
    pub fn triple(
        &mut self,
        subject: TermId,
        predicate: TermId,
        object: TermId,
        source: Option<&str>,
    ) -> Result<TripleId> {
        if self.term(subject).kind() == TermKind::Literal {
            return Err(Error::malformed_triple(format!(
                "subject {} is a literal",
                self.term(subject)
            )));
        }
        if self.term(predicate).kind() != TermKind::Resource {
            return Err(Error::malformed_triple(format!(
                "predicate {} is not a resource",
                self.term(predicate)
            )));
        }

        let triple = Triple::new(subject, predicate, object);
        let idx = match self.triples.get_index_of(&triple) {
            Some(idx) => idx,
            None => {
                self.triples
                    .insert_full(triple, source.map(str::to_string))
                    .0
            }
        };
        Ok(TripleId::from_usize(idx))
    }

    pub fn lookup_triple(&self, triple: &Triple) -> Option<TripleId> {
        self.triples.get_index_of(triple).map(TripleId::from_usize)
    }

    /// The triple behind a handle issued by this pool.
    ///
    /// Panics on a handle from another pool.
    pub fn triple_at(&self, id: TripleId) -> Triple {
        let (triple, _) = self
            .triples
            .get_index(id.index())
            .expect("triple id issued by another pool");
        *triple
    }

    /// Provenance recorded when the triple was first built.
    pub fn source(&self, id: TripleId) -> Option<&str> {
        self.triples
            .get_index(id.index())
            .and_then(|(_, source)| source.as_deref())
    }

    pub fn triple_count(&self) -> usize {
        self.triples.len()
    }

    /// Canonical text: `subject predicate object .`
    pub fn triple_text(&self, id: TripleId) -> String {
        let t = self.triple_at(id);
        format!(
            "{} {} {} .",
            self.term(t.subject),
            self.term(t.predicate),
            self.term(t.object)
        )
    }
}

impl Default for TermPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TermPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermPool")
            .field("terms", &self.terms.len())
            .field("triples", &self.triples.len())
            .field("next_blank", &self.next_blank)
            .finish()
    }
}
