//! IRI-base resolution and compact-name expansion.
//!
//! Both are collaborators of the term pool rather than part of the store
//! proper: the pool calls them through the [`IriResolver`] and
//! [`CurieResolver`] traits, and a caller that needs stricter IRI handling can
//! plug in its own implementations.

use indexmap::IndexMap;
use oxiri::Iri;
use tracing::trace;

use crate::error::{Error, Result};

/// Namespace bindings: prefix → namespace IRI. The empty prefix is the default
/// namespace used by names like `:local`.
pub type Namespaces = IndexMap<String, String>;

/// The base IRI and prefix bindings in force while parsing text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermContext {
    pub base: String,
    pub namespaces: Namespaces,
}

impl TermContext {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            namespaces: Namespaces::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), namespace.into());
        self
    }

    /// Overlay `other` on top of this context: a non-empty base replaces ours,
    /// and its prefixes shadow ours.
    pub fn overlay(&self, base: Option<&str>, namespaces: &Namespaces) -> Self {
        let mut merged = self.clone();
        if let Some(base) = base {
            merged.base = base.to_string();
        }
        for (prefix, ns) in namespaces {
            merged.namespaces.insert(prefix.clone(), ns.clone());
        }
        merged
    }
}

/// Resolves a (possibly relative) reference against a base IRI.
pub trait IriResolver {
    fn resolve(&self, reference: &str, base: &str) -> String;
}

/// Expands a compact name `prefix:local` to a full IRI.
pub trait CurieResolver {
    fn expand(&self, name: &str, namespaces: &Namespaces) -> Result<String>;
}

/// Reference resolution following RFC 3986 §5.2, delegated to `oxiri`.
///
/// A base that is empty, relative or not a valid IRI leaves references
/// untouched. A reference `oxiri` rejects is still resolved, unvalidated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc3986Resolver;

/// Plain `prefix:local` expansion by string concatenation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixExpander;

impl IriResolver for Rfc3986Resolver {
    fn resolve(&self, reference: &str, base: &str) -> String {
        let Ok(base) = Iri::parse(base) else {
            return reference.to_string();
        };
        match base.resolve(reference) {
            Ok(resolved) => resolved.into_inner(),
            Err(err) => {
                // escaped characters like `\>` are not IRI characters
                trace!(reference, %err, "resolving reference without validation");
                base.resolve_unchecked(reference).into_inner()
            }
        }
    }
}

impl CurieResolver for PrefixExpander {
    fn expand(&self, name: &str, namespaces: &Namespaces) -> Result<String> {
        let Some((prefix, local)) = name.split_once(':') else {
            return Err(Error::malformed_term(format!(
                "{:?} is neither an IRI nor a compact name",
                name
            )));
        };
        match namespaces.get(prefix) {
            Some(ns) => Ok(format!("{}{}", ns, local)),
            None => Err(Error::UnboundPrefix {
                prefix: prefix.to_string(),
                name: name.to_string(),
            }),
        }
    }
}
