//! Triple patterns, matches, and the binding join.
//!
//! A pattern is a triple whose slots are either bound terms or variables:
//!
//! ```text
//! ?person <http://xmlns.com/foaf/0.1/knows> ?friend
//! ```
//!
//! Matching one triple against a pattern produces a [`Match`]: the variable
//! bindings plus the set of triples that justify them. Matches from different
//! patterns combine with [`Match::join`], which succeeds only when the shared
//! variables agree.

use std::collections::{BTreeMap, BTreeSet};

use crate::id::{TermId, TripleId};
use crate::triple::Triple;

/// Variable name → bound term.
pub type Bindings = BTreeMap<String, TermId>;

/// One slot of a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Bound(TermId),
    Var(String),
}

impl Slot {
    pub fn var(name: impl Into<String>) -> Self {
        Slot::Var(name.into())
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Slot::Var(name) => Some(name),
            Slot::Bound(_) => None,
        }
    }

    pub fn as_bound(&self) -> Option<TermId> {
        match self {
            Slot::Bound(id) => Some(*id),
            Slot::Var(_) => None,
        }
    }

    /// Fold `term` into `bindings` if it fits this slot.
    fn admit(&self, term: TermId, bindings: &mut Bindings) -> bool {
        match self {
            Slot::Bound(expected) => *expected == term,
            Slot::Var(name) => match bindings.get(name) {
                Some(existing) => *existing == term,
                None => {
                    bindings.insert(name.clone(), term);
                    true
                }
            },
        }
    }

    fn fill(&self, bindings: &Bindings) -> Option<TermId> {
        match self {
            Slot::Bound(id) => Some(*id),
            Slot::Var(name) => bindings.get(name).copied(),
        }
    }
}

impl From<TermId> for Slot {
    fn from(id: TermId) -> Self {
        Slot::Bound(id)
    }
}

/// Which slots of a pattern are bound, and to what. Used to key the databank's
/// query index; `None` is a wildcard.
pub type IndexKey = (Option<TermId>, Option<TermId>, Option<TermId>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub subject: Slot,
    pub predicate: Slot,
    pub object: Slot,
}

impl Pattern {
    pub fn new(subject: impl Into<Slot>, predicate: impl Into<Slot>, object: impl Into<Slot>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    pub fn slots(&self) -> [&Slot; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    pub fn index_key(&self) -> IndexKey {
        (
            self.subject.as_bound(),
            self.predicate.as_bound(),
            self.object.as_bound(),
        )
    }

    /// Distinct variable names, in slot order.
    pub fn variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = Vec::new();
        for name in self.slots().into_iter().filter_map(Slot::as_var) {
            if !vars.contains(&name) {
                vars.push(name);
            }
        }
        vars
    }

    pub fn is_ground(&self) -> bool {
        self.slots().iter().all(|s| s.as_bound().is_some())
    }

    /// Match a single triple. A variable that appears in several slots must
    /// take the same term in each of them.
    pub fn matches(&self, id: TripleId, triple: &Triple) -> Option<Match> {
        let mut bindings = Bindings::new();
        let admitted = self.subject.admit(triple.subject, &mut bindings)
            && self.predicate.admit(triple.predicate, &mut bindings)
            && self.object.admit(triple.object, &mut bindings);
        admitted.then(|| Match {
            bindings,
            triples: BTreeSet::from([id]),
        })
    }

    /// Substitute bindings into the pattern. Returns `None` if any variable is
    /// left unbound.
    pub fn fill(&self, bindings: &Bindings) -> Option<(TermId, TermId, TermId)> {
        Some((
            self.subject.fill(bindings)?,
            self.predicate.fill(bindings)?,
            self.object.fill(bindings)?,
        ))
    }
}

/// A row of a query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Match {
    pub bindings: Bindings,
    pub triples: BTreeSet<TripleId>,
}

impl Match {
    /// The empty match: no bindings, no triples. Identity for [`Match::join`].
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &str) -> Option<TermId> {
        self.bindings.get(var).copied()
    }

    /// Combine two matches whose shared variables agree.
    pub fn join(&self, other: &Match) -> Option<Match> {
        let compatible = other
            .bindings
            .iter()
            .all(|(name, term)| self.bindings.get(name).map_or(true, |t| t == term));
        if !compatible {
            return None;
        }
        let mut bindings = self.bindings.clone();
        bindings.extend(other.bindings.iter().map(|(k, v)| (k.clone(), *v)));
        let mut triples = self.triples.clone();
        triples.extend(other.triples.iter().copied());
        Some(Match { bindings, triples })
    }
}

/// `{ join(l, r) : l ∈ left, r ∈ right }`. With `optional`, a left row with no
/// compatible right row passes through unchanged.
pub fn join_all<'a>(
    left: &[Match],
    right: impl IntoIterator<Item = &'a Match> + Clone,
    optional: bool,
) -> Vec<Match> {
    let mut out = Vec::new();
    for l in left {
        let before = out.len();
        out.extend(right.clone().into_iter().filter_map(|r| l.join(r)));
        if optional && out.len() == before {
            out.push(l.clone());
        }
    }
    out
}
