//! Triples: interned (subject, predicate, object) facts.

use crate::id::TermId;

/// A fact over interned terms.
///
/// Invariant (checked by [`TermPool::triple`](crate::pool::TermPool::triple)):
/// the subject is a resource or blank node, the predicate is a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: TermId,
    pub predicate: TermId,
    pub object: TermId,
}

impl Triple {
    pub fn new(subject: TermId, predicate: TermId, object: TermId) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// The slots in subject, predicate, object order.
    pub fn slots(&self) -> [TermId; 3] {
        [self.subject, self.predicate, self.object]
    }
}
