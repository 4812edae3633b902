//! Handle types for rdfquery
//!
//! Everything that lives in a [`Store`](crate::store::Store) is addressed by a
//! compact index rather than a pointer:
//! - TermIds index the term pool (interned resources, blanks, literals)
//! - TripleIds index the triple pool (interned facts)
//! - BankIds index the store's databanks
//! - QueryIds index the query-node arena
//!
//! Handles are only meaningful relative to the store that issued them.

use std::fmt;

/// Conversion between a typed handle and its raw arena index.
pub trait NumericId: Copy {
    fn from_usize(n: usize) -> Self;
    fn index(self) -> usize;
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl NumericId for $name {
            #[inline]
            fn from_usize(n: usize) -> Self {
                Self(n)
            }

            #[inline]
            fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

numeric_id!(
    /// Interned term: equal canonical text ⇔ equal TermId.
    TermId,
    "t"
);

numeric_id!(
    /// Interned triple: equal (subject, predicate, object) ⇔ equal TripleId.
    TripleId,
    "tr"
);

numeric_id!(
    /// A databank (plain or union) owned by a store.
    BankId,
    "bank"
);

numeric_id!(
    /// A node in the query network.
    QueryId,
    "q"
);
