//! rdfquery: an in-memory RDF triple store with live pattern queries
//!
//! Terms and triples are interned in a [`TermPool`], grouped into databanks,
//! and queried through a network of pattern, filter and union nodes whose
//! result rows stay current as triples are added.
//!
//! ```
//! use rdfquery::{DatabankOptions, Store, WhereOptions};
//!
//! let mut store = Store::new();
//! let opts = DatabankOptions::default().prefix("foaf", "http://xmlns.com/foaf/0.1/");
//! let bank = store.databank([], opts);
//! let people = store.top(bank);
//! let named = store.where_(people, "?who foaf:name ?name", WhereOptions::default()).unwrap();
//!
//! store.add(bank, "_:ann foaf:name \"Ann\"").unwrap();
//! assert_eq!(store.size(named), 1);
//! ```

pub mod databank;
pub mod datatype;
pub mod error;
pub mod filter;
pub mod id;
pub mod lexer;
pub mod network;
pub mod parser;
pub mod pattern;
pub mod pool;
pub mod pretty;
pub mod resolve;
pub mod store;
pub mod term;
pub mod triple;

pub use databank::DatabankOptions;
pub use error::{Error, Result};
pub use filter::{FilterInput, FilterValue};
pub use id::{BankId, NumericId, QueryId, TermId, TripleId};
pub use parser::{parse_pattern, parse_term, parse_triple, Position};
pub use pattern::{Bindings, Match, Pattern, Slot};
pub use pool::{LiteralOptions, PoolConfig, TermPool};
pub use resolve::{CurieResolver, IriResolver, Namespaces, TermContext};
pub use store::{Insert, PatternSource, Store, StoreConfig, WhereOptions};
pub use term::{Literal, Term, TermKind, RDF_LABEL, RDF_TYPE};
pub use triple::Triple;
