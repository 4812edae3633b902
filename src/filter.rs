//! Conditions for predicate-filtered query nodes.

use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};
use crate::id::TermId;
use crate::pattern::Bindings;
use crate::pool::TermPool;

type Predicate = Box<dyn Fn(&Bindings, &TermPool) -> bool>;

/// What a filter compares a bound variable against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// The very same term.
    Term(TermId),
    /// A literal's value, or a resource's IRI / a blank node's id.
    Text(String),
}

impl From<TermId> for FilterValue {
    fn from(id: TermId) -> Self {
        FilterValue::Term(id)
    }
}

impl From<&str> for FilterValue {
    fn from(text: &str) -> Self {
        FilterValue::Text(text.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(text: String) -> Self {
        FilterValue::Text(text)
    }
}

/// A row filter. Rows that leave the tested variable unbound never pass.
pub enum FilterInput {
    Fn(Predicate),
    Matches { var: String, regex: Regex },
    Equals { var: String, value: FilterValue },
}

impl FilterInput {
    pub fn func(f: impl Fn(&Bindings, &TermPool) -> bool + 'static) -> Self {
        FilterInput::Fn(Box::new(f))
    }

    /// Keep rows whose `var` has lexical text matching `pattern`.
    pub fn matches(var: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::malformed_filter(format!("bad regex {:?}: {}", pattern, e)))?;
        Ok(FilterInput::Matches {
            var: var.into(),
            regex,
        })
    }

    pub fn equals(var: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        FilterInput::Equals {
            var: var.into(),
            value: value.into(),
        }
    }

    pub fn test(&self, bindings: &Bindings, pool: &TermPool) -> bool {
        match self {
            FilterInput::Fn(f) => f(bindings, pool),
            FilterInput::Matches { var, regex } => bindings
                .get(var)
                .is_some_and(|id| regex.is_match(pool.term(*id).lexical())),
            FilterInput::Equals { var, value } => {
                bindings.get(var).is_some_and(|id| match value {
                    FilterValue::Term(expected) => id == expected,
                    FilterValue::Text(text) => pool.term(*id).lexical() == text,
                })
            }
        }
    }
}

impl fmt::Debug for FilterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterInput::Fn(_) => f.write_str("Fn(..)"),
            FilterInput::Matches { var, regex } => f
                .debug_struct("Matches")
                .field("var", var)
                .field("regex", &regex.as_str())
                .finish(),
            FilterInput::Equals { var, value } => f
                .debug_struct("Equals")
                .field("var", var)
                .field("value", value)
                .finish(),
        }
    }
}
