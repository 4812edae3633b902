//! The RDF term model and its canonical text form.
//!
//! A term's canonical text is the interning key: two terms that print the same
//! are the same term. The forms are
//!
//! ```text
//! <iri>    _:id    "value"    "value"@lang    "value"^^<datatype>
//! ```

use std::fmt;

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_LABEL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#label";
pub const RDF_XML_LITERAL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#XMLLiteral";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A named node, identified by an absolute IRI.
    Resource { iri: String },
    /// An anonymous node, identified by a store-local id.
    Blank { id: String },
    Literal(Literal),
}

/// A literal value. `lang` and `datatype` are never both set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: String,
    pub lang: Option<String>,
    pub datatype: Option<String>,
}

/// Coarse classification used when checking triple positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Resource,
    Blank,
    Literal,
}

impl Term {
    pub fn resource(iri: impl Into<String>) -> Self {
        Term::Resource { iri: iri.into() }
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::Blank { id: id.into() }
    }

    pub fn kind(&self) -> TermKind {
        match self {
            Term::Resource { .. } => TermKind::Resource,
            Term::Blank { .. } => TermKind::Blank,
            Term::Literal(_) => TermKind::Literal,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// The bare lexical text: the IRI, the blank id, or the literal value.
    pub fn lexical(&self) -> &str {
        match self {
            Term::Resource { iri } => iri,
            Term::Blank { id } => id,
            Term::Literal(lit) => &lit.value,
        }
    }
}

impl Literal {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn lang(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: Some(lang.into()),
            datatype: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: None,
            datatype: Some(datatype.into()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Resource { iri } => write!(f, "<{}>", escape_iri(iri)),
            Term::Blank { id } => write!(f, "_:{}", id),
            Term::Literal(lit) => lit.fmt(f),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.value.replace('"', "\\\""))?;
        if let Some(lang) = &self.lang {
            write!(f, "@{}", lang)
        } else if let Some(datatype) = &self.datatype {
            write!(f, "^^<{}>", escape_iri(datatype))
        } else {
            Ok(())
        }
    }
}

fn escape_iri(iri: &str) -> String {
    iri.replace('>', "\\>")
}
