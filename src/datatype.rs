//! Typed-literal validation and canonicalization.
//!
//! A [`DatatypeRegistry`] maps datatype IRIs to handlers. A handler checks the
//! lexical form against a regex (after optional whitespace stripping) and maps
//! it to its canonical lexical form. Datatypes without a handler pass through
//! unchanged.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};
use crate::term::{
    RDF_XML_LITERAL, XSD_BOOLEAN, XSD_DATE, XSD_DATE_TIME, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER,
    XSD_STRING,
};

type Canonicalize = Box<dyn Fn(&str) -> String>;

/// Validation and normalization for one datatype.
pub struct DatatypeHandler {
    lexical: Regex,
    strip: bool,
    canonical: Canonicalize,
}

impl DatatypeHandler {
    /// Build a handler from a lexical-space regex. Fails with `MalformedTerm`
    /// if the regex does not compile.
    pub fn new(
        lexical: &str,
        strip: bool,
        canonical: impl Fn(&str) -> String + 'static,
    ) -> Result<Self> {
        let lexical = Regex::new(lexical)
            .map_err(|e| Error::malformed_term(format!("bad lexical pattern: {}", e)))?;
        Ok(Self {
            lexical,
            strip,
            canonical: Box::new(canonical),
        })
    }

    /// Accepts any lexical form and leaves it untouched, whitespace included.
    pub fn identity() -> Self {
        Self {
            lexical: Regex::new(r"(?s)^.*$").expect("identity pattern compiles"),
            strip: false,
            canonical: Box::new(str::to_string),
        }
    }

    fn prepare<'a>(&self, lexical: &'a str) -> &'a str {
        if self.strip {
            lexical.trim()
        } else {
            lexical
        }
    }

    pub fn is_valid(&self, lexical: &str) -> bool {
        self.lexical.is_match(self.prepare(lexical))
    }

    pub fn canonicalize(&self, lexical: &str) -> Option<String> {
        let prepared = self.prepare(lexical);
        self.lexical
            .is_match(prepared)
            .then(|| (self.canonical)(prepared))
    }
}

impl fmt::Debug for DatatypeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatatypeHandler")
            .field("lexical", &self.lexical.as_str())
            .field("strip", &self.strip)
            .finish()
    }
}

#[derive(Debug)]
pub struct DatatypeRegistry {
    handlers: HashMap<String, DatatypeHandler>,
}

impl DatatypeRegistry {
    /// A registry with no handlers: every datatype passes through.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with the XSD built-ins and `rdf:XMLLiteral`.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (datatype, handler) in builtin_handlers() {
            registry.handlers.insert(datatype.to_string(), handler);
        }
        registry
    }

    /// Install (or replace) the handler for a datatype IRI.
    pub fn register(&mut self, datatype: impl Into<String>, handler: DatatypeHandler) {
        self.handlers.insert(datatype.into(), handler);
    }

    pub fn handler(&self, datatype: &str) -> Option<&DatatypeHandler> {
        self.handlers.get(datatype)
    }

    /// Whether `lexical` is in the lexical space of `datatype`. Unknown
    /// datatypes accept everything.
    pub fn is_valid(&self, lexical: &str, datatype: &str) -> bool {
        self.handlers
            .get(datatype)
            .map_or(true, |h| h.is_valid(lexical))
    }

    /// Validate and normalize a lexical form.
    pub fn canonicalize(&self, lexical: &str, datatype: &str) -> Result<String> {
        match self.handlers.get(datatype) {
            None => Ok(lexical.to_string()),
            Some(handler) => handler.canonicalize(lexical).ok_or_else(|| {
                Error::malformed_term(format!(
                    "{:?} is not a valid value for datatype <{}>",
                    lexical, datatype
                ))
            }),
        }
    }
}

impl Default for DatatypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_handlers() -> Vec<(&'static str, DatatypeHandler)> {
    let builtin = |lexical: &str, strip: bool, canonical: fn(&str) -> String| DatatypeHandler {
        lexical: Regex::new(lexical).expect("built-in lexical pattern compiles"),
        strip,
        canonical: Box::new(canonical),
    };

    vec![
        (XSD_STRING, builtin(r"(?s)^.*$", false, str::to_string)),
        (XSD_BOOLEAN, builtin(r"^(true|false|1|0)$", true, canonical_boolean)),
        (XSD_INTEGER, builtin(r"^[-+]?[0-9]+$", true, canonical_integer)),
        (
            XSD_DECIMAL,
            builtin(r"^[-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)$", true, canonical_decimal),
        ),
        (
            XSD_DOUBLE,
            builtin(
                r"^([-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?|[-+]?INF|NaN)$",
                true,
                str::to_string,
            ),
        ),
        (
            XSD_DATE,
            builtin(
                r"^-?[0-9]{4,}-[0-9]{2}-[0-9]{2}(Z|[-+][0-9]{2}:[0-9]{2})?$",
                true,
                str::to_string,
            ),
        ),
        (
            XSD_DATE_TIME,
            builtin(
                r"^-?[0-9]{4,}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?(Z|[-+][0-9]{2}:[0-9]{2})?$",
                true,
                str::to_string,
            ),
        ),
        (RDF_XML_LITERAL, DatatypeHandler::identity()),
    ]
}

fn canonical_boolean(v: &str) -> String {
    match v {
        "1" | "true" => "true".to_string(),
        _ => "false".to_string(),
    }
}

fn split_sign(v: &str) -> (bool, &str) {
    match v.as_bytes().first() {
        Some(b'-') => (true, &v[1..]),
        Some(b'+') => (false, &v[1..]),
        _ => (false, v),
    }
}

fn canonical_integer(v: &str) -> String {
    let (negative, digits) = split_sign(v);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        "0".to_string()
    } else if negative {
        format!("-{}", digits)
    } else {
        digits.to_string()
    }
}

fn canonical_decimal(v: &str) -> String {
    let (negative, unsigned) = split_sign(v);
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let int_part = match int_part.trim_start_matches('0') {
        "" => "0",
        s => s,
    };
    let frac_part = match frac_part.trim_end_matches('0') {
        "" => "0",
        s => s,
    };
    let zero = int_part == "0" && frac_part == "0";
    if negative && !zero {
        format!("-{}.{}", int_part, frac_part)
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}
