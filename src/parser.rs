//! Parsing of triple and pattern text.
//!
//! A statement is exactly three tokens, optionally followed by `.`:
//!
//! ```text
//! _:b0 a ex:Person .
//! ?who foaf:name "Ann"@en
//! ```
//!
//! Each token is classified by shape and position: `?name` is a variable
//! (patterns only), `_:id` and `[]` are blank nodes, quoted text, booleans and
//! numbers are literals (object position only), `a` in predicate position is
//! `rdf:type`, and everything else is a resource.

use crate::error::{Error, Outer, Result, Span};
use crate::id::{TermId, TripleId};
use crate::lexer::tokenize;
use crate::pattern::{Pattern, Slot};
use crate::pool::{LiteralOptions, TermPool};
use crate::resolve::TermContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Subject,
    Predicate,
    Object,
}

impl Position {
    fn name(self) -> &'static str {
        match self {
            Position::Subject => "subject",
            Position::Predicate => "predicate",
            Position::Object => "object",
        }
    }
}

/// Split `text` into exactly three tokens.
fn statement(text: &str, outer: Outer) -> Result<[(String, Span); 3]> {
    let mut tokens = tokenize(text).map_err(|errs| {
        let span = errs.first().map_or(0..text.chars().count(), |e| e.span());
        statement_error(outer, format!("couldn't tokenize {:?}", text.trim())).at(text, span)
    })?;

    if tokens.len() == 4 && tokens[3].0 == "." {
        tokens.pop();
    }
    let count = tokens.len();
    match <[(String, Span); 3]>::try_from(tokens) {
        Ok(three) => Ok(three),
        Err(tokens) => {
            let span = match tokens.get(3) {
                Some((_, extra)) => extra.start..text.chars().count(),
                None => 0..text.chars().count(),
            };
            Err(statement_error(
                outer,
                format!("expected 3 terms, found {}", count),
            )
            .at(text, span))
        }
    }
}

fn statement_error(outer: Outer, message: String) -> Error {
    match outer {
        Outer::Triple => Error::malformed_triple(message),
        Outer::Filter => Error::malformed_filter(message),
    }
}

fn is_blank_token(token: &str) -> bool {
    token == "[]" || token.starts_with("_:")
}

fn is_literal_token(token: &str) -> bool {
    token.starts_with('"')
        || token == "true"
        || token == "false"
        || token
            .strip_prefix(['-', '+'])
            .unwrap_or(token)
            .starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

/// Build the term a token denotes at `position`.
pub fn parse_term(
    pool: &mut TermPool,
    token: &str,
    position: Position,
    ctx: &TermContext,
) -> Result<TermId> {
    match position {
        Position::Predicate if token == "a" => Ok(pool.rdf_type()),
        Position::Predicate => pool.resource(token, ctx),
        _ if is_blank_token(token) => pool.blank(token),
        Position::Object if is_literal_token(token) => {
            pool.literal(token, &LiteralOptions::default(), ctx)
        }
        Position::Subject if token.starts_with('"') => Err(Error::malformed_term(format!(
            "subject {} is a literal",
            token
        ))),
        _ => pool.resource(token, ctx),
    }
}

/// Parse a ground triple. Variables are rejected.
pub fn parse_triple(
    pool: &mut TermPool,
    text: &str,
    ctx: &TermContext,
) -> Result<TripleId> {
    let [subject, predicate, object] = statement(text, Outer::Triple)?;
    let s = ground_term(pool, text, &subject, Position::Subject, ctx)?;
    let p = ground_term(pool, text, &predicate, Position::Predicate, ctx)?;
    let o = ground_term(pool, text, &object, Position::Object, ctx)?;
    pool.triple(s, p, o, Some(text.trim()))
        .map_err(|e| e.at(text, 0..text.chars().count()))
}

fn ground_term(
    pool: &mut TermPool,
    text: &str,
    (token, span): &(String, Span),
    position: Position,
    ctx: &TermContext,
) -> Result<TermId> {
    if token.starts_with('?') {
        return Err(Error::malformed_triple(format!(
            "{} {} is a variable; triples must be ground",
            position.name(),
            token
        ))
        .at(text, span.clone()));
    }
    parse_term(pool, token, position, ctx).map_err(|e| e.within(Outer::Triple).at(text, span.clone()))
}

/// Parse a pattern: like a triple, but `?name` tokens become variables.
pub fn parse_pattern(pool: &mut TermPool, text: &str, ctx: &TermContext) -> Result<Pattern> {
    let [subject, predicate, object] = statement(text, Outer::Filter)?;
    Ok(Pattern::new(
        pattern_slot(pool, text, &subject, Position::Subject, ctx)?,
        pattern_slot(pool, text, &predicate, Position::Predicate, ctx)?,
        pattern_slot(pool, text, &object, Position::Object, ctx)?,
    ))
}

fn pattern_slot(
    pool: &mut TermPool,
    text: &str,
    (token, span): &(String, Span),
    position: Position,
    ctx: &TermContext,
) -> Result<Slot> {
    match token.strip_prefix('?') {
        Some("") => Err(Error::malformed_filter("variable with no name").at(text, span.clone())),
        Some(name) => Ok(Slot::var(name)),
        None => parse_term(pool, token, position, ctx)
            .map(Slot::Bound)
            .map_err(|e| e.within(Outer::Filter).at(text, span.clone())),
    }
}
