//! Lexer for triple and pattern text
//!
//! Splits a statement like `<a> ex:knows "Bob"@en .` into whitespace-separated
//! tokens. Angled IRIs and quoted literals (including `"""long"""` ones) are
//! kept whole even when they contain whitespace, and a token may be a run of
//! several such pieces (`"5"^^<http://...#integer>` is one token).
//!
//! The lexer does not classify tokens; that happens in [`crate::parser`].

use chumsky::prelude::*;

use crate::error::Span;

/// Create a lexer producing raw token text with character spans.
pub fn lexer() -> impl Parser<char, Vec<(String, Span)>, Error = Simple<char>> {
    // \" inside a literal does not terminate it
    let quoted_char = just('\\')
        .then(just('"'))
        .to(vec!['\\', '"'])
        .or(none_of('"').map(|c| vec![c]));

    let long_literal = just("\"\"\"")
        .ignore_then(quoted_char.clone().repeated().flatten())
        .then_ignore(just("\"\"\""))
        .map(|body| wrap("\"\"\"", body, "\"\"\""));

    let short_literal = just('"')
        .ignore_then(quoted_char.repeated().flatten())
        .then_ignore(just('"'))
        .map(|body| wrap("\"", body, "\""));

    let angled = just('<')
        .ignore_then(
            just('\\')
                .then(just('>'))
                .to(vec!['\\', '>'])
                .or(none_of('>').map(|c| vec![c]))
                .repeated()
                .flatten(),
        )
        .then_ignore(just('>'))
        .map(|body| wrap("<", body, ">"));

    let other = filter(|c: &char| !c.is_whitespace()).map(|c| vec![c]);

    let piece = choice((long_literal, short_literal, angled, other));

    let token = piece
        .repeated()
        .at_least(1)
        .flatten()
        .collect::<String>()
        .map_with_span(|text, span| (text, span));

    text::whitespace()
        .ignore_then(token.then_ignore(text::whitespace()).repeated())
        .then_ignore(end())
}

fn wrap(open: &str, body: Vec<char>, close: &str) -> Vec<char> {
    open.chars().chain(body).chain(close.chars()).collect()
}

/// Tokenize `input`, returning the token texts and their spans.
pub fn tokenize(input: &str) -> Result<Vec<(String, Span)>, Vec<Simple<char>>> {
    lexer().parse(input)
}

// Unit tests live in tests/unit_parsing.rs
