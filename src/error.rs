//! Error types for rdfquery
//!
//! Every error is raised while constructing something (a term, a triple, a
//! query node). Failed joins are not errors; they simply produce no rows.
//!
//! Errors that come from parsing text keep the source and the offending span so
//! they can be rendered with ariadne.

use ariadne::{Color, Label, Report, ReportKind, Source};
use std::ops::Range;
use thiserror::Error;

/// Character offsets into the parsed text.
pub type Span = Range<usize>;

pub type Result<T> = std::result::Result<T, Error>;

/// Location of a parse failure inside the text that was being parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    pub source: String,
    pub span: Span,
}

impl SourceSpan {
    pub fn new(source: impl Into<String>, span: Span) -> Self {
        Self {
            source: source.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("malformed term: {message}")]
    MalformedTerm {
        message: String,
        at: Option<SourceSpan>,
    },

    #[error("malformed triple: {message}")]
    MalformedTriple {
        message: String,
        at: Option<SourceSpan>,
    },

    #[error("malformed filter: {message}")]
    MalformedFilter {
        message: String,
        at: Option<SourceSpan>,
    },

    #[error("cannot give both a language ({lang}) and a datatype ({datatype}) for literal {value:?}")]
    ConflictingLiteralOptions {
        value: String,
        lang: String,
        datatype: String,
    },

    #[error("no namespace binding for prefix {prefix:?} in {name:?}")]
    UnboundPrefix { prefix: String, name: String },
}

impl Error {
    pub fn malformed_term(message: impl Into<String>) -> Self {
        Error::MalformedTerm {
            message: message.into(),
            at: None,
        }
    }

    pub fn malformed_triple(message: impl Into<String>) -> Self {
        Error::MalformedTriple {
            message: message.into(),
            at: None,
        }
    }

    pub fn malformed_filter(message: impl Into<String>) -> Self {
        Error::MalformedFilter {
            message: message.into(),
            at: None,
        }
    }

    /// Attach a source location, if this kind of error carries one and none is
    /// set yet.
    pub fn at(mut self, source: &str, span: Span) -> Self {
        match &mut self {
            Error::MalformedTerm { at, .. }
            | Error::MalformedTriple { at, .. }
            | Error::MalformedFilter { at, .. } => {
                if at.is_none() {
                    *at = Some(SourceSpan::new(source, span));
                }
            }
            _ => {}
        }
        self
    }

    /// Re-badge a term-level failure as a failure of the enclosing triple or
    /// filter text.
    pub(crate) fn within(self, outer: Outer) -> Self {
        let (message, at) = match self {
            Error::MalformedTerm { message, at }
            | Error::MalformedTriple { message, at }
            | Error::MalformedFilter { message, at } => (message, at),
            other => (other.to_string(), None),
        };
        match outer {
            Outer::Triple => Error::MalformedTriple { message, at },
            Outer::Filter => Error::MalformedFilter { message, at },
        }
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            Error::MalformedTerm { at, .. }
            | Error::MalformedTriple { at, .. }
            | Error::MalformedFilter { at, .. } => at.as_ref(),
            _ => None,
        }
    }

    /// Render this error as a user-facing report. Errors with a source span get
    /// an annotated snippet; the rest fall back to their Display text.
    pub fn report(&self) -> String {
        let Some(at) = self.span() else {
            return self.to_string();
        };

        let title = match self {
            Error::MalformedTerm { .. } => "Malformed term",
            Error::MalformedTriple { .. } => "Malformed triple",
            _ => "Malformed filter",
        };
        let message = match self {
            Error::MalformedTerm { message, .. }
            | Error::MalformedTriple { message, .. }
            | Error::MalformedFilter { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let len = at.source.chars().count();
        let start = at.span.start.min(len);
        let end = at.span.end.min(len).max(start);

        let mut output = Vec::new();
        let written = Report::build(ReportKind::Error, (), start)
            .with_message(title)
            .with_label(
                Label::new(start..end)
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write(Source::from(at.source.as_str()), &mut output);

        match written {
            Ok(()) => String::from_utf8(output).unwrap_or_else(|_| self.to_string()),
            Err(_) => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Outer {
    Triple,
    Filter,
}
