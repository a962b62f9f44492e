use super::Type;
use crate::location::Span;
use miette::{LabeledSpan, SourceOffset, SourceSpan};
use std::sync::Arc;

/// Conflicts found while unifying the types flowing through a channel.
#[derive(Clone, Debug)]
pub enum TypeError {
    /// A variable and the channel's element disagree.
    Mismatch {
        chan: String,
        span: Option<Span>,
        expected: Type,
        found: Type,
    },
    /// A receive binds a different number of variables than the channel carries.
    Arity {
        chan: String,
        span: Option<Span>,
        got: usize,
        expected: usize,
    },
    /// Something is received on a name that is not a channel.
    NotAChannel {
        chan: String,
        span: Option<Span>,
        found: Type,
    },
}

impl TypeError {
    pub fn span(&self) -> Option<Span> {
        match self {
            | Self::Mismatch { span, .. }
            | Self::Arity { span, .. }
            | Self::NotAChannel { span, .. } => *span,
        }
    }

    pub fn to_report(&self, source_code: Arc<str>) -> miette::Report {
        let labels = self
            .span()
            .map(|span| {
                vec![LabeledSpan::new_with_span(
                    Some("on this channel".to_owned()),
                    SourceSpan::new(SourceOffset::from(span.start.offset), span.len()),
                )]
            })
            .unwrap_or_default();
        let report = match self {
            Self::Mismatch {
                chan,
                expected,
                found,
                ..
            } => miette::miette!(
                labels = labels,
                help = format!("Types inferred from channel `{}` are in conflict.", chan),
                "Type `{}` and `{}` do not match.",
                expected,
                found
            ),
            Self::Arity {
                chan,
                got,
                expected,
                ..
            } => miette::miette!(
                labels = labels,
                help = format!(
                    "Types from channel `{}` and the received variables have different arity.",
                    chan
                ),
                "Arity mismatch (got {}, expected {}).",
                got,
                expected
            ),
            Self::NotAChannel { chan, found, .. } => miette::miette!(
                labels = labels,
                "`{}` has type `{}`, which is not a channel.",
                chan,
                found
            ),
        };
        report.with_source_code(source_code)
    }
}

impl core::fmt::Display for TypeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Mismatch {
                chan,
                expected,
                found,
                ..
            } => write!(
                f,
                "type error: type {} and {} does not match (types inferred from channel {} are in conflict)",
                expected, found, chan
            ),
            Self::Arity {
                chan,
                got,
                expected,
                ..
            } => write!(
                f,
                "type error: arity mismatch (got={}, expected={}) (types from channel {} and vars have different arity)",
                got, expected, chan
            ),
            Self::NotAChannel { chan, found, .. } => {
                write!(f, "type error: {} has type {} which is not a channel", chan, found)
            }
        }
    }
}

impl core::error::Error for TypeError {}
