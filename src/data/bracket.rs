//! Ten-year age brackets.
//!
//! Edges are `10, 20, …, 100`; each bracket is left-inclusive and
//! right-exclusive. Ages outside `[10, 100)` map to [`AgeBracket::OutOfRange`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bracket edges in ascending order.
pub const BRACKET_EDGES: [i32; 10] = [10, 20, 30, 40, 50, 60, 70, 80, 90, 100];

const OUT_OF_RANGE_LABEL: &str = "out of range";

/// An age bracket. Ordering is ascending by lower bound with the sentinel last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBracket {
    /// `[lower, lower + 10)`. Only constructed for lower bounds in `BRACKET_EDGES`.
    Span { lower: i32 },
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised age bracket label: {0:?}")]
pub struct ParseBracketError(pub String);

impl AgeBracket {
    /// Map an age onto its bracket.
    pub fn for_age(age: i32) -> Self {
        BRACKET_EDGES
            .windows(2)
            .find(|w| age >= w[0] && age < w[1])
            .map(|w| AgeBracket::Span { lower: w[0] })
            .unwrap_or(AgeBracket::OutOfRange)
    }

    /// All in-range brackets, ascending.
    pub fn spans() -> impl Iterator<Item = AgeBracket> {
        BRACKET_EDGES
            .windows(2)
            .map(|w| AgeBracket::Span { lower: w[0] })
    }

    /// `(lower, upper)` with `upper` exclusive, or `None` for the sentinel.
    pub fn bounds(&self) -> Option<(i32, i32)> {
        match *self {
            AgeBracket::Span { lower } => Some((lower, lower + 10)),
            AgeBracket::OutOfRange => None,
        }
    }

    pub fn is_in_range(&self) -> bool {
        matches!(self, AgeBracket::Span { .. })
    }

    /// Canonical display label, e.g. `"[30, 40)"`. Parsed back by `FromStr`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            Some((lo, hi)) => write!(f, "[{lo}, {hi})"),
            None => write!(f, "{OUT_OF_RANGE_LABEL}"),
        }
    }
}

impl FromStr for AgeBracket {
    type Err = ParseBracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == OUT_OF_RANGE_LABEL {
            return Ok(AgeBracket::OutOfRange);
        }
        AgeBracket::spans()
            .find(|b| b.label() == s)
            .ok_or_else(|| ParseBracketError(s.to_string()))
    }
}
