//! Filter comparators

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of predicate operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Comparator {
    Less,           // <
    LessOrEqual,    // <=
    #[default]
    Equals,         // =
    GreaterOrEqual, // >=
    Greater,        // >
    NotEquals,      // !=
    Begins,         // LIKE 'v%'
    Ends,           // LIKE '%v'
    Contains,       // LIKE '%v%'
    NotBegins,
    NotEnds,
    NotContains,
}

impl Comparator {
    pub const ALL: [Comparator; 12] = [
        Comparator::Less,
        Comparator::LessOrEqual,
        Comparator::Equals,
        Comparator::GreaterOrEqual,
        Comparator::Greater,
        Comparator::NotEquals,
        Comparator::Begins,
        Comparator::Ends,
        Comparator::Contains,
        Comparator::NotBegins,
        Comparator::NotEnds,
        Comparator::NotContains,
    ];

    /// Case-insensitive lookup; unknown tokens yield `None`
    pub fn normalize(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|c| c.as_str() == token)
    }

    /// Canonical lower-case token
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Less => "less",
            Comparator::LessOrEqual => "lessorequal",
            Comparator::Equals => "equals",
            Comparator::GreaterOrEqual => "greaterorequal",
            Comparator::Greater => "greater",
            Comparator::NotEquals => "not_equals",
            Comparator::Begins => "begins",
            Comparator::Ends => "ends",
            Comparator::Contains => "contains",
            Comparator::NotBegins => "not_begins",
            Comparator::NotEnds => "not_ends",
            Comparator::NotContains => "not_contains",
        }
    }

    /// Token rendered between column and parameter
    pub fn operator_token(&self) -> &'static str {
        match self {
            Comparator::Less => "<",
            Comparator::LessOrEqual => "<=",
            Comparator::GreaterOrEqual => ">=",
            Comparator::Greater => ">",
            Comparator::NotEquals => "!=",
            Comparator::Begins | Comparator::Ends | Comparator::Contains => "LIKE",
            Comparator::Equals
            | Comparator::NotBegins
            | Comparator::NotEnds
            | Comparator::NotContains => "=",
        }
    }

    /// LIKE pattern template with `{value}` as placeholder
    pub fn mask_template(&self) -> Option<&'static str> {
        match self {
            Comparator::Begins => Some("{value}%"),
            Comparator::Ends => Some("%{value}"),
            Comparator::Contains => Some("%{value}%"),
            Comparator::Less
            | Comparator::LessOrEqual
            | Comparator::Equals
            | Comparator::GreaterOrEqual
            | Comparator::Greater
            | Comparator::NotEquals
            | Comparator::NotBegins
            | Comparator::NotEnds
            | Comparator::NotContains => None,
        }
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| format!("unknown comparator '{}'", s))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
