//! Typed interval matching for rule predicates and attribute filters
//!
//! Parses textual interval expressions like `"18-23"`, `"-m"`, `"2001-"` or
//! `"2024_12_01-2024_12_24"` into typed bound pairs and answers containment
//! queries with numeric, lexicographic or calendar ordering. The same
//! grammar backs both the time-based selection predicates and the dynamic
//! playlist attribute filters.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Errors raised while parsing an interval expression.
#[derive(Debug, thiserror::Error)]
pub enum RangeError {
    /// Text matches none of the five interval shapes.
    #[error("Invalid interval '{text}': expected 'A-B', 'A-', '-B', '-' or 'A'")]
    Syntax {
        /// The rejected expression
        text: String,
    },

    /// The bounds of a closed interval resolve to different domains.
    #[error("Mismatched interval domains for bounds '{lower}' and '{upper}'")]
    DomainMismatch {
        /// Lower bound token
        lower: String,
        /// Upper bound token
        upper: String,
    },

    /// A bound token fits none of the supported domains.
    #[error("Unsupported bound '{token}': expected number, lowercase word or YYYY_MM_DD date")]
    UnknownDomain {
        /// The rejected token
        token: String,
    },
}

/// Result type for range parsing.
pub type RangeResult<T> = Result<T, RangeError>;

static NUMERIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("valid numeric pattern"));
static ALPHABETIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+$").expect("valid alphabetic pattern"));
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}_[0-9]{2}_[0-9]{2}$").expect("valid date pattern"));

/// A single typed bound or probe value.
///
/// Date values carry the canonical `YYYY_MM_DD` spelling; the pattern is
/// matched syntactically only, and lexicographic comparison of the spelling
/// agrees with calendar ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeValue {
    /// Numeric value, compared with numeric ordering
    Number(f64),
    /// Lowercase word, compared lexicographically
    Word(String),
    /// Date in `YYYY_MM_DD` spelling
    Date(String),
}

impl RangeValue {
    /// Parse a bound token, trying the numeric, alphabetic and date
    /// domains in turn.
    fn parse(token: &str) -> RangeResult<Self> {
        if NUMERIC_PATTERN.is_match(token) {
            let value = token.parse().map_err(|_| RangeError::UnknownDomain {
                token: token.to_string(),
            })?;
            Ok(RangeValue::Number(value))
        } else if ALPHABETIC_PATTERN.is_match(token) {
            Ok(RangeValue::Word(token.to_string()))
        } else if DATE_PATTERN.is_match(token) {
            Ok(RangeValue::Date(token.to_string()))
        } else {
            Err(RangeError::UnknownDomain {
                token: token.to_string(),
            })
        }
    }

    /// Build a date probe from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        RangeValue::Date(date.format("%Y_%m_%d").to_string())
    }

    /// True when both values belong to the same domain.
    fn same_domain(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (RangeValue::Number(_), RangeValue::Number(_))
                | (RangeValue::Word(_), RangeValue::Word(_))
                | (RangeValue::Date(_), RangeValue::Date(_))
        )
    }
}

impl PartialOrd for RangeValue {
    /// Domain-natural ordering; values from different domains do not compare.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (RangeValue::Number(a), RangeValue::Number(b)) => a.partial_cmp(b),
            (RangeValue::Word(a), RangeValue::Word(b)) => Some(a.cmp(b)),
            (RangeValue::Date(a), RangeValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeValue::Number(value) => write!(f, "{value}"),
            RangeValue::Word(value) => write!(f, "{value}"),
            RangeValue::Date(value) => write!(f, "{value}"),
        }
    }
}

/// Interval shape matched from the textual expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// Both bounds present: `"A-B"`
    Closed,
    /// Upper bound only: `"-B"`
    LeftOpen,
    /// Lower bound only: `"A-"`
    RightOpen,
    /// No bounds: `"-"`, matches everything
    Open,
    /// Single value: `"A"`, matches on equality
    Exact,
}

/// An immutable typed interval with optional open ends.
///
/// A closed interval whose lower bound sorts above its upper bound is valid
/// and wraps around: hours `"22-04"` cover late evening through early
/// morning.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    kind: RangeKind,
    lower: Option<RangeValue>,
    upper: Option<RangeValue>,
}

impl Range {
    /// Parse an interval expression.
    ///
    /// Bound tokens are whitespace-trimmed around the `-` separator and
    /// matched against the numeric, alphabetic and date domains in turn.
    ///
    /// # Errors
    /// - `RangeError::Syntax` - Text matches none of the five shapes
    /// - `RangeError::UnknownDomain` - A bound fits no supported domain
    /// - `RangeError::DomainMismatch` - Closed bounds in different domains
    pub fn parse(text: &str) -> RangeResult<Self> {
        let (kind, lower_token, upper_token) = match text.split_once('-') {
            Some((lower, upper)) => {
                let lower = lower.trim();
                let upper = upper.trim();
                if upper.contains('-') {
                    return Err(RangeError::Syntax {
                        text: text.to_string(),
                    });
                }
                match (lower.is_empty(), upper.is_empty()) {
                    (false, false) => (RangeKind::Closed, Some(lower), Some(upper)),
                    (true, false) => (RangeKind::LeftOpen, None, Some(upper)),
                    (false, true) => (RangeKind::RightOpen, Some(lower), None),
                    (true, true) => (RangeKind::Open, None, None),
                }
            }
            None => {
                let token = text.trim();
                if token.is_empty() {
                    return Err(RangeError::Syntax {
                        text: text.to_string(),
                    });
                }
                (RangeKind::Exact, Some(token), None)
            }
        };

        let lower = lower_token.map(RangeValue::parse).transpose()?;
        let upper = upper_token.map(RangeValue::parse).transpose()?;

        if kind == RangeKind::Closed
            && let (Some(lower_value), Some(upper_value)) = (&lower, &upper)
            && !lower_value.same_domain(upper_value)
        {
            return Err(RangeError::DomainMismatch {
                lower: lower_value.to_string(),
                upper: upper_value.to_string(),
            });
        }

        Ok(Self { kind, lower, upper })
    }

    /// Shape of this interval.
    pub fn kind(&self) -> RangeKind {
        self.kind
    }

    /// Check whether a value falls inside the interval.
    ///
    /// Comparison is domain-typed; probing with a value from a different
    /// domain returns false. A closed interval with `lower > upper` uses
    /// wrap-around semantics: `value >= lower || value <= upper`.
    pub fn contains(&self, value: &RangeValue) -> bool {
        match self.kind {
            RangeKind::Open => true,
            RangeKind::Exact => self.lower.as_ref() == Some(value),
            RangeKind::LeftOpen => match &self.upper {
                Some(upper) => value.partial_cmp(upper).is_some_and(Ordering::is_le),
                None => false,
            },
            RangeKind::RightOpen => match &self.lower {
                Some(lower) => lower.partial_cmp(value).is_some_and(Ordering::is_le),
                None => false,
            },
            RangeKind::Closed => {
                let (Some(lower), Some(upper)) = (&self.lower, &self.upper) else {
                    return false;
                };
                let above_lower = lower.partial_cmp(value).is_some_and(Ordering::is_le);
                let below_upper = value.partial_cmp(upper).is_some_and(Ordering::is_le);
                if lower.partial_cmp(upper) == Some(Ordering::Greater) {
                    above_lower || below_upper
                } else {
                    above_lower && below_upper
                }
            }
        }
    }

    /// Containment probe with a numeric value.
    pub fn contains_number(&self, value: f64) -> bool {
        self.contains(&RangeValue::Number(value))
    }

    /// Containment probe with a word value.
    pub fn contains_word(&self, value: &str) -> bool {
        self.contains(&RangeValue::Word(value.to_string()))
    }

    /// Containment probe with a calendar date.
    pub fn contains_date(&self, value: NaiveDate) -> bool {
        self.contains(&RangeValue::from_date(value))
    }
}
