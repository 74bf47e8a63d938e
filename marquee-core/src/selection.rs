//! Time-based playlist selection rules
//!
//! Evaluates an ordered list of named predicate rules against the current
//! moment, and optionally against the viewer's content-rating policy, to
//! decide which playlist definition is active. Rules are constructed once
//! from configuration and are immutable afterwards; a malformed predicate
//! range fails construction rather than being skipped at evaluation time.

use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::debug;

use crate::range::{Range, RangeError};

/// Errors raised while building a selection rule.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    /// A predicate range expression failed to parse.
    #[error("Rule '{rule}' has an invalid '{field}' range: {source}")]
    InvalidRange {
        /// Name of the offending rule
        rule: String,
        /// Predicate field carrying the bad expression
        field: &'static str,
        /// Underlying parse failure
        source: RangeError,
    },
}

/// Viewer attributes consulted by the viewer-age predicate.
#[derive(Debug, Clone, Default)]
pub struct ViewerContext {
    /// Content-rating ceiling label from the viewer's policy
    pub max_parental_rating: Option<String>,
}

impl ViewerContext {
    /// Numeric age ceiling extracted from the rating label.
    ///
    /// Reads the leading digits of the label (`"16"` yields 16); labels
    /// that do not start with a digit yield 0. Returns `None` when the
    /// viewer has no rating policy at all.
    fn rating_ceiling(&self) -> Option<u32> {
        let label = self.max_parental_rating.as_deref()?;
        let digits: String = label.chars().take_while(char::is_ascii_digit).collect();
        Some(digits.parse().unwrap_or(0))
    }
}

/// A named predicate deciding whether its playlist is active.
///
/// At most one calendar predicate family is evaluated per rule: the first
/// present one, in the declared field order, decides. The `disabled` and
/// `selected` flags short-circuit every predicate.
#[derive(Debug, Clone)]
pub struct SelectionRule {
    name: String,
    disabled: bool,
    selected: bool,
    hours: Option<Range>,
    weekdays: Option<Range>,
    days: Option<Range>,
    weeks: Option<Range>,
    months: Option<Range>,
    years: Option<Range>,
    dates: Option<Range>,
    viewer_age: Option<Range>,
}

impl SelectionRule {
    /// Create a rule with no predicates; such a rule always matches.
    ///
    /// Names are case-normalized to lowercase.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            disabled: false,
            selected: false,
            hours: None,
            weekdays: None,
            days: None,
            weeks: None,
            months: None,
            years: None,
            dates: None,
            viewer_age: None,
        }
    }

    /// Rule name, lowercase.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Force the rule off; it will never be selected.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Force the rule on; it always matches, bypassing all predicates.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    fn parse_field(&self, field: &'static str, expr: &str) -> Result<Range, SelectionError> {
        Range::parse(expr).map_err(|source| SelectionError::InvalidRange {
            rule: self.name.clone(),
            field,
            source,
        })
    }

    /// Match the hour of day, 0-23.
    ///
    /// # Errors
    /// - `SelectionError::InvalidRange` - Malformed range expression
    pub fn with_hours(mut self, expr: &str) -> Result<Self, SelectionError> {
        self.hours = Some(self.parse_field("hours", expr)?);
        Ok(self)
    }

    /// Match the ISO weekday, 1 = Monday through 7 = Sunday.
    ///
    /// # Errors
    /// - `SelectionError::InvalidRange` - Malformed range expression
    pub fn with_weekdays(mut self, expr: &str) -> Result<Self, SelectionError> {
        self.weekdays = Some(self.parse_field("weekdays", expr)?);
        Ok(self)
    }

    /// Match the day of month, 1-31.
    ///
    /// # Errors
    /// - `SelectionError::InvalidRange` - Malformed range expression
    pub fn with_days(mut self, expr: &str) -> Result<Self, SelectionError> {
        self.days = Some(self.parse_field("days", expr)?);
        Ok(self)
    }

    /// Match the ISO week of year, 1-53.
    ///
    /// # Errors
    /// - `SelectionError::InvalidRange` - Malformed range expression
    pub fn with_weeks(mut self, expr: &str) -> Result<Self, SelectionError> {
        self.weeks = Some(self.parse_field("weeks", expr)?);
        Ok(self)
    }

    /// Match the month, 1 = January through 12 = December.
    ///
    /// # Errors
    /// - `SelectionError::InvalidRange` - Malformed range expression
    pub fn with_months(mut self, expr: &str) -> Result<Self, SelectionError> {
        self.months = Some(self.parse_field("months", expr)?);
        Ok(self)
    }

    /// Match the calendar year.
    ///
    /// # Errors
    /// - `SelectionError::InvalidRange` - Malformed range expression
    pub fn with_years(mut self, expr: &str) -> Result<Self, SelectionError> {
        self.years = Some(self.parse_field("years", expr)?);
        Ok(self)
    }

    /// Match the full date, `YYYY_MM_DD` spelling.
    ///
    /// # Errors
    /// - `SelectionError::InvalidRange` - Malformed range expression
    pub fn with_dates(mut self, expr: &str) -> Result<Self, SelectionError> {
        self.dates = Some(self.parse_field("dates", expr)?);
        Ok(self)
    }

    /// Match the viewer's age ceiling, evaluated only when a viewer
    /// context is supplied.
    ///
    /// # Errors
    /// - `SelectionError::InvalidRange` - Malformed range expression
    pub fn with_viewer_age(mut self, expr: &str) -> Result<Self, SelectionError> {
        self.viewer_age = Some(self.parse_field("viewer_age", expr)?);
        Ok(self)
    }

    /// Evaluate the rule against an instant and an optional viewer.
    pub fn is_satisfied(&self, now: NaiveDateTime, viewer: Option<&ViewerContext>) -> bool {
        if self.disabled {
            return false;
        }
        if self.selected {
            return true;
        }

        let calendar_ok = if let Some(range) = &self.hours {
            range.contains_number(f64::from(now.hour()))
        } else if let Some(range) = &self.weekdays {
            range.contains_number(f64::from(now.weekday().number_from_monday()))
        } else if let Some(range) = &self.days {
            range.contains_number(f64::from(now.day()))
        } else if let Some(range) = &self.weeks {
            range.contains_number(f64::from(now.iso_week().week()))
        } else if let Some(range) = &self.months {
            range.contains_number(f64::from(now.month()))
        } else if let Some(range) = &self.years {
            range.contains_number(f64::from(now.year()))
        } else if let Some(range) = &self.dates {
            range.contains_date(now.date())
        } else {
            true
        };
        if !calendar_ok {
            return false;
        }

        if let (Some(range), Some(viewer)) = (&self.viewer_age, viewer)
            && let Some(ceiling) = viewer.rating_ceiling()
            && !range.contains_number(f64::from(ceiling))
        {
            return false;
        }

        true
    }
}

/// Evaluate rules in declared order.
///
/// Returns the first satisfied rule, or the last rule when none match;
/// the final rule acts as the default. `None` only for an empty slice.
pub fn select<'a>(
    rules: &'a [SelectionRule],
    now: NaiveDateTime,
    viewer: Option<&ViewerContext>,
) -> Option<&'a SelectionRule> {
    let selected = rules
        .iter()
        .find(|rule| rule.is_satisfied(now, viewer))
        .or_else(|| rules.last());
    if let Some(rule) = selected {
        debug!("Selected rule '{}'", rule.name());
    }
    selected
}
