//! Sort keys and strict/lenient key resolution
//!
//! Upstream metadata frequently carries only one of each cooperating
//! attribute pair (critic vs. community rating, premiere date vs.
//! production year, sort name vs. display name). Lenient resolution
//! substitutes the partner attribute when the requested one is absent;
//! strict resolution reads the requested attribute alone and falls back to
//! a domain-minimum default.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use super::PlaylistError;
use crate::library::MediaItem;

/// Supported sort keys for playlist ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Keep the stored sequence order
    Order,
    /// Uniform random permutation
    Random,
    /// Display name
    Name,
    /// Original-language title
    OriginalTitle,
    /// Server-side sort name
    SortName,
    /// Timestamp the item entered the library
    DateCreated,
    /// First public release date
    PremiereDate,
    /// Critic rating, 0-100
    CriticRating,
    /// Community rating, 0-10
    CommunityRating,
    /// Runtime in 100-nanosecond ticks
    RunTimeTicks,
    /// Production year
    ProductionYear,
}

impl FromStr for SortBy {
    type Err = PlaylistError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "order" => Ok(SortBy::Order),
            "random" => Ok(SortBy::Random),
            "Name" => Ok(SortBy::Name),
            "OriginalTitle" => Ok(SortBy::OriginalTitle),
            "SortName" => Ok(SortBy::SortName),
            "DateCreated" => Ok(SortBy::DateCreated),
            "PremiereDate" => Ok(SortBy::PremiereDate),
            "CriticRating" => Ok(SortBy::CriticRating),
            "CommunityRating" => Ok(SortBy::CommunityRating),
            "RunTimeTicks" => Ok(SortBy::RunTimeTicks),
            "ProductionYear" => Ok(SortBy::ProductionYear),
            other => Err(PlaylistError::UnsupportedSort {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SortBy::Order => "order",
            SortBy::Random => "random",
            SortBy::Name => "Name",
            SortBy::OriginalTitle => "OriginalTitle",
            SortBy::SortName => "SortName",
            SortBy::DateCreated => "DateCreated",
            SortBy::PremiereDate => "PremiereDate",
            SortBy::CriticRating => "CriticRating",
            SortBy::CommunityRating => "CommunityRating",
            SortBy::RunTimeTicks => "RunTimeTicks",
            SortBy::ProductionYear => "ProductionYear",
        };
        write!(f, "{text}")
    }
}

/// Shared sort configuration for every playlist variant.
#[derive(Debug, Clone, Copy)]
pub struct SortOptions {
    /// Attribute or pseudo-key to sort by
    pub by: SortBy,
    /// Ascending order when true, descending otherwise
    pub ascending: bool,
    /// Strict key resolution when true, lenient fallback otherwise
    pub strict: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            by: SortBy::Order,
            ascending: true,
            strict: false,
        }
    }
}

/// A comparable key extracted from item metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    /// String key, lexicographic ordering
    Text(String),
    /// Datetime key, chronological ordering
    Date(NaiveDateTime),
    /// Numeric key, numeric ordering
    Number(f64),
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    /// Domain-natural ordering; a single sort key always yields one
    /// domain, mixed domains order text before dates before numbers.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(_), _) => Ordering::Less,
            (_, SortValue::Text(_)) => Ordering::Greater,
            (SortValue::Date(_), _) => Ordering::Less,
            (_, SortValue::Date(_)) => Ordering::Greater,
        }
    }
}

fn date_floor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

fn year_start(year: i32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_else(date_floor)
}

impl SortBy {
    /// True when sorting requires item metadata from the library.
    pub fn uses_metadata(&self) -> bool {
        !matches!(self, SortBy::Order | SortBy::Random)
    }

    /// Key read from the named attribute only, with domain-minimum
    /// defaults for absent values. `None` for the pseudo-keys `order`
    /// and `random`, which never reach key resolution.
    pub(crate) fn strict_key(&self, item: &MediaItem) -> Option<SortValue> {
        match self {
            SortBy::Order | SortBy::Random => None,
            SortBy::Name => Some(SortValue::Text(item.name.clone())),
            SortBy::OriginalTitle => Some(SortValue::Text(
                item.original_title.clone().unwrap_or_default(),
            )),
            SortBy::SortName => Some(SortValue::Text(item.sort_name.clone().unwrap_or_default())),
            SortBy::DateCreated => {
                Some(SortValue::Date(item.date_created.unwrap_or_else(date_floor)))
            }
            SortBy::PremiereDate => Some(SortValue::Date(
                item.premiere_date.unwrap_or_else(date_floor),
            )),
            SortBy::CriticRating => Some(SortValue::Number(item.critic_rating.unwrap_or(0.0))),
            SortBy::CommunityRating => {
                Some(SortValue::Number(item.community_rating.unwrap_or(0.0)))
            }
            SortBy::RunTimeTicks => Some(SortValue::Number(
                item.runtime_ticks.map(|ticks| ticks as f64).unwrap_or(0.0),
            )),
            SortBy::ProductionYear => Some(SortValue::Number(
                item.production_year.map(f64::from).unwrap_or(0.0),
            )),
        }
    }

    /// Key with cooperating-attribute substitution for absent values.
    ///
    /// Title keys chain `sort_by -> SortName -> Name`; critic and
    /// community ratings substitute each other across their 0-100 vs.
    /// 0-10 scales; premiere date and production year substitute each
    /// other on the datetime domain.
    pub(crate) fn lenient_key(&self, item: &MediaItem) -> Option<SortValue> {
        match self {
            SortBy::Order | SortBy::Random => None,
            SortBy::Name => Some(SortValue::Text(item.name.clone())),
            SortBy::OriginalTitle => Some(SortValue::Text(
                item.original_title
                    .clone()
                    .or_else(|| item.sort_name.clone())
                    .unwrap_or_else(|| item.name.clone()),
            )),
            SortBy::SortName => Some(SortValue::Text(
                item.sort_name
                    .clone()
                    .unwrap_or_else(|| item.name.clone()),
            )),
            SortBy::CriticRating => Some(SortValue::Number(match item.critic_rating {
                Some(rating) => rating,
                None => item.community_rating.unwrap_or(0.0) * 10.0,
            })),
            SortBy::CommunityRating => Some(SortValue::Number(match item.community_rating {
                Some(rating) => rating,
                None => item.critic_rating.unwrap_or(0.0) / 10.0,
            })),
            SortBy::PremiereDate => Some(SortValue::Date(match item.premiere_date {
                Some(date) => date,
                None => item
                    .production_year
                    .map(year_start)
                    .unwrap_or_else(date_floor),
            })),
            SortBy::ProductionYear => Some(SortValue::Date(match item.production_year {
                Some(year) => year_start(year),
                None => item.premiere_date.unwrap_or_else(date_floor),
            })),
            SortBy::DateCreated | SortBy::RunTimeTicks => self.strict_key(item),
        }
    }
}
