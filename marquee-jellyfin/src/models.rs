//! Wire models for the Jellyfin HTTP API.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use marquee_core::library::{Genre, LibraryView, MediaItem, Person, UserPolicy};
use serde::Deserialize;

/// Response from `Users/AuthenticateByName`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthResponse {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthUser {
    pub id: String,
}

/// Envelope shared by every item-listing endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireGenre {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl From<WireGenre> for Genre {
    fn from(wire: WireGenre) -> Self {
        Genre {
            id: wire.id,
            name: wire.name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireView {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub collection_type: Option<String>,
}

impl From<WireView> for LibraryView {
    fn from(wire: WireView) -> Self {
        LibraryView {
            id: wire.id,
            name: wire.name,
            collection_type: wire.collection_type.unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WirePerson {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sort_name: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(rename = "Type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub production_year: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub genre_items: Vec<WireGenre>,
    #[serde(default)]
    pub run_time_ticks: Option<i64>,
    #[serde(default)]
    pub community_rating: Option<f64>,
    #[serde(default)]
    pub critic_rating: Option<f64>,
    #[serde(default)]
    pub official_rating: Option<String>,
    #[serde(default)]
    pub custom_rating: Option<String>,
    #[serde(default)]
    pub people: Vec<WirePerson>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub premiere_date: Option<String>,
}

/// Parse a server timestamp leniently.
///
/// Jellyfin emits RFC 3339 with seven fractional digits; older servers
/// emit naive timestamps or bare dates. Unparseable values read as
/// absent, never as an error.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(text) {
        return Some(stamped.naive_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

impl From<WireItem> for MediaItem {
    fn from(wire: WireItem) -> Self {
        MediaItem {
            id: wire.id,
            name: wire.name,
            sort_name: wire.sort_name,
            original_title: wire.original_title,
            media_type: wire.media_type,
            item_type: wire.item_type,
            production_year: wire.production_year,
            tags: wire.tags,
            genre_ids: wire
                .genre_items
                .into_iter()
                .map(|genre| genre.id)
                .collect(),
            runtime_ticks: wire.run_time_ticks,
            community_rating: wire.community_rating,
            critic_rating: wire.critic_rating,
            official_rating: wire.official_rating,
            custom_rating: wire.custom_rating,
            people: wire
                .people
                .into_iter()
                .map(|person| Person {
                    id: person.id,
                    name: person.name,
                })
                .collect(),
            date_created: wire.date_created.as_deref().and_then(parse_timestamp),
            premiere_date: wire.premiere_date.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Response from `Users/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireUser {
    #[serde(default)]
    pub policy: Option<WirePolicy>,
}

/// Rating ceilings arrive as labels on some servers and integers on
/// others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RatingLabel {
    Number(i64),
    Text(String),
}

impl RatingLabel {
    fn into_text(self) -> String {
        match self {
            RatingLabel::Number(value) => value.to_string(),
            RatingLabel::Text(value) => value,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WirePolicy {
    #[serde(default)]
    pub max_parental_rating: Option<RatingLabel>,
}

impl From<WireUser> for UserPolicy {
    fn from(wire: WireUser) -> Self {
        UserPolicy {
            max_parental_rating: wire
                .policy
                .and_then(|policy| policy.max_parental_rating)
                .map(RatingLabel::into_text),
        }
    }
}
