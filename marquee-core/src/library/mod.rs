//! Media library abstraction consumed by the rule engine
//!
//! Provides a consistent interface for genre, view and item queries so the
//! engine can evaluate against a remote media server or an in-memory
//! fixture. Implementations own all transport concerns: retries, timeouts
//! and caching never leak into the engine.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDateTime;
pub use memory::InMemoryLibrary;
use serde::{Deserialize, Serialize};

/// Unified error type for media library operations
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// Authentication or session failure at the backend.
    #[error("Authentication failed: {reason}")]
    Auth {
        /// Description of the authentication failure
        reason: String,
    },

    /// Network communication with the backend failed.
    #[error("Network error: {reason}")]
    Network {
        /// Description of the network failure
        reason: String,
    },

    /// A backend response could not be decoded.
    #[error("Response decoding failed: {reason}")]
    Decode {
        /// Description of the decode failure
        reason: String,
    },

    /// The requested user is not known to the library.
    #[error("Unknown user: {user_id}")]
    UnknownUser {
        /// The user id that was not found
        user_id: String,
    },
}

/// Result type for media library operations
pub type LibraryResult<T> = Result<T, LibraryError>;

/// A genre known to the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
}

/// A top-level library view, such as a movie or show collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryView {
    pub id: String,
    pub name: String,
    /// Collection kind, e.g. `movies` or `tvshows`
    pub collection_type: String,
}

/// A person credited on an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: Option<String>,
}

/// Parental-rating policy attached to a library user.
#[derive(Debug, Clone, Default)]
pub struct UserPolicy {
    /// Content-rating ceiling label, e.g. `"16"` or `"FSK-16"`
    pub max_parental_rating: Option<String>,
}

/// Metadata for a single library item.
///
/// Every field beyond the identifier and display name is optional;
/// upstream servers routinely omit metadata and the engine treats absence
/// as "no value", never as an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    pub sort_name: Option<String>,
    pub original_title: Option<String>,
    pub media_type: Option<String>,
    pub item_type: Option<String>,
    pub production_year: Option<i32>,
    pub tags: Vec<String>,
    pub genre_ids: Vec<String>,
    /// Runtime in 100-nanosecond ticks
    pub runtime_ticks: Option<i64>,
    pub community_rating: Option<f64>,
    pub critic_rating: Option<f64>,
    pub official_rating: Option<String>,
    pub custom_rating: Option<String>,
    pub people: Vec<Person>,
    pub date_created: Option<NaiveDateTime>,
    pub premiere_date: Option<NaiveDateTime>,
}

/// Scope for a bulk item listing.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Restrict to a single library view
    pub parent_id: Option<String>,
    /// Allowed item types, lowercase; empty means all
    pub item_types: Vec<String>,
    /// Restrict to items carrying one of these genres; empty means all
    pub genre_ids: Vec<String>,
}

/// Query capabilities of a media library backend.
///
/// The engine batches identifier lookups through `items_by_ids`; backends
/// should answer those in bulk rather than one round trip per item.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// List every genre known to the library.
    ///
    /// # Errors
    /// - `LibraryError::Network` - Backend unreachable
    /// - `LibraryError::Decode` - Malformed backend response
    async fn genres(&self) -> LibraryResult<Vec<Genre>>;

    /// List the top-level library views.
    ///
    /// # Errors
    /// - `LibraryError::Network` - Backend unreachable
    /// - `LibraryError::Decode` - Malformed backend response
    async fn views(&self) -> LibraryResult<Vec<LibraryView>>;

    /// List items within the query scope.
    ///
    /// # Errors
    /// - `LibraryError::Network` - Backend unreachable
    /// - `LibraryError::Decode` - Malformed backend response
    async fn items(&self, query: &ItemQuery) -> LibraryResult<Vec<MediaItem>>;

    /// Fetch metadata for the given identifiers.
    ///
    /// Requesting N ids returns at most N items; result order is not
    /// guaranteed and unknown ids are silently absent.
    ///
    /// # Errors
    /// - `LibraryError::Network` - Backend unreachable
    /// - `LibraryError::Decode` - Malformed backend response
    async fn items_by_ids(&self, ids: &[String]) -> LibraryResult<Vec<MediaItem>>;

    /// Fetch the viewing policy for a user.
    ///
    /// # Errors
    /// - `LibraryError::UnknownUser` - No such user
    /// - `LibraryError::Network` - Backend unreachable
    async fn user_policy(&self, user_id: &str) -> LibraryResult<UserPolicy>;
}
