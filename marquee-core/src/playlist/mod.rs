//! Playlist definitions and resolution
//!
//! A playlist definition is either static (an explicit id sequence) or
//! dynamic (an include/exclude rule set compiled against live metadata).
//! Both variants share one sort contract and resolve into the same
//! static-shaped result.

pub mod dynamic;
pub mod sort;
pub mod static_playlist;

pub use dynamic::{DynamicPlaylist, FilterRules};
pub use sort::{SortBy, SortOptions, SortValue};
pub use static_playlist::StaticPlaylist;

use crate::library::{LibraryError, MediaLibrary};
use crate::range::RangeError;

/// Unified error type for playlist construction and resolution
#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    /// Sort key outside the supported vocabulary.
    #[error("Can't sort by '{name}'")]
    UnsupportedSort {
        /// The rejected sort key
        name: String,
    },

    /// A validated sort key reached resolution without a key function.
    #[error("No key function for sort attribute '{name}'")]
    MissingSortKey {
        /// The sort key lacking a key function
        name: String,
    },

    /// An attribute filter carries a malformed interval expression.
    #[error("Invalid '{attribute}' filter: {source}")]
    InvalidFilter {
        /// The attribute whose rule failed to compile
        attribute: &'static str,
        /// Underlying parse failure
        source: RangeError,
    },

    /// Underlying library operation failed.
    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Result type for playlist operations
pub type PlaylistResult<T> = Result<T, PlaylistError>;

/// A playlist definition, polymorphic over static and dynamic variants.
#[derive(Debug, Clone)]
pub enum Playlist {
    /// Explicit, fixed id sequence
    Static(StaticPlaylist),
    /// Include/exclude rule set resolved at evaluation time
    Dynamic(DynamicPlaylist),
}

impl Playlist {
    /// Playlist name.
    pub fn name(&self) -> &str {
        match self {
            Playlist::Static(playlist) => playlist.name(),
            Playlist::Dynamic(playlist) => playlist.name(),
        }
    }

    /// Sort configuration.
    pub fn options(&self) -> SortOptions {
        match self {
            Playlist::Static(playlist) => playlist.options(),
            Playlist::Dynamic(playlist) => playlist.options(),
        }
    }

    /// Resolve into a static-shaped playlist.
    ///
    /// Identity for static definitions; dynamic definitions compile their
    /// rule set against the library. The result is produced fresh on
    /// every call and never cached.
    ///
    /// # Errors
    /// - `PlaylistError::Library` - A library query failed during
    ///   compilation
    pub async fn resolve(&self, library: &dyn MediaLibrary) -> PlaylistResult<StaticPlaylist> {
        match self {
            Playlist::Static(playlist) => Ok(playlist.clone()),
            Playlist::Dynamic(playlist) => playlist.compile(library).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::InMemoryLibrary;

    #[tokio::test]
    async fn test_static_resolve_is_identity() {
        let playlist = Playlist::Static(StaticPlaylist::new(
            "fixed",
            vec!["a".to_string(), "b".to_string()],
            SortOptions::default(),
            None,
        ));
        let resolved = playlist.resolve(&InMemoryLibrary::new()).await.unwrap();
        assert_eq!(resolved.item_ids(), &["a", "b"]);
    }

    #[tokio::test]
    async fn test_dynamic_resolve_compiles() {
        let playlist = Playlist::Dynamic(
            DynamicPlaylist::new(
                "empty-rules",
                None,
                FilterRules::default(),
                FilterRules::default(),
                SortOptions::default(),
            )
            .unwrap(),
        );
        let resolved = playlist.resolve(&InMemoryLibrary::new()).await.unwrap();
        assert!(resolved.item_ids().is_empty());
        assert_eq!(resolved.name(), "empty-rules");
    }
}
