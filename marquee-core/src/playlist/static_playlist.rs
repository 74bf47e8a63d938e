//! Explicit, order-preserving playlists and the sorting engine.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use tracing::debug;

use super::sort::{SortBy, SortOptions, SortValue};
use super::{PlaylistError, PlaylistResult};
use crate::library::MediaLibrary;

/// A playlist specified as an explicit, fixed sequence of item ids.
///
/// Construction deduplicates the sequence preserving first occurrence;
/// the optional limit binds to the sorted sequence, never to the stored
/// one.
#[derive(Debug, Clone)]
pub struct StaticPlaylist {
    name: String,
    item_ids: Vec<String>,
    options: SortOptions,
    limit: Option<usize>,
}

impl StaticPlaylist {
    /// Build a playlist from an id sequence.
    pub fn new(
        name: &str,
        item_ids: Vec<String>,
        options: SortOptions,
        limit: Option<usize>,
    ) -> Self {
        let mut seen = HashSet::new();
        let item_ids = item_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self {
            name: name.to_string(),
            item_ids,
            options,
            limit,
        }
    }

    /// Playlist name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored id sequence, deduplicated in first-occurrence order.
    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    /// Sort configuration.
    pub fn options(&self) -> SortOptions {
        self.options
    }

    /// Result limit, applied after sorting.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn apply_limit(&self, mut item_ids: Vec<String>) -> Vec<String> {
        if let Some(limit) = self.limit {
            debug!("Limiting playlist '{}' to {} items", self.name, limit);
            item_ids.truncate(limit);
        }
        item_ids
    }

    /// Produce the ordered id sequence.
    ///
    /// `order` and `random` never contact the library; attribute sorts
    /// bulk-fetch metadata and apply a stable sort, so ties keep their
    /// fetch order. The limit is applied to the sorted sequence.
    ///
    /// # Errors
    /// - `PlaylistError::Library` - Metadata fetch failed
    /// - `PlaylistError::MissingSortKey` - Internal key-resolution gap
    pub async fn sort(&self, library: &dyn MediaLibrary) -> PlaylistResult<Vec<String>> {
        debug!("Sorting playlist '{}' by '{}'", self.name, self.options.by);

        match self.options.by {
            SortBy::Order => {
                let mut item_ids = self.item_ids.clone();
                if !self.options.ascending {
                    item_ids.reverse();
                }
                return Ok(self.apply_limit(item_ids));
            }
            SortBy::Random => {
                let mut item_ids = self.item_ids.clone();
                item_ids.shuffle(&mut rand::rng());
                return Ok(self.apply_limit(item_ids));
            }
            _ => {}
        }

        let items = library.items_by_ids(&self.item_ids).await?;
        debug!("Fetched {} items for playlist '{}'", items.len(), self.name);

        let mut entries: Vec<(SortValue, String)> = Vec::with_capacity(items.len());
        for item in items {
            let key = if self.options.strict {
                self.options.by.strict_key(&item)
            } else {
                self.options.by.lenient_key(&item)
            };
            let key = key.ok_or_else(|| PlaylistError::MissingSortKey {
                name: self.options.by.to_string(),
            })?;
            entries.push((key, item.id));
        }

        if self.options.ascending {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        } else {
            entries.sort_by(|a, b| b.0.cmp(&a.0));
        }

        let item_ids = entries.into_iter().map(|(_, id)| id).collect();
        Ok(self.apply_limit(item_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{InMemoryLibrary, MediaItem};

    fn rated_movie(id: &str, critic: Option<f64>, community: Option<f64>) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            name: format!("Movie {id}"),
            critic_rating: critic,
            community_rating: community,
            ..MediaItem::default()
        }
    }

    fn options(by: &str, ascending: bool, strict: bool) -> SortOptions {
        SortOptions {
            by: by.parse().unwrap(),
            ascending,
            strict,
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_dedup_preserves_first_occurrence() {
        let playlist = StaticPlaylist::new(
            "mix",
            ids(&["a", "b", "a", "c", "b"]),
            SortOptions::default(),
            None,
        );
        assert_eq!(playlist.item_ids(), ids(&["a", "b", "c"]).as_slice());
    }

    #[tokio::test]
    async fn test_order_sort_descending_reverses() {
        let library = InMemoryLibrary::new();
        let playlist = StaticPlaylist::new(
            "mix",
            ids(&["a", "b", "c"]),
            options("order", false, false),
            None,
        );
        let sorted = playlist.sort(&library).await.unwrap();
        assert_eq!(sorted, ids(&["c", "b", "a"]));
    }

    #[tokio::test]
    async fn test_random_sort_is_a_permutation() {
        let library = InMemoryLibrary::new();
        let playlist = StaticPlaylist::new(
            "mix",
            ids(&["a", "b", "c", "d"]),
            options("random", true, false),
            None,
        );
        let mut sorted = playlist.sort(&library).await.unwrap();
        sorted.sort();
        assert_eq!(sorted, ids(&["a", "b", "c", "d"]));
    }

    #[tokio::test]
    async fn test_attribute_sort_strict_vs_lenient() {
        let library = InMemoryLibrary::new()
            .with_item("v", rated_movie("a", Some(40.0), None))
            .with_item("v", rated_movie("b", None, Some(50.0)));

        // Lenient: b's community 50 becomes critic-scale 500, above a's 40.
        let lenient = StaticPlaylist::new(
            "mix",
            ids(&["a", "b"]),
            options("CriticRating", false, false),
            None,
        );
        assert_eq!(lenient.sort(&library).await.unwrap(), ids(&["b", "a"]));

        // Strict: b has no critic rating and keys to 0, below a's 40.
        let strict = StaticPlaylist::new(
            "mix",
            ids(&["a", "b"]),
            options("CriticRating", false, true),
            None,
        );
        assert_eq!(strict.sort(&library).await.unwrap(), ids(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_limit_binds_to_sorted_sequence() {
        let library = InMemoryLibrary::new()
            .with_item("v", rated_movie("low", Some(10.0), None))
            .with_item("v", rated_movie("mid", Some(50.0), None))
            .with_item("v", rated_movie("high", Some(90.0), None));

        let playlist = StaticPlaylist::new(
            "top",
            ids(&["low", "mid", "high"]),
            options("CriticRating", false, true),
            Some(2),
        );
        let sorted = playlist.sort(&library).await.unwrap();
        assert_eq!(sorted, ids(&["high", "mid"]));
    }

    #[tokio::test]
    async fn test_order_sort_applies_limit() {
        let library = InMemoryLibrary::new();
        let playlist = StaticPlaylist::new(
            "mix",
            ids(&["a", "b", "c"]),
            options("order", true, false),
            Some(2),
        );
        let sorted = playlist.sort(&library).await.unwrap();
        assert_eq!(sorted, ids(&["a", "b"]));
    }
}
