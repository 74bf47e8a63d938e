//! In-memory media library for tests and offline evaluation.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{
    Genre, ItemQuery, LibraryError, LibraryResult, LibraryView, MediaItem, MediaLibrary, UserPolicy,
};

/// Deterministic in-process library backed by fixture data.
///
/// Mirrors the filtering a real server performs for item queries: view
/// scoping, item-type narrowing and genre narrowing all happen here so the
/// engine exercises the same code paths it uses against a remote backend.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    genres: Vec<Genre>,
    views: Vec<LibraryView>,
    items: Vec<(String, MediaItem)>,
    users: HashMap<String, UserPolicy>,
}

impl InMemoryLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a genre to the library vocabulary.
    pub fn with_genre(mut self, id: &str, name: &str) -> Self {
        self.genres.push(Genre {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Add a library view.
    pub fn with_view(mut self, id: &str, name: &str, collection_type: &str) -> Self {
        self.views.push(LibraryView {
            id: id.to_string(),
            name: name.to_string(),
            collection_type: collection_type.to_string(),
        });
        self
    }

    /// Add an item under the given view.
    pub fn with_item(mut self, view_id: &str, item: MediaItem) -> Self {
        self.items.push((view_id.to_string(), item));
        self
    }

    /// Register a user policy.
    pub fn with_user(mut self, user_id: &str, policy: UserPolicy) -> Self {
        self.users.insert(user_id.to_string(), policy);
        self
    }

    fn matches_query(&self, view_id: &str, item: &MediaItem, query: &ItemQuery) -> bool {
        if let Some(parent_id) = &query.parent_id
            && parent_id != view_id
        {
            return false;
        }
        if !query.item_types.is_empty() {
            let item_type = item.item_type.as_deref().unwrap_or_default().to_lowercase();
            if !query.item_types.contains(&item_type) {
                return false;
            }
        }
        if !query.genre_ids.is_empty()
            && !item.genre_ids.iter().any(|id| query.genre_ids.contains(id))
        {
            return false;
        }
        true
    }
}

#[async_trait]
impl MediaLibrary for InMemoryLibrary {
    async fn genres(&self) -> LibraryResult<Vec<Genre>> {
        Ok(self.genres.clone())
    }

    async fn views(&self) -> LibraryResult<Vec<LibraryView>> {
        Ok(self.views.clone())
    }

    async fn items(&self, query: &ItemQuery) -> LibraryResult<Vec<MediaItem>> {
        Ok(self
            .items
            .iter()
            .filter(|(view_id, item)| self.matches_query(view_id, item, query))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn items_by_ids(&self, ids: &[String]) -> LibraryResult<Vec<MediaItem>> {
        Ok(self
            .items
            .iter()
            .filter(|(_, item)| ids.contains(&item.id))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn user_policy(&self, user_id: &str) -> LibraryResult<UserPolicy> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| LibraryError::UnknownUser {
                user_id: user_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: &str, name: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            name: name.to_string(),
            item_type: Some("Movie".to_string()),
            ..MediaItem::default()
        }
    }

    #[tokio::test]
    async fn test_items_scoped_by_view() {
        let library = InMemoryLibrary::new()
            .with_view("v1", "Movies", "movies")
            .with_view("v2", "Shows", "tvshows")
            .with_item("v1", movie("m1", "First"))
            .with_item("v2", movie("s1", "Second"));

        let query = ItemQuery {
            parent_id: Some("v1".to_string()),
            ..ItemQuery::default()
        };
        let items = library.items(&query).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "m1");
    }

    #[tokio::test]
    async fn test_items_by_ids_ignores_unknown() {
        let library = InMemoryLibrary::new().with_item("v1", movie("m1", "First"));
        let ids = vec!["m1".to_string(), "ghost".to_string()];
        let items = library.items_by_ids(&ids).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_policy() {
        let library = InMemoryLibrary::new();
        assert!(matches!(
            library.user_policy("nobody").await,
            Err(LibraryError::UnknownUser { .. })
        ));
    }
}
