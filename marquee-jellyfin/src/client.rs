//! HTTP client implementing `MediaLibrary` against a Jellyfin server.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use marquee_core::library::{
    Genre, ItemQuery, LibraryError, LibraryResult, LibraryView, MediaItem, MediaLibrary, UserPolicy,
};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::models::{AuthResponse, Page, WireGenre, WireItem, WireUser, WireView};

const APP_NAME: &str = "Marquee";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ids per bulk-fetch request, bounding URL length.
const ID_CHUNK_SIZE: usize = 60;

/// Item metadata the engine filters and sorts on; servers omit most of it
/// unless asked.
const ITEM_FIELDS: &str =
    "SortName,OriginalTitle,DateCreated,Genres,Tags,People,CustomRating,CriticRating";

/// Deterministic server-side pre-sort so scope fetches are stable across
/// evaluations.
const PRESORT_BY: &str = "SortName,ProductionYear";

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Pw")]
    password: &'a str,
}

/// Authenticated session against a Jellyfin-compatible media server.
///
/// The session identifies itself with a `MediaBrowser` authorization
/// header carrying a stable, host-derived device identity. Retry and
/// caching policy stay here; the engine never sees transport concerns.
#[derive(Debug)]
pub struct JellyfinClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: String,
    user_id: String,
}

fn device_identity() -> (String, String) {
    let device = std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "marquee-host".to_string());
    let mut hasher = std::hash::DefaultHasher::new();
    device.hash(&mut hasher);
    let device_id = format!("{:016x}", hasher.finish());
    (device, device_id)
}

impl JellyfinClient {
    /// Authenticate against the server and return a ready client.
    ///
    /// # Errors
    /// - `LibraryError::Network` - Server unreachable
    /// - `LibraryError::Auth` - Credentials rejected
    /// - `LibraryError::Decode` - Malformed authentication response
    pub async fn connect(
        base_url: &str,
        username: &str,
        password: &str,
    ) -> LibraryResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let (device, device_id) = device_identity();
        let client_header = format!(
            "MediaBrowser Client=\"{APP_NAME}\", Device=\"{device}\", \
             DeviceId=\"{device_id}\", Version=\"{APP_VERSION}\""
        );

        let client = reqwest::Client::new();
        let url = format!("{base_url}/Users/AuthenticateByName");
        let response = client
            .post(&url)
            .header(AUTHORIZATION, &client_header)
            .json(&AuthRequest { username, password })
            .send()
            .await
            .map_err(|e| LibraryError::Network {
                reason: format!("Authentication request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(LibraryError::Auth {
                reason: format!("Server rejected credentials: HTTP {}", response.status()),
            });
        }

        let auth: AuthResponse = response.json().await.map_err(|e| LibraryError::Decode {
            reason: format!("Authentication response: {e}"),
        })?;

        info!("Authenticated as user id '{}'", auth.user.id);
        Ok(Self {
            client,
            base_url,
            auth_header: format!("{client_header}, Token=\"{}\"", auth.access_token),
            user_id: auth.user.id,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> LibraryResult<T> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .query(params)
            .send()
            .await
            .map_err(|e| LibraryError::Network {
                reason: format!("GET {path} failed: {e}"),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LibraryError::Auth {
                reason: format!("GET {path}: session rejected"),
            });
        }
        if !status.is_success() {
            return Err(LibraryError::Network {
                reason: format!("GET {path}: HTTP {status}"),
            });
        }

        response.json().await.map_err(|e| LibraryError::Decode {
            reason: format!("GET {path}: {e}"),
        })
    }

    fn presort_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SortBy", PRESORT_BY.to_string()),
            ("SortOrder", "Ascending".to_string()),
            ("Recursive", "true".to_string()),
        ]
    }
}

#[async_trait]
impl MediaLibrary for JellyfinClient {
    async fn genres(&self) -> LibraryResult<Vec<Genre>> {
        let mut params = self.presort_params();
        params.push(("userId", self.user_id.clone()));
        let page: Page<WireGenre> = self.get_json("Genres", &params).await?;
        Ok(page.items.into_iter().map(Genre::from).collect())
    }

    async fn views(&self) -> LibraryResult<Vec<LibraryView>> {
        let params = [("userId", self.user_id.clone())];
        let page: Page<WireView> = self.get_json("UserViews", &params).await?;
        Ok(page.items.into_iter().map(LibraryView::from).collect())
    }

    async fn items(&self, query: &ItemQuery) -> LibraryResult<Vec<MediaItem>> {
        let mut params = self.presort_params();
        params.push(("Filters", "IsNotFolder".to_string()));
        params.push(("Fields", ITEM_FIELDS.to_string()));
        if let Some(parent_id) = &query.parent_id {
            params.push(("ParentId", parent_id.clone()));
        }
        if !query.item_types.is_empty() {
            params.push(("IncludeItemTypes", query.item_types.join(",")));
        }
        if !query.genre_ids.is_empty() {
            params.push(("GenreIds", query.genre_ids.join("|")));
        }

        let path = format!("Users/{}/Items", self.user_id);
        let page: Page<WireItem> = self.get_json(&path, &params).await?;
        debug!("Listed {} items for query {:?}", page.items.len(), query);
        Ok(page.items.into_iter().map(MediaItem::from).collect())
    }

    async fn items_by_ids(&self, ids: &[String]) -> LibraryResult<Vec<MediaItem>> {
        let path = format!("Users/{}/Items", self.user_id);
        let mut items = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(ID_CHUNK_SIZE) {
            let params = [
                ("ids", chunk.join(",")),
                ("Fields", ITEM_FIELDS.to_string()),
            ];
            let page: Page<WireItem> = self.get_json(&path, &params).await?;
            items.extend(page.items.into_iter().map(MediaItem::from));
        }
        debug!("Fetched {} of {} requested items", items.len(), ids.len());
        Ok(items)
    }

    async fn user_policy(&self, user_id: &str) -> LibraryResult<UserPolicy> {
        let path = format!("Users/{user_id}");
        let user: WireUser = self.get_json(&path, &[]).await.map_err(|e| match e {
            LibraryError::Network { reason } if reason.contains("HTTP 404") => {
                LibraryError::UnknownUser {
                    user_id: user_id.to_string(),
                }
            }
            other => other,
        })?;
        Ok(UserPolicy::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_identity_is_stable() {
        let (device_a, id_a) = device_identity();
        let (device_b, id_b) = device_identity();
        assert_eq!(device_a, device_b);
        assert_eq!(id_a, id_b);
        assert_eq!(id_a.len(), 16);
    }
}
