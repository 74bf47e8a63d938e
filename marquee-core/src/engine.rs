//! Evaluation pipeline from rule set to compiled playlist
//!
//! Wires the selector, the playlist definitions and the media library
//! together: pick the active rule, resolve its playlist, sort the result.
//! Every evaluation is a single, fresh pass; nothing is cached between
//! calls and a failure anywhere aborts before any output exists.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use crate::config::MarqueeConfig;
use crate::library::{LibraryError, MediaLibrary};
use crate::playlist::{Playlist, PlaylistError};
use crate::selection::{self, SelectionRule, ViewerContext};

/// Unified error type for engine construction and evaluation
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A selection rule names a playlist with no definition.
    #[error("Selected playlist '{name}' is not defined")]
    UnknownPlaylist {
        /// The rule/playlist name lacking a definition
        name: String,
    },

    /// The rule list is empty.
    #[error("At least one selection rule is required")]
    NoRules,

    /// Playlist resolution or sorting failed.
    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    /// A library query failed.
    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// The resolved output of one evaluation: a playlist name and its ordered
/// item identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPlaylist {
    pub name: String,
    pub item_ids: Vec<String>,
}

/// Immutable rule set evaluated against a media library.
#[derive(Debug)]
pub struct PlaylistEngine {
    rules: Vec<SelectionRule>,
    playlists: Vec<Playlist>,
}

impl PlaylistEngine {
    /// Build an engine, verifying that every rule maps to a defined
    /// playlist.
    ///
    /// # Errors
    /// - `EngineError::NoRules` - Empty rule list
    /// - `EngineError::UnknownPlaylist` - A rule names an undefined
    ///   playlist
    pub fn new(rules: Vec<SelectionRule>, playlists: Vec<Playlist>) -> EngineResult<Self> {
        if rules.is_empty() {
            return Err(EngineError::NoRules);
        }
        for rule in &rules {
            if !playlists
                .iter()
                .any(|playlist| playlist.name().eq_ignore_ascii_case(rule.name()))
            {
                return Err(EngineError::UnknownPlaylist {
                    name: rule.name().to_string(),
                });
            }
        }
        Ok(Self { rules, playlists })
    }

    /// Build an engine from parsed configuration.
    ///
    /// # Errors
    /// - `MarqueeError::Config` - Invalid rule or playlist definitions
    /// - `MarqueeError::Engine` - A rule names an undefined playlist
    pub fn from_config(config: MarqueeConfig) -> crate::Result<Self> {
        let (rules, playlists) = config.into_rules()?;
        Ok(Self::new(rules, playlists)?)
    }

    /// Look up a playlist definition by case-insensitive name.
    pub fn playlist(&self, name: &str) -> Option<&Playlist> {
        self.playlists
            .iter()
            .find(|playlist| playlist.name().eq_ignore_ascii_case(name))
    }

    /// Evaluate against the current local time.
    ///
    /// When a viewer user id is given, the viewer's rating policy is
    /// fetched once and handed to the selector for the viewer-age
    /// predicate.
    ///
    /// # Errors
    /// - `EngineError::Library` - A library query failed
    /// - `EngineError::Playlist` - Resolution or sorting failed
    pub async fn evaluate(
        &self,
        library: &dyn MediaLibrary,
        viewer_user_id: Option<&str>,
    ) -> EngineResult<CompiledPlaylist> {
        let viewer = match viewer_user_id {
            Some(user_id) => {
                let policy = library.user_policy(user_id).await?;
                debug!(
                    "Fetched policy for viewer '{}': rating ceiling {:?}",
                    user_id, policy.max_parental_rating
                );
                Some(ViewerContext {
                    max_parental_rating: policy.max_parental_rating,
                })
            }
            None => None,
        };
        self.evaluate_at(library, Local::now().naive_local(), viewer.as_ref())
            .await
    }

    /// Evaluate against a fixed instant.
    ///
    /// # Errors
    /// - `EngineError::Library` - A library query failed
    /// - `EngineError::Playlist` - Resolution or sorting failed
    pub async fn evaluate_at(
        &self,
        library: &dyn MediaLibrary,
        now: NaiveDateTime,
        viewer: Option<&ViewerContext>,
    ) -> EngineResult<CompiledPlaylist> {
        let rule = selection::select(&self.rules, now, viewer).ok_or(EngineError::NoRules)?;
        info!("Selected playlist '{}'", rule.name());

        let playlist = self
            .playlist(rule.name())
            .ok_or_else(|| EngineError::UnknownPlaylist {
                name: rule.name().to_string(),
            })?;

        let resolved = playlist.resolve(library).await?;
        let item_ids = resolved.sort(library).await?;
        info!(
            "Compiled playlist '{}' with {} items",
            rule.name(),
            item_ids.len()
        );

        Ok(CompiledPlaylist {
            name: rule.name().to_string(),
            item_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::config::MarqueeConfig;
    use crate::library::{InMemoryLibrary, MediaItem, UserPolicy};
    use crate::playlist::{SortOptions, StaticPlaylist};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    fn static_playlist(name: &str, ids: &[&str]) -> Playlist {
        Playlist::Static(StaticPlaylist::new(
            name,
            ids.iter().map(|id| id.to_string()).collect(),
            SortOptions::default(),
            None,
        ))
    }

    #[test]
    fn test_rule_without_playlist_rejected() {
        let rules = vec![SelectionRule::new("orphan")];
        let playlists = vec![static_playlist("other", &["a"])];
        assert!(matches!(
            PlaylistEngine::new(rules, playlists),
            Err(EngineError::UnknownPlaylist { .. })
        ));
    }

    #[test]
    fn test_empty_rules_rejected() {
        assert!(matches!(
            PlaylistEngine::new(vec![], vec![static_playlist("a", &["x"])]),
            Err(EngineError::NoRules)
        ));
    }

    #[tokio::test]
    async fn test_evaluate_selects_by_hour() {
        let rules = vec![
            SelectionRule::new("day").with_hours("6-17").unwrap(),
            SelectionRule::new("night"),
        ];
        let playlists = vec![
            static_playlist("day", &["d1", "d2"]),
            static_playlist("night", &["n1"]),
        ];
        let engine = PlaylistEngine::new(rules, playlists).unwrap();
        let library = InMemoryLibrary::new();

        let morning = engine.evaluate_at(&library, at(9), None).await.unwrap();
        assert_eq!(morning.name, "day");
        assert_eq!(morning.item_ids, vec!["d1", "d2"]);

        let evening = engine.evaluate_at(&library, at(22), None).await.unwrap();
        assert_eq!(evening.name, "night");
        assert_eq!(evening.item_ids, vec!["n1"]);
    }

    #[tokio::test]
    async fn test_evaluate_fetches_viewer_policy() {
        let rules = vec![
            SelectionRule::new("kids").with_viewer_age("-12").unwrap(),
            SelectionRule::new("general"),
        ];
        let playlists = vec![
            static_playlist("kids", &["k1"]),
            static_playlist("general", &["g1"]),
        ];
        let engine = PlaylistEngine::new(rules, playlists).unwrap();
        let library = InMemoryLibrary::new().with_user(
            "child",
            UserPolicy {
                max_parental_rating: Some("6".to_string()),
            },
        );

        let compiled = engine.evaluate(&library, Some("child")).await.unwrap();
        assert_eq!(compiled.name, "kids");
    }

    #[tokio::test]
    async fn test_end_to_end_dynamic_scenario() {
        let yaml = r#"
selection:
  - name: features

playlists:
  - name: Features
    sort_by: ProductionYear
    sort_ascending: false
    sort_strict: true
    items:
      type: dynamic
      limit: 2
      include:
        item_types: Movie
        years: 2000-2010
"#;
        let config = MarqueeConfig::from_yaml(yaml).unwrap();
        let engine = PlaylistEngine::from_config(config).unwrap();

        let years = [1999, 2001, 2005, 2010, 2015];
        let mut library = InMemoryLibrary::new().with_view("v1", "Movies", "movies");
        for (index, year) in years.iter().enumerate() {
            library = library.with_item(
                "v1",
                MediaItem {
                    id: format!("m{index}"),
                    name: format!("Movie {year}"),
                    item_type: Some("Movie".to_string()),
                    production_year: Some(*year),
                    ..MediaItem::default()
                },
            );
        }

        let compiled = engine.evaluate_at(&library, at(12), None).await.unwrap();
        assert_eq!(compiled.name, "features");
        // 2001, 2005 and 2010 are in range; descending year order keeps
        // the top two.
        assert_eq!(compiled.item_ids, vec!["m3", "m2"]);
    }
}
