//! Declarative configuration model
//!
//! Serde schema for the YAML rule set plus validated conversion into
//! engine types. Reading files stays with the caller; this module parses
//! text, case-normalizes names and rejects duplicates. Scalar fields
//! accept both YAML lists and comma-separated strings.

use std::collections::HashSet;

use serde::Deserialize;

use crate::playlist::dynamic::split_commas;
use crate::playlist::{
    DynamicPlaylist, FilterRules, Playlist, PlaylistError, SortOptions, StaticPlaylist,
};
use crate::selection::{SelectionError, SelectionRule};

/// Fallback result limit for dynamic playlists.
const DEFAULT_DYNAMIC_LIMIT: usize = 10;

/// Errors raised while parsing or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// YAML text failed to parse.
    #[error("Configuration parsing failed: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A name appears more than once within its list.
    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName {
        /// Which list carries the duplicate
        kind: &'static str,
        /// The duplicated, case-normalized name
        name: String,
    },

    /// A playlist declares a type other than static or dynamic.
    #[error("Unknown playlist type '{kind}' for playlist '{name}'")]
    UnknownPlaylistType {
        /// Playlist carrying the unknown type
        name: String,
        /// The rejected type value
        kind: String,
    },

    /// A required field is absent.
    #[error("Playlist '{name}' is missing required field '{field}'")]
    MissingField {
        /// Playlist missing the field
        name: String,
        /// The absent field
        field: &'static str,
    },

    /// The server section is absent but required for the operation.
    #[error("Configuration is missing the server section")]
    MissingServer,

    /// The selection list is empty.
    #[error("The selection list must not be empty")]
    EmptySelection,

    /// The playlists list is empty.
    #[error("The playlists list must not be empty")]
    EmptyPlaylists,

    /// A selection rule failed to build.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// A playlist definition failed to build.
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
}

/// A YAML scalar accepted wherever the engine expects text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConfigScalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ConfigScalar {
    fn into_text(self) -> String {
        match self {
            ConfigScalar::Text(value) => value,
            ConfigScalar::Int(value) => value.to_string(),
            ConfigScalar::Float(value) => value.to_string(),
            ConfigScalar::Bool(value) => value.to_string(),
        }
    }
}

/// A scalar or a list of scalars.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScalarOrList {
    Scalar(ConfigScalar),
    List(Vec<ConfigScalar>),
}

impl ScalarOrList {
    fn into_list(self) -> Vec<String> {
        match self {
            ScalarOrList::Scalar(scalar) => split_commas(&scalar.into_text()),
            ScalarOrList::List(values) => {
                values.into_iter().map(ConfigScalar::into_text).collect()
            }
        }
    }

    fn into_text(self) -> String {
        match self {
            ScalarOrList::Scalar(scalar) => scalar.into_text(),
            ScalarOrList::List(values) => values
                .into_iter()
                .map(ConfigScalar::into_text)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Connection settings for the remote media server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Viewer whose policy feeds the viewer-age predicate
    #[serde(default)]
    pub user_id: Option<String>,
}

/// One named selection rule as written in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub hours: Option<ConfigScalar>,
    #[serde(default)]
    pub weekdays: Option<ConfigScalar>,
    #[serde(default)]
    pub days: Option<ConfigScalar>,
    #[serde(default)]
    pub weeks: Option<ConfigScalar>,
    #[serde(default)]
    pub months: Option<ConfigScalar>,
    #[serde(default)]
    pub years: Option<ConfigScalar>,
    #[serde(default)]
    pub dates: Option<ConfigScalar>,
    #[serde(default)]
    pub user_age: Option<ConfigScalar>,
}

impl RuleConfig {
    fn build(self) -> Result<SelectionRule, ConfigError> {
        let mut rule = SelectionRule::new(&self.name)
            .with_disabled(self.disabled)
            .with_selected(self.selected);
        if let Some(expr) = self.hours {
            rule = rule.with_hours(&expr.into_text())?;
        }
        if let Some(expr) = self.weekdays {
            rule = rule.with_weekdays(&expr.into_text())?;
        }
        if let Some(expr) = self.days {
            rule = rule.with_days(&expr.into_text())?;
        }
        if let Some(expr) = self.weeks {
            rule = rule.with_weeks(&expr.into_text())?;
        }
        if let Some(expr) = self.months {
            rule = rule.with_months(&expr.into_text())?;
        }
        if let Some(expr) = self.years {
            rule = rule.with_years(&expr.into_text())?;
        }
        if let Some(expr) = self.dates {
            rule = rule.with_dates(&expr.into_text())?;
        }
        if let Some(expr) = self.user_age {
            rule = rule.with_viewer_age(&expr.into_text())?;
        }
        Ok(rule)
    }
}

/// One playlist definition as written in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistConfig {
    pub name: String,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_true")]
    pub sort_ascending: bool,
    #[serde(default)]
    pub sort_strict: bool,
    pub items: ItemsConfig,
}

fn default_sort_by() -> String {
    "order".to_string()
}

fn default_true() -> bool {
    true
}

/// Item source for a playlist: explicit ids or include/exclude rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub ids: Option<ScalarOrList>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub include: Option<FilterConfig>,
    #[serde(default)]
    pub exclude: Option<FilterConfig>,
}

/// Include or exclude facet values as written in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub item_types: Option<ScalarOrList>,
    #[serde(default)]
    pub genres: Option<ScalarOrList>,
    #[serde(default)]
    pub library_types: Option<ScalarOrList>,
    #[serde(default)]
    pub library_ids: Option<ScalarOrList>,
    #[serde(default)]
    pub item_ids: Option<ScalarOrList>,
    #[serde(default)]
    pub years: Option<ScalarOrList>,
    #[serde(default)]
    pub tags: Option<ScalarOrList>,
    #[serde(default)]
    pub people_ids: Option<ScalarOrList>,
    #[serde(default)]
    pub startswith_name: Option<ConfigScalar>,
    #[serde(default)]
    pub runtime: Option<ConfigScalar>,
    #[serde(default)]
    pub community_rating: Option<ConfigScalar>,
    #[serde(default)]
    pub critic_rating: Option<ConfigScalar>,
    #[serde(default)]
    pub official_rating: Option<ConfigScalar>,
    #[serde(default)]
    pub custom_rating: Option<ConfigScalar>,
}

impl FilterConfig {
    fn into_rules(self) -> FilterRules {
        FilterRules {
            item_types: self.item_types.map(ScalarOrList::into_list),
            genres: self.genres.map(ScalarOrList::into_list),
            library_types: self.library_types.map(ScalarOrList::into_list),
            library_ids: self.library_ids.map(ScalarOrList::into_list),
            item_ids: self.item_ids.map(ScalarOrList::into_list),
            years: self.years.map(ScalarOrList::into_text),
            tags: self.tags.map(ScalarOrList::into_list),
            people_ids: self.people_ids.map(ScalarOrList::into_list),
            startswith_name: self.startswith_name.map(ConfigScalar::into_text),
            runtime: self.runtime.map(ConfigScalar::into_text),
            community_rating: self.community_rating.map(ConfigScalar::into_text),
            critic_rating: self.critic_rating.map(ConfigScalar::into_text),
            official_rating: self.official_rating.map(ConfigScalar::into_text),
            custom_rating: self.custom_rating.map(ConfigScalar::into_text),
        }
    }
}

impl PlaylistConfig {
    fn build(self) -> Result<Playlist, ConfigError> {
        let options = SortOptions {
            by: self.sort_by.parse()?,
            ascending: self.sort_ascending,
            strict: self.sort_strict,
        };
        let name = self.name.to_lowercase();
        match self.items.kind.as_str() {
            "static" => {
                let ids = self.items.ids.ok_or_else(|| ConfigError::MissingField {
                    name: name.clone(),
                    field: "ids",
                })?;
                Ok(Playlist::Static(StaticPlaylist::new(
                    &name,
                    ids.into_list(),
                    options,
                    None,
                )))
            }
            "dynamic" => {
                let include = self.items.include.unwrap_or_default().into_rules();
                let exclude = self.items.exclude.unwrap_or_default().into_rules();
                let limit = self.items.limit.unwrap_or(DEFAULT_DYNAMIC_LIMIT);
                Ok(Playlist::Dynamic(DynamicPlaylist::new(
                    &name,
                    Some(limit),
                    include,
                    exclude,
                    options,
                )?))
            }
            other => Err(ConfigError::UnknownPlaylistType {
                name,
                kind: other.to_string(),
            }),
        }
    }
}

/// Root of the declarative configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MarqueeConfig {
    /// Remote server settings, consumed by the CLI
    #[serde(default)]
    pub server: Option<ServerConfig>,
    pub selection: Vec<RuleConfig>,
    pub playlists: Vec<PlaylistConfig>,
}

impl MarqueeConfig {
    /// Parse configuration from YAML text.
    ///
    /// # Errors
    /// - `ConfigError::Parse` - Malformed YAML or schema mismatch
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Convert into validated engine inputs.
    ///
    /// Names are case-normalized to lowercase and must be unique within
    /// their list.
    ///
    /// # Errors
    /// - `ConfigError::DuplicateName` - A rule or playlist name repeats
    /// - `ConfigError::UnknownPlaylistType` - Type is not static/dynamic
    /// - `ConfigError::Selection` - A predicate range failed to parse
    /// - `ConfigError::Playlist` - Bad sort key or filter expression
    pub fn into_rules(self) -> Result<(Vec<SelectionRule>, Vec<Playlist>), ConfigError> {
        if self.selection.is_empty() {
            return Err(ConfigError::EmptySelection);
        }
        if self.playlists.is_empty() {
            return Err(ConfigError::EmptyPlaylists);
        }

        let mut rule_names = HashSet::new();
        let mut rules = Vec::with_capacity(self.selection.len());
        for entry in self.selection {
            let name = entry.name.to_lowercase();
            if !rule_names.insert(name.clone()) {
                return Err(ConfigError::DuplicateName {
                    kind: "selection rule",
                    name,
                });
            }
            rules.push(entry.build()?);
        }

        let mut playlist_names = HashSet::new();
        let mut playlists = Vec::with_capacity(self.playlists.len());
        for entry in self.playlists {
            let name = entry.name.to_lowercase();
            if !playlist_names.insert(name.clone()) {
                return Err(ConfigError::DuplicateName {
                    kind: "playlist",
                    name,
                });
            }
            playlists.push(entry.build()?);
        }

        Ok((rules, playlists))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
server:
  url: "http://media.local:8096"
  username: "api-user"
  password: "secret"

selection:
  - name: Evening
    hours: 18-23
  - name: Weekend
    weekdays: 6-7
  - name: Default

playlists:
  - name: Evening
    sort_by: CriticRating
    sort_ascending: false
    items:
      type: dynamic
      limit: 5
      include:
        item_types: Movie
        years: 2000-2010
  - name: Weekend
    items:
      type: dynamic
      include:
        genres: [Action, Comedy]
  - name: Default
    sort_by: order
    items:
      type: static
      ids:
        - abc123
        - def456
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = MarqueeConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.selection.len(), 3);
        assert_eq!(config.playlists.len(), 3);
        assert!(config.server.is_some());

        let (rules, playlists) = config.into_rules().unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].name(), "evening");
        assert_eq!(playlists[2].name(), "default");
        assert!(matches!(playlists[0], Playlist::Dynamic(_)));
        assert!(matches!(playlists[2], Playlist::Static(_)));
    }

    #[test]
    fn test_numeric_predicate_scalar() {
        let yaml = r#"
selection:
  - name: only-june
    months: 6
playlists:
  - name: only-june
    items:
      type: static
      ids: [x]
"#;
        let (rules, _) = MarqueeConfig::from_yaml(yaml).unwrap().into_rules().unwrap();
        assert_eq!(rules[0].name(), "only-june");
    }

    #[test]
    fn test_comma_separated_ids() {
        let yaml = r#"
selection:
  - name: all
playlists:
  - name: all
    items:
      type: static
      ids: "a, b, c"
"#;
        let (_, playlists) = MarqueeConfig::from_yaml(yaml).unwrap().into_rules().unwrap();
        let Playlist::Static(playlist) = &playlists[0] else {
            panic!("expected static playlist");
        };
        assert_eq!(playlist.item_ids(), &["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_playlist_name_rejected() {
        let yaml = r#"
selection:
  - name: all
playlists:
  - name: Mixed
    items:
      type: static
      ids: [a]
  - name: mixed
    items:
      type: static
      ids: [b]
"#;
        assert!(matches!(
            MarqueeConfig::from_yaml(yaml).unwrap().into_rules(),
            Err(ConfigError::DuplicateName {
                kind: "playlist",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_playlist_type_rejected() {
        let yaml = r#"
selection:
  - name: all
playlists:
  - name: smart
    items:
      type: clever
"#;
        assert!(matches!(
            MarqueeConfig::from_yaml(yaml).unwrap().into_rules(),
            Err(ConfigError::UnknownPlaylistType { .. })
        ));
    }

    #[test]
    fn test_unknown_sort_by_rejected() {
        let yaml = r#"
selection:
  - name: all
playlists:
  - name: all
    sort_by: Popularity
    items:
      type: static
      ids: [a]
"#;
        assert!(matches!(
            MarqueeConfig::from_yaml(yaml).unwrap().into_rules(),
            Err(ConfigError::Playlist(PlaylistError::UnsupportedSort { .. }))
        ));
    }

    #[test]
    fn test_static_without_ids_rejected() {
        let yaml = r#"
selection:
  - name: all
playlists:
  - name: all
    items:
      type: static
"#;
        assert!(matches!(
            MarqueeConfig::from_yaml(yaml).unwrap().into_rules(),
            Err(ConfigError::MissingField { field: "ids", .. })
        ));
    }

    #[test]
    fn test_malformed_rule_range_rejected() {
        let yaml = r#"
selection:
  - name: broken
    hours: 5-abc
playlists:
  - name: broken
    items:
      type: static
      ids: [a]
"#;
        assert!(matches!(
            MarqueeConfig::from_yaml(yaml).unwrap().into_rules(),
            Err(ConfigError::Selection(_))
        ));
    }

    #[test]
    fn test_empty_selection_rejected() {
        let yaml = r#"
selection: []
playlists:
  - name: all
    items:
      type: static
      ids: [a]
"#;
        assert!(matches!(
            MarqueeConfig::from_yaml(yaml).unwrap().into_rules(),
            Err(ConfigError::EmptySelection)
        ));
    }
}
