//! Dynamic playlist compilation
//!
//! Resolves an include/exclude rule set against live library metadata into
//! a concrete, deduplicated identifier list. Compilation runs in two
//! phases: scope resolution (item types, genres, library views) narrows
//! what is fetched, then per-attribute rules filter the fetched items.
//! Explicit id overrides are applied last.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::sort::SortOptions;
use super::static_playlist::StaticPlaylist;
use super::{PlaylistError, PlaylistResult};
use crate::library::{Genre, ItemQuery, MediaItem, MediaLibrary};
use crate::range::Range;

/// Full item-type vocabulary, matched case-insensitively.
const ITEM_TYPE_VOCABULARY: &[&str] = &[
    "aggregatefolder",
    "boxset",
    "collectionfolder",
    "episode",
    "movie",
    "season",
    "series",
    "video",
];

/// Full library collection-type vocabulary.
const LIBRARY_TYPE_VOCABULARY: &[&str] = &[
    "unknown",
    "movies",
    "tvshows",
    "homevideos",
    "boxsets",
    "playlists",
    "folders",
];

/// 100-nanosecond ticks per minute of runtime.
const TICKS_PER_MINUTE: f64 = 10_000_000.0 * 60.0;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("valid token pattern"));

/// Include or exclude rule values for one side of a dynamic definition.
///
/// Scope facets (`item_types`, `genres`, `library_types`, `library_ids`)
/// shape the fetch; attribute facets filter fetched items; `item_ids` is
/// the unconditional override list.
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    pub item_types: Option<Vec<String>>,
    pub genres: Option<Vec<String>>,
    pub library_types: Option<Vec<String>>,
    pub library_ids: Option<Vec<String>>,
    pub item_ids: Option<Vec<String>>,
    /// Interval expression or comma-separated year list
    pub years: Option<String>,
    pub tags: Option<Vec<String>>,
    pub people_ids: Option<Vec<String>>,
    pub startswith_name: Option<String>,
    pub runtime: Option<String>,
    pub community_rating: Option<String>,
    pub critic_rating: Option<String>,
    pub official_rating: Option<String>,
    pub custom_rating: Option<String>,
}

/// Raw value of one attribute facet before compilation.
enum AttributeSpec {
    /// Interval expression
    Expr(String),
    /// Explicit value list
    List(Vec<String>),
}

impl FilterRules {
    fn attribute_spec(&self, attribute: &str) -> Option<AttributeSpec> {
        match attribute {
            "years" => self.years.as_ref().map(|text| {
                if text.contains(',') {
                    AttributeSpec::List(split_commas(text))
                } else {
                    AttributeSpec::Expr(text.clone())
                }
            }),
            "tags" => self.tags.clone().map(AttributeSpec::List),
            "people_ids" => self.people_ids.clone().map(AttributeSpec::List),
            "startswith_name" => self.startswith_name.clone().map(AttributeSpec::Expr),
            "runtime" => self.runtime.clone().map(AttributeSpec::Expr),
            "community_rating" => self.community_rating.clone().map(AttributeSpec::Expr),
            "critic_rating" => self.critic_rating.clone().map(AttributeSpec::Expr),
            "official_rating" => self.official_rating.clone().map(AttributeSpec::Expr),
            "custom_rating" => self.custom_rating.clone().map(AttributeSpec::Expr),
            _ => None,
        }
    }
}

/// Split a comma-separated list into trimmed, non-empty entries.
pub(crate) fn split_commas(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// A value extracted from an item for filter matching.
#[derive(Debug, Clone, PartialEq)]
enum FilterProbe {
    Number(f64),
    Text(String),
    Many(Vec<String>),
}

/// A compiled rule value: an interval or an identifier set.
#[derive(Debug, Clone)]
enum ValueRule {
    Range(Range),
    Words(HashSet<String>),
    Numbers(HashSet<i64>),
}

impl ValueRule {
    fn compile(attribute: &'static str, spec: AttributeSpec) -> PlaylistResult<Self> {
        match spec {
            AttributeSpec::Expr(text) => {
                let range = Range::parse(&text.to_lowercase()).map_err(|source| {
                    PlaylistError::InvalidFilter { attribute, source }
                })?;
                Ok(ValueRule::Range(range))
            }
            AttributeSpec::List(values) => {
                if attribute == "years" {
                    let years = values
                        .iter()
                        .filter_map(|value| value.trim().parse().ok())
                        .collect();
                    Ok(ValueRule::Numbers(years))
                } else {
                    let words = values.iter().map(|value| value.to_lowercase()).collect();
                    Ok(ValueRule::Words(words))
                }
            }
        }
    }

    fn matches(&self, probe: &FilterProbe) -> bool {
        match (self, probe) {
            (ValueRule::Range(range), FilterProbe::Number(value)) => range.contains_number(*value),
            (ValueRule::Range(range), FilterProbe::Text(value)) => range.contains_word(value),
            (ValueRule::Range(range), FilterProbe::Many(values)) => {
                values.iter().any(|value| range.contains_word(value))
            }
            (ValueRule::Words(words), FilterProbe::Text(value)) => words.contains(value),
            (ValueRule::Words(words), FilterProbe::Many(values)) => {
                values.iter().any(|value| words.contains(value))
            }
            (ValueRule::Numbers(numbers), FilterProbe::Number(value)) => {
                value.fract() == 0.0 && numbers.contains(&(*value as i64))
            }
            _ => false,
        }
    }
}

type Extractor = fn(&MediaItem) -> Option<FilterProbe>;

fn extract_years(item: &MediaItem) -> Option<FilterProbe> {
    item.production_year
        .map(|year| FilterProbe::Number(f64::from(year)))
}

fn extract_tags(item: &MediaItem) -> Option<FilterProbe> {
    if item.tags.is_empty() {
        return None;
    }
    Some(FilterProbe::Many(
        item.tags.iter().map(|tag| tag.to_lowercase()).collect(),
    ))
}

fn extract_name(item: &MediaItem) -> Option<FilterProbe> {
    Some(FilterProbe::Text(item.name.to_lowercase()))
}

fn extract_runtime(item: &MediaItem) -> Option<FilterProbe> {
    item.runtime_ticks
        .map(|ticks| FilterProbe::Number(ticks as f64 / TICKS_PER_MINUTE))
}

fn extract_people(item: &MediaItem) -> Option<FilterProbe> {
    if item.people.is_empty() {
        return None;
    }
    Some(FilterProbe::Many(
        item.people
            .iter()
            .map(|person| person.id.to_lowercase())
            .collect(),
    ))
}

fn extract_community_rating(item: &MediaItem) -> Option<FilterProbe> {
    item.community_rating.map(FilterProbe::Number)
}

fn extract_critic_rating(item: &MediaItem) -> Option<FilterProbe> {
    item.critic_rating.map(FilterProbe::Number)
}

fn extract_official_rating(item: &MediaItem) -> Option<FilterProbe> {
    item.official_rating
        .as_ref()
        .map(|rating| FilterProbe::Text(rating.to_lowercase()))
}

fn extract_custom_rating(item: &MediaItem) -> Option<FilterProbe> {
    item.custom_rating
        .as_ref()
        .map(|rating| FilterProbe::Text(rating.to_lowercase()))
}

/// Attribute extractors keyed by filter name. Supporting a new filterable
/// attribute means adding one row here.
static EXTRACTORS: &[(&str, Extractor)] = &[
    ("years", extract_years),
    ("tags", extract_tags),
    ("startswith_name", extract_name),
    ("runtime", extract_runtime),
    ("people_ids", extract_people),
    ("community_rating", extract_community_rating),
    ("critic_rating", extract_critic_rating),
    ("official_rating", extract_official_rating),
    ("custom_rating", extract_custom_rating),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleAction {
    Include,
    Exclude,
}

#[derive(Debug, Clone)]
struct AttributeRule {
    attribute: &'static str,
    extract: Extractor,
    value: ValueRule,
    action: RuleAction,
}

#[derive(Debug, Clone)]
enum IdSelection {
    Include(HashSet<String>),
    Exclude(HashSet<String>),
}

#[derive(Debug, Clone)]
enum GenreSelection {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

/// A playlist specified by inclusion/exclusion rules over item attributes,
/// resolved against live metadata at evaluation time.
#[derive(Debug, Clone)]
pub struct DynamicPlaylist {
    name: String,
    limit: Option<usize>,
    options: SortOptions,
    allowed_item_types: HashSet<String>,
    allowed_library_types: HashSet<String>,
    genre_selection: Option<GenreSelection>,
    view_selection: Option<IdSelection>,
    attribute_rules: Vec<AttributeRule>,
    always_include: Vec<String>,
    always_exclude: HashSet<String>,
}

fn narrowed_vocabulary(
    vocabulary: &[&str],
    include: Option<&Vec<String>>,
    exclude: Option<&Vec<String>>,
) -> HashSet<String> {
    let mut allowed: HashSet<String> = vocabulary.iter().map(|entry| entry.to_string()).collect();
    if let Some(included) = include {
        let included: HashSet<String> = included.iter().map(|t| t.to_lowercase()).collect();
        allowed.retain(|entry| included.contains(entry));
    } else if let Some(excluded) = exclude {
        for entry in excluded {
            allowed.remove(&entry.to_lowercase());
        }
    }
    allowed
}

fn fuzzy_token(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    TOKEN_PATTERN
        .find(&lowered)
        .map(|token| token.as_str().to_string())
}

fn fuzzy_match_genre<'a>(query: &str, known: &'a [Genre]) -> Option<&'a Genre> {
    let token = fuzzy_token(query)?;
    known
        .iter()
        .find(|genre| fuzzy_token(&genre.name).as_deref() == Some(token.as_str()))
}

impl DynamicPlaylist {
    /// Build a dynamic definition, compiling every attribute rule.
    ///
    /// Include and exclude rules for the same facet are mutually
    /// exclusive; when both are configured the include rule wins and the
    /// exclude rule is ignored.
    ///
    /// # Errors
    /// - `PlaylistError::InvalidFilter` - An attribute rule carries a
    ///   malformed interval expression
    pub fn new(
        name: &str,
        limit: Option<usize>,
        include: FilterRules,
        exclude: FilterRules,
        options: SortOptions,
    ) -> PlaylistResult<Self> {
        let allowed_item_types = narrowed_vocabulary(
            ITEM_TYPE_VOCABULARY,
            include.item_types.as_ref(),
            exclude.item_types.as_ref(),
        );
        let allowed_library_types = narrowed_vocabulary(
            LIBRARY_TYPE_VOCABULARY,
            include.library_types.as_ref(),
            exclude.library_types.as_ref(),
        );

        let genre_selection = match (&include.genres, &exclude.genres) {
            (Some(names), _) => Some(GenreSelection::Include(names.clone())),
            (None, Some(names)) => Some(GenreSelection::Exclude(names.clone())),
            (None, None) => None,
        };

        let view_selection = match (&include.library_ids, &exclude.library_ids) {
            (Some(ids), _) => Some(IdSelection::Include(ids.iter().cloned().collect())),
            (None, Some(ids)) => Some(IdSelection::Exclude(ids.iter().cloned().collect())),
            (None, None) => None,
        };

        let mut attribute_rules = Vec::new();
        for &(attribute, extract) in EXTRACTORS {
            let (spec, action) = match (
                include.attribute_spec(attribute),
                exclude.attribute_spec(attribute),
            ) {
                (Some(spec), other) => {
                    if other.is_some() {
                        warn!(
                            "Both include and exclude configured for '{attribute}'; using include"
                        );
                    }
                    (spec, RuleAction::Include)
                }
                (None, Some(spec)) => (spec, RuleAction::Exclude),
                (None, None) => continue,
            };
            attribute_rules.push(AttributeRule {
                attribute,
                extract,
                value: ValueRule::compile(attribute, spec)?,
                action,
            });
        }

        let always_include = include.item_ids.clone().unwrap_or_default();
        let always_exclude = exclude.item_ids.clone().unwrap_or_default().into_iter().collect();

        Ok(Self {
            name: name.to_string(),
            limit,
            options,
            allowed_item_types,
            allowed_library_types,
            genre_selection,
            view_selection,
            attribute_rules,
            always_include,
            always_exclude,
        })
    }

    /// Playlist name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sort configuration.
    pub fn options(&self) -> SortOptions {
        self.options
    }

    async fn resolve_genre_ids(
        &self,
        library: &dyn MediaLibrary,
    ) -> PlaylistResult<Option<Vec<String>>> {
        let Some(selection) = &self.genre_selection else {
            return Ok(None);
        };
        let known = library.genres().await?;
        let ids = match selection {
            GenreSelection::Include(names) => names
                .iter()
                .filter_map(|name| fuzzy_match_genre(name, &known))
                .map(|genre| genre.id.clone())
                .collect(),
            GenreSelection::Exclude(names) => {
                let excluded: HashSet<&str> = names
                    .iter()
                    .filter_map(|name| fuzzy_match_genre(name, &known))
                    .map(|genre| genre.id.as_str())
                    .collect();
                known
                    .iter()
                    .filter(|genre| !excluded.contains(genre.id.as_str()))
                    .map(|genre| genre.id.clone())
                    .collect()
            }
        };
        Ok(Some(ids))
    }

    async fn resolve_view_ids(&self, library: &dyn MediaLibrary) -> PlaylistResult<Vec<String>> {
        let views = library.views().await?;
        let mut ids: Vec<String> = views
            .iter()
            .filter(|view| {
                self.allowed_library_types
                    .contains(&view.collection_type.to_lowercase())
            })
            .map(|view| view.id.clone())
            .collect();
        match &self.view_selection {
            Some(IdSelection::Include(selected)) => ids.retain(|id| selected.contains(id)),
            Some(IdSelection::Exclude(removed)) => ids.retain(|id| !removed.contains(id)),
            None => {}
        }
        Ok(ids)
    }

    fn item_type_allowed(&self, item: &MediaItem) -> bool {
        let item_type = item.item_type.as_deref().map(str::to_lowercase);
        let media_type = item.media_type.as_deref().map(str::to_lowercase);
        if item_type.is_none() && media_type.is_none() {
            return true;
        }
        item_type.is_some_and(|t| self.allowed_item_types.contains(&t))
            || media_type.is_some_and(|t| self.allowed_item_types.contains(&t))
    }

    fn passes_attribute_rules(&self, item: &MediaItem) -> bool {
        for rule in &self.attribute_rules {
            // An item missing the attribute is neither kept nor dropped
            // by that rule.
            let Some(probe) = (rule.extract)(item) else {
                continue;
            };
            let matched = rule.value.matches(&probe);
            match rule.action {
                RuleAction::Include if !matched => {
                    debug!("Item '{}' fails include rule '{}'", item.id, rule.attribute);
                    return false;
                }
                RuleAction::Exclude if matched => {
                    debug!("Item '{}' hits exclude rule '{}'", item.id, rule.attribute);
                    return false;
                }
                _ => {}
            }
        }
        true
    }

    /// Resolve the rule set into a static-shaped playlist.
    ///
    /// Compilation is idempotent and re-fetches metadata on every call.
    /// The limit is handed to the produced playlist so it binds to the
    /// sorted sequence, never to the unsorted candidate set.
    ///
    /// # Errors
    /// - `PlaylistError::Library` - A library query failed
    pub async fn compile(&self, library: &dyn MediaLibrary) -> PlaylistResult<StaticPlaylist> {
        debug!("Compiling dynamic playlist '{}'", self.name);

        let genre_ids = self.resolve_genre_ids(library).await?;
        let view_ids = self.resolve_view_ids(library).await?;

        let mut item_types: Vec<String> = self.allowed_item_types.iter().cloned().collect();
        item_types.sort();

        // An include.genres rule with no fuzzy match contributes nothing.
        let genres_matched = !matches!(&genre_ids, Some(ids) if ids.is_empty());

        let mut candidates = Vec::new();
        if genres_matched {
            for view_id in &view_ids {
                let query = ItemQuery {
                    parent_id: Some(view_id.clone()),
                    item_types: item_types.clone(),
                    genre_ids: genre_ids.clone().unwrap_or_default(),
                };
                let fetched = library.items(&query).await?;
                debug!(
                    "Fetched {} items from view '{}' for playlist '{}'",
                    fetched.len(),
                    view_id,
                    self.name
                );
                candidates.extend(fetched);
            }
        }

        // Re-check the type scope against fetched metadata; servers differ
        // in how strictly the type filter is honored.
        candidates.retain(|item| self.item_type_allowed(item));

        let mut item_ids: Vec<String> = candidates
            .iter()
            .filter(|item| self.passes_attribute_rules(item))
            .map(|item| item.id.clone())
            .collect();

        item_ids.extend(self.always_include.iter().cloned());
        item_ids.retain(|id| !self.always_exclude.contains(id));

        debug!(
            "Compiled dynamic playlist '{}' with {} candidate items",
            self.name,
            item_ids.len()
        );
        Ok(StaticPlaylist::new(
            &self.name,
            item_ids,
            self.options,
            self.limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::InMemoryLibrary;

    fn movie(id: &str, name: &str, year: i32) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            name: name.to_string(),
            item_type: Some("Movie".to_string()),
            production_year: Some(year),
            ..MediaItem::default()
        }
    }

    fn movie_library() -> InMemoryLibrary {
        InMemoryLibrary::new()
            .with_view("v1", "Movies", "movies")
            .with_genre("g1", "Action")
            .with_genre("g2", "Science Fiction")
            .with_item("v1", movie("m1", "Alpha", 1999))
            .with_item("v1", movie("m2", "Beta", 2001))
            .with_item("v1", movie("m3", "Gamma", 2005))
            .with_item("v1", movie("m4", "Delta", 2010))
            .with_item("v1", movie("m5", "Epsilon", 2015))
    }

    fn rules(configure: impl FnOnce(&mut FilterRules)) -> FilterRules {
        let mut rules = FilterRules::default();
        configure(&mut rules);
        rules
    }

    #[tokio::test]
    async fn test_year_range_narrows_scope() {
        let playlist = DynamicPlaylist::new(
            "recent",
            None,
            rules(|r| {
                r.item_types = Some(vec!["Movie".to_string()]);
                r.years = Some("2000-2010".to_string());
            }),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&movie_library()).await.unwrap();
        assert_eq!(compiled.item_ids(), &["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_year_list_filter() {
        let playlist = DynamicPlaylist::new(
            "picks",
            None,
            rules(|r| r.years = Some("2001, 2015".to_string())),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&movie_library()).await.unwrap();
        assert_eq!(compiled.item_ids(), &["m2", "m5"]);
    }

    #[tokio::test]
    async fn test_exclude_year_range() {
        let playlist = DynamicPlaylist::new(
            "older",
            None,
            FilterRules::default(),
            rules(|r| r.years = Some("2000-2010".to_string())),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&movie_library()).await.unwrap();
        assert_eq!(compiled.item_ids(), &["m1", "m5"]);
    }

    #[tokio::test]
    async fn test_include_wins_over_exclude_for_same_facet() {
        let with_both = DynamicPlaylist::new(
            "conflict",
            None,
            rules(|r| r.years = Some("2000-2010".to_string())),
            rules(|r| r.years = Some("2005-2015".to_string())),
            SortOptions::default(),
        )
        .unwrap();
        let include_only = DynamicPlaylist::new(
            "clean",
            None,
            rules(|r| r.years = Some("2000-2010".to_string())),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let library = movie_library();
        let conflicted = with_both.compile(&library).await.unwrap();
        let clean = include_only.compile(&library).await.unwrap();
        assert_eq!(conflicted.item_ids(), clean.item_ids());
    }

    #[tokio::test]
    async fn test_genre_include_wins_over_genre_exclude() {
        let library = InMemoryLibrary::new()
            .with_view("v1", "Movies", "movies")
            .with_genre("g1", "Action")
            .with_genre("g2", "Comedy")
            .with_item(
                "v1",
                MediaItem {
                    genre_ids: vec!["g1".to_string()],
                    ..movie("m1", "Alpha", 2001)
                },
            )
            .with_item(
                "v1",
                MediaItem {
                    genre_ids: vec!["g2".to_string()],
                    ..movie("m2", "Beta", 2002)
                },
            );

        let with_both = DynamicPlaylist::new(
            "conflict",
            None,
            rules(|r| r.genres = Some(vec!["Action".to_string()])),
            rules(|r| r.genres = Some(vec!["Action".to_string()])),
            SortOptions::default(),
        )
        .unwrap();
        let include_only = DynamicPlaylist::new(
            "clean",
            None,
            rules(|r| r.genres = Some(vec!["Action".to_string()])),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let conflicted = with_both.compile(&library).await.unwrap();
        let clean = include_only.compile(&library).await.unwrap();
        assert_eq!(conflicted.item_ids(), clean.item_ids());
        assert_eq!(clean.item_ids(), &["m1"]);
    }

    #[tokio::test]
    async fn test_missing_attribute_skips_rule() {
        let library = InMemoryLibrary::new()
            .with_view("v1", "Movies", "movies")
            .with_item("v1", movie("m1", "Alpha", 2005))
            .with_item(
                "v1",
                MediaItem {
                    id: "m2".to_string(),
                    name: "Undated".to_string(),
                    item_type: Some("Movie".to_string()),
                    ..MediaItem::default()
                },
            );

        let playlist = DynamicPlaylist::new(
            "era",
            None,
            rules(|r| r.years = Some("2000-2010".to_string())),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&library).await.unwrap();
        assert_eq!(compiled.item_ids(), &["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_genre_fuzzy_match() {
        let library = InMemoryLibrary::new()
            .with_view("v1", "Movies", "movies")
            .with_genre("g1", "Science Fiction")
            .with_genre("g2", "Action")
            .with_item(
                "v1",
                MediaItem {
                    genre_ids: vec!["g1".to_string()],
                    ..movie("m1", "Alpha", 2001)
                },
            )
            .with_item(
                "v1",
                MediaItem {
                    genre_ids: vec!["g2".to_string()],
                    ..movie("m2", "Beta", 2002)
                },
            );

        let playlist = DynamicPlaylist::new(
            "scifi",
            None,
            rules(|r| r.genres = Some(vec!["SCIENCE fiction!".to_string()])),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&library).await.unwrap();
        assert_eq!(compiled.item_ids(), &["m1"]);
    }

    #[tokio::test]
    async fn test_unmatched_genre_contributes_nothing() {
        let playlist = DynamicPlaylist::new(
            "ghost-genre",
            None,
            rules(|r| r.genres = Some(vec!["Documentary".to_string()])),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&movie_library()).await.unwrap();
        assert!(compiled.item_ids().is_empty());
    }

    #[tokio::test]
    async fn test_id_overrides() {
        let playlist = DynamicPlaylist::new(
            "curated",
            None,
            rules(|r| {
                r.years = Some("2000-2010".to_string());
                r.item_ids = Some(vec!["bonus".to_string()]);
            }),
            rules(|r| r.item_ids = Some(vec!["m3".to_string()])),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&movie_library()).await.unwrap();
        assert_eq!(compiled.item_ids(), &["m2", "m4", "bonus"]);
    }

    #[tokio::test]
    async fn test_library_type_scope() {
        let library = InMemoryLibrary::new()
            .with_view("v1", "Movies", "movies")
            .with_view("v2", "Home Videos", "homevideos")
            .with_item("v1", movie("m1", "Alpha", 2001))
            .with_item("v2", movie("h1", "Holiday", 2002));

        let playlist = DynamicPlaylist::new(
            "films-only",
            None,
            rules(|r| r.library_types = Some(vec!["movies".to_string()])),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&library).await.unwrap();
        assert_eq!(compiled.item_ids(), &["m1"]);
    }

    #[tokio::test]
    async fn test_runtime_filter_converts_ticks() {
        let short = MediaItem {
            runtime_ticks: Some(30 * 60 * 10_000_000),
            ..movie("short", "Short", 2001)
        };
        let long = MediaItem {
            runtime_ticks: Some(150 * 60 * 10_000_000),
            ..movie("long", "Long", 2002)
        };
        let library = InMemoryLibrary::new()
            .with_view("v1", "Movies", "movies")
            .with_item("v1", short)
            .with_item("v1", long);

        let playlist = DynamicPlaylist::new(
            "feature-length",
            None,
            rules(|r| r.runtime = Some("60-".to_string())),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&library).await.unwrap();
        assert_eq!(compiled.item_ids(), &["long"]);
    }

    #[tokio::test]
    async fn test_tag_filter() {
        let tagged = MediaItem {
            tags: vec!["Holiday".to_string()],
            ..movie("t1", "Festive", 2001)
        };
        let library = InMemoryLibrary::new()
            .with_view("v1", "Movies", "movies")
            .with_item("v1", tagged)
            .with_item("v1", movie("t2", "Plain", 2002));

        let playlist = DynamicPlaylist::new(
            "seasonal",
            None,
            rules(|r| r.tags = Some(vec!["holiday".to_string()])),
            FilterRules::default(),
            SortOptions::default(),
        )
        .unwrap();

        let compiled = playlist.compile(&library).await.unwrap();
        assert_eq!(compiled.item_ids(), &["t1"]);
    }

    #[test]
    fn test_invalid_filter_expression() {
        let result = DynamicPlaylist::new(
            "broken",
            None,
            rules(|r| r.runtime = Some("60-abc".to_string())),
            FilterRules::default(),
            SortOptions::default(),
        );
        assert!(matches!(
            result,
            Err(PlaylistError::InvalidFilter {
                attribute: "runtime",
                ..
            })
        ));
    }
}
