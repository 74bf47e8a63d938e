//! Marquee Core - Rule-driven playlist selection
//!
//! This crate provides the rule evaluation engine behind Marquee: a typed
//! interval matcher, time-based selection between competing playlist
//! definitions, an include/exclude filter compiler and a sorting engine
//! with strict/lenient key resolution. Library access goes through the
//! `MediaLibrary` trait so the engine runs unchanged against a remote
//! media server or an in-memory fixture.

pub mod config;
pub mod engine;
pub mod library;
pub mod playlist;
pub mod range;
pub mod selection;

// Re-export main types for convenient access
pub use config::{ConfigError, MarqueeConfig, ServerConfig};
pub use engine::{CompiledPlaylist, EngineError, PlaylistEngine};
pub use library::{InMemoryLibrary, LibraryError, MediaItem, MediaLibrary};
pub use playlist::{Playlist, PlaylistError, SortBy, SortOptions};
pub use range::{Range, RangeError};
pub use selection::{SelectionError, SelectionRule, ViewerContext};

/// Core errors that can bubble up from any Marquee subsystem.
#[derive(Debug, thiserror::Error)]
pub enum MarqueeError {
    #[error("Range error: {0}")]
    Range(#[from] RangeError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Playlist error: {0}")]
    Playlist(#[from] PlaylistError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarqueeError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            MarqueeError::Range(e) => format!("Invalid interval in configuration: {e}"),
            MarqueeError::Selection(e) => format!("Invalid selection rule: {e}"),
            MarqueeError::Playlist(e) => format!("Invalid playlist definition: {e}"),
            MarqueeError::Config(e) => format!("Configuration error: {e}"),
            MarqueeError::Engine(e) => format!("Evaluation failed: {e}"),
            MarqueeError::Library(e) => format!("Media server error: {e}"),
            MarqueeError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error indicates an invalid rule set rather than a
    /// runtime failure.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MarqueeError::Range(_)
                | MarqueeError::Selection(_)
                | MarqueeError::Config(_)
                | MarqueeError::Playlist(PlaylistError::UnsupportedSort { .. })
                | MarqueeError::Playlist(PlaylistError::InvalidFilter { .. })
                | MarqueeError::Engine(EngineError::UnknownPlaylist { .. })
                | MarqueeError::Engine(EngineError::NoRules)
        )
    }
}

pub type Result<T> = std::result::Result<T, MarqueeError>;
