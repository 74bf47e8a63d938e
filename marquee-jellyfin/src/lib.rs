//! Marquee Jellyfin - Remote media library client
//!
//! Implements the `MediaLibrary` trait against a Jellyfin-compatible
//! media server: authenticate-by-name session setup, genre/view/item
//! queries and chunked bulk item fetch. All transport failures surface as
//! `LibraryError` and are propagated unmodified by the engine.

pub mod client;
mod models;

pub use client::JellyfinClient;
