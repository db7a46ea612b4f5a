//! # MoodMix Common Library
//!
//! Shared code for the MoodMix services including:
//! - Domain models (emotional profiles, feature targets, playlists, mood entries)
//! - Configuration loading
//! - SQLite persistence for mood entries
//! - Error types

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
