//! HTTP API handlers for moodmix-api

pub mod catalog;
pub mod health;
pub mod mood;

pub use catalog::catalog_routes;
pub use health::health_routes;
pub use mood::mood_routes;
