//! LevelFit - Fitness Gamification Backend
//!
//! An open-source, self-hosted fitness gamification backend built in Rust.
//! Tracks RPG-style player progression (experience, levels, ranks, attribute
//! points, coin rewards, and workout streaks) over a subscribable profile
//! store, manages custom workout routines, and requests AI-generated workout
//! advice from a cloud endpoint.

pub mod advice;
pub mod progression;
pub mod routines;
pub mod storage;

// Re-export commonly used types
pub use advice::client::AdviceClient;
pub use progression::tracker::ProgressionTracker;
pub use progression::types::PlayerProfile;
pub use storage::config::AppConfig;
pub use storage::database::Database;
pub use storage::store::{ProfileStore, ProfileUpdate};
