//! Player progression: leveling, ranks, streaks, and attributes.

pub mod session;
pub mod tracker;
pub mod types;

pub use session::WorkoutSession;
pub use tracker::{LevelUp, ProgressionError, ProgressionEvent, ProgressionTracker, WorkoutReward};
pub use types::{
    rank_for, xp_threshold, Attribute, BodyType, PlayerProfile, RankBand, COINS_PER_WORKOUT,
    MIN_WORKOUT_SECS, RANK_BANDS, XP_PER_WORKOUT,
};
