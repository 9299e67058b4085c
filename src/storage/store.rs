//! Profile store contract.
//!
//! Narrow interface through which the progression tracker reads, observes,
//! and mutates profile documents. Implementations own write ordering and
//! conflict resolution for a given profile.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::watch;
use uuid::Uuid;

use crate::progression::types::{Attribute, BodyType, PlayerProfile};
use crate::routines::types::Routine;

/// A partial profile update, applied as a single write.
///
/// `set_*` fields overwrite, `add_*` fields are atomic increments,
/// `spend_point` is a conditional increment/decrement pair that only lands
/// while unspent points remain, and `append_routine` is a duplicate-safe
/// list append.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub set_level: Option<u32>,
    pub set_xp: Option<u32>,
    pub set_rank: Option<String>,
    pub set_streak: Option<u32>,
    pub set_last_workout_date: Option<NaiveDate>,
    pub set_weight_kg: Option<f32>,
    pub set_height_m: Option<f32>,
    pub set_body_type: Option<BodyType>,
    pub add_xp: Option<u32>,
    pub add_coins: Option<u32>,
    pub add_streak: Option<u32>,
    pub add_points: Option<u32>,
    pub spend_point: Option<Attribute>,
    pub append_routine: Option<Routine>,
}

impl ProfileUpdate {
    /// Whether the update carries no instructions.
    pub fn is_empty(&self) -> bool {
        self.set_level.is_none()
            && self.set_xp.is_none()
            && self.set_rank.is_none()
            && self.set_streak.is_none()
            && self.set_last_workout_date.is_none()
            && self.set_weight_kg.is_none()
            && self.set_height_m.is_none()
            && self.set_body_type.is_none()
            && self.add_xp.is_none()
            && self.add_coins.is_none()
            && self.add_streak.is_none()
            && self.add_points.is_none()
            && self.spend_point.is_none()
            && self.append_routine.is_none()
    }
}

/// Contract for reading, observing, and updating profile documents.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read the current profile document, if present.
    async fn read(&self, profile_id: Uuid) -> Result<Option<PlayerProfile>, StoreError>;

    /// Apply a partial update as one write. The write is all-or-nothing.
    async fn update(&self, profile_id: Uuid, update: ProfileUpdate) -> Result<(), StoreError>;

    /// Subscribe to profile snapshots.
    ///
    /// The receiver holds the current snapshot and observes every
    /// subsequent write. Dropping the receiver ends the subscription.
    async fn subscribe(
        &self,
        profile_id: Uuid,
    ) -> Result<watch::Receiver<PlayerProfile>, StoreError>;
}

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Profile not found: {0}")]
    NotFound(Uuid),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
