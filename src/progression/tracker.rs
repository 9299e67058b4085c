//! Progression state transitions.
//!
//! Owns every mutation of a player profile: workout completion, streak
//! decay, level advancement, biometric edits, attribute spending, and
//! routine creation. All writes go through the profile store as single
//! partial updates; the tracker itself keeps no authoritative state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::progression::types::{
    rank_for, xp_threshold, Attribute, BodyType, PlayerProfile, COINS_PER_WORKOUT,
    MIN_WORKOUT_SECS, XP_PER_WORKOUT,
};
use crate::routines::types::Routine;
use crate::storage::store::{ProfileStore, ProfileUpdate, StoreError};

/// Events emitted when progression milestones land.
#[derive(Debug, Clone)]
pub enum ProgressionEvent {
    /// The profile advanced a level
    LevelUp { level: u32, rank: String },
}

/// Result of a level advance.
#[derive(Debug, Clone)]
pub struct LevelUp {
    /// The level reached
    pub level: u32,
    /// Rank name for the new level
    pub rank: String,
    /// Experience carried over past the cleared threshold
    pub xp_carried: u32,
}

/// Outcome of a completed workout.
#[derive(Debug, Clone)]
pub struct WorkoutReward {
    /// Experience awarded
    pub xp: u32,
    /// Coins awarded
    pub coins: u32,
    /// Whether the completion extended the streak
    pub streak_extended: bool,
    /// Streak length after the completion
    pub streak: u32,
}

/// Fields a snapshot is compared on before re-running the checks.
///
/// Guards the feedback loop where the tracker's own write delivers a new
/// snapshot: an unchanged snapshot is never reprocessed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SnapshotKey {
    level: u32,
    xp: u32,
    streak: u32,
    last_workout_date: Option<NaiveDate>,
}

impl SnapshotKey {
    fn of(profile: &PlayerProfile) -> Self {
        Self {
            level: profile.level,
            xp: profile.xp,
            streak: profile.streak,
            last_workout_date: profile.last_workout_date,
        }
    }
}

/// Tracker for a single profile's progression.
pub struct ProgressionTracker<S> {
    store: Arc<S>,
    profile_id: Uuid,
    events: broadcast::Sender<ProgressionEvent>,
    last_processed: Mutex<Option<SnapshotKey>>,
}

impl<S: ProfileStore> ProgressionTracker<S> {
    /// Create a tracker bound to one profile.
    pub fn new(store: Arc<S>, profile_id: Uuid) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store,
            profile_id,
            events,
            last_processed: Mutex::new(None),
        }
    }

    /// The profile this tracker is bound to.
    pub fn profile_id(&self) -> Uuid {
        self.profile_id
    }

    /// Subscribe to progression events.
    pub fn events(&self) -> broadcast::Receiver<ProgressionEvent> {
        self.events.subscribe()
    }

    /// Read the current profile document.
    pub async fn profile(&self) -> Result<PlayerProfile, ProgressionError> {
        self.store
            .read(self.profile_id)
            .await?
            .ok_or(ProgressionError::ProfileNotFound(self.profile_id))
    }

    /// Consume the profile subscription until the store drops it.
    ///
    /// Every received snapshot runs the streak-decay check and the
    /// level-up check, in that order. Writes issued by those checks
    /// deliver further snapshots through the same loop.
    pub async fn observe(&self) -> Result<(), ProgressionError> {
        let mut receiver = self.store.subscribe(self.profile_id).await?;

        loop {
            let snapshot = receiver.borrow_and_update().clone();
            self.apply_snapshot(&snapshot, Utc::now().date_naive())
                .await?;

            if receiver.changed().await.is_err() {
                return Ok(());
            }
        }
    }

    /// Run the per-snapshot checks: streak decay first, then level-up.
    ///
    /// A snapshot whose progression fields match the previously processed
    /// one is skipped, so a write caused by these checks cannot re-trigger
    /// them unless the fields moved again.
    pub async fn apply_snapshot(
        &self,
        profile: &PlayerProfile,
        today: NaiveDate,
    ) -> Result<(), ProgressionError> {
        let key = SnapshotKey::of(profile);
        {
            let mut last = self.last_processed.lock().await;
            if last.as_ref() == Some(&key) {
                return Ok(());
            }
            *last = Some(key);
        }

        self.check_streak_decay(profile, today).await?;
        self.check_level_up(profile).await?;
        Ok(())
    }

    /// Reset a lapsed streak.
    ///
    /// A streak survives a same-day or next-day gap and lapses after a
    /// full skipped day. Returns whether a reset was written.
    pub async fn check_streak_decay(
        &self,
        profile: &PlayerProfile,
        today: NaiveDate,
    ) -> Result<bool, ProgressionError> {
        let Some(last_workout) = profile.last_workout_date else {
            return Ok(false);
        };

        let days_since = today.signed_duration_since(last_workout).num_days();
        if days_since > 1 && profile.streak > 0 {
            self.store
                .update(
                    self.profile_id,
                    ProfileUpdate {
                        set_streak: Some(0),
                        ..Default::default()
                    },
                )
                .await?;
            tracing::info!(days_since, "streak lapsed, reset to 0");
            return Ok(true);
        }

        Ok(false)
    }

    /// Advance one level when experience clears the current threshold.
    ///
    /// Carried-over experience is not re-checked in the same pass; if it
    /// still clears the next threshold, the next snapshot advances again.
    pub async fn check_level_up(
        &self,
        profile: &PlayerProfile,
    ) -> Result<Option<LevelUp>, ProgressionError> {
        let threshold = xp_threshold(profile.level);
        if profile.xp < threshold {
            return Ok(None);
        }

        let level = profile.level + 1;
        let xp_carried = profile.xp - threshold;
        let rank = rank_for(level).to_string();

        self.store
            .update(
                self.profile_id,
                ProfileUpdate {
                    set_level: Some(level),
                    set_xp: Some(xp_carried),
                    set_rank: Some(rank.clone()),
                    ..Default::default()
                },
            )
            .await?;

        let _ = self.events.send(ProgressionEvent::LevelUp {
            level,
            rank: rank.clone(),
        });
        tracing::info!(level, %rank, "level up");

        Ok(Some(LevelUp {
            level,
            rank,
            xp_carried,
        }))
    }

    /// Credit a finished workout session.
    ///
    /// Rejects sessions shorter than the minimum active time. The streak
    /// only extends on the first completion of a calendar day.
    pub async fn complete_workout(
        &self,
        active: Duration,
        today: NaiveDate,
    ) -> Result<WorkoutReward, ProgressionError> {
        if active.as_secs() < MIN_WORKOUT_SECS {
            return Err(ProgressionError::Validation(format!(
                "train for at least {MIN_WORKOUT_SECS} seconds to log the session"
            )));
        }

        let profile = self.profile().await?;
        let streak_extended = profile.last_workout_date != Some(today);

        self.store
            .update(
                self.profile_id,
                ProfileUpdate {
                    add_xp: Some(XP_PER_WORKOUT),
                    add_coins: Some(COINS_PER_WORKOUT),
                    add_streak: Some(u32::from(streak_extended)),
                    set_last_workout_date: Some(today),
                    ..Default::default()
                },
            )
            .await?;

        Ok(WorkoutReward {
            xp: XP_PER_WORKOUT,
            coins: COINS_PER_WORKOUT,
            streak_extended,
            streak: profile.streak + u32::from(streak_extended),
        })
    }

    /// Record weight and height, deriving the body type unless overridden.
    ///
    /// Both measurements come in as raw user input and must parse to
    /// positive numbers. Returns the body type that was written.
    pub async fn set_biometrics(
        &self,
        weight: &str,
        height: &str,
        body_type: Option<BodyType>,
    ) -> Result<BodyType, ProgressionError> {
        let weight_kg = parse_measurement(weight).ok_or_else(|| {
            ProgressionError::Validation("weight must be a positive number".to_string())
        })?;
        let height_m = parse_measurement(height).ok_or_else(|| {
            ProgressionError::Validation("height must be a positive number".to_string())
        })?;

        let body_type = body_type.unwrap_or_else(|| BodyType::from_bmi(weight_kg, height_m));

        self.store
            .update(
                self.profile_id,
                ProfileUpdate {
                    set_weight_kg: Some(weight_kg),
                    set_height_m: Some(height_m),
                    set_body_type: Some(body_type),
                    ..Default::default()
                },
            )
            .await?;

        Ok(body_type)
    }

    /// Spend one attribute point on the given attribute.
    ///
    /// Spending with no points available is a quiet no-op; the store's
    /// conditional update leaves every field untouched.
    pub async fn spend_point(&self, attribute: Attribute) -> Result<(), ProgressionError> {
        self.store
            .update(
                self.profile_id,
                ProfileUpdate {
                    spend_point: Some(attribute),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    /// Append a new custom routine.
    pub async fn create_routine(
        &self,
        name: &str,
        exercises: Vec<String>,
    ) -> Result<Routine, ProgressionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProgressionError::Validation(
                "routine name must not be empty".to_string(),
            ));
        }
        if exercises.is_empty() {
            return Err(ProgressionError::Validation(
                "select at least one exercise".to_string(),
            ));
        }

        let routine = Routine::new(name.to_string(), exercises);
        self.store
            .update(
                self.profile_id,
                ProfileUpdate {
                    append_routine: Some(routine.clone()),
                    ..Default::default()
                },
            )
            .await?;

        Ok(routine)
    }
}

/// Parse a user-entered measurement, accepting a comma decimal separator.
fn parse_measurement(input: &str) -> Option<f32> {
    let value: f32 = input.trim().replace(',', ".").parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Progression errors.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Profile not found: {0}")]
    ProfileNotFound(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    async fn setup() -> (Arc<Database>, ProgressionTracker<Database>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let profile = db.create_profile("Warrior").await.unwrap();
        let tracker = ProgressionTracker::new(Arc::clone(&db), profile.id);
        (db, tracker)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_complete_workout_rejects_short_sessions() {
        let (_db, tracker) = setup().await;

        let result = tracker
            .complete_workout(Duration::from_secs(59), date("2024-03-10"))
            .await;
        assert!(matches!(result, Err(ProgressionError::Validation(_))));

        // Nothing was written
        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.coins, 0);
    }

    #[tokio::test]
    async fn test_complete_workout_awards_and_extends_streak() {
        let (_db, tracker) = setup().await;
        let today = date("2024-03-10");

        let reward = tracker
            .complete_workout(Duration::from_secs(60), today)
            .await
            .unwrap();
        assert!(reward.streak_extended);
        assert_eq!(reward.streak, 1);

        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.xp, 150);
        assert_eq!(profile.coins, 30);
        assert_eq!(profile.streak, 1);
        assert_eq!(profile.last_workout_date, Some(today));
    }

    #[tokio::test]
    async fn test_second_workout_same_day_keeps_streak() {
        let (_db, tracker) = setup().await;
        let today = date("2024-03-10");

        tracker
            .complete_workout(Duration::from_secs(90), today)
            .await
            .unwrap();
        let reward = tracker
            .complete_workout(Duration::from_secs(90), today)
            .await
            .unwrap();
        assert!(!reward.streak_extended);

        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.xp, 300);
        assert_eq!(profile.coins, 60);
        assert_eq!(profile.streak, 1);
    }

    #[tokio::test]
    async fn test_streak_extends_on_next_day() {
        let (_db, tracker) = setup().await;

        tracker
            .complete_workout(Duration::from_secs(90), date("2024-03-10"))
            .await
            .unwrap();
        tracker
            .complete_workout(Duration::from_secs(90), date("2024-03-11"))
            .await
            .unwrap();

        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.streak, 2);
    }

    #[tokio::test]
    async fn test_streak_decay_after_skipped_day() {
        let (_db, tracker) = setup().await;

        tracker
            .complete_workout(Duration::from_secs(90), date("2024-03-10"))
            .await
            .unwrap();

        let profile = tracker.profile().await.unwrap();
        let reset = tracker
            .check_streak_decay(&profile, date("2024-03-12"))
            .await
            .unwrap();
        assert!(reset);
        assert_eq!(tracker.profile().await.unwrap().streak, 0);
    }

    #[tokio::test]
    async fn test_streak_survives_next_day_gap() {
        let (_db, tracker) = setup().await;

        tracker
            .complete_workout(Duration::from_secs(90), date("2024-03-10"))
            .await
            .unwrap();

        let profile = tracker.profile().await.unwrap();
        for today in ["2024-03-10", "2024-03-11"] {
            let reset = tracker
                .check_streak_decay(&profile, date(today))
                .await
                .unwrap();
            assert!(!reset, "streak lapsed with today = {today}");
        }
        assert_eq!(tracker.profile().await.unwrap().streak, 1);
    }

    #[tokio::test]
    async fn test_streak_decay_without_history_is_noop() {
        let (_db, tracker) = setup().await;

        let profile = tracker.profile().await.unwrap();
        let reset = tracker
            .check_streak_decay(&profile, date("2024-03-12"))
            .await
            .unwrap();
        assert!(!reset);
    }

    #[tokio::test]
    async fn test_level_up_at_threshold() {
        let (db, tracker) = setup().await;
        db.update(
            tracker.profile_id(),
            ProfileUpdate {
                add_xp: Some(1000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let profile = tracker.profile().await.unwrap();
        let level_up = tracker.check_level_up(&profile).await.unwrap().unwrap();
        assert_eq!(level_up.level, 2);
        assert_eq!(level_up.xp_carried, 0);

        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.level, 2);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.rank, "Apprentice");
    }

    #[tokio::test]
    async fn test_no_level_up_below_threshold() {
        let (db, tracker) = setup().await;
        db.update(
            tracker.profile_id(),
            ProfileUpdate {
                add_xp: Some(999),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let profile = tracker.profile().await.unwrap();
        assert!(tracker.check_level_up(&profile).await.unwrap().is_none());

        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.level, 1);
        assert_eq!(profile.xp, 999);
    }

    #[tokio::test]
    async fn test_level_up_advances_one_level_per_pass() {
        let (db, tracker) = setup().await;
        db.update(
            tracker.profile_id(),
            ProfileUpdate {
                add_xp: Some(3500),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let profile = tracker.profile().await.unwrap();
        let level_up = tracker.check_level_up(&profile).await.unwrap().unwrap();
        assert_eq!(level_up.level, 2);
        // The carry still clears level 2's threshold and waits for the
        // next pass
        assert_eq!(level_up.xp_carried, 2500);

        let profile = tracker.profile().await.unwrap();
        let level_up = tracker.check_level_up(&profile).await.unwrap().unwrap();
        assert_eq!(level_up.level, 3);
        assert_eq!(level_up.xp_carried, 500);
    }

    #[tokio::test]
    async fn test_level_up_crosses_rank_band() {
        let (db, tracker) = setup().await;
        db.update(
            tracker.profile_id(),
            ProfileUpdate {
                set_level: Some(5),
                set_xp: Some(5000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let profile = tracker.profile().await.unwrap();
        let level_up = tracker.check_level_up(&profile).await.unwrap().unwrap();
        assert_eq!(level_up.level, 6);
        assert_eq!(level_up.rank, "Rank E");
        assert_eq!(tracker.profile().await.unwrap().rank, "Rank E");
    }

    #[tokio::test]
    async fn test_level_up_emits_event() {
        let (db, tracker) = setup().await;
        let mut events = tracker.events();

        db.update(
            tracker.profile_id(),
            ProfileUpdate {
                add_xp: Some(1000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let profile = tracker.profile().await.unwrap();
        tracker.check_level_up(&profile).await.unwrap();

        let ProgressionEvent::LevelUp { level, .. } = events.recv().await.unwrap();
        assert_eq!(level, 2);
    }

    #[tokio::test]
    async fn test_apply_snapshot_skips_unchanged_snapshot() {
        let (db, tracker) = setup().await;
        db.update(
            tracker.profile_id(),
            ProfileUpdate {
                add_xp: Some(1000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let profile = tracker.profile().await.unwrap();
        let today = date("2024-03-10");

        tracker.apply_snapshot(&profile, today).await.unwrap();
        assert_eq!(tracker.profile().await.unwrap().level, 2);

        // Replaying the same stale snapshot issues no second advance
        tracker.apply_snapshot(&profile, today).await.unwrap();
        assert_eq!(tracker.profile().await.unwrap().level, 2);
    }

    #[tokio::test]
    async fn test_set_biometrics_derives_body_type() {
        let (_db, tracker) = setup().await;

        let body_type = tracker.set_biometrics("50", "1.80", None).await.unwrap();
        assert_eq!(body_type, BodyType::Ectomorph);

        let body_type = tracker.set_biometrics("90", "1.80", None).await.unwrap();
        assert_eq!(body_type, BodyType::Endomorph);

        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.weight_kg, Some(90.0));
        assert_eq!(profile.height_m, Some(1.80));
        assert!(!profile.needs_setup());
    }

    #[tokio::test]
    async fn test_set_biometrics_accepts_comma_decimals() {
        let (_db, tracker) = setup().await;

        tracker.set_biometrics("75,5", "1,75", None).await.unwrap();
        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.weight_kg, Some(75.5));
    }

    #[tokio::test]
    async fn test_set_biometrics_honors_override() {
        let (_db, tracker) = setup().await;

        let body_type = tracker
            .set_biometrics("90", "1.80", Some(BodyType::Mesomorph))
            .await
            .unwrap();
        assert_eq!(body_type, BodyType::Mesomorph);
    }

    #[tokio::test]
    async fn test_set_biometrics_rejects_bad_input() {
        let (_db, tracker) = setup().await;

        for (weight, height) in [("abc", "1.80"), ("75", "zero"), ("-75", "1.80"), ("75", "0")] {
            let result = tracker.set_biometrics(weight, height, None).await;
            assert!(
                matches!(result, Err(ProgressionError::Validation(_))),
                "accepted weight={weight} height={height}"
            );
        }
    }

    #[tokio::test]
    async fn test_spend_point_without_points_changes_nothing() {
        let (_db, tracker) = setup().await;

        tracker.spend_point(Attribute::Strength).await.unwrap();

        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.strength, 1);
        assert_eq!(profile.points, 0);
    }

    #[tokio::test]
    async fn test_spend_point_with_points_available() {
        let (db, tracker) = setup().await;
        db.update(
            tracker.profile_id(),
            ProfileUpdate {
                add_points: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        tracker.spend_point(Attribute::Strength).await.unwrap();

        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.strength, 2);
        assert_eq!(profile.points, 1);
        assert_eq!(profile.intelligence, 1);
        assert_eq!(profile.resilience, 1);
    }

    #[tokio::test]
    async fn test_create_routine_validation() {
        let (_db, tracker) = setup().await;

        let result = tracker.create_routine("", vec!["Squat".to_string()]).await;
        assert!(matches!(result, Err(ProgressionError::Validation(_))));

        let result = tracker.create_routine("Leg Day", Vec::new()).await;
        assert!(matches!(result, Err(ProgressionError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_routine_appends() {
        let (_db, tracker) = setup().await;

        let routine = tracker
            .create_routine("Leg Day", vec!["Squat".to_string(), "Lunge".to_string()])
            .await
            .unwrap();

        let profile = tracker.profile().await.unwrap();
        assert_eq!(profile.routines.len(), 1);
        assert_eq!(profile.routines[0].id, routine.id);
        assert_eq!(profile.routines[0].name, "Leg Day");
    }
}
