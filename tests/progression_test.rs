//! End-to-end progression flow over the SQLite store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use levelfit::progression::{Attribute, ProgressionEvent, ProgressionTracker};
use levelfit::storage::database::Database;
use levelfit::storage::store::{ProfileStore, ProfileUpdate};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_week_of_training_reaches_level_two() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let profile = db.create_profile("Warrior").await.unwrap();
    let tracker = ProgressionTracker::new(Arc::clone(&db), profile.id);

    // One qualifying session per day for a week
    for day in 10..17 {
        let today = date(&format!("2024-03-{day}"));
        tracker
            .complete_workout(Duration::from_secs(120), today)
            .await
            .unwrap();

        let snapshot = tracker.profile().await.unwrap();
        tracker.apply_snapshot(&snapshot, today).await.unwrap();
    }

    // 7 sessions of 150 XP clear the 1000 XP threshold once
    let profile = tracker.profile().await.unwrap();
    assert_eq!(profile.level, 2);
    assert_eq!(profile.xp, 50);
    assert_eq!(profile.coins, 210);
    assert_eq!(profile.streak, 7);
    assert_eq!(profile.rank, "Apprentice");
}

#[tokio::test]
async fn test_observer_advances_levels_one_snapshot_at_a_time() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let profile = db.create_profile("Warrior").await.unwrap();
    let tracker = Arc::new(ProgressionTracker::new(Arc::clone(&db), profile.id));
    let mut events = tracker.events();

    let observer = {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move { tracker.observe().await })
    };

    // Enough experience to clear two thresholds (1000, then 2000)
    db.update(
        profile.id,
        ProfileUpdate {
            add_xp: Some(3350),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    for expected_level in [2, 3] {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no level-up event arrived")
            .unwrap();
        let ProgressionEvent::LevelUp { level, .. } = event;
        assert_eq!(level, expected_level);
    }

    observer.abort();

    let profile = db.read(profile.id).await.unwrap().unwrap();
    assert_eq!(profile.level, 3);
    assert_eq!(profile.xp, 350);
}

#[tokio::test]
async fn test_returning_after_a_break_resets_streak() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let profile = db.create_profile("Warrior").await.unwrap();
    let tracker = ProgressionTracker::new(Arc::clone(&db), profile.id);

    for day in ["2024-03-10", "2024-03-11", "2024-03-12"] {
        tracker
            .complete_workout(Duration::from_secs(90), date(day))
            .await
            .unwrap();
    }
    assert_eq!(tracker.profile().await.unwrap().streak, 3);

    // Two idle days lapse the streak on the next session check
    let snapshot = tracker.profile().await.unwrap();
    tracker
        .apply_snapshot(&snapshot, date("2024-03-15"))
        .await
        .unwrap();
    assert_eq!(tracker.profile().await.unwrap().streak, 0);

    // Training again starts a fresh streak
    tracker
        .complete_workout(Duration::from_secs(90), date("2024-03-15"))
        .await
        .unwrap();
    assert_eq!(tracker.profile().await.unwrap().streak, 1);
}

#[tokio::test]
async fn test_attribute_build_out() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let profile = db.create_profile("Warrior").await.unwrap();
    let tracker = ProgressionTracker::new(Arc::clone(&db), profile.id);

    db.update(
        profile.id,
        ProfileUpdate {
            add_points: Some(3),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    tracker.spend_point(Attribute::Strength).await.unwrap();
    tracker.spend_point(Attribute::Strength).await.unwrap();
    tracker.spend_point(Attribute::Resilience).await.unwrap();
    // Out of points now, so this one changes nothing
    tracker.spend_point(Attribute::Intelligence).await.unwrap();

    let profile = tracker.profile().await.unwrap();
    assert_eq!(profile.strength, 3);
    assert_eq!(profile.resilience, 2);
    assert_eq!(profile.intelligence, 1);
    assert_eq!(profile.points, 0);
}

#[tokio::test]
async fn test_routines_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("levelfit.db");

    let profile_id = {
        let db = Arc::new(Database::open(&path).unwrap());
        let profile = db.create_profile("Warrior").await.unwrap();
        let tracker = ProgressionTracker::new(Arc::clone(&db), profile.id);

        tracker
            .create_routine("Push Day", vec!["Bench Press".to_string(), "Push-Up".to_string()])
            .await
            .unwrap();
        tracker
            .create_routine("Pull Day", vec!["Pull-Up".to_string()])
            .await
            .unwrap();

        profile.id
    };

    let db = Database::open(&path).unwrap();
    let profile = db.read(profile_id).await.unwrap().unwrap();
    assert_eq!(profile.routines.len(), 2);
    assert_eq!(profile.routines[0].name, "Push Day");
    assert_eq!(profile.routines[1].name, "Pull Day");
    assert_ne!(profile.routines[0].id, profile.routines[1].id);
}
