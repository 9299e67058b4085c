//! SQLite-backed profile store.
//!
//! Implements the `ProfileStore` contract on top of rusqlite with schema
//! versioning, and fans a snapshot out over a watch channel after every
//! committed write so subscribers always observe the latest document.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::progression::types::{BodyType, PlayerProfile};
use crate::routines::types::Routine;
use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use crate::storage::store::{ProfileStore, ProfileUpdate, StoreError};

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Mutex<Connection>,
    watchers: Mutex<HashMap<Uuid, watch::Sender<PlayerProfile>>>,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
        Self::initialize(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            watchers: Mutex::new(HashMap::new()),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
        Self::initialize(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            watchers: Mutex::new(HashMap::new()),
        })
    }

    /// Initialize the database schema.
    fn initialize(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

        let current_version = Self::get_schema_version(conn)?;
        if current_version < CURRENT_VERSION {
            Self::migrate(conn, current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    fn get_schema_version(conn: &Connection) -> Result<i32, StoreError> {
        let result: SqliteResult<i32> = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(StoreError::QueryFailed(e.to_string())),
        }
    }

    /// Run database migrations.
    fn migrate(conn: &Connection, from_version: i32) -> Result<(), StoreError> {
        if from_version < 1 {
            conn.execute_batch(SCHEMA)
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

            conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
                [CURRENT_VERSION],
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        }

        Ok(())
    }

    /// Create a profile document with account-creation defaults.
    pub async fn create_profile(&self, name: &str) -> Result<PlayerProfile, StoreError> {
        let profile = PlayerProfile::new(name.to_string());
        let conn = self.conn.lock().await;

        conn.execute(
            "INSERT INTO profiles
             (id, name, level, xp, rank, points, strength, intelligence, resilience,
              weight_kg, height_m, body_type, coins, streak, last_workout_date,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                profile.id.to_string(),
                profile.name,
                profile.level,
                profile.xp,
                profile.rank,
                profile.points,
                profile.strength,
                profile.intelligence,
                profile.resilience,
                profile.weight_kg,
                profile.height_m,
                profile.body_type.map(|b| b.as_str()),
                profile.coins,
                profile.streak,
                profile.last_workout_date.map(|d| d.to_string()),
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(profile)
    }

    /// List all profile ids with display names.
    pub async fn list_profiles(&self) -> Result<Vec<(Uuid, String)>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT id, name FROM profiles ORDER BY created_at ASC")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let id_str: String = row.get(0)?;
                let name: String = row.get(1)?;
                Ok((id_str, name))
            })
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let mut profiles = Vec::new();
        for row in rows {
            let (id_str, name) = row.map_err(|e| StoreError::QueryFailed(e.to_string()))?;
            profiles.push((Uuid::parse_str(&id_str).unwrap_or_default(), name));
        }

        Ok(profiles)
    }

    /// Push the latest snapshot to the profile's watch channel, if any.
    async fn notify(&self, profile_id: Uuid) -> Result<(), StoreError> {
        let snapshot = {
            let conn = self.conn.lock().await;
            load_profile(&conn, profile_id)?
        };

        if let Some(profile) = snapshot {
            let watchers = self.watchers.lock().await;
            if let Some(sender) = watchers.get(&profile_id) {
                sender.send_replace(profile);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for Database {
    async fn read(&self, profile_id: Uuid) -> Result<Option<PlayerProfile>, StoreError> {
        let conn = self.conn.lock().await;
        load_profile(&conn, profile_id)
    }

    async fn update(&self, profile_id: Uuid, update: ProfileUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }

        {
            let mut conn = self.conn.lock().await;
            apply_update(&mut conn, profile_id, &update)?;
        }

        self.notify(profile_id).await
    }

    async fn subscribe(
        &self,
        profile_id: Uuid,
    ) -> Result<watch::Receiver<PlayerProfile>, StoreError> {
        let profile = {
            let conn = self.conn.lock().await;
            load_profile(&conn, profile_id)?.ok_or(StoreError::NotFound(profile_id))?
        };

        let mut watchers = self.watchers.lock().await;
        if let Some(sender) = watchers.get(&profile_id) {
            sender.send_replace(profile);
            return Ok(sender.subscribe());
        }

        let (sender, receiver) = watch::channel(profile);
        watchers.insert(profile_id, sender);
        Ok(receiver)
    }
}

/// Apply a partial update inside one transaction.
fn apply_update(
    conn: &mut Connection,
    profile_id: Uuid,
    update: &ProfileUpdate,
) -> Result<(), StoreError> {
    let id = profile_id.to_string();

    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM profiles WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    if !exists {
        return Err(StoreError::NotFound(profile_id));
    }

    let tx = conn
        .transaction()
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

    if let Some(level) = update.set_level {
        tx.execute(
            "UPDATE profiles SET level = ?1 WHERE id = ?2",
            params![level, id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(xp) = update.set_xp {
        tx.execute("UPDATE profiles SET xp = ?1 WHERE id = ?2", params![xp, id])
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(rank) = &update.set_rank {
        tx.execute(
            "UPDATE profiles SET rank = ?1 WHERE id = ?2",
            params![rank, id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(streak) = update.set_streak {
        tx.execute(
            "UPDATE profiles SET streak = ?1 WHERE id = ?2",
            params![streak, id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(date) = update.set_last_workout_date {
        tx.execute(
            "UPDATE profiles SET last_workout_date = ?1 WHERE id = ?2",
            params![date.to_string(), id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(weight) = update.set_weight_kg {
        tx.execute(
            "UPDATE profiles SET weight_kg = ?1 WHERE id = ?2",
            params![weight, id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(height) = update.set_height_m {
        tx.execute(
            "UPDATE profiles SET height_m = ?1 WHERE id = ?2",
            params![height, id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(body_type) = update.set_body_type {
        tx.execute(
            "UPDATE profiles SET body_type = ?1 WHERE id = ?2",
            params![body_type.as_str(), id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(amount) = update.add_xp {
        tx.execute(
            "UPDATE profiles SET xp = xp + ?1 WHERE id = ?2",
            params![amount, id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(amount) = update.add_coins {
        tx.execute(
            "UPDATE profiles SET coins = coins + ?1 WHERE id = ?2",
            params![amount, id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(amount) = update.add_streak {
        tx.execute(
            "UPDATE profiles SET streak = streak + ?1 WHERE id = ?2",
            params![amount, id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(amount) = update.add_points {
        tx.execute(
            "UPDATE profiles SET points = points + ?1 WHERE id = ?2",
            params![amount, id],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(attribute) = update.spend_point {
        // Conditional spend: stays a no-op while no points remain
        let statement = format!(
            "UPDATE profiles SET {column} = {column} + 1, points = points - 1
             WHERE id = ?1 AND points > 0",
            column = attribute.as_str()
        );
        tx.execute(&statement, params![id])
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    if let Some(routine) = &update.append_routine {
        let exercises_json = serde_json::to_string(&routine.exercises)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        tx.execute(
            "INSERT OR IGNORE INTO routines (id, profile_id, name, exercises_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                routine.id,
                id,
                routine.name,
                exercises_json,
                routine.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
    }

    tx.execute(
        "UPDATE profiles SET updated_at = ?1 WHERE id = ?2",
        params![Utc::now().to_rfc3339(), id],
    )
    .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

    tx.commit()
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
}

/// Load a full profile document, including its routines.
fn load_profile(conn: &Connection, profile_id: Uuid) -> Result<Option<PlayerProfile>, StoreError> {
    let profile = conn
        .query_row(
            "SELECT id, name, level, xp, rank, points, strength, intelligence, resilience,
                    weight_kg, height_m, body_type, coins, streak, last_workout_date,
                    created_at, updated_at
             FROM profiles WHERE id = ?1",
            params![profile_id.to_string()],
            parse_profile_row,
        )
        .optional()
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

    let Some(mut profile) = profile else {
        return Ok(None);
    };

    profile.routines = load_routines(conn, profile_id)?;
    Ok(Some(profile))
}

/// Load a profile's routines in append order.
fn load_routines(conn: &Connection, profile_id: Uuid) -> Result<Vec<Routine>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, exercises_json, created_at
             FROM routines WHERE profile_id = ?1
             ORDER BY created_at ASC",
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

    let rows = stmt
        .query_map(params![profile_id.to_string()], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let exercises_json: String = row.get(2)?;
            let created_at_str: String = row.get(3)?;
            Ok((id, name, exercises_json, created_at_str))
        })
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

    let mut routines = Vec::new();
    for row in rows {
        let (id, name, exercises_json, created_at_str) =
            row.map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let exercises: Vec<String> = serde_json::from_str(&exercises_json)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        routines.push(Routine {
            id,
            name,
            exercises,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        });
    }

    Ok(routines)
}

/// Parse a database row into a PlayerProfile, routines excluded.
fn parse_profile_row(row: &rusqlite::Row) -> rusqlite::Result<PlayerProfile> {
    let id_str: String = row.get(0)?;
    let body_type_str: Option<String> = row.get(11)?;
    let last_workout_str: Option<String> = row.get(14)?;
    let created_at_str: String = row.get(15)?;
    let updated_at_str: String = row.get(16)?;

    Ok(PlayerProfile {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        name: row.get(1)?,
        level: row.get(2)?,
        xp: row.get(3)?,
        rank: row.get(4)?,
        points: row.get(5)?,
        strength: row.get(6)?,
        intelligence: row.get(7)?,
        resilience: row.get(8)?,
        weight_kg: row.get(9)?,
        height_m: row.get(10)?,
        body_type: body_type_str.and_then(|s| BodyType::from_str(&s).ok()),
        coins: row.get(12)?,
        streak: row.get(13)?,
        last_workout_date: last_workout_str
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        routines: Vec::new(),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
