//! Database schema definitions for LevelFit.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Profiles table
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    level INTEGER NOT NULL DEFAULT 1,
    xp INTEGER NOT NULL DEFAULT 0,
    rank TEXT NOT NULL,
    points INTEGER NOT NULL DEFAULT 0,
    strength INTEGER NOT NULL DEFAULT 1,
    intelligence INTEGER NOT NULL DEFAULT 1,
    resilience INTEGER NOT NULL DEFAULT 1,
    weight_kg REAL,
    height_m REAL,
    body_type TEXT,
    coins INTEGER NOT NULL DEFAULT 0,
    streak INTEGER NOT NULL DEFAULT 0,
    last_workout_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Custom routines table, append-only per profile
CREATE TABLE IF NOT EXISTS routines (
    id TEXT NOT NULL,
    profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    exercises_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (id, profile_id)
);

CREATE INDEX IF NOT EXISTS idx_routines_profile_id ON routines(profile_id);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
