//! Routine type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-authored named list of exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    /// Unique time-based identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Ordered exercise names
    pub exercises: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Routine {
    /// Create a routine stamped with the current time.
    pub fn new(name: String, exercises: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_micros().to_string(),
            name,
            exercises,
            created_at: now,
        }
    }

    /// Display tier based on exercise count.
    pub fn tier(&self) -> RoutineTier {
        RoutineTier::for_count(self.exercises.len())
    }
}

/// Display tier for a routine, by how many exercises it packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineTier {
    E,
    C,
    A,
    S,
}

impl RoutineTier {
    /// Tier for the given exercise count.
    pub fn for_count(count: usize) -> Self {
        match count {
            0..=3 => RoutineTier::E,
            4..=5 => RoutineTier::C,
            6..=7 => RoutineTier::A,
            _ => RoutineTier::S,
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            RoutineTier::E => "Tier E",
            RoutineTier::C => "Tier C",
            RoutineTier::A => "Tier A",
            RoutineTier::S => "Tier S",
        }
    }
}

impl std::fmt::Display for RoutineTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
