//! Player profile and progression type definitions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routines::types::Routine;

/// Experience awarded per completed workout.
pub const XP_PER_WORKOUT: u32 = 150;

/// Coins awarded per completed workout.
pub const COINS_PER_WORKOUT: u32 = 30;

/// Minimum active session time for a workout to count, in seconds.
pub const MIN_WORKOUT_SECS: u64 = 60;

/// Experience required to clear the given level.
pub fn xp_threshold(level: u32) -> u32 {
    level.saturating_mul(1000)
}

/// A contiguous range of levels mapped to a rank name.
#[derive(Debug, Clone, Copy)]
pub struct RankBand {
    /// Lowest level in the band (inclusive)
    pub min_level: u32,
    /// Highest level in the band (inclusive)
    pub max_level: u32,
    /// Display name
    pub name: &'static str,
}

/// Rank bands, ordered and contiguous over levels 1..=9999.
pub const RANK_BANDS: &[RankBand] = &[
    RankBand { min_level: 1, max_level: 5, name: "Apprentice" },
    RankBand { min_level: 6, max_level: 10, name: "Rank E" },
    RankBand { min_level: 11, max_level: 20, name: "Rank D" },
    RankBand { min_level: 21, max_level: 35, name: "Rank C" },
    RankBand { min_level: 36, max_level: 45, name: "Rank B" },
    RankBand { min_level: 46, max_level: 55, name: "Rank A" },
    RankBand { min_level: 56, max_level: 70, name: "Rank S" },
    RankBand { min_level: 71, max_level: 85, name: "International Rank S" },
    RankBand { min_level: 86, max_level: 100, name: "Monarch" },
    RankBand { min_level: 101, max_level: 9999, name: "Transcendent" },
];

/// Look up the rank name for a level.
///
/// Levels outside the table fall back to the highest band.
pub fn rank_for(level: u32) -> &'static str {
    RANK_BANDS
        .iter()
        .find(|band| level >= band.min_level && level <= band.max_level)
        .map(|band| band.name)
        .unwrap_or(RANK_BANDS[RANK_BANDS.len() - 1].name)
}

/// Body type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// Lean build, gains weight and muscle slowly
    Ectomorph,
    /// Athletic build, gains muscle and loses fat readily
    Mesomorph,
    /// Rounder build, stores fat easily but gains muscle well
    Endomorph,
}

impl BodyType {
    /// Classify from body mass index (weight in kg over height in meters squared).
    pub fn from_bmi(weight_kg: f32, height_m: f32) -> Self {
        let bmi = weight_kg / (height_m * height_m);
        if bmi < 19.0 {
            BodyType::Ectomorph
        } else if bmi < 26.0 {
            BodyType::Mesomorph
        } else {
            BodyType::Endomorph
        }
    }

    /// Short description shown when choosing a type.
    pub fn description(&self) -> &'static str {
        match self {
            BodyType::Ectomorph => "Lean build, hard to gain weight or muscle mass",
            BodyType::Mesomorph => "Athletic build, gains muscle and loses fat readily",
            BodyType::Endomorph => "Tends to store fat, but gains muscle mass well",
        }
    }

    /// Stable identifier used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyType::Ectomorph => "ectomorph",
            BodyType::Mesomorph => "mesomorph",
            BodyType::Endomorph => "endomorph",
        }
    }

    /// Display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            BodyType::Ectomorph => "Ectomorph",
            BodyType::Mesomorph => "Mesomorph",
            BodyType::Endomorph => "Endomorph",
        }
    }
}

impl std::fmt::Display for BodyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for BodyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ectomorph" => Ok(BodyType::Ectomorph),
            "mesomorph" => Ok(BodyType::Mesomorph),
            "endomorph" => Ok(BodyType::Endomorph),
            _ => Err(format!("Unknown body type: {s}")),
        }
    }
}

/// A spendable player attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Strength,
    Intelligence,
    Resilience,
}

impl Attribute {
    /// All recognized attributes.
    pub const ALL: [Attribute; 3] = [
        Attribute::Strength,
        Attribute::Intelligence,
        Attribute::Resilience,
    ];

    /// Stable identifier used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Strength => "strength",
            Attribute::Intelligence => "intelligence",
            Attribute::Resilience => "resilience",
        }
    }

    /// Display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Attribute::Strength => "Strength",
            Attribute::Intelligence => "Intelligence",
            Attribute::Resilience => "Resilience",
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strength" => Ok(Attribute::Strength),
            "intelligence" => Ok(Attribute::Intelligence),
            "resilience" => Ok(Attribute::Resilience),
            _ => Err(format!("Unknown attribute: {s}")),
        }
    }
}

/// The persisted per-player progression and biometric record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Current level, starting at 1
    pub level: u32,
    /// Experience toward the next level
    pub xp: u32,
    /// Rank name for the current level
    pub rank: String,
    /// Unspent attribute points
    pub points: u32,
    /// Strength attribute
    pub strength: u32,
    /// Intelligence attribute
    pub intelligence: u32,
    /// Resilience attribute
    pub resilience: u32,
    /// Weight in kilograms, unset until first setup
    pub weight_kg: Option<f32>,
    /// Height in meters, unset until first setup
    pub height_m: Option<f32>,
    /// Body type, derived from BMI at first setup and user-editable after
    pub body_type: Option<BodyType>,
    /// Coins earned from workouts
    pub coins: u32,
    /// Consecutive qualifying workout days
    pub streak: u32,
    /// Calendar date of the last completed workout
    pub last_workout_date: Option<NaiveDate>,
    /// User-authored routines, append-only
    pub routines: Vec<Routine>,
    /// Profile creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl PlayerProfile {
    /// Create a fresh profile with account-creation defaults.
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            level: 1,
            xp: 0,
            rank: rank_for(1).to_string(),
            points: 0,
            strength: 1,
            intelligence: 1,
            resilience: 1,
            weight_kg: None,
            height_m: None,
            body_type: None,
            coins: 0,
            streak: 0,
            last_workout_date: None,
            routines: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Experience required to reach the next level.
    pub fn xp_required(&self) -> u32 {
        xp_threshold(self.level)
    }

    /// Rank derived from the current level.
    ///
    /// The stored `rank` field is a display convenience refreshed on level
    /// change; this lookup is the authoritative mapping.
    pub fn current_rank(&self) -> &'static str {
        rank_for(self.level)
    }

    /// Progress toward the next level as a percentage (0-100).
    pub fn xp_percent(&self) -> u32 {
        let required = self.xp_required().max(1);
        ((self.xp as f64 / required as f64 * 100.0).round() as u32).min(100)
    }

    /// Whether biometrics still need to be recorded.
    pub fn needs_setup(&self) -> bool {
        self.weight_kg.is_none() || self.height_m.is_none()
    }

    /// Current value of the given attribute.
    pub fn attribute(&self, attribute: Attribute) -> u32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Intelligence => self.intelligence,
            Attribute::Resilience => self.resilience,
        }
    }
}
