//! Built-in exercise library.
//!
//! Curated catalog of exercises grouped by muscle group, offered when
//! building custom routines.

use serde::{Deserialize, Serialize};

/// A muscle group in the exercise catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Arms,
    Legs,
    Back,
    Shoulders,
}

impl MuscleGroup {
    /// All groups, in catalog order.
    pub const ALL: [MuscleGroup; 5] = [
        MuscleGroup::Chest,
        MuscleGroup::Arms,
        MuscleGroup::Legs,
        MuscleGroup::Back,
        MuscleGroup::Shoulders,
    ];

    /// Display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Arms => "Arms",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
        }
    }
}

impl std::fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for MuscleGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chest" => Ok(MuscleGroup::Chest),
            "arms" => Ok(MuscleGroup::Arms),
            "legs" => Ok(MuscleGroup::Legs),
            "back" => Ok(MuscleGroup::Back),
            "shoulders" => Ok(MuscleGroup::Shoulders),
            _ => Err(format!("Unknown muscle group: {s}")),
        }
    }
}

/// Exercises available for the given group.
pub fn exercises_for(group: MuscleGroup) -> &'static [&'static str] {
    match group {
        MuscleGroup::Chest => &[
            "Bench Press",
            "Dumbbell Press",
            "Chest Fly",
            "Cable Crossover",
            "Push-Up",
        ],
        MuscleGroup::Arms => &[
            "Barbell Curl",
            "Hammer Curl",
            "Rope Pushdown",
            "Skull Crusher",
            "Preacher Curl",
        ],
        MuscleGroup::Legs => &[
            "Squat",
            "Leg Press",
            "Leg Extension",
            "Leg Curl",
            "Lunge",
        ],
        MuscleGroup::Back => &[
            "Lat Pulldown",
            "Seated Row",
            "One-Arm Row",
            "Pull-Up",
            "Deadlift",
        ],
        MuscleGroup::Shoulders => &[
            "Shoulder Press",
            "Lateral Raise",
            "Front Raise",
            "Face Pull",
        ],
    }
}

/// Iterate over every exercise across all groups.
pub fn all_exercises() -> impl Iterator<Item = &'static str> {
    MuscleGroup::ALL
        .iter()
        .flat_map(|group| exercises_for(*group).iter().copied())
}

/// Whether the named exercise exists in the catalog.
pub fn contains(name: &str) -> bool {
    all_exercises().any(|exercise| exercise.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_group_has_exercises() {
        for group in MuscleGroup::ALL {
            assert!(!exercises_for(group).is_empty(), "{group} has no exercises");
        }
    }

    #[test]
    fn test_catalog_lookup() {
        assert!(contains("Squat"));
        assert!(contains("lat pulldown"));
        assert!(!contains("Underwater Basket Weaving"));
    }

    #[test]
    fn test_no_duplicate_exercises() {
        let mut seen = std::collections::HashSet::new();
        for exercise in all_exercises() {
            assert!(seen.insert(exercise), "{exercise} listed twice");
        }
    }
}
