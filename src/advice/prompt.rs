//! Prompt assembly for workout advice.

use crate::progression::types::PlayerProfile;

/// Build the advice prompt for a profile.
///
/// Carries the progression and biometric context the generator needs to
/// tailor a short workout.
pub fn workout_prompt(profile: &PlayerProfile) -> String {
    let mut prompt = format!(
        "You are the personal trainer of a fitness RPG. Write a short, \
         motivating workout for this player:\n\
         Name: {name}, Level: {level} ({rank})",
        name = profile.name,
        level = profile.level,
        rank = profile.current_rank(),
    );

    if let Some(weight) = profile.weight_kg {
        prompt.push_str(&format!(", Weight: {weight} kg"));
    }
    if let Some(body_type) = profile.body_type {
        prompt.push_str(&format!(", Body type: {body_type}"));
    }
    if profile.streak > 0 {
        prompt.push_str(&format!(", Current streak: {} days", profile.streak));
    }

    prompt.push_str(
        ".\nSuggest 3 exercises, explain how to execute each one, and close \
         with a single straight-talk motivational line. Be direct.",
    );

    prompt
}
