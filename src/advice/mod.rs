//! AI workout advice.
//!
//! Builds a prompt from the player's progression context and requests
//! free-form advice text from the cloud generation endpoint.

pub mod client;
pub mod prompt;

pub use client::{AdviceClient, AdviceError};
pub use prompt::workout_prompt;
