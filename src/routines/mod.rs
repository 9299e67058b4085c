//! Custom routines and the built-in exercise catalog.

pub mod library;
pub mod types;

pub use library::MuscleGroup;
pub use types::{Routine, RoutineTier};
