//! Workout session clock.

use std::time::{Duration, Instant};

use crate::progression::types::MIN_WORKOUT_SECS;

/// Clock for an active workout session.
#[derive(Debug, Clone)]
pub struct WorkoutSession {
    started_at: Instant,
}

impl WorkoutSession {
    /// Start the session clock.
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    /// Active time so far.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether the session has reached the minimum active time.
    pub fn qualifies(&self) -> bool {
        self.elapsed().as_secs() >= MIN_WORKOUT_SECS
    }

    /// Elapsed time formatted as mm:ss.
    pub fn format_elapsed(&self) -> String {
        format_duration(self.elapsed())
    }
}

/// Format a duration as mm:ss.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_does_not_qualify() {
        let session = WorkoutSession::start();
        assert!(!session.qualifies());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00");
        assert_eq!(format_duration(Duration::from_secs(59)), "00:59");
        assert_eq!(format_duration(Duration::from_secs(61)), "01:01");
        assert_eq!(format_duration(Duration::from_secs(600)), "10:00");
    }
}
