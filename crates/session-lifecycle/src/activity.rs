//! Last-activity tracking for the inactivity timeout.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Records the timestamp of the most recent user interaction.
///
/// A single overwritten timestamp, no history. The host decides what counts
/// as interaction and calls [`ActivityTracker::touch`] for each one; the
/// inactivity check only ever asks how long ago the last touch was.
pub struct ActivityTracker {
    last_activity: Mutex<Instant>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Overwrite the last-activity timestamp with the current time.
    pub fn touch(&self) {
        *self.last_activity.lock().unwrap() = Instant::now();
    }

    /// Timestamp of the most recent activity.
    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock().unwrap()
    }

    /// Time elapsed since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        self.last_activity().elapsed()
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fresh_tracker_is_not_idle() {
        let tracker = ActivityTracker::new();
        assert_eq!(tracker.idle_for(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_accumulates() {
        let tracker = ActivityTracker::new();
        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(tracker.idle_for(), Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_resets_idle_time() {
        let tracker = ActivityTracker::new();
        tokio::time::advance(Duration::from_secs(120)).await;
        tracker.touch();
        assert_eq!(tracker.idle_for(), Duration::ZERO);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(tracker.idle_for(), Duration::from_secs(5));
    }
}
