// Freshness strategies for cache entries.
// Decides whether an entry written at a given instant is still usable.

use std::time::{Duration, SystemTime};

/// Default freshness window for every store: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Where a store takes an entry's write time from, and how long it stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Write time is the `timestamp` recorded inside the entry envelope.
    Stamped(Duration),
    /// Write time is the file's modification time.
    Modified(Duration),
}

impl Freshness {
    /// The window after which an entry is treated as absent.
    pub fn window(&self) -> Duration {
        match self {
            Freshness::Stamped(window) | Freshness::Modified(window) => *window,
        }
    }

    /// An entry is fresh while `now - written_at <= window`.
    /// Write times in the future count as age zero.
    pub fn is_fresh(&self, written_at: SystemTime, now: SystemTime) -> bool {
        let age = now.duration_since(written_at).unwrap_or(Duration::ZERO);
        age <= self.window()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_within_window() {
        let freshness = Freshness::Stamped(Duration::from_secs(3600));
        let written = SystemTime::now();

        assert!(freshness.is_fresh(written, written));
        assert!(freshness.is_fresh(written, written + Duration::from_secs(3600)));
    }

    #[test]
    fn test_stale_just_past_window() {
        let freshness = Freshness::Modified(Duration::from_secs(3600));
        let written = SystemTime::now();

        assert!(!freshness.is_fresh(
            written,
            written + Duration::from_secs(3600) + Duration::from_millis(1)
        ));
    }

    #[test]
    fn test_future_write_time_is_fresh() {
        let freshness = Freshness::Stamped(Duration::ZERO);
        let now = SystemTime::now();

        assert!(freshness.is_fresh(now + Duration::from_secs(30), now));
    }
}
