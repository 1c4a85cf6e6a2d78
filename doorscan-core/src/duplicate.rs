//! Two-second duplicate window for accepted codes.

use std::time::Duration;

use tokio::time::Instant;

use crate::constants::DUPLICATE_WINDOW;

/// The most recently recorded code and when it was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastAccepted {
    /// Decoded text.
    pub code: String,
    /// When it was recorded.
    pub at: Instant,
}

/// Suppresses a repeat of the previous code inside a fixed window.
///
/// Code and instant are replaced together by [`DuplicateFilter::record`], so
/// callers never observe one without the other.
#[derive(Debug, Clone)]
pub struct DuplicateFilter {
    window: Duration,
    last: Option<LastAccepted>,
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self::new(DUPLICATE_WINDOW)
    }
}

impl DuplicateFilter {
    /// Filter with a custom window.
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Length of the suppression window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Most recently recorded code.
    pub fn last(&self) -> Option<&LastAccepted> {
        self.last.as_ref()
    }

    /// True when `code` repeats the last code less than one window after it.
    pub fn should_suppress(&self, code: &str, now: Instant) -> bool {
        match &self.last {
            Some(last) => {
                last.code == code && now.saturating_duration_since(last.at) < self.window
            }
            None => false,
        }
    }

    /// Restarts the window for `code`.
    pub fn record(&mut self, code: &str, now: Instant) {
        self.last = Some(LastAccepted {
            code: code.to_string(),
            at: now,
        });
    }

    /// Checks and records in one step. Returns true when the frame is a
    /// duplicate; nothing is recorded in that case.
    pub fn admit(&mut self, code: &str, now: Instant, allow_duplicates: bool) -> bool {
        if !allow_duplicates && self.should_suppress(code, now) {
            return true;
        }
        self.record(code, now);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_code_is_never_suppressed() {
        let filter = DuplicateFilter::default();
        assert!(!filter.should_suppress("EVT-123", Instant::now()));
    }

    #[test]
    fn repeat_inside_window_is_suppressed() {
        let t0 = Instant::now();
        let mut filter = DuplicateFilter::default();
        assert!(!filter.admit("EVT-123", t0, false));
        assert!(filter.admit("EVT-123", t0 + ms(500), false));
        assert!(filter.admit("EVT-123", t0 + ms(1999), false));
    }

    #[test]
    fn repeat_at_window_boundary_is_accepted() {
        let t0 = Instant::now();
        let mut filter = DuplicateFilter::default();
        filter.record("EVT-123", t0);
        assert!(!filter.should_suppress("EVT-123", t0 + ms(2000)));
        assert!(!filter.should_suppress("EVT-123", t0 + ms(2500)));
    }

    #[test]
    fn suppressed_frames_do_not_extend_the_window() {
        let t0 = Instant::now();
        let mut filter = DuplicateFilter::default();
        filter.admit("EVT-123", t0, false);
        assert!(filter.admit("EVT-123", t0 + ms(1500), false));
        // Window still counts from t0.
        assert!(!filter.admit("EVT-123", t0 + ms(2100), false));
        assert_eq!(filter.last().unwrap().at, t0 + ms(2100));
    }

    #[test]
    fn different_code_restarts_the_window() {
        let t0 = Instant::now();
        let mut filter = DuplicateFilter::default();
        filter.admit("EVT-1", t0, false);
        assert!(!filter.admit("EVT-2", t0 + ms(100), false));
        assert!(!filter.admit("EVT-1", t0 + ms(200), false));
        assert_eq!(filter.last().unwrap().code, "EVT-1");
    }

    #[test]
    fn allow_duplicates_never_suppresses() {
        let t0 = Instant::now();
        let mut filter = DuplicateFilter::default();
        for offset in [0, 1, 10, 500, 1999] {
            assert!(!filter.admit("EVT-123", t0 + ms(offset), true));
        }
        assert_eq!(filter.last().unwrap().at, t0 + ms(1999));
    }

    #[test]
    fn out_of_order_timestamps_count_as_inside_window() {
        let t0 = Instant::now() + ms(5000);
        let mut filter = DuplicateFilter::default();
        filter.record("EVT-123", t0);
        assert!(filter.should_suppress("EVT-123", t0 - ms(100)));
    }
}
