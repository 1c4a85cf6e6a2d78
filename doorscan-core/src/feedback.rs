//! Confirmation and warning feedback for scans.

use std::sync::Arc;

use tracing::warn;

use crate::capabilities::{Haptics, StatusSink, Tone, ToneSpec};
use crate::constants::{HAPTIC_PATTERN, SUCCESS_DISPLAY, WARNING_DISPLAY};
use crate::error::CapabilityError;
use crate::status::{StatusUpdate, Toast};

/// Fires the visual, audible and haptic confirmation of an accepted scan.
///
/// Every channel is independent: a failing speaker does not stop the toast.
#[derive(Clone, Debug)]
pub struct FeedbackDispatcher {
    tone: Arc<dyn Tone>,
    haptics: Arc<dyn Haptics>,
    status: Arc<dyn StatusSink>,
}

impl FeedbackDispatcher {
    /// Dispatcher over the given capabilities.
    pub fn new(
        tone: Arc<dyn Tone>,
        haptics: Arc<dyn Haptics>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            tone,
            haptics,
            status,
        }
    }

    /// Beep, vibrate, success badge and a toast naming `code`.
    pub fn fire(&self, code: &str) {
        log_failure(self.tone.play(&ToneSpec::confirmation()));

        if self.haptics.is_supported() {
            log_failure(self.haptics.pulse(&HAPTIC_PATTERN));
        }

        self.set_status(&StatusUpdate::recognized());
        self.toast(Toast::success(code, SUCCESS_DISPLAY));
    }

    /// Error badge plus a warning toast, used when a code is refused.
    pub fn warn(&self, message: &str) {
        self.set_status(&StatusUpdate::error(message));
        self.toast(Toast::warning(message, WARNING_DISPLAY));
    }

    /// Updates the badge, logging failures.
    pub fn set_status(&self, update: &StatusUpdate) {
        log_failure(self.status.update_status(update));
    }

    /// Shows the camera error panel, logging failures.
    pub fn show_error_panel(&self, message: &str, hint: &str) {
        log_failure(self.status.show_error_panel(message, hint));
    }

    /// Shows `toast` and schedules its dismissal.
    pub fn toast(&self, toast: Toast) {
        if let Err(err) = self.status.show_toast(&toast) {
            log_failure(Err(err));
            return;
        }
        schedule_dismiss(Arc::clone(&self.status), toast);
    }
}

fn schedule_dismiss(status: Arc<dyn StatusSink>, toast: Toast) {
    let Toast {
        id, display_for, ..
    } = toast;
    tokio::spawn(async move {
        tokio::time::sleep(display_for).await;
        log_failure(status.dismiss_toast(id));
    });
}

fn log_failure(result: Result<(), CapabilityError>) {
    if let Err(err) = result {
        warn!(target: "doorscan::feedback", capability = err.capability, reason = %err.reason, "feedback channel failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{Severity, ToastId, ToastKind};
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct Recorder {
        log: Mutex<Vec<String>>,
        broken: bool,
    }

    impl Recorder {
        fn broken() -> Self {
            Self {
                broken: true,
                ..Self::default()
            }
        }

        fn push(&self, entry: String) -> Result<(), CapabilityError> {
            if self.broken {
                return Err(CapabilityError::new("test", "broken"));
            }
            self.log.lock().push(entry);
            Ok(())
        }

        fn entries(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    impl Tone for Recorder {
        fn play(&self, spec: &ToneSpec) -> Result<(), CapabilityError> {
            self.push(format!("tone {}", spec.frequency_hz))
        }
    }

    impl Haptics for Recorder {
        fn is_supported(&self) -> bool {
            true
        }

        fn pulse(&self, pattern: &[Duration]) -> Result<(), CapabilityError> {
            self.push(format!("pulse {}", pattern.len()))
        }
    }

    impl StatusSink for Recorder {
        fn update_status(&self, update: &StatusUpdate) -> Result<(), CapabilityError> {
            let kind = match update.severity {
                Severity::Success => "success",
                Severity::Error => "error",
                _ => "other",
            };
            self.push(format!("status {kind} {}", update.message))
        }

        fn show_toast(&self, toast: &Toast) -> Result<(), CapabilityError> {
            let kind = match toast.kind {
                ToastKind::Success => "success",
                ToastKind::Warning => "warning",
            };
            self.push(format!(
                "toast {kind} {}",
                toast.detail.clone().unwrap_or_else(|| toast.title.clone())
            ))
        }

        fn dismiss_toast(&self, _id: ToastId) -> Result<(), CapabilityError> {
            self.push("dismiss".to_string())
        }

        fn show_error_panel(&self, message: &str, _hint: &str) -> Result<(), CapabilityError> {
            self.push(format!("panel {message}"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fire_reaches_every_channel_and_dismisses_the_toast() {
        let sink = Arc::new(Recorder::default());
        let dispatcher = FeedbackDispatcher::new(sink.clone(), sink.clone(), sink.clone());

        dispatcher.fire("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(
            sink.entries(),
            vec![
                "tone 1200",
                "pulse 3",
                "status success Code recognized!",
                "toast success ABCDEFGHIJKLMNOPQRST...",
            ]
        );

        tokio::time::sleep(SUCCESS_DISPLAY - Duration::from_millis(1)).await;
        assert!(!sink.entries().contains(&"dismiss".to_string()));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(sink.entries().last().map(String::as_str), Some("dismiss"));
    }

    #[tokio::test(start_paused = true)]
    async fn broken_tone_does_not_block_the_rest() {
        let broken = Arc::new(Recorder::broken());
        let sink = Arc::new(Recorder::default());
        let dispatcher = FeedbackDispatcher::new(broken.clone(), broken, sink.clone());

        dispatcher.fire("EVT-123");
        assert_eq!(
            sink.entries(),
            vec!["status success Code recognized!", "toast success EVT-123"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn warn_shows_error_status_and_warning_toast() {
        let sink = Arc::new(Recorder::default());
        let dispatcher = FeedbackDispatcher::new(sink.clone(), sink.clone(), sink.clone());

        dispatcher.warn("Invalid code");
        assert_eq!(
            sink.entries(),
            vec!["status error Invalid code", "toast warning Invalid code"]
        );

        tokio::time::sleep(WARNING_DISPLAY + Duration::from_millis(1)).await;
        assert_eq!(sink.entries().last().map(String::as_str), Some("dismiss"));
    }
}
