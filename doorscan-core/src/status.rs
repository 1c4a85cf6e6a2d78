//! Presentation-facing values: status badge updates and toasts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Badge while the camera starts.
pub const STATUS_INITIALIZING: &str = "Initializing...";
/// Badge while scanning.
pub const STATUS_ACTIVE: &str = "Scanner active";
/// Badge right after an accepted scan.
pub const STATUS_RECOGNIZED: &str = "Code recognized!";
/// Badge after a stop.
pub const STATUS_STOPPED: &str = "Scanner stopped";
/// Title of the success toast.
pub const TOAST_RECOGNIZED: &str = "Code recognized";

/// Badge severity. Presenters pick colours and icons from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Camera starting.
    Loading,
    /// Idle or scanning.
    Ready,
    /// Code accepted.
    Success,
    /// Failure or refused code.
    Error,
}

impl Severity {
    /// Emoji shown in front of the message.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Loading => "⏳",
            Self::Ready => "📸",
            Self::Success => "✅",
            Self::Error => "⚠️",
        }
    }
}

/// New content for the status badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Text shown.
    pub message: String,
    /// Drives the badge style.
    pub severity: Severity,
}

impl StatusUpdate {
    /// Update with any message.
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    /// Initializing badge.
    pub fn loading() -> Self {
        Self::new(STATUS_INITIALIZING, Severity::Loading)
    }

    /// Scanner active badge.
    pub fn ready() -> Self {
        Self::new(STATUS_ACTIVE, Severity::Ready)
    }

    /// Scanner stopped badge.
    pub fn stopped() -> Self {
        Self::new(STATUS_STOPPED, Severity::Ready)
    }

    /// Success badge.
    pub fn recognized() -> Self {
        Self::new(STATUS_RECOGNIZED, Severity::Success)
    }

    /// Error badge with `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }
}

/// Identifies a toast so it can be dismissed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl ToastId {
    /// Process-wide unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Accepted scan.
    Success,
    /// Refused code or environment problem.
    Warning,
}

/// Transient notification, dismissed by the scanner after `display_for`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Used to dismiss it.
    pub id: ToastId,
    /// Style.
    pub kind: ToastKind,
    /// Headline.
    pub title: String,
    /// Secondary line, e.g. the scanned code.
    pub detail: Option<String>,
    /// How long before the scanner dismisses it.
    pub display_for: Duration,
}

impl Toast {
    /// Success toast naming a (truncated) code.
    pub fn success(code: &str, display_for: Duration) -> Self {
        Self {
            id: ToastId::next(),
            kind: ToastKind::Success,
            title: TOAST_RECOGNIZED.to_string(),
            detail: Some(truncate_code(code)),
            display_for,
        }
    }

    /// Warning toast without detail.
    pub fn warning(title: impl Into<String>, display_for: Duration) -> Self {
        Self {
            id: ToastId::next(),
            kind: ToastKind::Warning,
            title: title.into(),
            detail: None,
            display_for,
        }
    }
}

/// Shortens a code for display: at most 20 characters, then "...".
pub fn truncate_code(code: &str) -> String {
    use crate::constants::TOAST_CODE_CHARS;

    let mut chars = code.chars();
    let head: String = chars.by_ref().take(TOAST_CODE_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
