//! Error types for the scanner and its capabilities.

use thiserror::Error;

use crate::camera::PageContext;
use crate::lifecycle::{LifecycleEvent, SessionState};

/// Hint shown when nothing more specific applies.
pub const MANUAL_ENTRY_HINT: &str = "Use the manual input below to enter the code.";

/// Hint for a refused camera permission on a secure page.
pub const PERMISSION_HINT: &str =
    "Check the browser settings and allow access to the camera.";

/// Hint for a refused camera permission on an insecure page.
pub const INSECURE_PERMISSION_HINT: &str = "Insecure connection: the camera needs HTTPS (or localhost). Reopen the scanner over https://.";

/// Hint for an insecure page when the camera failure is not otherwise classified.
pub const INSECURE_CONTEXT_HINT: &str =
    "Open the app over https:// (or use localhost) to use the scanner.";

/// Failure category reported by a camera capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraErrorKind {
    /// The user or browser refused camera access.
    PermissionDenied,
    /// No camera device.
    NotFound,
    /// The device is in use elsewhere.
    Busy,
    /// Anything else.
    Other,
}

/// Raw failure reported by a camera capability when starting or stopping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("camera error ({kind:?}): {message}")]
pub struct CameraError {
    /// Failure category.
    pub kind: CameraErrorKind,
    /// Message from the device layer.
    pub message: String,
}

impl CameraError {
    /// Error of the given kind.
    pub fn new(kind: CameraErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Unclassified error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(CameraErrorKind::Other, message)
    }

    /// Classifies a browser media error by its exception name, falling back to
    /// the message text for permission failures that arrive unnamed.
    pub fn from_dom_name(name: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = match name {
            "NotAllowedError" => CameraErrorKind::PermissionDenied,
            _ if message.contains("Permission") => {
                CameraErrorKind::PermissionDenied
            }
            "NotFoundError" => CameraErrorKind::NotFound,
            "NotReadableError" => CameraErrorKind::Busy,
            _ => CameraErrorKind::Other,
        };
        Self { kind, message }
    }
}

/// Terminal camera failure stored in [`SessionState::Error`].
///
/// Each fault carries the user-facing message and remediation hint that the
/// session surfaces through the status sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraFault {
    /// Camera access was refused.
    #[error("camera permission denied")]
    PermissionDenied {
        /// The page was not a secure context when the permission was refused.
        insecure_context: bool,
    },

    /// No camera device.
    #[error("no camera found")]
    NotFound,

    /// The camera is used by another application.
    #[error("camera busy")]
    Busy,

    /// The page is not a secure context.
    #[error("insecure page context")]
    InsecureContext,

    /// Any other start failure, with the device message.
    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

impl CameraFault {
    /// Maps a raw camera error to a fault, taking the page's security into account.
    pub fn classify(error: &CameraError, page: &PageContext) -> Self {
        match error.kind {
            CameraErrorKind::PermissionDenied => Self::PermissionDenied {
                insecure_context: !page.is_secure(),
            },
            CameraErrorKind::NotFound => Self::NotFound,
            CameraErrorKind::Busy => Self::Busy,
            CameraErrorKind::Other if !page.is_secure() => Self::InsecureContext,
            CameraErrorKind::Other => Self::Unavailable(error.message.clone()),
        }
    }

    /// Short status message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "Camera permission denied",
            Self::NotFound => "Camera not found",
            Self::Busy => "Camera already in use",
            Self::InsecureContext => "Insecure connection",
            Self::Unavailable(_) => "Camera error",
        }
    }

    /// Remediation hint shown under the message.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::PermissionDenied {
                insecure_context: true,
            } => INSECURE_PERMISSION_HINT,
            Self::PermissionDenied {
                insecure_context: false,
            } => PERMISSION_HINT,
            Self::InsecureContext => INSECURE_CONTEXT_HINT,
            Self::NotFound | Self::Busy | Self::Unavailable(_) => MANUAL_ENTRY_HINT,
        }
    }
}

/// Transport-level precheck failure. Always recovered by failing open.
#[derive(Error, Debug)]
pub enum PrecheckError {
    /// Request could not be sent or the response not read.
    #[error("precheck transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("malformed precheck response: {0}")]
    Malformed(String),

    /// Configured HTTP method is not a valid method.
    #[error("invalid precheck method: {0}")]
    InvalidMethod(String),
}

/// Lifecycle requests that were rejected as no-ops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Start requested while starting or active.
    #[error("scanner already starting or active")]
    StartAlreadyInProgress,

    /// Stop requested while idle or failed.
    #[error("scanner is not running")]
    StopWhileIdle,

    /// Event not allowed in the current state.
    #[error("invalid transition from {from:?} on {event:?}")]
    InvalidTransition {
        /// State the session was in.
        from: SessionState,
        /// Event that does not apply to it.
        event: LifecycleEvent,
    },
}

/// Failure of a best-effort presentation or device capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{capability} unavailable: {reason}")]
pub struct CapabilityError {
    /// Capability name, e.g. `haptics`.
    pub capability: &'static str,
    /// What went wrong.
    pub reason: String,
}

impl CapabilityError {
    /// Failure of `capability`.
    pub fn new(capability: &'static str, reason: impl Into<String>) -> Self {
        Self {
            capability,
            reason: reason.into(),
        }
    }
}

/// Form submission failure.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// No form with this id.
    #[error("form not found: {0}")]
    FormNotFound(String),

    /// The server answered with an error status.
    #[error("form {form_id} rejected with status {status}")]
    Rejected {
        /// Form that was posted.
        form_id: String,
        /// HTTP status of the response.
        status: u16,
    },

    /// The form's method is not a valid HTTP method.
    #[error("form {form_id} has unusable method '{method}'")]
    InvalidMethod {
        /// Form with the bad method.
        form_id: String,
        /// Configured method text.
        method: String,
    },

    /// Request could not be sent.
    #[error("form submission transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Umbrella error for fallible construction and host-facing helpers.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    /// Precheck setup failed.
    Precheck(#[from] PrecheckError),

    #[error(transparent)]
    /// Form submission failed.
    Submit(#[from] SubmitError),
}

/// Result with [`ScanError`].
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn insecure() -> PageContext {
        PageContext::from_origin("http://192.168.1.20:5000".parse().unwrap())
    }

    #[test]
    fn dom_names_map_to_kinds() {
        assert_eq!(
            CameraError::from_dom_name("NotAllowedError", "denied").kind,
            CameraErrorKind::PermissionDenied
        );
        assert_eq!(
            CameraError::from_dom_name("Error", "Permission dismissed").kind,
            CameraErrorKind::PermissionDenied
        );
        assert_eq!(
            CameraError::from_dom_name("NotFoundError", "no device").kind,
            CameraErrorKind::NotFound
        );
        assert_eq!(
            CameraError::from_dom_name("NotReadableError", "in use").kind,
            CameraErrorKind::Busy
        );
        assert_eq!(
            CameraError::from_dom_name("TypeError", "library missing").kind,
            CameraErrorKind::Other
        );
    }

    #[test]
    fn permission_hint_depends_on_page_security() {
        let denied = CameraError::new(CameraErrorKind::PermissionDenied, "denied");

        let secure = CameraFault::classify(&denied, &PageContext::secure());
        assert_eq!(secure.hint(), PERMISSION_HINT);

        let fault = CameraFault::classify(&denied, &insecure());
        assert_eq!(
            fault,
            CameraFault::PermissionDenied {
                insecure_context: true
            }
        );
        assert_eq!(fault.hint(), INSECURE_PERMISSION_HINT);
    }

    #[test]
    fn unclassified_failure_on_insecure_page_is_insecure_context() {
        let err = CameraError::other("getUserMedia is undefined");
        assert_eq!(
            CameraFault::classify(&err, &insecure()),
            CameraFault::InsecureContext
        );
        assert_eq!(
            CameraFault::classify(&err, &PageContext::secure()),
            CameraFault::Unavailable("getUserMedia is undefined".into())
        );
    }

    #[test]
    fn device_faults_keep_their_kind_on_insecure_pages() {
        let busy = CameraError::new(CameraErrorKind::Busy, "held");
        let fault = CameraFault::classify(&busy, &insecure());
        assert_eq!(fault, CameraFault::Busy);
        assert_eq!(fault.message(), "Camera already in use");
        assert_eq!(fault.hint(), MANUAL_ENTRY_HINT);
    }
}
