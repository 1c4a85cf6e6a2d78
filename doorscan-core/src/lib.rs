//! Scan-session lifecycle and gating pipeline for QR check-in.
//!
//! A [`Camera`] capability pushes decoded text into a [`ScanSession`]. The
//! session drops repeats of the previous code inside a two second window,
//! optionally asks a remote authority whether the code may enter, and on
//! acceptance fires feedback, fills the result fields and schedules the
//! check-in form submission.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use doorscan_core::{Camera, ScanSession, ScannerOptions, StatusSink};
//! # async fn run(camera: Arc<dyn Camera>, status: Arc<dyn StatusSink>) -> doorscan_core::Result<()> {
//! let session = ScanSession::builder(
//!     ScannerOptions::auto_submit_form("checkin", "qr-result"),
//!     camera,
//!     status,
//! )
//! .build()?;
//! session.mount().await;
//! # Ok(())
//! # }
//! ```

pub mod camera;
pub mod capabilities;
pub mod constants;
pub mod duplicate;
pub mod error;
pub mod events;
pub mod feedback;
pub mod lifecycle;
pub mod options;
pub mod precheck;
pub mod session;
pub mod status;
pub mod submit;

pub use camera::{Camera, CaptureSettings, DecodeEvent, DecodedFrame, FrameSender, PageContext};
pub use capabilities::{
    FieldStore, FormSubmission, FormSubmitter, Haptics, InMemoryFields, NoHaptics, NoTone,
    StatusSink, Tone, ToneSpec,
};
pub use duplicate::{DuplicateFilter, LastAccepted};
pub use error::{
    CameraError, CameraErrorKind, CameraFault, CapabilityError, LifecycleError, PrecheckError,
    Result, ScanError, SubmitError,
};
pub use events::ScanEvent;
pub use feedback::FeedbackDispatcher;
pub use lifecycle::{LifecycleEvent, SessionState};
pub use options::ScannerOptions;
pub use precheck::{
    HttpPrecheck, PrecheckAuthority, PrecheckGate, PrecheckReason, PrecheckResponse,
    PrecheckResult, RejectReason,
};
pub use session::{
    ScanOutcome, ScanSession, ScanSessionBuilder, StartOutcome, StopOutcome, SuccessCallback,
};
pub use status::{Severity, StatusUpdate, Toast, ToastId, ToastKind};
pub use submit::AutoSubmitController;
