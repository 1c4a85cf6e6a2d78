//! Camera capability contract.
//!
//! The scanner never decodes images itself. A [`Camera`] implementation owns
//! frame capture and QR decoding and pushes [`DecodeEvent`]s into the
//! [`FrameSender`] it receives on start.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::{Host, Url};

use crate::constants::{ASPECT_RATIO, CAPTURE_BOX, FACING_MODE, SCAN_FRAME_RATE};
use crate::error::CameraError;

/// Channel half handed to the camera on start.
pub type FrameSender = mpsc::Sender<DecodeEvent>;

/// One successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Decoded payload.
    pub text: String,
    /// When the decode happened.
    pub timestamp: Instant,
}

impl DecodedFrame {
    /// Frame stamped with the current (tokio) instant.
    pub fn now(text: impl Into<String>) -> Self {
        Self::at(text, Instant::now())
    }

    /// Frame with an explicit timestamp.
    pub fn at(text: impl Into<String>, timestamp: Instant) -> Self {
        Self {
            text: text.into(),
            timestamp,
        }
    }
}

/// Output of the decoding capability for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A code was read.
    Decoded(DecodedFrame),
    /// Transient per-frame failure, usually "no code in view".
    Miss(String),
}

impl DecodeEvent {
    /// Whether this miss is the routine "no code in this frame" report that
    /// decoders emit many times per second.
    pub fn is_routine_miss(&self) -> bool {
        matches!(self, Self::Miss(detail) if detail.contains("NotFoundException"))
    }
}

/// Capture parameters passed to the camera on start.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    /// Decode attempts per second.
    pub fps: u32,
    /// Scan region in pixels.
    pub capture_box: (u32, u32),
    /// Requested video aspect ratio.
    pub aspect_ratio: f32,
    /// Preferred camera, e.g. `environment`.
    pub facing_mode: &'static str,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            fps: SCAN_FRAME_RATE,
            capture_box: CAPTURE_BOX,
            aspect_ratio: ASPECT_RATIO,
            facing_mode: FACING_MODE,
        }
    }
}

/// Frame capture and decoding capability.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Starts capture. Resolves once the camera is streaming or has failed.
    async fn start(
        &self,
        settings: &CaptureSettings,
        frames: FrameSender,
    ) -> Result<(), CameraError>;

    /// Stops capture. Resolves on the device's stop acknowledgement.
    async fn stop(&self) -> Result<(), CameraError>;
}

/// Security of the page (or host) the scanner runs in.
///
/// Browsers only expose cameras to secure contexts: https origins and
/// loopback hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    origin: Option<Url>,
}

impl PageContext {
    /// Context without an origin, treated as secure (native hosts).
    pub fn secure() -> Self {
        Self { origin: None }
    }

    /// Context for a page served from `origin`.
    pub fn from_origin(origin: Url) -> Self {
        Self {
            origin: Some(origin),
        }
    }

    /// Page origin, if any.
    pub fn origin(&self) -> Option<&Url> {
        self.origin.as_ref()
    }

    /// Https origins, loopback hosts and origin-less hosts are secure.
    pub fn is_secure(&self) -> bool {
        let Some(origin) = &self.origin else {
            return true;
        };
        if origin.scheme() == "https" {
            return true;
        }
        match origin.host() {
            Some(Host::Domain(domain)) => {
                domain.eq_ignore_ascii_case("localhost")
                    || domain.to_ascii_lowercase().ends_with(".localhost")
            }
            Some(Host::Ipv4(addr)) => addr.is_loopback(),
            Some(Host::Ipv6(addr)) => addr.is_loopback(),
            None => false,
        }
    }
}

impl Default for PageContext {
    fn default() -> Self {
        Self::secure()
    }
}
