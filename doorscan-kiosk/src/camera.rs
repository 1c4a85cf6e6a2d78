use async_trait::async_trait;
use doorscan_core::{
    Camera, CameraError, CaptureSettings, DecodeEvent, DecodedFrame, FrameSender,
};
use parking_lot::Mutex;
use tracing::{debug, info};

/// A USB keyboard-wedge QR reader: each scanned code arrives as one line of
/// text on stdin.
///
/// The kiosk owns the stdin reader and hands code lines to [`feed`]; the
/// camera only forwards them while the session has it started.
///
/// [`feed`]: StdinCamera::feed
#[derive(Debug, Default)]
pub struct StdinCamera {
    frames: Mutex<Option<FrameSender>>,
}

impl StdinCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_streaming(&self) -> bool {
        self.frames.lock().is_some()
    }

    /// Forwards one scanned line. Returns `false` when the camera is stopped
    /// or the session stopped listening.
    pub async fn feed(&self, line: &str) -> bool {
        let text = line.trim();
        if text.is_empty() {
            return false;
        }
        let Some(frames) = self.frames.lock().clone() else {
            debug!(target: "doorscan::kiosk", "scan ignored, reader stopped");
            return false;
        };
        frames
            .send(DecodeEvent::Decoded(DecodedFrame::now(text)))
            .await
            .is_ok()
    }
}

#[async_trait]
impl Camera for StdinCamera {
    async fn start(
        &self,
        settings: &CaptureSettings,
        frames: FrameSender,
    ) -> Result<(), CameraError> {
        let mut slot = self.frames.lock();
        if slot.as_ref().is_some_and(|existing| !existing.is_closed()) {
            return Err(CameraError::from_dom_name(
                "NotReadableError",
                "reader already streaming to another session",
            ));
        }
        *slot = Some(frames);
        info!(target: "doorscan::kiosk", fps = settings.fps, "reader listening");
        Ok(())
    }

    async fn stop(&self) -> Result<(), CameraError> {
        if self.frames.lock().take().is_some() {
            info!(target: "doorscan::kiosk", "reader stopped");
        }
        Ok(())
    }
}
