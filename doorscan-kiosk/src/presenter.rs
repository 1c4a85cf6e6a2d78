//! Terminal rendering of the scanner's status badge, toasts and error panel.

use std::fmt;
use std::io::{self, Write};

use doorscan_core::{
    CapabilityError, Severity, StatusSink, StatusUpdate, Toast, ToastId, ToastKind, Tone,
    ToneSpec,
};
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

/// Writes one line per status change, toast and error panel.
pub struct TerminalPresenter<W> {
    out: Mutex<W>,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Direct access to the underlying writer.
    pub fn writer(&self) -> MutexGuard<'_, W> {
        self.out.lock()
    }

    fn line(&self, capability: &'static str, text: fmt::Arguments<'_>) -> Result<(), CapabilityError> {
        let mut out = self.out.lock();
        writeln!(out, "{text}")
            .and_then(|()| out.flush())
            .map_err(|err| CapabilityError::new(capability, err.to_string()))
    }
}

impl<W> fmt::Debug for TerminalPresenter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalPresenter").finish_non_exhaustive()
    }
}

impl<W: Write + Send> StatusSink for TerminalPresenter<W> {
    fn update_status(&self, update: &StatusUpdate) -> Result<(), CapabilityError> {
        self.line(
            "status",
            format_args!("{} {}", update.severity.icon(), update.message),
        )
    }

    fn show_toast(&self, toast: &Toast) -> Result<(), CapabilityError> {
        let tag = match toast.kind {
            ToastKind::Success => "OK",
            ToastKind::Warning => "!!",
        };
        match &toast.detail {
            Some(detail) => self.line(
                "toast",
                format_args!("[{tag}] {}: {detail}", toast.title),
            ),
            None => self.line("toast", format_args!("[{tag}] {}", toast.title)),
        }
    }

    fn dismiss_toast(&self, id: ToastId) -> Result<(), CapabilityError> {
        debug!(target: "doorscan::kiosk", toast = ?id, "toast expired");
        Ok(())
    }

    fn show_error_panel(&self, message: &str, hint: &str) -> Result<(), CapabilityError> {
        let icon = Severity::Error.icon();
        self.line("error_panel", format_args!("{icon} {message}\n    {hint}"))
    }
}

/// Confirmation "tone" for terminals: the ASCII bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellTone;

impl Tone for BellTone {
    fn play(&self, spec: &ToneSpec) -> Result<(), CapabilityError> {
        debug!(target: "doorscan::kiosk", frequency_hz = spec.frequency_hz, "bell");
        let mut out = io::stdout().lock();
        out.write_all(b"\x07")
            .and_then(|()| out.flush())
            .map_err(|err| CapabilityError::new("tone", err.to_string()))
    }
}
