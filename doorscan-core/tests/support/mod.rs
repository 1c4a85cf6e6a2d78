#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use doorscan_core::{
    Camera, CameraError, CapabilityError, CaptureSettings, DecodeEvent, DecodedFrame,
    FieldStore, FormSubmission, FormSubmitter, FrameSender, Haptics, InMemoryFields,
    PageContext, PrecheckAuthority, PrecheckError, PrecheckResponse, ScanSession,
    ScannerOptions, Severity, StatusSink, StatusUpdate, SubmitError, Toast, ToastId, Tone,
    ToneSpec,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

pub const FORM_ID: &str = "checkin";

/// Records everything the session shows to the operator.
#[derive(Debug, Default)]
pub struct RecordingStatus {
    pub statuses: Mutex<Vec<StatusUpdate>>,
    pub toasts: Mutex<Vec<Toast>>,
    pub dismissed: Mutex<Vec<ToastId>>,
    pub panels: Mutex<Vec<(String, String)>>,
}

impl RecordingStatus {
    pub fn last_status(&self) -> Option<StatusUpdate> {
        self.statuses.lock().last().cloned()
    }

    pub fn status_messages(&self) -> Vec<String> {
        self.statuses
            .lock()
            .iter()
            .map(|status| status.message.clone())
            .collect()
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.statuses
            .lock()
            .iter()
            .filter(|status| status.severity == severity)
            .count()
    }

    pub fn toast_titles(&self) -> Vec<String> {
        self.toasts
            .lock()
            .iter()
            .map(|toast| toast.title.clone())
            .collect()
    }
}

impl StatusSink for RecordingStatus {
    fn update_status(&self, update: &StatusUpdate) -> Result<(), CapabilityError> {
        self.statuses.lock().push(update.clone());
        Ok(())
    }

    fn show_toast(&self, toast: &Toast) -> Result<(), CapabilityError> {
        self.toasts.lock().push(toast.clone());
        Ok(())
    }

    fn dismiss_toast(&self, id: ToastId) -> Result<(), CapabilityError> {
        self.dismissed.lock().push(id);
        Ok(())
    }

    fn show_error_panel(&self, message: &str, hint: &str) -> Result<(), CapabilityError> {
        self.panels
            .lock()
            .push((message.to_string(), hint.to_string()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CountingDevice {
    pub tones: AtomicUsize,
    pub pulses: AtomicUsize,
}

impl CountingDevice {
    pub fn tones(&self) -> usize {
        self.tones.load(Ordering::SeqCst)
    }

    pub fn pulses(&self) -> usize {
        self.pulses.load(Ordering::SeqCst)
    }
}

impl Tone for CountingDevice {
    fn play(&self, _spec: &ToneSpec) -> Result<(), CapabilityError> {
        self.tones.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Haptics for CountingDevice {
    fn is_supported(&self) -> bool {
        true
    }

    fn pulse(&self, _pattern: &[Duration]) -> Result<(), CapabilityError> {
        self.pulses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Camera double that hands frames to the session on demand.
#[derive(Debug, Default)]
pub struct FakeCamera {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    start_failure: Mutex<Option<CameraError>>,
    stop_failure: Mutex<Option<CameraError>>,
    /// When set, `start` waits for a notification before resolving.
    hold_start: Mutex<Option<Arc<Notify>>>,
    frames: Mutex<Option<FrameSender>>,
}

impl FakeCamera {
    pub fn failing_with(error: CameraError) -> Self {
        let camera = Self::default();
        *camera.start_failure.lock() = Some(error);
        camera
    }

    pub fn fail_next_start(&self, error: CameraError) {
        *self.start_failure.lock() = Some(error);
    }

    pub fn fail_next_stop(&self, error: CameraError) {
        *self.stop_failure.lock() = Some(error);
    }

    pub fn hold_start(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold_start.lock() = Some(Arc::clone(&notify));
        notify
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Pushes a decode through the channel the session gave us.
    pub async fn decode(&self, text: &str) {
        self.send(DecodeEvent::Decoded(DecodedFrame::now(text))).await;
    }

    pub async fn send(&self, event: DecodeEvent) {
        let sender = self.frames.lock().clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}

#[async_trait]
impl Camera for FakeCamera {
    async fn start(
        &self,
        _settings: &CaptureSettings,
        frames: FrameSender,
    ) -> Result<(), CameraError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let hold = self.hold_start.lock().take();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if let Some(err) = self.start_failure.lock().take() {
            return Err(err);
        }
        *self.frames.lock() = Some(frames);
        Ok(())
    }

    async fn stop(&self) -> Result<(), CameraError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.frames.lock().take();
        match self.stop_failure.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Precheck authority answering from a script; an empty script accepts.
#[derive(Debug, Default)]
pub struct ScriptedPrecheck {
    script: Mutex<VecDeque<Result<PrecheckResponse, PrecheckError>>>,
    pub codes: Mutex<Vec<String>>,
    /// When set, each check waits for a notification before answering.
    pub hold: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedPrecheck {
    pub fn answering<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Result<PrecheckResponse, PrecheckError>>,
    {
        Self {
            script: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.codes.lock().len()
    }
}

#[async_trait]
impl PrecheckAuthority for ScriptedPrecheck {
    async fn check(&self, code: &str) -> Result<PrecheckResponse, PrecheckError> {
        self.codes.lock().push(code.to_string());
        let hold = self.hold.lock().clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(PrecheckResponse::accepted()))
    }
}

#[derive(Debug, Default)]
pub struct RecordingForms {
    pub submitted: Mutex<Vec<FormSubmission>>,
}

impl RecordingForms {
    pub fn count(&self) -> usize {
        self.submitted.lock().len()
    }
}

#[async_trait]
impl FormSubmitter for RecordingForms {
    fn has_form(&self, form_id: &str) -> bool {
        form_id == FORM_ID
    }

    async fn submit(&self, submission: FormSubmission) -> Result<(), SubmitError> {
        self.submitted.lock().push(submission);
        Ok(())
    }
}

/// A session wired to recording doubles.
pub struct Harness {
    pub session: ScanSession,
    pub camera: Arc<FakeCamera>,
    pub status: Arc<RecordingStatus>,
    pub device: Arc<CountingDevice>,
    pub fields: Arc<InMemoryFields>,
    pub forms: Arc<RecordingForms>,
    pub precheck: Arc<ScriptedPrecheck>,
    pub accepted: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    pub fn new(options: ScannerOptions) -> Self {
        Self::with_parts(
            options,
            FakeCamera::default(),
            ScriptedPrecheck::default(),
            PageContext::secure(),
        )
    }

    /// Auto-submit to the check-in form, guarded by the scripted precheck.
    pub fn with_precheck(precheck: ScriptedPrecheck) -> Self {
        let options = ScannerOptions::auto_submit_form(FORM_ID, "qr-result")
            .with_precheck("https://door.example.com/staff/precheck".parse().unwrap());
        Self::with_parts(options, FakeCamera::default(), precheck, PageContext::secure())
    }

    pub fn with_parts(
        options: ScannerOptions,
        camera: FakeCamera,
        precheck: ScriptedPrecheck,
        page: PageContext,
    ) -> Self {
        let camera = Arc::new(camera);
        let status = Arc::new(RecordingStatus::default());
        let device = Arc::new(CountingDevice::default());
        let fields = Arc::new(InMemoryFields::with_fields(["qr-result", "qr-manual"]));
        let forms = Arc::new(RecordingForms::default());
        let precheck = Arc::new(precheck);
        let accepted = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&accepted);
        let session = ScanSession::builder(options, camera.clone(), status.clone())
            .tone(device.clone())
            .haptics(device.clone())
            .fields(fields.clone())
            .submitter(forms.clone())
            .precheck(precheck.clone())
            .page(page)
            .on_success(move |frame: &DecodedFrame| seen.lock().push(frame.text.clone()))
            .build()
            .expect("session builds");

        Self {
            session,
            camera,
            status,
            device,
            fields,
            forms,
            precheck,
            accepted,
        }
    }

    pub async fn started(options: ScannerOptions) -> Self {
        let harness = Self::new(options);
        harness.session.start().await;
        harness
    }

    pub fn result_field(&self) -> String {
        self.fields.value("qr-result").unwrap_or_default()
    }

    pub fn manual_field(&self) -> String {
        self.fields.value("qr-manual").unwrap_or_default()
    }

    pub fn accepted(&self) -> Vec<String> {
        self.accepted.lock().clone()
    }
}

/// Lets spawned tasks run without moving the paused clock much.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
