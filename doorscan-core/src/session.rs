//! The scan session: camera lifecycle plus the per-frame gating pipeline.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::camera::{Camera, CaptureSettings, DecodeEvent, DecodedFrame, PageContext};
use crate::capabilities::{
    FieldStore, FormSubmitter, Haptics, InMemoryFields, NoHaptics, NoTone, StatusSink, Tone,
};
use crate::constants::{FRAME_CHANNEL_CAPACITY, SUCCESS_DISPLAY, WARNING_DISPLAY};
use crate::duplicate::{DuplicateFilter, LastAccepted};
use crate::error::{
    CameraError, CameraFault, INSECURE_CONTEXT_HINT, LifecycleError, Result,
};
use crate::events::{ScanEvent, ScanEventBus};
use crate::feedback::FeedbackDispatcher;
use crate::lifecycle::{LifecycleEvent, SessionState};
use crate::options::ScannerOptions;
use crate::precheck::{HttpPrecheck, PrecheckAuthority, PrecheckGate, PrecheckResult, RejectReason};
use crate::status::{StatusUpdate, Toast};
use crate::submit::AutoSubmitController;

/// Invoked with every committed frame, after fields are populated.
pub type SuccessCallback = Arc<dyn Fn(&DecodedFrame) + Send + Sync>;

/// Result of a [`ScanSession::start`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The camera is streaming.
    Started,
    /// The session was already starting or active; nothing was done.
    AlreadyRunning,
    /// The camera failed; the session is in `Error`.
    Failed(CameraFault),
}

/// Result of a [`ScanSession::stop`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The camera acknowledged the stop.
    Stopped,
    /// The camera did not acknowledge cleanly; the session is idle anyway.
    StoppedWithError(CameraError),
    /// Nothing to stop.
    NotRunning,
}

/// What happened to one decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The session was not active when the frame arrived.
    Inactive,
    /// Repeat inside the duplicate window.
    Suppressed,
    /// Refused by the precheck.
    Rejected(RejectReason),
    /// The session stopped or restarted while the precheck was in flight.
    Discarded,
    /// Committed: feedback, fields and submission.
    Accepted,
}

struct Shared {
    state: SessionState,
    filter: DuplicateFilter,
    pump: Option<CancellationToken>,
    /// Bumped each time the camera comes up; frames belong to one run.
    run: u64,
}

struct Inner {
    options: ScannerOptions,
    camera: Arc<dyn Camera>,
    page: PageContext,
    feedback: FeedbackDispatcher,
    gate: PrecheckGate,
    submit: AutoSubmitController,
    on_success: Option<SuccessCallback>,
    events: ScanEventBus,
    shared: Mutex<Shared>,
    /// Serialises camera start and stop.
    lifecycle: tokio::sync::Mutex<()>,
    /// Serialises whole restarts.
    restart: tokio::sync::Mutex<()>,
}

/// Owned handle to one scanner. Cloning shares the session.
#[derive(Clone)]
pub struct ScanSession {
    inner: Arc<Inner>,
}

impl fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.inner.shared.lock();
        f.debug_struct("ScanSession")
            .field("state", &shared.state)
            .field("last_accepted", &shared.filter.last())
            .field("options", &self.inner.options)
            .field("page", &self.inner.page)
            .field("precheck", &self.inner.gate.is_enabled())
            .finish_non_exhaustive()
    }
}

impl ScanSession {
    /// Starts building a session around the required capabilities.
    pub fn builder(
        options: ScannerOptions,
        camera: Arc<dyn Camera>,
        status: Arc<dyn StatusSink>,
    ) -> ScanSessionBuilder {
        ScanSessionBuilder::new(options, camera, status)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.shared.lock().state.clone()
    }

    /// Code currently holding the duplicate window.
    pub fn last_accepted(&self) -> Option<LastAccepted> {
        self.inner.shared.lock().filter.last().cloned()
    }

    /// Options the session was built with.
    pub fn options(&self) -> &ScannerOptions {
        &self.inner.options
    }

    /// Page the scanner runs in.
    pub fn page(&self) -> &PageContext {
        &self.inner.page
    }

    /// Receiver for state changes and scan outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.inner.events.subscribe()
    }

    /// First start after the host UI appears: syncs any pre-filled manual
    /// entry into the result field, then starts the camera.
    pub async fn mount(&self) -> StartOutcome {
        if let Some(value) = self.inner.submit.mirror_manual_entry() {
            debug!(target: "doorscan::session", value = %value, "manual entry pre-filled");
        }
        self.start().await
    }

    /// Operator typed a code by hand.
    pub fn enter_manually(&self, value: &str) -> Option<String> {
        self.inner.submit.enter_manually(value)
    }

    /// Submits the configured form with whatever the fields hold now.
    pub async fn submit_now(&self) -> Result<String> {
        Ok(self.inner.submit.submit_now().await?)
    }

    /// Starts the camera. Ignored while starting or active.
    pub async fn start(&self) -> StartOutcome {
        if matches!(self.state(), SessionState::Starting | SessionState::Active) {
            warn!(target: "doorscan::session", error = %LifecycleError::StartAlreadyInProgress, "ignoring start");
            return StartOutcome::AlreadyRunning;
        }

        let _lifecycle = self.inner.lifecycle.lock().await;
        if let Err(err) = self.apply(LifecycleEvent::StartRequested) {
            warn!(target: "doorscan::session", error = %LifecycleError::StartAlreadyInProgress, detail = %err, "ignoring start");
            return StartOutcome::AlreadyRunning;
        }

        self.inner.feedback.set_status(&StatusUpdate::loading());
        if !self.inner.page.is_secure() {
            warn!(target: "doorscan::session", origin = ?self.inner.page.origin(), "scanner page is not a secure context");
            self.inner.feedback.toast(Toast {
                detail: Some(INSECURE_CONTEXT_HINT.to_string()),
                ..Toast::warning(CameraFault::InsecureContext.message(), WARNING_DISPLAY)
            });
        }

        let (frames_tx, frames_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        match self
            .inner
            .camera
            .start(&CaptureSettings::default(), frames_tx)
            .await
        {
            Ok(()) => {
                let _ = self.apply(LifecycleEvent::CameraReady);
                let token = CancellationToken::new();
                {
                    let mut shared = self.inner.shared.lock();
                    shared.run += 1;
                    shared.pump = Some(token.clone());
                }
                self.spawn_pump(frames_rx, token);

                self.inner.feedback.set_status(&StatusUpdate::ready());
                info!(target: "doorscan::session", "scanner started");
                StartOutcome::Started
            }
            Err(err) => {
                let fault = CameraFault::classify(&err, &self.inner.page);
                error!(target: "doorscan::session", error = %err, fault = %fault, "camera failed to start");
                let _ = self.apply(LifecycleEvent::CameraFailed(fault.clone()));

                self.inner
                    .feedback
                    .set_status(&StatusUpdate::error(fault.message()));
                self.inner
                    .feedback
                    .show_error_panel(fault.message(), fault.hint());
                StartOutcome::Failed(fault)
            }
        }
    }

    /// Best-effort stop. Always ends `Idle` if the session was running.
    pub async fn stop(&self) -> StopOutcome {
        if matches!(self.state(), SessionState::Idle | SessionState::Error(_)) {
            warn!(target: "doorscan::session", error = %LifecycleError::StopWhileIdle, "ignoring stop");
            return StopOutcome::NotRunning;
        }

        let _lifecycle = self.inner.lifecycle.lock().await;
        if let Err(err) = self.apply(LifecycleEvent::StopRequested) {
            // A concurrent start failed while we waited for the lock.
            warn!(target: "doorscan::session", error = %LifecycleError::StopWhileIdle, detail = %err, "ignoring stop");
            return StopOutcome::NotRunning;
        }

        if let Some(pump) = self.inner.shared.lock().pump.take() {
            pump.cancel();
        }

        let acknowledged = self.inner.camera.stop().await;
        let _ = self.apply(LifecycleEvent::StopAcknowledged);
        self.inner.feedback.set_status(&StatusUpdate::stopped());

        match acknowledged {
            Ok(()) => {
                info!(target: "doorscan::session", "scanner stopped");
                StopOutcome::Stopped
            }
            Err(err) => {
                error!(target: "doorscan::session", error = %err, "camera did not stop cleanly");
                StopOutcome::StoppedWithError(err)
            }
        }
    }

    /// Stop, then start. Concurrent restarts queue behind each other.
    pub async fn restart(&self) -> StartOutcome {
        let _restart = self.inner.restart.lock().await;
        if !matches!(self.state(), SessionState::Idle | SessionState::Error(_)) {
            self.stop().await;
        }
        self.start().await
    }

    /// Routes one decoded frame through duplicate filter, precheck and commit.
    pub async fn handle_frame(&self, frame: DecodedFrame) -> ScanOutcome {
        let code = frame.text.as_str();
        let run = {
            let mut shared = self.inner.shared.lock();
            if !shared.state.is_active() {
                debug!(target: "doorscan::session", state = ?shared.state, "frame ignored, scanner not active");
                return ScanOutcome::Inactive;
            }
            if shared
                .filter
                .admit(code, frame.timestamp, self.inner.options.allow_duplicates)
            {
                drop(shared);
                debug!(target: "doorscan::session", code, "duplicate code ignored");
                self.inner.events.publish(ScanEvent::Suppressed {
                    code: code.to_string(),
                });
                return ScanOutcome::Suppressed;
            }
            shared.run
        };

        info!(target: "doorscan::session", code, "code scanned");

        if self.inner.gate.is_enabled() {
            let verdict = self.inner.gate.check(code).await;
            if !self.is_current_run(run) {
                debug!(target: "doorscan::session", code, "scanner stopped or restarted during precheck, dropping frame");
                return ScanOutcome::Discarded;
            }
            if let PrecheckResult::Rejected(reason) = verdict {
                info!(target: "doorscan::session", code, %reason, "code refused by precheck");
                self.inner.feedback.warn(reason.message());
                self.inner.events.publish(ScanEvent::Rejected {
                    code: code.to_string(),
                    reason: reason.clone(),
                });
                return ScanOutcome::Rejected(reason);
            }
        }

        self.commit(&frame);
        ScanOutcome::Accepted
    }

    fn is_current_run(&self, run: u64) -> bool {
        let shared = self.inner.shared.lock();
        shared.state.is_active() && shared.run == run
    }

    fn commit(&self, frame: &DecodedFrame) {
        let code = frame.text.as_str();
        self.inner.feedback.fire(code);
        self.inner.submit.populate(code);
        if let Some(on_success) = &self.inner.on_success {
            on_success(frame);
        }
        self.inner.submit.schedule_submit();
        self.schedule_ready_status();
        self.inner.events.publish(ScanEvent::Accepted {
            code: code.to_string(),
        });
    }

    fn handle_miss(&self, event: &DecodeEvent) {
        if let DecodeEvent::Miss(detail) = event {
            if !event.is_routine_miss() {
                debug!(target: "doorscan::session", detail = %detail, "decode failure");
            }
        }
    }

    /// Puts the badge back to "active" once the success window is over, unless
    /// the scanner was stopped in the meantime.
    fn schedule_ready_status(&self) {
        let session = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(SUCCESS_DISPLAY).await;
            if let Some(inner) = session.upgrade() {
                if inner.shared.lock().state.is_active() {
                    inner.feedback.set_status(&StatusUpdate::ready());
                }
            }
        });
    }

    fn spawn_pump(&self, mut frames: mpsc::Receiver<DecodeEvent>, token: CancellationToken) {
        let session: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = frames.recv() => {
                        let Some(event) = event else { break };
                        let Some(inner) = session.upgrade() else { break };
                        let live = ScanSession { inner };
                        match event {
                            DecodeEvent::Decoded(frame) => {
                                live.handle_frame(frame).await;
                            }
                            miss @ DecodeEvent::Miss(_) => live.handle_miss(&miss),
                        }
                    }
                }
            }
            debug!(target: "doorscan::session", "frame pump finished");
        });
    }

    fn apply(&self, event: LifecycleEvent) -> std::result::Result<SessionState, LifecycleError> {
        let (from, to) = {
            let mut shared = self.inner.shared.lock();
            let next = shared.state.on(&event)?;
            let from = std::mem::replace(&mut shared.state, next.clone());
            (from, next)
        };
        debug!(target: "doorscan::session", from = ?from, to = ?to, "state changed");
        self.inner.events.publish(ScanEvent::StateChanged {
            from,
            to: to.clone(),
        });
        Ok(to)
    }
}

/// Assembles a [`ScanSession`] from its capabilities.
pub struct ScanSessionBuilder {
    options: ScannerOptions,
    camera: Arc<dyn Camera>,
    status: Arc<dyn StatusSink>,
    tone: Arc<dyn Tone>,
    haptics: Arc<dyn Haptics>,
    fields: Option<Arc<dyn FieldStore>>,
    submitter: Option<Arc<dyn FormSubmitter>>,
    precheck: Option<Arc<dyn PrecheckAuthority>>,
    page: PageContext,
    on_success: Option<SuccessCallback>,
}

impl fmt::Debug for ScanSessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSessionBuilder")
            .field("options", &self.options)
            .field("page", &self.page)
            .field("precheck", &self.precheck)
            .field("has_on_success", &self.on_success.is_some())
            .finish_non_exhaustive()
    }
}

impl ScanSessionBuilder {
    /// Builder with no-op devices and a secure page.
    pub fn new(
        options: ScannerOptions,
        camera: Arc<dyn Camera>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            options,
            camera,
            status,
            tone: Arc::new(NoTone),
            haptics: Arc::new(NoHaptics),
            fields: None,
            submitter: None,
            precheck: None,
            page: PageContext::secure(),
            on_success: None,
        }
    }

    /// Confirmation beep output.
    pub fn tone(mut self, tone: Arc<dyn Tone>) -> Self {
        self.tone = tone;
        self
    }

    /// Vibration output.
    pub fn haptics(mut self, haptics: Arc<dyn Haptics>) -> Self {
        self.haptics = haptics;
        self
    }

    /// Defaults to an in-memory store holding the result and manual fields.
    pub fn fields(mut self, fields: Arc<dyn FieldStore>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Form submitter used for auto-submit and manual submission.
    pub fn submitter(mut self, submitter: Arc<dyn FormSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// Overrides the HTTP authority otherwise built from the options.
    pub fn precheck(mut self, authority: Arc<dyn PrecheckAuthority>) -> Self {
        self.precheck = Some(authority);
        self
    }

    /// Page context for the secure-context checks.
    pub fn page(mut self, page: PageContext) -> Self {
        self.page = page;
        self
    }

    /// Called with every accepted frame.
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DecodedFrame) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Fails only when the precheck options describe an unusable request.
    pub fn build(self) -> Result<ScanSession> {
        let gate = if self.options.precheck_enabled() {
            let authority = match self.precheck {
                Some(authority) => Some(authority),
                None => HttpPrecheck::from_options(&self.options)?
                    .map(|http| Arc::new(http) as Arc<dyn PrecheckAuthority>),
            };
            authority.map(PrecheckGate::new).unwrap_or_default()
        } else {
            if self.precheck.is_some() {
                debug!(target: "doorscan::session", "precheck authority supplied but precheck is not enabled by the options");
            }
            PrecheckGate::disabled()
        };

        let fields = self.fields.unwrap_or_else(|| {
            Arc::new(InMemoryFields::with_fields([
                self.options.result_field_id.clone(),
                self.options.manual_field_id.clone(),
            ]))
        });

        let feedback = FeedbackDispatcher::new(self.tone, self.haptics, self.status);
        let submit = AutoSubmitController::new(&self.options, fields, self.submitter);

        Ok(ScanSession {
            inner: Arc::new(Inner {
                options: self.options,
                camera: self.camera,
                page: self.page,
                feedback,
                gate,
                submit,
                on_success: self.on_success,
                events: ScanEventBus::default(),
                shared: Mutex::new(Shared {
                    state: SessionState::Idle,
                    filter: DuplicateFilter::default(),
                    pump: None,
                    run: 0,
                }),
                lifecycle: tokio::sync::Mutex::new(()),
                restart: tokio::sync::Mutex::new(()),
            }),
        })
    }
}
