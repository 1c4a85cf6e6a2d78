use std::sync::Arc;

use anyhow::Context;
use doorscan_core::{
    HttpPrecheck, NoHaptics, ScanSession, StartOutcome, StatusSink, StopOutcome,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::camera::StdinCamera;
use crate::commands::{DEFAULT_COMMAND_PREFIX, Input, KioskCommand};
use crate::config::KioskConfig;
use crate::forms::HttpFormSubmitter;
use crate::presenter::{BellTone, TerminalPresenter};

/// Whether the input loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The running kiosk: one scan session fed by the terminal.
#[derive(Debug, Clone)]
pub struct Kiosk {
    session: ScanSession,
    camera: Arc<StdinCamera>,
    prefix: String,
}

impl Kiosk {
    pub fn new(session: ScanSession, camera: Arc<StdinCamera>) -> Self {
        Self {
            session,
            camera,
            prefix: DEFAULT_COMMAND_PREFIX.to_string(),
        }
    }

    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Production wiring: stdin reader, stdout presenter, terminal bell.
    pub fn from_config(config: &KioskConfig) -> anyhow::Result<Self> {
        Self::assemble(
            config,
            Arc::new(StdinCamera::new()),
            Arc::new(TerminalPresenter::stdout()),
        )
    }

    pub fn assemble(
        config: &KioskConfig,
        camera: Arc<StdinCamera>,
        status: Arc<dyn StatusSink>,
    ) -> anyhow::Result<Self> {
        let mut submitter =
            HttpFormSubmitter::new(&config.forms).context("invalid [forms] configuration")?;
        if let Some(token) = &config.precheck_token {
            submitter = submitter.with_auth_token(token.clone());
        }

        let mut builder = ScanSession::builder(config.scanner.clone(), camera.clone(), status)
            .tone(Arc::new(BellTone))
            .haptics(Arc::new(NoHaptics))
            .submitter(Arc::new(submitter))
            .page(config.page())
            .on_success(|frame| {
                info!(target: "doorscan::kiosk", code = %frame.text, "guest checked in");
            });

        let precheck = HttpPrecheck::from_options(&config.scanner)
            .context("invalid precheck configuration")?;
        if let Some(mut precheck) = precheck {
            if let Some(token) = &config.precheck_token {
                precheck = precheck.with_auth_token(token.clone());
            }
            info!(target: "doorscan::kiosk", url = %precheck.url(), method = %precheck.method(), "precheck enabled");
            builder = builder.precheck(Arc::new(precheck));
        }

        let session = builder.build().context("failed to build scan session")?;
        Ok(Self::new(session, camera).with_command_prefix(config.command_prefix.clone()))
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// Starts the scanner, then handles terminal lines until `/quit`, end of
    /// input or `shutdown`. The scanner is stopped on the way out.
    pub async fn run<R>(&self, input: R, shutdown: CancellationToken) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        log_start(self.session.mount().await);

        let mut lines = input.lines();
        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(target: "doorscan::kiosk", "shutdown requested");
                    break;
                }
                line = lines.next_line() => line.context("failed to read terminal input")?,
            };
            let Some(line) = line else {
                info!(target: "doorscan::kiosk", "input closed");
                break;
            };
            if self.handle_line(&line).await == Flow::Quit {
                break;
            }
        }

        log_stop(self.session.stop().await);
        Ok(())
    }

    pub async fn handle_line(&self, line: &str) -> Flow {
        match Input::parse(line, &self.prefix) {
            Ok(None) => Flow::Continue,
            Ok(Some(Input::Scan(code))) => {
                if !self.camera.feed(&code).await {
                    warn!(target: "doorscan::kiosk", code = %code, "scanner is stopped, type {}start to resume", self.prefix);
                }
                Flow::Continue
            }
            Ok(Some(Input::Command(command))) => self.execute(command).await,
            Err(err) => {
                warn!(target: "doorscan::kiosk", error = %err, "ignoring input");
                Flow::Continue
            }
        }
    }

    pub async fn execute(&self, command: KioskCommand) -> Flow {
        match command {
            KioskCommand::Start => log_start(self.session.start().await),
            KioskCommand::Stop => log_stop(self.session.stop().await),
            KioskCommand::Restart => log_start(self.session.restart().await),
            KioskCommand::Manual(code) => self.manual_entry(&code).await,
            KioskCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Records a hand-typed code and, when a form is configured, submits it.
    async fn manual_entry(&self, code: &str) {
        let Some(value) = self.session.enter_manually(code) else {
            warn!(target: "doorscan::kiosk", "manual entry not recorded");
            return;
        };
        info!(target: "doorscan::kiosk", code = %value, "manual entry recorded");

        if self.session.options().form_id.is_none() {
            return;
        }
        match self.session.submit_now().await {
            Ok(form_id) => {
                info!(target: "doorscan::kiosk", code = %value, form = %form_id, "manual check-in submitted");
            }
            Err(err) => {
                warn!(target: "doorscan::kiosk", code = %value, error = %err, "manual check-in failed");
            }
        }
    }
}

fn log_start(outcome: StartOutcome) {
    match outcome {
        StartOutcome::Started => {}
        StartOutcome::AlreadyRunning => {
            info!(target: "doorscan::kiosk", "scanner already running");
        }
        StartOutcome::Failed(fault) => {
            warn!(target: "doorscan::kiosk", %fault, "scanner unavailable, enter codes with the manual command");
        }
    }
}

fn log_stop(outcome: StopOutcome) {
    match outcome {
        StopOutcome::Stopped | StopOutcome::NotRunning => {}
        StopOutcome::StoppedWithError(err) => {
            warn!(target: "doorscan::kiosk", error = %err, "reader did not stop cleanly");
        }
    }
}
