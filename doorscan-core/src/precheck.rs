//! Optional remote approval of a decoded code before it is committed.
//!
//! The gate fails open: if the authority cannot be reached or answers with
//! something unparseable, the code is accepted and a warning is logged.
//! Scanning at the door must never stall on network trouble.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::PrecheckError;
use crate::options::ScannerOptions;

/// Why the authority refused a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The guest already checked in for this event.
    Already,
    /// The code does not belong to any guest.
    NotFound,
    /// No event is currently open for check-in.
    NoEvent,
    /// Any other reason string (possibly empty).
    Other(String),
}

impl RejectReason {
    /// Reason from the response's `reason` string.
    pub fn from_wire(reason: Option<&str>) -> Self {
        match reason {
            Some("already") => Self::Already,
            Some("not_found") => Self::NotFound,
            Some("no_event") => Self::NoEvent,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }

    /// Warning shown to the operator.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Already => "Already admitted",
            Self::NotFound => "Invalid code",
            Self::NoEvent => "No active event",
            Self::Other(_) => "Cannot verify",
        }
    }

    /// Flat tag for this reason.
    pub fn reason(&self) -> PrecheckReason {
        match self {
            Self::Already => PrecheckReason::Already,
            Self::NotFound => PrecheckReason::NotFound,
            Self::NoEvent => PrecheckReason::NoEvent,
            Self::Other(_) => PrecheckReason::Other,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Already => f.write_str("already"),
            Self::NotFound => f.write_str("not_found"),
            Self::NoEvent => f.write_str("no_event"),
            Self::Other(raw) if raw.is_empty() => f.write_str("other"),
            Self::Other(raw) => write!(f, "other({raw})"),
        }
    }
}

/// Flat reason tag; `None` only ever accompanies an accepted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecheckReason {
    /// Guest already admitted.
    Already,
    /// Unknown code.
    NotFound,
    /// No open event.
    NoEvent,
    /// Any other refusal.
    Other,
    /// Accepted.
    None,
}

/// Outcome of one precheck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrecheckResult {
    /// The code may enter.
    Accepted,
    /// The code was refused.
    Rejected(RejectReason),
}

impl PrecheckResult {
    /// Whether the code may enter.
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Reason tag, `None` when accepted.
    pub fn reason(&self) -> PrecheckReason {
        match self {
            Self::Accepted => PrecheckReason::None,
            Self::Rejected(reason) => reason.reason(),
        }
    }
}

/// Wire response: `{ "ok": bool, "reason"?: string }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrecheckResponse {
    /// Whether the code may enter.
    pub ok: bool,
    /// Refusal reason, e.g. `already`.
    #[serde(default)]
    pub reason: Option<String>,
}

impl PrecheckResponse {
    /// `{"ok": true}`.
    pub fn accepted() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    /// `{"ok": false, "reason": reason}`.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }

    /// Interprets the response.
    pub fn into_result(self) -> PrecheckResult {
        if self.ok {
            PrecheckResult::Accepted
        } else {
            PrecheckResult::Rejected(RejectReason::from_wire(self.reason.as_deref()))
        }
    }
}

/// Remote authority that approves or rejects codes.
#[async_trait]
pub trait PrecheckAuthority: Send + Sync + fmt::Debug {
    /// Asks whether `code` may enter.
    async fn check(&self, code: &str) -> Result<PrecheckResponse, PrecheckError>;
}

/// JSON-over-HTTP precheck authority.
#[derive(Clone, Debug)]
pub struct HttpPrecheck {
    client: Client,
    url: Url,
    method: Method,
    payload_key: String,
    auth_token: Option<String>,
}

impl HttpPrecheck {
    /// Authority posting `{payload_key: code}` to `url` with `method`.
    pub fn new(
        url: Url,
        method: &str,
        payload_key: impl Into<String>,
    ) -> Result<Self, PrecheckError> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| PrecheckError::InvalidMethod(method.to_string()))?;
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            url,
            method,
            payload_key: payload_key.into(),
            auth_token: None,
        })
    }

    /// Builds the authority described by `options`, if the precheck applies.
    pub fn from_options(options: &ScannerOptions) -> Result<Option<Self>, PrecheckError> {
        if !options.precheck_enabled() {
            return Ok(None);
        }
        let Some(url) = options.precheck_url.clone() else {
            return Ok(None);
        };
        Self::new(url, &options.precheck_method, &options.precheck_payload_key).map(Some)
    }

    /// Bearer token sent with every request, standing in for session cookies.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Replaces the HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }
}

#[async_trait]
impl PrecheckAuthority for HttpPrecheck {
    async fn check(&self, code: &str) -> Result<PrecheckResponse, PrecheckError> {
        let mut body = serde_json::Map::new();
        body.insert(
            self.payload_key.clone(),
            serde_json::Value::String(code.to_string()),
        );

        let mut request = self
            .client
            .request(self.method.clone(), self.url.clone())
            .json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            debug!(target: "doorscan::precheck", %status, "precheck answered with non-success status");
        }

        serde_json::from_slice::<PrecheckResponse>(&bytes)
            .map_err(|err| PrecheckError::Malformed(err.to_string()))
    }
}

/// Applies the precheck policy around an optional authority.
#[derive(Clone, Debug, Default)]
pub struct PrecheckGate {
    authority: Option<Arc<dyn PrecheckAuthority>>,
}

impl PrecheckGate {
    /// Gate consulting `authority`.
    pub fn new(authority: Arc<dyn PrecheckAuthority>) -> Self {
        Self {
            authority: Some(authority),
        }
    }

    /// Gate that accepts everything without a request.
    pub fn disabled() -> Self {
        Self { authority: None }
    }

    /// Whether an authority is configured.
    pub fn is_enabled(&self) -> bool {
        self.authority.is_some()
    }

    /// Never fails: transport problems resolve to [`PrecheckResult::Accepted`].
    pub async fn check(&self, code: &str) -> PrecheckResult {
        let Some(authority) = &self.authority else {
            return PrecheckResult::Accepted;
        };

        match authority.check(code).await {
            Ok(response) => response.into_result(),
            Err(err) => {
                warn!(target: "doorscan::precheck", error = %err, "precheck unavailable, letting code through");
                PrecheckResult::Accepted
            }
        }
    }
}
