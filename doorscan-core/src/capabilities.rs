//! Injected device and presentation capabilities.
//!
//! Every call here is best-effort: the scanner logs failures and carries on.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::constants::{TONE_DURATION, TONE_FREQUENCY_HZ};
use crate::error::{CapabilityError, SubmitError};
use crate::status::{StatusUpdate, Toast, ToastId};

/// Renders the status badge, toasts and the camera error panel.
pub trait StatusSink: Send + Sync + Debug {
    /// Replaces the status badge.
    fn update_status(&self, update: &StatusUpdate) -> Result<(), CapabilityError>;

    /// Shows a transient notification.
    fn show_toast(&self, toast: &Toast) -> Result<(), CapabilityError>;

    /// Removes a toast once its display time is over.
    fn dismiss_toast(&self, id: ToastId) -> Result<(), CapabilityError>;

    /// Persistent panel shown after a camera failure.
    fn show_error_panel(&self, message: &str, hint: &str) -> Result<(), CapabilityError>;
}

/// Beep parameters for a sine tone.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSpec {
    /// Pitch.
    pub frequency_hz: u32,
    /// Length of the beep.
    pub duration: Duration,
    /// Starting gain, ramped exponentially down to `end_gain`.
    pub start_gain: f32,
    /// Gain at the end of the beep.
    pub end_gain: f32,
}

impl ToneSpec {
    /// Short 1200 Hz beep played on an accepted scan.
    pub fn confirmation() -> Self {
        Self {
            frequency_hz: TONE_FREQUENCY_HZ,
            duration: TONE_DURATION,
            start_gain: 0.3,
            end_gain: 0.01,
        }
    }
}

/// Audio output for the confirmation beep.
pub trait Tone: Send + Sync + Debug {
    /// Plays one tone without blocking.
    fn play(&self, spec: &ToneSpec) -> Result<(), CapabilityError>;
}

/// Tone for hosts without audio output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTone;

impl Tone for NoTone {
    fn play(&self, _spec: &ToneSpec) -> Result<(), CapabilityError> {
        Ok(())
    }
}

/// Vibration motor.
pub trait Haptics: Send + Sync + Debug {
    /// Whether pulses can be played at all.
    fn is_supported(&self) -> bool;

    /// Alternating on/off durations, starting with on.
    fn pulse(&self, pattern: &[Duration]) -> Result<(), CapabilityError>;
}

/// Haptics for hosts without a vibration motor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn is_supported(&self) -> bool {
        false
    }

    fn pulse(&self, _pattern: &[Duration]) -> Result<(), CapabilityError> {
        Err(CapabilityError::new("haptics", "not supported"))
    }
}

/// The hidden result field and the manual-entry field.
pub trait FieldStore: Send + Sync + Debug {
    /// Returns false when the field does not exist.
    fn set_value(&self, field_id: &str, value: &str) -> bool;

    /// Current value, `None` when the field does not exist.
    fn value(&self, field_id: &str) -> Option<String>;
}

/// Field store backed by a map; fields must be declared up front.
#[derive(Debug, Default)]
pub struct InMemoryFields {
    fields: RwLock<HashMap<String, String>>,
}

impl InMemoryFields {
    /// Store with the given fields, all empty.
    pub fn with_fields<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = ids
            .into_iter()
            .map(|id| (id.into(), String::new()))
            .collect();
        Self {
            fields: RwLock::new(fields),
        }
    }
}

impl FieldStore for InMemoryFields {
    fn set_value(&self, field_id: &str, value: &str) -> bool {
        match self.fields.write().get_mut(field_id) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }

    fn value(&self, field_id: &str) -> Option<String> {
        self.fields.read().get(field_id).cloned()
    }
}

/// Values posted with a form, keyed by field id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    /// Form being submitted.
    pub form_id: String,
    /// Field values by id.
    pub fields: BTreeMap<String, String>,
}

/// Submits host forms.
#[async_trait]
pub trait FormSubmitter: Send + Sync + Debug {
    /// Whether `form_id` can be submitted.
    fn has_form(&self, form_id: &str) -> bool;

    /// Submits the form with the given field values.
    async fn submit(&self, submission: FormSubmission) -> Result<(), SubmitError>;
}
