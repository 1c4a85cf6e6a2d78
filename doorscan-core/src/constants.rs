//! Fixed timing and capture parameters for the check-in scanner.

use std::time::Duration;

/// Frames per second requested from the decoding capability.
pub const SCAN_FRAME_RATE: u32 = 10;

/// Width and height (px) of the square capture box.
pub const CAPTURE_BOX: (u32, u32) = (250, 250);

/// Camera aspect ratio.
pub const ASPECT_RATIO: f32 = 1.0;

/// Preferred camera: the rear-facing one on phones and tablets.
pub const FACING_MODE: &str = "environment";

/// A repeat of the last accepted code inside this window is suppressed.
pub const DUPLICATE_WINDOW: Duration = Duration::from_millis(2000);

/// How long the success status and toast stay up.
pub const SUCCESS_DISPLAY: Duration = Duration::from_millis(1500);

/// How long a precheck warning toast stays up.
pub const WARNING_DISPLAY: Duration = Duration::from_millis(1600);

/// Delay between commit and form submission, so feedback renders first.
pub const AUTO_SUBMIT_DELAY: Duration = Duration::from_millis(300);

/// Vibrate, pause, vibrate.
pub const HAPTIC_PATTERN: [Duration; 3] = [
    Duration::from_millis(50),
    Duration::from_millis(30),
    Duration::from_millis(50),
];

/// Confirmation beep pitch.
pub const TONE_FREQUENCY_HZ: u32 = 1200;

/// Confirmation beep length.
pub const TONE_DURATION: Duration = Duration::from_millis(100);

/// Codes longer than this are truncated in the success toast.
pub const TOAST_CODE_CHARS: usize = 20;

/// Capacity of the channel between the camera and the frame pump.
pub const FRAME_CHANNEL_CAPACITY: usize = 32;

/// Capacity of the scan event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
