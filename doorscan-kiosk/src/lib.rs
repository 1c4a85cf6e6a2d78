//! Terminal check-in kiosk built on `doorscan-core`.
//!
//! A keyboard-wedge QR reader types each scanned code as a line on stdin.
//! [`kiosk::Kiosk`] feeds those lines into a scan session, renders status in
//! the terminal and posts accepted check-ins to the configured form action.

pub mod camera;
pub mod commands;
pub mod config;
pub mod forms;
pub mod kiosk;
pub mod presenter;

pub use camera::StdinCamera;
pub use forms::HttpFormSubmitter;
pub use kiosk::{Flow, Kiosk};
pub use presenter::{BellTone, TerminalPresenter};
