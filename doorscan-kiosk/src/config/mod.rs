//! Kiosk configuration: `.env`, then `doorscan.toml`, then `DOORSCAN_*`
//! variables, then command-line flags.

pub mod cli;
pub mod loader;
pub mod models;
pub mod sources;

pub use cli::KioskArgs;
pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions, validate};
pub use models::{ConfigMetadata, FormTarget, KioskConfig};
pub use sources::{EnvConfig, FileConfig};
