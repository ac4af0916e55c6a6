//! Configuration management module
//!
//! Environment-driven runtime settings plus the file-driven service directory.

pub mod file;
pub mod settings;

pub use file::{AiBackendConfig, AppConfig, CreditsConfig, ServiceDirectory};
pub use settings::Settings;
