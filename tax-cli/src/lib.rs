pub mod app;
pub mod config;
pub mod logging;
pub mod prompt;
pub mod session;

pub use config::{AppConfig, ConfigError, Overrides};
pub use session::{SessionConfig, SessionError, TaxSession};
