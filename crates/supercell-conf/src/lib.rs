//! # Supercell Conf
//!
//! Settings for supercell services, read from TOML files and `SUPERCELL_*`
//! environment variables, and the logging setup driven by them.

pub mod logging;
pub mod settings;

pub use logging::{LoggingError, build_filter, init_logging};
pub use settings::{
	DispatchSettings, ENV_PREFIX, LogFormat, LoggingSettings, ServerSettings, Settings,
	SettingsError,
};
