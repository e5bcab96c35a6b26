//! Logging setup
//!
//! Installs a global `tracing` subscriber from [`LoggingSettings`].
//! `RUST_LOG` takes precedence over the configured level.

use crate::settings::{LogFormat, LoggingSettings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Logging initialisation error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
	#[error("Invalid log filter {0:?}: {1}")]
	InvalidFilter(String, String),

	#[error("Invalid log file {0:?}")]
	InvalidFile(String),

	#[error("A global subscriber is already installed: {0}")]
	AlreadyInstalled(String),
}

/// Builds the filter: `RUST_LOG` when set, the configured level otherwise.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
	match EnvFilter::try_from_default_env() {
		Ok(filter) => Ok(filter),
		Err(_) => EnvFilter::try_new(level)
			.map_err(|e| LoggingError::InvalidFilter(level.to_string(), e.to_string())),
	}
}

/// Installs the global subscriber.
///
/// When logging to a file, the returned guard flushes pending lines on drop
/// and must be held for the life of the service.
///
/// # Examples
///
/// ```no_run
/// use supercell_conf::{Settings, init_logging};
///
/// let settings = Settings::default();
/// let _guard = init_logging(&settings.logging).unwrap();
/// tracing::info!("service starting");
/// ```
pub fn init_logging(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, LoggingError> {
	let filter = build_filter(&settings.level)?;

	let (writer, guard) = match &settings.file {
		Some(path) => {
			let file_name = path
				.file_name()
				.ok_or_else(|| LoggingError::InvalidFile(path.display().to_string()))?;
			let directory = path
				.parent()
				.filter(|p| !p.as_os_str().is_empty())
				.unwrap_or_else(|| std::path::Path::new("."));
			let appender = tracing_appender::rolling::never(directory, file_name);
			let (writer, guard) = tracing_appender::non_blocking(appender);
			(fmt::writer::BoxMakeWriter::new(writer), Some(guard))
		}
		None => (fmt::writer::BoxMakeWriter::new(std::io::stdout), None),
	};

	let registry = tracing_subscriber::registry().with(filter);
	let installed = match settings.format {
		LogFormat::Json => registry
			.with(fmt::layer().json().with_writer(writer))
			.try_init(),
		LogFormat::Text => registry
			.with(fmt::layer().with_ansi(settings.file.is_none()).with_writer(writer))
			.try_init(),
	};
	installed.map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

	tracing::debug!(level = %settings.level, format = %settings.format, "logging initialised");
	Ok(guard)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial(rust_log)]
	fn test_configured_level_is_used() {
		// SAFETY: serialized with the other tests touching RUST_LOG
		unsafe { std::env::remove_var("RUST_LOG") };

		let filter = build_filter("supercell=debug").unwrap();

		assert_eq!(filter.to_string(), "supercell=debug");
	}

	#[rstest]
	#[serial(rust_log)]
	fn test_rust_log_wins() {
		unsafe { std::env::set_var("RUST_LOG", "warn") };

		let filter = build_filter("debug");
		unsafe { std::env::remove_var("RUST_LOG") };

		assert_eq!(filter.unwrap().to_string(), "warn");
	}

	#[rstest]
	#[serial(rust_log)]
	fn test_invalid_level() {
		unsafe { std::env::remove_var("RUST_LOG") };

		let result = build_filter("supercell=loudest");

		assert!(matches!(result, Err(LoggingError::InvalidFilter(..))));
	}
}
