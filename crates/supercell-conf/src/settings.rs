//! Service settings
//!
//! Settings are layered: built-in defaults, then `config.toml` and
//! `<name>.toml` from each search path in order, then `SUPERCELL_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "SUPERCELL_";

/// Settings error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("File error: {path}: {source}")]
	FileError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Parse error: {path}: {message}")]
	ParseError { path: PathBuf, message: String },

	#[error("Invalid value for {key}: {value:?}")]
	InvalidOverride { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// All settings of a service
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub server: ServerSettings,
	pub logging: LoggingSettings,
	pub dispatch: DispatchSettings,
}

/// Where the transport listens
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
	pub address: String,
	pub port: u16,
	/// Seconds in-flight requests get to finish on shutdown
	pub max_grace_seconds: u64,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			address: "127.0.0.1".to_string(),
			port: 8080,
			max_grace_seconds: 3,
		}
	}
}

/// Logging settings
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// Level or filter directive, e.g. `info` or `supercell=debug`
	pub level: String,
	/// Log file; stdout when unset
	pub file: Option<PathBuf>,
	pub format: LogFormat,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			file: None,
			format: LogFormat::Text,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Text,
	Json,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"text" => Ok(LogFormat::Text),
			"json" => Ok(LogFormat::Json),
			other => Err(format!("unknown log format `{other}`")),
		}
	}
}

impl fmt::Display for LogFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LogFormat::Text => f.write_str("text"),
			LogFormat::Json => f.write_str("json"),
		}
	}
}

/// Settings the request dispatcher reads
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
	/// Put the error text into 500 bodies
	pub debug: bool,
}

impl DispatchSettings {
	pub fn debug(debug: bool) -> Self {
		Self { debug }
	}
}

impl Settings {
	/// Loads settings files from `search_paths`, then applies the process
	/// environment.
	///
	/// # Examples
	///
	/// ```no_run
	/// use supercell_conf::Settings;
	///
	/// let settings = Settings::load(&["/etc/sayings", "."], "sayings").unwrap();
	/// println!("listening on {}:{}", settings.server.address, settings.server.port);
	/// ```
	pub fn load<P: AsRef<Path>>(search_paths: &[P], name: &str) -> Result<Self> {
		let mut settings = Self::from_files(search_paths, name)?;
		settings.apply_overrides(|key| std::env::var(key).ok())?;
		Ok(settings)
	}

	/// Merges `config.toml` and `<name>.toml` of every search path over the
	/// defaults. Missing files are skipped.
	pub fn from_files<P: AsRef<Path>>(search_paths: &[P], name: &str) -> Result<Self> {
		let mut merged = toml::Table::new();

		for dir in search_paths {
			for file in ["config.toml".to_string(), format!("{name}.toml")] {
				let path = dir.as_ref().join(file);
				if !path.is_file() {
					continue;
				}
				let table = read_table(&path)?;
				tracing::debug!(path = %path.display(), "loaded settings file");
				merge(&mut merged, table);
			}
		}

		Self::deserialize(toml::Value::Table(merged)).map_err(|e| SettingsError::ParseError {
			path: PathBuf::from(name),
			message: e.to_string(),
		})
	}

	/// Applies `SUPERCELL_*` overrides read through `lookup`.
	pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |suffix: &str| {
			let key = format!("{ENV_PREFIX}{suffix}");
			lookup(&key).map(|value| (key, value))
		};

		if let Some((_, value)) = var("ADDRESS") {
			self.server.address = value;
		}
		if let Some((key, value)) = var("PORT") {
			self.server.port = parse_override(key, value)?;
		}
		if let Some((key, value)) = var("MAX_GRACE_SECONDS") {
			self.server.max_grace_seconds = parse_override(key, value)?;
		}
		if let Some((_, value)) = var("LOGLEVEL") {
			self.logging.level = value;
		}
		if let Some((_, value)) = var("LOGFILE") {
			self.logging.file = (!value.is_empty()).then(|| PathBuf::from(value));
		}
		if let Some((key, value)) = var("LOGFORMAT") {
			self.logging.format = parse_override(key, value)?;
		}
		if let Some((key, value)) = var("DEBUG") {
			self.dispatch.debug = parse_bool(&value).ok_or(SettingsError::InvalidOverride { key, value })?;
		}
		Ok(())
	}
}

fn read_table(path: &Path) -> Result<toml::Table> {
	let text = std::fs::read_to_string(path).map_err(|source| SettingsError::FileError {
		path: path.to_path_buf(),
		source,
	})?;
	text.parse::<toml::Table>()
		.map_err(|e| SettingsError::ParseError {
			path: path.to_path_buf(),
			message: e.to_string(),
		})
}

/// Deep-merges `overlay` into `base`; tables merge, everything else is
/// replaced.
fn merge(base: &mut toml::Table, overlay: toml::Table) {
	for (key, value) in overlay {
		if let toml::Value::Table(incoming) = value {
			if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
				merge(existing, incoming);
				continue;
			}
			base.insert(key, toml::Value::Table(incoming));
		} else {
			base.insert(key, value);
		}
	}
}

fn parse_override<T: FromStr>(key: String, value: String) -> Result<T> {
	value
		.trim()
		.parse()
		.map_err(|_| SettingsError::InvalidOverride { key, value })
}

fn parse_bool(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" | "" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| vars.get(key).cloned()
	}

	#[rstest]
	fn test_defaults() {
		let settings = Settings::default();

		assert_eq!(settings.server.address, "127.0.0.1");
		assert_eq!(settings.server.port, 8080);
		assert_eq!(settings.server.max_grace_seconds, 3);
		assert_eq!(settings.logging.level, "info");
		assert_eq!(settings.logging.format, LogFormat::Text);
		assert!(settings.logging.file.is_none());
		assert!(!settings.dispatch.debug);
	}

	#[rstest]
	fn test_overrides() {
		let mut settings = Settings::default();

		settings
			.apply_overrides(lookup(&[
				("SUPERCELL_PORT", "9090"),
				("SUPERCELL_LOGLEVEL", "debug"),
				("SUPERCELL_LOGFILE", "/tmp/sc.log"),
				("SUPERCELL_DEBUG", "true"),
			]))
			.unwrap();

		assert_eq!(settings.server.port, 9090);
		assert_eq!(settings.logging.level, "debug");
		assert_eq!(settings.logging.file, Some(PathBuf::from("/tmp/sc.log")));
		assert!(settings.dispatch.debug);
	}

	#[rstest]
	#[case("SUPERCELL_PORT", "eighty")]
	#[case("SUPERCELL_MAX_GRACE_SECONDS", "-1")]
	#[case("SUPERCELL_DEBUG", "maybe")]
	#[case("SUPERCELL_LOGFORMAT", "xml")]
	fn test_invalid_override(#[case] key: &str, #[case] value: &str) {
		let mut settings = Settings::default();

		let result = settings.apply_overrides(lookup(&[(key, value)]));

		assert!(matches!(result, Err(SettingsError::InvalidOverride { key: k, .. }) if k == key));
	}

	#[rstest]
	fn test_merge_is_deep() {
		let mut base: toml::Table = "[server]\nport = 1\naddress = \"a\"".parse().unwrap();
		let overlay: toml::Table = "[server]\nport = 2".parse().unwrap();

		merge(&mut base, overlay);

		assert_eq!(base["server"]["port"].as_integer(), Some(2));
		assert_eq!(base["server"]["address"].as_str(), Some("a"));
	}
}
