//! Content type identities with vendor and version qualifiers

use crate::accept::split_vendor_range;
use crate::exception::{Error, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Well known media type strings.
pub struct MediaType;

impl MediaType {
	pub const APPLICATION_JSON: &'static str = "application/json";
	pub const TEXT_HTML: &'static str = "text/html";
	pub const TEXT_PLAIN: &'static str = "text/plain";
}

/// Numeric API version carried in a vendored media type.
///
/// Versions compare numerically, so `1.0` and `1` are the same version.
///
/// # Examples
///
/// ```
/// use supercell_core::Version;
///
/// let version: Version = "1.0".parse().unwrap();
/// assert_eq!(version, Version::new(1.0).unwrap());
/// assert_eq!(version.to_string(), "1.0");
/// assert!("one".parse::<Version>().is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Version(f64);

impl Version {
	pub fn new(value: f64) -> Result<Self> {
		if !value.is_finite() || value < 0.0 {
			return Err(Error::InvalidVersion(value.to_string()));
		}
		// Normalises -0.0
		Ok(Self(value + 0.0))
	}

	pub fn value(&self) -> f64 {
		self.0
	}
}

impl PartialEq for Version {
	fn eq(&self, other: &Self) -> bool {
		self.0.to_bits() == other.0.to_bits()
	}
}

impl Eq for Version {}

impl Hash for Version {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.to_bits().hash(state);
	}
}

impl FromStr for Version {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		let value = s
			.trim()
			.parse::<f64>()
			.map_err(|_| Error::InvalidVersion(s.to_string()))?;
		Self::new(value)
	}
}

impl TryFrom<f64> for Version {
	type Error = Error;

	fn try_from(value: f64) -> Result<Self> {
		Self::new(value)
	}
}

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.0.fract() == 0.0 {
			write!(f, "{:.1}", self.0)
		} else {
			write!(f, "{}", self.0)
		}
	}
}

/// A content type identity: base media type plus optional vendor and version.
///
/// Two content types are equal only when all three parts match. The base is
/// the effective media type, so `application/vnd.acme-v1.1+json` has base
/// `application/json`, vendor `acme` and version `1.1`.
///
/// # Examples
///
/// ```
/// use supercell_core::ContentType;
///
/// let plain = ContentType::new("application/json");
/// let vendored = ContentType::new("application/json")
///     .with_vendor("acme")
///     .with_version(1.1)
///     .unwrap();
///
/// assert_ne!(plain, vendored);
/// assert_eq!(vendored.to_string(), "application/vnd.acme-v1.1+json");
/// assert_eq!("application/vnd.acme-v1.1+json".parse::<ContentType>().unwrap(), vendored);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType {
	base: String,
	vendor: Option<String>,
	version: Option<Version>,
}

impl ContentType {
	pub fn new(base: impl Into<String>) -> Self {
		Self {
			base: base.into().trim().to_ascii_lowercase(),
			vendor: None,
			version: None,
		}
	}

	/// Builds a content type from loosely typed parts.
	///
	/// Fails with [`Error::InvalidVersion`] when `version` is not numeric.
	pub fn from_parts(base: &str, vendor: Option<&str>, version: Option<&str>) -> Result<Self> {
		let mut content_type = Self::new(base);
		content_type.vendor = vendor.map(normalize_vendor);
		content_type.version = version.map(str::parse::<Version>).transpose()?;
		Ok(content_type)
	}

	pub fn json() -> Self {
		Self::new(MediaType::APPLICATION_JSON)
	}

	/// Sets the vendor. Vendors are case-insensitive and stored lowercased.
	pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
		self.vendor = Some(normalize_vendor(&vendor.into()));
		self
	}

	pub fn with_version(mut self, version: f64) -> Result<Self> {
		self.version = Some(Version::new(version)?);
		Ok(self)
	}

	pub fn base(&self) -> &str {
		&self.base
	}

	pub fn vendor(&self) -> Option<&str> {
		self.vendor.as_deref()
	}

	pub fn version(&self) -> Option<Version> {
		self.version
	}

	pub fn is_vendored(&self) -> bool {
		self.vendor.is_some()
	}
}

impl fmt::Display for ContentType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match (&self.vendor, self.base.split_once('/')) {
			(Some(vendor), Some((kind, subtype))) => {
				write!(f, "{}/vnd.{}", kind, vendor)?;
				if let Some(version) = self.version {
					write!(f, "-v{}", version)?;
				}
				write!(f, "+{}", subtype)
			}
			_ => {
				write!(f, "{}", self.base)?;
				if let Some(version) = self.version {
					write!(f, "; version={}", version)?;
				}
				Ok(())
			}
		}
	}
}

impl FromStr for ContentType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		let range = s.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
		if range.is_empty() || !range.contains('/') {
			return Err(Error::InvalidContentType(s.to_string()));
		}

		match split_vendor_range(&range) {
			Some((base, vendor, version)) => Self::from_parts(&base, Some(vendor), version),
			None => Ok(Self::new(range)),
		}
	}
}

fn normalize_vendor(vendor: &str) -> String {
	vendor.trim().to_ascii_lowercase()
}
