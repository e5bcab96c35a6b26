//! Accept and Content-Type header parsing
//!
//! The parser understands the vendor convention
//! `application/vnd.<vendor>[-v<version>]+<subtype>` and rewrites such
//! ranges to their effective base type, moving vendor and version into the
//! candidate's parameters.

use crate::exception::Result;
use crate::media_type::{ContentType, Version};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Parameter key holding the vendor of a vendored media range
pub const VENDOR_PARAM: &str = "vendor";
/// Parameter key holding the normalised version of a vendored media range
pub const VERSION_PARAM: &str = "version";

static VENDOR_RANGE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^application/vnd\.(?P<vendor>[^+]+?)(?:-v(?P<version>\d+(?:\.\d+)?))?\+(?P<subtype>[^+]+)$")
		.expect("Invalid vendor media range pattern")
});

/// Splits `application/vnd.<vendor>[-v<version>]+<subtype>` into
/// `(application/<subtype>, vendor, version)`.
pub(crate) fn split_vendor_range(range: &str) -> Option<(String, &str, Option<&str>)> {
	let captures = VENDOR_RANGE.captures(range)?;
	let vendor = captures.name("vendor")?.as_str();
	let subtype = captures.name("subtype")?.as_str();
	let version = captures.name("version").map(|m| m.as_str());
	Some((format!("application/{}", subtype), vendor, version))
}

/// One entry of a parsed `Accept` or `Content-Type` header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptCandidate {
	/// Effective media type, e.g. `application/json` for a vendored JSON range
	pub base: String,
	/// Lowercased parameter names to values, without `q`
	pub parameters: IndexMap<String, String>,
	/// Quality in `[0, 1]`
	pub quality: f64,
}

impl AcceptCandidate {
	/// The candidate produced for empty or unusable headers.
	pub fn empty() -> Self {
		Self {
			base: String::new(),
			parameters: IndexMap::new(),
			quality: 1.0,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.base.is_empty()
	}

	pub fn vendor(&self) -> Option<&str> {
		self.parameters.get(VENDOR_PARAM).map(String::as_str)
	}

	pub fn version(&self) -> Option<&str> {
		self.parameters.get(VERSION_PARAM).map(String::as_str)
	}

	/// The exact content type this candidate asks for.
	///
	/// Fails when a `version` parameter is present but not numeric.
	pub fn target_content_type(&self) -> Result<ContentType> {
		ContentType::from_parts(&self.base, self.vendor(), self.version())
	}
}

/// Parses a raw header value into candidates ordered by descending quality.
///
/// The parser is total: every input yields at least one candidate. Empty
/// headers, headers made only of wildcards and headers with malformed
/// parameters yield a single candidate with an empty base.
///
/// # Examples
///
/// ```
/// use supercell_core::parse_accept_header;
///
/// let candidates = parse_accept_header("application/xml;q=0.9, application/vnd.acme-v1.1+json");
/// assert_eq!(candidates[0].base, "application/json");
/// assert_eq!(candidates[0].vendor(), Some("acme"));
/// assert_eq!(candidates[0].version(), Some("1.1"));
/// assert_eq!(candidates[1].base, "application/xml");
/// assert_eq!(candidates[1].quality, 0.9);
///
/// let fallback = parse_accept_header("");
/// assert_eq!(fallback.len(), 1);
/// assert!(fallback[0].is_empty());
/// ```
pub fn parse_accept_header(header: &str) -> Vec<AcceptCandidate> {
	let Some(mut candidates) = parse_segments(header) else {
		return vec![AcceptCandidate::empty()];
	};

	if candidates.iter().all(|c| c.base.contains('*')) {
		return vec![AcceptCandidate::empty()];
	}

	// Stable, so equal qualities keep header order
	candidates.sort_by(|a, b| b.quality.total_cmp(&a.quality));
	candidates
}

fn parse_segments(header: &str) -> Option<Vec<AcceptCandidate>> {
	let mut candidates = Vec::new();

	for segment in header.split(',') {
		let mut parts = segment.split(';');
		let range = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
		if range.is_empty() {
			continue;
		}

		let mut parameters = IndexMap::new();
		let mut quality = 1.0;
		for param in parts {
			let param = param.trim();
			if param.is_empty() {
				continue;
			}
			let (key, value) = param.split_once('=')?;
			let key = key.trim().to_ascii_lowercase();
			let value = value.trim().trim_matches('"');
			if key == "q" {
				quality = parse_quality(value);
			} else {
				parameters.insert(key, value.to_string());
			}
		}

		let base = match split_vendor_range(&range) {
			Some((base, vendor, version)) => {
				parameters.insert(VENDOR_PARAM.to_string(), vendor.to_string());
				if let Some(version) = version.and_then(|v| v.parse::<Version>().ok()) {
					parameters.insert(VERSION_PARAM.to_string(), version.to_string());
				}
				base
			}
			None => range,
		};

		candidates.push(AcceptCandidate {
			base,
			parameters,
			quality,
		});
	}

	if candidates.is_empty() {
		None
	} else {
		Some(candidates)
	}
}

fn parse_quality(value: &str) -> f64 {
	match value.parse::<f64>() {
		Ok(q) if (0.0..=1.0).contains(&q) => q,
		_ => 1.0,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn bases(candidates: &[AcceptCandidate]) -> Vec<&str> {
		candidates.iter().map(|c| c.base.as_str()).collect()
	}

	#[rstest]
	fn test_quality_ordering_is_stable() {
		// Arrange
		let header =
			"text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8,application/json";

		// Act
		let candidates = parse_accept_header(header);

		// Assert
		assert_eq!(
			bases(&candidates),
			vec![
				"text/html",
				"application/xhtml+xml",
				"application/json",
				"application/xml",
				"*/*",
			]
		);
		let qualities: Vec<f64> = candidates.iter().map(|c| c.quality).collect();
		assert_eq!(qualities, vec![1.0, 1.0, 1.0, 0.9, 0.8]);
	}

	#[rstest]
	fn test_vendor_and_version_extraction() {
		let candidates = parse_accept_header("application/vnd.ficture.lightt-v1.1+json");

		assert_eq!(candidates.len(), 1);
		assert_eq!(candidates[0].base, "application/json");
		assert_eq!(candidates[0].vendor(), Some("ficture.lightt"));
		assert_eq!(candidates[0].version(), Some("1.1"));
		assert_eq!(candidates[0].quality, 1.0);
	}

	#[rstest]
	fn test_vendor_without_version() {
		let candidates = parse_accept_header("application/vnd.acme+json");

		assert_eq!(candidates[0].base, "application/json");
		assert_eq!(candidates[0].vendor(), Some("acme"));
		assert_eq!(candidates[0].version(), None);
	}

	#[rstest]
	fn test_version_is_normalised() {
		let candidates = parse_accept_header("application/vnd.acme-v2+json");

		assert_eq!(candidates[0].version(), Some("2.0"));
		assert_eq!(
			candidates[0].target_content_type().unwrap(),
			ContentType::json().with_vendor("acme").with_version(2.0).unwrap()
		);
	}

	#[rstest]
	fn test_vendor_without_subtype_is_verbatim() {
		let candidates = parse_accept_header("application/vnd.ficture.lightt-v1.0");

		assert_eq!(candidates[0].base, "application/vnd.ficture.lightt-v1.0");
		assert!(candidates[0].parameters.is_empty());
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	#[case(",,")]
	#[case("*/*")]
	#[case("*/*;q=0.5, text/*")]
	#[case("text/*,image/*;application/*;*/*;")]
	#[case("text/html;charset")]
	fn test_degenerate_headers_yield_empty_candidate(#[case] header: &str) {
		let candidates = parse_accept_header(header);

		assert_eq!(candidates, vec![AcceptCandidate::empty()]);
	}

	#[rstest]
	#[case("application/json;q=abc", 1.0)]
	#[case("application/json;q=1.5", 1.0)]
	#[case("application/json;q=-0.1", 1.0)]
	#[case("application/json; Q=0.3", 0.3)]
	#[case("application/json;q=0", 0.0)]
	fn test_garbled_quality_defaults(#[case] header: &str, #[case] expected: f64) {
		let candidates = parse_accept_header(header);

		assert_eq!(candidates.len(), 1);
		assert_eq!(candidates[0].quality, expected);
	}

	#[rstest]
	fn test_content_type_parameters_are_kept() {
		let candidates = parse_accept_header("application/json; Encoding=UTF-8");

		assert_eq!(candidates[0].base, "application/json");
		assert_eq!(candidates[0].parameters.get("encoding").map(String::as_str), Some("UTF-8"));
		assert_eq!(candidates[0].target_content_type().unwrap(), ContentType::json());
	}

	#[rstest]
	fn test_bogus_version_parameter_has_no_target() {
		let candidates = parse_accept_header("application/json; version=abc");

		assert!(candidates[0].target_content_type().is_err());
	}
}
