//! Cache-Control and Expires header computation
//!
//! Only the headers are computed here; storing responses is left to
//! whatever sits in front of the service.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// HTTP-date format used for `Expires`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Cache policy attached to a route.
///
/// # Examples
///
/// ```
/// use supercell_dispatch::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::new(Duration::from_secs(600))
///     .with_s_max_age(Duration::from_secs(600))
///     .public()
///     .proxy_revalidate();
///
/// assert_eq!(
///     config.header_value(),
///     "max-age=600, s-max-age=600, public, must-revalidate, proxy-revalidate"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
	/// How long the response may be cached
	pub max_age: Duration,
	/// Like `max_age` for shared caches; a zero duration is not emitted
	pub s_max_age: Option<Duration>,
	pub public: bool,
	pub private: bool,
	pub no_cache: bool,
	pub no_store: bool,
	pub must_revalidate: bool,
	pub proxy_revalidate: bool,
}

impl CacheConfig {
	pub fn new(max_age: Duration) -> Self {
		Self {
			max_age,
			s_max_age: None,
			public: false,
			private: false,
			no_cache: false,
			no_store: false,
			must_revalidate: true,
			proxy_revalidate: false,
		}
	}

	pub fn with_s_max_age(mut self, s_max_age: Duration) -> Self {
		self.s_max_age = Some(s_max_age);
		self
	}

	pub fn public(mut self) -> Self {
		self.public = true;
		self
	}

	pub fn private(mut self) -> Self {
		self.private = true;
		self
	}

	pub fn no_cache(mut self) -> Self {
		self.no_cache = true;
		self
	}

	pub fn no_store(mut self) -> Self {
		self.no_store = true;
		self
	}

	pub fn with_must_revalidate(mut self, must_revalidate: bool) -> Self {
		self.must_revalidate = must_revalidate;
		self
	}

	pub fn proxy_revalidate(mut self) -> Self {
		self.proxy_revalidate = true;
		self
	}

	/// The `Cache-Control` value for this policy.
	pub fn header_value(&self) -> String {
		compute_cache_header(self)
	}
}

/// Renders a `Cache-Control` value in fixed directive order.
pub fn compute_cache_header(config: &CacheConfig) -> String {
	let mut directives = vec![format!("max-age={}", config.max_age.as_secs())];

	if let Some(s_max_age) = config.s_max_age.filter(|d| !d.is_zero()) {
		directives.push(format!("s-max-age={}", s_max_age.as_secs()));
	}

	let flags = [
		(config.public, "public"),
		(config.private, "private"),
		(config.no_cache, "no-cache"),
		(config.no_store, "no-store"),
		(config.must_revalidate, "must-revalidate"),
		(config.proxy_revalidate, "proxy-revalidate"),
	];
	directives.extend(
		flags
			.into_iter()
			.filter(|(set, _)| *set)
			.map(|(_, name)| name.to_string()),
	);

	directives.join(", ")
}

/// Renders `now + duration` as an HTTP-date for the `Expires` header.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use std::time::Duration;
/// use supercell_dispatch::cache::expires_header;
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 31, 23, 50, 0).unwrap();
/// assert_eq!(
///     expires_header(now, Duration::from_secs(600)),
///     "Thu, 01 Feb 2024 00:00:00 GMT"
/// );
/// ```
pub fn expires_header(now: DateTime<Utc>, duration: Duration) -> String {
	let expires = TimeDelta::from_std(duration)
		.ok()
		.and_then(|delta| now.checked_add_signed(delta))
		.unwrap_or(DateTime::<Utc>::MAX_UTC);
	expires.format(HTTP_DATE_FORMAT).to_string()
}
