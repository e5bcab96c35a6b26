//! Route declarations: the path pattern, what a handler produces and
//! consumes, and its cache policy

use crate::cache::CacheConfig;
use crate::handler::RequestHandler;
use crate::middleware::{Middleware, MiddlewareChain};
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use supercell_core::{ContentType, Error, ModelType, Result};
use supercell_negotiation::HandlerId;

/// Immutable per-route configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use supercell_core::ContentType;
/// use supercell_dispatch::{CacheConfig, RouteConfig};
///
/// let config = RouteConfig::builder()
///     .provides_default(ContentType::json())
///     .provides(ContentType::json().with_vendor("acme"))
///     .cache(CacheConfig::new(Duration::from_secs(600)).public())
///     .expires(Duration::from_secs(600))
///     .name("documents")
///     .build();
///
/// assert_eq!(config.producers().len(), 2);
/// assert_eq!(config.name(), Some("documents"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteConfig {
	producers: Vec<(ContentType, bool)>,
	consumers: Vec<(ContentType, Option<ModelType>)>,
	cache: Option<CacheConfig>,
	expires: Option<Duration>,
	middleware: MiddlewareChain,
	name: Option<String>,
	host: Option<String>,
}

impl RouteConfig {
	pub fn builder() -> RouteConfigBuilder {
		RouteConfigBuilder::default()
	}

	/// Produced content types with their default flag
	pub fn producers(&self) -> &[(ContentType, bool)] {
		&self.producers
	}

	pub fn consumers(&self) -> &[(ContentType, Option<ModelType>)] {
		&self.consumers
	}

	pub fn cache(&self) -> Option<&CacheConfig> {
		self.cache.as_ref()
	}

	pub fn expires(&self) -> Option<Duration> {
		self.expires
	}

	pub fn middleware(&self) -> &MiddlewareChain {
		&self.middleware
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn host(&self) -> Option<&str> {
		self.host.as_deref()
	}
}

#[derive(Debug, Default)]
pub struct RouteConfigBuilder {
	config: RouteConfig,
}

impl RouteConfigBuilder {
	pub fn provides(mut self, content_type: ContentType) -> Self {
		self.config.producers.push((content_type, false));
		self
	}

	/// Produces `content_type` and serves it when no `Accept` candidate
	/// matches.
	pub fn provides_default(mut self, content_type: ContentType) -> Self {
		self.config.producers.push((content_type, true));
		self
	}

	/// Consumes `content_type` into `model`. Registration fails without a
	/// model.
	pub fn consumes(mut self, content_type: ContentType, model: impl Into<Option<ModelType>>) -> Self {
		self.config.consumers.push((content_type, model.into()));
		self
	}

	pub fn cache(mut self, cache: CacheConfig) -> Self {
		self.config.cache = Some(cache);
		self
	}

	pub fn expires(mut self, expires: Duration) -> Self {
		self.config.expires = Some(expires);
		self
	}

	pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.config.middleware.add_middleware(middleware);
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.config.name = Some(name.into());
		self
	}

	/// Restricts the route to hosts matching a regular expression.
	pub fn host(mut self, pattern: impl Into<String>) -> Self {
		self.config.host = Some(pattern.into());
		self
	}

	pub fn build(self) -> RouteConfig {
		self.config
	}
}

/// Captures taken from a matched path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch<'a> {
	pub args: Vec<&'a str>,
	pub kwargs: IndexMap<&'a str, &'a str>,
}

/// A compiled route bound to its handler.
pub struct Route {
	id: HandlerId,
	path: String,
	pattern: Regex,
	host: Option<Regex>,
	handler: Arc<dyn RequestHandler>,
	config: RouteConfig,
}

impl Route {
	/// Compiles `path` as a regular expression anchored at both ends. The
	/// route is identified by its name, or by its path when unnamed.
	pub fn new(path: &str, handler: Arc<dyn RequestHandler>, config: RouteConfig) -> Result<Self> {
		let pattern = anchored(path)?;
		let host = config.host().map(anchored).transpose()?;
		let id = HandlerId::new(config.name().unwrap_or(path));

		Ok(Self {
			id,
			path: path.to_string(),
			pattern,
			host,
			handler,
			config,
		})
	}

	pub fn id(&self) -> &HandlerId {
		&self.id
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn handler(&self) -> &Arc<dyn RequestHandler> {
		&self.handler
	}

	pub fn config(&self) -> &RouteConfig {
		&self.config
	}

	/// Matches a request path, and the host when the route names one.
	/// Unnamed groups become positional captures, named groups keyword
	/// captures. Groups that did not participate are skipped.
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use supercell_dispatch::{RequestHandler, Route, RouteConfig};
	///
	/// struct Nothing;
	/// impl RequestHandler for Nothing {}
	///
	/// let route = Route::new(
	///     r"/documents/(?P<docid>\d+)/(\w+)",
	///     Arc::new(Nothing),
	///     RouteConfig::default(),
	/// ).unwrap();
	///
	/// let captures = route.matches(None, "/documents/12/edit").unwrap();
	/// assert_eq!(captures.args, vec!["edit"]);
	/// assert_eq!(captures.kwargs["docid"], "12");
	/// assert!(route.matches(None, "/documents/x/edit").is_none());
	/// ```
	pub fn matches<'a>(&'a self, host: Option<&str>, path: &'a str) -> Option<RouteMatch<'a>> {
		if let Some(pattern) = &self.host {
			let host = host.map(strip_port).unwrap_or_default();
			if !pattern.is_match(host) {
				return None;
			}
		}

		let captures = self.pattern.captures(path)?;
		let mut found = RouteMatch::default();
		for (index, name) in self.pattern.capture_names().enumerate().skip(1) {
			let Some(value) = captures.get(index) else {
				continue;
			};
			match name {
				Some(name) => {
					found.kwargs.insert(name, value.as_str());
				}
				None => found.args.push(value.as_str()),
			}
		}
		Some(found)
	}
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("id", &self.id)
			.field("path", &self.path)
			.field("config", &self.config)
			.finish()
	}
}

fn anchored(pattern: &str) -> Result<Regex> {
	let trimmed = pattern.trim_start_matches('^').trim_end_matches('$');
	Regex::new(&format!("^(?:{trimmed})$"))
		.map_err(|e| Error::InvalidRoute(format!("{pattern}: {e}")))
}

fn strip_port(host: &str) -> &str {
	match host.rsplit_once(':') {
		Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => name,
		_ => host,
	}
}
