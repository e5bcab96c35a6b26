//! Registry of producers and consumers
//!
//! Two indices live here:
//!
//! - per handler, the content types it is willing to produce and consume
//!   (its [`Capabilities`]), each consumer entry carrying a model type
//! - process wide, the [`Provider`] or [`Consumer`] implementation for each
//!   exact [`ContentType`]
//!
//! Both are filled while the application is configured. [`Registry::freeze`]
//! consumes the registry and returns a read-only [`RegistrySnapshot`], so no
//! write can happen once requests are served.

use crate::consumer::{Consumer, JsonConsumer};
use crate::provider::{JsonProvider, Provider};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use supercell_core::{ContentType, Error, ModelType, Result};

/// Identity of a registered handler, usually its route name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(Arc<str>);

impl HandlerId {
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for HandlerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for HandlerId {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerEntry {
	pub content_type: ContentType,
	pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerEntry {
	pub content_type: ContentType,
	pub model: ModelType,
}

/// What one handler can produce and consume, keyed by base type.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
	producers: IndexMap<String, Vec<ProducerEntry>>,
	default_producer: Option<ContentType>,
	consumers: IndexMap<String, Vec<ConsumerEntry>>,
}

impl Capabilities {
	pub fn has_producer_base(&self, base: &str) -> bool {
		self.producers.contains_key(base)
	}

	pub fn produces(&self, content_type: &ContentType) -> bool {
		self.producers
			.get(content_type.base())
			.is_some_and(|entries| entries.iter().any(|e| &e.content_type == content_type))
	}

	pub fn default_producer(&self) -> Option<&ContentType> {
		self.default_producer.as_ref()
	}

	pub fn has_consumer_base(&self, base: &str) -> bool {
		self.consumers.contains_key(base)
	}

	pub fn consumer_entry(&self, content_type: &ContentType) -> Option<&ConsumerEntry> {
		self.consumers
			.get(content_type.base())?
			.iter()
			.find(|e| &e.content_type == content_type)
	}

	/// Producer entries in registration order.
	pub fn producers(&self) -> impl Iterator<Item = &ProducerEntry> {
		self.producers.values().flatten()
	}

	/// Consumer entries in registration order.
	pub fn consumers(&self) -> impl Iterator<Item = &ConsumerEntry> {
		self.consumers.values().flatten()
	}

	fn add_producer(&mut self, content_type: ContentType, is_default: bool) -> Result<()> {
		if self.produces(&content_type) {
			return Err(Error::DuplicateRegistration(format!(
				"producer {}",
				content_type
			)));
		}
		if is_default {
			if let Some(existing) = &self.default_producer {
				return Err(Error::DuplicateRegistration(format!(
					"default producer {} (already {})",
					content_type, existing
				)));
			}
			self.default_producer = Some(content_type.clone());
		}

		self.producers
			.entry(content_type.base().to_string())
			.or_default()
			.push(ProducerEntry {
				content_type,
				is_default,
			});
		Ok(())
	}

	fn add_consumer(&mut self, content_type: ContentType, model: ModelType) -> Result<()> {
		if self.consumer_entry(&content_type).is_some() {
			return Err(Error::DuplicateRegistration(format!(
				"consumer {}",
				content_type
			)));
		}

		self.consumers
			.entry(content_type.base().to_string())
			.or_default()
			.push(ConsumerEntry {
				content_type,
				model,
			});
		Ok(())
	}
}

/// Registry under construction.
///
/// # Examples
///
/// ```
/// use supercell_core::{ContentType, Error};
/// use supercell_negotiation::{HandlerId, Registry};
///
/// let mut registry = Registry::with_defaults();
/// let handler = HandlerId::new("documents");
///
/// registry.register_producer(&handler, ContentType::json(), true).unwrap();
/// let duplicate = registry.register_producer(&handler, ContentType::json(), false);
/// assert!(matches!(duplicate, Err(Error::DuplicateRegistration(_))));
///
/// let snapshot = registry.freeze();
/// assert!(snapshot.capabilities(&handler).unwrap().produces(&ContentType::json()));
/// ```
#[derive(Default)]
pub struct Registry {
	providers: IndexMap<ContentType, Arc<dyn Provider>>,
	consumers: IndexMap<ContentType, Arc<dyn Consumer>>,
	handlers: IndexMap<HandlerId, Capabilities>,
}

impl Registry {
	/// An empty registry with no implementations at all.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry with the plain JSON provider and consumer installed.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry
			.providers
			.insert(ContentType::json(), Arc::new(JsonProvider::new()));
		registry
			.consumers
			.insert(ContentType::json(), Arc::new(JsonConsumer::new()));
		registry
	}

	/// Installs the implementation for the provider's exact content type.
	pub fn add_provider(&mut self, provider: Arc<dyn Provider>) -> Result<()> {
		let content_type = provider.content_type().clone();
		if self.providers.contains_key(&content_type) {
			return Err(Error::DuplicateRegistration(format!(
				"provider implementation for {}",
				content_type
			)));
		}
		tracing::debug!(content_type = %content_type, "provider installed");
		self.providers.insert(content_type, provider);
		Ok(())
	}

	/// Installs the implementation for the consumer's exact content type.
	pub fn add_consumer(&mut self, consumer: Arc<dyn Consumer>) -> Result<()> {
		let content_type = consumer.content_type().clone();
		if self.consumers.contains_key(&content_type) {
			return Err(Error::DuplicateRegistration(format!(
				"consumer implementation for {}",
				content_type
			)));
		}
		tracing::debug!(content_type = %content_type, "consumer installed");
		self.consumers.insert(content_type, consumer);
		Ok(())
	}

	/// Declares that `handler` can produce `content_type`.
	pub fn register_producer(
		&mut self,
		handler: &HandlerId,
		content_type: ContentType,
		is_default: bool,
	) -> Result<()> {
		self.handlers
			.entry(handler.clone())
			.or_default()
			.add_producer(content_type, is_default)
	}

	/// Declares that `handler` can consume `content_type` into `model`.
	///
	/// Fails with [`Error::MissingModel`] when no model type is given.
	pub fn register_consumer(
		&mut self,
		handler: &HandlerId,
		content_type: ContentType,
		model: Option<ModelType>,
	) -> Result<()> {
		let model = model.ok_or_else(|| Error::MissingModel(content_type.to_string()))?;
		self.handlers
			.entry(handler.clone())
			.or_default()
			.add_consumer(content_type, model)
	}

	pub fn capabilities(&self, handler: &HandlerId) -> Option<&Capabilities> {
		self.handlers.get(handler)
	}

	/// Ends the configuration phase.
	///
	/// Content types a handler declares without an installed implementation
	/// are logged, since requests for them can never succeed.
	pub fn freeze(self) -> Arc<RegistrySnapshot> {
		for (handler, capabilities) in &self.handlers {
			for entry in capabilities.producers() {
				if !self.providers.contains_key(&entry.content_type) {
					tracing::warn!(
						handler = %handler,
						content_type = %entry.content_type,
						"no provider implementation installed"
					);
				}
			}
			for entry in capabilities.consumers() {
				if !self.consumers.contains_key(&entry.content_type) {
					tracing::warn!(
						handler = %handler,
						content_type = %entry.content_type,
						"no consumer implementation installed"
					);
				}
			}
		}

		Arc::new(RegistrySnapshot {
			providers: self.providers,
			consumers: self.consumers,
			handlers: self.handlers,
		})
	}
}

/// Read-only registry used while serving requests.
pub struct RegistrySnapshot {
	providers: IndexMap<ContentType, Arc<dyn Provider>>,
	consumers: IndexMap<ContentType, Arc<dyn Consumer>>,
	handlers: IndexMap<HandlerId, Capabilities>,
}

impl RegistrySnapshot {
	pub fn provider(&self, content_type: &ContentType) -> Option<&Arc<dyn Provider>> {
		self.providers.get(content_type)
	}

	pub fn consumer(&self, content_type: &ContentType) -> Option<&Arc<dyn Consumer>> {
		self.consumers.get(content_type)
	}

	pub fn capabilities(&self, handler: &HandlerId) -> Option<&Capabilities> {
		self.handlers.get(handler)
	}

	pub fn handlers(&self) -> impl Iterator<Item = &HandlerId> {
		self.handlers.keys()
	}
}

impl fmt::Debug for RegistrySnapshot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RegistrySnapshot")
			.field("providers", &self.providers.keys().collect::<Vec<_>>())
			.field("consumers", &self.consumers.keys().collect::<Vec<_>>())
			.field("handlers", &self.handlers)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde::{Deserialize, Serialize};
	use validator::Validate;

	#[derive(Serialize, Deserialize, Validate)]
	struct Document {
		message: String,
	}

	#[fixture]
	fn handler() -> HandlerId {
		HandlerId::new("documents")
	}

	fn acme(version: Option<f64>) -> ContentType {
		let content_type = ContentType::json().with_vendor("acme");
		match version {
			Some(v) => content_type.with_version(v).unwrap(),
			None => content_type,
		}
	}

	#[rstest]
	fn test_vendor_and_version_variants_coexist(handler: HandlerId) {
		// Arrange
		let mut registry = Registry::new();

		// Act
		registry.register_producer(&handler, ContentType::json(), false).unwrap();
		registry.register_producer(&handler, acme(None), false).unwrap();
		registry.register_producer(&handler, acme(Some(1.0)), false).unwrap();
		registry.register_producer(&handler, acme(Some(1.1)), false).unwrap();

		// Assert
		let capabilities = registry.capabilities(&handler).unwrap();
		assert_eq!(capabilities.producers().count(), 4);
		assert!(capabilities.has_producer_base("application/json"));
		assert!(capabilities.produces(&acme(Some(1.1))));
		assert!(!capabilities.produces(&acme(Some(2.0))));
		assert!(capabilities.default_producer().is_none());
	}

	#[rstest]
	fn test_duplicate_producer_rejected(handler: HandlerId) {
		let mut registry = Registry::new();
		registry.register_producer(&handler, acme(Some(1.0)), false).unwrap();

		let result = registry.register_producer(&handler, acme(Some(1.0)), false);

		assert!(matches!(result, Err(Error::DuplicateRegistration(_))));
	}

	#[rstest]
	fn test_second_default_rejected(handler: HandlerId) {
		let mut registry = Registry::new();
		registry.register_producer(&handler, ContentType::json(), true).unwrap();

		let result = registry.register_producer(&handler, acme(None), true);

		assert!(matches!(result, Err(Error::DuplicateRegistration(_))));
		assert!(!registry.capabilities(&handler).unwrap().produces(&acme(None)));
	}

	#[rstest]
	fn test_same_type_on_different_handlers(handler: HandlerId) {
		let mut registry = Registry::new();
		let other = HandlerId::new("other");

		registry.register_producer(&handler, ContentType::json(), true).unwrap();
		registry.register_producer(&other, ContentType::json(), true).unwrap();

		assert!(registry.capabilities(&other).is_some());
	}

	#[rstest]
	fn test_consumer_requires_model(handler: HandlerId) {
		let mut registry = Registry::new();

		let result = registry.register_consumer(&handler, ContentType::json(), None);

		assert!(matches!(result, Err(Error::MissingModel(_))));
	}

	#[rstest]
	fn test_duplicate_consumer_rejected(handler: HandlerId) {
		let mut registry = Registry::new();
		let model = Some(ModelType::of::<Document>());
		registry.register_consumer(&handler, acme(None), model).unwrap();

		let result = registry.register_consumer(&handler, acme(None), model);

		assert!(matches!(result, Err(Error::DuplicateRegistration(_))));
	}

	#[rstest]
	fn test_duplicate_implementation_rejected() {
		let mut registry = Registry::with_defaults();

		let result = registry.add_provider(Arc::new(JsonProvider::new()));
		let vendored = registry.add_provider(Arc::new(JsonProvider::for_content_type(acme(None))));

		assert!(matches!(result, Err(Error::DuplicateRegistration(_))));
		assert!(vendored.is_ok());
	}

	#[rstest]
	fn test_snapshot_exposes_both_indices(handler: HandlerId) {
		let mut registry = Registry::with_defaults();
		registry
			.register_consumer(&handler, ContentType::json(), Some(ModelType::of::<Document>()))
			.unwrap();

		let snapshot = registry.freeze();

		assert!(snapshot.provider(&ContentType::json()).is_some());
		assert!(snapshot.consumer(&ContentType::json()).is_some());
		assert!(snapshot.consumer(&acme(None)).is_none());
		let entry = snapshot
			.capabilities(&handler)
			.unwrap()
			.consumer_entry(&ContentType::json())
			.unwrap();
		assert!(entry.model.is::<Document>());
		assert_eq!(snapshot.handlers().count(), 1);
	}
}
