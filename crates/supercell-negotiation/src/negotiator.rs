//! Provider and consumer selection
//!
//! Selection is exact: a candidate is served only when its
//! `(base, vendor, version)` triple is registered for the handler and an
//! implementation is installed for it. Candidates are tried in header order;
//! there is no closest-match step. When nothing matches, producers fall back
//! to the handler's default content type.

use crate::consumer::Consumer;
use crate::provider::Provider;
use crate::registry::{HandlerId, RegistrySnapshot};
use std::sync::Arc;
use supercell_core::{AcceptCandidate, Error, ModelType, Result, parse_accept_header};

/// Chooses providers and consumers against a frozen registry.
#[derive(Debug, Clone, Copy)]
pub struct Negotiator<'a> {
	registry: &'a RegistrySnapshot,
}

impl<'a> Negotiator<'a> {
	pub fn new(registry: &'a RegistrySnapshot) -> Self {
		Self { registry }
	}

	/// Selects the provider for a raw `Accept` header value.
	pub fn provider_for_accept(&self, handler: &HandlerId, accept: &str) -> Result<Arc<dyn Provider>> {
		self.select_provider(handler, &parse_accept_header(accept))
	}

	/// Selects the consumer for a raw `Content-Type` header value.
	pub fn consumer_for_content_type(
		&self,
		handler: &HandlerId,
		content_type: &str,
	) -> Result<(Arc<dyn Consumer>, ModelType)> {
		self.select_consumer(handler, &parse_accept_header(content_type))
	}

	/// Walks the candidates in priority order and returns the first provider
	/// whose exact content type the handler registered. Falls back to the
	/// handler's default, then fails with [`Error::NoProviderFound`].
	pub fn select_provider(
		&self,
		handler: &HandlerId,
		candidates: &[AcceptCandidate],
	) -> Result<Arc<dyn Provider>> {
		let capabilities = self
			.registry
			.capabilities(handler)
			.ok_or(Error::NoProviderFound)?;

		for candidate in candidates {
			if !capabilities.has_producer_base(&candidate.base) {
				continue;
			}
			let Ok(target) = candidate.target_content_type() else {
				continue;
			};
			if !capabilities.produces(&target) {
				continue;
			}
			match self.registry.provider(&target) {
				Some(provider) => return Ok(provider.clone()),
				None => {
					tracing::debug!(handler = %handler, content_type = %target, "no provider implementation");
				}
			}
		}

		if let Some(default) = capabilities.default_producer()
			&& let Some(provider) = self.registry.provider(default)
		{
			return Ok(provider.clone());
		}

		tracing::debug!(handler = %handler, "no provider found");
		Err(Error::NoProviderFound)
	}

	/// Resolves the consumer for the best candidate only, returning it with
	/// the model type the handler declared for that content type.
	pub fn select_consumer(
		&self,
		handler: &HandlerId,
		candidates: &[AcceptCandidate],
	) -> Result<(Arc<dyn Consumer>, ModelType)> {
		let capabilities = self
			.registry
			.capabilities(handler)
			.ok_or(Error::NoConsumerFound)?;
		let candidate = candidates.first().ok_or(Error::NoConsumerFound)?;

		if !capabilities.has_consumer_base(&candidate.base) {
			tracing::debug!(handler = %handler, base = %candidate.base, "content type not consumed");
			return Err(Error::NoConsumerFound);
		}
		let target = candidate
			.target_content_type()
			.map_err(|_| Error::NoConsumerFound)?;
		let entry = capabilities
			.consumer_entry(&target)
			.ok_or(Error::NoConsumerFound)?;
		let consumer = self
			.registry
			.consumer(&target)
			.ok_or(Error::NoConsumerFound)?;

		Ok((consumer.clone(), entry.model))
	}
}
