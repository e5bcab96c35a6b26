//! # Supercell Negotiation
//!
//! Content negotiation between a request's `Accept`/`Content-Type` headers
//! and what a handler registered.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use supercell_core::ContentType;
//! use supercell_negotiation::{HandlerId, JsonProvider, Negotiator, Registry};
//!
//! let acme_v1 = ContentType::json().with_vendor("acme").with_version(1.0).unwrap();
//!
//! let mut registry = Registry::with_defaults();
//! registry.add_provider(Arc::new(JsonProvider::for_content_type(acme_v1.clone()))).unwrap();
//!
//! let handler = HandlerId::new("sayings");
//! registry.register_producer(&handler, ContentType::json(), true).unwrap();
//! registry.register_producer(&handler, acme_v1.clone(), false).unwrap();
//! let snapshot = registry.freeze();
//!
//! let negotiator = Negotiator::new(&snapshot);
//! let provider = negotiator
//!     .provider_for_accept(&handler, "application/vnd.acme-v1.0+json")
//!     .unwrap();
//! assert_eq!(provider.content_type(), &acme_v1);
//!
//! // No Accept header: the default wins
//! let provider = negotiator.provider_for_accept(&handler, "").unwrap();
//! assert_eq!(provider.content_type(), &ContentType::json());
//! ```

pub mod consumer;
pub mod negotiator;
pub mod provider;
pub mod registry;

pub use consumer::{Consumer, JsonConsumer};
pub use negotiator::Negotiator;
pub use provider::{JsonProvider, Provider};
pub use registry::{
	Capabilities, ConsumerEntry, HandlerId, ProducerEntry, Registry, RegistrySnapshot,
};
