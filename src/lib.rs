//! # Supercell
//!
//! Content negotiation and request dispatch for typed HTTP APIs.
//!
//! Handlers declare the content types they produce and consume, including
//! vendored and versioned ones such as `application/vnd.acme-v1.1+json`.
//! For every request the dispatcher picks the consumer matching
//! `Content-Type`, parses and validates the body into the declared model,
//! runs the handler, and serializes its result with the provider matching
//! `Accept`. Requests nothing can serve are answered with 406.
//!
//! ## Crates
//!
//! - [`core`]: content types, `Accept` parsing, the model contract, errors
//! - [`http`]: request and response types
//! - [`negotiation`]: providers, consumers, the registry and the negotiator
//! - [`dispatch`]: handlers, routes, middleware, the dispatcher and health checks
//! - [`conf`]: settings and logging
//!
//! ## Quick Example
//!
//! ```
//! use supercell::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Serialize, Deserialize, Validate)]
//! struct Saying {
//!     id: u64,
//!     content: String,
//! }
//!
//! struct Sayings;
//!
//! #[async_trait]
//! impl RequestHandler for Sayings {
//!     async fn get(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
//!         Ok(DomainResult::model(Saying { id: 1, content: "Hello, World!".into() }))
//!     }
//!
//!     async fn post(&self, ctx: &mut HandlerContext) -> Result<DomainResult> {
//!         let saying = ctx.take_model::<Saying>().ok_or(Error::NoConsumerFound)?;
//!         Ok(StatusResult::created(json!({"docid": saying.id})).into())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let v1 = ContentType::json().with_vendor("acme").with_version(1.0).unwrap();
//!
//! let mut environment = Environment::new(DispatchSettings::default());
//! environment.add_provider(Arc::new(JsonProvider::for_content_type(v1.clone()))).unwrap();
//! environment.add_handler(
//!     "/sayings",
//!     Arc::new(Sayings),
//!     RouteConfig::builder()
//!         .provides_default(ContentType::json())
//!         .provides(v1)
//!         .consumes(ContentType::json(), ModelType::of::<Saying>())
//!         .build(),
//! ).unwrap();
//! let application = environment.finalize().unwrap();
//!
//! let request = Request::builder()
//!     .uri("/sayings")
//!     .header("accept", "application/vnd.acme-v1.0+json")
//!     .build()
//!     .unwrap();
//! let response = application.handle(request).await;
//!
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.headers()["content-type"], "application/vnd.acme-v1.0+json");
//! # });
//! ```

pub use supercell_core as core;
pub use supercell_dispatch as dispatch;
pub use supercell_http as http;
pub use supercell_negotiation as negotiation;
pub use supercell_conf as conf;

pub use supercell_core::{
	AcceptCandidate, ContentType, Error, MediaType, Model, ModelType, Result, ValidationErrors,
	Version, parse_accept_header,
};
pub use supercell_dispatch::{
	Application, CacheConfig, DispatchOutcome, DispatchSettings, Dispatcher, DomainResult,
	Environment, Flow, HandlerContext, HealthCheck, Middleware, QueryParam, QueryParams,
	RequestHandler, RouteConfig, StatusResult,
};
pub use supercell_http::{Request, Response};
pub use supercell_negotiation::{Consumer, JsonConsumer, JsonProvider, Negotiator, Provider, Registry};
pub use supercell_conf::{Settings, init_logging};

/// Everything a service module usually needs.
pub mod prelude {
	pub use crate::{
		Application, CacheConfig, Consumer, ContentType, DispatchSettings, DomainResult, Environment,
		Error, Flow, HandlerContext, HealthCheck, JsonConsumer, JsonProvider, Middleware, Model,
		ModelType, Provider, QueryParam, QueryParams, Request, RequestHandler, Response, Result,
		RouteConfig, Settings, StatusResult, init_logging,
	};

	// External
	pub use ::http::{Method, StatusCode};
	pub use async_trait::async_trait;
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::json;
	pub use validator::Validate;
}
