//! The per-request pipeline
//!
//! For one matched route the dispatcher
//!
//! 1. rejects verbs outside [`SUPPORTED_METHODS`](crate::handler::SUPPORTED_METHODS) with 405,
//! 2. on POST and PUT with a body type, negotiates a consumer and parses the
//!    body into the declared model (406 when nothing consumes it, 400 when
//!    parsing or validation fails),
//! 3. on GET and HEAD, adds the route's `Cache-Control` and `Expires`,
//! 4. runs the middleware chain and the handler,
//! 5. serializes the result: status results as JSON, models through the
//!    provider negotiated from `Accept` (406 when none matches),
//! 6. finishes the response exactly once.
//!
//! Errors anywhere short-circuit to a JSON error response with the error's
//! status. Handler panics become 500. When the client goes away before the
//! response is finished, nothing is written.

use crate::cache::expires_header;
use crate::handler::{HandlerContext, is_supported};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::managed::ManagedObjects;
use crate::result::DomainResult;
use crate::route::Route;
use chrono::Utc;
use futures::FutureExt;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES};
use http::{HeaderValue, Method, StatusCode};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use supercell_conf::DispatchSettings;
use supercell_core::{Error, NON_FIELD_ERRORS, Result, ValidationErrors};
use supercell_http::{Request, Response};
use supercell_negotiation::{Negotiator, RegistrySnapshot};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// How a dispatched request ended
#[derive(Debug)]
pub enum DispatchOutcome {
	/// A finished response and the lifecycle states it went through
	Completed {
		response: Response,
		trail: Vec<LifecycleState>,
	},
	/// The client went away; nothing was written
	Abandoned,
}

impl DispatchOutcome {
	pub fn response(&self) -> Option<&Response> {
		match self {
			DispatchOutcome::Completed { response, .. } => Some(response),
			DispatchOutcome::Abandoned => None,
		}
	}

	pub fn into_response(self) -> Option<Response> {
		match self {
			DispatchOutcome::Completed { response, .. } => Some(response),
			DispatchOutcome::Abandoned => None,
		}
	}

	pub fn final_state(&self) -> Option<LifecycleState> {
		match self {
			DispatchOutcome::Completed { trail, .. } => trail.last().copied(),
			DispatchOutcome::Abandoned => None,
		}
	}
}

/// Runs matched requests against a frozen registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
	registry: Arc<RegistrySnapshot>,
	settings: Arc<DispatchSettings>,
	managed: Arc<ManagedObjects>,
}

impl Dispatcher {
	pub fn new(
		registry: Arc<RegistrySnapshot>,
		settings: Arc<DispatchSettings>,
		managed: Arc<ManagedObjects>,
	) -> Self {
		Self {
			registry,
			settings,
			managed,
		}
	}

	pub fn registry(&self) -> &Arc<RegistrySnapshot> {
		&self.registry
	}

	pub fn settings(&self) -> &DispatchSettings {
		&self.settings
	}

	/// Dispatches a request that cannot be cancelled.
	pub async fn dispatch(&self, route: &Route, request: Request) -> Response {
		match self
			.dispatch_cancellable(route, request, CancellationToken::new())
			.await
		{
			DispatchOutcome::Completed { response, .. } => response,
			DispatchOutcome::Abandoned => Response::internal_server_error(),
		}
	}

	/// Dispatches a request, giving up without writing anything once
	/// `cancel` fires.
	pub async fn dispatch_cancellable(
		&self,
		route: &Route,
		request: Request,
		cancel: CancellationToken,
	) -> DispatchOutcome {
		let request_id = Uuid::new_v4();
		let span = tracing::info_span!(
			"request",
			%request_id,
			method = %request.method,
			path = %request.path(),
			route = %route.id(),
		);
		self.run(route, request, request_id, cancel)
			.instrument(span)
			.await
	}

	async fn run(
		&self,
		route: &Route,
		request: Request,
		request_id: Uuid,
		cancel: CancellationToken,
	) -> DispatchOutcome {
		let mut lifecycle = Lifecycle::new();
		let method = request.method.clone();

		if !is_supported(&method) {
			return self.reject(lifecycle, &method, Error::UnsupportedVerb(method.clone()));
		}

		let mut ctx = HandlerContext::with_request_id(request, self.managed.clone(), request_id);
		let negotiator = Negotiator::new(&self.registry);

		if let Err(error) = self.consume_body(route, &negotiator, &mut ctx, &mut lifecycle) {
			return self.reject(lifecycle, &method, error);
		}

		if method == Method::GET || method == Method::HEAD {
			apply_cache_headers(route, &mut ctx);
		}

		if let Err(error) = lifecycle.advance(LifecycleState::HandlerInvoked) {
			return self.reject(lifecycle, &method, error);
		}

		let invocation = AssertUnwindSafe(route.config().middleware().run(
			route.handler().as_ref(),
			&method,
			&mut ctx,
		))
		.catch_unwind();

		let outcome = tokio::select! {
			biased;
			_ = cancel.cancelled() => {
				tracing::debug!("client went away, abandoning request");
				return DispatchOutcome::Abandoned;
			}
			outcome = invocation => outcome,
		};

		let result = match outcome {
			Ok(Ok(result)) => result,
			Ok(Err(error)) => return self.reject(lifecycle, &method, error),
			Err(panic) => {
				let message = panic_message(panic.as_ref());
				tracing::error!(panic = %message, "handler panicked");
				return self.reject(lifecycle, &method, Error::Internal(format!("handler panicked: {message}")));
			}
		};

		if cancel.is_cancelled() {
			tracing::debug!("client went away, abandoning request");
			return DispatchOutcome::Abandoned;
		}

		match self.render(route, &negotiator, &mut ctx, &mut lifecycle, &method, result) {
			Ok(response) => DispatchOutcome::Completed {
				response,
				trail: lifecycle.into_trail(),
			},
			Err(error) => self.reject(lifecycle, &method, error),
		}
	}

	/// Parses the body of POST and PUT requests that carry a `Content-Type`.
	fn consume_body(
		&self,
		route: &Route,
		negotiator: &Negotiator<'_>,
		ctx: &mut HandlerContext,
		lifecycle: &mut Lifecycle,
	) -> Result<()> {
		let method = ctx.method();
		if *method != Method::POST && *method != Method::PUT {
			return Ok(());
		}
		let Some(content_type) = ctx.request().content_type() else {
			return Ok(());
		};

		let (consumer, model_type) = negotiator.consumer_for_content_type(route.id(), content_type)?;
		let model = consumer
			.consume(&ctx.request().body, &model_type)
			.map_err(|error| match error {
				Error::Validation(errors) => Error::Validation(errors),
				other => Error::Validation(ValidationErrors::single(NON_FIELD_ERRORS, other.to_string())),
			})?;

		tracing::debug!(model = model_type.name(), "request body consumed");
		ctx.set_model(model);
		lifecycle.advance(LifecycleState::ConsumerResolved)
	}

	fn render(
		&self,
		route: &Route,
		negotiator: &Negotiator<'_>,
		ctx: &mut HandlerContext,
		lifecycle: &mut Lifecycle,
		method: &Method,
		result: DomainResult,
	) -> Result<Response> {
		let mut response = Response::new(StatusCode::OK);
		response.extend_headers(ctx.take_headers())?;

		match result {
			DomainResult::Status(status) => {
				lifecycle.advance(LifecycleState::Serialized)?;
				response.set_status(status.code())?;
				if let Some(body) = status.to_json() {
					response.write_json(&body)?;
				}
			}
			DomainResult::Model(model) => {
				let provider = negotiator.provider_for_accept(route.id(), ctx.request().accept())?;
				lifecycle.advance(LifecycleState::ProducerResolved)?;

				let body = provider.provide(model.as_ref())?;
				lifecycle.advance(LifecycleState::Serialized)?;

				let content_type = HeaderValue::from_str(&provider.media_type())
					.map_err(|e| Error::Internal(format!("invalid media type: {e}")))?;
				response.set_status(ctx.status().unwrap_or(StatusCode::OK))?;
				response.set_header(CONTENT_TYPE, content_type)?;
				response.write(body)?;
			}
			DomainResult::Unstructured(_) => {
				tracing::error!("handler returned a value that is neither a model nor a status result");
				return Err(Error::UnhandledHandlerResult(
					"expected a model or a status result".to_string(),
				));
			}
		}

		if *method == Method::HEAD {
			response.strip_body()?;
		}
		response.finish()?;
		lifecycle.advance(LifecycleState::Finished)?;
		Ok(response)
	}

	/// Writes the error response and ends the lifecycle in `Rejected`.
	fn reject(&self, mut lifecycle: Lifecycle, method: &Method, error: Error) -> DispatchOutcome {
		let status = error.status_code();
		if status.is_server_error() {
			tracing::error!(%status, error = %error, "request failed");
		} else {
			tracing::info!(%status, error = %error, "request rejected");
		}

		let mut response = if status.is_server_error() && self.settings.debug {
			Response::error(status, &error.to_string())
		} else {
			Response::from(error)
		};
		if *method == Method::HEAD
			&& let Err(e) = response.strip_body()
		{
			tracing::warn!(error = %e, "could not strip body");
		}
		if let Err(e) = response.finish() {
			tracing::warn!(error = %e, "error response finished twice");
		}
		if let Err(e) = lifecycle.reject(status) {
			tracing::warn!(error = %e, "rejected after a terminal state");
		}

		DispatchOutcome::Completed {
			response,
			trail: lifecycle.into_trail(),
		}
	}
}

fn apply_cache_headers(route: &Route, ctx: &mut HandlerContext) {
	if let Some(cache) = route.config().cache()
		&& let Ok(value) = HeaderValue::from_str(&cache.header_value())
	{
		ctx.insert_header(CACHE_CONTROL, value);
	}
	if let Some(expires) = route.config().expires()
		&& let Ok(value) = HeaderValue::from_str(&expires_header(Utc::now(), expires))
	{
		ctx.insert_header(EXPIRES, value);
	}
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
	if let Some(message) = panic.downcast_ref::<&str>() {
		message.to_string()
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic".to_string()
	}
}
