//! Application assembly
//!
//! An [`Environment`] collects providers, consumers, routes, managed objects
//! and health checks. [`Environment::finalize`] consumes it, freezes the
//! registry and returns the [`Application`] that serves requests. Nothing
//! can be registered afterwards.

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::handler::RequestHandler;
use crate::health::{SYSTEM_CHECK_PATH, SystemHealthCheck, check_path};
use crate::managed::ManagedObjects;
use crate::route::{Route, RouteConfig};
use http::header::HOST;
use http::{Method, StatusCode};
use std::any::Any;
use std::sync::Arc;
use supercell_conf::DispatchSettings;
use supercell_core::{ContentType, Error, Result};
use supercell_http::{Request, Response};
use supercell_negotiation::{Consumer, Provider, Registry};
use tokio_util::sync::CancellationToken;

/// Configuration phase of an application.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use http::StatusCode;
/// use serde_json::json;
/// use std::sync::Arc;
/// use supercell_conf::DispatchSettings;
/// use supercell_core::Result;
/// use supercell_dispatch::{DomainResult, Environment, HandlerContext, RequestHandler, RouteConfig, StatusResult};
/// use supercell_http::Request;
///
/// struct Hello;
///
/// #[async_trait]
/// impl RequestHandler for Hello {
///     async fn get(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
///         Ok(StatusResult::ok(json!({"hello": "world"})).into())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let mut environment = Environment::new(DispatchSettings::default());
/// environment.add_handler("/hello", Arc::new(Hello), RouteConfig::default()).unwrap();
/// let application = environment.finalize().unwrap();
///
/// let request = Request::builder().uri("/hello").build().unwrap();
/// let response = application.handle(request).await;
/// assert_eq!(response.status(), StatusCode::OK);
///
/// let request = Request::builder().uri("/missing").build().unwrap();
/// assert_eq!(application.handle(request).await.status(), StatusCode::NOT_FOUND);
/// # });
/// ```
pub struct Environment {
	registry: Registry,
	routes: Vec<Route>,
	managed: ManagedObjects,
	health_checks: Vec<(String, Arc<dyn RequestHandler>)>,
	settings: DispatchSettings,
}

impl Environment {
	/// An environment with the plain JSON provider and consumer installed.
	pub fn new(settings: DispatchSettings) -> Self {
		Self::with_registry(Registry::with_defaults(), settings)
	}

	pub fn with_registry(registry: Registry, settings: DispatchSettings) -> Self {
		Self {
			registry,
			routes: Vec::new(),
			managed: ManagedObjects::new(),
			health_checks: Vec::new(),
			settings,
		}
	}

	pub fn add_provider(&mut self, provider: Arc<dyn Provider>) -> Result<()> {
		self.registry.add_provider(provider)
	}

	pub fn add_consumer(&mut self, consumer: Arc<dyn Consumer>) -> Result<()> {
		self.registry.add_consumer(consumer)
	}

	/// Adds a route. Its produced and consumed content types are registered
	/// under the route's id, so duplicates fail here.
	pub fn add_handler(
		&mut self,
		path: &str,
		handler: Arc<dyn RequestHandler>,
		config: RouteConfig,
	) -> Result<()> {
		let route = Route::new(path, handler, config)?;
		if self.routes.iter().any(|r| r.id() == route.id()) {
			return Err(Error::DuplicateRegistration(format!("route `{}`", route.id())));
		}

		for (content_type, is_default) in route.config().producers() {
			self.registry
				.register_producer(route.id(), content_type.clone(), *is_default)?;
		}
		for (content_type, model) in route.config().consumers() {
			self.registry
				.register_consumer(route.id(), content_type.clone(), *model)?;
		}

		tracing::debug!(route = %route.id(), path, "handler added");
		self.routes.push(route);
		Ok(())
	}

	/// Shares `value` with every handler under `name`.
	pub fn add_managed_object<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) -> Result<()> {
		self.managed.insert(name, value)
	}

	/// Serves `handler` under `/_system/check/<name>`.
	pub fn add_health_check(&mut self, name: impl Into<String>, handler: Arc<dyn RequestHandler>) -> Result<()> {
		let name = name.into();
		if self.health_checks.iter().any(|(existing, _)| *existing == name) {
			return Err(Error::DuplicateRegistration(format!("health check `{name}`")));
		}
		self.health_checks.push((name, handler));
		Ok(())
	}

	/// Freezes the registry and builds the application.
	pub fn finalize(mut self) -> Result<Application> {
		let health_config = || {
			RouteConfig::builder()
				.provides_default(ContentType::json())
				.build()
		};

		self.add_handler(SYSTEM_CHECK_PATH, Arc::new(SystemHealthCheck), health_config())?;
		for (name, handler) in std::mem::take(&mut self.health_checks) {
			self.add_handler(&check_path(&regex::escape(&name)), handler, health_config())?;
		}

		let registry = self.registry.freeze();
		let dispatcher = Dispatcher::new(registry, Arc::new(self.settings), Arc::new(self.managed));
		tracing::info!(routes = self.routes.len(), "application ready");

		Ok(Application {
			routes: self.routes,
			dispatcher,
		})
	}
}

/// A finalized, read-only application.
pub struct Application {
	routes: Vec<Route>,
	dispatcher: Dispatcher,
}

impl Application {
	pub fn routes(&self) -> &[Route] {
		&self.routes
	}

	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	/// Finds the first route matching the request, storing its captures on
	/// the request.
	pub fn resolve(&self, request: &mut Request) -> Option<&Route> {
		let host = request.header(HOST.as_str()).map(str::to_owned);
		let path = request.path().to_owned();

		self.routes.iter().find_map(|route| {
			let captures = route.matches(host.as_deref(), &path)?;
			request.set_path_captures(captures.args, captures.kwargs);
			Some(route)
		})
	}

	/// Serves one request; 404 when no route matches.
	pub async fn handle(&self, request: Request) -> Response {
		match self.handle_cancellable(request, CancellationToken::new()).await {
			DispatchOutcome::Completed { response, .. } => response,
			DispatchOutcome::Abandoned => Response::internal_server_error(),
		}
	}

	pub async fn handle_cancellable(&self, mut request: Request, cancel: CancellationToken) -> DispatchOutcome {
		let Some(route) = self.resolve(&mut request) else {
			tracing::info!(method = %request.method, path = %request.path(), "no route matched");
			let mut response = if request.method == Method::HEAD {
				Response::not_found()
			} else {
				Response::from(Error::http(StatusCode::NOT_FOUND, "Not Found"))
			};
			if let Err(e) = response.finish() {
				tracing::warn!(error = %e, "not-found response finished twice");
			}
			return DispatchOutcome::Completed {
				response,
				trail: Vec::new(),
			};
		};
		self.dispatcher
			.dispatch_cancellable(route, request, cancel)
			.await
	}
}
