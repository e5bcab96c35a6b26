//! # Supercell Dispatch
//!
//! The request lifecycle around a handler: route matching, body
//! consumption, middleware, result serialization through the negotiated
//! provider, cache headers and health checks.
//!
//! Build an [`Environment`], add handlers with their [`RouteConfig`], then
//! [`finalize`](Environment::finalize) it into an [`Application`] and hand
//! it requests.

pub mod cache;
pub mod dispatcher;
pub mod environment;
pub mod handler;
pub mod health;
pub mod lifecycle;
pub mod managed;
pub mod middleware;
pub mod query;
pub mod result;
pub mod route;

pub use cache::{CacheConfig, compute_cache_header, expires_header};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use environment::{Application, Environment};
pub use handler::{HandlerContext, RequestHandler, SUPPORTED_METHODS};
pub use health::{HealthCheck, SYSTEM_CHECK_PATH, SystemHealthCheck};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use managed::ManagedObjects;
pub use middleware::{Flow, Middleware, MiddlewareChain};
pub use query::{ParamKind, QueryParam, QueryParams};
pub use result::{DomainResult, StatusResult};
pub use route::{Route, RouteConfig, RouteConfigBuilder, RouteMatch};
pub use supercell_conf::DispatchSettings;
