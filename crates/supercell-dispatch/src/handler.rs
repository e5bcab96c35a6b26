//! Request handlers and the per-request context they work on

use crate::managed::ManagedObjects;
use crate::result::DomainResult;
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use supercell_core::{Error, Model, Result};
use supercell_http::Request;
use uuid::Uuid;

/// Verbs a handler may implement. Anything else is answered with 405.
pub const SUPPORTED_METHODS: [Method; 7] = [
	Method::GET,
	Method::HEAD,
	Method::POST,
	Method::PUT,
	Method::PATCH,
	Method::DELETE,
	Method::OPTIONS,
];

pub fn is_supported(method: &Method) -> bool {
	SUPPORTED_METHODS.contains(method)
}

/// A handler answers one route. Only the verbs it overrides are allowed;
/// the rest fail with [`Error::UnsupportedVerb`].
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::json;
/// use supercell_core::Result;
/// use supercell_dispatch::{DomainResult, HandlerContext, RequestHandler, StatusResult};
///
/// struct Ping;
///
/// #[async_trait]
/// impl RequestHandler for Ping {
///     async fn get(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
///         Ok(StatusResult::ok(json!({"pong": true})).into())
///     }
/// }
/// ```
#[async_trait]
pub trait RequestHandler: Send + Sync {
	async fn get(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Err(Error::UnsupportedVerb(Method::GET))
	}

	async fn head(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Err(Error::UnsupportedVerb(Method::HEAD))
	}

	async fn post(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Err(Error::UnsupportedVerb(Method::POST))
	}

	async fn put(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Err(Error::UnsupportedVerb(Method::PUT))
	}

	async fn patch(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Err(Error::UnsupportedVerb(Method::PATCH))
	}

	async fn delete(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Err(Error::UnsupportedVerb(Method::DELETE))
	}

	async fn options(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Err(Error::UnsupportedVerb(Method::OPTIONS))
	}
}

/// Routes `method` to the matching handler verb.
pub async fn invoke(
	handler: &dyn RequestHandler,
	method: &Method,
	ctx: &mut HandlerContext,
) -> Result<DomainResult> {
	match *method {
		Method::GET => handler.get(ctx).await,
		Method::HEAD => handler.head(ctx).await,
		Method::POST => handler.post(ctx).await,
		Method::PUT => handler.put(ctx).await,
		Method::PATCH => handler.patch(ctx).await,
		Method::DELETE => handler.delete(ctx).await,
		Method::OPTIONS => handler.options(ctx).await,
		_ => Err(Error::UnsupportedVerb(method.clone())),
	}
}

/// Everything a handler sees of one request: the request itself, the parsed
/// body model, typed query values, managed objects and the headers it wants
/// on the response.
pub struct HandlerContext {
	request: Request,
	request_id: Uuid,
	model: Option<Box<dyn Model>>,
	query: IndexMap<String, Value>,
	headers: HeaderMap,
	status: Option<StatusCode>,
	managed: Arc<ManagedObjects>,
}

impl HandlerContext {
	pub fn new(request: Request, managed: Arc<ManagedObjects>) -> Self {
		Self::with_request_id(request, managed, Uuid::new_v4())
	}

	pub(crate) fn with_request_id(request: Request, managed: Arc<ManagedObjects>, request_id: Uuid) -> Self {
		Self {
			request,
			request_id,
			model: None,
			query: IndexMap::new(),
			headers: HeaderMap::new(),
			status: None,
			managed,
		}
	}

	pub fn request(&self) -> &Request {
		&self.request
	}

	pub fn request_id(&self) -> Uuid {
		self.request_id
	}

	pub fn method(&self) -> &Method {
		&self.request.method
	}

	/// Positional route captures
	pub fn path_args(&self) -> &[String] {
		&self.request.path_args
	}

	/// A named route capture
	pub fn path_kwarg(&self, name: &str) -> Option<&str> {
		self.request.path_kwargs.get(name).map(String::as_str)
	}

	/// The parsed request body, when it is a `T`.
	pub fn model<T: Model>(&self) -> Option<&T> {
		self.model.as_deref()?.downcast_ref::<T>()
	}

	/// Takes the parsed request body out of the context. A model of another
	/// type stays in place.
	pub fn take_model<T: Model>(&mut self) -> Option<T> {
		if !self.model.as_deref()?.is::<T>() {
			return None;
		}
		self.model.take()?.downcast::<T>().map(|model| *model)
	}

	pub fn has_model(&self) -> bool {
		self.model.is_some()
	}

	pub(crate) fn set_model(&mut self, model: Box<dyn Model>) {
		self.model = Some(model);
	}

	/// A managed object registered on the environment.
	pub fn managed<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
		self.managed.get::<T>(name)
	}

	/// Typed query values collected by [`crate::QueryParams`]
	pub fn query(&self) -> &IndexMap<String, Value> {
		&self.query
	}

	pub fn set_query(&mut self, name: impl Into<String>, value: Value) {
		self.query.insert(name.into(), value);
	}

	/// Adds a header to the response. Ignored when the request is rejected.
	pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
		let name = HeaderName::from_bytes(name.as_bytes())
			.map_err(|e| Error::Internal(format!("invalid header name `{name}`: {e}")))?;
		let value = HeaderValue::from_str(value)
			.map_err(|e| Error::Internal(format!("invalid value for header `{name}`: {e}")))?;
		self.headers.insert(name, value);
		Ok(())
	}

	pub(crate) fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
		self.headers.insert(name, value);
	}

	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	pub(crate) fn take_headers(&mut self) -> HeaderMap {
		std::mem::take(&mut self.headers)
	}

	/// Overrides the status of a model response; 200 otherwise.
	pub fn set_status(&mut self, status: StatusCode) {
		self.status = Some(status);
	}

	pub fn status(&self) -> Option<StatusCode> {
		self.status
	}
}
