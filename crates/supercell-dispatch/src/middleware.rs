//! Before/after hooks around a handler invocation

use crate::handler::{HandlerContext, RequestHandler, invoke};
use crate::result::DomainResult;
use async_trait::async_trait;
use http::Method;
use std::fmt;
use std::sync::Arc;
use supercell_core::Result;

/// What a hook wants the chain to do next.
#[derive(Debug)]
pub enum Flow {
	/// Keep going
	Continue,
	/// From `before`: skip the handler and everything further in.
	/// From `after`: replace the result.
	Return(DomainResult),
}

/// A hook pair wrapped around a handler.
///
/// `before` hooks run in registration order; a [`Flow::Return`] stops the
/// chain there. `after` hooks then run in reverse order for every middleware
/// whose `before` let the request through. Errors from either hook are
/// handled exactly like handler errors.
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn before(&self, _ctx: &mut HandlerContext) -> Result<Flow> {
		Ok(Flow::Continue)
	}

	async fn after(&self, _ctx: &mut HandlerContext, _result: &DomainResult) -> Result<Flow> {
		Ok(Flow::Continue)
	}
}

/// Ordered middleware of one route.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a middleware; the first added is the outermost.
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.middlewares.push(middleware);
	}

	pub fn len(&self) -> usize {
		self.middlewares.len()
	}

	pub fn is_empty(&self) -> bool {
		self.middlewares.is_empty()
	}

	/// Runs the hooks around `handler` for `method`.
	pub async fn run(
		&self,
		handler: &dyn RequestHandler,
		method: &Method,
		ctx: &mut HandlerContext,
	) -> Result<DomainResult> {
		let mut entered = 0;
		let mut short_circuit = None;

		for middleware in &self.middlewares {
			match middleware.before(ctx).await? {
				Flow::Continue => entered += 1,
				Flow::Return(result) => {
					tracing::debug!(position = entered, "middleware returned early");
					short_circuit = Some(result);
					break;
				}
			}
		}

		let mut result = match short_circuit {
			Some(result) => result,
			None => invoke(handler, method, ctx).await?,
		};

		for middleware in self.middlewares[..entered].iter().rev() {
			if let Flow::Return(replacement) = middleware.after(ctx, &result).await? {
				result = replacement;
			}
		}

		Ok(result)
	}
}

impl fmt::Debug for MiddlewareChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MiddlewareChain")
			.field("len", &self.middlewares.len())
			.finish()
	}
}
