//! Typed query parameters

use crate::handler::HandlerContext;
use crate::middleware::{Flow, Middleware};
use crate::result::StatusResult;
use async_trait::async_trait;
use serde_json::{Number, Value, json};
use supercell_core::{Result, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
	Integer,
	Float,
	Boolean,
	Text,
}

impl ParamKind {
	/// Converts a raw query value, or explains why it can't.
	pub fn parse(&self, raw: &str) -> std::result::Result<Value, String> {
		match self {
			ParamKind::Integer => raw
				.trim()
				.parse::<i64>()
				.map(Value::from)
				.map_err(|_| format!("Value '{raw}' is not int.")),
			ParamKind::Float => raw
				.trim()
				.parse::<f64>()
				.ok()
				.and_then(Number::from_f64)
				.map(Value::Number)
				.ok_or_else(|| format!("Value '{raw}' is not float.")),
			ParamKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
				"1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
				"0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
				_ => Err(format!("Value '{raw}' is not bool.")),
			},
			ParamKind::Text => Ok(Value::String(raw.to_string())),
		}
	}
}

/// One declared query parameter
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
	name: String,
	kind: ParamKind,
	required: bool,
	default: Option<Value>,
}

impl QueryParam {
	pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
		Self {
			name: name.into(),
			kind,
			required: false,
			default: None,
		}
	}

	pub fn integer(name: impl Into<String>) -> Self {
		Self::new(name, ParamKind::Integer)
	}

	pub fn float(name: impl Into<String>) -> Self {
		Self::new(name, ParamKind::Float)
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		Self::new(name, ParamKind::Boolean)
	}

	pub fn text(name: impl Into<String>) -> Self {
		Self::new(name, ParamKind::Text)
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	/// Value stored when the parameter is absent
	pub fn with_default(mut self, default: Value) -> Self {
		self.default = Some(default);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

/// Middleware parsing declared query parameters into
/// [`HandlerContext::query`].
///
/// Empty values count as absent. The first invalid or missing required
/// parameter answers 400 without reaching the handler.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use supercell_dispatch::{QueryParam, QueryParams, RouteConfig};
///
/// let config = RouteConfig::builder()
///     .middleware(Arc::new(QueryParams::new([
///         QueryParam::integer("limit").with_default(json!(10)),
///         QueryParam::text("q").required(),
///     ])))
///     .build();
///
/// assert_eq!(config.middleware().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct QueryParams {
	params: Vec<QueryParam>,
}

impl QueryParams {
	pub fn new(params: impl IntoIterator<Item = QueryParam>) -> Self {
		Self {
			params: params.into_iter().collect(),
		}
	}
}

#[async_trait]
impl Middleware for QueryParams {
	async fn before(&self, ctx: &mut HandlerContext) -> Result<Flow> {
		for param in &self.params {
			let raw = ctx
				.request()
				.argument(&param.name)
				.filter(|value| !value.is_empty());

			match raw {
				Some(raw) => match param.kind.parse(&raw) {
					Ok(value) => ctx.set_query(param.name.clone(), value),
					Err(message) => {
						let errors = ValidationErrors::single(param.name.clone(), message);
						let body = Value::Object(errors.to_json_map());
						return Ok(Flow::Return(StatusResult::bad_request(body).into()));
					}
				},
				None if param.required => {
					let body = json!({"msg": format!("Missing required argument \"{}\"", param.name)});
					return Ok(Flow::Return(StatusResult::bad_request(body).into()));
				}
				None => {
					if let Some(default) = &param.default {
						ctx.set_query(param.name.clone(), default.clone());
					}
				}
			}
		}
		Ok(Flow::Continue)
	}
}
