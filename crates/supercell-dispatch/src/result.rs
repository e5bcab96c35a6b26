//! What handlers return

use http::StatusCode;
use serde_json::{Map, Value};
use std::fmt;
use supercell_core::Model;

/// A status code with an optional JSON message, serialized without
/// negotiation.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use serde_json::json;
/// use supercell_dispatch::StatusResult;
///
/// let created = StatusResult::created(json!({"docid": 123}));
/// assert_eq!(created.code(), StatusCode::CREATED);
/// assert_eq!(created.to_json(), Some(json!({"ok": true, "docid": 123})));
///
/// let error = StatusResult::bad_request(json!({"number": ["not an integer"]}));
/// assert_eq!(error.to_json(), Some(json!({"error": true, "number": ["not an integer"]})));
///
/// assert_eq!(StatusResult::no_content().to_json(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResult {
	code: StatusCode,
	message: Option<Map<String, Value>>,
}

impl StatusResult {
	/// A result with an explicit code and message map.
	pub fn new(code: StatusCode, message: Option<Map<String, Value>>) -> Self {
		Self { code, message }
	}

	/// 200 with `{"ok": true, ...additional}`
	pub fn ok(additional: Value) -> Self {
		Self::flagged(StatusCode::OK, "ok", additional)
	}

	/// 201 with `{"ok": true, ...additional}`
	pub fn created(additional: Value) -> Self {
		Self::flagged(StatusCode::CREATED, "ok", additional)
	}

	/// 204 without a body
	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT, None)
	}

	/// `code` with `{"error": true, ...additional}`
	pub fn error(code: StatusCode, additional: Value) -> Self {
		Self::flagged(code, "error", additional)
	}

	/// 400 with `{"error": true, ...additional}`
	pub fn bad_request(additional: Value) -> Self {
		Self::error(StatusCode::BAD_REQUEST, additional)
	}

	/// Merges a flag with an object; non-object values land under `message`.
	fn flagged(code: StatusCode, flag: &str, additional: Value) -> Self {
		let mut message = Map::new();
		message.insert(flag.to_string(), Value::Bool(true));
		match additional {
			Value::Object(fields) => message.extend(fields),
			Value::Null => {}
			other => {
				message.insert("message".to_string(), other);
			}
		}
		Self::new(code, Some(message))
	}

	pub fn code(&self) -> StatusCode {
		self.code
	}

	pub fn message(&self) -> Option<&Map<String, Value>> {
		self.message.as_ref()
	}

	pub fn is_error(&self) -> bool {
		self.message
			.as_ref()
			.and_then(|m| m.get("error"))
			.is_some_and(|v| v == &Value::Bool(true))
	}

	/// The JSON body, or `None` when nothing is sent.
	pub fn to_json(&self) -> Option<Value> {
		if self.code == StatusCode::NO_CONTENT {
			return None;
		}
		self.message.clone().map(Value::Object)
	}
}

/// The value a handler resolves to.
pub enum DomainResult {
	/// A model, serialized by the negotiated provider
	Model(Box<dyn Model>),
	/// A status result, always serialized as JSON
	Status(StatusResult),
	/// Untyped JSON that never went through a model. The dispatcher refuses
	/// to serialize it and answers 500.
	Unstructured(Value),
}

impl DomainResult {
	pub fn model<M: Model>(model: M) -> Self {
		DomainResult::Model(Box::new(model))
	}

	pub fn kind(&self) -> &'static str {
		match self {
			DomainResult::Model(_) => "model",
			DomainResult::Status(_) => "status",
			DomainResult::Unstructured(_) => "unstructured",
		}
	}
}

impl From<StatusResult> for DomainResult {
	fn from(result: StatusResult) -> Self {
		DomainResult::Status(result)
	}
}

impl fmt::Debug for DomainResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DomainResult::Model(model) => f.debug_tuple("Model").field(&model.model_name()).finish(),
			DomainResult::Status(status) => f.debug_tuple("Status").field(status).finish(),
			DomainResult::Unstructured(value) => f.debug_tuple("Unstructured").field(value).finish(),
		}
	}
}
