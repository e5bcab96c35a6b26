//! Error types shared by the supercell crates.

use http::{Method, StatusCode};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Key under which errors that belong to no single field are collected.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Errors raised while negotiating, dispatching or configuring routes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// A version qualifier that is not a finite, non-negative number
	#[error("Invalid version: {0}")]
	InvalidVersion(String),

	/// A content type string that cannot be interpreted
	#[error("Invalid content type: {0}")]
	InvalidContentType(String),

	/// No registered producer satisfies the `Accept` header
	#[error("No provider found")]
	NoProviderFound,

	/// No registered consumer matches the `Content-Type` header
	#[error("No consumer found")]
	NoConsumerFound,

	/// The same content type, default or name was registered twice
	#[error("Duplicate registration: {0}")]
	DuplicateRegistration(String),

	/// A consumer was registered without a model type
	#[error("Missing model for consumer of {0}")]
	MissingModel(String),

	/// A route pattern that does not compile
	#[error("Invalid route: {0}")]
	InvalidRoute(String),

	/// The request body could not be turned into the declared model
	#[error("Validation failed: {0}")]
	Validation(ValidationErrors),

	/// The handler does not implement the requested verb
	#[error("Unsupported verb: {0}")]
	UnsupportedVerb(Method),

	/// The handler returned a value that is neither a model nor a status result
	#[error("Unhandled handler result: {0}")]
	UnhandledHandlerResult(String),

	/// An error carrying an explicit HTTP status
	#[error("HTTP {status}: {reason}")]
	Http { status: StatusCode, reason: String },

	/// Model serialization failed
	#[error("Serialization error: {0}")]
	Serialization(String),

	/// A second `finish` on the same response
	#[error("Response already finished")]
	AlreadyFinished,

	/// Any other failure
	#[error("Internal error: {0}")]
	Internal(String),
}

impl Error {
	/// Builds an error that short-circuits to the given status.
	///
	/// # Examples
	///
	/// ```
	/// use supercell_core::Error;
	/// use http::StatusCode;
	///
	/// let error = Error::http(StatusCode::CONFLICT, "document exists");
	/// assert_eq!(error.status_code(), StatusCode::CONFLICT);
	/// ```
	pub fn http(status: StatusCode, reason: impl Into<String>) -> Self {
		Self::Http {
			status,
			reason: reason.into(),
		}
	}

	/// HTTP status this error translates to when it reaches the dispatcher.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Error::NoProviderFound | Error::NoConsumerFound => StatusCode::NOT_ACCEPTABLE,
			Error::Validation(_) => StatusCode::BAD_REQUEST,
			Error::UnsupportedVerb(_) => StatusCode::METHOD_NOT_ALLOWED,
			Error::Http { status, .. } => *status,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// True for errors that can only come out of route setup.
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			Error::DuplicateRegistration(_) | Error::MissingModel(_) | Error::InvalidRoute(_)
		)
	}
}

impl From<ValidationErrors> for Error {
	fn from(errors: ValidationErrors) -> Self {
		Error::Validation(errors)
	}
}

impl From<serde_json::Error> for Error {
	fn from(error: serde_json::Error) -> Self {
		Error::Serialization(error.to_string())
	}
}

/// Result type used throughout supercell.
pub type Result<T> = std::result::Result<T, Error>;

/// Field name to messages, in the order fields were first reported.
///
/// # Examples
///
/// ```
/// use supercell_core::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.add("number", "must be an integer");
/// errors.add("number", "must be positive");
///
/// assert_eq!(errors.get("number").unwrap().len(), 2);
/// assert!(errors.get("name").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
	fields: IndexMap<String, Vec<String>>,
}

impl ValidationErrors {
	pub fn new() -> Self {
		Self::default()
	}

	/// Errors with a single message for a single field.
	pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
		let mut errors = Self::new();
		errors.add(field, message);
		errors
	}

	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.fields
			.entry(field.into())
			.or_default()
			.push(message.into());
	}

	pub fn get(&self, field: &str) -> Option<&[String]> {
		self.fields.get(field).map(Vec::as_slice)
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.fields
			.iter()
			.map(|(field, messages)| (field.as_str(), messages.as_slice()))
	}

	/// Renders the errors as a JSON object of message lists.
	pub fn to_json_map(&self) -> Map<String, Value> {
		self.fields
			.iter()
			.map(|(field, messages)| {
				let list = messages.iter().cloned().map(Value::String).collect();
				(field.clone(), Value::Array(list))
			})
			.collect()
	}

	fn collect_validator(&mut self, prefix: Option<&str>, errors: &validator::ValidationErrors) {
		let mut entries: Vec<_> = errors.errors().iter().collect();
		entries.sort_by(|a, b| a.0.cmp(b.0));

		for (field, kind) in entries {
			let name = match prefix {
				Some(prefix) => format!("{}.{}", prefix, field),
				None => field.to_string(),
			};
			match kind {
				validator::ValidationErrorsKind::Field(field_errors) => {
					for error in field_errors {
						let message = error
							.message
							.as_ref()
							.map(|m| m.to_string())
							.unwrap_or_else(|| format!("Invalid value ({})", error.code));
						self.add(name.clone(), message);
					}
				}
				validator::ValidationErrorsKind::Struct(nested) => {
					self.collect_validator(Some(&name), nested);
				}
				validator::ValidationErrorsKind::List(items) => {
					for (index, nested) in items {
						let item = format!("{}.{}", name, index);
						self.collect_validator(Some(&item), nested);
					}
				}
			}
		}
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (field, messages) in &self.fields {
			if !first {
				write!(f, "; ")?;
			}
			first = false;
			write!(f, "{}: {}", field, messages.join(", "))?;
		}
		Ok(())
	}
}

impl From<validator::ValidationErrors> for ValidationErrors {
	fn from(errors: validator::ValidationErrors) -> Self {
		let mut collected = Self::new();
		collected.collect_validator(None, &errors);
		collected
	}
}

impl From<serde_json::Error> for ValidationErrors {
	fn from(error: serde_json::Error) -> Self {
		let message = error.to_string();
		if let Some(field) = quoted_field(&message, "missing field `") {
			return Self::single(field, "This field is required.");
		}
		if let Some(field) = quoted_field(&message, "unknown field `") {
			return Self::single(field, "Unknown field.");
		}
		Self::single(NON_FIELD_ERRORS, message)
	}
}

fn quoted_field<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
	message.strip_prefix(prefix)?.split('`').next()
}
