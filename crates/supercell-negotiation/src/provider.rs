//! Providers turn models into response bodies

use bytes::Bytes;
use supercell_core::{ContentType, Model, Result};

/// Serializes models into the wire representation of one exact content type.
pub trait Provider: Send + Sync {
	/// The content type this provider produces
	fn content_type(&self) -> &ContentType;

	/// Serializes the model into a response body
	fn provide(&self, model: &dyn Model) -> Result<Bytes>;

	/// Value sent as the response `Content-Type`
	fn media_type(&self) -> String {
		self.content_type().to_string()
	}
}

/// JSON provider, `application/json` unless bound to a vendored JSON type.
///
/// # Examples
///
/// ```
/// use serde::Serialize;
/// use supercell_core::ContentType;
/// use supercell_negotiation::{JsonProvider, Provider};
/// use validator::Validate;
///
/// #[derive(Serialize, Validate)]
/// struct Saying {
///     id: u32,
///     content: String,
/// }
///
/// let provider = JsonProvider::for_content_type(ContentType::json().with_vendor("acme"));
/// let body = provider.provide(&Saying { id: 1, content: "hi".into() }).unwrap();
///
/// assert_eq!(body.as_ref(), br#"{"id":1,"content":"hi"}"#);
/// assert_eq!(provider.media_type(), "application/vnd.acme+json");
/// ```
#[derive(Debug, Clone)]
pub struct JsonProvider {
	content_type: ContentType,
}

impl JsonProvider {
	pub fn new() -> Self {
		Self::for_content_type(ContentType::json())
	}

	pub fn for_content_type(content_type: ContentType) -> Self {
		Self { content_type }
	}
}

impl Default for JsonProvider {
	fn default() -> Self {
		Self::new()
	}
}

impl Provider for JsonProvider {
	fn content_type(&self) -> &ContentType {
		&self.content_type
	}

	fn provide(&self, model: &dyn Model) -> Result<Bytes> {
		Ok(Bytes::from(model.to_json_vec()?))
	}
}
