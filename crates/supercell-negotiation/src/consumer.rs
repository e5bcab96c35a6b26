//! Consumers turn request bodies into models

use supercell_core::{ContentType, Model, ModelType, Result};

/// Deserializes request bodies of one exact content type.
pub trait Consumer: Send + Sync {
	/// The content type this consumer reads
	fn content_type(&self) -> &ContentType;

	/// Builds a validated model of the given type from the body.
	///
	/// Malformed bodies and invalid models both fail with
	/// [`supercell_core::Error::Validation`].
	fn consume(&self, body: &[u8], model: &ModelType) -> Result<Box<dyn Model>>;
}

/// JSON consumer, `application/json` unless bound to a vendored JSON type.
#[derive(Debug, Clone)]
pub struct JsonConsumer {
	content_type: ContentType,
}

impl JsonConsumer {
	pub fn new() -> Self {
		Self::for_content_type(ContentType::json())
	}

	pub fn for_content_type(content_type: ContentType) -> Self {
		Self { content_type }
	}
}

impl Default for JsonConsumer {
	fn default() -> Self {
		Self::new()
	}
}

impl Consumer for JsonConsumer {
	fn content_type(&self) -> &ContentType {
		&self.content_type
	}

	fn consume(&self, body: &[u8], model: &ModelType) -> Result<Box<dyn Model>> {
		model.from_slice(body)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::{Deserialize, Serialize};
	use supercell_core::Error;
	use validator::Validate;

	#[derive(Debug, Serialize, Deserialize, Validate)]
	struct Document {
		message: String,
		number: i64,
	}

	#[rstest]
	fn test_consume_valid_body() {
		let consumer = JsonConsumer::new();

		let model = consumer
			.consume(br#"{"message":"hi","number":1}"#, &ModelType::of::<Document>())
			.unwrap();

		assert_eq!(model.downcast_ref::<Document>().unwrap().number, 1);
	}

	#[rstest]
	#[case(b"")]
	#[case(b"not json")]
	#[case(br#"{"message":"hi","number":"one"}"#)]
	fn test_consume_invalid_body(#[case] body: &[u8]) {
		let consumer = JsonConsumer::new();

		let result = consumer.consume(body, &ModelType::of::<Document>());

		assert!(matches!(result, Err(Error::Validation(_))));
	}
}
