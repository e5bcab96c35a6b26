//! Integration tests for provider and consumer negotiation
//!
//! Covers:
//! - exact matching of vendor and version qualifiers
//! - default producer fallback
//! - header order deciding between several registered types
//! - consumer selection from the first Content-Type candidate only

use rstest::{fixture, rstest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use supercell_core::{ContentType, Error, ModelType};
use supercell_negotiation::{
	HandlerId, JsonConsumer, JsonProvider, Negotiator, Registry, RegistrySnapshot,
};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
struct Document {
	message: String,
	number: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
struct DetailedDocument {
	message: String,
	number: i64,
	tags: Vec<String>,
}

fn vendored(version: Option<f64>) -> ContentType {
	let content_type = ContentType::json().with_vendor("supercell");
	match version {
		Some(v) => content_type.with_version(v).unwrap(),
		None => content_type,
	}
}

/// Installs vendored JSON implementations next to the plain defaults
fn registry() -> Registry {
	let mut registry = Registry::with_defaults();
	for content_type in [vendored(None), vendored(Some(1.0)), vendored(Some(1.1))] {
		registry
			.add_provider(Arc::new(JsonProvider::for_content_type(content_type.clone())))
			.unwrap();
		registry
			.add_consumer(Arc::new(JsonConsumer::for_content_type(content_type)))
			.unwrap();
	}
	registry
}

fn producing(types: &[(ContentType, bool)]) -> (HandlerId, Arc<RegistrySnapshot>) {
	let mut registry = registry();
	let handler = HandlerId::new("handler");
	for (content_type, is_default) in types {
		registry
			.register_producer(&handler, content_type.clone(), *is_default)
			.unwrap();
	}
	(handler, registry.freeze())
}

#[fixture]
fn consuming() -> (HandlerId, Arc<RegistrySnapshot>) {
	let mut registry = registry();
	let handler = HandlerId::new("handler");
	registry
		.register_consumer(&handler, ContentType::json(), Some(ModelType::of::<Document>()))
		.unwrap();
	registry
		.register_consumer(
			&handler,
			vendored(Some(1.1)),
			Some(ModelType::of::<DetailedDocument>()),
		)
		.unwrap();
	(handler, registry.freeze())
}

#[rstest]
fn test_plain_registration_rejects_vendored_request() {
	// Arrange
	let (handler, snapshot) = producing(&[(ContentType::json(), false)]);
	let negotiator = Negotiator::new(&snapshot);

	// Act
	let plain = negotiator.provider_for_accept(&handler, "application/json");
	let vendored_request = negotiator.provider_for_accept(&handler, "application/vnd.supercell-v1.1+json");

	// Assert
	assert_eq!(plain.unwrap().content_type(), &ContentType::json());
	assert!(matches!(vendored_request, Err(Error::NoProviderFound)));
}

#[rstest]
fn test_vendored_registration_rejects_plain_request() {
	let (handler, snapshot) = producing(&[(vendored(None), false)]);
	let negotiator = Negotiator::new(&snapshot);

	let plain = negotiator.provider_for_accept(&handler, "application/json");
	let vendored_request = negotiator.provider_for_accept(&handler, "application/vnd.supercell+json");

	assert!(matches!(plain, Err(Error::NoProviderFound)));
	assert_eq!(vendored_request.unwrap().content_type(), &vendored(None));
}

#[rstest]
#[case("application/vnd.supercell-v1.0+json", Some(1.0))]
#[case("application/vnd.supercell-v1+json", Some(1.0))]
#[case("application/vnd.supercell-v1.1+json", Some(1.1))]
#[case("application/vnd.supercell+json", None)]
fn test_version_matches_numerically(#[case] accept: &str, #[case] expected: Option<f64>) {
	let (handler, snapshot) = producing(&[
		(vendored(None), false),
		(vendored(Some(1.0)), false),
		(vendored(Some(1.1)), false),
	]);

	let provider = Negotiator::new(&snapshot)
		.provider_for_accept(&handler, accept)
		.unwrap();

	assert_eq!(provider.content_type(), &vendored(expected));
}

#[rstest]
fn test_unregistered_version_is_not_approximated() {
	let (handler, snapshot) = producing(&[(vendored(Some(1.0)), false)]);

	let result = Negotiator::new(&snapshot).provider_for_accept(&handler, "application/vnd.supercell-v2.0+json");

	assert!(matches!(result, Err(Error::NoProviderFound)));
}

#[rstest]
#[case("")]
#[case("*/*")]
#[case("text/html")]
#[case("application/vnd.supercell-v9.0+json")]
fn test_default_serves_unmatched_requests(#[case] accept: &str) {
	let (handler, snapshot) = producing(&[(vendored(Some(1.0)), false), (ContentType::json(), true)]);

	let provider = Negotiator::new(&snapshot)
		.provider_for_accept(&handler, accept)
		.unwrap();

	assert_eq!(provider.content_type(), &ContentType::json());
}

#[rstest]
#[case("")]
#[case("application/vnd.supercell+xml")]
fn test_without_default_unmatched_requests_fail(#[case] accept: &str) {
	let (handler, snapshot) = producing(&[(ContentType::json(), false)]);

	let result = Negotiator::new(&snapshot).provider_for_accept(&handler, accept);

	assert!(matches!(result, Err(Error::NoProviderFound)));
}

#[rstest]
fn test_explicit_match_beats_default() {
	let (handler, snapshot) = producing(&[(ContentType::json(), true), (vendored(Some(1.1)), false)]);

	let provider = Negotiator::new(&snapshot)
		.provider_for_accept(&handler, "application/vnd.supercell-v1.1+json")
		.unwrap();

	assert_eq!(provider.content_type(), &vendored(Some(1.1)));
}

#[rstest]
#[case("application/vnd.supercell-v1.1+json, application/json", Some(1.1))]
#[case("application/json, application/vnd.supercell-v1.1+json", None)]
#[case("application/json;q=0.5, application/vnd.supercell-v1.1+json", Some(1.1))]
fn test_header_order_decides(#[case] accept: &str, #[case] expected: Option<f64>) {
	let (handler, snapshot) = producing(&[(ContentType::json(), false), (vendored(Some(1.1)), false)]);

	let provider = Negotiator::new(&snapshot)
		.provider_for_accept(&handler, accept)
		.unwrap();

	let expected = match expected {
		Some(version) => vendored(Some(version)),
		None => ContentType::json(),
	};
	assert_eq!(provider.content_type(), &expected);
}

#[rstest]
fn test_consumer_ignores_extra_parameters(consuming: (HandlerId, Arc<RegistrySnapshot>)) {
	let (handler, snapshot) = consuming;

	let (consumer, model) = Negotiator::new(&snapshot)
		.consumer_for_content_type(&handler, "application/json; encoding=UTF-8")
		.unwrap();

	assert_eq!(consumer.content_type(), &ContentType::json());
	assert!(model.is::<Document>());
}

#[rstest]
fn test_consumer_returns_declared_model(consuming: (HandlerId, Arc<RegistrySnapshot>)) {
	// Arrange
	let (handler, snapshot) = consuming;
	let negotiator = Negotiator::new(&snapshot);

	// Act
	let (consumer, model) = negotiator
		.consumer_for_content_type(&handler, "application/vnd.supercell-v1.1+json")
		.unwrap();
	let parsed = consumer
		.consume(br#"{"message":"hi","number":1,"tags":["a"]}"#, &model)
		.unwrap();

	// Assert
	assert!(model.is::<DetailedDocument>());
	assert_eq!(parsed.downcast_ref::<DetailedDocument>().unwrap().tags, vec!["a"]);
}

#[rstest]
#[case("application/vnd.supercell+json")]
#[case("text/plain")]
#[case("")]
fn test_consumer_rejects_unregistered(
	consuming: (HandlerId, Arc<RegistrySnapshot>),
	#[case] content_type: &str,
) {
	let (handler, snapshot) = consuming;

	let result = Negotiator::new(&snapshot).consumer_for_content_type(&handler, content_type);

	assert!(matches!(result, Err(Error::NoConsumerFound)));
}

#[rstest]
fn test_consumer_uses_first_candidate_only(consuming: (HandlerId, Arc<RegistrySnapshot>)) {
	let (handler, snapshot) = consuming;

	let result = Negotiator::new(&snapshot).consumer_for_content_type(&handler, "text/plain, application/json");

	assert!(matches!(result, Err(Error::NoConsumerFound)));
}

#[rstest]
#[case("application/vnd.Acme+json")]
#[case("application/vnd.acme+json")]
#[case("APPLICATION/VND.ACME+JSON")]
fn test_mixed_case_vendor_is_served(#[case] accept: &str) {
	// Arrange
	let acme: ContentType = "application/vnd.Acme+json".parse().unwrap();
	let mut registry = Registry::new();
	registry
		.add_provider(Arc::new(JsonProvider::for_content_type(acme.clone())))
		.unwrap();
	let handler = HandlerId::new("handler");
	registry.register_producer(&handler, acme, false).unwrap();
	let snapshot = registry.freeze();

	// Act
	let provider = Negotiator::new(&snapshot).provider_for_accept(&handler, accept);

	// Assert
	let provider = provider.unwrap();
	assert_eq!(provider.media_type(), "application/vnd.acme+json");
}
