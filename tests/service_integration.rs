//! End-to-end tests through the hyper conversions
//!
//! A small sayings service is assembled through the facade, requests enter
//! as `hyper::Request`s and leave as `hyper::Response`s.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use supercell::prelude::*;

#[derive(Debug, Serialize, Deserialize, Validate)]
struct Saying {
	id: u64,
	#[validate(length(min = 1))]
	content: String,
}

struct Sayings {
	next_id: AtomicU64,
}

#[async_trait]
impl RequestHandler for Sayings {
	async fn get(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Ok(DomainResult::model(Saying {
			id: self.next_id.load(Ordering::SeqCst),
			content: "Hello, World!".into(),
		}))
	}

	async fn post(&self, ctx: &mut HandlerContext) -> Result<DomainResult> {
		let saying = ctx
			.take_model::<Saying>()
			.ok_or_else(|| Error::http(StatusCode::BAD_REQUEST, "a saying is required"))?;
		self.next_id.fetch_max(saying.id, Ordering::SeqCst);
		Ok(StatusResult::created(json!({"docid": saying.id})).into())
	}
}

fn v1() -> ContentType {
	ContentType::json().with_vendor("sayings").with_version(1.0).unwrap()
}

#[fixture]
fn application() -> Application {
	let mut environment = Environment::new(DispatchSettings::default());
	environment
		.add_provider(Arc::new(JsonProvider::for_content_type(v1())))
		.unwrap();
	environment
		.add_consumer(Arc::new(JsonConsumer::for_content_type(v1())))
		.unwrap();
	environment
		.add_handler(
			"/sayings",
			Arc::new(Sayings { next_id: AtomicU64::new(0) }),
			RouteConfig::builder()
				.provides_default(ContentType::json())
				.provides(v1())
				.consumes(ContentType::json(), ModelType::of::<Saying>())
				.consumes(v1(), ModelType::of::<Saying>())
				.build(),
		)
		.unwrap();
	environment.finalize().unwrap()
}

async fn roundtrip(application: &Application, request: hyper::Request<Full<Bytes>>) -> (StatusCode, Option<String>, Bytes) {
	let request = Request::from_hyper(request, None).await.unwrap();
	let response = application.handle(request).await.into_hyper();

	let status = response.status();
	let content_type = response
		.headers()
		.get("content-type")
		.map(|v| v.to_str().unwrap().to_string());
	let body = response.into_body().collect().await.unwrap().to_bytes();
	(status, content_type, body)
}

#[rstest]
#[tokio::test]
async fn test_post_then_get_vendored(application: Application) {
	// Arrange
	let post = hyper::Request::builder()
		.method(Method::POST)
		.uri("/sayings")
		.header("content-type", "application/vnd.sayings-v1.0+json")
		.body(Full::new(Bytes::from_static(br#"{"id": 42, "content": "hi"}"#)))
		.unwrap();
	let get = hyper::Request::builder()
		.uri("/sayings")
		.header("accept", "application/vnd.sayings-v1.0+json, application/json;q=0.5")
		.body(Full::new(Bytes::new()))
		.unwrap();

	// Act
	let (post_status, _, post_body) = roundtrip(&application, post).await;
	let (get_status, content_type, get_body) = roundtrip(&application, get).await;

	// Assert
	assert_eq!(post_status, StatusCode::CREATED);
	assert_eq!(
		serde_json::from_slice::<serde_json::Value>(&post_body).unwrap(),
		json!({"docid": 42, "ok": true})
	);
	assert_eq!(get_status, StatusCode::OK);
	assert_eq!(content_type.as_deref(), Some("application/vnd.sayings-v1.0+json"));
	assert_eq!(
		serde_json::from_slice::<serde_json::Value>(&get_body).unwrap(),
		json!({"id": 42, "content": "Hello, World!"})
	);
}

#[rstest]
#[tokio::test]
async fn test_invalid_saying_is_rejected(application: Application) {
	let post = hyper::Request::builder()
		.method(Method::POST)
		.uri("/sayings")
		.header("content-type", "application/json; encoding=UTF-8")
		.body(Full::new(Bytes::from_static(br#"{"id": 1, "content": ""}"#)))
		.unwrap();

	let (status, content_type, body) = roundtrip(&application, post).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(content_type.as_deref(), Some("application/json"));
	let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
	assert_eq!(body["error"], json!(true));
	assert!(body["content"].is_array());
}

#[rstest]
#[case("application/vnd.sayings-v2.0+json", StatusCode::OK, "application/json")]
#[case("application/vnd.sayings-v1+json", StatusCode::OK, "application/vnd.sayings-v1.0+json")]
#[tokio::test]
async fn test_accept_versions(
	application: Application,
	#[case] accept: &str,
	#[case] status: StatusCode,
	#[case] content_type: &str,
) {
	let get = hyper::Request::builder()
		.uri("/sayings")
		.header("accept", accept)
		.body(Full::new(Bytes::new()))
		.unwrap();

	let (actual_status, actual_content_type, _) = roundtrip(&application, get).await;

	assert_eq!(actual_status, status);
	assert_eq!(actual_content_type.as_deref(), Some(content_type));
}

struct Failing;

#[async_trait]
impl RequestHandler for Failing {
	async fn get(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Err(Error::Internal("disk full".into()))
	}
}

#[rstest]
#[case(false, "Internal Server Error")]
#[case(true, "Internal error: disk full")]
#[tokio::test]
async fn test_dispatch_settings_come_from_loaded_settings(#[case] debug: bool, #[case] message: &str) {
	// Arrange
	let mut settings = Settings::default();
	settings.dispatch.debug = debug;
	let mut environment = Environment::new(settings.dispatch.clone());
	environment
		.add_handler("/failing", Arc::new(Failing), RouteConfig::default())
		.unwrap();
	let application = environment.finalize().unwrap();
	let get = hyper::Request::builder()
		.uri("/failing")
		.body(Full::new(Bytes::new()))
		.unwrap();

	// Act
	let (status, _, body) = roundtrip(&application, get).await;

	// Assert
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
	assert_eq!(body["message"], json!(message));
}
