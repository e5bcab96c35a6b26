mod params;

pub use params::decode_argument;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, Version};
use http_body_util::BodyExt;
use indexmap::IndexMap;
use std::net::SocketAddr;
use supercell_core::{Error, Result};

/// An HTTP request as handed over by the transport.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
	/// Positional captures of the matched route, decoded
	pub path_args: Vec<String>,
	/// Named captures of the matched route, decoded
	pub path_kwargs: IndexMap<String, String>,
}

impl Request {
	/// Starts building a request.
	///
	/// # Examples
	///
	/// ```
	/// use supercell_http::Request;
	/// use http::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/documents?draft=1")
	///     .header("content-type", "application/json")
	///     .body(r#"{"message": "hi"}"#)
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/documents");
	/// assert_eq!(request.content_type(), Some("application/json"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Collects a hyper request into a [`Request`].
	pub async fn from_hyper<B>(request: hyper::Request<B>, remote_addr: Option<SocketAddr>) -> Result<Self>
	where
		B: hyper::body::Body,
		B::Error: std::fmt::Display,
	{
		let (parts, body) = request.into_parts();
		let body = body
			.collect()
			.await
			.map_err(|e| Error::http(http::StatusCode::BAD_REQUEST, e.to_string()))?
			.to_bytes();

		Ok(Self {
			method: parts.method,
			uri: parts.uri,
			version: parts.version,
			headers: parts.headers,
			body,
			remote_addr,
			path_args: Vec::new(),
			path_kwargs: IndexMap::new(),
		})
	}

	/// Header value as a string, if present and visible ASCII.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	/// The `Accept` header, or an empty string when absent.
	pub fn accept(&self) -> &str {
		self.headers
			.get(ACCEPT)
			.and_then(|v| v.to_str().ok())
			.unwrap_or_default()
	}

	/// The `Content-Type` header when present. A value that is not visible
	/// ASCII comes back as an empty string, which no consumer accepts.
	pub fn content_type(&self) -> Option<&str> {
		self.headers
			.get(CONTENT_TYPE)
			.map(|v| v.to_str().unwrap_or_default())
	}
}

/// Builder for [`Request`].
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	version: Option<Version>,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
	invalid_header: Option<String>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = Some(version);
		self
	}

	/// Replaces all headers.
	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Appends one header; invalid names or values fail at [`build`](Self::build).
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.append(name, value);
			}
			_ => self.invalid_header = Some(name.to_string()),
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	pub fn build(self) -> Result<Request> {
		if let Some(name) = self.invalid_header {
			return Err(Error::Internal(format!("invalid header: {}", name)));
		}
		let uri = self
			.uri
			.as_deref()
			.unwrap_or("/")
			.parse::<Uri>()
			.map_err(|e| Error::Internal(format!("invalid URI: {}", e)))?;

		Ok(Request {
			method: self.method.unwrap_or(Method::GET),
			uri,
			version: self.version.unwrap_or(Version::HTTP_11),
			headers: self.headers,
			body: self.body,
			remote_addr: self.remote_addr,
			path_args: Vec::new(),
			path_kwargs: IndexMap::new(),
		})
	}
}
