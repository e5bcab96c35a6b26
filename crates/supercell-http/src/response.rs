use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use supercell_core::{Error, Result};

/// HTTP Response representation
///
/// A response is mutable until [`finish`](Response::finish) is called. After
/// that every mutating call fails with [`Error::AlreadyFinished`] and
/// builder-style calls leave the response untouched.
#[derive(Debug, Clone)]
pub struct Response {
	status: StatusCode,
	headers: HeaderMap,
	body: Bytes,
	finished: bool,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use supercell_http::Response;
	/// use http::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status(), StatusCode::OK);
	/// assert!(response.body().is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			finished: false,
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// A JSON error body of the form `{"error": true, "message": ...}`.
	///
	/// # Examples
	///
	/// ```
	/// use supercell_http::Response;
	/// use http::StatusCode;
	///
	/// let response = Response::error(StatusCode::NOT_ACCEPTABLE, "Not Acceptable");
	/// assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
	/// assert_eq!(
	///     response.body().as_ref(),
	///     br#"{"error":true,"message":"Not Acceptable"}"#
	/// );
	/// ```
	pub fn error(status: StatusCode, message: &str) -> Self {
		let body = serde_json::json!({
			"error": true,
			"message": message,
		});
		Response::new(status)
			.with_json(&body)
			.unwrap_or_else(|_| Response::new(status))
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}

	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	pub fn body(&self) -> &Bytes {
		&self.body
	}

	pub fn is_finished(&self) -> bool {
		self.finished
	}

	/// Set the response body
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		if self.guard("with_body").is_ok() {
			self.body = body.into();
		}
		self
	}

	/// Add a custom header to the response; invalid names or values are ignored
	///
	/// # Examples
	///
	/// ```
	/// use supercell_http::Response;
	///
	/// let response = Response::ok().with_header("X-Custom-Header", "custom-value");
	/// assert_eq!(
	///     response.headers().get("X-Custom-Header").unwrap().to_str().unwrap(),
	///     "custom-value"
	/// );
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
			&& self.guard("with_header").is_ok()
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Set the response body to JSON and add the `application/json` Content-Type
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		self.write_json(data)?;
		Ok(self)
	}

	pub fn set_status(&mut self, status: StatusCode) -> Result<()> {
		self.guard("set_status")?;
		self.status = status;
		Ok(())
	}

	pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<()> {
		self.guard("set_header")?;
		self.headers.insert(name, value);
		Ok(())
	}

	/// Merges headers, replacing existing values of the same name.
	pub fn extend_headers(&mut self, headers: HeaderMap) -> Result<()> {
		self.guard("extend_headers")?;
		self.headers.extend(headers);
		Ok(())
	}

	pub fn write(&mut self, body: impl Into<Bytes>) -> Result<()> {
		self.guard("write")?;
		self.body = body.into();
		Ok(())
	}

	pub fn write_json<T: Serialize>(&mut self, data: &T) -> Result<()> {
		self.guard("write_json")?;
		let json = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers.insert(
			CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);
		Ok(())
	}

	/// Drops the body while keeping status and headers, as for HEAD.
	pub fn strip_body(&mut self) -> Result<()> {
		self.guard("strip_body")?;
		self.body = Bytes::new();
		Ok(())
	}

	/// Marks the response as sent.
	///
	/// # Examples
	///
	/// ```
	/// use supercell_http::Response;
	/// use supercell_core::Error;
	///
	/// let mut response = Response::ok().with_body("done");
	/// response.finish().unwrap();
	///
	/// assert!(matches!(response.finish(), Err(Error::AlreadyFinished)));
	/// assert!(matches!(response.write("again"), Err(Error::AlreadyFinished)));
	/// assert_eq!(response.body().as_ref(), b"done");
	/// ```
	pub fn finish(&mut self) -> Result<()> {
		self.guard("finish")?;
		self.finished = true;
		Ok(())
	}

	/// Converts into a hyper response for the transport.
	pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
		let mut response = hyper::Response::new(Full::new(self.body));
		*response.status_mut() = self.status;
		*response.headers_mut() = self.headers;
		response
	}

	fn guard(&self, operation: &str) -> Result<()> {
		if self.finished {
			tracing::warn!(operation, "write attempted on a finished response");
			return Err(Error::AlreadyFinished);
		}
		Ok(())
	}
}

impl From<Error> for Response {
	fn from(error: Error) -> Self {
		let status = error.status_code();
		match error {
			Error::Validation(errors) => {
				let mut body = errors.to_json_map();
				body.insert("error".to_string(), serde_json::Value::Bool(true));
				Response::new(status)
					.with_json(&body)
					.unwrap_or_else(|_| Response::new(status))
			}
			Error::Http { reason, .. } => Response::error(status, &reason),
			_ => Response::error(status, status.canonical_reason().unwrap_or("Error")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use supercell_core::ValidationErrors;

	#[rstest]
	fn test_validation_error_body_lists_fields() {
		// Arrange
		let errors = ValidationErrors::single("number", "must be an integer");

		// Act
		let response = Response::from(Error::Validation(errors));

		// Assert
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
		assert_eq!(
			body,
			serde_json::json!({"error": true, "number": ["must be an integer"]})
		);
	}

	#[rstest]
	#[case(Error::NoProviderFound, StatusCode::NOT_ACCEPTABLE, "Not Acceptable")]
	#[case(Error::Internal("secret detail".into()), StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")]
	#[case(Error::http(StatusCode::CONFLICT, "exists"), StatusCode::CONFLICT, "exists")]
	fn test_error_bodies_hide_internals(
		#[case] error: Error,
		#[case] status: StatusCode,
		#[case] message: &str,
	) {
		let response = Response::from(error);

		assert_eq!(response.status(), status);
		let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
		assert_eq!(body, serde_json::json!({"error": true, "message": message}));
	}

	#[rstest]
	fn test_finished_response_ignores_builders() {
		let mut response = Response::ok().with_body("first");
		response.finish().unwrap();

		let response = response.with_body("second").with_header("x-late", "1");

		assert_eq!(response.body().as_ref(), b"first");
		assert!(response.headers().get("x-late").is_none());
		assert!(response.is_finished());
	}

	#[rstest]
	fn test_into_hyper_keeps_parts() {
		let response = Response::created().with_header("location", "/documents/1");

		let converted = response.into_hyper();

		assert_eq!(converted.status(), StatusCode::CREATED);
		assert_eq!(converted.headers()["location"], "/documents/1");
	}
}
