use super::Request;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

/// Decodes a percent-encoded path or query argument.
///
/// Bytes are read as UTF-8 and, failing that, as Latin-1, so legacy clients
/// still get a usable string instead of an error.
///
/// # Examples
///
/// ```
/// use supercell_http::decode_argument;
///
/// assert_eq!(decode_argument("caf%C3%A9"), "café");
/// assert_eq!(decode_argument("caf%E9"), "café");
/// assert_eq!(decode_argument("plain"), "plain");
/// ```
pub fn decode_argument(raw: &str) -> String {
	let bytes: Vec<u8> = percent_decode_str(raw).collect();
	match String::from_utf8(bytes) {
		Ok(decoded) => decoded,
		Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
	}
}

impl Request {
	/// Get the request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Raw query string, empty when absent
	pub fn query_string(&self) -> &str {
		self.uri.query().unwrap_or_default()
	}

	/// Decoded query parameters; repeated names keep every value in order.
	///
	/// # Examples
	///
	/// ```
	/// use supercell_http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/search?tag=a&tag=b&name=John+Doe")
	///     .build()
	///     .unwrap();
	///
	/// let params = request.query_params();
	/// assert_eq!(params["tag"], vec!["a", "b"]);
	/// assert_eq!(request.argument("name").as_deref(), Some("John Doe"));
	/// ```
	pub fn query_params(&self) -> IndexMap<String, Vec<String>> {
		let pairs: Vec<(String, String)> =
			serde_urlencoded::from_str(self.query_string()).unwrap_or_default();

		let mut params: IndexMap<String, Vec<String>> = IndexMap::new();
		for (key, value) in pairs {
			params.entry(key).or_default().push(value);
		}
		params
	}

	/// The last value of a query argument.
	pub fn argument(&self, name: &str) -> Option<String> {
		self.arguments(name).pop()
	}

	/// Every value of a query argument.
	pub fn arguments(&self, name: &str) -> Vec<String> {
		self.query_params().swap_remove(name).unwrap_or_default()
	}

	/// Stores route captures, decoding each one.
	pub fn set_path_captures<'a>(
		&mut self,
		args: impl IntoIterator<Item = &'a str>,
		kwargs: impl IntoIterator<Item = (&'a str, &'a str)>,
	) {
		self.path_args = args.into_iter().map(decode_argument).collect();
		self.path_kwargs = kwargs
			.into_iter()
			.map(|(name, value)| (name.to_string(), decode_argument(value)))
			.collect();
	}
}
