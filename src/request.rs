//! Request descriptors handed to [`ApiClient::execute`](crate::client::ApiClient::execute).

// crates.io
use oauth2::http::Method as HttpMethod;
use rand::{Rng, distr::Alphanumeric};
use serde_json::Value;
// self
use crate::{_prelude::*, error::ConfigError};

/// REST verbs used by the console API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}

	pub(crate) fn to_http(self) -> HttpMethod {
		match self {
			Self::Get => HttpMethod::GET,
			Self::Post => HttpMethod::POST,
			Self::Put => HttpMethod::PUT,
			Self::Patch => HttpMethod::PATCH,
			Self::Delete => HttpMethod::DELETE,
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One logical API call: verb, path below the API prefix, query pairs, and JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Path below the configured API prefix, starting with `/`.
	pub path: String,
	/// Query parameters in insertion order.
	pub query: Vec<(String, String)>,
	/// Optional JSON body.
	pub body: Option<Value>,
}
impl ApiRequest {
	/// Creates a request without query or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Appends several query parameters.
	pub fn query_pairs<I>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (String, String)>,
	{
		self.query.extend(pairs);

		self
	}

	/// Attaches a JSON body.
	pub fn body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes and attaches a JSON body.
	pub fn json<T>(self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let value = serde_json::to_value(body).map_err(ConfigError::BodySerialize)?;

		Ok(self.body(value))
	}
}

/// Generates an `X-Request-ID` value shaped as `<unix-millis>-<random>`.
pub fn new_request_id() -> String {
	let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
	let suffix = rand::rng()
		.sample_iter(Alphanumeric)
		.take(9)
		.map(|byte| char::from(byte).to_ascii_lowercase())
		.collect::<String>();

	format!("{millis}-{suffix}")
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn builder_collects_query_and_body() {
		#[derive(Serialize)]
		struct Draft<'a> {
			name: &'a str,
		}

		let request = ApiRequest::post("/organizations/departments")
			.query("page", 1)
			.json(&Draft { name: "Science" })
			.expect("Draft body should serialize.");

		assert_eq!(request.method, Method::Post);
		assert_eq!(request.query, vec![("page".to_owned(), "1".to_owned())]);
		assert_eq!(request.body, Some(json!({ "name": "Science" })));
	}

	#[test]
	fn request_ids_carry_timestamp_and_suffix() {
		let id = new_request_id();
		let (millis, suffix) = id.split_once('-').expect("Request ID should contain a dash.");

		assert!(millis.parse::<i128>().is_ok());
		assert_eq!(suffix.len(), 9);
		assert_ne!(new_request_id(), id);
	}
}
