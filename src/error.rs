//! Client-level error types shared across the request pipeline, auth collaborators, and cache.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Authorization expiry is recovered inside [`ApiClient::execute`](crate::client::ApiClient)
/// once; every other variant reaches the caller unchanged.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Backend kept rejecting the bearer token after a refresh was attempted.
	#[error("Authorization expired: {reason}.")]
	AuthExpired {
		/// Backend- or client-supplied reason string.
		reason: String,
	},
	/// Auth session could not mint a fresh token; the login redirect has been triggered.
	#[error("Token refresh failed: {reason}.")]
	RefreshFailed {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Backend answered 403.
	#[error("Permission denied: {message}.")]
	PermissionDenied {
		/// Backend-supplied message.
		message: String,
	},
	/// Backend answered 429.
	#[error("Rate limited; retry after {retry_after}.")]
	RateLimited {
		/// Backoff the client already waited out before surfacing the error.
		retry_after: Duration,
	},
	/// Backend answered 5xx.
	#[error("Server error {status}: {message}.")]
	Server {
		/// HTTP status code.
		status: u16,
		/// Backend-supplied message.
		message: String,
	},
	/// Backend rejected the request with a 4xx other than 401, 403, or 429.
	#[error("Request rejected with status {status}: {message}.")]
	Validation {
		/// HTTP status code.
		status: u16,
		/// Backend-supplied message.
		message: String,
		/// Field-level details reported in the error envelope, if any.
		details: Option<serde_json::Value>,
	},
	/// Successful response body could not be decoded.
	#[error("Response body could not be decoded.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl Error {
	/// HTTP status associated with the error, when one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::AuthExpired { .. } => Some(401),
			Self::PermissionDenied { .. } => Some(403),
			Self::RateLimited { .. } => Some(429),
			Self::Server { status, .. } | Self::Validation { status, .. } => Some(*status),
			Self::ResponseParse { status, .. } => *status,
			_ => None,
		}
	}

	/// Returns `true` when retrying the same request later may succeed.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Transport(_) | Self::RateLimited { .. } | Self::Server { .. })
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Base URL cannot be parsed or cannot carry a path.
	#[error("Base URL is invalid: {url}.")]
	InvalidBaseUrl {
		/// Rejected URL string.
		url: String,
	},
	/// API prefix must start with `/`.
	#[error("API prefix must start with '/': {prefix}.")]
	InvalidPrefix {
		/// Rejected prefix.
		prefix: String,
	},
	/// Request path could not be joined with the base URL.
	#[error("Request path is invalid: {path}.")]
	InvalidPath {
		/// Rejected path.
		path: String,
	},
	/// Timeouts must be positive.
	#[error("Request timeout must be positive.")]
	ZeroTimeout,
	/// Credentials mode string is not recognized.
	#[error("Unknown credentials mode: {value}.")]
	UnknownCredentialsMode {
		/// Rejected value.
		value: String,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable {name} is invalid: {value}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Rejected value.
		value: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[source] serde_json::Error),
	/// Entity does not expose the requested action.
	#[error("{entity} does not support the {action} action.")]
	UnsupportedAction {
		/// Entity type label.
		entity: &'static str,
		/// Action label.
		action: &'static str,
	},
	/// Endpoint addresses a single entity but no id was supplied.
	#[error("Endpoint {endpoint} requires an entity id.")]
	MissingEntityId {
		/// Endpoint name.
		endpoint: String,
	},
	/// Entity id cannot be used as a single path segment.
	#[error("Entity id {id:?} is not a valid path segment.")]
	InvalidEntityId {
		/// Rejected id.
		id: String,
	},
	/// OAuth token endpoint URL is invalid.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured timeout.
	#[error("Request timed out while calling the API.")]
	Timeout,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_hints_follow_variants() {
		let err = Error::RateLimited { retry_after: Duration::seconds(3) };

		assert_eq!(err.status(), Some(429));
		assert!(err.is_transient());

		let err = Error::Validation {
			status: 422,
			message: "name is required".into(),
			details: None,
		};

		assert_eq!(err.status(), Some(422));
		assert!(!err.is_transient());
		assert_eq!(Error::from(TransportError::Timeout).status(), None);
	}
}
