//! Client configuration: API location, timeouts, credentials mode, backoff, and cache TTLs.

// self
use crate::{_prelude::*, error::ConfigError};

/// Cross-origin credentials policy applied to outbound requests.
///
/// A native client has no ambient browser cookie jar and only talks to the API origin, so
/// [`CredentialsMode::Omit`] and [`CredentialsMode::SameOrigin`] behave the same: no cookie
/// store, bearer header only. [`CredentialsMode::Include`] enables a cookie store on the
/// reqwest transport so session cookies issued by the backend ride along with later calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsMode {
	/// Never send cookies.
	Omit,
	#[default]
	/// Browser default. Equivalent to [`CredentialsMode::Omit`] outside a browser.
	SameOrigin,
	/// Always send cookies.
	Include,
}
impl CredentialsMode {
	/// Returns the canonical label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Omit => "omit",
			Self::SameOrigin => "same-origin",
			Self::Include => "include",
		}
	}

	/// Returns `true` when the transport must keep a cookie store.
	pub const fn keeps_cookies(self) -> bool {
		matches!(self, Self::Include)
	}
}
impl Display for CredentialsMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for CredentialsMode {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"omit" => Ok(Self::Omit),
			"same-origin" | "same_origin" => Ok(Self::SameOrigin),
			"include" => Ok(Self::Include),
			_ => Err(ConfigError::UnknownCredentialsMode { value: s.to_owned() }),
		}
	}
}

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Origin (and optional base path) of the backend.
	pub base_url: Url,
	/// Versioned prefix inserted between the base URL and endpoint paths.
	pub api_prefix: String,
	/// Per-request timeout.
	pub timeout: Duration,
	/// Cookie policy for outbound requests.
	pub credentials: CredentialsMode,
	/// Backoff applied to a 429 that carries no usable `Retry-After`.
	pub rate_limit_backoff: Duration,
	/// Upper bound applied to any `Retry-After` hint.
	pub max_rate_limit_backoff: Duration,
	/// Default time a cached query result stays usable.
	pub keep_unused_data_for: Duration,
	/// Path handed to the login redirect when a refresh fails.
	pub login_path: String,
}
impl ClientConfig {
	/// Default versioned API prefix.
	pub const DEFAULT_API_PREFIX: &'static str = "/api/v1";
	/// Default cache lifetime for query results.
	pub const DEFAULT_KEEP_UNUSED_DATA_FOR: Duration = Duration::seconds(60);
	/// Default login path used on fatal auth failures.
	pub const DEFAULT_LOGIN_PATH: &'static str = "/sign-in";
	/// Default upper bound for rate-limit backoff.
	pub const DEFAULT_MAX_RATE_LIMIT_BACKOFF: Duration = Duration::seconds(60);
	/// Default backoff when a 429 omits `Retry-After`.
	pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::seconds(5);
	/// Default request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);

	/// Returns a builder seeded with defaults for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Loads configuration from `CONSOLE_API_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads configuration through an arbitrary variable lookup.
	///
	/// Recognized keys: `CONSOLE_API_URL` (required), `CONSOLE_API_PREFIX`,
	/// `CONSOLE_API_TIMEOUT_SECS`, `CONSOLE_API_CREDENTIALS`, `CONSOLE_LOGIN_PATH`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		const URL: &str = "CONSOLE_API_URL";
		const TIMEOUT: &str = "CONSOLE_API_TIMEOUT_SECS";

		let raw_url = lookup(URL).ok_or(ConfigError::InvalidEnv { name: URL, value: String::new() })?;
		let base_url =
			Url::parse(&raw_url).map_err(|_| ConfigError::InvalidBaseUrl { url: raw_url.clone() })?;
		let mut builder = Self::builder(base_url);

		if let Some(prefix) = lookup("CONSOLE_API_PREFIX") {
			builder = builder.api_prefix(prefix);
		}
		if let Some(raw) = lookup(TIMEOUT) {
			let secs = raw
				.trim()
				.parse::<i64>()
				.map_err(|_| ConfigError::InvalidEnv { name: TIMEOUT, value: raw.clone() })?;

			builder = builder.timeout(Duration::seconds(secs));
		}
		if let Some(raw) = lookup("CONSOLE_API_CREDENTIALS") {
			builder = builder.credentials(raw.parse()?);
		}
		if let Some(path) = lookup("CONSOLE_LOGIN_PATH") {
			builder = builder.login_path(path);
		}

		builder.build()
	}

	/// Joins the base URL, API prefix, and an endpoint path.
	pub fn endpoint_url(&self, path: &str) -> Result<Url, ConfigError> {
		let path = path.trim();

		if !path.starts_with('/') {
			return Err(ConfigError::InvalidPath { path: path.to_owned() });
		}

		let joined = format!(
			"{}{}{}",
			self.base_url.as_str().trim_end_matches('/'),
			self.api_prefix.trim_end_matches('/'),
			path
		);

		Url::parse(&joined).map_err(|_| ConfigError::InvalidPath { path: path.to_owned() })
	}

	/// Request timeout as a std duration for transport builders.
	pub fn timeout_std(&self) -> std::time::Duration {
		std::time::Duration::try_from(self.timeout).unwrap_or(std::time::Duration::from_secs(30))
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	base_url: Url,
	api_prefix: String,
	timeout: Duration,
	credentials: CredentialsMode,
	rate_limit_backoff: Duration,
	max_rate_limit_backoff: Duration,
	keep_unused_data_for: Duration,
	login_path: String,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			api_prefix: ClientConfig::DEFAULT_API_PREFIX.into(),
			timeout: ClientConfig::DEFAULT_TIMEOUT,
			credentials: CredentialsMode::default(),
			rate_limit_backoff: ClientConfig::DEFAULT_RATE_LIMIT_BACKOFF,
			max_rate_limit_backoff: ClientConfig::DEFAULT_MAX_RATE_LIMIT_BACKOFF,
			keep_unused_data_for: ClientConfig::DEFAULT_KEEP_UNUSED_DATA_FOR,
			login_path: ClientConfig::DEFAULT_LOGIN_PATH.into(),
		}
	}

	/// Overrides the API prefix (`/api/v1` by default). An empty prefix is allowed.
	pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.api_prefix = prefix.into();

		self
	}

	/// Overrides the request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the credentials mode.
	pub fn credentials(mut self, mode: CredentialsMode) -> Self {
		self.credentials = mode;

		self
	}

	/// Overrides the fallback 429 backoff.
	pub fn rate_limit_backoff(mut self, backoff: Duration) -> Self {
		self.rate_limit_backoff = backoff;

		self
	}

	/// Overrides the cap applied to `Retry-After` hints.
	pub fn max_rate_limit_backoff(mut self, cap: Duration) -> Self {
		self.max_rate_limit_backoff = cap;

		self
	}

	/// Overrides the default cache lifetime.
	pub fn keep_unused_data_for(mut self, ttl: Duration) -> Self {
		self.keep_unused_data_for = ttl;

		self
	}

	/// Overrides the login path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if self.base_url.cannot_be_a_base()
			|| self.base_url.query().is_some()
			|| self.base_url.fragment().is_some()
		{
			return Err(ConfigError::InvalidBaseUrl { url: self.base_url.to_string() });
		}

		let api_prefix = self.api_prefix.trim().to_owned();

		if !api_prefix.is_empty() && !api_prefix.starts_with('/') {
			return Err(ConfigError::InvalidPrefix { prefix: api_prefix });
		}
		if !self.timeout.is_positive() {
			return Err(ConfigError::ZeroTimeout);
		}

		let clamp = |value: Duration| if value.is_negative() { Duration::ZERO } else { value };
		let max_rate_limit_backoff = clamp(self.max_rate_limit_backoff);

		Ok(ClientConfig {
			base_url: self.base_url,
			api_prefix,
			timeout: self.timeout,
			credentials: self.credentials,
			rate_limit_backoff: clamp(self.rate_limit_backoff).min(max_rate_limit_backoff),
			max_rate_limit_backoff,
			keep_unused_data_for: clamp(self.keep_unused_data_for),
			login_path: self.login_path,
		})
	}
}
