//! Authenticated, self-healing API client.
//!
//! [`ApiClient::execute`] performs one logical request: it waits out any rate-limit window
//! and in-flight refresh, attaches the bearer token and a request id, and normalizes the
//! response. A 401 triggers a single-flight refresh through the [`RefreshGate`] and one retry;
//! a failed refresh fires the [`LoginRedirect`] and surfaces
//! [`Error::RefreshFailed`](crate::error::Error::RefreshFailed).

mod execute;
mod gate;
mod metrics;
mod throttle;

pub use gate::*;
pub use metrics::ClientMetrics;
pub use throttle::Throttle;

// self
use crate::{
	_prelude::*,
	auth::{LogOnlyRedirect, LoginRedirect, TokenProvider},
	cache::QueryCache,
	config::ClientConfig,
	http::{ApiHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Console API client owning its transport, auth collaborators, refresh gate, and cache.
///
/// Clones share the gate, throttle, cache, and counters, so a clone handed to another task
/// still participates in the same single-flight refresh. Separately constructed clients are
/// fully isolated.
pub struct ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Validated configuration.
	pub config: Arc<ClientConfig>,
	/// Auth session issuing bearer tokens.
	pub tokens: Arc<dyn TokenProvider>,
	/// Navigation hook fired when a refresh fails.
	pub redirect: Arc<dyn LoginRedirect>,
	/// Tag-aware query cache.
	pub cache: QueryCache,
	/// Shared counters for request and refresh outcomes.
	pub metrics: Arc<ClientMetrics>,
	gate: Arc<RefreshGate>,
	throttle: Arc<Throttle>,
}
impl<C, M> ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: ClientConfig,
		tokens: Arc<dyn TokenProvider>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config: Arc::new(config),
			tokens,
			redirect: Arc::new(LogOnlyRedirect),
			cache: QueryCache::default(),
			metrics: Default::default(),
			gate: Default::default(),
			throttle: Default::default(),
		}
	}

	/// Sets or replaces the login redirect hook.
	pub fn with_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
		self.redirect = redirect;

		self
	}

	/// Refresh gate shared by this client and its clones.
	pub fn refresh_gate(&self) -> &RefreshGate {
		&self.gate
	}

	/// Rate-limit window shared by this client and its clones.
	pub fn throttle(&self) -> &Throttle {
		&self.throttle
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by a reqwest transport built from `config`.
	pub fn new(config: ClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
		let http_client = ReqwestHttpClient::from_config(&config)?;

		Ok(Self::with_http_client(config, tokens, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Clone for ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			config: self.config.clone(),
			tokens: self.tokens.clone(),
			redirect: self.redirect.clone(),
			cache: self.cache.clone(),
			metrics: self.metrics.clone(),
			gate: self.gate.clone(),
			throttle: self.throttle.clone(),
		}
	}
}
impl<C, M> Debug for ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("api_prefix", &self.config.api_prefix)
			.field("refresh_epoch", &self.gate.epoch())
			.field("cached_entries", &self.cache.len())
			.finish()
	}
}
