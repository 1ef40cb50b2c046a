// self
use crate::{_prelude::*, cache::CacheKey, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type Instrumented<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type Instrumented<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: Operation, stage: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("console_api.request", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs how a response status was classified.
pub fn note_status(status: u16, request_id: &str) {
	#[cfg(feature = "tracing")]
	{
		match status {
			200..=299 => tracing::debug!(status, request_id, "API call succeeded."),
			401 => tracing::debug!(status, request_id, "API call rejected the bearer token."),
			429 => tracing::warn!(status, request_id, "API call was rate limited."),
			500..=599 =>
				tracing::warn!(status, request_id, "API call failed with a server error."),
			_ => tracing::warn!(status, request_id, "API call was rejected."),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (status, request_id);
	}
}

/// Logs a refresh attempt result.
pub fn note_refresh(refreshed: bool, reason: Option<&str>) {
	#[cfg(feature = "tracing")]
	{
		if refreshed {
			tracing::debug!("Bearer token refreshed.");
		} else {
			tracing::warn!(reason, "Bearer token refresh failed.");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (refreshed, reason);
	}
}

/// Logs a query cache lookup.
pub fn note_cache(key: &CacheKey, hit: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::trace!(key = %key, hit, "Query cache lookup.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, hit);
	}
}

/// Logs how many cached entries a mutation invalidated.
pub fn note_invalidation(endpoint: &str, removed: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(endpoint, removed, "Cache tags invalidated.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (endpoint, removed);
	}
}

/// Logs a token lookup failure; the request proceeds without a bearer token.
pub fn note_token_lookup_failure(error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %error, "Bearer token lookup failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}
