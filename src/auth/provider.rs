//! Token provider contract consumed by the request client.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`TokenProvider`] methods.
pub type TokenFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Option<TokenSecret>, ProviderError>> + 'a + Send>>;

/// External auth session that issues bearer tokens.
///
/// `Ok(None)` means the session has no token to offer. After [`refresh_token`](Self::refresh_token)
/// yields a new token, subsequent [`token`](Self::token) calls must return that token so peers
/// waiting on a refresh observe it on their retry.
pub trait TokenProvider
where
	Self: Send + Sync,
{
	/// Returns the current bearer token, if the session has one.
	fn token(&self) -> TokenFuture<'_>;

	/// Forces the session to mint a fresh bearer token.
	fn refresh_token(&self) -> TokenFuture<'_>;
}

/// Failures reported by a [`TokenProvider`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderError {
	/// Session backend could not be reached or answered unexpectedly.
	#[error("Auth session is unavailable: {message}.")]
	Unavailable {
		/// Human-readable failure summary.
		message: String,
	},
	/// Session backend refused to issue a token.
	#[error("Auth session rejected the request: {reason}.")]
	Rejected {
		/// Provider-supplied reason.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Provider returning a fixed token that can never be refreshed.
#[derive(Clone, Debug, Default)]
pub struct StaticTokenProvider(Option<TokenSecret>);
impl StaticTokenProvider {
	/// Creates a provider that always returns `token`.
	pub fn new(token: impl Into<String>) -> Self {
		Self(Some(TokenSecret::new(token)))
	}

	/// Creates a provider that never attaches a token.
	pub fn anonymous() -> Self {
		Self(None)
	}
}
impl TokenProvider for StaticTokenProvider {
	fn token(&self) -> TokenFuture<'_> {
		let token = self.0.clone();

		Box::pin(async move { Ok(token) })
	}

	fn refresh_token(&self) -> TokenFuture<'_> {
		Box::pin(async { Ok(None) })
	}
}
