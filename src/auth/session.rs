//! OAuth 2.0 refresh-token session backing a [`TokenProvider`].
//!
//! The session keeps the current access/refresh pair in memory and performs the
//! `grant_type=refresh_token` exchange over the crate's own [`ApiHttpClient`] transport. A
//! rotated refresh token replaces the stored one; an `invalid_grant` answer ends the session so
//! the request client falls through to the login redirect.

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, RefreshToken, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponseType},
};
// self
use crate::{
	_prelude::*,
	auth::{ProviderError, TokenFuture, TokenProvider, TokenSecret},
	error::ConfigError,
	http::{ApiHttpClient, ResponseMetadataSlot},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

type RefreshClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[cfg(feature = "reqwest")]
/// Session specialized for the crate's default reqwest transport.
pub type ReqwestOAuthSession = OAuthSession<ReqwestHttpClient>;

#[derive(Default)]
struct SessionTokens {
	access: Option<TokenSecret>,
	refresh: Option<String>,
}

/// In-memory OAuth session that refreshes through the token endpoint.
pub struct OAuthSession<C>
where
	C: ?Sized + ApiHttpClient,
{
	oauth_client: RefreshClient,
	http_client: Arc<C>,
	tokens: RwLock<SessionTokens>,
}
impl<C> OAuthSession<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates an empty session for `client_id` against `token_endpoint`.
	pub fn new(
		client_id: impl Into<String>,
		token_endpoint: impl AsRef<str>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self, ConfigError> {
		let token_url = TokenUrl::new(token_endpoint.as_ref().to_owned())
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;

		Ok(Self {
			oauth_client: BasicClient::new(ClientId::new(client_id.into())).set_token_uri(token_url),
			http_client: http_client.into(),
			tokens: Default::default(),
		})
	}

	/// Authenticates refresh calls with a confidential client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.oauth_client = self.oauth_client.set_client_secret(ClientSecret::new(secret.into()));

		self
	}

	/// Seeds the session with tokens obtained at sign-in.
	pub fn with_tokens(self, access: impl Into<String>, refresh: Option<String>) -> Self {
		self.set_tokens(access, refresh);

		self
	}

	/// Replaces the stored token pair.
	pub fn set_tokens(&self, access: impl Into<String>, refresh: Option<String>) {
		let mut tokens = self.tokens.write();

		tokens.access = Some(TokenSecret::new(access));
		tokens.refresh = refresh.filter(|refresh| !refresh.trim().is_empty());
	}

	/// Forgets both tokens; later refreshes report no token.
	pub fn clear(&self) {
		*self.tokens.write() = SessionTokens::default();
	}

	/// Returns `true` while a refresh token is held.
	pub fn has_refresh_token(&self) -> bool {
		self.tokens.read().refresh.is_some()
	}

	fn access_token(&self) -> Option<TokenSecret> {
		self.tokens.read().access.clone()
	}

	fn refresh_secret(&self) -> Option<RefreshToken> {
		self.tokens.read().refresh.clone().map(RefreshToken::new)
	}

	fn rotate(&self, access: TokenSecret, refresh: Option<String>) {
		let mut tokens = self.tokens.write();

		tokens.access = Some(access);

		if let Some(refresh) = refresh {
			tokens.refresh = Some(refresh);
		}
	}
}
impl<C> TokenProvider for OAuthSession<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn token(&self) -> TokenFuture<'_> {
		let token = self.access_token();

		Box::pin(async move { Ok(token) })
	}

	fn refresh_token(&self) -> TokenFuture<'_> {
		Box::pin(async move {
			let Some(refresh) = self.refresh_secret() else {
				return Ok(None);
			};
			let slot = ResponseMetadataSlot::default();
			let handle = self.http_client.with_metadata(slot.clone());
			let outcome =
				self.oauth_client.exchange_refresh_token(&refresh).request_async(&handle).await;
			let status = slot.take().and_then(|meta| meta.status);

			match outcome {
				Ok(response) => {
					let access = TokenSecret::new(response.access_token().secret().to_owned());

					self.rotate(
						access.clone(),
						response.refresh_token().map(|refresh| refresh.secret().to_owned()),
					);

					Ok(Some(access))
				},
				Err(RequestTokenError::ServerResponse(response)) => {
					self.clear();

					if matches!(response.error(), BasicErrorResponseType::InvalidGrant) {
						return Ok(None);
					}

					let reason = response
						.error_description()
						.cloned()
						.unwrap_or_else(|| response.error().as_ref().to_owned());

					Err(ProviderError::Rejected { reason, status })
				},
				Err(RequestTokenError::Request(err)) =>
					Err(ProviderError::Unavailable { message: err.to_string() }),
				Err(RequestTokenError::Parse(err, _)) => Err(ProviderError::Unavailable {
					message: format!("Token response could not be decoded at {}", err.path()),
				}),
				Err(RequestTokenError::Other(message)) => Err(ProviderError::Unavailable { message }),
			}
		})
	}
}
impl<C> Debug for OAuthSession<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let tokens = self.tokens.read();

		f.debug_struct("OAuthSession")
			.field("client_id", &self.oauth_client.client_id().as_str())
			.field("has_access_token", &tokens.access.is_some())
			.field("has_refresh_token", &tokens.refresh.is_some())
			.finish()
	}
}
