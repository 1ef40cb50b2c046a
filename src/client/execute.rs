//! Request pipeline: throttle, gate, token, dispatch, classify, refresh-and-retry.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{
		HeaderMap, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::{ApiClient, RefreshGuard},
	error::ConfigError,
	http::{
		ApiHttpClient, REQUEST_ID_HEADER, ResponseMetadataSlot, TransportErrorMapper,
		parse_retry_after,
	},
	normalize::{self, ErrorEnvelope},
	obs::{self, Operation, Outcome, RequestSpan},
	request::{ApiRequest, new_request_id},
};

const ERROR_TEXT_LIMIT: usize = 200;

struct RawResponse {
	status: u16,
	headers: HeaderMap,
	body: Vec<u8>,
}

impl<C, M> ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Executes one logical request and returns the normalized payload.
	///
	/// Never surfaces a raw 401: the client refreshes (or waits for a peer's refresh) and
	/// retries once. See the [module docs](crate::client) for the full contract.
	pub async fn execute(&self, request: &ApiRequest) -> Result<Value> {
		const OP: Operation = Operation::Request;

		let span = RequestSpan::new(OP, &request.path);

		obs::record_outcome(OP, Outcome::Attempt);
		self.metrics.record_request();

		let result = span.instrument(self.run(request)).await;

		match &result {
			Ok(_) => obs::record_outcome(OP, Outcome::Success),
			Err(_) => obs::record_outcome(OP, Outcome::Failure),
		}

		result
	}

	/// Executes a request and decodes the normalized payload into `T`.
	pub async fn execute_as<T>(&self, request: &ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let value = self.execute(request).await?;

		normalize::decode(value).map_err(|source| Error::ResponseParse { source, status: None })
	}

	async fn run(&self, request: &ApiRequest) -> Result<Value> {
		self.throttle.wait().await;

		let epoch = self.gate.observe().await;
		let token = self.current_token().await;
		let response = self.dispatch(request, token.as_ref()).await?;

		if response.status != 401 {
			return self.finish(response).await;
		}

		let guard = self.gate.acquire().await;
		let token = if guard.epoch() != epoch {
			// A peer refreshed after this request read its token.
			drop(guard);

			self.current_token().await
		} else {
			Some(self.refresh(guard).await?)
		};

		self.metrics.record_retry();

		let response = self.dispatch(request, token.as_ref()).await?;

		self.finish(response).await
	}

	async fn refresh(&self, mut guard: RefreshGuard<'_>) -> Result<TokenSecret> {
		const OP: Operation = Operation::Refresh;

		let span = RequestSpan::new(OP, "refresh_token");

		obs::record_outcome(OP, Outcome::Attempt);
		self.metrics.record_refresh_attempt();
		guard.arm();

		let outcome = span.instrument(self.tokens.refresh_token()).await;

		drop(guard);

		match outcome {
			Ok(Some(token)) if !token.is_blank() => {
				self.metrics.record_refresh_success();
				obs::record_outcome(OP, Outcome::Success);
				obs::note_refresh(true, None);

				Ok(token)
			},
			Ok(_) => Err(self.refresh_failed("Auth session returned no token".into())),
			Err(err) => Err(self.refresh_failed(err.to_string())),
		}
	}

	fn refresh_failed(&self, reason: String) -> Error {
		self.metrics.record_refresh_failure();
		obs::record_outcome(Operation::Refresh, Outcome::Failure);
		obs::note_refresh(false, Some(&reason));
		self.redirect.redirect_to_login(&self.config.login_path);

		Error::RefreshFailed { reason }
	}

	async fn current_token(&self) -> Option<TokenSecret> {
		match self.tokens.token().await {
			Ok(token) => token.filter(|token| !token.is_blank()),
			Err(err) => {
				obs::note_token_lookup_failure(&err);

				None
			},
		}
	}

	async fn dispatch(
		&self,
		request: &ApiRequest,
		token: Option<&TokenSecret>,
	) -> Result<RawResponse> {
		let request_id = new_request_id();
		let http_request = self.build_http_request(request, token, &request_id)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());
		let response = handle
			.call(http_request)
			.await
			.map_err(|err| self.transport_mapper.map_transport_error(slot.take().as_ref(), err))?;
		let status = response.status().as_u16();

		obs::note_status(status, &request_id);

		let headers = response.headers().clone();

		Ok(RawResponse { status, headers, body: response.into_body() })
	}

	fn build_http_request(
		&self,
		request: &ApiRequest,
		token: Option<&TokenSecret>,
		request_id: &str,
	) -> Result<HttpRequest> {
		let mut url = self.config.endpoint_url(&request.path)?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(request.query.iter());
		}

		let mut builder = Request::builder()
			.method(request.method.to_http())
			.uri(url.as_str())
			.header(ACCEPT, "application/json")
			.header(REQUEST_ID_HEADER, request_id);

		if let Some(token) = token {
			builder = builder.header(AUTHORIZATION, token.bearer());
		}

		let body = match &request.body {
			Some(body) => {
				builder = builder.header(CONTENT_TYPE, "application/json");

				serde_json::to_vec(body).map_err(ConfigError::BodySerialize)?
			},
			None => Vec::new(),
		};

		builder.body(body).map_err(|err| ConfigError::from(err).into())
	}

	async fn finish(&self, response: RawResponse) -> Result<Value> {
		let RawResponse { status, headers, body } = response;

		match status {
			200..=299 => Ok(normalize::normalize(parse_success_body(&body, status)?)),
			429 => {
				let retry_after = self.backoff_for(parse_retry_after(&headers));

				self.metrics.record_rate_limited();
				self.throttle.defer(retry_after);
				self.throttle.wait().await;

				Err(Error::RateLimited { retry_after })
			},
			_ => Err(classify_failure(status, &parse_error_body(&body))),
		}
	}

	fn backoff_for(&self, hint: Option<Duration>) -> Duration {
		hint.filter(|hint| !hint.is_negative())
			.unwrap_or(self.config.rate_limit_backoff)
			.min(self.config.max_rate_limit_backoff)
	}
}

fn parse_success_body(body: &[u8], status: u16) -> Result<Value> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(Value::Null);
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::ResponseParse { source, status: Some(status) })
}

fn parse_error_body(body: &[u8]) -> Value {
	serde_json::from_slice(body).unwrap_or_else(|_| {
		let text = String::from_utf8_lossy(body);
		let text = text.trim();

		if text.is_empty() {
			Value::Null
		} else {
			serde_json::json!({ "message": text.chars().take(ERROR_TEXT_LIMIT).collect::<String>() })
		}
	})
}

fn classify_failure(status: u16, body: &Value) -> Error {
	let envelope = ErrorEnvelope::from_body(body);

	match status {
		401 => Error::AuthExpired { reason: envelope.message_or("Backend rejected the bearer token") },
		403 => Error::PermissionDenied { message: envelope.message_or("Permission denied") },
		500..=599 =>
			Error::Server { status, message: envelope.message_or("Internal server error") },
		400..=499 => Error::Validation {
			status,
			message: envelope.message_or(format!("Request failed with status {status}")),
			details: envelope.details,
		},
		_ => Error::Server { status, message: envelope.message_or(format!("Unexpected status {status}")) },
	}
}
