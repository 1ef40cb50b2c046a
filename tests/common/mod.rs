#![allow(dead_code)]

// std
use std::{
	future::Future,
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
#[cfg(feature = "reqwest")] use httpmock::MockServer;
use parking_lot::Mutex;
use serde_json::Value;
// self
use console_api_client::{
	auth::{LoginRedirect, ProviderError, TokenFuture, TokenProvider, TokenSecret},
	client::ApiClient,
	config::ClientConfig,
	error::Error,
	http::{
		ApiHttpClient, ResponseMetadata, ResponseMetadataSlot, TransportErrorMapper,
		map_generic_transport_error,
	},
	oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{HeaderValue, Response, header::AUTHORIZATION},
	},
	url::Url,
};

/// Client over the in-process scripted transport.
pub type ScriptedApiClient = ApiClient<ScriptedHttp, GenericMapper>;

/// Token provider that hands out `current` until a refresh swaps in `refreshed`.
pub struct ScriptedTokens {
	current: Mutex<Option<String>>,
	refreshed: Result<Option<String>, ProviderError>,
	delay: std::time::Duration,
	refreshes: AtomicUsize,
}
impl ScriptedTokens {
	pub fn new(current: &str, refreshed: Option<&str>) -> Self {
		Self {
			current: Mutex::new(Some(current.to_owned())),
			refreshed: Ok(refreshed.map(str::to_owned)),
			delay: std::time::Duration::ZERO,
			refreshes: AtomicUsize::new(0),
		}
	}

	pub fn failing(current: &str, error: ProviderError) -> Self {
		Self { refreshed: Err(error), ..Self::new(current, None) }
	}

	pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
		self.delay = delay;

		self
	}

	pub fn refreshes(&self) -> usize {
		self.refreshes.load(Ordering::SeqCst)
	}
}
impl TokenProvider for ScriptedTokens {
	fn token(&self) -> TokenFuture<'_> {
		let token = self.current.lock().clone().map(TokenSecret::new);

		Box::pin(async move { Ok(token) })
	}

	fn refresh_token(&self) -> TokenFuture<'_> {
		Box::pin(async move {
			self.refreshes.fetch_add(1, Ordering::SeqCst);

			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}

			let next = match self.refreshed.clone() {
				Ok(next) => next,
				Err(err) => return Err(err),
			};

			if let Some(token) = &next {
				*self.current.lock() = Some(token.clone());
			}

			Ok(next.map(TokenSecret::new))
		})
	}
}

/// Redirect hook remembering every login path it was asked to open.
#[derive(Default)]
pub struct RecordingRedirect(Mutex<Vec<String>>);
impl RecordingRedirect {
	pub fn calls(&self) -> Vec<String> {
		self.0.lock().clone()
	}
}
impl LoginRedirect for RecordingRedirect {
	fn redirect_to_login(&self, path: &str) {
		self.0.lock().push(path.to_owned());
	}
}

#[cfg(feature = "reqwest")]
pub fn config_for(server: &MockServer) -> ClientConfig {
	let base_url = Url::parse(&server.base_url()).expect("Mock server URL should parse.");

	ClientConfig::builder(base_url).build().expect("Mock server config should build.")
}

#[cfg(feature = "reqwest")]
pub fn client_for(
	server: &MockServer,
	tokens: Arc<dyn TokenProvider>,
	redirect: Arc<RecordingRedirect>,
) -> console_api_client::client::ReqwestApiClient {
	console_api_client::client::ReqwestApiClient::new(config_for(server), tokens)
		.expect("Reqwest client should build.")
		.with_redirect(redirect)
}

/// Canned response produced by a [`ScriptedHttp`] responder.
pub struct Scripted {
	pub status: u16,
	pub headers: Vec<(&'static str, String)>,
	pub body: String,
}
impl Scripted {
	pub fn json(status: u16, body: Value) -> Self {
		Self { status, headers: vec![("content-type", "application/json".into())], body: body.to_string() }
	}

	pub fn empty(status: u16) -> Self {
		Self { status, headers: Vec::new(), body: String::new() }
	}

	pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
		self.headers.push((name, value.into()));

		self
	}
}

type Responder = dyn Fn(&HttpRequest) -> Scripted + Send + Sync;

/// In-process transport answering through a closure and recording every request.
#[derive(Clone)]
pub struct ScriptedHttp {
	responder: Arc<Responder>,
	requests: Arc<Mutex<Vec<HttpRequest>>>,
}
impl ScriptedHttp {
	pub fn new<F>(responder: F) -> Self
	where
		F: 'static + Fn(&HttpRequest) -> Scripted + Send + Sync,
	{
		Self { responder: Arc::new(responder), requests: Default::default() }
	}

	pub fn calls(&self) -> usize {
		self.requests.lock().len()
	}

	pub fn authorizations(&self) -> Vec<Option<String>> {
		self.requests
			.lock()
			.iter()
			.map(bearer_of)
			.collect()
	}

	pub fn with_requests<T>(&self, inspect: impl FnOnce(&[HttpRequest]) -> T) -> T {
		inspect(&self.requests.lock())
	}
}
impl ApiHttpClient for ScriptedHttp {
	type Handle = ScriptedHttp;
	type TransportError = std::io::Error;

	fn with_metadata(&self, _slot: ResponseMetadataSlot) -> Self::Handle {
		self.clone()
	}
}
impl<'c> AsyncHttpClient<'c> for ScriptedHttp {
	type Error = HttpClientError<std::io::Error>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let scripted = (self.responder)(&request);

		self.requests.lock().push(request);

		let mut builder = Response::builder().status(scripted.status);

		for (name, value) in scripted.headers {
			builder = builder.header(name, value);
		}

		let response = builder.body(scripted.body.into_bytes()).map_err(HttpClientError::<std::io::Error>::Http);

		Box::pin(async move { response })
	}
}

/// Mapper delegating to the transport-agnostic classification.
#[derive(Clone, Debug, Default)]
pub struct GenericMapper;
impl TransportErrorMapper<std::io::Error> for GenericMapper {
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<std::io::Error>,
	) -> Error {
		map_generic_transport_error(metadata, error)
	}
}

pub fn bearer_of(request: &HttpRequest) -> Option<String> {
	request
		.headers()
		.get(AUTHORIZATION)
		.and_then(|value: &HeaderValue| value.to_str().ok())
		.map(str::to_owned)
}

pub fn scripted_client(
	http: &ScriptedHttp,
	tokens: Arc<dyn TokenProvider>,
	redirect: Arc<RecordingRedirect>,
) -> ScriptedApiClient {
	let base_url = Url::parse("https://console.example.com").expect("Fixture URL should parse.");
	let config = ClientConfig::builder(base_url).build().expect("Fixture config should build.");

	ScriptedApiClient::with_http_client(config, tokens, http.clone(), GenericMapper)
		.with_redirect(redirect)
}
