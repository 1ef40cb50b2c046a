mod common;

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use serde_json::json;
use time::Duration;
use tokio::time::Instant;
// self
use common::{RecordingRedirect, Scripted, ScriptedHttp, ScriptedTokens, scripted_client};
use console_api_client::{auth::StaticTokenProvider, error::Error, request::ApiRequest};

fn limited_then_ok(retry_after: Option<&'static str>) -> ScriptedHttp {
	let calls = AtomicUsize::new(0);

	ScriptedHttp::new(move |_| {
		if calls.fetch_add(1, Ordering::SeqCst) == 0 {
			let limited = Scripted::empty(429);

			match retry_after {
				Some(value) => limited.header("retry-after", value),
				None => limited,
			}
		} else {
			Scripted::json(200, json!({ "success": true, "data": { "ok": true } }))
		}
	})
}

#[tokio::test(start_paused = true)]
async fn retry_after_delays_before_surfacing() {
	let http = limited_then_ok(Some("3"));
	let client =
		scripted_client(&http, Arc::new(StaticTokenProvider::new("token-a")), Arc::default());
	let started = Instant::now();
	let err = client
		.execute(&ApiRequest::get("/modules"))
		.await
		.expect_err("A 429 should surface as rate limited.");

	assert!(matches!(err, Error::RateLimited { retry_after } if retry_after == Duration::seconds(3)));
	assert!(started.elapsed() >= std::time::Duration::from_secs(3));
	assert!(err.is_transient());

	let value = client
		.execute(&ApiRequest::get("/modules"))
		.await
		.expect("The window has passed, so the next call should succeed.");

	assert_eq!(value, json!({ "ok": true }));
	assert_eq!(http.calls(), 2);
	assert_eq!(client.metrics.rate_limited(), 1);
	assert_eq!(client.metrics.refresh_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_hint_uses_default_and_large_hints_are_capped() {
	let http = limited_then_ok(None);
	let client =
		scripted_client(&http, Arc::new(StaticTokenProvider::new("token-a")), Arc::default());
	let started = Instant::now();

	match client.execute(&ApiRequest::get("/roles")).await {
		Err(Error::RateLimited { retry_after }) => assert_eq!(retry_after, Duration::seconds(5)),
		other => panic!("Unexpected outcome: {other:?}."),
	}

	assert!(started.elapsed() >= std::time::Duration::from_secs(5));

	let http = limited_then_ok(Some("600"));
	let client =
		scripted_client(&http, Arc::new(StaticTokenProvider::new("token-a")), Arc::default());
	let started = Instant::now();

	match client.execute(&ApiRequest::get("/roles")).await {
		Err(Error::RateLimited { retry_after }) => assert_eq!(retry_after, Duration::seconds(60)),
		other => panic!("Unexpected outcome: {other:?}."),
	}

	let waited = started.elapsed();

	assert!(waited >= std::time::Duration::from_secs(60));
	assert!(waited < std::time::Duration::from_secs(600));
}

#[tokio::test(start_paused = true)]
async fn zero_hint_surfaces_without_waiting() {
	let http = limited_then_ok(Some("0"));
	let client =
		scripted_client(&http, Arc::new(StaticTokenProvider::new("token-a")), Arc::default());
	let started = Instant::now();

	match client.execute(&ApiRequest::get("/roles")).await {
		Err(Error::RateLimited { retry_after }) => assert_eq!(retry_after, Duration::ZERO),
		other => panic!("Unexpected outcome: {other:?}."),
	}

	assert!(started.elapsed() < std::time::Duration::from_secs(1));

	client.execute(&ApiRequest::get("/roles")).await.expect("Immediate retry should succeed.");

	assert!(started.elapsed() < std::time::Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn window_holds_back_peer_requests() {
	let http = limited_then_ok(Some("4"));
	let client =
		scripted_client(&http, Arc::new(StaticTokenProvider::new("token-a")), Arc::default());
	let _ = client.execute(&ApiRequest::get("/users")).await;

	client.throttle().defer(Duration::seconds(2));

	let started = Instant::now();

	client.execute(&ApiRequest::get("/users")).await.expect("Deferred call should succeed.");

	assert!(started.elapsed() >= std::time::Duration::from_secs(2));
	assert_eq!(http.calls(), 2);
}

#[tokio::test]
async fn refresh_then_retry_uses_the_new_token() {
	let http = ScriptedHttp::new(|request| match common::bearer_of(request).as_deref() {
		Some("Bearer fresh") => Scripted::json(200, json!({ "success": true, "data": [{ "id": "s1" }] })),
		_ => Scripted::empty(401),
	});
	let tokens = Arc::new(ScriptedTokens::new("stale", Some("fresh")));
	let redirect = Arc::new(RecordingRedirect::default());
	let client = scripted_client(&http, tokens.clone(), redirect.clone());
	let value = client
		.execute(&ApiRequest::get("/organizations/schools"))
		.await
		.expect("Retry with the refreshed token should succeed.");

	assert_eq!(value["data"], json!([{ "id": "s1" }]));
	assert_eq!(
		http.authorizations(),
		vec![Some("Bearer stale".to_owned()), Some("Bearer fresh".to_owned())]
	);
	assert!(http.with_requests(|requests| {
		requests.iter().all(|request| {
			request
				.headers()
				.get("x-request-id")
				.and_then(|value| value.to_str().ok())
				.is_some_and(|id| id.split_once('-').is_some_and(|(millis, suffix)| {
					millis.parse::<u128>().is_ok() && suffix.len() == 9
				}))
		})
	}));
	assert!(http.with_requests(|requests| {
		requests.iter().all(|request| {
			request.uri().to_string()
				== "https://console.example.com/api/v1/organizations/schools"
		})
	}));
}
