// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for request and refresh outcomes.
#[derive(Debug, Default)]
pub struct ClientMetrics {
	requests: AtomicU64,
	retries: AtomicU64,
	rate_limited: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_successes: AtomicU64,
	refresh_failures: AtomicU64,
}
impl ClientMetrics {
	/// Returns the number of logical requests executed.
	pub fn requests(&self) -> u64 {
		self.requests.load(Ordering::Relaxed)
	}

	/// Returns the number of post-401 retries.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of 429 responses observed.
	pub fn rate_limited(&self) -> u64 {
		self.rate_limited.load(Ordering::Relaxed)
	}

	/// Returns the number of forced token refreshes requested from the provider.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that produced a token.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_successes.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that failed.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rate_limited(&self) {
		self.rate_limited.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}
}
