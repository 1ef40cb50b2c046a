//! Rate-limit window shared by every request of a client.

// crates.io
use tokio::time::{self, Instant};
// self
use crate::_prelude::*;

/// Earliest instant at which the next request may be dispatched after a 429.
#[derive(Debug, Default)]
pub struct Throttle(Mutex<Option<Instant>>);
impl Throttle {
	/// Pushes the window out to at least `delay` from now.
	pub fn defer(&self, delay: Duration) {
		let delay = std::time::Duration::try_from(delay).unwrap_or_default();
		let until = Instant::now() + delay;
		let mut guard = self.0.lock();

		*guard = Some(guard.map_or(until, |current| current.max(until)));
	}

	/// Sleeps until the window has passed.
	pub async fn wait(&self) {
		let deadline = *self.0.lock();

		if let Some(deadline) = deadline {
			if deadline > Instant::now() {
				time::sleep_until(deadline).await;
			}
		}
	}

	/// Time left in the current window, if any.
	pub fn remaining(&self) -> Option<Duration> {
		let deadline = (*self.0.lock())?;
		let left = deadline.checked_duration_since(Instant::now())?;

		Duration::try_from(left).ok().filter(|left| left.is_positive())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn wait_honors_the_longest_deferral() {
		let throttle = Throttle::default();
		let started = Instant::now();

		throttle.wait().await;

		assert_eq!(started.elapsed(), std::time::Duration::ZERO);

		throttle.defer(Duration::seconds(3));
		throttle.defer(Duration::seconds(1));

		assert_eq!(throttle.remaining(), Some(Duration::seconds(3)));

		throttle.wait().await;

		assert!(started.elapsed() >= std::time::Duration::from_secs(3));
		assert_eq!(throttle.remaining(), None);
	}
}
