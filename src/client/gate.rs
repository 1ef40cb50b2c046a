//! Single-flight refresh gate owned by each client instance.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Async read/write gate guarding bearer-token refreshes.
///
/// Requests take a momentary read lock before dispatching so they never race an in-flight
/// refresh. A request that hits a 401 takes the write lock; the epoch tells it whether a peer
/// already refreshed since it read the token, in which case it retries instead of refreshing.
#[derive(Debug, Default)]
pub struct RefreshGate {
	lock: AsyncRwLock<()>,
	epoch: AtomicU64,
}
impl RefreshGate {
	/// Waits until no refresh is in flight and returns the current epoch.
	pub async fn observe(&self) -> u64 {
		let _unlocked = self.lock.read().await;

		self.epoch.load(Ordering::Acquire)
	}

	/// Acquires the gate exclusively.
	pub async fn acquire(&self) -> RefreshGuard<'_> {
		let write = self.lock.write().await;

		RefreshGuard { gate: self, epoch: self.epoch.load(Ordering::Acquire), armed: false, _write: write }
	}

	/// Number of refresh attempts completed so far.
	pub fn epoch(&self) -> u64 {
		self.epoch.load(Ordering::Acquire)
	}

	/// Returns `true` while a refresh holds the gate.
	pub fn is_locked(&self) -> bool {
		self.lock.try_read().is_none()
	}
}

/// Exclusive hold on a [`RefreshGate`]; releases on drop.
///
/// Once [`arm`](Self::arm)ed, dropping the guard advances the epoch, on success, failure,
/// and cancellation alike.
pub struct RefreshGuard<'a> {
	gate: &'a RefreshGate,
	epoch: u64,
	armed: bool,
	_write: AsyncRwLockWriteGuard<'a, ()>,
}
impl RefreshGuard<'_> {
	/// Epoch observed when the guard was acquired.
	pub fn epoch(&self) -> u64 {
		self.epoch
	}

	/// Marks the guard as performing a refresh attempt.
	pub fn arm(&mut self) {
		self.armed = true;
	}
}
impl Drop for RefreshGuard<'_> {
	fn drop(&mut self) {
		if self.armed {
			self.gate.epoch.fetch_add(1, Ordering::AcqRel);
		}
	}
}
impl Debug for RefreshGuard<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshGuard").field("epoch", &self.epoch).field("armed", &self.armed).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn armed_guard_advances_epoch_and_unlocks() {
		let gate = RefreshGate::default();

		assert_eq!(gate.observe().await, 0);

		{
			let mut guard = gate.acquire().await;

			assert!(gate.is_locked());

			guard.arm();
		}

		assert!(!gate.is_locked());
		assert_eq!(gate.epoch(), 1);

		drop(gate.acquire().await);

		assert_eq!(gate.epoch(), 1, "Unarmed guards leave the epoch alone.");
	}
}
