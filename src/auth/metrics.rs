//! Atomic counters describing auth-material renewal outcomes.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Thread-safe counters for auth material renewals, the initial grant included.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of renewal attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful renewals.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed renewals.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Point-in-time copy of every counter.
	pub fn snapshot(&self) -> RefreshSnapshot {
		RefreshSnapshot {
			attempts: self.attempts(),
			successes: self.successes(),
			failures: self.failures(),
		}
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	/// Records the outcome of a renewal started with [`record_attempt`](Self::record_attempt).
	pub(crate) fn record_outcome<T>(&self, result: &Result<T>) {
		match result {
			Ok(_) => self.record_success(),
			Err(_) => self.record_failure(),
		}
	}
}

/// Copy of [`RefreshMetrics`] taken at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSnapshot {
	/// Renewal attempts.
	pub attempts: u64,
	/// Successful renewals.
	pub successes: u64,
	/// Failed renewals.
	pub failures: u64,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ClientError;

	#[test]
	fn outcomes_split_by_result() {
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();
		metrics.record_outcome(&Ok::<_, Error>(()));
		metrics.record_attempt();
		metrics.record_outcome::<()>(&Err(
			ClientError::UnsupportedMethod { method: "TRACE".into() }.into(),
		));

		assert_eq!(metrics.snapshot(), RefreshSnapshot { attempts: 2, successes: 1, failures: 1 });
	}
}
