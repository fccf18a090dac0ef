// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for one broker instance.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
	acquires: AtomicU64,
	reuses: AtomicU64,
	logins: AtomicU64,
	login_failures: AtomicU64,
	logouts: AtomicU64,
	logout_failures: AtomicU64,
}
impl BrokerMetrics {
	/// Returns the total number of acquire calls.
	pub fn acquires(&self) -> u64 {
		self.acquires.load(Ordering::Relaxed)
	}

	/// Returns the number of acquires served without calling login.
	pub fn reuses(&self) -> u64 {
		self.reuses.load(Ordering::Relaxed)
	}

	/// Returns the number of successful login callbacks.
	pub fn logins(&self) -> u64 {
		self.logins.load(Ordering::Relaxed)
	}

	/// Returns the number of failed login callbacks.
	pub fn login_failures(&self) -> u64 {
		self.login_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of successful logout callbacks.
	pub fn logouts(&self) -> u64 {
		self.logouts.load(Ordering::Relaxed)
	}

	/// Returns the number of failed logout callbacks.
	pub fn logout_failures(&self) -> u64 {
		self.logout_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_acquire(&self) {
		self.acquires.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reuse(&self) {
		self.reuses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_login(&self, ok: bool) {
		let counter = if ok { &self.logins } else { &self.login_failures };

		counter.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_logout(&self, ok: bool) {
		let counter = if ok { &self.logouts } else { &self.logout_failures };

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
