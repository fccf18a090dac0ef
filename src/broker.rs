//! Session lease broker: one shared appliance login, leased to many callers.
//!
//! Every public operation follows the same shape: enter the [`ProcessLock`], reload the
//! [`TokenTable`] from the store, decide, persist, and leave the lock. Nothing is cached between
//! calls, so writes from sibling processes are always observed.

pub mod config;
pub mod lease;

mod acquire;
mod metrics;
mod release;

pub use config::*;
pub use lease::*;
pub use metrics::BrokerMetrics;

// self
use crate::{
	_prelude::*,
	ext::SessionAuthenticator,
	lock::ProcessLock,
	obs::{self, LeaseOp, LeaseOutcome, LeaseSpan},
	session::{HolderId, HostId, SessionRecord, TokenTable},
	store::{FileStore, TableStore},
};

/// Brokers a single appliance session per host across threads and processes.
#[derive(Clone)]
pub struct Broker {
	/// Shared counters for this broker instance.
	pub metrics: Arc<BrokerMetrics>,
	config: BrokerConfig,
	store: Arc<dyn TableStore>,
	lock: ProcessLock,
	authenticator: Arc<dyn SessionAuthenticator>,
	holder: HolderId,
}
impl Broker {
	/// Creates a broker backed by the token file and lock file named in `config`.
	///
	/// Leases are counted against the current process unless [`with_holder`](Self::with_holder)
	/// says otherwise.
	pub fn new(config: BrokerConfig, authenticator: impl SessionAuthenticator + 'static) -> Self {
		let store = Arc::new(FileStore::new(&config.store_path));

		Self::with_store(config, store, Arc::new(authenticator))
	}

	/// Creates a broker that persists through a caller-provided store.
	pub fn with_store(
		config: BrokerConfig,
		store: Arc<dyn TableStore>,
		authenticator: Arc<dyn SessionAuthenticator>,
	) -> Self {
		let lock = ProcessLock::new(&config.lock_path);

		Self {
			metrics: Default::default(),
			config,
			store,
			lock,
			authenticator,
			holder: HolderId::current_process(),
		}
	}

	/// Sets the holder identity that leases are counted against by default.
	pub fn with_holder(mut self, holder: HolderId) -> Self {
		self.holder = holder;

		self
	}

	/// Default holder identity.
	pub fn holder(&self) -> &HolderId {
		&self.holder
	}

	/// Active configuration.
	pub fn config(&self) -> &BrokerConfig {
		&self.config
	}

	/// Marks the host's session invalid so the next acquire logs in again.
	///
	/// Request layers call this when the appliance rejects a leased token.
	pub fn invalidate(&self, host: &HostId, reason: impl Into<String>) -> Result<()> {
		let reason = reason.into();

		self.observe(LeaseOp::Invalidate, host, || {
			self.with_table_mut(|table, now| {
				let record = table
					.find_by_host(host)
					.ok_or_else(|| Error::UnknownHost { host: host.clone() })?;

				record.invalidate(reason, now);

				Ok(())
			})?
		})
	}

	/// Reads the whole table under the lock.
	pub fn snapshot(&self) -> Result<TokenTable> {
		let _span = LeaseSpan::new(LeaseOp::Inspect, "*").entered();
		let guard = self.lock.enter(self.config.poll_interval, self.config.lock_timeout)?;
		let table = self.load_table()?;

		guard.leave()?;

		Ok(table)
	}

	/// Reads one host's record under the lock.
	pub fn record(&self, host: &HostId) -> Result<Option<SessionRecord>> {
		Ok(self.snapshot()?.get(host).cloned())
	}

	/// Runs `f` against a freshly loaded table inside the critical section and persists the
	/// table if `f` changed it. The lock is released on every path, including panics in `f`.
	fn with_table_mut<T>(&self, f: impl FnOnce(&mut TokenTable, OffsetDateTime) -> T) -> Result<T> {
		self.with_table_mut_at(None, f)
	}

	fn with_table_mut_at<T>(
		&self,
		requested_at: Option<OffsetDateTime>,
		f: impl FnOnce(&mut TokenTable, OffsetDateTime) -> T,
	) -> Result<T> {
		let guard = self.lock.enter(self.config.poll_interval, self.config.lock_timeout)?;
		let mut table = self.load_table()?;
		let before = table.clone();
		let now = requested_at.unwrap_or_else(OffsetDateTime::now_utc);
		let output = f(&mut table, now);

		if table != before {
			if let Some(limit) = self.config.history_limit {
				table.iter_mut().for_each(|record| record.trim_history(limit));
			}

			self.store.save(&table)?;
		}

		guard.leave()?;

		Ok(output)
	}

	fn load_table(&self) -> Result<TokenTable> {
		Ok(self.store.load()?.unwrap_or_default())
	}

	fn resolve_holder<'a>(&'a self, holder: Option<&'a HolderId>) -> &'a HolderId {
		holder.unwrap_or(&self.holder)
	}

	fn observe<T>(&self, op: LeaseOp, host: &HostId, f: impl FnOnce() -> Result<T>) -> Result<T> {
		let _span = LeaseSpan::new(op, host).entered();

		obs::record_lease_outcome(op, LeaseOutcome::Attempt);

		let result = f();

		match &result {
			Ok(_) => obs::record_lease_outcome(op, LeaseOutcome::Success),
			Err(_) => obs::record_lease_outcome(op, LeaseOutcome::Failure),
		}

		result
	}
}
impl Debug for Broker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("config", &self.config)
			.field("lock", &self.lock)
			.field("holder", &self.holder)
			.finish()
	}
}
