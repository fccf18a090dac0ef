//! Lease policy and file locations for a [`Broker`](crate::broker::Broker).

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	lock::{DEFAULT_POLL_INTERVAL, ProcessLock},
	store::FileStore,
};

/// Validated broker configuration.
///
/// The policy values are deliberate knobs, not implementation details:
///
/// - `expiry_threshold`: a record untouched for this long is stale and the next acquire logs in
///   again.
/// - `force_refresh_suppression`: minimum spacing between forced logins, so a burst of callers
///   that all see a rejected session triggers one login instead of one each.
/// - `poll_interval`: sleep between lock attempts while another caller holds the lock.
/// - `lock_timeout`: upper bound on waiting for the lock; `None` waits indefinitely.
/// - `history_limit`: newest history entries kept per record; `None` keeps everything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerConfig {
	/// Token table file shared by every process on the machine.
	pub store_path: PathBuf,
	/// Lock file guarding the token table.
	pub lock_path: PathBuf,
	/// Age after which a record must be refreshed.
	pub expiry_threshold: Duration,
	/// Minimum spacing between two forced refreshes.
	pub force_refresh_suppression: Duration,
	/// Interval between lock attempts.
	pub poll_interval: StdDuration,
	/// Optional bound on lock waits.
	pub lock_timeout: Option<StdDuration>,
	/// Optional cap on history entries per record.
	pub history_limit: Option<usize>,
}
impl BrokerConfig {
	/// Default age after which a session is refreshed.
	pub const DEFAULT_EXPIRY_THRESHOLD: Duration = Duration::minutes(10);
	/// Default spacing between forced refreshes.
	pub const DEFAULT_FORCE_REFRESH_SUPPRESSION: Duration = Duration::minutes(1);
	/// Default number of history entries kept per record.
	pub const DEFAULT_HISTORY_LIMIT: usize = 200;

	/// Returns a builder seeded with the defaults.
	pub fn builder() -> BrokerConfigBuilder {
		BrokerConfigBuilder::default()
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if !self.expiry_threshold.is_positive() {
			return Err(ConfigError::NonPositiveWindow { name: "expiry threshold" });
		}
		if !self.force_refresh_suppression.is_positive() {
			return Err(ConfigError::NonPositiveWindow { name: "force refresh suppression" });
		}
		if self.poll_interval.is_zero() {
			return Err(ConfigError::NonPositivePollInterval);
		}
		if self.history_limit == Some(0) {
			return Err(ConfigError::EmptyHistoryLimit);
		}
		if self.store_path == self.lock_path {
			return Err(ConfigError::SharedPath { path: self.store_path.display().to_string() });
		}

		Ok(())
	}
}
impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			store_path: FileStore::default_path(),
			lock_path: ProcessLock::default_path(),
			expiry_threshold: Self::DEFAULT_EXPIRY_THRESHOLD,
			force_refresh_suppression: Self::DEFAULT_FORCE_REFRESH_SUPPRESSION,
			poll_interval: DEFAULT_POLL_INTERVAL,
			lock_timeout: None,
			history_limit: Some(Self::DEFAULT_HISTORY_LIMIT),
		}
	}
}

/// Builder for [`BrokerConfig`] values.
#[derive(Debug, Default)]
pub struct BrokerConfigBuilder {
	config: BrokerConfig,
}
impl BrokerConfigBuilder {
	/// Places the token table and lock file side by side in `dir`.
	pub fn directory(mut self, dir: impl AsRef<Path>) -> Self {
		let dir = dir.as_ref();

		self.config.store_path = dir.join(FileStore::DEFAULT_FILE_NAME);
		self.config.lock_path = dir.join(ProcessLock::DEFAULT_FILE_NAME);

		self
	}

	/// Sets the token table path.
	pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.config.store_path = path.into();

		self
	}

	/// Sets the lock file path.
	pub fn lock_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.config.lock_path = path.into();

		self
	}

	/// Overrides the expiry threshold (defaults to 10 minutes).
	pub fn expiry_threshold(mut self, window: Duration) -> Self {
		self.config.expiry_threshold = window;

		self
	}

	/// Overrides the forced-refresh suppression window (defaults to 1 minute).
	pub fn force_refresh_suppression(mut self, window: Duration) -> Self {
		self.config.force_refresh_suppression = window;

		self
	}

	/// Overrides the lock poll interval (defaults to 100 ms).
	pub fn poll_interval(mut self, interval: StdDuration) -> Self {
		self.config.poll_interval = interval;

		self
	}

	/// Bounds how long an operation waits for the lock.
	pub fn lock_timeout(mut self, timeout: StdDuration) -> Self {
		self.config.lock_timeout = Some(timeout);

		self
	}

	/// Caps the history kept per record; `None` keeps every entry.
	pub fn history_limit(mut self, limit: Option<usize>) -> Self {
		self.config.history_limit = limit;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<BrokerConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_documented_policy() {
		let config = BrokerConfig::builder().build().expect("Default config should validate.");

		assert_eq!(config.expiry_threshold, Duration::minutes(10));
		assert_eq!(config.force_refresh_suppression, Duration::minutes(1));
		assert_eq!(config.poll_interval, StdDuration::from_millis(100));
		assert_eq!(config.lock_timeout, None);
		assert_eq!(config.history_limit, Some(200));
		assert_ne!(config.store_path, config.lock_path);
	}

	#[test]
	fn directory_places_both_files() {
		let config = BrokerConfig::builder()
			.directory("/var/run/appliance")
			.build()
			.expect("Directory config should validate.");

		assert_eq!(config.store_path, Path::new("/var/run/appliance/tokens.json"));
		assert_eq!(config.lock_path, Path::new("/var/run/appliance/tokens.lock"));
	}

	#[test]
	fn rejects_degenerate_settings() {
		assert_eq!(
			BrokerConfig::builder().expiry_threshold(Duration::ZERO).build(),
			Err(ConfigError::NonPositiveWindow { name: "expiry threshold" })
		);
		assert_eq!(
			BrokerConfig::builder().force_refresh_suppression(Duration::seconds(-1)).build(),
			Err(ConfigError::NonPositiveWindow { name: "force refresh suppression" })
		);
		assert_eq!(
			BrokerConfig::builder().poll_interval(StdDuration::ZERO).build(),
			Err(ConfigError::NonPositivePollInterval)
		);
		assert_eq!(
			BrokerConfig::builder().history_limit(Some(0)).build(),
			Err(ConfigError::EmptyHistoryLimit)
		);
		assert!(matches!(
			BrokerConfig::builder().store_path("/tmp/x").lock_path("/tmp/x").build(),
			Err(ConfigError::SharedPath { .. })
		));
	}
}
