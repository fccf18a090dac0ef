mod common;

// std
use std::{
	fs,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	thread,
	time::Duration as StdDuration,
};
// self
use common::{ScriptedAuthenticator, config, config_builder, host};
use session_lease_broker::{
	broker::{Broker, LeaseRequest, ReleaseOutcome},
	error::Error,
	lock::{LockError, LockFile, ProcessLock},
	session::{HolderId, TokenTable},
	store::{FileStore, StoreError, TableStore},
};

/// File store that counts how many callers are between `load` and `save` at once.
struct CountingStore {
	inner: FileStore,
	inside: Arc<AtomicUsize>,
	peak: Arc<AtomicUsize>,
}
impl TableStore for CountingStore {
	fn load(&self) -> Result<Option<TokenTable>, StoreError> {
		let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;

		self.peak.fetch_max(now, Ordering::SeqCst);
		thread::yield_now();

		self.inner.load()
	}

	fn save(&self, table: &TokenTable) -> Result<(), StoreError> {
		let result = self.inner.save(table);

		self.inside.fetch_sub(1, Ordering::SeqCst);

		result
	}
}

#[test]
fn brokers_never_overlap_inside_the_critical_section() {
	let config = config_builder("exclusion")
		.poll_interval(StdDuration::from_millis(1))
		.build()
		.expect("Config should validate.");
	let auth = ScriptedAuthenticator::shared();
	let inside = Arc::new(AtomicUsize::new(0));
	let peak = Arc::new(AtomicUsize::new(0));
	let fw1 = host("fw1");
	let workers: Vec<_> = (0..6)
		.map(|i| {
			let store = CountingStore {
				inner: FileStore::new(&config.store_path),
				inside: inside.clone(),
				peak: peak.clone(),
			};
			let broker = Broker::with_store(config.clone(), Arc::new(store), auth.clone())
				.with_holder(HolderId::new(format!("worker-{i}")).expect("Holder should be valid."));
			let fw1 = fw1.clone();

			thread::spawn(move || {
				for _ in 0..15 {
					broker.acquire(LeaseRequest::new(fw1.clone())).expect("Acquire should pass.");
					broker.release(&fw1).expect("Release should pass.");
				}
			})
		})
		.collect();

	for worker in workers {
		worker.join().expect("Worker thread should not panic.");
	}

	assert_eq!(peak.load(Ordering::SeqCst), 1);
	assert_eq!(
		LockFile::read_owner(&config.lock_path).expect("Lock file should be readable."),
		None,
		"No owner may remain once every caller left."
	);
}

#[test]
fn logout_only_happens_when_no_holder_remains() {
	let config = config_builder("refcount")
		.poll_interval(StdDuration::from_millis(1))
		.build()
		.expect("Config should validate.");
	let auth = ScriptedAuthenticator::shared();
	let fw1 = host("fw1");
	let workers: Vec<_> = (0..4)
		.map(|i| {
			let broker = Broker::new(config.clone(), auth.clone())
				.with_holder(HolderId::new(format!("worker-{i}")).expect("Holder should be valid."));
			let auth = auth.clone();
			let fw1 = fw1.clone();

			thread::spawn(move || {
				for _ in 0..10 {
					let lease =
						broker.lease(LeaseRequest::new(fw1.clone())).expect("Lease should be granted.");

					thread::sleep(StdDuration::from_millis(1));

					assert!(
						!auth.logouts().iter().any(|session| session == lease.token()),
						"Session {} was logged out while still leased.",
						lease.token()
					);

					lease.release().expect("Release should pass.");
				}
			})
		})
		.collect();

	for worker in workers {
		worker.join().expect("Worker thread should not panic.");
	}

	let logouts = auth.logouts();
	let mut unique = logouts.clone();

	unique.sort();
	unique.dedup();

	assert_eq!(unique.len(), logouts.len(), "Each session must be logged out exactly once.");
	assert_eq!(logouts.len(), auth.login_calls(), "Every login must be paired with one logout.");

	let broker = Broker::new(config, auth.clone());
	let record = broker.record(&fw1).expect("Record should load.").expect("Record should exist.");

	assert!(!record.is_in_use());
	assert!(!record.valid);
}

#[test]
fn held_lock_times_out_when_bounded() {
	let config = config_builder("timeout")
		.poll_interval(StdDuration::from_millis(5))
		.lock_timeout(StdDuration::from_millis(50))
		.build()
		.expect("Config should validate.");
	let lock = ProcessLock::new(&config.lock_path);
	let guard = lock.try_enter().expect("Test should take the lock first.");
	let broker = Broker::new(config, ScriptedAuthenticator::shared());
	let err = broker
		.acquire(LeaseRequest::new(host("fw1")))
		.expect_err("Acquire should time out while the lock is held.");

	assert!(matches!(err, Error::Lock(LockError::Timeout { .. })), "Unexpected error: {err:?}");

	guard.leave().expect("Test guard should leave cleanly.");
}

#[test]
fn leftover_lock_contents_do_not_block() {
	let config = config("leftover");

	fs::write(&config.lock_path, i32::MAX.to_string()).expect("Failed to plant leftover lock file.");

	let auth = ScriptedAuthenticator::shared();
	let broker = Broker::new(config.clone(), auth.clone());
	let token = broker
		.acquire(LeaseRequest::new(host("fw1")))
		.expect("An unlocked file naming a dead owner must not block.");

	assert_eq!(token, "S0");
	assert_eq!(LockFile::read_owner(&config.lock_path).expect("Lock file should be readable."), None);
	assert_eq!(
		broker.release(&host("fw1")).expect("Release should pass."),
		ReleaseOutcome::LoggedOut
	);
}

#[test]
fn corrupt_table_is_reported_not_overwritten() {
	let config = config("corrupt");

	fs::write(&config.store_path, "[{\"host\": \"fw1\"").expect("Failed to write corrupt table.");

	let broker = Broker::new(config.clone(), ScriptedAuthenticator::shared());
	let err = broker.acquire(LeaseRequest::new(host("fw1"))).expect_err("Corrupt table must fail.");

	assert!(matches!(err, Error::Storage(StoreError::Decode { .. })), "Unexpected error: {err:?}");
	assert_eq!(
		fs::read_to_string(&config.store_path).expect("Table file should still exist."),
		"[{\"host\": \"fw1\""
	);
	ProcessLock::new(&config.lock_path)
		.try_enter()
		.expect("The lock must be released on the error path.")
		.leave()
		.expect("Follow-up guard should leave cleanly.");
}
