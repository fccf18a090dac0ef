//! Two-layer process-exclusion lock guarding the broker's critical section.
//!
//! Layer one is an in-process [`Mutex`] shared by every [`ProcessLock`] in this process that
//! targets the same lock path. Layer two is the [`LockFile`], which excludes other processes.
//! A holder owns both layers; at most one thread of one process on the machine is inside the
//! critical section at any time.
//!
//! [`ProcessLock::enter`] polls [`ProcessLock::try_enter`] at a fixed interval. Waiters are not
//! queued, so there is no fairness between them, and without a timeout a waiter spins until the
//! lock frees up.

pub mod file;

pub use file::LockFile;

// std
use std::{
	env,
	sync::{LazyLock, Weak},
	thread,
	time::{Duration as StdDuration, Instant},
};
// self
use crate::{_prelude::*, obs};

/// Default interval between [`ProcessLock::try_enter`] attempts.
pub const DEFAULT_POLL_INTERVAL: StdDuration = StdDuration::from_millis(100);

type Gate = Arc<Mutex<()>>;

/// In-process gates by absolute lock path. Entries are weak, so a gate lives only as long as
/// some [`ProcessLock`] on its path; dead entries are pruned whenever a lock is created.
static GATES: LazyLock<Mutex<HashMap<PathBuf, Weak<Mutex<()>>>>> =
	LazyLock::new(|| Mutex::new(HashMap::new()));

/// Errors raised by the exclusion lock.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum LockError {
	/// Another thread or process holds the lock.
	#[error("Session lock is held by another caller.")]
	Busy,
	/// The lock file does not name this process as its owner.
	#[error("Session lock file is not owned by process {expected} (found {found:?}).")]
	NotOwner {
		/// Process id this guard recorded.
		expected: u32,
		/// Process id found in the lock file, if any.
		found: Option<u32>,
	},
	/// Waiting for the lock exceeded the configured timeout.
	#[error("Timed out after {waited:?} waiting for the session lock.")]
	Timeout {
		/// Time spent waiting.
		waited: StdDuration,
	},
	/// Lock file I/O failed.
	#[error("Session lock I/O failure: {message}.")]
	Io {
		/// Human-readable error payload.
		message: String,
	},
}

/// Machine-wide exclusion lock keyed by a lock file path.
#[derive(Clone)]
pub struct ProcessLock {
	path: PathBuf,
	gate: Gate,
}
impl ProcessLock {
	/// File name used under the default directory.
	pub const DEFAULT_FILE_NAME: &'static str = "tokens.lock";

	/// Creates a lock for `path`, joining the in-process gate of any other lock on that path.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let key = gate_key(&path);
		let mut gates = GATES.lock();

		gates.retain(|_, gate| gate.strong_count() > 0);

		let gate = match gates.get(&key).and_then(Weak::upgrade) {
			Some(gate) => gate,
			None => {
				let gate = Gate::default();

				gates.insert(key, Arc::downgrade(&gate));

				gate
			},
		};

		Self { path, gate }
	}

	/// Well-known location shared by every broker on the machine.
	pub fn default_path() -> PathBuf {
		env::temp_dir().join("session-lease-broker").join(Self::DEFAULT_FILE_NAME)
	}

	/// Lock file path.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Takes both layers without waiting.
	///
	/// If the lock file is busy the in-process layer is released before returning, so a busy
	/// sibling process never starves other threads of this process.
	pub fn try_enter(&self) -> Result<LockGuard<'_>, LockError> {
		let gate = self.gate.try_lock().ok_or(LockError::Busy)?;
		let file = LockFile::try_lock(&self.path)?;

		Ok(LockGuard { file: Some(file), gate: Some(gate) })
	}

	/// Polls [`try_enter`](Self::try_enter) every `poll_interval` until it succeeds.
	///
	/// `timeout` bounds the wait; `None` waits for as long as it takes. The lock is not
	/// reentrant: entering again on a thread that already holds it never succeeds.
	pub fn enter(
		&self,
		poll_interval: StdDuration,
		timeout: Option<StdDuration>,
	) -> Result<LockGuard<'_>, LockError> {
		let started = Instant::now();
		let mut contended = false;

		loop {
			match self.try_enter() {
				Err(LockError::Busy) => {
					let waited = started.elapsed();

					if timeout.is_some_and(|limit| waited >= limit) {
						return Err(LockError::Timeout { waited });
					}
					if !contended {
						contended = true;

						obs::event!(
							debug,
							path = %self.path.display(),
							owner = ?LockFile::read_owner(&self.path).ok().flatten(),
							"waiting for session lock"
						);
					}

					thread::sleep(poll_interval);
				},
				result => return result,
			}
		}
	}
}
impl Debug for ProcessLock {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProcessLock").field("path", &self.path).finish()
	}
}

/// Proof of holding both lock layers.
///
/// [`leave`](Self::leave) releases the lock file, then the in-process gate, and reports
/// failures. Dropping the guard does the same and logs failures instead.
#[must_use = "the session lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
	file: Option<LockFile>,
	gate: Option<parking_lot::MutexGuard<'a, ()>>,
}
impl LockGuard<'_> {
	/// Releases the lock.
	pub fn leave(mut self) -> Result<(), LockError> {
		self.release()
	}

	fn release(&mut self) -> Result<(), LockError> {
		let result = match self.file.take() {
			Some(file) => file.unlock(),
			None => Ok(()),
		};

		self.gate.take();

		result
	}
}
impl Drop for LockGuard<'_> {
	fn drop(&mut self) {
		if let Err(_e) = self.release() {
			obs::event!(error, error = %_e, "failed to release session lock");
		}
	}
}
impl Debug for LockGuard<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LockGuard").field("file", &self.file).finish()
	}
}

fn gate_key(path: &Path) -> PathBuf {
	std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
