#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	env, fs,
	path::PathBuf,
	process,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
use time::OffsetDateTime;
// self
use session_lease_broker::{
	broker::{BrokerConfig, BrokerConfigBuilder},
	ext::{AuthError, SessionAuthenticator},
	session::HostId,
};

/// Authenticator that hands out `S0`, `S1`, ... and records every call.
#[derive(Debug, Default)]
pub struct ScriptedAuthenticator {
	login_calls: AtomicUsize,
	issued: AtomicUsize,
	failures: Mutex<VecDeque<String>>,
	logouts: Mutex<Vec<String>>,
}
impl ScriptedAuthenticator {
	pub fn shared() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Makes the next login calls fail with `message`, one per call.
	pub fn fail_next(&self, message: &str) {
		self.failures.lock().push_back(message.to_owned());
	}

	pub fn login_calls(&self) -> usize {
		self.login_calls.load(Ordering::SeqCst)
	}

	pub fn logouts(&self) -> Vec<String> {
		self.logouts.lock().clone()
	}
}
impl SessionAuthenticator for ScriptedAuthenticator {
	fn login(&self, _host: &HostId) -> Result<String, AuthError> {
		self.login_calls.fetch_add(1, Ordering::SeqCst);

		if let Some(message) = self.failures.lock().pop_front() {
			return Err(message.into());
		}

		Ok(format!("S{}", self.issued.fetch_add(1, Ordering::SeqCst)))
	}

	fn logout(&self, _host: &HostId, session: &str) -> Result<(), AuthError> {
		self.logouts.lock().push(session.to_owned());

		Ok(())
	}
}

/// Fresh directory for one test's token table and lock file.
pub fn temp_dir(tag: &str) -> PathBuf {
	let dir = env::temp_dir().join(format!(
		"session_lease_broker_{tag}_{}_{}",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	));

	fs::create_dir_all(&dir).expect("Failed to create test directory.");

	dir
}

pub fn config_builder(tag: &str) -> BrokerConfigBuilder {
	BrokerConfig::builder().directory(temp_dir(tag))
}

pub fn config(tag: &str) -> BrokerConfig {
	config_builder(tag).build().expect("Test config should validate.")
}

pub fn host(name: &str) -> HostId {
	HostId::new(name).expect("Host fixture should be valid.")
}
