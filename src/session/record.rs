//! Per-host session record, its lifecycle helpers, and the diagnostic history trail.

// self
use crate::{
	_prelude::*,
	session::{HolderId, HostId, SessionSecret},
};

/// Lifecycle view of a record at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
	/// Valid, but no holder currently leases it.
	Idle,
	/// Valid and leased by at least one holder.
	Active,
	/// Valid, but older than the expiry threshold; the next acquire logs in again.
	Stale,
	/// Not usable; the next acquire logs in again.
	Invalid,
}

/// Why an acquire decided to invoke the login callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginReason {
	/// The record was created by this acquire.
	Created,
	/// The caller demanded a refresh outside the suppression window.
	Forced,
	/// The record aged past the expiry threshold.
	Expired,
	/// The record is marked invalid (prior failure, logout, or manual invalidation).
	Invalid,
}
impl LoginReason {
	/// Returns a stable label suitable for history entries and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LoginReason::Created => "created",
			LoginReason::Forced => "forced",
			LoginReason::Expired => "expired",
			LoginReason::Invalid => "invalid",
		}
	}
}
impl Display for LoginReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Timestamped, human-readable event in a record's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
	/// Instant the event was recorded.
	#[serde(with = "time::serde::rfc3339")]
	pub at: OffsetDateTime,
	/// Event description.
	pub event: String,
}

/// Shared session state for one appliance host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
	/// Host identity; unique within a [`TokenTable`](crate::session::TokenTable).
	pub host: HostId,
	/// Session string from the last successful login; empty until then and after logout.
	pub session: SessionSecret,
	/// Last time a lease decision touched the record.
	#[serde(with = "time::serde::rfc3339")]
	pub last_refreshed_at: OffsetDateTime,
	/// Last forced refresh; starts at creation, since the creating acquire always logs in.
	#[serde(with = "time::serde::rfc3339")]
	pub last_forced_at: OffsetDateTime,
	/// Outstanding leases per holder. Entries are removed when they reach zero.
	pub usage: BTreeMap<HolderId, u32>,
	/// Whether `session` is believed usable.
	pub valid: bool,
	/// Last failure description; only present while `valid` is false.
	pub error_message: Option<String>,
	/// Append-only diagnostic trail, oldest first.
	pub history: Vec<HistoryEntry>,
}
impl SessionRecord {
	/// Creates a fresh, invalid, unused record.
	pub fn new(host: HostId, now: OffsetDateTime) -> Self {
		let mut record = Self {
			host,
			session: SessionSecret::default(),
			last_refreshed_at: now,
			last_forced_at: now,
			usage: BTreeMap::new(),
			valid: false,
			error_message: None,
			history: Vec::new(),
		};

		record.push_history(now, "record created");

		record
	}

	/// Decides whether an acquire at `now` must log in before handing out the session.
	///
	/// Creation is reported by the caller; this only inspects existing state.
	pub fn login_reason(
		&self,
		force: bool,
		now: OffsetDateTime,
		expiry: Duration,
		suppression: Duration,
	) -> Option<LoginReason> {
		if force && now - self.last_forced_at >= suppression {
			return Some(LoginReason::Forced);
		}
		if now - self.last_refreshed_at >= expiry {
			return Some(LoginReason::Expired);
		}
		if !self.valid {
			return Some(LoginReason::Invalid);
		}

		None
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, now: OffsetDateTime, expiry: Duration) -> SessionStatus {
		if !self.valid {
			return SessionStatus::Invalid;
		}
		if now - self.last_refreshed_at >= expiry {
			return SessionStatus::Stale;
		}
		if self.is_in_use() { SessionStatus::Active } else { SessionStatus::Idle }
	}

	/// Stores a freshly issued session and marks the record usable.
	///
	/// An empty session string is recorded as a failure, keeping `valid` implies non-empty.
	pub fn mark_valid(&mut self, session: String, forced: bool, now: OffsetDateTime) {
		if session.is_empty() {
			self.mark_failed("login returned an empty session", now);

			return;
		}

		self.session = SessionSecret::new(session);
		self.valid = true;
		self.error_message = None;

		if forced {
			self.last_forced_at = now;
			self.push_history(now, "forced login succeeded");
		} else {
			self.push_history(now, "login succeeded");
		}
	}

	/// Marks the record unusable and caches the failure description.
	pub fn mark_failed(&mut self, message: impl Into<String>, now: OffsetDateTime) {
		let message = message.into();

		self.valid = false;
		self.push_history(now, format!("login failed: {message}"));
		self.error_message = Some(message);
	}

	/// Marks the record unusable without touching the cached session string.
	pub fn invalidate(&mut self, reason: impl Into<String>, now: OffsetDateTime) {
		let reason = reason.into();

		self.valid = false;
		self.push_history(now, format!("invalidated: {reason}"));
		self.error_message = Some(reason);
	}

	/// Drops the session after a logout attempt; `failure` is cached when the logout failed.
	pub fn mark_logged_out(&mut self, failure: Option<String>, now: OffsetDateTime) {
		self.valid = false;
		self.session = SessionSecret::default();

		match failure {
			Some(message) => {
				self.push_history(now, format!("logout failed: {message}"));
				self.error_message = Some(message);
			},
			None => {
				self.push_history(now, "logged out");
				self.error_message = Some("session logged out".into());
			},
		}
	}

	/// Stamps the refresh clock.
	pub fn touch(&mut self, now: OffsetDateTime) {
		self.last_refreshed_at = now;
	}

	/// Adds one lease for `holder` and returns its new count.
	pub fn add_usage(&mut self, holder: &HolderId) -> u32 {
		let count = self.usage.entry(holder.clone()).or_insert(0);

		*count = count.saturating_add(1);

		*count
	}

	/// Drops one lease for `holder`, removing the entry at zero.
	///
	/// Returns the holder's remaining count, or `None` when it held no lease.
	pub fn remove_usage(&mut self, holder: &HolderId) -> Option<u32> {
		let count = self.usage.get_mut(holder)?;

		*count = count.saturating_sub(1);

		let remaining = *count;

		if remaining == 0 {
			self.usage.remove(holder);
		}

		Some(remaining)
	}

	/// Returns `true` while any holder still leases the session.
	pub fn is_in_use(&self) -> bool {
		!self.usage.is_empty()
	}

	/// Total leases across all holders.
	pub fn total_usage(&self) -> u64 {
		self.usage.values().map(|&count| u64::from(count)).sum()
	}

	/// Appends a history entry.
	pub fn push_history(&mut self, at: OffsetDateTime, event: impl Into<String>) {
		self.history.push(HistoryEntry { at, event: event.into() });
	}

	/// Drops the oldest history entries so at most `limit` remain.
	pub fn trim_history(&mut self, limit: usize) {
		if self.history.len() > limit {
			let excess = self.history.len() - limit;

			self.history.drain(..excess);
		}
	}
}
