//! Lease requests, release outcomes, and the scoped [`SessionLease`] guard.

// self
use crate::{
	_prelude::*,
	broker::Broker,
	obs,
	session::{HolderId, HostId, SessionSecret},
};

/// Parameters for [`Broker::acquire`] and [`Broker::lease`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaseRequest {
	/// Appliance host whose session is wanted.
	pub host: HostId,
	/// Holder to count the lease against; the broker's holder when `None`.
	pub holder: Option<HolderId>,
	/// Demands a fresh login unless one was forced within the suppression window.
	pub force_login: bool,
	/// Instant treated as "now"; the clock is read inside the lock when `None`.
	pub requested_at: Option<OffsetDateTime>,
}
impl LeaseRequest {
	/// Creates a plain, non-forced request for `host`.
	pub fn new(host: HostId) -> Self {
		Self { host, holder: None, force_login: false, requested_at: None }
	}

	/// Demands a forced refresh.
	pub fn force_login(mut self) -> Self {
		self.force_login = true;

		self
	}

	/// Overrides the force flag.
	pub fn with_force(mut self, force: bool) -> Self {
		self.force_login = force;

		self
	}

	/// Counts the lease against `holder` instead of the broker's holder.
	pub fn with_holder(mut self, holder: HolderId) -> Self {
		self.holder = Some(holder);

		self
	}

	/// Overrides the instant used for expiry and suppression checks.
	pub fn with_requested_at(mut self, instant: OffsetDateTime) -> Self {
		self.requested_at = Some(instant);

		self
	}
}

/// Parameters for [`Broker::release_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseRequest {
	/// Appliance host whose lease is returned.
	pub host: HostId,
	/// Holder the lease was counted against; the broker's holder when `None`.
	pub holder: Option<HolderId>,
	/// Instant recorded in history; the clock is read inside the lock when `None`.
	pub requested_at: Option<OffsetDateTime>,
}
impl ReleaseRequest {
	/// Creates a release for `host`.
	pub fn new(host: HostId) -> Self {
		Self { host, holder: None, requested_at: None }
	}

	/// Returns the lease counted against `holder`.
	pub fn with_holder(mut self, holder: HolderId) -> Self {
		self.holder = Some(holder);

		self
	}

	/// Overrides the instant recorded in history.
	pub fn with_requested_at(mut self, instant: OffsetDateTime) -> Self {
		self.requested_at = Some(instant);

		self
	}
}
impl From<&LeaseRequest> for ReleaseRequest {
	fn from(request: &LeaseRequest) -> Self {
		Self { host: request.host.clone(), holder: request.holder.clone(), requested_at: None }
	}
}

/// What a release did to the shared session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseOutcome {
	/// Other leases remain; the session stays logged in.
	Retained {
		/// Leases still outstanding across all holders.
		remaining: u64,
	},
	/// The last lease was returned and the session was logged out (or never existed).
	LoggedOut,
	/// The last lease was returned; logout failed but the record was still invalidated.
	LogoutFailed {
		/// Failure description from the logout callback.
		message: String,
	},
}

/// Scoped lease on a host's session, released when dropped.
///
/// Prefer [`release`](Self::release) where the outcome matters; a release failure during drop
/// can only be logged.
#[must_use = "dropping the lease releases it immediately"]
pub struct SessionLease<'a> {
	broker: &'a Broker,
	request: ReleaseRequest,
	token: SessionSecret,
	released: bool,
}
impl<'a> SessionLease<'a> {
	pub(crate) fn new(broker: &'a Broker, request: &LeaseRequest, token: String) -> Self {
		Self { broker, request: request.into(), token: SessionSecret::new(token), released: false }
	}

	/// Session string to authorize remote calls with.
	pub fn token(&self) -> &str {
		self.token.expose()
	}

	/// Host this lease belongs to.
	pub fn host(&self) -> &HostId {
		&self.request.host
	}

	/// Returns the lease and reports what happened to the session.
	pub fn release(mut self) -> Result<ReleaseOutcome> {
		self.released = true;

		self.broker.release_with(self.request.clone())
	}
}
impl Drop for SessionLease<'_> {
	fn drop(&mut self) {
		if self.released {
			return;
		}
		if let Err(_e) = self.broker.release_with(self.request.clone()) {
			obs::event!(
				warn,
				host = %self.request.host,
				error = %_e,
				"failed to release session lease on drop"
			);
		}
	}
}
impl Debug for SessionLease<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionLease")
			.field("request", &self.request)
			.field("token", &self.token)
			.field("released", &self.released)
			.finish()
	}
}
