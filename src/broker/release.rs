// self
use crate::{
	_prelude::*,
	broker::{Broker, ReleaseOutcome, ReleaseRequest},
	obs::{self, LeaseOp},
	session::{HostId, SessionRecord},
};

impl Broker {
	/// Returns one lease held by the broker's own holder.
	pub fn release(&self, host: &HostId) -> Result<ReleaseOutcome> {
		self.release_with(ReleaseRequest::new(host.clone()))
	}

	/// Returns one lease and logs out once no holder anywhere still uses the session.
	///
	/// A logout failure never blocks local cleanup: the record is invalidated either way and the
	/// failure is reported as [`ReleaseOutcome::LogoutFailed`].
	pub fn release_with(&self, request: ReleaseRequest) -> Result<ReleaseOutcome> {
		self.observe(LeaseOp::Release, &request.host, || self.release_locked(&request))
	}

	fn release_locked(&self, request: &ReleaseRequest) -> Result<ReleaseOutcome> {
		let holder = self.resolve_holder(request.holder.as_ref());

		self.with_table_mut_at(request.requested_at, |table, now| {
			let record = table
				.find_by_host(&request.host)
				.ok_or_else(|| Error::UnknownHost { host: request.host.clone() })?;

			if record.remove_usage(holder).is_none() {
				return Err(Error::NotHeld { host: request.host.clone(), holder: holder.clone() });
			}
			if record.is_in_use() {
				return Ok(ReleaseOutcome::Retained { remaining: record.total_usage() });
			}

			Ok(self.logout(record, now))
		})?
	}

	fn logout(&self, record: &mut SessionRecord, now: OffsetDateTime) -> ReleaseOutcome {
		if record.session.is_empty() {
			record.valid = false;
			record.push_history(now, "all leases released");

			return ReleaseOutcome::LoggedOut;
		}

		match self.authenticator.logout(&record.host, record.session.expose()) {
			Ok(()) => {
				obs::event!(info, host = %record.host, "logged out");

				record.mark_logged_out(None, now);
				self.metrics.record_logout(true);

				ReleaseOutcome::LoggedOut
			},
			Err(e) => {
				let message = e.to_string();

				obs::event!(warn, host = %record.host, error = %message, "logout failed");

				record.mark_logged_out(Some(message.clone()), now);
				self.metrics.record_logout(false);

				ReleaseOutcome::LogoutFailed { message }
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;
	use crate::{
		broker::{BrokerConfig, LeaseRequest},
		ext::FnAuthenticator,
		session::HolderId,
		store::MemoryStore,
	};

	fn config() -> BrokerConfig {
		let dir = env::temp_dir().join(format!(
			"session_lease_broker_release_{}_{}",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		));

		BrokerConfig::builder().directory(dir).build().expect("Config should validate.")
	}

	fn host() -> HostId {
		HostId::new("fw1").expect("Host fixture should be valid.")
	}

	fn broker(logout_fails: bool) -> (Broker, Arc<Mutex<Vec<String>>>) {
		let logged_out = Arc::new(Mutex::new(Vec::new()));
		let sink = logged_out.clone();
		let auth = FnAuthenticator::new(
			|_: &HostId| Ok("S0".to_owned()),
			move |_: &HostId, session: &str| {
				sink.lock().push(session.to_owned());

				if logout_fails { Err("appliance gone".into()) } else { Ok(()) }
			},
		);
		let broker = Broker::with_store(config(), Arc::new(MemoryStore::default()), Arc::new(auth));

		(broker, logged_out)
	}

	#[test]
	fn release_without_record_is_unknown_host() {
		let (broker, _) = broker(false);

		assert!(matches!(broker.release(&host()), Err(Error::UnknownHost { .. })));
	}

	#[test]
	fn release_by_foreign_holder_changes_nothing() {
		let (broker, logged_out) = broker(false);

		broker.acquire(LeaseRequest::new(host())).expect("Acquire should pass.");

		let stranger = HolderId::new("stranger").expect("Holder fixture should be valid.");
		let err = broker
			.release_with(ReleaseRequest::new(host()).with_holder(stranger))
			.expect_err("Foreign release must fail.");

		assert!(matches!(err, Error::NotHeld { .. }));

		let record = broker.record(&host()).expect("Record should load.").expect("Record should exist.");

		assert_eq!(record.total_usage(), 1);
		assert!(record.valid);
		assert!(logged_out.lock().is_empty());
	}

	#[test]
	fn last_release_logs_out_once() {
		let (broker, logged_out) = broker(false);

		broker.acquire(LeaseRequest::new(host())).expect("First acquire should pass.");
		broker.acquire(LeaseRequest::new(host())).expect("Second acquire should pass.");

		assert_eq!(
			broker.release(&host()).expect("First release should pass."),
			ReleaseOutcome::Retained { remaining: 1 }
		);
		assert!(logged_out.lock().is_empty());
		assert_eq!(
			broker.release(&host()).expect("Second release should pass."),
			ReleaseOutcome::LoggedOut
		);
		assert_eq!(*logged_out.lock(), ["S0"]);

		let record = broker.record(&host()).expect("Record should load.").expect("Record should exist.");

		assert!(!record.valid);
		assert!(record.session.is_empty());
		assert_eq!(broker.metrics.logouts(), 1);
	}

	#[test]
	fn logout_failure_still_clears_the_record() {
		let (broker, _) = broker(true);

		broker.acquire(LeaseRequest::new(host())).expect("Acquire should pass.");

		let outcome = broker.release(&host()).expect("Release should still succeed.");

		assert_eq!(outcome, ReleaseOutcome::LogoutFailed { message: "appliance gone".into() });

		let record = broker.record(&host()).expect("Record should load.").expect("Record should exist.");

		assert!(!record.valid);
		assert!(!record.is_in_use());
		assert_eq!(record.error_message.as_deref(), Some("appliance gone"));
		assert_eq!(broker.metrics.logout_failures(), 1);
	}

	#[test]
	fn scoped_lease_releases_on_drop() {
		let (broker, logged_out) = broker(false);

		{
			let lease = broker.lease(LeaseRequest::new(host())).expect("Lease should be granted.");

			assert_eq!(lease.token(), "S0");
		}

		assert_eq!(*logged_out.lock(), ["S0"]);
	}
}
