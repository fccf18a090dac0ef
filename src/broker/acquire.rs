// self
use crate::{
	_prelude::*,
	broker::{Broker, LeaseRequest, SessionLease},
	obs::{self, LeaseOp},
	session::{LoginReason, SessionRecord},
};

impl Broker {
	/// Returns a usable session token for the request's host, logging in when needed.
	///
	/// A login happens when the record is new, when a forced refresh falls outside the
	/// suppression window, when the record has aged past the expiry threshold, or when the last
	/// login failed. A failed login is persisted and surfaces as [`Error::Login`]; it is retried on
	/// the next call. Every successful call must be matched by a release.
	pub fn acquire(&self, request: LeaseRequest) -> Result<String> {
		self.observe(LeaseOp::Acquire, &request.host, || self.acquire_locked(&request))
	}

	/// Acquires a token wrapped in a guard that releases it when dropped.
	pub fn lease(&self, request: LeaseRequest) -> Result<SessionLease<'_>> {
		let token = self.acquire(request.clone())?;

		Ok(SessionLease::new(self, &request, token))
	}

	fn acquire_locked(&self, request: &LeaseRequest) -> Result<String> {
		let holder = self.resolve_holder(request.holder.as_ref());

		self.metrics.record_acquire();
		self.with_table_mut_at(request.requested_at, |table, now| {
			let (record, created) = table.find_or_insert(&request.host, now);
			let reason = if created {
				Some(LoginReason::Created)
			} else {
				record.login_reason(
					request.force_login,
					now,
					self.config.expiry_threshold,
					self.config.force_refresh_suppression,
				)
			};

			match reason {
				Some(reason) => self.login(record, reason, now),
				None => self.metrics.record_reuse(),
			}

			record.touch(now);

			if !record.valid {
				return Err(Error::Login {
					host: request.host.clone(),
					message: record.error_message.clone().unwrap_or_default(),
				});
			}

			record.add_usage(holder);

			Ok(record.session.expose().to_owned())
		})?
	}

	fn login(&self, record: &mut SessionRecord, reason: LoginReason, now: OffsetDateTime) {
		obs::event!(info, host = %record.host, reason = reason.as_str(), "logging in");

		match self.authenticator.login(&record.host) {
			Ok(session) => {
				record.mark_valid(session, reason == LoginReason::Forced, now);

				self.metrics.record_login(record.valid);
			},
			Err(e) => {
				obs::event!(warn, host = %record.host, error = %e, "login failed");

				record.mark_failed(e.to_string(), now);

				self.metrics.record_login(false);
			},
		}
	}
}
