//! Login/logout callback contract invoked by the broker while it holds the session lock.

// self
use crate::{_prelude::*, session::HostId};

/// Error type returned by authenticator callbacks; its `Display` text is cached on the record.
pub type AuthError = Box<dyn StdError + Send + Sync>;

/// Performs the remote login and logout for an appliance host.
///
/// Both callbacks run inside the broker's critical section, so a slow call stalls every other
/// caller on the machine. Implementations that talk to the network should bound their own
/// timeouts and report a timeout as an error.
pub trait SessionAuthenticator
where
	Self: Send + Sync,
{
	/// Logs in to `host` and returns the new session string.
	fn login(&self, host: &HostId) -> Result<String, AuthError>;

	/// Tears down `session` on `host`.
	fn logout(&self, host: &HostId, session: &str) -> Result<(), AuthError>;
}
impl<T> SessionAuthenticator for Arc<T>
where
	T: ?Sized + SessionAuthenticator,
{
	fn login(&self, host: &HostId) -> Result<String, AuthError> {
		(**self).login(host)
	}

	fn logout(&self, host: &HostId, session: &str) -> Result<(), AuthError> {
		(**self).logout(host, session)
	}
}

/// Adapts a pair of closures into a [`SessionAuthenticator`].
#[derive(Clone)]
pub struct FnAuthenticator<L, O> {
	login: L,
	logout: O,
}
impl<L, O> FnAuthenticator<L, O>
where
	L: Fn(&HostId) -> Result<String, AuthError> + Send + Sync,
	O: Fn(&HostId, &str) -> Result<(), AuthError> + Send + Sync,
{
	/// Wraps the login and logout closures.
	pub fn new(login: L, logout: O) -> Self {
		Self { login, logout }
	}
}
impl<L, O> SessionAuthenticator for FnAuthenticator<L, O>
where
	L: Fn(&HostId) -> Result<String, AuthError> + Send + Sync,
	O: Fn(&HostId, &str) -> Result<(), AuthError> + Send + Sync,
{
	fn login(&self, host: &HostId) -> Result<String, AuthError> {
		(self.login)(host)
	}

	fn logout(&self, host: &HostId, session: &str) -> Result<(), AuthError> {
		(self.logout)(host, session)
	}
}
impl<L, O> Debug for FnAuthenticator<L, O> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnAuthenticator(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn closures_receive_host_and_session() {
		let auth = FnAuthenticator::new(
			|host: &HostId| Ok(format!("session-for-{host}")),
			|_: &HostId, session: &str| {
				if session.starts_with("session-for-") {
					Ok(())
				} else {
					Err("unknown session".into())
				}
			},
		);
		let host = HostId::new("fw1").expect("Host fixture should be valid.");
		let session = auth.login(&host).expect("Login closure should succeed.");

		assert_eq!(session, "session-for-fw1");
		assert!(auth.logout(&host, &session).is_ok());
		assert_eq!(
			auth.logout(&host, "bogus").expect_err("Logout should reject bogus sessions.").to_string(),
			"unknown session"
		);
	}
}
