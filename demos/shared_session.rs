//! Demonstrates several workers sharing one appliance login through the session lease broker.
//!
//! Each worker leases the session, "calls" the appliance, and drops the lease. The fake
//! appliance only logs in when the broker decides it must, and logs out once the last lease is
//! returned. Run with `RUST_LOG=session_lease_broker=debug` to see the lock and lease events.

// std
use std::{
	env,
	sync::atomic::{AtomicUsize, Ordering},
	thread,
	time::Duration,
};
// crates.io
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
// self
use session_lease_broker::{
	broker::{Broker, BrokerConfig, LeaseRequest},
	ext::FnAuthenticator,
	session::{HolderId, HostId},
};

static LOGINS: AtomicUsize = AtomicUsize::new(0);

fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.init();

	let dir = env::temp_dir().join(format!("session-lease-broker-demo-{}", std::process::id()));
	let config = BrokerConfig::builder().directory(&dir).build()?;
	let authenticator = FnAuthenticator::new(
		|host: &HostId| {
			let n = LOGINS.fetch_add(1, Ordering::SeqCst);

			println!("appliance {host}: login #{n}");

			Ok(format!("session-{n}"))
		},
		|host: &HostId, session: &str| {
			println!("appliance {host}: logout {session}");

			Ok(())
		},
	);
	let broker = Broker::new(config, authenticator);
	let host = HostId::new("fw1")?;

	thread::scope(|scope| -> Result<()> {
		let mut workers = Vec::new();

		for i in 0..4 {
			let broker = broker.clone().with_holder(HolderId::new(format!("worker-{i}"))?);
			let host = host.clone();

			workers.push(scope.spawn(move || -> Result<()> {
				let lease = broker.lease(LeaseRequest::new(host))?;

				println!("worker-{i} calls the appliance with {}", lease.token());
				thread::sleep(Duration::from_millis(50));
				println!("worker-{i} done: {:?}", lease.release()?);

				Ok(())
			}));
		}

		for worker in workers {
			worker.join().map_err(|_| color_eyre::eyre::eyre!("worker panicked"))??;
		}

		Ok(())
	})?;

	println!("logins performed: {}", LOGINS.load(Ordering::SeqCst));
	println!("final record: {:#?}", broker.record(&host)?);

	Ok(())
}
