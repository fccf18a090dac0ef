//! Ordered, host-unique collection of session records persisted as one unit.

// self
use crate::{
	_prelude::*,
	session::{HostId, SessionRecord},
};

/// Every session record known on this machine, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenTable {
	records: Vec<SessionRecord>,
}
impl TokenTable {
	/// Builds a table from records, rejecting duplicate hosts.
	pub fn from_records(records: Vec<SessionRecord>) -> Result<Self, HostId> {
		let table = Self { records };

		match table.duplicate_host() {
			Some(host) => Err(host.clone()),
			None => Ok(table),
		}
	}

	/// Looks up the record for `host` for mutation.
	pub fn find_by_host(&mut self, host: &str) -> Option<&mut SessionRecord> {
		self.records.iter_mut().find(|record| record.host.as_ref() == host)
	}

	/// Looks up the record for `host`.
	pub fn get(&self, host: &str) -> Option<&SessionRecord> {
		self.records.iter().find(|record| record.host.as_ref() == host)
	}

	/// Returns the record for `host`, inserting a fresh one when absent.
	///
	/// The flag reports whether the record was created by this call.
	pub fn find_or_insert(
		&mut self,
		host: &HostId,
		now: OffsetDateTime,
	) -> (&mut SessionRecord, bool) {
		match self.records.iter().position(|record| &record.host == host) {
			Some(idx) => (&mut self.records[idx], false),
			None => {
				self.records.push(SessionRecord::new(host.clone(), now));

				let idx = self.records.len() - 1;

				(&mut self.records[idx], true)
			},
		}
	}

	/// Number of records.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Returns `true` when the table holds no records.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Iterates over records in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &SessionRecord> {
		self.records.iter()
	}

	pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SessionRecord> {
		self.records.iter_mut()
	}

	/// Returns the first host that appears more than once, if any.
	pub(crate) fn duplicate_host(&self) -> Option<&HostId> {
		self.records.iter().enumerate().find_map(|(idx, record)| {
			self.records[..idx].iter().any(|prev| prev.host == record.host).then_some(&record.host)
		})
	}
}
