//! Thread-safe in-memory query cache keyed by endpoint and serialized arguments.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	cache::{CacheTag, Endpoint, EntityType},
};

type EntryMap = Arc<RwLock<HashMap<CacheKey, CacheEntry>>>;

/// Identity of a cached query: endpoint name plus canonical JSON arguments.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey {
	/// Endpoint name, e.g. `Department.list`.
	pub endpoint: String,
	/// Serialized call arguments.
	pub args: String,
}
impl CacheKey {
	/// Builds the key for `endpoint` called with `args`.
	pub fn new(endpoint: &Endpoint, args: &Value) -> Self {
		Self { endpoint: endpoint.name(), args: args.to_string() }
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}({})", self.endpoint, self.args)
	}
}

/// Cached query result with the tags it provides.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
	/// Normalized payload.
	pub data: Value,
	/// Tags provided by the query.
	pub tags: Vec<CacheTag>,
	/// Instant the payload was stored.
	pub fetched_at: OffsetDateTime,
	/// Instant after which the entry is no longer served.
	pub expires_at: OffsetDateTime,
}
impl CacheEntry {
	/// Returns `true` if the entry has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the entry provides `tag`.
	pub fn provides(&self, tag: &CacheTag) -> bool {
		self.tags.contains(tag)
	}
}

/// Snapshot taken before an optimistic patch so it can be rolled back.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchUndo {
	/// Patched entry.
	pub key: CacheKey,
	/// Payload before the patch.
	pub previous: Value,
}

/// Thread-safe cache shared by clones of an [`ApiClient`](crate::client::ApiClient).
#[derive(Clone, Debug, Default)]
pub struct QueryCache(EntryMap);
impl QueryCache {
	/// Returns the cached payload if present and fresh at `now`.
	///
	/// An expired entry is evicted on lookup.
	pub fn get_at(&self, key: &CacheKey, now: OffsetDateTime) -> Option<Value> {
		{
			let guard = self.0.read();

			match guard.get(key) {
				Some(entry) if !entry.is_expired_at(now) => return Some(entry.data.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut guard = self.0.write();

		if guard.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
			guard.remove(key);
		}

		None
	}

	/// Returns the cached payload if present and fresh.
	pub fn get(&self, key: &CacheKey) -> Option<Value> {
		self.get_at(key, OffsetDateTime::now_utc())
	}

	/// Returns the full entry, fresh or not.
	pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
		self.0.read().get(key).cloned()
	}

	/// Stores a payload with its tags for `ttl`, starting at `now`.
	///
	/// Entries already expired at `now` are dropped first.
	pub fn insert_at(
		&self,
		key: CacheKey,
		data: Value,
		tags: Vec<CacheTag>,
		ttl: Duration,
		now: OffsetDateTime,
	) {
		let entry = CacheEntry { data, tags, fetched_at: now, expires_at: now + ttl };
		let mut guard = self.0.write();

		guard.retain(|_, entry| !entry.is_expired_at(now));
		guard.insert(key, entry);
	}

	/// Removes every entry providing any of `tags`, returning the removed keys sorted.
	pub fn invalidate(&self, tags: &[CacheTag]) -> Vec<CacheKey> {
		if tags.is_empty() {
			return Vec::new();
		}

		self.remove_where(|entry| tags.iter().any(|tag| entry.provides(tag)))
	}

	/// Removes every entry providing any tag of `entity`, item or collection alike.
	pub fn invalidate_entity(&self, entity: EntityType) -> Vec<CacheKey> {
		self.remove_where(|entry| entry.tags.iter().any(|tag| tag.entity == entity))
	}

	fn remove_where<F>(&self, stale: F) -> Vec<CacheKey>
	where
		F: Fn(&CacheEntry) -> bool,
	{
		let mut guard = self.0.write();
		let mut removed = guard
			.iter()
			.filter(|(_, entry)| stale(entry))
			.map(|(key, _)| key.clone())
			.collect::<Vec<_>>();

		for key in &removed {
			guard.remove(key);
		}

		removed.sort();

		removed
	}

	/// Drops entries expired at `now`, returning how many were removed.
	pub fn purge_expired_at(&self, now: OffsetDateTime) -> usize {
		let mut guard = self.0.write();
		let before = guard.len();

		guard.retain(|_, entry| !entry.is_expired_at(now));

		before - guard.len()
	}

	/// Applies `patch` to every entry providing `tag`, returning undo snapshots.
	pub fn patch_tagged<F>(&self, tag: &CacheTag, mut patch: F) -> Vec<PatchUndo>
	where
		F: FnMut(&mut Value),
	{
		let mut guard = self.0.write();
		let mut undo = Vec::new();

		for (key, entry) in guard.iter_mut().filter(|(_, entry)| entry.provides(tag)) {
			undo.push(PatchUndo { key: key.clone(), previous: entry.data.clone() });
			patch(&mut entry.data);
		}

		undo
	}

	/// Restores patched entries that are still cached.
	pub fn undo(&self, patches: Vec<PatchUndo>) {
		let mut guard = self.0.write();

		for PatchUndo { key, previous } in patches {
			if let Some(entry) = guard.get_mut(&key) {
				entry.data = previous;
			}
		}
	}

	/// Number of cached entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` if nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.0.write().clear();
	}
}
