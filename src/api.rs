//! Cache-aware resource facade over [`ApiClient::execute`].
//!
//! Queries are served from the [`QueryCache`](crate::cache::QueryCache) while fresh and store
//! the tags their payload provides. Mutations execute unconditionally and, on success, drop
//! every cached entry providing a tag the endpoint invalidates, so the next query refetches.

mod actions;
mod params;
mod resource;

pub use params::*;
pub use resource::*;

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	cache::{CacheKey, Endpoint, EndpointKind, EntityType},
	client::ApiClient,
	http::{ApiHttpClient, TransportErrorMapper},
	obs::{self, Operation, Outcome, RequestSpan},
};

impl<C, M> ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Facade over one entity collection.
	pub fn resource(&self, entity: EntityType) -> Resource<'_, C, M> {
		Resource::new(self, entity)
	}

	/// Runs a query endpoint through the cache.
	///
	/// Mutation endpoints are forwarded to [`mutate`](Self::mutate).
	pub async fn query(&self, endpoint: Endpoint, call: &EndpointCall) -> Result<Value> {
		const OP: Operation = Operation::Query;

		if endpoint.kind() == EndpointKind::Mutation {
			return self.mutate(endpoint, call).await;
		}

		let key = CacheKey::new(&endpoint, &call.cache_args()?);

		if let Some(hit) = self.cache.get(&key) {
			obs::note_cache(&key, true);

			return Ok(hit);
		}

		obs::note_cache(&key, false);

		let span = RequestSpan::new(OP, &key.endpoint);

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span
			.instrument(async {
				let data = self.execute(&call.request(endpoint)?).await?;
				let tags = endpoint.provided_tags(call.id.as_deref(), &data);
				let ttl = endpoint.keep_unused_data_for(self.config.keep_unused_data_for);

				self.cache.insert_at(key, data.clone(), tags, ttl, OffsetDateTime::now_utc());

				Ok::<_, Error>(data)
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(OP, Outcome::Success),
			Err(_) => obs::record_outcome(OP, Outcome::Failure),
		}

		result
	}

	/// Runs a mutation endpoint and invalidates the tags it makes stale.
	pub async fn mutate(&self, endpoint: Endpoint, call: &EndpointCall) -> Result<Value> {
		const OP: Operation = Operation::Mutation;

		let span = RequestSpan::new(OP, &endpoint.name());

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span
			.instrument(async {
				let data = self.execute(&call.request(endpoint)?).await?;
				let stale = endpoint.invalidated_tags(call.id.as_deref(), &data);
				let mut removed = self.cache.invalidate(&stale);

				if endpoint.invalidates_collection() {
					removed.extend(self.cache.invalidate_entity(endpoint.entity));
				}

				obs::note_invalidation(&endpoint.name(), removed.len());

				Ok::<_, Error>(data)
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(OP, Outcome::Success),
			Err(_) => obs::record_outcome(OP, Outcome::Failure),
		}

		result
	}
}
