//! Generic CRUD facade bound to one entity collection.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	api::{EndpointCall, ListParams},
	cache::{Action, Endpoint, EntityType},
	client::ApiClient,
	http::{ApiHttpClient, TransportErrorMapper},
	normalize::{self, Page},
};

/// Borrowed handle exposing the catalogued actions of one entity type.
pub struct Resource<'a, C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: &'a ApiClient<C, M>,
	entity: EntityType,
}
impl<'a, C, M> Resource<'a, C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(client: &'a ApiClient<C, M>, entity: EntityType) -> Self {
		Self { client, entity }
	}

	/// Entity type addressed by this facade.
	pub fn entity(&self) -> EntityType {
		self.entity
	}

	/// Catalogued endpoint for `action`, or a configuration error when unsupported.
	pub fn endpoint(&self, action: Action) -> Result<Endpoint> {
		Ok(Endpoint::new(self.entity, action)?)
	}

	/// Fetches one page of the collection.
	pub async fn list(&self, params: &ListParams) -> Result<Value> {
		self.client.query(self.endpoint(Action::List)?, &EndpointCall::with_params(params)).await
	}

	/// Fetches one page and decodes its items.
	pub async fn list_as<T>(&self, params: &ListParams) -> Result<Page<T>>
	where
		T: DeserializeOwned,
	{
		let value = self.list(params).await?;

		Page::decode(value).map_err(|source| Error::ResponseParse { source, status: None })
	}

	/// Fetches one entity.
	pub async fn get(&self, id: &str) -> Result<Value> {
		self.client.query(self.endpoint(Action::Get)?, &EndpointCall::with_id(id)).await
	}

	/// Fetches and decodes one entity.
	pub async fn get_as<T>(&self, id: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let value = self.get(id).await?;

		normalize::decode(value).map_err(|source| Error::ResponseParse { source, status: None })
	}

	/// Creates an entity from `body`.
	pub async fn create(&self, body: Value) -> Result<Value> {
		self.client.mutate(self.endpoint(Action::Create)?, &EndpointCall::default().body(body)).await
	}

	/// Partially updates entity `id`.
	pub async fn update(&self, id: &str, body: Value) -> Result<Value> {
		self.client.mutate(self.endpoint(Action::Update)?, &EndpointCall::with_id(id).body(body)).await
	}

	/// Deletes entity `id`.
	pub async fn delete(&self, id: &str) -> Result<Value> {
		self.client.mutate(self.endpoint(Action::Delete)?, &EndpointCall::with_id(id)).await
	}

	/// Invokes any catalogued action, routing queries through the cache.
	pub async fn perform(&self, action: Action, call: &EndpointCall) -> Result<Value> {
		self.client.query(self.endpoint(action)?, call).await
	}
}
impl<C, M> Debug for Resource<'_, C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Resource").field("entity", &self.entity).finish()
	}
}
