//! List parameters and endpoint call arguments.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	cache::Endpoint,
	error::ConfigError,
	request::ApiRequest,
};

/// Sort direction accepted by list endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	/// Ascending.
	#[default]
	Asc,
	/// Descending.
	Desc,
}
impl SortOrder {
	/// Query-string label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}
}
impl Display for SortOrder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Pagination, search, sort, and filter arguments for list endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
	/// One-based page number.
	pub page: Option<u32>,
	/// Page size.
	pub limit: Option<u32>,
	/// Free-text search term.
	pub search: Option<String>,
	/// Field to sort by.
	pub sort_by: Option<String>,
	/// Sort direction.
	pub sort_order: Option<SortOrder>,
	/// Entity-specific filters such as `status` or `schoolId`.
	#[serde(default)]
	pub filters: BTreeMap<String, String>,
}
impl ListParams {
	/// Sets the page number.
	pub fn page(mut self, page: u32) -> Self {
		self.page = Some(page);

		self
	}

	/// Sets the page size.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Sets the search term.
	pub fn search(mut self, term: impl Into<String>) -> Self {
		self.search = Some(term.into());

		self
	}

	/// Sorts by `field` in `order`.
	pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
		self.sort_by = Some(field.into());
		self.sort_order = Some(order);

		self
	}

	/// Adds an entity-specific filter.
	pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.filters.insert(key.into(), value.into());

		self
	}

	/// Renders query pairs, skipping blank values.
	pub fn to_query(&self) -> Vec<(String, String)> {
		let mut pairs = Vec::new();

		if let Some(page) = self.page {
			pairs.push(("page".into(), page.to_string()));
		}
		if let Some(limit) = self.limit {
			pairs.push(("limit".into(), limit.to_string()));
		}
		if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
			pairs.push(("search".into(), search.to_owned()));
		}
		if let Some(sort_by) = self.sort_by.as_deref().filter(|s| !s.is_empty()) {
			pairs.push(("sortBy".into(), sort_by.to_owned()));
			pairs.push(("sortOrder".into(), self.sort_order.unwrap_or_default().to_string()));
		}

		pairs.extend(
			self.filters
				.iter()
				.filter(|(_, value)| !value.trim().is_empty())
				.map(|(key, value)| (key.clone(), value.clone())),
		);

		pairs
	}
}

/// Arguments of one endpoint invocation; also the cache key arguments for queries.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EndpointCall {
	/// Entity id for item-addressed endpoints.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Query parameters.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub query: Vec<(String, String)>,
	/// JSON body for mutations.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<Value>,
}
impl EndpointCall {
	/// Call addressing entity `id`.
	pub fn with_id(id: impl Into<String>) -> Self {
		Self { id: Some(id.into()), ..Default::default() }
	}

	/// Call carrying list parameters.
	pub fn with_params(params: &ListParams) -> Self {
		Self { query: params.to_query(), ..Default::default() }
	}

	/// Attaches a JSON body.
	pub fn body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Canonical JSON of the call, used as cache key arguments.
	pub fn cache_args(&self) -> Result<Value, ConfigError> {
		serde_json::to_value(self).map_err(ConfigError::BodySerialize)
	}

	/// Builds the HTTP request for `endpoint`.
	pub fn request(&self, endpoint: Endpoint) -> Result<ApiRequest, ConfigError> {
		let path = endpoint.path(self.id.as_deref())?;
		let request = ApiRequest::new(endpoint.method(), path).query_pairs(self.query.iter().cloned());

		Ok(match &self.body {
			Some(body) => request.body(body.clone()),
			None => request,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		cache::{Action, EntityType},
		request::Method,
	};

	#[test]
	fn list_params_render_in_stable_order() {
		let params = ListParams::default()
			.page(2)
			.limit(20)
			.search("  ")
			.sort("name", SortOrder::Desc)
			.filter("status", "active")
			.filter("schoolId", "s1")
			.filter("type", " ");

		assert_eq!(
			params.to_query(),
			vec![
				("page".to_owned(), "2".to_owned()),
				("limit".to_owned(), "20".to_owned()),
				("sortBy".to_owned(), "name".to_owned()),
				("sortOrder".to_owned(), "desc".to_owned()),
				("schoolId".to_owned(), "s1".to_owned()),
				("status".to_owned(), "active".to_owned()),
			]
		);
	}

	#[test]
	fn calls_render_requests_and_cache_args() {
		let endpoint = Endpoint::new(EntityType::Workflow, Action::Approve)
			.expect("Workflows should support approval.");
		let call = EndpointCall::with_id("w1").body(json!({ "comment": "ok" }));
		let request = call.request(endpoint).expect("Request should render.");

		assert_eq!(request.method, Method::Post);
		assert_eq!(request.path, "/workflows/w1/approve");
		assert_eq!(request.body, Some(json!({ "comment": "ok" })));
		assert_eq!(
			call.cache_args().expect("Args should serialize."),
			json!({ "id": "w1", "body": { "comment": "ok" } })
		);
		assert_eq!(EndpointCall::default().cache_args().expect("Args should serialize."), json!({}));
	}
}
