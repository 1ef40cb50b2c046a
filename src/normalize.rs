//! Response envelope normalization.
//!
//! The backend wraps payloads as `{success, data, meta}`, sometimes twice, and paginates
//! either inside `data` or through `meta`. [`normalize`] collapses every variant into one of
//! two shapes so callers never handle the wrapper:
//!
//! - a page: `{data: [...], total, page, limit, totalPages, hasNext, hasPrevious}`;
//! - the bare inner value for single objects and scalars.
//!
//! Bare arrays inside a successful envelope are wrapped as a single synthetic page. Bodies
//! without `success: true` pass through untouched, which also makes the function idempotent.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

const PAGE_KEYS: [&str; 4] = ["total", "page", "limit", "totalPages"];

/// Typed view of a normalized paginated payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
	/// Items on this page.
	pub data: Vec<T>,
	/// Total number of items across pages.
	pub total: u64,
	/// One-based page number.
	pub page: u64,
	/// Page size requested from the backend.
	pub limit: u64,
	/// Number of pages available.
	pub total_pages: u64,
	/// Whether a later page exists.
	#[serde(default)]
	pub has_next: bool,
	/// Whether an earlier page exists.
	#[serde(default)]
	pub has_previous: bool,
}
impl<T> Page<T>
where
	T: DeserializeOwned,
{
	/// Decodes a normalized value, accepting either a page or a bare array.
	pub fn decode(value: Value) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let value = match value {
			Value::Array(items) => synthetic_page(items),
			other => other,
		};

		decode(value)
	}
}

/// Deserializes a normalized value with path-aware errors.
pub fn decode<T>(value: Value) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value)
}

/// Collapses a raw response body into its normalized shape.
pub fn normalize(body: Value) -> Value {
	let Value::Object(mut envelope) = body else {
		return body;
	};

	if !is_success_envelope(&envelope) {
		return Value::Object(envelope);
	}

	let mut meta = envelope.remove("meta");
	let mut inner = envelope.remove("data").unwrap_or(Value::Null);

	loop {
		match inner {
			Value::Object(mut nested) if is_success_envelope(&nested) => {
				meta = nested.remove("meta").or(meta);
				inner = nested.remove("data").unwrap_or(Value::Null);
			},
			other => {
				inner = other;

				break;
			},
		}
	}

	match inner {
		Value::Array(items) => match meta {
			Some(Value::Object(meta)) => build_page(items, &[&meta]),
			_ => synthetic_page(items),
		},
		Value::Object(mut map) if is_page_shape(&map) => {
			let items = match map.remove("data") {
				Some(Value::Array(items)) => items,
				_ => Vec::new(),
			};
			let nested_meta = match map.remove("meta") {
				Some(Value::Object(nested)) => nested,
				_ => Map::new(),
			};
			let outer_meta = match meta {
				Some(Value::Object(outer)) => outer,
				_ => Map::new(),
			};

			build_page(items, &[&map, &nested_meta, &outer_meta])
		},
		other => other,
	}
}

/// Backend error details extracted from a failed response body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorEnvelope {
	/// Human-readable message, if the backend supplied one.
	pub message: Option<String>,
	/// Machine-readable code, if the backend supplied one.
	pub code: Option<String>,
	/// Field-level validation details.
	pub details: Option<Value>,
}
impl ErrorEnvelope {
	/// Reads `{error: {message, code, details}}`, `{message, errors}`, or `{error: "..."}`.
	pub fn from_body(body: &Value) -> Self {
		let Value::Object(map) = body else {
			return Self::default();
		};
		let mut envelope = Self::default();

		match map.get("error") {
			Some(Value::Object(error)) => {
				envelope.message = string_field(error, "message");
				envelope.code = string_field(error, "code");
				envelope.details = error.get("details").cloned().filter(|value| !value.is_null());
			},
			Some(Value::String(message)) => envelope.message = Some(message.clone()),
			_ => {},
		}

		envelope.message = envelope.message.or_else(|| string_field(map, "message"));
		envelope.code = envelope.code.or_else(|| string_field(map, "code"));
		envelope.details = envelope
			.details
			.or_else(|| map.get("errors").cloned().filter(|value| !value.is_null()));

		envelope
	}

	/// Message or a status-derived fallback.
	pub fn message_or(&self, fallback: impl Into<String>) -> String {
		self.message.clone().unwrap_or_else(|| fallback.into())
	}
}

fn is_success_envelope(map: &Map<String, Value>) -> bool {
	matches!(map.get("success"), Some(Value::Bool(true))) && map.contains_key("data")
}

fn is_page_shape(map: &Map<String, Value>) -> bool {
	if !matches!(map.get("data"), Some(Value::Array(_))) {
		return false;
	}

	PAGE_KEYS.iter().any(|key| map.contains_key(*key))
		|| matches!(map.get("meta"), Some(Value::Object(_)))
}

fn synthetic_page(items: Vec<Value>) -> Value {
	let len = items.len() as u64;

	page_value(items, len, 1, len, 1, false, false)
}

/// Builds a page from items plus pagination hints; earlier sources win.
fn build_page(items: Vec<Value>, sources: &[&Map<String, Value>]) -> Value {
	let number = |key: &str| sources.iter().find_map(|source| source.get(key)?.as_u64());
	let flag = |key: &str| sources.iter().find_map(|source| source.get(key)?.as_bool());
	let len = items.len() as u64;
	let total = number("total").unwrap_or(len);
	let page = number("page").unwrap_or(1).max(1);
	let limit = number("limit").unwrap_or(len);
	let total_pages =
		number("totalPages").unwrap_or(if limit == 0 { 1 } else { total.div_ceil(limit) });
	let has_next = flag("hasNext").unwrap_or(page < total_pages);
	let has_previous = flag("hasPrevious").unwrap_or(page > 1);

	page_value(items, total, page, limit, total_pages, has_next, has_previous)
}

fn page_value(
	items: Vec<Value>,
	total: u64,
	page: u64,
	limit: u64,
	total_pages: u64,
	has_next: bool,
	has_previous: bool,
) -> Value {
	let mut map = Map::new();

	map.insert("data".into(), Value::Array(items));
	map.insert("total".into(), total.into());
	map.insert("page".into(), page.into());
	map.insert("limit".into(), limit.into());
	map.insert("totalPages".into(), total_pages.into());
	map.insert("hasNext".into(), has_next.into());
	map.insert("hasPrevious".into(), has_previous.into());

	Value::Object(map)
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
	match map.get(key)? {
		Value::String(value) => Some(value.clone()),
		Value::Number(value) => Some(value.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[derive(Debug, PartialEq, Deserialize)]
	struct Department {
		id: String,
		name: String,
	}

	fn shapes() -> Vec<Value> {
		vec![
			json!([{ "id": "d1" }]),
			json!({ "success": true, "data": [{ "id": "d1" }, { "id": "d2" }] }),
			json!({
				"success": true,
				"data": { "data": [{ "id": "d1" }], "total": 1, "page": 1, "limit": 10, "totalPages": 1 }
			}),
			json!({
				"success": true,
				"data": { "success": true, "data": { "data": [{ "id": "d1" }], "total": 21, "page": 2, "limit": 10 } }
			}),
			json!({ "success": true, "data": [{ "id": "n1" }], "meta": { "total": 30, "page": 3, "limit": 1 } }),
			json!({ "success": true, "data": { "id": "r1", "name": "Admin" } }),
			json!({ "success": false, "data": null, "error": { "message": "nope" } }),
			json!({ "id": "raw" }),
		]
	}

	#[test]
	fn paginated_envelope_unwraps_to_page() {
		let body = json!({
			"success": true,
			"data": {
				"data": [{ "id": "d1", "name": "Science" }],
				"total": 1,
				"page": 1,
				"limit": 10,
				"totalPages": 1
			}
		});

		assert_eq!(
			normalize(body),
			json!({
				"data": [{ "id": "d1", "name": "Science" }],
				"total": 1,
				"page": 1,
				"limit": 10,
				"totalPages": 1,
				"hasNext": false,
				"hasPrevious": false
			})
		);
	}

	#[test]
	fn double_wrapped_page_derives_missing_fields() {
		let page = normalize(shapes().remove(3));

		assert_eq!(page["total"], json!(21));
		assert_eq!(page["totalPages"], json!(3));
		assert_eq!(page["hasNext"], json!(true));
		assert_eq!(page["hasPrevious"], json!(true));
		assert!(page.get("success").is_none());
	}

	#[test]
	fn bare_array_becomes_synthetic_page() {
		let page = normalize(shapes().remove(1));

		assert_eq!(page["total"], json!(2));
		assert_eq!(page["limit"], json!(2));
		assert_eq!(page["page"], json!(1));
		assert_eq!(page["totalPages"], json!(1));
	}

	#[test]
	fn meta_drives_pagination_for_arrays() {
		let page = normalize(shapes().remove(4));

		assert_eq!(page["total"], json!(30));
		assert_eq!(page["page"], json!(3));
		assert_eq!(page["totalPages"], json!(30));
		assert_eq!(page["hasNext"], json!(true));
	}

	#[test]
	fn single_object_unwraps_and_failures_pass_through() {
		assert_eq!(normalize(shapes().remove(5)), json!({ "id": "r1", "name": "Admin" }));

		let failed = shapes().remove(6);

		assert_eq!(normalize(failed.clone()), failed);
		assert_eq!(normalize(json!({ "id": "raw" })), json!({ "id": "raw" }));
	}

	#[test]
	fn normalization_is_idempotent() {
		for shape in shapes() {
			let once = normalize(shape.clone());

			assert_eq!(normalize(once.clone()), once, "Shape {shape} changed on second pass.");
		}
	}

	#[test]
	fn typed_page_decodes_pages_and_arrays() {
		let page: Page<Department> = Page::decode(json!({
			"data": [{ "id": "d1", "name": "Science" }],
			"total": 1,
			"page": 1,
			"limit": 10,
			"totalPages": 1
		}))
		.expect("Normalized page should decode.");

		assert_eq!(page.data, vec![Department { id: "d1".into(), name: "Science".into() }]);
		assert!(!page.has_next);

		let page: Page<Department> = Page::decode(json!([{ "id": "d2", "name": "Arts" }]))
			.expect("Bare arrays should decode as a single page.");

		assert_eq!(page.total, 1);

		let err = Page::<Department>::decode(json!({ "data": [{ "id": 7 }], "total": 1, "page": 1, "limit": 1, "totalPages": 1 }))
			.expect_err("Mismatched items should fail to decode.");

		assert_eq!(err.path().to_string(), "data[0].id");
	}

	#[test]
	fn error_envelope_reads_nested_and_flat_shapes() {
		let nested = ErrorEnvelope::from_body(&json!({
			"success": false,
			"error": { "code": "VALIDATION", "message": "name is required", "details": { "name": "required" } }
		}));

		assert_eq!(nested.message.as_deref(), Some("name is required"));
		assert_eq!(nested.code.as_deref(), Some("VALIDATION"));
		assert_eq!(nested.details, Some(json!({ "name": "required" })));

		let flat = ErrorEnvelope::from_body(&json!({ "message": "bad", "errors": ["x"] }));

		assert_eq!(flat.message_or("fallback"), "bad");
		assert_eq!(flat.details, Some(json!(["x"])));
		assert_eq!(ErrorEnvelope::from_body(&Value::Null).message_or("fallback"), "fallback");
	}
}
