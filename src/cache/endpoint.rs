//! Endpoint catalog: which tags each query provides and each mutation invalidates.
//!
//! Every id-addressed mutation invalidates both the entity tag and the collection tag so
//! detail and list views refetch together. Creates invalidate the collection plus the id the
//! backend assigned, when the response carries one.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	cache::{CacheTag, EntityType},
	error::ConfigError,
	request::Method,
};

/// Whether an endpoint reads (and provides tags) or writes (and invalidates tags).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointKind {
	/// Cached read.
	Query,
	/// Cache-invalidating write.
	Mutation,
}

/// Operations the console performs against entity collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
	/// Paginated collection read.
	List,
	/// Single entity read.
	Get,
	/// Entity creation.
	Create,
	/// Partial update.
	Update,
	/// Deletion.
	Delete,
	/// Mark one notification as read.
	MarkRead,
	/// Mark every notification as read.
	MarkAllRead,
	/// Count unread notifications.
	UnreadCount,
	/// Approve a workflow step.
	Approve,
	/// Reject a workflow step.
	Reject,
	/// Replace a role's permission set.
	AssignPermissions,
	/// Enable or disable a module.
	Toggle,
}
impl Action {
	/// Camel-case label used in endpoint names.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::List => "list",
			Self::Get => "get",
			Self::Create => "create",
			Self::Update => "update",
			Self::Delete => "delete",
			Self::MarkRead => "markRead",
			Self::MarkAllRead => "markAllRead",
			Self::UnreadCount => "unreadCount",
			Self::Approve => "approve",
			Self::Reject => "reject",
			Self::AssignPermissions => "assignPermissions",
			Self::Toggle => "toggle",
		}
	}
}
impl Display for Action {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Where an endpoint lives relative to its entity collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathShape {
	/// `/collection`
	Collection,
	/// `/collection/{id}`
	Item,
	/// `/collection/{id}/{suffix}`
	ItemAction(&'static str),
	/// `/collection/{suffix}`
	CollectionAction(&'static str),
}

/// One catalogued endpoint: entity plus action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
	/// Entity collection addressed by the endpoint.
	pub entity: EntityType,
	/// Operation performed.
	pub action: Action,
}
impl Endpoint {
	/// Looks up an endpoint, returning an error when the entity does not support `action`.
	pub fn new(entity: EntityType, action: Action) -> Result<Self, ConfigError> {
		if supported_actions(entity).contains(&action) {
			Ok(Self { entity, action })
		} else {
			Err(ConfigError::UnsupportedAction { entity: entity.as_str(), action: action.as_str() })
		}
	}

	/// Stable name such as `Department.list`, used as the cache key prefix.
	pub fn name(&self) -> String {
		format!("{}.{}", self.entity, self.action)
	}

	/// Read or write.
	pub fn kind(&self) -> EndpointKind {
		match self.action {
			Action::List | Action::Get | Action::UnreadCount => EndpointKind::Query,
			_ => EndpointKind::Mutation,
		}
	}

	/// HTTP verb.
	pub fn method(&self) -> Method {
		match self.action {
			Action::List | Action::Get | Action::UnreadCount => Method::Get,
			Action::Create | Action::Approve | Action::Reject => Method::Post,
			Action::Update | Action::MarkRead | Action::MarkAllRead | Action::Toggle =>
				Method::Patch,
			Action::AssignPermissions => Method::Put,
			Action::Delete => Method::Delete,
		}
	}

	/// Path template shape.
	pub fn shape(&self) -> PathShape {
		match self.action {
			Action::List | Action::Create => PathShape::Collection,
			Action::Get | Action::Update | Action::Delete => PathShape::Item,
			Action::MarkRead => PathShape::ItemAction("read"),
			Action::Approve => PathShape::ItemAction("approve"),
			Action::Reject => PathShape::ItemAction("reject"),
			Action::AssignPermissions => PathShape::ItemAction("permissions"),
			Action::Toggle => PathShape::ItemAction("toggle"),
			Action::MarkAllRead => PathShape::CollectionAction("read-all"),
			Action::UnreadCount => PathShape::CollectionAction("unread-count"),
		}
	}

	/// Returns `true` when the endpoint addresses one entity.
	pub fn requires_id(&self) -> bool {
		matches!(self.shape(), PathShape::Item | PathShape::ItemAction(_))
	}

	/// Renders the request path for `id`.
	///
	/// The id must stay a single path segment; separators, dot segments, and escapes are
	/// rejected.
	pub fn path(&self, id: Option<&str>) -> Result<String, ConfigError> {
		let base = self.entity.collection_path();
		let id = match (self.requires_id(), id.map(str::trim)) {
			(true, Some(id)) if !id.is_empty() => Some(path_segment(id)?),
			(true, _) => return Err(ConfigError::MissingEntityId { endpoint: self.name() }),
			(false, _) => None,
		};

		Ok(match (self.shape(), id) {
			(PathShape::Item, Some(id)) => format!("{base}/{id}"),
			(PathShape::ItemAction(suffix), Some(id)) => format!("{base}/{id}/{suffix}"),
			(PathShape::CollectionAction(suffix), _) => format!("{base}/{suffix}"),
			_ => base.to_owned(),
		})
	}

	/// Lifetime of a cached result, falling back to `default`.
	pub fn keep_unused_data_for(&self, default: Duration) -> Duration {
		match (self.entity, self.action) {
			(EntityType::Notification, Action::UnreadCount) => Duration::seconds(15),
			(EntityType::Notification, _) | (EntityType::AuditLog, _) => Duration::seconds(30),
			(EntityType::Permission, _) | (EntityType::Module, _) => Duration::minutes(5),
			_ => default,
		}
	}

	/// Tags a query result provides: each listed item plus the collection, or the single item.
	pub fn provided_tags(&self, id: Option<&str>, data: &Value) -> Vec<CacheTag> {
		if self.kind() != EndpointKind::Query {
			return Vec::new();
		}

		let mut tags = Vec::new();

		match (self.shape(), id) {
			(PathShape::Item, Some(id)) => tags.push(CacheTag::id(self.entity, id)),
			_ => {
				tags.extend(item_ids(data).into_iter().map(|id| CacheTag::id(self.entity, id)));
				tags.push(CacheTag::list(self.entity));
			},
		}

		tags
	}

	/// Tags a successful mutation makes stale.
	pub fn invalidated_tags(&self, id: Option<&str>, data: &Value) -> Vec<CacheTag> {
		if self.kind() != EndpointKind::Mutation {
			return Vec::new();
		}

		let mut tags = Vec::new();

		match id.filter(|id| !id.trim().is_empty()) {
			Some(id) => tags.push(CacheTag::id(self.entity, id)),
			None if self.action == Action::Create =>
				tags.extend(entity_id(data).map(|id| CacheTag::id(self.entity, id))),
			None => {},
		}

		tags.push(CacheTag::list(self.entity));
		tags.extend(self.also_invalidates().iter().map(|entity| CacheTag::list(*entity)));

		tags
	}

	/// Returns `true` when the mutation touches every entity of its collection, so detail
	/// entries go stale along with the list.
	pub fn invalidates_collection(&self) -> bool {
		matches!(self.action, Action::MarkAllRead)
	}

	/// Other collections whose lists go stale after this mutation.
	pub fn also_invalidates(&self) -> &'static [EntityType] {
		match (self.entity, self.action) {
			(EntityType::Role, Action::AssignPermissions) => &[EntityType::Permission],
			(EntityType::Role, Action::Delete) => &[EntityType::User],
			(EntityType::Workflow, Action::Approve | Action::Reject) => &[EntityType::Notification],
			(EntityType::School, Action::Create | Action::Delete) => &[EntityType::Department],
			(EntityType::Module, Action::Toggle) => &[EntityType::Permission],
			_ => &[],
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}.{}", self.entity, self.action)
	}
}

/// Actions each entity exposes.
pub fn supported_actions(entity: EntityType) -> &'static [Action] {
	const CRUD: &[Action] =
		&[Action::List, Action::Get, Action::Create, Action::Update, Action::Delete];

	match entity {
		EntityType::AuditLog => &[Action::List, Action::Get],
		EntityType::Notification => &[
			Action::List,
			Action::Get,
			Action::Delete,
			Action::MarkRead,
			Action::MarkAllRead,
			Action::UnreadCount,
		],
		EntityType::Workflow => &[
			Action::List,
			Action::Get,
			Action::Create,
			Action::Update,
			Action::Delete,
			Action::Approve,
			Action::Reject,
		],
		EntityType::Role => &[
			Action::List,
			Action::Get,
			Action::Create,
			Action::Update,
			Action::Delete,
			Action::AssignPermissions,
		],
		EntityType::Module => &[Action::List, Action::Get, Action::Update, Action::Toggle],
		_ => CRUD,
	}
}

/// Every catalogued endpoint.
pub fn catalog() -> Vec<Endpoint> {
	EntityType::ALL
		.iter()
		.flat_map(|entity| {
			supported_actions(*entity).iter().map(|action| Endpoint { entity: *entity, action: *action })
		})
		.collect()
}

fn path_segment(id: &str) -> Result<&str, ConfigError> {
	let unsafe_char = |c: char| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control();

	if id == "." || id == ".." || id.contains(unsafe_char) {
		return Err(ConfigError::InvalidEntityId { id: id.to_owned() });
	}

	Ok(id)
}

/// Extracts item ids from a normalized list payload (page or bare array).
pub fn item_ids(data: &Value) -> Vec<String> {
	let items = match data {
		Value::Array(items) => items,
		Value::Object(map) => match map.get("data") {
			Some(Value::Array(items)) => items,
			_ => return Vec::new(),
		},
		_ => return Vec::new(),
	};

	items.iter().filter_map(entity_id).collect()
}

/// Reads `id` (or `_id`) from an entity object.
pub fn entity_id(data: &Value) -> Option<String> {
	let map = data.as_object()?;

	match map.get("id").or_else(|| map.get("_id"))? {
		Value::String(id) if !id.is_empty() => Some(id.clone()),
		Value::Number(id) => Some(id.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn every_id_mutation_invalidates_item_and_list() {
		for endpoint in catalog().into_iter().filter(|e| e.kind() == EndpointKind::Mutation) {
			let id = endpoint.requires_id().then_some("x1");
			let response = json!({ "id": "x1" });
			let tags = endpoint.invalidated_tags(id, &response);

			assert!(
				tags.contains(&CacheTag::list(endpoint.entity)),
				"{endpoint} must invalidate the collection tag."
			);

			if endpoint.requires_id() || endpoint.action == Action::Create {
				assert!(
					tags.contains(&CacheTag::id(endpoint.entity, "x1")),
					"{endpoint} must invalidate the entity tag."
				);
			}
		}
	}

	#[test]
	fn queries_provide_items_and_collection() {
		let list = Endpoint::new(EntityType::Department, Action::List)
			.expect("Departments should support listing.");
		let page = json!({ "data": [{ "id": "d1" }, { "_id": "d2" }], "total": 2 });

		assert_eq!(
			list.provided_tags(None, &page),
			vec![
				CacheTag::id(EntityType::Department, "d1"),
				CacheTag::id(EntityType::Department, "d2"),
				CacheTag::list(EntityType::Department),
			]
		);

		let get = Endpoint::new(EntityType::Role, Action::Get).expect("Roles should support get.");

		assert_eq!(get.provided_tags(Some("r1"), &json!({})), vec![CacheTag::id(EntityType::Role, "r1")]);
		assert!(get.invalidated_tags(Some("r1"), &json!({})).is_empty());
	}

	#[test]
	fn paths_follow_shapes() {
		let approve = Endpoint::new(EntityType::Workflow, Action::Approve)
			.expect("Workflows should support approval.");

		assert_eq!(approve.method(), Method::Post);
		assert_eq!(approve.path(Some("w1")).expect("Path should render."), "/workflows/w1/approve");
		assert!(matches!(approve.path(None), Err(ConfigError::MissingEntityId { .. })));

		let unread = Endpoint::new(EntityType::Notification, Action::UnreadCount)
			.expect("Notifications should support unread counts.");

		assert_eq!(unread.path(None).expect("Path should render."), "/notifications/unread-count");
		assert_eq!(unread.keep_unused_data_for(Duration::seconds(60)), Duration::seconds(15));
	}

	#[test]
	fn ids_stay_within_one_path_segment() {
		let delete = Endpoint::new(EntityType::Department, Action::Delete)
			.expect("Departments should support deletion.");

		for id in ["../../users/u1", "d1?admin=true", "d1#top", "d1%2Fu1", "a\\b", "..", "."] {
			assert!(
				matches!(delete.path(Some(id)), Err(ConfigError::InvalidEntityId { .. })),
				"{id} must be rejected."
			);
		}

		assert_eq!(
			delete.path(Some(" 6f1c-42 ")).expect("Plain ids should render."),
			"/organizations/departments/6f1c-42"
		);
		assert_eq!(
			delete.path(Some("d.1")).expect("Dots inside an id are fine."),
			"/organizations/departments/d.1"
		);
	}

	#[test]
	fn audit_logs_are_read_only() {
		assert!(matches!(
			Endpoint::new(EntityType::AuditLog, Action::Delete),
			Err(ConfigError::UnsupportedAction { entity: "AuditLog", action: "delete" })
		));
		assert!(
			catalog()
				.iter()
				.filter(|endpoint| endpoint.entity == EntityType::AuditLog)
				.all(|endpoint| endpoint.kind() == EndpointKind::Query)
		);
	}

	#[test]
	fn cross_entity_lists_are_invalidated() {
		let assign = Endpoint::new(EntityType::Role, Action::AssignPermissions)
			.expect("Roles should support permission assignment.");
		let tags = assign.invalidated_tags(Some("r1"), &Value::Null);

		assert!(tags.contains(&CacheTag::list(EntityType::Permission)));
		assert!(tags.contains(&CacheTag::id(EntityType::Role, "r1")));
		assert!(!assign.invalidates_collection());

		let mark_all = Endpoint::new(EntityType::Notification, Action::MarkAllRead)
			.expect("Notifications should support mark-all.");

		assert!(mark_all.invalidates_collection());
	}
}
