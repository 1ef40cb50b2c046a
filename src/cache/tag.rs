//! Cache tags (`{type, id}`) and the entity types they name.

// crates.io
use serde::{Deserializer, Serializer};
// self
use crate::_prelude::*;

/// Entity collections exposed by the console API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
	/// Organization departments.
	Department,
	/// Schools within an organization.
	School,
	/// Roles grouping permissions.
	Role,
	/// Individual permissions.
	Permission,
	/// Feature modules that can be enabled per tenant.
	Module,
	/// User notifications.
	Notification,
	/// Approval workflows.
	Workflow,
	/// Read-only audit trail.
	AuditLog,
	/// Console users.
	User,
}
impl EntityType {
	/// Every entity type, in catalog order.
	pub const ALL: [EntityType; 9] = [
		EntityType::Department,
		EntityType::School,
		EntityType::Role,
		EntityType::Permission,
		EntityType::Module,
		EntityType::Notification,
		EntityType::Workflow,
		EntityType::AuditLog,
		EntityType::User,
	];

	/// Tag type label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Department => "Department",
			Self::School => "School",
			Self::Role => "Role",
			Self::Permission => "Permission",
			Self::Module => "Module",
			Self::Notification => "Notification",
			Self::Workflow => "Workflow",
			Self::AuditLog => "AuditLog",
			Self::User => "User",
		}
	}

	/// Collection path below the API prefix.
	pub const fn collection_path(self) -> &'static str {
		match self {
			Self::Department => "/organizations/departments",
			Self::School => "/organizations/schools",
			Self::Role => "/roles",
			Self::Permission => "/permissions",
			Self::Module => "/modules",
			Self::Notification => "/notifications",
			Self::Workflow => "/workflows",
			Self::AuditLog => "/audit-logs",
			Self::User => "/users",
		}
	}
}
impl Display for EntityType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Tag identifier: a concrete entity id or the collection sentinel.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagId {
	/// The whole collection (`"LIST"`).
	List,
	/// One entity.
	Id(String),
}
impl TagId {
	/// Sentinel used for collection tags.
	pub const LIST: &'static str = "LIST";

	/// Returns the wire label.
	pub fn as_str(&self) -> &str {
		match self {
			Self::List => Self::LIST,
			Self::Id(id) => id,
		}
	}
}
impl From<&str> for TagId {
	fn from(value: &str) -> Self {
		if value == Self::LIST { Self::List } else { Self::Id(value.to_owned()) }
	}
}
impl Display for TagId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl Serialize for TagId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}
impl<'de> Deserialize<'de> for TagId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		Ok(Self::from(raw.as_str()))
	}
}

/// Label used by the query cache to decide which entries a mutation makes stale.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheTag {
	/// Entity type the tag belongs to.
	#[serde(rename = "type")]
	pub entity: EntityType,
	/// Entity id or the collection sentinel.
	pub id: TagId,
}
impl CacheTag {
	/// Tag naming the whole collection of `entity`.
	pub fn list(entity: EntityType) -> Self {
		Self { entity, id: TagId::List }
	}

	/// Tag naming a single entity.
	pub fn id(entity: EntityType, id: impl Into<String>) -> Self {
		Self { entity, id: TagId::from(id.into().as_str()) }
	}

	/// Returns `true` for collection tags.
	pub fn is_list(&self) -> bool {
		matches!(self.id, TagId::List)
	}
}
impl Display for CacheTag {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}:{}", self.entity, self.id)
	}
}
