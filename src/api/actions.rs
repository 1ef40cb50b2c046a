//! Domain actions beyond CRUD: notifications, workflow decisions, role permissions, modules.

// crates.io
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	api::EndpointCall,
	cache::{Action, CacheTag, EntityType, entity_id},
	client::ApiClient,
	http::{ApiHttpClient, TransportErrorMapper},
	normalize,
};

#[derive(Deserialize)]
#[serde(untagged)]
enum UnreadCount {
	Bare(u64),
	Wrapped {
		#[serde(alias = "unreadCount")]
		count: u64,
	},
}
impl UnreadCount {
	fn get(self) -> u64 {
		match self {
			Self::Bare(count) | Self::Wrapped { count } => count,
		}
	}
}

impl<C, M> ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Marks notification `id` as read.
	///
	/// Cached lists containing the notification are patched before the call and rolled back
	/// if it fails.
	pub async fn mark_notification_read(&self, id: &str) -> Result<Value> {
		let endpoint = self.resource(EntityType::Notification).endpoint(Action::MarkRead)?;
		let undo = self
			.cache
			.patch_tagged(&CacheTag::id(EntityType::Notification, id), |data| mark_read(data, id));

		match self.mutate(endpoint, &EndpointCall::with_id(id)).await {
			Ok(data) => Ok(data),
			Err(err) => {
				self.cache.undo(undo);

				Err(err)
			},
		}
	}

	/// Marks every notification as read.
	pub async fn mark_all_notifications_read(&self) -> Result<Value> {
		let endpoint = self.resource(EntityType::Notification).endpoint(Action::MarkAllRead)?;

		self.mutate(endpoint, &EndpointCall::default()).await
	}

	/// Number of unread notifications.
	pub async fn unread_notification_count(&self) -> Result<u64> {
		let endpoint = self.resource(EntityType::Notification).endpoint(Action::UnreadCount)?;
		let value = self.query(endpoint, &EndpointCall::default()).await?;

		normalize::decode::<UnreadCount>(value)
			.map(UnreadCount::get)
			.map_err(|source| Error::ResponseParse { source, status: None })
	}

	/// Approves workflow `id` with an optional reviewer comment.
	pub async fn approve_workflow(&self, id: &str, comment: Option<&str>) -> Result<Value> {
		self.decide_workflow(Action::Approve, id, comment).await
	}

	/// Rejects workflow `id` with an optional reviewer comment.
	pub async fn reject_workflow(&self, id: &str, comment: Option<&str>) -> Result<Value> {
		self.decide_workflow(Action::Reject, id, comment).await
	}

	/// Replaces the permission set of role `id`.
	pub async fn assign_role_permissions<I, S>(&self, id: &str, permission_ids: I) -> Result<Value>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let endpoint = self.resource(EntityType::Role).endpoint(Action::AssignPermissions)?;
		let ids = permission_ids.into_iter().map(Into::into).collect::<Vec<String>>();

		self.mutate(endpoint, &EndpointCall::with_id(id).body(json!({ "permissionIds": ids })))
			.await
	}

	/// Enables or disables module `id`.
	pub async fn toggle_module(&self, id: &str, enabled: bool) -> Result<Value> {
		let endpoint = self.resource(EntityType::Module).endpoint(Action::Toggle)?;

		self.mutate(endpoint, &EndpointCall::with_id(id).body(json!({ "isEnabled": enabled })))
			.await
	}

	async fn decide_workflow(&self, action: Action, id: &str, comment: Option<&str>) -> Result<Value> {
		let endpoint = self.resource(EntityType::Workflow).endpoint(action)?;
		let body = match comment.map(str::trim).filter(|comment| !comment.is_empty()) {
			Some(comment) => json!({ "comment": comment }),
			None => json!({}),
		};

		self.mutate(endpoint, &EndpointCall::with_id(id).body(body)).await
	}
}

fn mark_read(data: &mut Value, id: &str) {
	if entity_id(data).as_deref() == Some(id) {
		if let Some(map) = data.as_object_mut() {
			map.insert("isRead".into(), Value::Bool(true));
		}

		return;
	}

	match data {
		Value::Array(items) => items.iter_mut().for_each(|item| mark_read(item, id)),
		Value::Object(map) =>
			if let Some(items) = map.get_mut("data") {
				mark_read(items, id);
			},
		_ => {},
	}
}
