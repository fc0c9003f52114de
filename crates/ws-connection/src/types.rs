use std::{fmt, sync::Arc};
use uuid::Uuid;

/// Connection ID type for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
	#[must_use]
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for ConnectionId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ConnectionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Stable identity of a display or an admin console.
///
/// Displays use the id the directory knows them by; admins get a
/// per-connection id minted by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(Arc<str>);

impl EntityId {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	#[must_use]
	pub fn admin_for(connection: &ConnectionId) -> Self {
		Self::new(format!("admin-{connection}"))
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for EntityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for EntityId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for EntityId {
	fn from(id: String) -> Self {
		Self::new(id)
	}
}

/// What kind of entity sits at the far end of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
	Display,
	Admin,
}

impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Display => write!(f, "display"),
			Self::Admin => write!(f, "admin"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_connection_ids_are_unique() {
		assert_ne!(ConnectionId::new(), ConnectionId::default());
	}

	#[test]
	fn test_admin_id_derived_from_connection() {
		let connection = ConnectionId::new();
		let admin = EntityId::admin_for(&connection);

		assert_eq!(admin.as_str(), format!("admin-{connection}"));
		assert_eq!(admin, EntityId::admin_for(&connection));
	}
}
