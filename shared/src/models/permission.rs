//! Permission Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action half of a permission's `(module, action)` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PermissionAction {
    Create,
    Read,
    Update,
    Delete,
    Manage,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Manage => "manage",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission entity, one atomic capability in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub module: String,
    pub action: PermissionAction,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create permission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub module: String,
    pub action: PermissionAction,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Update permission payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionUpdate {
    pub name: Option<String>,
    pub module: Option<String>,
    pub action: Option<PermissionAction>,
    #[serde(default, deserialize_with = "crate::serde_helpers::double_option")]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Query string of `GET /api/permissions`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionQuery {
    pub module: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PermissionAction::Manage).unwrap(),
            "\"manage\""
        );
        let action: PermissionAction = serde_json::from_str("\"read\"").unwrap();
        assert_eq!(action, PermissionAction::Read);
        assert!(serde_json::from_str::<PermissionAction>("\"approve\"").is_err());
    }

    #[test]
    fn test_update_distinguishes_null_description() {
        let update: PermissionUpdate = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(update.description, Some(None));
        assert!(update.name.is_none());
    }
}
