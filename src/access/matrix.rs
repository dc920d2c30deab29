use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// CRUD actions a permission matrix can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Per-role permission matrix, loaded from `roles.permissions`.
///
/// The shape is `{ "<resource>": { "<action>": bool } }`. Lookups are
/// fail-closed: a missing resource, a missing action, or anything other than
/// a literal `true` denies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionMatrix(HashMap<String, HashMap<String, bool>>);

impl PermissionMatrix {
    pub fn allows(&self, resource: &str, action: Action) -> bool {
        self.0
            .get(resource)
            .and_then(|actions| actions.get(action.as_str()))
            .copied()
            .unwrap_or(false)
    }

    /// Parses a stored JSONB value. Rows that do not match the expected shape
    /// yield an empty matrix, which denies everything.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_allows_granted_action() {
        let matrix = PermissionMatrix::from_value(json!({
            "tasks": {"create": true, "read": true, "update": false, "delete": false}
        }));
        assert!(matrix.allows("tasks", Action::Create));
        assert!(matrix.allows("tasks", Action::Read));
        assert!(!matrix.allows("tasks", Action::Update));
    }

    #[test]
    fn test_missing_entries_deny() {
        let matrix = PermissionMatrix::from_value(json!({
            "clients": {"read": true}
        }));
        assert!(!matrix.allows("clients", Action::Delete));
        assert!(!matrix.allows("financial", Action::Read));
    }

    #[test]
    fn test_malformed_value_denies_everything() {
        let matrix = PermissionMatrix::from_value(json!("not a matrix"));
        assert!(!matrix.allows("tasks", Action::Read));

        let matrix = PermissionMatrix::from_value(json!({"tasks": {"read": "yes"}}));
        assert!(!matrix.allows("tasks", Action::Read));
    }

    #[test]
    fn test_empty_matrix_denies() {
        let matrix = PermissionMatrix::default();
        assert!(!matrix.allows("users", Action::Read));
    }
}
