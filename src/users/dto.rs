use serde::{Deserialize, Serialize};

use super::repo_types::{Role, User};
use crate::pipeline::{query::Page, stats::UserStats};

/// Body of `PUT /admin/users/:id`. Every field but `phone` is required.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminUpdateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct AdminUserView {
    #[serde(flatten)]
    pub page: Page<User>,
    pub stats: UserStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_update_requires_role_and_rejects_extras() {
        let ok: AdminUpdateUserRequest =
            serde_json::from_str(r#"{"name":"n","email":"e@x.io","role":"craftsman"}"#).unwrap();
        assert_eq!(ok.role, Role::Craftsman);
        assert!(ok.phone.is_none());

        assert!(serde_json::from_str::<AdminUpdateUserRequest>(r#"{"name":"n","email":"e@x.io"}"#).is_err());
        assert!(serde_json::from_str::<AdminUpdateUserRequest>(
            r#"{"name":"n","email":"e@x.io","role":"client","passwordHash":"x"}"#
        )
        .is_err());
    }
}
