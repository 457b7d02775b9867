use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::permission::Permission;
use crate::role::Role;

/// What a role may do, serialized for clients that gate UI controls.
///
/// Advisory only. Servers re-check every mutation through the model and never
/// accept a snapshot as proof of authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySnapshot {
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub manageable_roles: Vec<Role>,
    pub assignable_roles: Vec<Role>,
}

impl CapabilitySnapshot {
    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn may_manage(&self, target: Role) -> bool {
        self.manageable_roles.contains(&target)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
