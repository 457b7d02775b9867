use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::hierarchy;
use crate::permission::Permission;
use crate::role::Role;
use crate::snapshot::CapabilitySnapshot;
use crate::table::RolePermissionTable;

/// Answers capability and authority questions against one permission table.
///
/// Cheap to clone; clones share the same table.
#[derive(Debug, Clone)]
pub struct PermissionModel {
    table: Arc<RolePermissionTable>,
}

impl Default for PermissionModel {
    fn default() -> Self {
        Self::new(Arc::new(RolePermissionTable::builtin()))
    }
}

impl PermissionModel {
    pub fn new(table: Arc<RolePermissionTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RolePermissionTable {
        &self.table
    }

    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.table.contains(role, permission)
    }

    pub fn get_role_permissions(&self, role: Role) -> &BTreeSet<Permission> {
        self.table.permissions_for(role)
    }

    pub fn can_manage_user(&self, manager: Role, target: Role) -> bool {
        hierarchy::can_manage_user(manager, target)
    }

    pub fn can_change_role(&self, current: Role, new_role: Role, changer: Role) -> bool {
        hierarchy::can_change_role(current, new_role, changer)
    }

    pub fn can_assign_role(&self, assigner: Role, role: Role) -> bool {
        hierarchy::can_assign_role(assigner, role)
    }

    pub fn snapshot(&self, role: Role) -> CapabilitySnapshot {
        CapabilitySnapshot {
            role,
            permissions: self.get_role_permissions(role).iter().copied().collect(),
            manageable_roles: hierarchy::manageable_roles(role),
            assignable_roles: hierarchy::assignable_roles(role),
        }
    }

    // Name-based variants for callers holding undecoded input. Anything that
    // fails to decode is denied.

    pub fn has_permission_by_name(&self, role: &str, permission: &str) -> bool {
        let (Some(role), Some(permission)) = (decode_role(role), decode_permission(permission))
        else {
            return false;
        };
        self.has_permission(role, permission)
    }

    pub fn role_permissions_by_name(&self, role: &str) -> BTreeSet<Permission> {
        decode_role(role)
            .map(|role| self.get_role_permissions(role).clone())
            .unwrap_or_default()
    }

    /// `None` for an unrecognized role; callers must treat that as no access.
    pub fn snapshot_by_name(&self, role: &str) -> Option<CapabilitySnapshot> {
        decode_role(role).map(|role| self.snapshot(role))
    }

    pub fn can_manage_user_by_name(&self, manager: &str, target: &str) -> bool {
        match (decode_role(manager), decode_role(target)) {
            (Some(manager), Some(target)) => self.can_manage_user(manager, target),
            _ => false,
        }
    }

    pub fn can_change_role_by_name(&self, current: &str, new_role: &str, changer: &str) -> bool {
        match (decode_role(current), decode_role(new_role), decode_role(changer)) {
            (Some(current), Some(new_role), Some(changer)) => {
                self.can_change_role(current, new_role, changer)
            }
            _ => false,
        }
    }
}

fn decode_role(name: &str) -> Option<Role> {
    let role = Role::parse(name);
    if role.is_none() {
        warn!(role = name, "unrecognized role; denying");
    }
    role
}

fn decode_permission(name: &str) -> Option<Permission> {
    let permission = Permission::parse(name);
    if permission.is_none() {
        warn!(permission = name, "unrecognized permission; denying");
    }
    permission
}
