use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::error::PermissionError;
use crate::error::Result;
use crate::permission::Permission;
use crate::role::Role;

/// Token in a table file that expands to every permission.
pub const ALL_PERMISSIONS_TOKEN: &str = "*";

static NO_PERMISSIONS: BTreeSet<Permission> = BTreeSet::new();

const OWNER_GRANTS: &[Permission] = &[
    Permission::ViewTeamMembers,
    Permission::InviteTeamMembers,
    Permission::RemoveTeamMembers,
    Permission::ManageTeamRoles,
    Permission::ManageTeamSettings,
    Permission::CreateProjects,
    Permission::ViewAllProjects,
    Permission::ViewAssignedProjects,
    Permission::EditAllProjects,
    Permission::DeleteProjects,
    Permission::CreateTasks,
    Permission::ViewAllTasks,
    Permission::ViewAssignedTasks,
    Permission::EditAllTasks,
    Permission::EditAssignedTasks,
    Permission::DeleteTasks,
    Permission::AssignTasks,
    Permission::ViewBilling,
    Permission::ManageBilling,
    Permission::ViewAllReports,
    Permission::ViewOwnReports,
    Permission::ExportReports,
];

// Admins run the team day to day but never touch the payment method.
const ADMIN_GRANTS: &[Permission] = &[
    Permission::ViewTeamMembers,
    Permission::InviteTeamMembers,
    Permission::RemoveTeamMembers,
    Permission::ManageTeamRoles,
    Permission::ManageTeamSettings,
    Permission::CreateProjects,
    Permission::ViewAllProjects,
    Permission::ViewAssignedProjects,
    Permission::EditAllProjects,
    Permission::DeleteProjects,
    Permission::CreateTasks,
    Permission::ViewAllTasks,
    Permission::ViewAssignedTasks,
    Permission::EditAllTasks,
    Permission::EditAssignedTasks,
    Permission::DeleteTasks,
    Permission::AssignTasks,
    Permission::ViewBilling,
    Permission::ViewAllReports,
    Permission::ViewOwnReports,
    Permission::ExportReports,
];

const MEMBER_GRANTS: &[Permission] = &[
    Permission::ViewTeamMembers,
    Permission::ViewAssignedProjects,
    Permission::CreateTasks,
    Permission::ViewAssignedTasks,
    Permission::EditAssignedTasks,
    Permission::ViewOwnReports,
];

/// On-disk shape of a permission table.
///
/// ```toml
/// [roles]
/// OWNER = ["*"]
/// MEMBER = ["VIEW_ASSIGNED_TASKS"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,
}

/// A lower role holding a permission that a higher role lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyViolation {
    pub higher: Role,
    pub lower: Role,
    pub permission: Permission,
}

impl From<HierarchyViolation> for PermissionError {
    fn from(v: HierarchyViolation) -> Self {
        PermissionError::HierarchyViolation {
            higher: v.higher,
            lower: v.lower,
            permission: v.permission,
        }
    }
}

/// Read-only mapping from each role to the permissions it holds.
///
/// Construct once at startup and share it; nothing mutates a table after
/// construction. A role with no entry holds no permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissionTable {
    grants: BTreeMap<Role, BTreeSet<Permission>>,
}

impl RolePermissionTable {
    /// The hand-authored table shipped with the product.
    pub fn builtin() -> Self {
        Self::from_grants([
            (Role::Owner, OWNER_GRANTS),
            (Role::Admin, ADMIN_GRANTS),
            (Role::Member, MEMBER_GRANTS),
        ])
    }

    /// Build a table without validating it.
    pub fn from_grants<'a, I>(grants: I) -> Self
    where
        I: IntoIterator<Item = (Role, &'a [Permission])>,
    {
        let grants = grants
            .into_iter()
            .map(|(role, perms)| (role, perms.iter().copied().collect()))
            .collect();
        Self { grants }
    }

    /// Decode a [`TableConfig`], rejecting unknown role or permission names.
    /// The resulting table is not validated.
    pub fn from_config(config: &TableConfig) -> Result<Self> {
        let mut grants: BTreeMap<Role, BTreeSet<Permission>> = BTreeMap::new();
        for (role_name, names) in &config.roles {
            let role = Role::decode(role_name)?;
            if grants.contains_key(&role) {
                return Err(PermissionError::InvalidTable(format!(
                    "role {role} is listed more than once"
                )));
            }
            let mut perms = BTreeSet::new();
            for name in names {
                if name.trim() == ALL_PERMISSIONS_TOKEN {
                    perms.extend(Permission::iter());
                } else {
                    perms.insert(Permission::decode(name)?);
                }
            }
            grants.insert(role, perms);
        }
        Ok(Self { grants })
    }

    /// Parse and validate a TOML table.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TableConfig = toml::from_str(contents)?;
        let table = Self::from_config(&config)?;
        table.validate()?;
        Ok(table)
    }

    /// Load and validate a TOML table file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_toml_str(&contents)?;
        debug!(
            path = %path.display(),
            roles = table.grants.len(),
            "loaded permission table"
        );
        Ok(table)
    }

    pub fn to_config(&self) -> TableConfig {
        let roles = self
            .grants
            .iter()
            .map(|(role, perms)| {
                (
                    role.to_string(),
                    perms.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();
        TableConfig { roles }
    }

    pub fn permissions_for(&self, role: Role) -> &BTreeSet<Permission> {
        self.grants.get(&role).unwrap_or(&NO_PERMISSIONS)
    }

    pub fn contains(&self, role: Role, permission: Permission) -> bool {
        self.permissions_for(role).contains(&permission)
    }

    /// Roles that have an entry in this table.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.grants.keys().copied()
    }

    /// Every place where a lower role holds something a higher role does not.
    pub fn hierarchy_violations(&self) -> Vec<HierarchyViolation> {
        let roles: Vec<Role> = Role::iter().collect();
        let mut violations = Vec::new();
        for (i, &higher) in roles.iter().enumerate() {
            for &lower in &roles[i + 1..] {
                let held_by_higher = self.permissions_for(higher);
                for &permission in self.permissions_for(lower) {
                    if !held_by_higher.contains(&permission) {
                        violations.push(HierarchyViolation {
                            higher,
                            lower,
                            permission,
                        });
                    }
                }
            }
        }
        violations
    }

    /// The owner must hold every permission and sets must nest by authority.
    pub fn validate(&self) -> Result<()> {
        let owner = self.permissions_for(Role::Owner);
        if let Some(missing) = Permission::iter().find(|p| !owner.contains(p)) {
            return Err(PermissionError::OwnerMissingPermission(missing));
        }
        match self.hierarchy_violations().into_iter().next() {
            Some(violation) => Err(violation.into()),
            None => Ok(()),
        }
    }
}
