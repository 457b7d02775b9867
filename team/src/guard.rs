use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use taskr_permissions::Permission;
use taskr_permissions::PermissionModel;
use taskr_permissions::Role;
use tracing::debug;

use crate::error::Result;
use crate::error::TeamError;
use crate::types::TeamMember;

/// Mutations on team membership that require authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamAction {
    InviteMember,
    ChangeRole,
    RemoveMember,
    DeactivateMember,
}

impl TeamAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TeamAction::InviteMember => "invite_member",
            TeamAction::ChangeRole => "change_role",
            TeamAction::RemoveMember => "remove_member",
            TeamAction::DeactivateMember => "deactivate_member",
        }
    }
}

/// Authoritative server-side checks for concrete team members.
///
/// Only active members hold any authority; invited and inactive members are
/// denied regardless of role.
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    model: Arc<PermissionModel>,
}

impl AccessGuard {
    pub fn new(model: Arc<PermissionModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &PermissionModel {
        &self.model
    }

    /// Whether `actor` currently holds `permission`.
    pub fn allows(&self, actor: &TeamMember, permission: Permission) -> bool {
        actor.is_active() && self.model.has_permission(actor.role, permission)
    }

    pub fn require(
        &self,
        action: TeamAction,
        actor: &TeamMember,
        permission: Permission,
    ) -> Result<()> {
        if !actor.is_active() {
            return Err(TeamError::forbidden(
                action.as_str(),
                format!("member {} is not active", actor.id),
            ));
        }
        if !self.model.has_permission(actor.role, permission) {
            return Err(TeamError::forbidden(
                action.as_str(),
                format!("{} lacks {permission}", actor.role),
            ));
        }
        debug!(actor = %actor.id, %permission, action = action.as_str(), "permission granted");
        Ok(())
    }

    pub fn require_manage(
        &self,
        action: TeamAction,
        actor: &TeamMember,
        target: &TeamMember,
    ) -> Result<()> {
        if !self.model.can_manage_user(actor.role, target.role) {
            return Err(TeamError::forbidden(
                action.as_str(),
                format!("{} cannot manage {}", actor.role, target.role),
            ));
        }
        Ok(())
    }

    /// A role change must pass every check the team settings screen applies:
    /// the actor holds `MANAGE_TEAM_ROLES`, manages the target, and the
    /// transition itself is allowed.
    pub fn require_role_change(
        &self,
        actor: &TeamMember,
        target: &TeamMember,
        new_role: Role,
    ) -> Result<()> {
        let action = TeamAction::ChangeRole;
        self.require(action, actor, Permission::ManageTeamRoles)?;
        if new_role == Role::Owner {
            return Err(TeamError::forbidden(
                action.as_str(),
                "ownership cannot be granted through a role change",
            ));
        }
        self.require_manage(action, actor, target)?;
        if !self.model.can_change_role(target.role, new_role, actor.role) {
            return Err(TeamError::forbidden(
                action.as_str(),
                format!(
                    "{} cannot change {} to {new_role}",
                    actor.role, target.role
                ),
            ));
        }
        Ok(())
    }

    /// Whether `actor` may bring someone into the team as `role`.
    pub fn require_assign(&self, actor: &TeamMember, role: Role) -> Result<()> {
        let action = TeamAction::InviteMember;
        self.require(action, actor, Permission::InviteTeamMembers)?;
        if !self.model.can_assign_role(actor.role, role) {
            return Err(TeamError::forbidden(
                action.as_str(),
                format!("{} cannot invite a {role}", actor.role),
            ));
        }
        Ok(())
    }

    /// Removal and deactivation share the same authority.
    pub fn require_removal(
        &self,
        action: TeamAction,
        actor: &TeamMember,
        target: &TeamMember,
    ) -> Result<()> {
        self.require(action, actor, Permission::RemoveTeamMembers)?;
        self.require_manage(action, actor, target)
    }
}
