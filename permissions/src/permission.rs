use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::IntoStaticStr;

use crate::error::PermissionError;

/// Area of the product a permission belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PermissionDomain {
    Team,
    Project,
    Task,
    Billing,
    Reporting,
}

/// A single named capability checked independently of the role hierarchy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Permission {
    // Team
    ViewTeamMembers,
    InviteTeamMembers,
    RemoveTeamMembers,
    ManageTeamRoles,
    ManageTeamSettings,
    // Projects
    CreateProjects,
    ViewAllProjects,
    ViewAssignedProjects,
    EditAllProjects,
    DeleteProjects,
    // Tasks
    CreateTasks,
    ViewAllTasks,
    ViewAssignedTasks,
    EditAllTasks,
    EditAssignedTasks,
    DeleteTasks,
    AssignTasks,
    // Billing
    ViewBilling,
    ManageBilling,
    // Reporting
    ViewAllReports,
    ViewOwnReports,
    ExportReports,
}

impl Permission {
    pub fn domain(self) -> PermissionDomain {
        use Permission::*;
        match self {
            ViewTeamMembers | InviteTeamMembers | RemoveTeamMembers | ManageTeamRoles
            | ManageTeamSettings => PermissionDomain::Team,
            CreateProjects | ViewAllProjects | ViewAssignedProjects | EditAllProjects
            | DeleteProjects => PermissionDomain::Project,
            CreateTasks | ViewAllTasks | ViewAssignedTasks | EditAllTasks | EditAssignedTasks
            | DeleteTasks | AssignTasks => PermissionDomain::Task,
            ViewBilling | ManageBilling => PermissionDomain::Billing,
            ViewAllReports | ViewOwnReports | ExportReports => PermissionDomain::Reporting,
        }
    }

    /// Decode a permission name, returning `None` for anything unrecognized.
    pub fn parse(name: &str) -> Option<Self> {
        Self::from_str(name.trim()).ok()
    }

    /// Decode a permission name at a trust boundary where bad input must be rejected.
    pub fn decode(name: &str) -> Result<Self, PermissionError> {
        Self::parse(name).ok_or_else(|| PermissionError::UnknownPermission(name.to_string()))
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Every permission, in declaration order.
    pub fn all() -> Vec<Permission> {
        Permission::iter().collect()
    }

    pub fn in_domain(domain: PermissionDomain) -> Vec<Permission> {
        Permission::iter().filter(|p| p.domain() == domain).collect()
    }
}
