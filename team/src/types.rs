use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use taskr_permissions::Role;

/// Membership status of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipStatus {
    /// Invitation sent but not yet accepted.
    Invited,
    Active,
    /// Deactivated by a manager; keeps history but holds no permissions.
    Inactive,
}

/// A user's association with a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub status: MembershipStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamMember {
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}

/// Full persisted state of a team roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRosterData {
    pub team: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: String,
    pub members: Vec<TeamMember>,
}
