use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use taskr_permissions::AuditDecision;
use taskr_permissions::AuditEntry;
use taskr_permissions::AuditLog;
use taskr_permissions::CapabilitySnapshot;
use taskr_permissions::PermissionModel;
use taskr_permissions::Role;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Result;
use crate::error::TeamError;
use crate::guard::AccessGuard;
use crate::guard::TeamAction;
use crate::types::MembershipStatus;
use crate::types::TeamMember;
use crate::types::TeamRosterData;

/// Generate a unique ID with the given prefix, using timestamp + random hex.
fn generate_id(prefix: &str) -> String {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let r: u32 = rand::random();
    format!("{prefix}-{ts:x}-{r:x}")
}

/// Sanitize a team name so it is safe to use as a filename component.
///
/// - Rejects empty names and the special names "." / "..".
/// - Replaces any character that is **not** alphanumeric, hyphen, or underscore
///   with an underscore.
fn sanitize_team_name(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(TeamError::InvalidOperation(
            "Team name must not be empty".to_string(),
        ));
    }
    if name == "." || name == ".." {
        return Err(TeamError::InvalidOperation(format!(
            "Team name is not allowed: {name}"
        )));
    }
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    Ok(sanitized)
}

fn no_team() -> TeamError {
    TeamError::InvalidOperation("No team has been created yet".to_string())
}

fn find_member<'a>(state: &'a TeamRosterData, id: &str) -> Result<&'a TeamMember> {
    state
        .members
        .iter()
        .find(|m| m.id == id || m.user_id == id)
        .ok_or_else(|| TeamError::NotFound(format!("member {id}")))
}

fn find_member_mut<'a>(state: &'a mut TeamRosterData, id: &str) -> Result<&'a mut TeamMember> {
    state
        .members
        .iter_mut()
        .find(|m| m.id == id || m.user_id == id)
        .ok_or_else(|| TeamError::NotFound(format!("member {id}")))
}

fn check_invariants(state: &TeamRosterData) -> Result<()> {
    // Invariant 1: Exactly one owner
    let owners: Vec<_> = state
        .members
        .iter()
        .filter(|m| m.role == Role::Owner)
        .collect();
    if owners.len() != 1 {
        return Err(TeamError::InvalidOperation(format!(
            "expected 1 owner, found {}",
            owners.len()
        )));
    }

    // Invariant 2: Owner ID matches the roster's owner_id
    if owners[0].id != state.owner_id {
        return Err(TeamError::InvalidOperation("owner ID mismatch".into()));
    }

    // Invariant 3: A user belongs to the team at most once
    let mut seen = HashSet::new();
    for member in &state.members {
        if !seen.insert(member.user_id.as_str()) {
            return Err(TeamError::InvalidOperation(format!(
                "user '{}' appears more than once",
                member.user_id
            )));
        }
    }

    Ok(())
}

/// Team membership store that enforces role rules on every mutation.
///
/// State lives in memory and is mirrored to `<persist_dir>/<team>.json`.
/// Members may be addressed by member id or user id.
pub struct TeamRoster {
    data: RwLock<Option<TeamRosterData>>,
    persist_dir: PathBuf,
    guard: AccessGuard,
    audit: Mutex<AuditLog>,
}

impl TeamRoster {
    /// The directory is created lazily on first persist, not at construction time.
    pub fn new(persist_dir: PathBuf, model: Arc<PermissionModel>) -> Self {
        Self {
            data: RwLock::new(None),
            persist_dir,
            guard: AccessGuard::new(model),
            audit: Mutex::new(AuditLog::default()),
        }
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    /// If nothing is loaded yet, pick up a roster persisted under
    /// `persist_dir`, e.g. one written by another process. Files are tried in
    /// name order; unreadable files and rosters that break the ownership
    /// invariants are skipped.
    async fn try_load_from_disk(&self) {
        {
            let guard = self.data.read().await;
            if guard.is_some() {
                return;
            }
        }

        let mut read_dir = match tokio::fs::read_dir(&self.persist_dir).await {
            Ok(rd) => rd,
            Err(_) => return, // directory may not exist yet
        };
        let mut paths = Vec::new();
        while let Ok(Some(entry)) = read_dir.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let Ok(bytes) = tokio::fs::read(&path).await else {
                continue;
            };
            let state = match serde_json::from_slice::<TeamRosterData>(&bytes) {
                Ok(state) => state,
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable roster file");
                    continue;
                }
            };
            if let Err(err) = check_invariants(&state) {
                warn!(path = %path.display(), %err, "skipping roster that violates invariants");
                continue;
            }
            let mut guard = self.data.write().await;
            // Another task may have loaded while we were reading.
            if guard.is_none() {
                *guard = Some(state);
            }
            return;
        }
    }

    /// Create a team whose single owner is `owner_user_id`.
    pub async fn create_team(
        &self,
        team_name: &str,
        owner_user_id: &str,
        owner_name: &str,
    ) -> Result<TeamRosterData> {
        let safe_name = sanitize_team_name(team_name)?;
        self.try_load_from_disk().await;

        let mut guard = self.data.write().await;
        if guard.is_some() {
            return Err(TeamError::InvalidOperation(
                "Team already exists".to_string(),
            ));
        }
        // A file that failed to load still belongs to someone.
        let path = self.persist_dir.join(format!("{safe_name}.json"));
        if tokio::fs::try_exists(&path).await.unwrap_or(true) {
            return Err(TeamError::InvalidOperation(format!(
                "Team already exists on disk: {safe_name}"
            )));
        }

        let now = Utc::now();
        let owner_id = generate_id("member");
        let owner = TeamMember {
            id: owner_id.clone(),
            user_id: owner_user_id.to_string(),
            name: owner_name.to_string(),
            role: Role::Owner,
            status: MembershipStatus::Active,
            invited_by: None,
            created_at: now,
            updated_at: now,
        };

        let state = TeamRosterData {
            team: safe_name,
            created_at: now,
            updated_at: now,
            owner_id,
            members: vec![owner],
        };

        Self::persist_inner(&self.persist_dir, &state).await?;
        *guard = Some(state.clone());
        Ok(state)
    }

    /// Return a clone of the current roster.
    pub async fn get_team(&self) -> Result<TeamRosterData> {
        self.try_load_from_disk().await;
        let guard = self.data.read().await;
        guard.clone().ok_or_else(no_team)
    }

    pub async fn find_member(&self, id: &str) -> Result<TeamMember> {
        self.try_load_from_disk().await;
        let guard = self.data.read().await;
        let state = guard.as_ref().ok_or_else(no_team)?;
        find_member(state, id).cloned()
    }

    pub async fn list_members(&self) -> Result<Vec<TeamMember>> {
        self.try_load_from_disk().await;
        let guard = self.data.read().await;
        let state = guard.as_ref().ok_or_else(no_team)?;
        Ok(state.members.clone())
    }

    /// Invite a user. The new member starts as `INVITED` and holds no
    /// permissions until the invitation is accepted.
    pub async fn invite_member(
        &self,
        actor_id: &str,
        user_id: &str,
        name: &str,
        role: Role,
    ) -> Result<TeamMember> {
        self.try_load_from_disk().await;
        let mut guard = self.data.write().await;
        let state = guard.as_mut().ok_or_else(no_team)?;

        let actor = find_member(state, actor_id)?.clone();
        let decision = self.guard.require_assign(&actor, role).and_then(|()| {
            if state.members.iter().any(|m| m.user_id == user_id) {
                return Err(TeamError::InvalidOperation(format!(
                    "User is already a team member: {user_id}"
                )));
            }
            Ok(())
        });
        self.audit(TeamAction::InviteMember, &actor.id, Some(user_id), &decision)
            .await;
        decision?;

        let now = Utc::now();
        let member = TeamMember {
            id: generate_id("member"),
            user_id: user_id.to_string(),
            name: name.to_string(),
            role,
            status: MembershipStatus::Invited,
            invited_by: Some(actor.id),
            created_at: now,
            updated_at: now,
        };

        state.members.push(member.clone());
        state.updated_at = now;
        Self::persist_inner(&self.persist_dir, state).await?;
        Ok(member)
    }

    pub async fn accept_invitation(&self, member_id: &str) -> Result<TeamMember> {
        self.try_load_from_disk().await;
        let mut guard = self.data.write().await;
        let state = guard.as_mut().ok_or_else(no_team)?;

        let member = find_member_mut(state, member_id)?;
        if member.status != MembershipStatus::Invited {
            return Err(TeamError::InvalidOperation(format!(
                "Member {} has no pending invitation",
                member.id
            )));
        }
        member.status = MembershipStatus::Active;
        member.updated_at = Utc::now();
        let result = member.clone();

        state.updated_at = Utc::now();
        Self::persist_inner(&self.persist_dir, state).await?;
        Ok(result)
    }

    pub async fn change_role(
        &self,
        actor_id: &str,
        member_id: &str,
        new_role: Role,
    ) -> Result<TeamMember> {
        self.try_load_from_disk().await;
        let mut guard = self.data.write().await;
        let state = guard.as_mut().ok_or_else(no_team)?;

        let actor = find_member(state, actor_id)?.clone();
        let target = find_member(state, member_id)?.clone();
        let decision = self.guard.require_role_change(&actor, &target, new_role);
        self.audit(TeamAction::ChangeRole, &actor.id, Some(&target.id), &decision)
            .await;
        decision?;

        let member = find_member_mut(state, &target.id)?;
        member.role = new_role;
        member.updated_at = Utc::now();
        let result = member.clone();

        state.updated_at = Utc::now();
        Self::persist_inner(&self.persist_dir, state).await?;
        Ok(result)
    }

    /// Remove a member from the team, returning the removed record.
    pub async fn remove_member(&self, actor_id: &str, member_id: &str) -> Result<TeamMember> {
        self.try_load_from_disk().await;
        let mut guard = self.data.write().await;
        let state = guard.as_mut().ok_or_else(no_team)?;

        let actor = find_member(state, actor_id)?.clone();
        let target = find_member(state, member_id)?.clone();
        let action = TeamAction::RemoveMember;
        let decision = self.guard.require_removal(action, &actor, &target);
        self.audit(action, &actor.id, Some(&target.id), &decision)
            .await;
        decision?;

        state.members.retain(|m| m.id != target.id);
        state.updated_at = Utc::now();
        Self::persist_inner(&self.persist_dir, state).await?;
        Ok(target)
    }

    pub async fn deactivate_member(&self, actor_id: &str, member_id: &str) -> Result<TeamMember> {
        self.try_load_from_disk().await;
        let mut guard = self.data.write().await;
        let state = guard.as_mut().ok_or_else(no_team)?;

        let actor = find_member(state, actor_id)?.clone();
        let target = find_member(state, member_id)?.clone();
        let action = TeamAction::DeactivateMember;
        let decision = self.guard.require_removal(action, &actor, &target);
        self.audit(action, &actor.id, Some(&target.id), &decision)
            .await;
        decision?;

        let member = find_member_mut(state, &target.id)?;
        member.status = MembershipStatus::Inactive;
        member.updated_at = Utc::now();
        let result = member.clone();

        state.updated_at = Utc::now();
        Self::persist_inner(&self.persist_dir, state).await?;
        Ok(result)
    }

    /// Advisory capabilities for a member's client. Members who are not
    /// active get an empty snapshot.
    pub async fn capabilities(&self, member_id: &str) -> Result<CapabilitySnapshot> {
        let member = self.find_member(member_id).await?;
        if member.is_active() {
            return Ok(self.guard.model().snapshot(member.role));
        }
        Ok(CapabilitySnapshot {
            role: member.role,
            permissions: Vec::new(),
            manageable_roles: Vec::new(),
            assignable_roles: Vec::new(),
        })
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.lock().await.entries().cloned().collect()
    }

    /// Verify roster invariants (for debugging/auditing).
    pub async fn validate_invariants(&self) -> Result<()> {
        self.try_load_from_disk().await;
        let state = self.data.read().await;
        let state = state
            .as_ref()
            .ok_or(TeamError::InvalidOperation("no team exists".into()))?;
        check_invariants(state)
    }

    /// Clear roster state and remove the persisted file.
    pub async fn cleanup(&self) -> Result<()> {
        let mut guard = self.data.write().await;
        if let Some(state) = guard.as_ref() {
            let safe_name = sanitize_team_name(&state.team)?;
            let path = self.persist_dir.join(format!("{safe_name}.json"));
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tokio::fs::remove_file(&path).await?;
            }
        }
        *guard = None;
        Ok(())
    }

    async fn audit(
        &self,
        action: TeamAction,
        actor_id: &str,
        target_id: Option<&str>,
        decision: &Result<()>,
    ) {
        let (outcome, reason) = match decision {
            Ok(()) => (AuditDecision::Allowed, None),
            Err(TeamError::Forbidden { reason, .. }) => (AuditDecision::Denied, Some(reason.clone())),
            Err(err) => (AuditDecision::Denied, Some(err.to_string())),
        };
        self.audit.lock().await.record(
            actor_id,
            action.as_str(),
            target_id,
            outcome,
            reason.as_deref(),
        );
    }

    /// Persist the state to disk as JSON. Creates the directory if needed.
    async fn persist_inner(persist_dir: &Path, state: &TeamRosterData) -> Result<()> {
        let safe_name = sanitize_team_name(&state.team)?;
        tokio::fs::create_dir_all(persist_dir).await?;
        let path = persist_dir.join(format!("{safe_name}.json"));
        let json = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&path, json.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskr_permissions::Permission;

    fn make_roster(dir: &Path) -> TeamRoster {
        TeamRoster::new(dir.to_path_buf(), Arc::new(PermissionModel::default()))
    }

    /// Owner plus an active admin and an active member.
    async fn seeded(dir: &Path) -> (TeamRoster, String, TeamMember, TeamMember) {
        let roster = make_roster(dir);
        let state = roster.create_team("acme", "u-owner", "Olive").await.unwrap();
        let owner_id = state.owner_id;
        let admin = roster
            .invite_member(&owner_id, "u-admin", "Ada", Role::Admin)
            .await
            .unwrap();
        let admin = roster.accept_invitation(&admin.id).await.unwrap();
        let member = roster
            .invite_member(&owner_id, "u-member", "Max", Role::Member)
            .await
            .unwrap();
        let member = roster.accept_invitation(&member.id).await.unwrap();
        (roster, owner_id, admin, member)
    }

    #[tokio::test]
    async fn create_team_has_single_active_owner() {
        let tmp = tempfile::tempdir().unwrap();
        let roster = make_roster(tmp.path());
        let state = roster.create_team("acme", "u-1", "Olive").await.unwrap();
        assert_eq!(state.team, "acme");
        assert_eq!(state.members.len(), 1);
        assert_eq!(state.members[0].role, Role::Owner);
        assert_eq!(state.members[0].status, MembershipStatus::Active);
        assert_eq!(state.owner_id, state.members[0].id);
        roster.validate_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn create_team_rejects_duplicate() {
        let tmp = tempfile::tempdir().unwrap();
        let roster = make_roster(tmp.path());
        roster.create_team("acme", "u-1", "Olive").await.unwrap();
        let err = roster.create_team("acme", "u-1", "Olive").await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn operations_require_team() {
        let tmp = tempfile::tempdir().unwrap();
        let roster = make_roster(tmp.path());
        let err = roster
            .invite_member("x", "u-2", "Bo", Role::Member)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No team"));
    }

    #[tokio::test]
    async fn invited_member_is_inert_until_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let roster = make_roster(tmp.path());
        let state = roster.create_team("acme", "u-1", "Olive").await.unwrap();
        let admin = roster
            .invite_member(&state.owner_id, "u-2", "Ada", Role::Admin)
            .await
            .unwrap();
        assert_eq!(admin.status, MembershipStatus::Invited);
        assert_eq!(admin.invited_by.as_deref(), Some(state.owner_id.as_str()));

        let err = roster
            .invite_member(&admin.id, "u-3", "Max", Role::Member)
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
        assert!(roster.capabilities(&admin.id).await.unwrap().permissions.is_empty());

        roster.accept_invitation("u-2").await.unwrap();
        roster
            .invite_member(&admin.id, "u-3", "Max", Role::Member)
            .await
            .unwrap();
        let caps = roster.capabilities("u-2").await.unwrap();
        assert!(caps.allows(Permission::InviteTeamMembers));
        assert!(!caps.allows(Permission::ManageBilling));
    }

    #[tokio::test]
    async fn accept_invitation_twice_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, _, admin, _) = seeded(tmp.path()).await;
        let err = roster.accept_invitation(&admin.id).await.unwrap_err();
        assert!(err.to_string().contains("no pending invitation"));
    }

    #[tokio::test]
    async fn invite_rejects_existing_user() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, _, _) = seeded(tmp.path()).await;
        let err = roster
            .invite_member(&owner_id, "u-member", "Max again", Role::Member)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already a team member"));
    }

    #[tokio::test]
    async fn admin_cannot_invite_admin_or_anyone_owner() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, admin, member) = seeded(tmp.path()).await;
        assert!(
            roster
                .invite_member(&admin.id, "u-x", "X", Role::Admin)
                .await
                .unwrap_err()
                .is_forbidden()
        );
        assert!(
            roster
                .invite_member(&owner_id, "u-y", "Y", Role::Owner)
                .await
                .unwrap_err()
                .is_forbidden()
        );
        assert!(
            roster
                .invite_member(&member.id, "u-z", "Z", Role::Member)
                .await
                .unwrap_err()
                .is_forbidden()
        );
    }

    #[tokio::test]
    async fn owner_promotes_and_demotes() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, admin, member) = seeded(tmp.path()).await;
        let promoted = roster
            .change_role(&owner_id, &member.id, Role::Admin)
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);
        let demoted = roster
            .change_role(&owner_id, &admin.id, Role::Member)
            .await
            .unwrap();
        assert_eq!(demoted.role, Role::Member);
        roster.validate_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn owner_role_is_frozen() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, admin, _) = seeded(tmp.path()).await;
        for actor in [owner_id.as_str(), admin.id.as_str()] {
            for new_role in [Role::Admin, Role::Member] {
                let err = roster
                    .change_role(actor, &owner_id, new_role)
                    .await
                    .unwrap_err();
                assert!(err.is_forbidden());
            }
        }
        let owner = roster.find_member(&owner_id).await.unwrap();
        assert_eq!(owner.role, Role::Owner);
    }

    #[tokio::test]
    async fn ownership_is_not_granted_by_role_change() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, _, member) = seeded(tmp.path()).await;
        let err = roster
            .change_role(&owner_id, &member.id, Role::Owner)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ownership"));
        roster.validate_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn admin_role_changes_are_limited() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, admin, member) = seeded(tmp.path()).await;

        // Admin cannot promote.
        let err = roster
            .change_role(&admin.id, &member.id, Role::Admin)
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        // Admin cannot demote a fellow admin.
        let second = roster
            .invite_member(&owner_id, "u-admin-2", "Bea", Role::Admin)
            .await
            .unwrap();
        roster.accept_invitation(&second.id).await.unwrap();
        let err = roster
            .change_role(&admin.id, &second.id, Role::Member)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot manage"));
    }

    #[tokio::test]
    async fn removal_respects_hierarchy() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, admin, member) = seeded(tmp.path()).await;

        assert!(
            roster
                .remove_member(&member.id, &admin.id)
                .await
                .unwrap_err()
                .is_forbidden()
        );
        assert!(
            roster
                .remove_member(&admin.id, &owner_id)
                .await
                .unwrap_err()
                .is_forbidden()
        );
        assert!(
            roster
                .remove_member(&owner_id, &owner_id)
                .await
                .unwrap_err()
                .is_forbidden()
        );

        let removed = roster.remove_member(&admin.id, &member.id).await.unwrap();
        assert_eq!(removed.user_id, "u-member");
        assert!(matches!(
            roster.find_member(&member.id).await.unwrap_err(),
            TeamError::NotFound(_)
        ));
        roster.validate_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn deactivated_admin_loses_authority() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, admin, member) = seeded(tmp.path()).await;
        let deactivated = roster.deactivate_member(&owner_id, &admin.id).await.unwrap();
        assert_eq!(deactivated.status, MembershipStatus::Inactive);
        let err = roster
            .remove_member(&admin.id, &member.id)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not active"));
    }

    #[tokio::test]
    async fn decisions_are_audited() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, admin, member) = seeded(tmp.path()).await;
        let _ = roster.change_role(&admin.id, &member.id, Role::Admin).await;

        let entries = roster.audit_entries().await;
        // Two allowed invitations from seeding, then the denied promotion.
        assert_eq!(entries.len(), 3);
        assert!(entries[..2].iter().all(|e| e.decision == AuditDecision::Allowed));
        assert!(entries[..2].iter().all(|e| e.actor == owner_id));
        let last = &entries[2];
        assert_eq!(last.action, "change_role");
        assert_eq!(last.actor, admin.id);
        assert_eq!(last.target.as_deref(), Some(member.id.as_str()));
        assert_eq!(last.decision, AuditDecision::Denied);
        assert!(last.reason.is_some());
    }

    #[tokio::test]
    async fn unknown_actor_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, _, _, member) = seeded(tmp.path()).await;
        let err = roster
            .remove_member("u-stranger", &member.id)
            .await
            .unwrap_err();
        assert!(matches!(err, TeamError::NotFound(_)));
    }

    #[tokio::test]
    async fn cleanup_removes_state() {
        let tmp = tempfile::tempdir().unwrap();
        let roster = make_roster(tmp.path());
        roster.create_team("cleanup-team", "u-1", "Olive").await.unwrap();
        roster.cleanup().await.unwrap();
        assert!(roster.get_team().await.is_err());
        assert!(!tmp.path().join("cleanup-team.json").exists());
    }

    #[tokio::test]
    async fn persistence_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let (_roster, _, _, _) = seeded(tmp.path()).await;

        let raw = tokio::fs::read_to_string(tmp.path().join("acme.json"))
            .await
            .unwrap();
        let loaded: TeamRosterData = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.team, "acme");
        assert_eq!(loaded.members.len(), 3);
        assert!(raw.contains("\"role\": \"ADMIN\""));
        assert!(raw.contains("\"status\": \"ACTIVE\""));
    }

    #[tokio::test]
    async fn second_roster_loads_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let (first, owner_id, _, member) = seeded(tmp.path()).await;
        first
            .change_role(&owner_id, &member.id, Role::Admin)
            .await
            .unwrap();

        let second = make_roster(tmp.path());
        let reloaded = second.find_member("u-member").await.unwrap();
        assert_eq!(reloaded.role, Role::Admin);
        assert_eq!(second.list_members().await.unwrap().len(), 3);
        second.validate_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn create_team_refuses_team_persisted_by_another_roster() {
        let tmp = tempfile::tempdir().unwrap();
        let (_first, owner_id, _, _) = seeded(tmp.path()).await;

        let second = make_roster(tmp.path());
        let err = second
            .create_team("acme", "u-intruder", "Ivy")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let third = make_roster(tmp.path());
        let state = third.get_team().await.unwrap();
        assert_eq!(state.owner_id, owner_id);
        assert_eq!(state.members.len(), 3);
        assert!(third.find_member("u-intruder").await.is_err());
    }

    #[tokio::test]
    async fn create_team_refuses_unloadable_file_of_same_name() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("acme.json"), b"not json")
            .await
            .unwrap();
        let roster = make_roster(tmp.path());
        let err = roster.create_team("acme", "u-1", "Olive").await.unwrap_err();
        assert!(err.to_string().contains("already exists on disk"));
        let raw = tokio::fs::read(tmp.path().join("acme.json")).await.unwrap();
        assert_eq!(raw, b"not json");
    }

    #[tokio::test]
    async fn roster_with_two_owners_is_not_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let (_first, _, admin, _) = seeded(tmp.path()).await;

        let path = tmp.path().join("acme.json");
        let mut state: TeamRosterData =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        state
            .members
            .iter_mut()
            .find(|m| m.id == admin.id)
            .unwrap()
            .role = Role::Owner;
        tokio::fs::write(&path, serde_json::to_vec_pretty(&state).unwrap())
            .await
            .unwrap();

        let second = make_roster(tmp.path());
        assert!(second.get_team().await.is_err());
        let err = second
            .remove_member(&admin.id, "u-member")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No team"));
        assert!(second.validate_invariants().await.is_err());
    }

    #[tokio::test]
    async fn loader_picks_first_valid_roster_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let beta = make_roster(tmp.path());
        beta.create_team("beta", "u-b", "Bo").await.unwrap();
        tokio::fs::write(tmp.path().join("alpha.json"), b"{}")
            .await
            .unwrap();
        let gamma_dir = tempfile::tempdir().unwrap();
        let gamma = make_roster(gamma_dir.path());
        gamma.create_team("gamma", "u-g", "Gil").await.unwrap();
        tokio::fs::copy(
            gamma_dir.path().join("gamma.json"),
            tmp.path().join("gamma.json"),
        )
        .await
        .unwrap();

        let reader = make_roster(tmp.path());
        assert_eq!(reader.get_team().await.unwrap().team, "beta");
    }

    #[tokio::test]
    async fn validate_invariants_reads_persisted_team() {
        let tmp = tempfile::tempdir().unwrap();
        let _ = seeded(tmp.path()).await;
        let fresh = make_roster(tmp.path());
        fresh.validate_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_invite_is_audited_as_denied() {
        let tmp = tempfile::tempdir().unwrap();
        let (roster, owner_id, _, _) = seeded(tmp.path()).await;
        let _ = roster
            .invite_member(&owner_id, "u-member", "Max again", Role::Member)
            .await;
        let entries = roster.audit_entries().await;
        let last = entries.last().unwrap();
        assert_eq!(last.action, "invite_member");
        assert_eq!(last.decision, AuditDecision::Denied);
        assert!(
            last.reason
                .as_deref()
                .unwrap()
                .contains("already a team member")
        );
    }

    #[tokio::test]
    async fn sanitize_team_name_rules() {
        assert_eq!(sanitize_team_name("my team!").unwrap(), "my_team_");
        assert!(sanitize_team_name("").is_err());
        assert!(sanitize_team_name("..").is_err());
    }
}
