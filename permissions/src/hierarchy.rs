//! Relational rules between roles.
//!
//! These answer "who may act on whom" and are deliberately independent of the
//! permission table: swapping the table never changes who outranks whom.

use strum::IntoEnumIterator;

use crate::role::Role;

/// Whether a member with `manager` may manage a member with `target`.
///
/// Nobody manages the owner, not even another owner.
pub fn can_manage_user(manager: Role, target: Role) -> bool {
    if target == Role::Owner {
        return false;
    }
    if manager == Role::Owner {
        return true;
    }
    manager == Role::Admin && target == Role::Member
}

/// Whether `changer` may move a member from `current` to `new_role`.
///
/// The owner's role is frozen. Only an owner promotes to admin; an admin may
/// only demote to member.
pub fn can_change_role(current: Role, new_role: Role, changer: Role) -> bool {
    if current == Role::Owner {
        return false;
    }
    if new_role == Role::Admin && changer != Role::Owner {
        return false;
    }
    if changer == Role::Owner {
        return true;
    }
    changer == Role::Admin && new_role == Role::Member
}

/// Whether `assigner` may grant `role` to a newly invited member.
///
/// Invitations never create an owner.
pub fn can_assign_role(assigner: Role, role: Role) -> bool {
    match (assigner, role) {
        (_, Role::Owner) => false,
        (Role::Owner, _) => true,
        (Role::Admin, Role::Member) => true,
        _ => false,
    }
}

pub fn manageable_roles(manager: Role) -> Vec<Role> {
    Role::iter().filter(|&t| can_manage_user(manager, t)).collect()
}

pub fn assignable_roles(assigner: Role) -> Vec<Role> {
    Role::iter().filter(|&r| can_assign_role(assigner, r)).collect()
}
