use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::IntoStaticStr;

use crate::error::PermissionError;

/// Role of a member within a team account.
///
/// Declared from most to least privileged so that `Ord` follows authority.
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
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    /// Decode a role name, returning `None` for anything unrecognized.
    pub fn parse(name: &str) -> Option<Self> {
        Self::from_str(name.trim()).ok()
    }

    /// Decode a role name at a trust boundary where bad input must be rejected.
    pub fn decode(name: &str) -> Result<Self, PermissionError> {
        Self::parse(name).ok_or_else(|| PermissionError::UnknownRole(name.to_string()))
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn is_owner(self) -> bool {
        self == Role::Owner
    }
}
