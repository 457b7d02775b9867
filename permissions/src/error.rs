use crate::permission::Permission;
use crate::role::Role;

/// Errors raised while decoding or loading permission data.
///
/// Authorization decisions themselves never error; they fail closed.
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    #[error("owner role is missing permission {0}")]
    OwnerMissingPermission(Permission),

    #[error("{lower} holds {permission} but {higher} does not")]
    HierarchyViolation {
        higher: Role,
        lower: Role,
        permission: Permission,
    },

    #[error("invalid permission table: {0}")]
    InvalidTable(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PermissionError>;
