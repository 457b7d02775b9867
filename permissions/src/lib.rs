pub mod audit;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod permission;
pub mod role;
pub mod snapshot;
pub mod table;

// Re-export key types for convenience.
pub use audit::{AuditDecision, AuditEntry, AuditLog};
pub use error::{PermissionError, Result};
pub use hierarchy::{can_assign_role, can_change_role, can_manage_user};
pub use model::PermissionModel;
pub use permission::{Permission, PermissionDomain};
pub use role::Role;
pub use snapshot::CapabilitySnapshot;
pub use table::{HierarchyViolation, RolePermissionTable, TableConfig};
