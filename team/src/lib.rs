pub mod error;
pub mod guard;
pub mod roster;
pub mod types;

pub use error::{Result, TeamError};
pub use guard::{AccessGuard, TeamAction};
pub use roster::TeamRoster;
pub use types::*;
