pub mod cli_args;
pub mod commands;

pub use cli_args::Command;
pub use cli_args::TaskrCli;
pub use commands::Outcome;
pub use commands::load_model;
pub use commands::run;
