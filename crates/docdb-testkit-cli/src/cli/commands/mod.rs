//! CLI command handlers, one file per command.

mod config;
mod list;
mod seed;
mod wipe;

pub use config::run_config;
pub use list::run_list;
pub use seed::run_seed;
pub use wipe::run_wipe;
