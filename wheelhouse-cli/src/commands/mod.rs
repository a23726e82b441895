//! CLI subcommand implementations.
//!
//! One module per subcommand, each exposing `run(...) -> Result<(),
//! CliError>`; shared per-package machinery lives in `common`.

pub mod check;
pub mod clean;
pub mod common;
pub mod download;
pub mod failed;
pub mod fetch;
pub mod retry;
pub mod simple;
