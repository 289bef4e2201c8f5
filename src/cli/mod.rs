//! CLI module
//!
//! Command-line interface for the file-sharing client.

pub mod args;
pub mod config;
pub mod console;

pub use args::{CliArgs, Command};
pub use config::Config;
pub use console::Console;
