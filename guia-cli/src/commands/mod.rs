//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path)
//! - [`locate`] - Single coordinate lookup
//! - [`track`] - Follow positions read from stdin

pub mod common;
pub mod config;
pub mod locate;
pub mod track;
