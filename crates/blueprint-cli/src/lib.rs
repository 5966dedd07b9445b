//! Blueprint CLI library
//!
//! Hosts for the blueprint generation orchestrator: the one-shot `generate`
//! command, the interactive console and the command registry behind it.

pub mod commands;
pub mod config;
pub mod registry;

pub use config::AppConfig;
pub use registry::{CommandProvider, CommandRegistry, CommandSpec, DuplicatePolicy};
