//! Core domain + application logic for the mention bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! `ChatClient` port (see [`messaging::port`]) implemented in the adapter crate.

pub mod authorization;
pub mod cancellation;
pub mod chunking;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod mention;
pub mod messaging;
pub mod roster;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
