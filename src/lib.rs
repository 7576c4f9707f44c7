//! Maintenance service log library
//!
//! This library provides local persistence for service records and provider
//! contacts, plus the derived views (upcoming/history, expense totals,
//! contact groups and filters) computed over them.

mod book;
mod cli;
mod config;
mod contact;
mod date;
mod errors;
mod helper;
mod kv;
mod query;
mod record;
mod reminders;
mod storage;
mod types;

// Re-export key components
pub use book::*;
pub use cli::*;
pub use config::*;
pub use contact::*;
pub use date::*;
pub use errors::*;
pub use helper::*;
pub use kv::*;
pub use query::*;
pub use record::*;
pub use reminders::*;
pub use storage::*;
pub use types::*;
