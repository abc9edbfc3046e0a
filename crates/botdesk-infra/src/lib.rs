//! Infrastructure implementations for BotDesk.
//!
//! Concrete backends for the traits defined in `botdesk-core`: SQLite
//! repositories over a split read/write pool, the HTTP client for the
//! upstream AI gateway, and configuration loading.

pub mod config;
pub mod gateway;
pub mod sqlite;
