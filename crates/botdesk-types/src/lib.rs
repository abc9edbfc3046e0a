//! Shared domain types for BotDesk.
//!
//! This crate holds the plain data shapes used across the workspace:
//! chat messages, conversations, subscriptions, widget settings, the
//! configuration tree, and the error enums. It has no I/O and no
//! dependencies on the other workspace crates.

pub mod billing;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod widget;
