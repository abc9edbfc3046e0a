//! HTTP request handlers.

pub mod billing;
pub mod chat;
pub mod conversation;
pub mod widget;
