//! Business logic for BotDesk.
//!
//! Holds the streaming relay pipeline and its collaborators: the SSE
//! reassembler, entitlement gate, persona resolver, widget script generator,
//! and transcript recorder. Persistence and HTTP are behind traits; the
//! concrete implementations live in `botdesk-infra`. This crate never
//! depends on infra.

pub mod billing;
pub mod conversation;
pub mod relay;
pub mod sse;
pub mod widget;
