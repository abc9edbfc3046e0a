//! Incremental server-sent-event parsing for the completion stream.
//!
//! The relay forwards upstream bytes verbatim; re-parsing happens in the
//! browser and, for transcript recording, here on the server via
//! [`SseReassembler`]. The reassembler is a line-buffering state machine
//! that tolerates any chunking of the byte stream, including splits
//! mid-line and mid-multibyte-character.

mod reassembler;

pub use reassembler::SseReassembler;
