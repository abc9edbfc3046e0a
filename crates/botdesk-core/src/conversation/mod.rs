//! Conversation persistence and transcript recording.

mod recorder;
pub mod repository;

pub use recorder::TranscriptRecorder;
pub use repository::ConversationRepository;
