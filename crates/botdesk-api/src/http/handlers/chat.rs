//! Streaming relay endpoint.
//!
//! POST /api/v1/chat
//!
//! Hands the turn history to the relay service and pipes the upstream SSE
//! bytes back verbatim. When transcript recording is enabled the same bytes
//! are fed through a server-side reassembler; once the stream completes, the
//! exchange is persisted off the response path, best effort.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::Response;
use axum::Json;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use botdesk_core::conversation::{ConversationRepository, TranscriptRecorder};
use botdesk_core::relay::RelayStream;
use botdesk_core::sse::SseReassembler;
use botdesk_types::chat::{ChatMessage, MessageRole};

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for the relay endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Full turn history, chronological.
    pub messages: Vec<ChatMessage>,
    /// Tenant id when the call comes from an embedded widget.
    pub widget_user_id: Option<String>,
    /// Per-page conversation id generated by the widget.
    pub conversation_id: Option<Uuid>,
}

/// POST /api/v1/chat — relay a turn history to the AI gateway.
pub async fn relay_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let tenant_id = match body.widget_user_id.as_deref() {
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| AppError::Validation("Invalid widget_user_id".to_string()))?,
        ),
        None => None,
    };

    let mut stream = state.relay.relay(tenant_id, &body.messages).await?;

    if state.config.widget.record_widget_transcripts {
        if let Some(tenant) = tenant_id {
            let user_text = body
                .messages
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            stream = tee_transcript(
                stream,
                state.recorder.clone(),
                tenant,
                body.conversation_id,
                user_text,
            );
        }
    }

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

/// Pass bytes through untouched while reassembling the assistant's reply;
/// persist the exchange once the `[DONE]` sentinel has been delivered.
///
/// Recording runs in a detached task and its failures are logged, never
/// surfaced: by this point the visitor already has the full response.
fn tee_transcript<C>(
    upstream: RelayStream,
    recorder: Arc<TranscriptRecorder<C>>,
    tenant_id: Uuid,
    conversation_id: Option<Uuid>,
    user_text: String,
) -> RelayStream
where
    C: ConversationRepository + 'static,
{
    Box::pin(async_stream::stream! {
        let mut upstream = upstream;
        let mut reassembler = SseReassembler::new();
        let mut assistant = String::new();

        while let Some(item) = upstream.next().await {
            if let Ok(chunk) = &item {
                for fragment in reassembler.push(chunk) {
                    assistant.push_str(&fragment);
                }
            }
            yield item;
        }

        if reassembler.is_done() && !assistant.is_empty() {
            tokio::spawn(async move {
                if let Err(err) = recorder
                    .record(&tenant_id, conversation_id, &user_text, &assistant)
                    .await
                {
                    warn!(tenant_id = %tenant_id, error = %err, "transcript recording failed");
                }
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use botdesk_infra::sqlite::conversation::SqliteConversationRepository;
    use botdesk_infra::sqlite::pool::DatabasePool;
    use botdesk_types::error::RelayError;
    use bytes::Bytes;

    async fn test_recorder() -> (
        Arc<TranscriptRecorder<SqliteConversationRepository>>,
        SqliteConversationRepository,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (
            Arc::new(TranscriptRecorder::new(SqliteConversationRepository::new(pool.clone()))),
            SqliteConversationRepository::new(pool),
            dir,
        )
    }

    fn upstream(chunks: Vec<&'static [u8]>) -> RelayStream {
        Box::pin(futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, RelayError>(Bytes::from_static(c)))
                .collect::<Vec<_>>(),
        ))
    }

    #[tokio::test]
    async fn test_tee_passes_bytes_verbatim_and_records() {
        let (recorder, repo, _dir) = test_recorder().await;
        let tenant = Uuid::now_v7();
        let convo = Uuid::now_v7();

        let chunks: Vec<&'static [u8]> = vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            b"data: [DONE]\n\n",
        ];
        let expected: Vec<u8> = chunks.concat();

        let teed = tee_transcript(
            upstream(chunks),
            recorder,
            tenant,
            Some(convo),
            "Hi there".to_string(),
        );
        let out: Vec<u8> = teed
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flat_map(|r| r.unwrap().to_vec())
            .collect();
        assert_eq!(out, expected);

        // recording runs in a detached task; poll briefly
        let mut messages = Vec::new();
        for _ in 0..50 {
            messages = repo.get_messages(&convo).await.unwrap();
            if messages.len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hi there");
        assert_eq!(messages[1].content, "Hello");
    }

    #[tokio::test]
    async fn test_tee_does_not_record_incomplete_stream() {
        let (recorder, repo, _dir) = test_recorder().await;
        let tenant = Uuid::now_v7();
        let convo = Uuid::now_v7();

        // no [DONE] sentinel
        let chunks: Vec<&'static [u8]> =
            vec![b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n"];
        let teed = tee_transcript(
            upstream(chunks),
            recorder,
            tenant,
            Some(convo),
            "Hi".to_string(),
        );
        let _ = teed.collect::<Vec<_>>().await;

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(repo.get_messages(&convo).await.unwrap().is_empty());
    }
}
