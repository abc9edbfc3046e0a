//! Widget script delivery.
//!
//! GET /widget.js?uid=<tenant>
//!
//! Renders the per-tenant embed script with the tenant's branding baked in.
//! Responses are cacheable for five minutes so CDN/browser caches absorb
//! repeat page loads; branding edits propagate within that window.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use botdesk_core::widget::render_widget_script;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WidgetQuery {
    pub uid: Option<String>,
}

/// GET /widget.js — per-tenant embed script.
pub async fn widget_script(
    State(state): State<AppState>,
    Query(query): Query<WidgetQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(uid) = query.uid.as_deref().filter(|uid| !uid.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing uid parameter").into_response();
    };
    let Ok(tenant_id) = Uuid::parse_str(uid) else {
        return (StatusCode::BAD_REQUEST, "Invalid uid parameter").into_response();
    };

    let branding = state.personas.branding(&tenant_id).await;
    let script = render_widget_script(tenant_id, &relay_url(&headers), &branding);

    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        script,
    )
        .into_response()
}

/// Absolute relay URL derived from the incoming request, so the same binary
/// works behind a proxy (X-Forwarded-Proto) and in local development.
fn relay_url(headers: &HeaderMap) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{proto}://{host}/api/v1/chat")
}
