//! Payment processor webhook.
//!
//! POST /api/v1/billing/webhook
//!
//! Receives subscription lifecycle events, maps processor price ids to plans
//! through the config table, and upserts the tenant's subscription row. The
//! tenant is identified by `custom_data.tenant_id` attached at checkout.
//! Handled and ignored events alike answer 200 `{ "ok": true }` so the
//! processor does not retry; a bad signature is the only rejection.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{debug, info, warn};
use uuid::Uuid;

use botdesk_core::billing::SubscriptionRepository;
use botdesk_core::widget::WidgetSettingsRepository;
use botdesk_types::billing::{Subscription, SubscriptionStatus};
use botdesk_types::config::BillingConfig;

use crate::http::error::AppError;
use crate::state::AppState;

/// Signature header sent by the payment processor.
const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event_type: String,
    #[serde(default)]
    data: WebhookData,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookData {
    /// Processor's subscription id.
    id: Option<String>,
    customer_id: Option<String>,
    status: Option<String>,
    #[serde(default)]
    items: Vec<WebhookItem>,
    custom_data: Option<CustomData>,
    trial_ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WebhookItem {
    price: Option<WebhookPrice>,
}

#[derive(Debug, Deserialize)]
struct WebhookPrice {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CustomData {
    tenant_id: Option<Uuid>,
}

/// POST /api/v1/billing/webhook — subscription lifecycle events.
pub async fn billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    if let Some(secret) = state.config.billing.webhook_secret.as_deref() {
        verify_signature(secret, &headers, &body)?;
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {e}")))?;

    handle_event(
        state.subscriptions.as_ref(),
        state.settings.as_ref(),
        &state.config.billing,
        &event,
    )
    .await;

    Ok(Json(json!({ "ok": true })))
}

/// Dispatch one parsed event to the matching subscription mutation.
///
/// Generic over the repositories so the business rules can be exercised
/// without a database.
async fn handle_event<S, W>(
    subscriptions: &S,
    settings: &W,
    billing: &BillingConfig,
    event: &WebhookEvent,
) where
    S: SubscriptionRepository,
    W: WidgetSettingsRepository,
{
    match event.event_type.as_str() {
        "subscription.created" | "subscription.activated" | "subscription.updated" => {
            apply_subscription_event(subscriptions, settings, billing, event).await;
        }
        "subscription.canceled" => {
            cancel_subscription(subscriptions, event).await;
        }
        other => {
            debug!(event_type = %other, "ignoring webhook event");
        }
    }
}

/// Upsert the subscription row from a created/activated/updated event and
/// seed default widget settings so the tenant's embed works immediately.
///
/// Events without a `custom_data.tenant_id` cannot be attributed and are
/// logged and dropped; answering non-200 would only make the processor
/// retry a payload that can never succeed.
async fn apply_subscription_event<S, W>(
    subscriptions: &S,
    settings: &W,
    billing: &BillingConfig,
    event: &WebhookEvent,
) where
    S: SubscriptionRepository,
    W: WidgetSettingsRepository,
{
    let Some(tenant_id) = event.data.custom_data.as_ref().and_then(|cd| cd.tenant_id) else {
        warn!(event_type = %event.event_type, "webhook event without tenant_id, dropping");
        return;
    };

    let status = event
        .data
        .status
        .as_deref()
        .and_then(|s| s.parse::<SubscriptionStatus>().ok())
        .unwrap_or(SubscriptionStatus::Active);

    let price_id = event
        .data
        .items
        .first()
        .and_then(|item| item.price.as_ref())
        .map(|price| price.id.as_str());
    let plan = match price_id {
        Some(id) => billing.plan_for_price(id),
        None => billing.fallback_plan,
    };

    let now = Utc::now();
    let existing = match subscriptions.get_subscription(&tenant_id).await {
        Ok(existing) => existing,
        Err(err) => {
            warn!(tenant_id = %tenant_id, error = %err, "subscription lookup failed, dropping event");
            return;
        }
    };

    let activated_at = match (&existing, status) {
        (Some(prev), _) if prev.activated_at.is_some() => prev.activated_at,
        (_, SubscriptionStatus::Active) => Some(now),
        _ => None,
    };
    let created_at = existing.as_ref().map(|prev| prev.created_at).unwrap_or(now);

    let subscription = Subscription {
        tenant_id,
        status,
        plan,
        trial_ends_at: event.data.trial_ends_at,
        processor_subscription_id: event.data.id.clone(),
        processor_customer_id: event.data.customer_id.clone(),
        activated_at,
        created_at,
        updated_at: now,
    };

    if let Err(err) = subscriptions.upsert_subscription(&subscription).await {
        warn!(tenant_id = %tenant_id, error = %err, "subscription upsert failed");
        return;
    }
    if let Err(err) = settings.ensure_defaults(&tenant_id).await {
        warn!(tenant_id = %tenant_id, error = %err, "seeding widget defaults failed");
    }

    info!(tenant_id = %tenant_id, status = %status, plan = %plan, "subscription updated");
}

/// Flip the row to canceled by the processor's subscription id.
async fn cancel_subscription<S>(subscriptions: &S, event: &WebhookEvent)
where
    S: SubscriptionRepository,
{
    let Some(processor_id) = event.data.id.as_deref() else {
        warn!("cancel event without subscription id, dropping");
        return;
    };

    match subscriptions
        .set_status_by_processor_id(processor_id, SubscriptionStatus::Canceled)
        .await
    {
        Ok(()) => info!(processor_id = %processor_id, "subscription canceled"),
        Err(err) => {
            warn!(processor_id = %processor_id, error = %err, "cancel failed")
        }
    }
}

/// Verify the HMAC-SHA256 signature over the raw body, sent as hex.
///
/// Comparison goes through `Mac::verify_slice`, which is constant-time.
fn verify_signature(secret: &str, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".to_string()))?;
    let provided = decode_hex(provided.trim())
        .ok_or_else(|| AppError::Unauthorized("Invalid webhook signature".to_string()))?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid webhook secret: {e}")))?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| AppError::Unauthorized("Invalid webhook signature".to_string()))
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if !s.is_ascii() || s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
