//! Global configuration tree loaded from `config.toml` in the data directory.
//!
//! Every field has a serde default so a missing or partial file degrades to
//! a working dev configuration. The upstream gateway API key is deliberately
//! NOT part of this tree; it comes from the environment and is wrapped in a
//! `SecretString` at load time (see `botdesk-infra::config`).

use serde::{Deserialize, Serialize};

use crate::billing::Plan;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub widget: WidgetConfig,
    #[serde(default)]
    pub billing: BillingConfig,
}

/// Upstream AI gateway endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the OpenAI-compatible completion API.
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,
    /// Model identifier sent with every completion request.
    #[serde(default = "default_gateway_model")]
    pub model: String,
    /// Abort a streaming read if no chunk arrives within this many seconds.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_base_url(),
            model: default_gateway_model(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_gateway_base_url() -> String {
    "https://ai.gateway.lovable.dev/v1".to_string()
}

fn default_gateway_model() -> String {
    "google/gemini-3-flash-preview".to_string()
}

fn default_idle_timeout_secs() -> u64 {
    120
}

/// Widget delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Persist anonymous embedded-widget exchanges to the dashboard.
    ///
    /// Off by default: the demo deployment records nothing. Turning this on
    /// makes the relay tee each completed exchange into the transcript
    /// recorder.
    #[serde(default)]
    pub record_widget_transcripts: bool,
}

/// Billing webhook settings, including the price-id-to-plan table.
///
/// The relay core never sees plan names; this table is consulted only by the
/// webhook handler when it upserts a subscription row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Shared secret for HMAC-SHA256 webhook signature verification.
    /// Verification is skipped when unset (local development).
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Processor price id to plan mapping.
    #[serde(default = "default_plan_prices")]
    pub plan_prices: Vec<PlanPrice>,
    /// Plan assumed when a price id is not in the table.
    #[serde(default = "default_fallback_plan")]
    pub fallback_plan: Plan,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            plan_prices: default_plan_prices(),
            fallback_plan: default_fallback_plan(),
        }
    }
}

impl BillingConfig {
    /// Resolve a processor price id to a plan, falling back when unknown.
    pub fn plan_for_price(&self, price_id: &str) -> Plan {
        self.plan_prices
            .iter()
            .find(|entry| entry.price_id == price_id)
            .map(|entry| entry.plan)
            .unwrap_or(self.fallback_plan)
    }
}

/// One row of the price-id-to-plan table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPrice {
    pub price_id: String,
    pub plan: Plan,
}

fn default_plan_prices() -> Vec<PlanPrice> {
    vec![
        PlanPrice {
            price_id: "pri_01kjeyspgn3smejp2dyb55nwy6".to_string(),
            plan: Plan::Starter,
        },
        PlanPrice {
            price_id: "pri_01kjeytvp30tfrx579svf206w8".to_string(),
            plan: Plan::Growth,
        },
    ]
}

fn default_fallback_plan() -> Plan {
    Plan::HighEnd
}
