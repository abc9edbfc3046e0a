//! Application state wiring all services together.
//!
//! Core services are generic over repository and gateway traits; AppState
//! pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use botdesk_core::billing::EntitlementGate;
use botdesk_core::conversation::TranscriptRecorder;
use botdesk_core::relay::RelayService;
use botdesk_core::widget::PersonaResolver;
use botdesk_infra::config::{gateway_api_key, load_global_config, resolve_data_dir};
use botdesk_infra::gateway::HttpCompletionGateway;
use botdesk_infra::sqlite::conversation::SqliteConversationRepository;
use botdesk_infra::sqlite::pool::DatabasePool;
use botdesk_infra::sqlite::subscription::SqliteSubscriptionRepository;
use botdesk_infra::sqlite::widget_settings::SqliteWidgetSettingsRepository;
use botdesk_types::config::GlobalConfig;

/// Relay service pinned to the infra implementations.
pub type ConcreteRelayService = RelayService<
    SqliteSubscriptionRepository,
    SqliteWidgetSettingsRepository,
    HttpCompletionGateway,
>;

/// Shared application state used by the CLI and the REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ConcreteRelayService>,
    pub personas: Arc<PersonaResolver<SqliteWidgetSettingsRepository>>,
    pub recorder: Arc<TranscriptRecorder<SqliteConversationRepository>>,
    pub subscriptions: Arc<SqliteSubscriptionRepository>,
    pub settings: Arc<SqliteWidgetSettingsRepository>,
    pub conversations: Arc<SqliteConversationRepository>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to the
    /// database, wire services. Fails fast when the gateway API key is
    /// missing from the environment.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let api_key = gateway_api_key()?;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("botdesk.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let gateway = HttpCompletionGateway::new(&config.gateway, api_key);
        let relay = RelayService::new(
            EntitlementGate::new(SqliteSubscriptionRepository::new(db_pool.clone())),
            PersonaResolver::new(SqliteWidgetSettingsRepository::new(db_pool.clone())),
            gateway,
        );

        Ok(Self {
            relay: Arc::new(relay),
            personas: Arc::new(PersonaResolver::new(SqliteWidgetSettingsRepository::new(
                db_pool.clone(),
            ))),
            recorder: Arc::new(TranscriptRecorder::new(SqliteConversationRepository::new(
                db_pool.clone(),
            ))),
            subscriptions: Arc::new(SqliteSubscriptionRepository::new(db_pool.clone())),
            settings: Arc::new(SqliteWidgetSettingsRepository::new(db_pool.clone())),
            conversations: Arc::new(SqliteConversationRepository::new(db_pool.clone())),
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }
}
