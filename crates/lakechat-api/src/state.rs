//! Application state wiring the chat session to its adapters.
//!
//! `ChatSession` is generic over store/backend/identity traits; AppState pins
//! it to the SQLite store, the HTTP backend and the configured identity.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use lakechat_core::session::ChatSession;
use lakechat_infra::config::{apply_env_overrides, load_client_config, resolve_data_dir};
use lakechat_infra::http::HttpQueryBackend;
use lakechat_infra::identity::StaticIdentity;
use lakechat_infra::sqlite::pool::{DatabasePool, database_url};
use lakechat_infra::sqlite::store::SqliteMessageStore;
use lakechat_types::config::ClientConfig;

/// Chat session pinned to the concrete infra implementations.
pub type ConcreteChatSession = ChatSession<SqliteMessageStore, HttpQueryBackend, StaticIdentity>;

/// Shared application state used by every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<ConcreteChatSession>,
    pub config: ClientConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, open the database, wire the session.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = apply_env_overrides(load_client_config(&data_dir).await);
        tracing::debug!(?config, data_dir = %data_dir.display(), "Loaded configuration");

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open the message database")?;

        let store = SqliteMessageStore::new(db_pool);
        let backend = HttpQueryBackend::from_config(&config)?;
        let identity = StaticIdentity::from_config(&config);

        let session = ChatSession::new(store, backend, identity, config.request_timeout());

        Ok(Self {
            session: Arc::new(session),
            config,
            data_dir,
        })
    }
}
