//! `AppCore` - the primary application facade.
//!
//! This is the composition root for core services. Adapters (CLI, embedding
//! hosts) build one `AppCore` with a concrete command port and config store
//! and reach everything else through it.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::{AutoStartPolicy, ChatOrchestrator, DEFAULT_POLL_INTERVAL, ServiceController, StatusPoller};
use crate::ports::{Clock, ConfigStore, CoreError, InferenceCommandPort, TokioClock};
use crate::settings::{AppConfig, AppConfigUpdate, validate_app_config};

/// The core application facade.
///
/// # Example
///
/// ```ignore
/// let port = Arc::new(LlamaServerCommand::new(paths));
/// let store = Arc::new(JsonFileConfigStore::new(config_path));
/// let core = AppCore::new(port, store);
///
/// core.auto_start().run().await;
/// let exchange = core.chat().send_message("hello").await?;
/// ```
pub struct AppCore {
    controller: Arc<ServiceController>,
    chat: Arc<ChatOrchestrator>,
    auto_start: Arc<AutoStartPolicy>,
    config_store: Arc<dyn ConfigStore>,
}

impl AppCore {
    /// Create a new `AppCore` waiting on the tokio timer for retry delays.
    pub fn new(port: Arc<dyn InferenceCommandPort>, config_store: Arc<dyn ConfigStore>) -> Self {
        Self::with_clock(port, config_store, Arc::new(TokioClock))
    }

    /// Create a new `AppCore` with an explicit clock.
    pub fn with_clock(
        port: Arc<dyn InferenceCommandPort>,
        config_store: Arc<dyn ConfigStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let controller = Arc::new(ServiceController::new(port));
        let chat = Arc::new(ChatOrchestrator::new(controller.clone()));
        let auto_start = Arc::new(AutoStartPolicy::new(
            controller.clone(),
            config_store.clone(),
            clock,
        ));
        Self {
            controller,
            chat,
            auto_start,
            config_store,
        }
    }

    /// Access the service controller.
    pub const fn controller(&self) -> &Arc<ServiceController> {
        &self.controller
    }

    /// Access the chat orchestrator.
    pub const fn chat(&self) -> &Arc<ChatOrchestrator> {
        &self.chat
    }

    /// Access the auto-start policy.
    pub const fn auto_start(&self) -> &Arc<AutoStartPolicy> {
        &self.auto_start
    }

    /// Access the persistent config store.
    pub const fn config_store(&self) -> &Arc<dyn ConfigStore> {
        &self.config_store
    }

    /// Start status polling with the default period.
    pub fn spawn_status_poller(&self) -> StatusPoller {
        self.spawn_status_poller_every(DEFAULT_POLL_INTERVAL)
    }

    pub fn spawn_status_poller_every(&self, period: Duration) -> StatusPoller {
        StatusPoller::spawn(self.controller.clone(), period)
    }

    /// Apply a partial update to the stored configuration.
    ///
    /// The merged result is validated before it is saved; an invalid
    /// update leaves the store untouched.
    pub async fn update_config(&self, update: &AppConfigUpdate) -> Result<AppConfig, CoreError> {
        let mut config = self.config_store.load().await;
        config.merge(update);
        validate_app_config(&config)?;
        self.config_store.save(&config).await;
        info!(model = %config.default_service_config.model_name, "Configuration updated");
        Ok(config)
    }
}
