//! Service controller - owns canonical service status and configuration.
//!
//! Lifecycle: `Uninitialized → Stopped → Running → Stopped`. Only successful
//! operations move the state; failures leave it unchanged and overwrite the
//! shared error slot.
//!
//! # Caller contract
//!
//! The controller does not serialize concurrent `start`/`stop` calls.
//! Callers must keep those actions disabled while [`ServiceController::is_busy`]
//! reports an outstanding call.
//!
//! # Error slot
//!
//! Every failing operation replaces the previous error (last error wins,
//! nothing accumulates). A successful `initialize` clears it; otherwise
//! clearing is the caller's job via [`ServiceController::clear_error`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::contracts::{ChatRequest, ChatResponse, ModelsResponse};
use crate::domain::{ServiceConfig, ServiceStatus, validate_service_config};
use crate::ports::{CoreError, InferenceCommandPort};

/// Externally visible lifecycle of the managed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Stopped,
    Running,
}

struct ControllerState {
    status: ServiceStatus,
    config: ServiceConfig,
    initialized: bool,
    error: Option<String>,
}

/// Service for driving the inference service through its command interface.
pub struct ServiceController {
    port: Arc<dyn InferenceCommandPort>,
    /// Single-writer state. Uses a std (non-async) lock because it is only
    /// accessed in sync context, never across an `.await` point.
    state: RwLock<ControllerState>,
    /// Number of outstanding initialize/start/stop calls.
    busy: AtomicUsize,
    running_tx: watch::Sender<bool>,
}

/// Decrements the busy counter when an operation finishes, however it ends.
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ServiceController {
    /// Create a controller with default status and configuration.
    pub fn new(port: Arc<dyn InferenceCommandPort>) -> Self {
        let (running_tx, _) = watch::channel(false);
        Self {
            port,
            state: RwLock::new(ControllerState {
                status: ServiceStatus::default(),
                config: ServiceConfig::default(),
                initialized: false,
                error: None,
            }),
            busy: AtomicUsize::new(0),
            running_tx,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ControllerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ControllerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `err` in the error slot and hand it back for propagation.
    fn fail(&self, err: CoreError) -> CoreError {
        self.record_error(err.to_string());
        err
    }

    /// Send a configuration to the service.
    ///
    /// The config is validated locally first; an invalid config never
    /// reaches the service.
    pub async fn initialize(&self, config: ServiceConfig) -> Result<String, CoreError> {
        let _busy = BusyGuard::enter(&self.busy);

        if let Err(e) = validate_service_config(&config) {
            warn!(model = %config.model_name, error = %e, "Rejected invalid service config");
            return Err(self.fail(e.into()));
        }

        debug!(model = %config.model_name, ctx_size = config.ctx_size, "Initializing service");
        match self.port.initialize(&config).await {
            Ok(message) => {
                let mut state = self.write();
                state.config = config;
                state.initialized = true;
                state.error = None;
                drop(state);
                info!("{message}");
                Ok(message)
            }
            Err(e) => {
                warn!(model = %config.model_name, error = %e, "Initialize failed");
                Err(self.fail(e.into()))
            }
        }
    }

    /// Start the service. Requires a prior successful `initialize`.
    pub async fn start(&self) -> Result<String, CoreError> {
        let _busy = BusyGuard::enter(&self.busy);

        if !self.read().initialized {
            return Err(self.fail(CoreError::Lifecycle(
                "LLM service is not initialized".to_string(),
            )));
        }

        let message = self
            .port
            .start()
            .await
            .map_err(|e| self.fail(e.into()))?;
        self.refresh_status().await?;
        info!("{message}");
        Ok(message)
    }

    /// Stop the service.
    pub async fn stop(&self) -> Result<String, CoreError> {
        let _busy = BusyGuard::enter(&self.busy);

        let message = self
            .port
            .stop()
            .await
            .map_err(|e| self.fail(e.into()))?;
        self.refresh_status().await?;
        info!("{message}");
        Ok(message)
    }

    /// Fetch a fresh status snapshot and replace the canonical one wholesale.
    ///
    /// Safe to call at any time. Concurrent refreshes are not ordered; the
    /// last response observed wins. The running watch is published under
    /// the same write guard, so it always agrees with the stored status.
    pub async fn refresh_status(&self) -> Result<ServiceStatus, CoreError> {
        let status = self
            .port
            .get_status()
            .await
            .map_err(|e| self.fail(e.into()))?;

        let running = status.is_running;
        let mut state = self.write();
        state.status = status.clone();
        self.running_tx.send_if_modified(|current| {
            if *current == running {
                false
            } else {
                debug!(running, "Service running state changed");
                *current = running;
                true
            }
        });
        drop(state);
        Ok(status)
    }

    /// Diagnostic probe. Never touches the status.
    pub async fn health_check(&self) -> Result<String, CoreError> {
        self.port
            .check_health()
            .await
            .map_err(|e| self.fail(e.into()))
    }

    /// Models the service currently offers.
    pub async fn list_models(&self) -> Result<ModelsResponse, CoreError> {
        self.port
            .list_models()
            .await
            .map_err(|e| self.fail(e.into()))
    }

    /// Forward one chat exchange. Errors are returned, not recorded; the
    /// chat orchestrator owns that.
    pub(crate) async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, CoreError> {
        self.port.chat(request).await.map_err(CoreError::from)
    }

    /// Current status snapshot.
    pub fn status(&self) -> ServiceStatus {
        self.read().status.clone()
    }

    /// Configuration of the last successful `initialize` (defaults before that).
    pub fn config(&self) -> ServiceConfig {
        self.read().config.clone()
    }

    pub fn is_running(&self) -> bool {
        self.read().status.is_running
    }

    pub fn is_initialized(&self) -> bool {
        self.read().initialized
    }

    pub fn lifecycle(&self) -> LifecycleState {
        let state = self.read();
        if !state.initialized {
            LifecycleState::Uninitialized
        } else if state.status.is_running {
            LifecycleState::Running
        } else {
            LifecycleState::Stopped
        }
    }

    /// Whether an initialize/start/stop call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst) > 0
    }

    pub fn can_start(&self) -> bool {
        let state = self.read();
        state.initialized && !state.status.is_running && !self.is_busy()
    }

    pub fn can_stop(&self) -> bool {
        self.read().status.is_running && !self.is_busy()
    }

    /// Most recent error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Replace the error slot.
    pub fn record_error(&self, message: impl Into<String>) {
        self.write().error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.write().error = None;
    }

    /// Watch `ServiceStatus::is_running` transitions.
    pub fn subscribe_running(&self) -> watch::Receiver<bool> {
        self.running_tx.subscribe()
    }
}
