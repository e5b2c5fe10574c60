//! `InferenceCommandPort` implementation backed by a llama-server child
//! process.
//!
//! # Design
//!
//! - One server at a time, bound to loopback
//! - Model files come from a single models directory
//! - Chat goes through the server's OpenAI-compatible endpoint
//! - Failures cross the port as human-readable text only

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use llmctl_core::{
    ChatRequest, ChatResponse, CommandError, InferenceCommandPort, ModelInfo, ModelsResponse,
    ServiceConfig, ServiceStatus, validate_service_config,
};
use reqwest::Client;
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::command::{SERVER_HOST, spawn_log_readers, spawn_server};
use crate::health::{check_http_health, wait_for_http_health};
use crate::models_dir::{resolve_model_file, scan_models};
use crate::paths::RuntimePaths;

/// Port used when none is configured.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// How long a freshly spawned server gets to answer `/health`.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(120);

const CHAT_TIMEOUT: Duration = Duration::from_secs(300);

/// Settings for [`LlamaServerCommand`].
#[derive(Debug, Clone)]
pub struct LlamaServerOptions {
    pub llama_server: PathBuf,
    pub models_dir: PathBuf,
    /// Fixed port, or 0 to let the OS pick a free one on every start.
    pub port: u16,
    pub startup_timeout: Duration,
}

impl LlamaServerOptions {
    pub fn from_paths(paths: &RuntimePaths) -> Self {
        Self {
            llama_server: paths.llama_server.clone(),
            models_dir: paths.models_dir.clone(),
            port: DEFAULT_SERVER_PORT,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

struct LoadedModel {
    config: ServiceConfig,
    model_path: PathBuf,
}

struct RunningServer {
    child: Child,
    port: u16,
}

#[derive(Default)]
struct ServerState {
    loaded: Option<LoadedModel>,
    server: Option<RunningServer>,
}

impl ServerState {
    /// Forget the server if its process has exited.
    fn reap(&mut self) {
        let exited = match self.server.as_mut().map(|s| s.child.try_wait()) {
            Some(Ok(Some(status))) => {
                warn!(%status, "llama-server exited");
                true
            }
            Some(Err(e)) => {
                warn!(error = %e, "Cannot query llama-server process");
                true
            }
            Some(Ok(None)) | None => false,
        };
        if exited {
            self.server = None;
        }
    }

    fn base_url(&self) -> Option<String> {
        self.server.as_ref().map(|s| base_url(s.port))
    }
}

fn base_url(port: u16) -> String {
    format!("http://{SERVER_HOST}:{port}")
}

async fn shut_down(mut server: RunningServer) {
    if let Err(e) = server.child.kill().await {
        warn!(port = server.port, error = %e, "Failed to kill llama-server");
    }
}

/// Marks a start in progress; released on drop, including when the
/// `start` future is cancelled.
struct StartingGuard<'a>(&'a AtomicBool);

impl<'a> StartingGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        (!flag.swap(true, Ordering::SeqCst)).then_some(Self(flag))
    }
}

impl Drop for StartingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives a local llama-server process.
///
/// The state lock is never held while waiting for a fresh server to become
/// healthy, so status queries answer immediately during startup.
pub struct LlamaServerCommand {
    options: LlamaServerOptions,
    client: Client,
    state: Mutex<ServerState>,
    starting: AtomicBool,
}

impl LlamaServerCommand {
    pub fn new(options: LlamaServerOptions) -> Self {
        let client = Client::builder()
            .timeout(CHAT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            options,
            client,
            state: Mutex::new(ServerState::default()),
            starting: AtomicBool::new(false),
        }
    }

    pub const fn options(&self) -> &LlamaServerOptions {
        &self.options
    }

    fn pick_port(&self) -> Result<u16, CommandError> {
        let requested = self.options.port;
        let listener = TcpListener::bind((SERVER_HOST, requested)).map_err(|e| {
            CommandError::Rejected(format!("Port {requested} is not available: {e}"))
        })?;
        listener
            .local_addr()
            .map(|addr| addr.port())
            .map_err(|e| CommandError::Rejected(format!("Cannot allocate a port: {e}")))
    }

    async fn running_base_url(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        state.reap();
        state.base_url()
    }
}

#[async_trait]
impl InferenceCommandPort for LlamaServerCommand {
    async fn initialize(&self, config: &ServiceConfig) -> Result<String, CommandError> {
        validate_service_config(config).map_err(|e| CommandError::InvalidConfig(e.to_string()))?;

        let model_path = resolve_model_file(
            &self.options.models_dir,
            &config.model_name,
            config.model_path.as_deref(),
        )
        .await
        .map_err(|e| CommandError::Rejected(e.to_string()))?;

        if self.starting.load(Ordering::SeqCst) {
            return Err(CommandError::Rejected(
                "Cannot re-initialize while the service is starting".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        if let Some(server) = state.server.take() {
            info!(port = server.port, "Stopping running server before re-initializing");
            shut_down(server).await;
        }
        info!(model = %config.model_name, path = %model_path.display(), "Model resolved");
        state.loaded = Some(LoadedModel {
            config: config.clone(),
            model_path,
        });
        Ok("LLM service initialized successfully".to_string())
    }

    async fn start(&self) -> Result<String, CommandError> {
        let (mut child, port, _starting) = {
            let mut state = self.state.lock().await;
            state.reap();

            if let Some(server) = &state.server {
                return Ok(format!("LLM service already running on port {}", server.port));
            }
            let Some(loaded) = &state.loaded else {
                return Err(CommandError::Rejected("Service not initialized".to_string()));
            };
            let Some(starting) = StartingGuard::claim(&self.starting) else {
                return Err(CommandError::Rejected(
                    "LLM service is already starting".to_string(),
                ));
            };

            let port = self.pick_port()?;
            let mut child = spawn_server(
                &self.options.llama_server,
                &loaded.model_path,
                port,
                &loaded.config,
            )
            .map_err(|e| CommandError::Rejected(e.to_string()))?;
            spawn_log_readers(&mut child, port);
            (child, port, starting)
        };

        let url = base_url(port);
        let ready = tokio::select! {
            exit = child.wait() => Err(match exit {
                Ok(status) => format!("llama-server exited during startup ({status})"),
                Err(e) => format!("llama-server exited during startup: {e}"),
            }),
            health = wait_for_http_health(&url, self.options.startup_timeout) => {
                health.map_err(|e| e.to_string())
            }
        };

        if let Err(message) = ready {
            shut_down(RunningServer { child, port }).await;
            return Err(CommandError::Rejected(message));
        }

        self.state.lock().await.server = Some(RunningServer { child, port });
        Ok(format!("LLM service started on port {port}"))
    }

    async fn stop(&self) -> Result<String, CommandError> {
        let mut state = self.state.lock().await;
        state.reap();
        let server = state.server.take().ok_or(CommandError::NotRunning)?;
        let port = server.port;
        shut_down(server).await;
        info!(port, "llama-server stopped");
        Ok("LLM service stopped successfully".to_string())
    }

    async fn get_status(&self) -> Result<ServiceStatus, CommandError> {
        let mut state = self.state.lock().await;
        state.reap();

        let mut status = ServiceStatus::default();
        if let Some(loaded) = &state.loaded {
            status.model_name.clone_from(&loaded.config.model_name);
        }
        if let Some(server) = &state.server {
            status.is_running = true;
            status.port = server.port;
            status.base_url = base_url(server.port);
        }
        Ok(status)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, CommandError> {
        let base_url = self
            .running_base_url()
            .await
            .ok_or(CommandError::NotRunning)?;

        let body = ChatRequest {
            stream: Some(false),
            ..request.clone()
        };
        debug!(messages = body.messages.len(), "POST /v1/chat/completions");

        let response = self
            .client
            .post(format!("{base_url}/v1/chat/completions"))
            .json(&body)
            .send()
            .await
            .map_err(|e| CommandError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CommandError::Rejected(format!(
                "llama-server returned {status}: {text}"
            )));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| CommandError::Transport(format!("Invalid chat response: {e}")))
    }

    async fn list_models(&self) -> Result<ModelsResponse, CommandError> {
        let dir = &self.options.models_dir;
        let models = scan_models(dir).await.map_err(|e| {
            CommandError::Rejected(format!(
                "Failed to read models directory {}: {e}",
                dir.display()
            ))
        })?;

        Ok(ModelsResponse {
            object: "list".to_string(),
            data: models
                .into_iter()
                .map(|m| ModelInfo {
                    id: m.id,
                    object: "model".to_string(),
                    created: m.modified,
                    owned_by: "local".to_string(),
                })
                .collect(),
        })
    }

    async fn check_health(&self) -> Result<String, CommandError> {
        let dir = &self.options.models_dir;
        let models = match scan_models(dir).await {
            Ok(models) => models,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CommandError::Rejected(format!(
                    "Models directory not found: {}",
                    dir.display()
                )));
            }
            Err(e) => {
                return Err(CommandError::Rejected(format!(
                    "Failed to read models directory {}: {e}",
                    dir.display()
                )));
            }
        };

        if models.is_empty() {
            return Err(CommandError::Rejected(format!(
                "No GGUF model files found in {}",
                dir.display()
            )));
        }

        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        let mut message = format!(
            "Found {} model(s) in {}: [{}]",
            models.len(),
            dir.display(),
            ids.join(", ")
        );

        if let Some(url) = self.running_base_url().await {
            let healthy = check_http_health(&url).await.unwrap_or(false);
            message.push_str(if healthy {
                "; server is healthy"
            } else {
                "; server is not responding"
            });
        }
        Ok(message)
    }
}
