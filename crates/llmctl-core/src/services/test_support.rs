//! Scripted command port shared by the service tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::contracts::{ChatChoice, ChatRequest, ChatResponse, ModelInfo, ModelsResponse};
use crate::domain::{ChatMessage, ServiceConfig, ServiceStatus};
use crate::ports::{CommandError, InferenceCommandPort};

#[derive(Default)]
struct FakeState {
    initialized: bool,
    running: bool,
    model: String,
    models: Vec<String>,
    initialize_results: VecDeque<Result<String, CommandError>>,
    start_results: VecDeque<Result<String, CommandError>>,
    chat_results: VecDeque<Result<ChatResponse, CommandError>>,
    chat_gate: Option<Arc<Notify>>,
    fail_list_models: bool,
    fail_health: bool,
    fail_status: bool,
    flip_status: bool,
    calls: Vec<String>,
    chat_requests: Vec<ChatRequest>,
    initialized_with: Vec<ServiceConfig>,
}

/// In-memory stand-in for the inference service.
///
/// Unscripted calls succeed; scripted results are consumed in order.
pub struct FakeCommandPort {
    state: Mutex<FakeState>,
}

impl FakeCommandPort {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                model: "unset".to_string(),
                ..FakeState::default()
            }),
        }
    }

    pub fn with_models(self, models: &[&str]) -> Self {
        self.state.lock().unwrap().models = models.iter().map(ToString::to_string).collect();
        self
    }

    pub fn fail_initialize(&self, times: usize, message: &str) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..times {
            state
                .initialize_results
                .push_back(Err(CommandError::Rejected(message.to_string())));
        }
    }

    pub fn fail_start(&self, times: usize, message: &str) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..times {
            state
                .start_results
                .push_back(Err(CommandError::Rejected(message.to_string())));
        }
    }

    pub fn push_chat(&self, result: Result<ChatResponse, CommandError>) {
        self.state.lock().unwrap().chat_results.push_back(result);
    }

    /// Hold every chat call until `gate` is notified.
    pub fn set_chat_gate(&self, gate: Arc<Notify>) {
        self.state.lock().unwrap().chat_gate = Some(gate);
    }

    pub fn set_list_models_failing(&self, failing: bool) {
        self.state.lock().unwrap().fail_list_models = failing;
    }

    pub fn set_health_failing(&self, failing: bool) {
        self.state.lock().unwrap().fail_health = failing;
    }

    pub fn set_status_failing(&self, failing: bool) {
        self.state.lock().unwrap().fail_status = failing;
    }

    /// Toggle `running` on every status call, so consecutive snapshots disagree.
    pub fn set_status_flipping(&self, flipping: bool) {
        self.state.lock().unwrap().flip_status = flipping;
    }

    /// Simulate a remote-side change (e.g. the server process died).
    pub fn set_running(&self, running: bool) {
        self.state.lock().unwrap().running = running;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| *c == call)
            .count()
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.state.lock().unwrap().chat_requests.clone()
    }

    pub fn initialized_with(&self) -> Vec<ServiceConfig> {
        self.state.lock().unwrap().initialized_with.clone()
    }
}

/// A response carrying a single assistant choice.
pub fn reply(content: &str) -> ChatResponse {
    ChatResponse {
        id: "chat-completion".to_string(),
        object: "chat.completion".to_string(),
        created: 0,
        model: "test".to_string(),
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage::assistant(content),
            finish_reason: Some("stop".to_string()),
        }],
        usage: None,
    }
}

#[async_trait]
impl InferenceCommandPort for FakeCommandPort {
    async fn initialize(&self, config: &ServiceConfig) -> Result<String, CommandError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("initialize".to_string());
        state.initialized_with.push(config.clone());
        let result = state
            .initialize_results
            .pop_front()
            .unwrap_or_else(|| Ok("LLM service initialized successfully".to_string()));
        if result.is_ok() {
            state.initialized = true;
            state.model.clone_from(&config.model_name);
        }
        result
    }

    async fn start(&self) -> Result<String, CommandError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("start".to_string());
        if !state.initialized {
            return Err(CommandError::Rejected("Service not initialized".to_string()));
        }
        let result = state
            .start_results
            .pop_front()
            .unwrap_or_else(|| Ok("started".to_string()));
        if result.is_ok() {
            state.running = true;
        }
        result
    }

    async fn stop(&self) -> Result<String, CommandError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("stop".to_string());
        if !state.running {
            return Err(CommandError::NotRunning);
        }
        state.running = false;
        Ok("LLM service stopped successfully".to_string())
    }

    async fn get_status(&self) -> Result<ServiceStatus, CommandError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("get_status".to_string());
        if state.fail_status {
            return Err(CommandError::Transport("status unavailable".to_string()));
        }
        if state.flip_status {
            state.running = !state.running;
        }
        Ok(ServiceStatus {
            is_running: state.running,
            port: if state.running { 8080 } else { 0 },
            model_name: state.model.clone(),
            base_url: "http://127.0.0.1:8080".to_string(),
        })
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, CommandError> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls.push("chat".to_string());
            state.chat_requests.push(request.clone());
            state.chat_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.state
            .lock()
            .unwrap()
            .chat_results
            .pop_front()
            .unwrap_or_else(|| Ok(reply("ok")))
    }

    async fn list_models(&self) -> Result<ModelsResponse, CommandError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list_models".to_string());
        if state.fail_list_models {
            return Err(CommandError::Transport("listing failed".to_string()));
        }
        Ok(ModelsResponse {
            object: "list".to_string(),
            data: state
                .models
                .iter()
                .map(|id| ModelInfo {
                    id: id.clone(),
                    object: "model".to_string(),
                    created: 0,
                    owned_by: "local".to_string(),
                })
                .collect(),
        })
    }

    async fn check_health(&self) -> Result<String, CommandError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("check_health".to_string());
        if state.fail_health {
            return Err(CommandError::Rejected("No GGUF model files found".to_string()));
        }
        Ok(format!("Found {} model(s)", state.models.len()))
    }
}
