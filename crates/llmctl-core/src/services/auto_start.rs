//! Auto-start policy - one-shot, bounded-retry startup sequence.
//!
//! Each attempt runs:
//! 1. model reconciliation (`list_models`, rewrite + persist the configured
//!    model if the service does not offer it; failures are non-fatal),
//! 2. an advisory health probe (failures are non-fatal),
//! 3. `initialize` followed by `start`.
//!
//! A failure of either step 3 call consumes one attempt and schedules a
//! backoff of `retry_delay_ms` through the injected [`Clock`]. When the
//! budget is exhausted a diagnostic is stored in the controller's error
//! slot. The policy never returns an error to its caller.

use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::Duration;

use regex::Regex;
use tracing::{error, info, warn};

use super::ServiceController;
use crate::ports::{Clock, ConfigStore, CoreError};
use crate::settings::AppConfig;

static AVAILABLE_MODELS_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Available models: \[(.*?)\]").ok());

/// Where the policy currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoStartPhase {
    /// Not run yet.
    Idle,
    /// Running attempt number `attempt` (1-based).
    Attempting { attempt: u32 },
    /// Attempt `attempt` failed; waiting `delay` before the next one.
    Backoff { attempt: u32, delay: Duration },
    Succeeded,
    Failed,
    Disabled,
}

impl AutoStartPhase {
    /// Whether the policy reached an outcome it will never leave.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Disabled)
    }
}

/// Result of one [`AutoStartPolicy::run`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoStartOutcome {
    /// Auto-start is switched off in the configuration.
    Disabled,
    /// The service is running after `attempts` attempts.
    Started { attempts: u32 },
    /// Every attempt failed; `diagnostic` was stored as the controller error.
    Exhausted { attempts: u32, diagnostic: String },
    /// The configuration allows zero attempts, so nothing was tried.
    NoAttempts,
    /// Another run already happened or is in progress.
    AlreadyAttempted,
}

/// One-shot startup policy layered on [`ServiceController`].
pub struct AutoStartPolicy {
    controller: Arc<ServiceController>,
    store: Arc<dyn ConfigStore>,
    clock: Arc<dyn Clock>,
    phase: Mutex<AutoStartPhase>,
}

impl AutoStartPolicy {
    pub fn new(
        controller: Arc<ServiceController>,
        store: Arc<dyn ConfigStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            controller,
            store,
            clock,
            phase: Mutex::new(AutoStartPhase::Idle),
        }
    }

    pub fn phase(&self) -> AutoStartPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: AutoStartPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// The attempted flag.
    ///
    /// True while an attempt is running and after any terminal outcome.
    /// False before the first run and while a retry is scheduled.
    pub fn attempted(&self) -> bool {
        !matches!(
            self.phase(),
            AutoStartPhase::Idle | AutoStartPhase::Backoff { .. }
        )
    }

    /// Claim the single run. Only an idle policy can be claimed.
    fn claim(&self) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase == AutoStartPhase::Idle {
            *phase = AutoStartPhase::Attempting { attempt: 1 };
            true
        } else {
            false
        }
    }

    /// Run the startup sequence. Only the first call does anything.
    pub async fn run(&self) -> AutoStartOutcome {
        if !self.claim() {
            return AutoStartOutcome::AlreadyAttempted;
        }

        let mut app_config = self.store.load().await;
        if !app_config.auto_start_enabled {
            info!("Auto-start disabled in configuration");
            self.set_phase(AutoStartPhase::Disabled);
            return AutoStartOutcome::Disabled;
        }

        let max_attempts = app_config.retry_attempts;
        if max_attempts == 0 {
            warn!("Auto-start enabled with zero retry attempts; nothing to do");
            self.set_phase(AutoStartPhase::Failed);
            return AutoStartOutcome::NoAttempts;
        }

        let delay = Duration::from_millis(app_config.retry_delay_ms);
        let mut known_models: Vec<String> = Vec::new();
        let mut attempt = 0;

        loop {
            self.set_phase(AutoStartPhase::Attempting {
                attempt: attempt + 1,
            });
            info!(
                attempt = attempt + 1,
                max_attempts, "Auto-initializing service"
            );

            self.reconcile_model(&mut app_config, &mut known_models)
                .await;
            self.probe_health().await;

            let err = match self.bring_up(&app_config).await {
                Ok(()) => {
                    info!(attempt = attempt + 1, "Service auto-started");
                    self.set_phase(AutoStartPhase::Succeeded);
                    return AutoStartOutcome::Started {
                        attempts: attempt + 1,
                    };
                }
                Err(err) => err,
            };

            attempt += 1;
            warn!(attempt, error = %err, "Auto-start attempt failed");

            if attempt >= max_attempts {
                let diagnostic = compose_diagnostic(max_attempts, &err.to_string(), &known_models);
                error!("{diagnostic}");
                self.controller.record_error(diagnostic.clone());
                self.set_phase(AutoStartPhase::Failed);
                return AutoStartOutcome::Exhausted {
                    attempts: max_attempts,
                    diagnostic,
                };
            }

            info!(delay_ms = app_config.retry_delay_ms, "Retrying auto-start");
            self.set_phase(AutoStartPhase::Backoff { attempt, delay });
            self.clock.sleep(delay).await;
        }
    }

    /// Point the configured model at something the service actually offers.
    async fn reconcile_model(&self, app_config: &mut AppConfig, known_models: &mut Vec<String>) {
        let models = match self.controller.list_models().await {
            Ok(models) => models.ids(),
            Err(e) => {
                warn!(error = %e, "Failed to list models");
                return;
            }
        };

        let Some(first) = models.first().cloned() else {
            return;
        };
        info!(?models, "Available models");

        let configured = &app_config.default_service_config.model_name;
        if !models.contains(configured) {
            info!(configured = %configured, using = %first, "Configured model not found");
            app_config.default_service_config.model_name = first;
            self.store.save(app_config).await;
        }
        *known_models = models;
    }

    async fn probe_health(&self) {
        match self.controller.health_check().await {
            Ok(message) => info!("Health check passed: {message}"),
            // Advisory only; the attempt continues regardless.
            Err(e) => warn!(error = %e, "Health check failed"),
        }
    }

    async fn bring_up(&self, app_config: &AppConfig) -> Result<(), CoreError> {
        self.controller
            .initialize(app_config.default_service_config.clone())
            .await?;
        self.controller.start().await?;
        Ok(())
    }
}

fn is_missing_model_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("model") && lower.contains("not found")
}

fn extract_available_models(message: &str) -> Option<String> {
    AVAILABLE_MODELS_RE
        .as_ref()?
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|models| !models.is_empty())
}

/// Build the message stored after the attempt budget is exhausted.
///
/// Missing-model failures get the list of available models (from the
/// error text, else from the last successful listing) and remediation steps.
pub(crate) fn compose_diagnostic(
    attempts: u32,
    last_error: &str,
    known_models: &[String],
) -> String {
    let mut message = format!("Auto-start failed after {attempts} attempts: {last_error}");
    if !is_missing_model_error(last_error) {
        return message;
    }

    let available = extract_available_models(last_error)
        .or_else(|| (!known_models.is_empty()).then(|| known_models.join(", ")));

    match available {
        Some(models) => {
            message.push_str(&format!("\n\nAvailable models: {models}\n\n"));
            message.push_str(
                "Troubleshooting steps:\n\
                 1. Update the model name in configuration to match an available model\n\
                 2. Or download the required GGUF model file to the models directory\n\
                 3. Ensure the model file name matches the configured model name\n\
                 4. Check that the models directory exists\n\
                 5. Restart this application",
            );
        }
        None => {
            message.push_str(
                "\n\nTroubleshooting steps:\n\
                 1. Download GGUF model files to the models directory\n\
                 2. Ensure the model file name matches the configured model name\n\
                 3. Check that the models directory exists\n\
                 4. Verify the model file is not corrupted\n\
                 5. Restart this application",
            );
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemoryConfigStore;
    use crate::ports::config_store::MockConfigStore;
    use crate::services::test_support::FakeCommandPort;
    use tokio::sync::Notify;

    /// Clock that records requested delays and returns immediately.
    #[derive(Default)]
    struct RecordingClock {
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait::async_trait]
    impl Clock for RecordingClock {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    /// Clock that parks the caller until released.
    #[derive(Default)]
    struct GateClock {
        entered: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl Clock for GateClock {
        async fn sleep(&self, _duration: Duration) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }

    fn app_config(model: &str, attempts: u32) -> AppConfig {
        let mut config = AppConfig {
            retry_attempts: attempts,
            retry_delay_ms: 250,
            ..AppConfig::default()
        };
        config.default_service_config.model_name = model.to_string();
        config
    }

    struct Harness {
        port: Arc<FakeCommandPort>,
        controller: Arc<ServiceController>,
        clock: Arc<RecordingClock>,
    }

    impl Harness {
        fn new(models: &[&str]) -> Self {
            let port = Arc::new(FakeCommandPort::new().with_models(models));
            let controller = Arc::new(ServiceController::new(port.clone()));
            Self {
                port,
                controller,
                clock: Arc::new(RecordingClock::default()),
            }
        }

        fn policy(&self, store: Arc<dyn ConfigStore>) -> AutoStartPolicy {
            AutoStartPolicy::new(self.controller.clone(), store, self.clock.clone())
        }

        fn sleeps(&self) -> Vec<Duration> {
            self.clock.sleeps.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_disabled_makes_no_service_calls() {
        let h = Harness::new(&["tiny"]);
        let mut config = app_config("tiny", 3);
        config.auto_start_enabled = false;
        let policy = h.policy(Arc::new(MemoryConfigStore::with_config(config)));

        assert!(!policy.attempted());
        assert_eq!(policy.run().await, AutoStartOutcome::Disabled);

        assert!(policy.attempted());
        assert_eq!(policy.phase(), AutoStartPhase::Disabled);
        assert!(h.port.calls().is_empty());
        assert!(h.controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let h = Harness::new(&["tiny"]);
        let policy = h.policy(Arc::new(MemoryConfigStore::with_config(app_config(
            "tiny", 3,
        ))));

        assert_eq!(
            policy.run().await,
            AutoStartOutcome::Started { attempts: 1 }
        );
        assert_eq!(
            h.port.calls(),
            vec!["list_models", "check_health", "initialize", "start", "get_status"]
        );
        assert!(h.controller.is_running());
        assert!(h.sleeps().is_empty());
        assert_eq!(policy.phase(), AutoStartPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_missing_model_is_reconciled_and_diagnosed() {
        let h = Harness::new(&["Y"]);
        h.port.fail_initialize(2, "model X not found");

        let initial = app_config("X", 2);
        let mut store = MockConfigStore::new();
        store.expect_load().times(1).return_const(initial);
        store
            .expect_save()
            .times(1)
            .withf(|saved: &AppConfig| saved.default_service_config.model_name == "Y")
            .return_const(());

        let policy = h.policy(Arc::new(store));
        let outcome = policy.run().await;

        let AutoStartOutcome::Exhausted {
            attempts,
            diagnostic,
        } = outcome
        else {
            panic!("expected exhaustion, got {outcome:?}");
        };
        assert_eq!(attempts, 2);
        assert!(diagnostic.starts_with("Auto-start failed after 2 attempts: model X not found"));
        assert!(diagnostic.contains("Available models: Y"));
        assert!(diagnostic.contains("Troubleshooting steps"));

        let initialized: Vec<String> = h
            .port
            .initialized_with()
            .into_iter()
            .map(|c| c.model_name)
            .collect();
        assert_eq!(initialized, vec!["Y", "Y"]);

        assert_eq!(h.controller.last_error(), Some(diagnostic));
        assert_eq!(h.sleeps(), vec![Duration::from_millis(250)]);
        assert!(policy.attempted());
        assert_eq!(policy.phase(), AutoStartPhase::Failed);
    }

    #[tokio::test]
    async fn test_available_models_taken_from_error_text() {
        let h = Harness::new(&[]);
        h.port.fail_initialize(
            1,
            "Model 'X' not found in ./models. Available models: [alpha, beta]",
        );
        let policy = h.policy(Arc::new(MemoryConfigStore::with_config(app_config("X", 1))));

        let AutoStartOutcome::Exhausted { diagnostic, .. } = policy.run().await else {
            panic!("expected exhaustion");
        };
        assert!(diagnostic.contains("Available models: alpha, beta"));
    }

    #[tokio::test]
    async fn test_start_failure_consumes_attempt() {
        let h = Harness::new(&["tiny"]);
        h.port.fail_start(1, "failed to bind port");
        let policy = h.policy(Arc::new(MemoryConfigStore::with_config(app_config(
            "tiny", 3,
        ))));

        assert_eq!(
            policy.run().await,
            AutoStartOutcome::Started { attempts: 2 }
        );
        assert_eq!(h.port.count("initialize"), 2);
        assert_eq!(h.port.count("list_models"), 2);
        assert_eq!(h.sleeps().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_and_health_failures_are_non_fatal() {
        let h = Harness::new(&["tiny"]);
        h.port.set_list_models_failing(true);
        h.port.set_health_failing(true);
        let policy = h.policy(Arc::new(MemoryConfigStore::with_config(app_config(
            "tiny", 1,
        ))));

        assert_eq!(
            policy.run().await,
            AutoStartOutcome::Started { attempts: 1 }
        );
        // initialize success cleared the probe errors
        assert!(h.controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_zero_attempts_is_silent() {
        let h = Harness::new(&["tiny"]);
        let policy = h.policy(Arc::new(MemoryConfigStore::with_config(app_config(
            "tiny", 0,
        ))));

        assert_eq!(policy.run().await, AutoStartOutcome::NoAttempts);
        assert!(h.port.calls().is_empty());
        assert!(h.controller.last_error().is_none());
        assert!(policy.attempted());
    }

    #[tokio::test]
    async fn test_runs_only_once() {
        let h = Harness::new(&["tiny"]);
        let policy = h.policy(Arc::new(MemoryConfigStore::with_config(app_config(
            "tiny", 1,
        ))));

        assert!(matches!(policy.run().await, AutoStartOutcome::Started { .. }));
        assert_eq!(policy.run().await, AutoStartOutcome::AlreadyAttempted);
        assert_eq!(h.port.count("initialize"), 1);
    }

    #[tokio::test]
    async fn test_flag_drops_during_backoff_without_allowing_reentry() {
        let port = Arc::new(FakeCommandPort::new().with_models(&["tiny"]));
        port.fail_initialize(1, "busy");
        let controller = Arc::new(ServiceController::new(port.clone()));
        let clock = Arc::new(GateClock::default());
        let policy = Arc::new(AutoStartPolicy::new(
            controller,
            Arc::new(MemoryConfigStore::with_config(app_config("tiny", 2))),
            clock.clone(),
        ));

        let runner = tokio::spawn({
            let policy = policy.clone();
            async move { policy.run().await }
        });

        clock.entered.notified().await;
        assert!(matches!(policy.phase(), AutoStartPhase::Backoff { attempt: 1, .. }));
        assert!(!policy.attempted());
        assert_eq!(policy.run().await, AutoStartOutcome::AlreadyAttempted);

        clock.release.notify_one();
        assert_eq!(
            runner.await.unwrap(),
            AutoStartOutcome::Started { attempts: 2 }
        );
        assert!(policy.attempted());
    }

    #[test]
    fn test_diagnostic_for_other_errors_has_no_guidance() {
        let message = compose_diagnostic(3, "Failed to spawn llama-server", &["a".to_string()]);
        assert_eq!(
            message,
            "Auto-start failed after 3 attempts: Failed to spawn llama-server"
        );
    }

    #[test]
    fn test_diagnostic_without_any_model_list() {
        let message = compose_diagnostic(1, "Model 'x' not found", &[]);
        assert!(message.contains("Download GGUF model files"));
        assert!(!message.contains("Available models"));
    }

    #[test]
    fn test_diagnostic_ignores_empty_model_list_in_error() {
        let message = compose_diagnostic(
            1,
            "Model 'x' not found in ./models. Available models: []",
            &[],
        );
        assert!(message.contains("Download GGUF model files"));
    }
}
