//! Terminal formatting for core types.

use llmctl_core::{AutoStartOutcome, Conversation, LifecycleState, ServiceStatus};
use uuid::Uuid;

/// First eight hex digits of an id, enough to select it in the REPL.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

pub fn lifecycle_label(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Uninitialized => "not initialized",
        LifecycleState::Stopped => "stopped",
        LifecycleState::Running => "running",
    }
}

pub fn format_status(status: &ServiceStatus, state: LifecycleState) -> String {
    let mut out = format!("Service:  {}\n", lifecycle_label(state));
    out.push_str(&format!("Model:    {}\n", status.model_name));
    if status.is_running {
        out.push_str(&format!("Port:     {}\n", status.port));
    }
    out.push_str(&format!("Endpoint: {}", status.base_url));
    out
}

/// One line per conversation, newest first, current one starred.
pub fn format_conversations(conversations: &[Conversation], current: Option<Uuid>) -> String {
    if conversations.is_empty() {
        return "No conversations yet.".to_string();
    }
    conversations
        .iter()
        .map(|c| {
            let marker = if Some(c.id) == current { '*' } else { ' ' };
            format!(
                "{marker} {}  {}  ({} messages, updated {})",
                short_id(c.id),
                c.title,
                c.messages().len(),
                c.updated_at.format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Short human summary of an auto-start run.
pub fn describe_outcome(outcome: &AutoStartOutcome) -> String {
    match outcome {
        AutoStartOutcome::Disabled => "Auto-start is disabled".to_string(),
        AutoStartOutcome::Started { attempts: 1 } => "Service started".to_string(),
        AutoStartOutcome::Started { attempts } => {
            format!("Service started after {attempts} attempts")
        }
        AutoStartOutcome::Exhausted { diagnostic, .. } => diagnostic.clone(),
        AutoStartOutcome::NoAttempts => {
            "Auto-start is configured with zero attempts".to_string()
        }
        AutoStartOutcome::AlreadyAttempted => "Auto-start already ran".to_string(),
    }
}
