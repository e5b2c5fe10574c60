//! Chat command handler - line-based REPL over the chat orchestrator.
//!
//! The service is auto-started before the first prompt (or left to `/start`
//! in manual mode) and the status poller runs for the whole session. Both
//! are torn down on exit. Ctrl-C abandons a pending request or lifecycle
//! command; at the prompt it leaves the chat.

use std::future::Future;
use std::io::Write;

use llmctl_core::Conversation;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::session;
use crate::presentation::{format_conversations, format_status, short_id};

const HELP: &str = "\
Commands:
  /new            start a new conversation
  /list           list conversations (* marks the current one)
  /select <id>    switch to a conversation (id prefix is enough)
  /delete <id>    delete a conversation
  /clear          delete all conversations
  /status         show the service status
  /start          initialize with the stored config and start the service
  /stop           stop the service
  /restart        stop, then start again
  /error          show and dismiss the last error
  /quit           leave the chat
Anything else is sent as a message.";

/// One parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Message(String),
    New,
    List,
    Select(String),
    Delete(String),
    Clear,
    Status,
    Start,
    Stop,
    Restart,
    Error,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_line(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ReplInput::Message(line.to_string());
    };

    let (command, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(c, a)| (c, a.trim()));

    match command {
        "new" => ReplInput::New,
        "list" => ReplInput::List,
        "select" if !arg.is_empty() => ReplInput::Select(arg.to_string()),
        "delete" if !arg.is_empty() => ReplInput::Delete(arg.to_string()),
        "clear" => ReplInput::Clear,
        "status" => ReplInput::Status,
        "start" => ReplInput::Start,
        "stop" => ReplInput::Stop,
        "restart" => ReplInput::Restart,
        "error" => ReplInput::Error,
        "help" | "?" => ReplInput::Help,
        "quit" | "exit" => ReplInput::Quit,
        _ => ReplInput::Unknown(line.to_string()),
    }
}

/// Resolve a full id or a unique id prefix.
pub fn resolve_id(input: &str, conversations: &[Conversation]) -> Result<Uuid, String> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    let needle = input.to_lowercase().replace('-', "");
    let matches: Vec<Uuid> = conversations
        .iter()
        .map(|c| c.id)
        .filter(|id| id.simple().to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(format!("No conversation matches '{input}'")),
        _ => Err(format!("'{input}' matches more than one conversation")),
    }
}

/// Run `operation` unless `interrupt` fires first.
async fn unless_interrupted<F, I>(operation: F, interrupt: I) -> Option<F::Output>
where
    F: Future,
    I: Future,
{
    tokio::select! {
        output = operation => Some(output),
        _ = interrupt => None,
    }
}

async fn interruptible<F: Future>(operation: F) -> Option<F::Output> {
    let output = unless_interrupted(operation, tokio::signal::ctrl_c()).await;
    if output.is_none() {
        eprintln!("\nInterrupted.");
    }
    output
}

fn report(result: Option<Result<String, CliError>>) {
    match result {
        Some(Ok(message)) => println!("{message}"),
        Some(Err(e)) => eprintln!("{e}"),
        None => {}
    }
}

pub async fn execute(ctx: &CliContext, manual: bool) -> Result<(), CliError> {
    if manual {
        println!("Manual mode: the service is down until you run /start.");
    } else {
        session::ensure_started(ctx).await?;
    }
    let poller = ctx.app().spawn_status_poller();

    println!("Type a message, or /help for commands.");
    let result = repl(ctx).await;

    poller.shutdown().await;
    session::shutdown(ctx).await;
    result
}

async fn repl(ctx: &CliContext) -> Result<(), CliError> {
    let chat = ctx.app().chat();
    let controller = ctx.app().controller();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            ReplInput::Empty => {}
            ReplInput::Quit => break,
            ReplInput::Help => println!("{HELP}"),
            ReplInput::New => {
                let conversation = chat.new_conversation(None);
                println!("Started conversation {}", short_id(conversation.id));
            }
            ReplInput::List => {
                let current = chat.current_conversation().map(|c| c.id);
                println!("{}", format_conversations(&chat.conversations(), current));
            }
            ReplInput::Select(input) => {
                match resolve_id(&input, &chat.conversations())
                    .and_then(|id| chat.select_conversation(id).map(|()| id).map_err(|e| e.to_string()))
                {
                    Ok(id) => println!("Switched to conversation {}", short_id(id)),
                    Err(message) => eprintln!("{message}"),
                }
            }
            ReplInput::Delete(input) => match resolve_id(&input, &chat.conversations()) {
                Ok(id) if chat.delete_conversation(id) => {
                    println!("Deleted conversation {}", short_id(id));
                }
                Ok(id) => eprintln!("No conversation with id {id}"),
                Err(message) => eprintln!("{message}"),
            },
            ReplInput::Clear => {
                chat.clear_conversations();
                println!("All conversations removed.");
            }
            ReplInput::Status => {
                println!(
                    "{}",
                    format_status(&controller.status(), controller.lifecycle())
                );
            }
            ReplInput::Start => report(interruptible(session::start_manually(ctx)).await),
            ReplInput::Stop => report(Some(session::stop_manually(ctx).await)),
            ReplInput::Restart => report(interruptible(session::restart(ctx)).await),
            ReplInput::Error => match controller.last_error() {
                Some(message) => {
                    println!("{message}");
                    controller.clear_error();
                }
                None => println!("No errors."),
            },
            ReplInput::Unknown(command) => eprintln!("Unknown command: {command} (try /help)"),
            ReplInput::Message(text) => match interruptible(chat.send_message(text)).await {
                Some(Ok(exchange)) => println!("{}", exchange.reply.content),
                Some(Err(e)) => eprintln!("Error: {e}"),
                None => {}
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            parse_line("  hello there \n"),
            ReplInput::Message("hello there".to_string())
        );
        assert_eq!(parse_line("   "), ReplInput::Empty);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_line("/new"), ReplInput::New);
        assert_eq!(parse_line("/list"), ReplInput::List);
        assert_eq!(parse_line("/select 1a2b"), ReplInput::Select("1a2b".to_string()));
        assert_eq!(parse_line("/delete  ff00 "), ReplInput::Delete("ff00".to_string()));
        assert_eq!(parse_line("/clear"), ReplInput::Clear);
        assert_eq!(parse_line("/status"), ReplInput::Status);
        assert_eq!(parse_line("/start"), ReplInput::Start);
        assert_eq!(parse_line("/stop"), ReplInput::Stop);
        assert_eq!(parse_line("/restart"), ReplInput::Restart);
        assert_eq!(parse_line("/error"), ReplInput::Error);
        assert_eq!(parse_line("/quit"), ReplInput::Quit);
        assert_eq!(parse_line("/exit"), ReplInput::Quit);
    }

    #[test]
    fn test_select_without_id_is_unknown() {
        assert_eq!(parse_line("/select"), ReplInput::Unknown("/select".to_string()));
        assert_eq!(parse_line("/bogus x"), ReplInput::Unknown("/bogus x".to_string()));
    }

    #[tokio::test]
    async fn test_interrupt_abandons_pending_operation() {
        let abandoned = unless_interrupted(std::future::pending::<()>(), async {}).await;
        assert!(abandoned.is_none());

        let finished = unless_interrupted(async { 42 }, std::future::pending::<()>()).await;
        assert_eq!(finished, Some(42));
    }

    #[test]
    fn test_resolve_by_prefix() {
        let a = Conversation::new(None);
        let b = Conversation::new(None);
        let conversations = vec![a.clone(), b.clone()];

        let prefix = short_id(a.id);
        // Two random v4 ids sharing the first 8 hex digits is not a concern here
        assert_eq!(resolve_id(&prefix, &conversations), Ok(a.id));
        assert_eq!(resolve_id(&a.id.to_string(), &conversations), Ok(a.id));
        assert!(resolve_id("", &conversations).is_err());
        assert!(resolve_id("zzzz", &conversations).is_err());
    }
}
