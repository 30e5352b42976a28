//! Terminal host for one session
//!
//! Reads one command per line from stdin and prints the rendered session
//! view after every change. Task creation runs in the background; while it
//! holds the session, other commands report busy instead of waiting.

use tiergate_sdk::{clamp_description, CreateOutcome, Session, SessionHandle, SessionView};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::MutexGuard;
use tracing::debug;

const BUSY: &str = "busy: a task is being created, try again in a moment";

const HELP: &str = "\
commands:
  add <title> [| <description>]   create a task
  done <id>                       toggle completion
  rm <id>                         delete a task
  theme                           toggle dark mode (when offered)
  close                           close the paywall notice
  refresh                         refresh entitlements
  list                            show the session
  quit                            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { title: String, description: String },
    Done(u64),
    Remove(u64),
    Theme,
    Close,
    Refresh,
    List,
    Help,
    Quit,
}

/// Parse one input line
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "add" => {
            let (title, description) = match rest.split_once('|') {
                Some((title, description)) => (title.trim(), description.trim()),
                None => (rest, ""),
            };
            if title.is_empty() {
                return Err("usage: add <title> [| <description>]".to_string());
            }
            Ok(Command::Add {
                title: title.to_string(),
                description: description.to_string(),
            })
        }
        "done" => parse_id(rest).map(Command::Done),
        "rm" => parse_id(rest).map(Command::Remove),
        "theme" => Ok(Command::Theme),
        "close" => Ok(Command::Close),
        "refresh" => Ok(Command::Refresh),
        "list" | "" => Ok(Command::List),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: {} (try help)", other)),
    }
}

fn parse_id(rest: &str) -> Result<u64, String> {
    rest.parse()
        .map_err(|_| format!("expected a task id, got {:?}", rest))
}

/// Render a view as terminal text
pub fn render(view: &SessionView) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n{}\n", view.hourly_line, view.total_line));
    out.push_str(&format!("Description: {}", view.description_counter));
    if view.description_counter.at_limit() {
        out.push_str(" (limit reached)");
    }
    out.push('\n');

    if view.tasks.is_empty() {
        out.push_str("  no tasks\n");
    }
    for task in &view.tasks {
        let mark = if task.completed { "x" } else { " " };
        out.push_str(&format!("  [{}] #{} {}", mark, task.id, task.title));
        if !task.description.is_empty() {
            out.push_str(&format!(" - {}", task.description));
        }
        out.push('\n');
    }

    if let Some(label) = view.display_toggle {
        out.push_str(&format!("theme: {}\n", label));
    }
    if !view.submit_enabled {
        out.push_str("(a task is being created...)\n");
    }

    if let Some(notice) = &view.notice {
        out.push_str(&format!("\n*** {} ***\n", notice.title));
        for line in &notice.lines {
            out.push_str(&format!("  {}\n", line));
        }
        out.push_str(&format!("  [{}]  [{}: type close]\n", notice.actions[0], notice.actions[1]));
    }

    out
}

fn print_view(handle: &SessionHandle, session: &Session) {
    // read with the session held so the flag matches what is drawn
    let submitting = handle.is_submitting();
    println!("{}", render(&SessionView::render(session, "", submitting)));
}

/// The session, or `None` after telling the user a creation holds it
fn session_or_busy(handle: &SessionHandle) -> Option<MutexGuard<'_, Session>> {
    let session = handle.try_lock();
    if session.is_none() {
        println!("{}", BUSY);
    }
    session
}

/// Run the input loop until `quit` or end of input
pub async fn run(handle: SessionHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_view(&handle, &*handle.lock().await);
    println!("{}", HELP);

    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        debug!(command = ?command, "Command");

        match command {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Add { title, description } => submit(&handle, title, description),
            command => {
                let Some(mut session) = session_or_busy(&handle) else {
                    continue;
                };
                apply(&handle, &mut session, command).await;
            }
        }
    }

    Ok(())
}

/// Run a command that needs the session and print the result
async fn apply(handle: &SessionHandle, session: &mut Session, command: Command) {
    match command {
        Command::List => print_view(handle, session),
        Command::Done(id) => match session.toggle_task(id).await {
            Ok(_) => print_view(handle, session),
            Err(e) => println!("error: {}", e),
        },
        Command::Remove(id) => match session.delete_task(id).await {
            Ok(()) => print_view(handle, session),
            Err(e) => println!("error: {}", e),
        },
        Command::Theme => match session.display_toggle().map(|toggle| toggle.flip()) {
            Some(on) => {
                println!("dark mode {}", if on { "on" } else { "off" });
                print_view(handle, session);
            }
            None => println!("unknown command: theme (try help)"),
        },
        Command::Close => {
            session.close_paywall();
            print_view(handle, session);
        }
        Command::Refresh => {
            let outcome = session.refresh_entitlements().await;
            println!("entitlements: {:?}", outcome);
            print_view(handle, session);
        }
        Command::Add { .. } | Command::Help | Command::Quit => {}
    }
}

/// Start a creation in the background; the prompt keeps reading meanwhile
fn submit(handle: &SessionHandle, title: String, description: String) {
    if handle.is_submitting() {
        println!("a task is already being created, wait for it to finish");
        return;
    }
    let Some(session) = session_or_busy(handle) else {
        return;
    };
    let limit = session.snapshot().description_limit().value;
    drop(session);

    let clamped = clamp_description(&description, limit);
    if clamped.chars().count() < description.chars().count() {
        println!("description truncated to {} characters", limit);
    }

    let handle = handle.clone();
    tokio::spawn(async move {
        match handle.submit(&title, &clamped).await {
            Ok(CreateOutcome::Created(task)) => println!("created #{} {}", task.id, task.title),
            Ok(CreateOutcome::Denied(_)) => {}
            Err(e) => println!("error: {}", e),
        }
        let session = handle.lock().await;
        print_view(&handle, &session);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tiergate_sdk::backend::{MockEntitlementSource, MockTaskStore};
    use tiergate_sdk::SessionConfig;

    #[test]
    fn test_parse_add_with_description() {
        assert_eq!(
            parse_command("add Buy milk | oat, two cartons"),
            Ok(Command::Add {
                title: "Buy milk".into(),
                description: "oat, two cartons".into(),
            })
        );
        assert_eq!(
            parse_command("add Water plants"),
            Ok(Command::Add {
                title: "Water plants".into(),
                description: String::new(),
            })
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command("add  | only description").is_err());
        assert!(parse_command("done seven").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("rm 3"), Ok(Command::Remove(3)));
        assert_eq!(parse_command("  done 12 "), Ok(Command::Done(12)));
        assert_eq!(parse_command("theme"), Ok(Command::Theme));
        assert_eq!(parse_command(""), Ok(Command::List));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
    }

    #[tokio::test]
    async fn test_commands_report_busy_during_creation() {
        let source = Arc::new(MockEntitlementSource::new());
        let store = Arc::new(MockTaskStore::new().with_gated_creates());
        let session = Session::start(SessionConfig::default(), source, store.clone()).await;
        let handle = SessionHandle::new(session);

        submit(&handle, "first".into(), String::new());
        while store.create_calls() == 0 {
            tokio::task::yield_now().await;
        }

        assert!(session_or_busy(&handle).is_none());

        store.release_create();
        while handle.is_submitting() {
            tokio::task::yield_now().await;
        }
        let session = handle.lock().await;
        assert_eq!(session.tasks().len(), 1);
        assert!(SessionView::render(&session, "", handle.is_submitting()).submit_enabled);
    }

    #[tokio::test]
    async fn test_render_shows_paywall() {
        let source = Arc::new(MockEntitlementSource::new());
        let store = Arc::new(MockTaskStore::new());
        let mut session = Session::start(SessionConfig::default(), source, store).await;

        for title in ["a", "b", "c", "d", "e"] {
            session.create_task(title, "").await.unwrap();
        }
        session.create_task("f", "").await.unwrap();

        let text = render(&SessionView::render(&session, "", false));

        assert!(text.contains("Hourly Task Limit: 5/5"));
        assert!(text.contains("*** Hourly Limit Reached! ***"));
        assert!(text.contains("#5 e"));
        assert!(!text.contains("theme:"));
    }
}
