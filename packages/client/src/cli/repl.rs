//! Interactive loop for one connected session.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use parley_shared::time::now_utc;

use crate::{error::ClientError, session::Session};

use super::{
    command::{HELP, UserCommand},
    formatter::MessageFormatter,
    ui::{PROMPT, print_and_prompt},
};

/// Why the interactive loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Spawn the blocking readline thread.
///
/// The thread outlives individual sessions so that reconnecting does not
/// start a second reader on stdin. The receiver yields `None` on Ctrl+C or
/// Ctrl+D.
pub fn spawn_input_thread() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

/// Run the prompt against `session` until the user quits or the connection
/// is lost.
///
/// # Returns
///
/// `Ok(())` when the user quit, [`ClientError::ConnectionLost`] (with the
/// room to resume) when the channel closed underneath us.
pub async fn run_repl(
    session: &Session,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    session.close().await;
                    return Ok(());
                };
                if execute_line(session, &line).await == Flow::Quit {
                    session.close().await;
                    return Ok(());
                }
            }
            _ = session.closed() => {
                let open_room = session.open_room_id().await;
                return Err(ClientError::ConnectionLost { open_room });
            }
        }
    }
}

/// Parse and run one input line, printing the outcome.
pub async fn execute_line(session: &Session, line: &str) -> Flow {
    match UserCommand::parse(line) {
        Ok(command) => execute(session, command).await,
        Err(e) => {
            print_and_prompt(&MessageFormatter::format_error(&e));
            Flow::Continue
        }
    }
}

async fn execute(session: &Session, command: UserCommand) -> Flow {
    let output = match command {
        UserCommand::Quit => return Flow::Quit,
        UserCommand::Help => Ok(format!("\n{}", HELP)),
        UserCommand::Rooms => Ok(session
            .with_state(|state| {
                MessageFormatter::format_room_list(state.rooms(), state.open_room_id())
            })
            .await),
        UserCommand::Who => Ok(session
            .with_state(|state| match state.active_room() {
                Some(active) => MessageFormatter::format_roster(active.room_id(), active.roster()),
                None => MessageFormatter::format_error(&"no room is open"),
            })
            .await),
        UserCommand::Join(room_id) => match session.open_room(&room_id).await {
            Ok(()) => Ok(session
                .with_state(|state| {
                    let mut text = String::new();
                    if let Some(active) = state.active_room() {
                        text.push_str(&MessageFormatter::format_joined(
                            state.room(&room_id),
                            &room_id,
                            active.roster(),
                        ));
                        text.push_str(&MessageFormatter::format_history(
                            &room_id,
                            active.messages().iter(),
                        ));
                    }
                    text
                })
                .await),
            Err(e) => Err(e),
        },
        UserCommand::Leave => session
            .leave_room(false)
            .await
            .map(|room_id| MessageFormatter::format_left(&room_id, false)),
        UserCommand::Unsubscribe => session
            .leave_room(true)
            .await
            .map(|room_id| MessageFormatter::format_left(&room_id, true)),
        UserCommand::Read => match session.mark_read().await {
            Ok(seq_id) => Ok(session
                .with_state(|state| {
                    state
                        .open_room_id()
                        .map(|room_id| MessageFormatter::format_read_confirmation(room_id, seq_id))
                        .unwrap_or_default()
                })
                .await),
            Err(e) => Err(e),
        },
        UserCommand::History => match session.load_older_history().await {
            Ok(0) => Ok("\n(No older messages)\n".to_string()),
            Ok(_) => Ok(session
                .with_state(|state| match state.active_room() {
                    Some(active) => {
                        MessageFormatter::format_history(active.room_id(), active.messages().iter())
                    }
                    None => String::new(),
                })
                .await),
            Err(e) => Err(e),
        },
        UserCommand::Publish(content) => session
            .publish(&content)
            .await
            .map(|()| MessageFormatter::format_sent_confirmation(&now_utc())),
    };

    match output {
        Ok(text) => print_and_prompt(&text),
        Err(e) => {
            tracing::debug!("Command failed: {}", e);
            print_and_prompt(&MessageFormatter::format_error(&e));
        }
    }
    Flow::Continue
}
