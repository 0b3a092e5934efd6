//! Client execution logic with reconnection support.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    config::ClientConfig,
    domain::{ChatApi, RoomId},
    error::{ClientError, SessionError},
    infrastructure::api::HttpChatApi,
    session::Session,
};

use super::{
    domain::{room_to_resume, should_attempt_reconnect, should_exit_immediately},
    formatter::MessageFormatter,
    observer::PrintObserver,
    repl::{run_repl, spawn_input_thread},
    ui::print_and_prompt,
};

/// Run the interactive client with reconnection logic.
///
/// Every attempt starts a fresh session (and so a fresh correlation id
/// sequence), re-seeds the room list and re-opens the room that was open when
/// the previous connection was lost.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let api: Arc<dyn ChatApi> = Arc::new(HttpChatApi::new(config.api_url.clone()));
    let mut input_rx = spawn_input_thread();
    let mut resume: Option<RoomId> = None;
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            config.ws_url,
            reconnect_count + 1,
            config.max_reconnect_attempts
        );

        match run_session(&config, api.clone(), &mut input_rx, resume.as_ref()).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                break;
            }
            Err(e) => {
                if should_exit_immediately(&e) {
                    tracing::error!("{}. Exiting.", e);
                    return Err(e);
                }

                tracing::warn!("Connection lost: {}", e);
                if let ClientError::ConnectionLost { .. } = &e {
                    // The session was up, so this is a new outage.
                    resume = room_to_resume(&e);
                    reconnect_count = 0;
                }
                reconnect_count += 1;

                if !should_attempt_reconnect(&e, reconnect_count, config.max_reconnect_attempts) {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        config.max_reconnect_attempts
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {:?}... (attempt {}/{})",
                    config.reconnect_interval,
                    reconnect_count + 1,
                    config.max_reconnect_attempts
                );

                tokio::time::sleep(config.reconnect_interval).await;
            }
        }
    }

    Ok(())
}

/// Connect, resynchronize and hand the session to the prompt.
async fn run_session(
    config: &ClientConfig,
    api: Arc<dyn ChatApi>,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
    resume: Option<&RoomId>,
) -> Result<(), ClientError> {
    let session = Session::connect(config.clone(), api, Box::new(PrintObserver)).await?;

    match session.resync(resume).await {
        Ok(()) => {}
        Err(SessionError::Api(e)) => {
            session.close().await;
            return Err(e.into());
        }
        Err(e) => tracing::warn!("Failed to restore previous room: {}", e),
    }

    let listing = session
        .with_state(|state| MessageFormatter::format_room_list(state.rooms(), state.open_room_id()))
        .await;
    println!("\nConnected. Type /help for commands. Press Ctrl+C to exit.");
    print_and_prompt(&listing);

    run_repl(&session, input_rx).await
}
