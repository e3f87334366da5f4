use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use utopia_client::auth::FileTokenStore;
use utopia_client::call::{CallSession, SidePanel};
use utopia_client::chat::{ChatRoom, WsChat};
use utopia_client::config::Config;
use utopia_client::media::HeadlessMedia;
use utopia_client::models::RoomName;
use utopia_client::routing::Route;
use utopia_client::rtm::{RtmMultiplexer, WsSignaling};
use utopia_client::state::AppState;
use utopia_client::views::{LoginStep, LoginView, RoomPage, RoomPageState};
use utopia_client::whiteboard::{store::persistence_key, RecordStore, WhiteboardSync};

const HELP: &str = "/react <emoji>  /hand  /mic  /cam  /share  /chat  /who  /draw <json>  /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let json_logs = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    tracing_subscriber::registry()
        .with(json_logs.then(|| fmt::layer().json()))
        .with((!json_logs).then(fmt::layer))
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    tracing::info!(api = %config.api_url, "Configuration loaded");

    let store = Arc::new(FileTokenStore::new(config.token_store_path.clone()));
    let state = AppState::new(config, store)?;

    // Sign in
    state.session.restore().await;
    if !state.session.is_authenticated().await {
        let (Ok(email), Ok(password)) = (
            std::env::var("UTOPIA_EMAIL"),
            std::env::var("UTOPIA_PASSWORD"),
        ) else {
            bail!("Not signed in. Set UTOPIA_EMAIL and UTOPIA_PASSWORD.");
        };
        let mut login = LoginView::new(state.clone());
        login.set_email(email);
        login.submit_email().await;
        if login.step() != LoginStep::Password {
            bail!("{}", login.error().unwrap_or("Failed to login"));
        }
        login.set_password(password);
        if !login.submit_password().await {
            bail!("{}", login.error().unwrap_or("Failed to login"));
        }
    }

    let room = match std::env::args().nth(1) {
        Some(name) => RoomName::parse(&name)?,
        None => RoomName::generate(),
    };
    state.navigator.push(Route::Room(room.to_string()));

    let mut page = RoomPage::new(state.clone(), room.clone());
    let status = page.prepare().await.clone();
    let setup = match status {
        RoomPageState::Ready { .. } => page.call_setup().context("Room was not ready")?,
        RoomPageState::Failed { error } => bail!("{}", error),
        RoomPageState::Preparing => bail!("Session expired. Please sign in again."),
    };
    let user = setup.user.clone();

    // Signaling, media and chat
    let rtm = Arc::new(RtmMultiplexer::new(room.to_string()));
    let signaling = WsSignaling::new(state.config.rtm_url.clone());
    if !rtm
        .connect_with_backend(&state.api, &state.session, &signaling, &state.config.app_id)
        .await
    {
        tracing::warn!("Reactions, hands and whiteboard are offline for this call");
    }

    let media = Arc::new(HeadlessMedia::new());
    let mut call = CallSession::new(setup, media, rtm.clone(), state.navigator.clone());
    call.join().await?;

    let mut chat = match ChatRoom::open(&WsChat::new(state.config.chat_url.clone()), room.clone(), user).await {
        Ok(chat) => Some(chat),
        Err(e) => {
            tracing::warn!(error = %e, "Chat unavailable");
            None
        }
    };
    let mut chat_cursor = chat.as_ref().map(ChatRoom::subscribe);

    let board_path = state
        .config
        .token_store_path
        .with_file_name(format!("{}.json", persistence_key(room.as_str())));
    let mut board = RecordStore::load(&board_path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not load saved whiteboard");
        RecordStore::new()
    });
    let mut board_sync = WhiteboardSync::new(rtm.clone());

    println!("Joined {} as {}. {}", room, call.user().name, HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(Duration::from_millis(250));
    let mut last_reaction = 0;
    let mut shown_hands: BTreeSet<String> = BTreeSet::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tick.tick() => {
                call.pump_events();
                for reaction in call.reactions() {
                    if reaction.id > last_reaction {
                        println!("{} {}", reaction.emoji, reaction.from);
                        last_reaction = reaction.id;
                    }
                }

                let hands: BTreeSet<String> = call.raised_hands().iter().map(str::to_string).collect();
                for id in hands.difference(&shown_hands) {
                    println!("✋ {} raised a hand", id);
                }
                shown_hands = hands;

                if let Some(cursor) = chat_cursor.as_mut() {
                    for message in cursor.drain_new() {
                        println!("[{}] {}: {}", message.created_at.format("%H:%M"), message.author_name(), message.content);
                    }
                }

                if board_sync.apply_remote(&mut board) > 0 {
                    tracing::debug!(records = board.len(), "Whiteboard updated");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
                match command {
                    "" => {}
                    "/quit" => break,
                    "/react" if !arg.is_empty() => call.send_reaction(arg.trim()).await,
                    "/hand" => {
                        let raised = call.toggle_raise_hand().await;
                        println!("Hand {}", if raised { "raised" } else { "lowered" });
                    }
                    "/mic" => println!("Microphone {}", on_off(call.toggle_mic().await)),
                    "/cam" => println!("Camera {}", on_off(call.toggle_camera().await)),
                    "/share" => match call.toggle_screen_share().await {
                        Ok(sharing) => println!("Screen sharing {}", on_off(sharing)),
                        Err(e) => println!("{}", e.user_message()),
                    },
                    "/chat" => {
                        if call.toggle_chat() == SidePanel::Chat {
                            if let Some(chat) = chat.as_ref() {
                                for message in chat.messages() {
                                    println!("{}: {}", message.author_name(), message.content);
                                }
                            }
                        }
                    }
                    "/who" => {
                        for p in call.participants() {
                            let hand = if p.hand_raised { " ✋" } else { "" };
                            println!("{} mic:{} cam:{}{}", p.label, on_off(p.has_audio), on_off(p.has_video), hand);
                        }
                    }
                    "/draw" => match serde_json::from_str(arg) {
                        Ok(record) => {
                            let change = board.put_local(vec![record]);
                            board_sync.on_local_change(&change).await;
                        }
                        Err(e) => println!("Invalid record: {}", e),
                    },
                    _ if command.starts_with('/') => println!("{}", HELP),
                    _ => match chat.as_mut() {
                        Some(chat) => {
                            if !chat.send(line) {
                                println!("Message not sent");
                            }
                        }
                        None => println!("Chat is unavailable"),
                    },
                }
            }
        }
    }

    if let Some(chat) = chat.as_mut() {
        chat.close();
    }
    call.end_call().await;
    if let Err(e) = board.save(&board_path) {
        tracing::warn!(error = %e, "Failed to save whiteboard");
    }

    tracing::info!("Client shutdown complete");
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Handle shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down...");
        },
    }
}
