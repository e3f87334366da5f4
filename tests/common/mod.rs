//! In-process fake of the backend: REST auth and token endpoints, a relay
//! for the signaling channel and a room-scoped chat hub.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use utopia_client::auth::MemoryTokenStore;
use utopia_client::config::Config;
use utopia_client::models::Claims;
use utopia_client::state::AppState;

const SECRET: &[u8] = b"fake-backend-secret";

pub const KNOWN_EMAIL: &str = "alice@example.com";
pub const PASSWORD: &str = "hunter22";
pub const RTM_TOKEN: &str = "rtm-token";
/// Accounts whose tokens decode fine but are refused by the backend
pub const REVOKED_USER: &str = "acct-revoked";

pub fn mint(user_id: &str, name: &str, exp_offset_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        iat: now,
        exp: now + exp_offset_secs,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

#[derive(Clone)]
struct Backend {
    next_conn: Arc<AtomicU64>,
    // (connection, channel, frame)
    rtm: broadcast::Sender<(u64, String, String)>,
    // (room, frame)
    chat: broadcast::Sender<(String, String)>,
}

pub struct FakeBackend {
    pub base_url: String,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let backend = Backend {
            next_conn: Arc::new(AtomicU64::new(1)),
            rtm: broadcast::channel(256).0,
            chat: broadcast::channel(256).0,
        };

        let app = Router::new()
            .route("/auth/check-email", post(check_email))
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/agora/token", get(media_token))
            .route("/agora/rtm-token", get(rtm_token))
            .route("/rtm", get(rtm_upgrade))
            .route("/chat", get(chat_upgrade))
            .with_state(backend);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
        }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::for_base_url(&self.base_url, "test-app").unwrap();
        config.register_redirect_ms = 20;
        config
    }

    /// App state with nobody signed in
    pub async fn guest(&self) -> AppState {
        let state = AppState::new(self.config(), Arc::new(MemoryTokenStore::new())).unwrap();
        state.session.restore().await;
        state
    }

    /// App state restored from a stored token for `user_id`
    pub async fn signed_in(&self, user_id: &str, name: &str) -> AppState {
        let store = MemoryTokenStore::with_token(mint(user_id, name, 3600));
        let state = AppState::new(self.config(), Arc::new(store)).unwrap();
        state.session.restore().await;
        state
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn bearer_claims(headers: &HeaderMap) -> Option<Claims> {
    let token = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    let mut validation = Validation::default();
    validation.required_spec_claims.clear();
    let claims = decode::<Claims>(token, &DecodingKey::from_secret(SECRET), &validation)
        .ok()?
        .claims;
    (claims.sub != REVOKED_USER).then_some(claims)
}

async fn check_email(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "exists": body["email"] == KNOWN_EMAIL }))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == KNOWN_EMAIL && body["password"] == PASSWORD {
        Json(json!({ "accessToken": mint("acct-alice", "Alice", 3600) })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == KNOWN_EMAIL {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    (StatusCode::CREATED, Json(json!({ "message": "User created" }))).into_response()
}

async fn media_token(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if bearer_claims(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    match params.get("roomName").map(String::as_str) {
        None | Some("") => error(StatusCode::BAD_REQUEST, "roomName is required"),
        Some("broken") => error(StatusCode::INTERNAL_SERVER_ERROR, "Room service down"),
        Some("tokenless") => Json(json!({ "token": null })).into_response(),
        Some(room) => Json(json!({ "token": format!("media-{}", room) })).into_response(),
    }
}

async fn rtm_token(headers: HeaderMap) -> Response {
    if bearer_claims(&headers).is_none() {
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }
    Json(json!({ "token": RTM_TOKEN })).into_response()
}

async fn rtm_upgrade(
    ws: WebSocketUpgrade,
    State(backend): State<Backend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("token").map(String::as_str) != Some(RTM_TOKEN) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let channel = params.get("channel").cloned().unwrap_or_default();
    ws.on_upgrade(move |socket| relay_rtm(socket, backend, channel))
}

/// Forward every frame to the other members of the channel, never back to
/// the sender
async fn relay_rtm(socket: WebSocket, backend: Backend, channel: String) {
    let conn = backend.next_conn.fetch_add(1, Ordering::SeqCst);
    let mut rx = backend.rtm.subscribe();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = backend.rtm.send((conn, channel.clone(), text.as_str().to_string()));
                }
                Some(Ok(_)) => {}
                _ => break,
            },
            relayed = rx.recv() => match relayed {
                Ok((from, ch, text)) if from != conn && ch == channel => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            },
        }
    }
}

async fn chat_upgrade(ws: WebSocketUpgrade, State(backend): State<Backend>) -> Response {
    ws.on_upgrade(move |socket| chat_session(socket, backend))
}

async fn chat_session(socket: WebSocket, backend: Backend) {
    let mut rx = backend.chat.subscribe();
    let (mut sender, mut receiver) = socket.split();
    let mut room: Option<String> = None;

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else { continue };
                    match frame["event"].as_str() {
                        Some("joinRoom") => room = frame["data"].as_str().map(str::to_string),
                        Some("leaveRoom") => room = None,
                        Some("sendMessage") => {
                            let data = &frame["data"];
                            let author_id = data["authorId"].as_str().unwrap_or_default();
                            let author = match author_id {
                                "acct-alice" => json!({ "id": author_id, "name": "Alice" }),
                                _ => Value::Null,
                            };
                            let message = json!({
                                "event": "newMessage",
                                "data": {
                                    "id": uuid::Uuid::new_v4().to_string(),
                                    "content": data["message"],
                                    "createdAt": chrono::Utc::now().to_rfc3339(),
                                    "author": author,
                                }
                            });
                            let target = data["roomName"].as_str().unwrap_or_default().to_string();
                            let _ = backend.chat.send((target, message.to_string()));
                        }
                        _ => {}
                    }
                }
                Some(Ok(_)) => {}
                _ => break,
            },
            relayed = rx.recv() => match relayed {
                Ok((target, text)) if room.as_deref() == Some(target.as_str()) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            },
        }
    }
}
