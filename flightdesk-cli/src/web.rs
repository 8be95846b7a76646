// flightdesk-cli/src/web.rs

//! Web chat front-end: a single static page plus a small JSON API over
//! in-memory sessions.

use actix_web::{App, HttpResponse, HttpServer, Responder, delete, get, post, web};
use anyhow::{Context, Result};
use flightdesk_core::{Conversation, FlightAssistant};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../static/index.html");

type SharedConversation = Arc<tokio::sync::Mutex<Conversation>>;

struct SessionEntry {
    conversation: SharedConversation,
    last_used: Instant,
}

/// The session map lock was poisoned by a panicking handler.
#[derive(Debug)]
struct SessionStoreUnavailable;

/// Server state. Each session has its own async lock, so turns within a
/// session run one at a time while other sessions proceed. Sessions idle
/// for longer than `session_ttl` are swept on every create and lookup.
pub struct AppState {
    assistant: Arc<FlightAssistant>,
    session_ttl: Duration,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl AppState {
    pub fn new(assistant: Arc<FlightAssistant>, session_ttl: Duration) -> Self {
        Self {
            assistant,
            session_ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sweep_expired(&self, sessions: &mut HashMap<Uuid, SessionEntry>) {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_used.elapsed() < self.session_ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            debug!(expired, remaining = sessions.len(), "Dropped idle sessions");
        }
    }

    fn insert(&self, conversation: Conversation) -> Result<Uuid, SessionStoreUnavailable> {
        let mut sessions = self.sessions.lock().map_err(|_| SessionStoreUnavailable)?;
        self.sweep_expired(&mut sessions);
        let id = conversation.id();
        sessions.insert(
            id,
            SessionEntry {
                conversation: Arc::new(tokio::sync::Mutex::new(conversation)),
                last_used: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Finds a live session and marks it as used.
    fn lookup(&self, id: Uuid) -> Result<Option<SharedConversation>, SessionStoreUnavailable> {
        let mut sessions = self.sessions.lock().map_err(|_| SessionStoreUnavailable)?;
        self.sweep_expired(&mut sessions);
        Ok(sessions.get_mut(&id).map(|entry| {
            entry.last_used = Instant::now();
            entry.conversation.clone()
        }))
    }

    fn remove(&self, id: Uuid) -> Result<bool, SessionStoreUnavailable> {
        let mut sessions = self.sessions.lock().map_err(|_| SessionStoreUnavailable)?;
        Ok(sessions.remove(&id).is_some())
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct TranscriptEntry {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TranscriptResponse {
    pub session_id: Uuid,
    pub messages: Vec<TranscriptEntry>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PostMessageResponse {
    pub reply: String,
    pub messages: Vec<TranscriptEntry>,
}

fn transcript(conversation: &Conversation) -> Vec<TranscriptEntry> {
    conversation
        .messages()
        .iter()
        .map(|m| TranscriptEntry {
            role: m.role.to_string(),
            content: m.text().to_string(),
        })
        .collect()
}

fn error_response(mut builder: actix_web::HttpResponseBuilder, error: String) -> HttpResponse {
    builder.json(ErrorResponse { error })
}

fn session_not_found(id: &str) -> HttpResponse {
    warn!(session_id = id, "Session not found");
    error_response(HttpResponse::NotFound(), format!("Session {} not found", id))
}

fn store_unavailable() -> HttpResponse {
    error!("Session store lock is poisoned");
    error_response(
        HttpResponse::InternalServerError(),
        "Session store unavailable".to_string(),
    )
}

/// Resolves the path segment to a live session, or the response to send
/// instead.
fn resolve_session(state: &AppState, raw: &str) -> Result<SharedConversation, HttpResponse> {
    let Ok(id) = Uuid::parse_str(raw) else {
        return Err(session_not_found(raw));
    };
    match state.lookup(id) {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(session_not_found(raw)),
        Err(SessionStoreUnavailable) => Err(store_unavailable()),
    }
}

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/api/sessions")]
pub async fn create_session(state: web::Data<AppState>) -> impl Responder {
    match state.insert(Conversation::new()) {
        Ok(session_id) => {
            info!(session_id = %session_id, "Created session");
            HttpResponse::Ok().json(SessionCreated { session_id })
        }
        Err(SessionStoreUnavailable) => store_unavailable(),
    }
}

#[get("/api/sessions/{session_id}")]
pub async fn get_session(path: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    let session = match resolve_session(&state, &path.into_inner()) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let conversation = session.lock().await;
    HttpResponse::Ok().json(TranscriptResponse {
        session_id: conversation.id(),
        messages: transcript(&conversation),
    })
}

#[post("/api/sessions/{session_id}/messages")]
pub async fn post_message(
    path: web::Path<String>,
    body: web::Json<PostMessageRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    let session = match resolve_session(&state, &path.into_inner()) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let content = body.into_inner().content;
    let content = content.trim();
    if content.is_empty() {
        return error_response(
            HttpResponse::BadRequest(),
            "Message content must not be empty".to_string(),
        );
    }

    let mut guard = session.lock().await;
    let (updated, reply) = state.assistant.chat(guard.clone(), content).await;
    *guard = updated;

    HttpResponse::Ok().json(PostMessageResponse {
        reply,
        messages: transcript(&guard),
    })
}

#[delete("/api/sessions/{session_id}")]
pub async fn delete_session(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    let raw = path.into_inner();
    let Ok(id) = Uuid::parse_str(&raw) else {
        return session_not_found(&raw);
    };
    match state.remove(id) {
        Ok(true) => {
            info!(session_id = %raw, "Deleted session");
            HttpResponse::NoContent().finish()
        }
        Ok(false) => session_not_found(&raw),
        Err(SessionStoreUnavailable) => store_unavailable(),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(health)
        .service(create_session)
        .service(get_session)
        .service(post_message)
        .service(delete_session);
}

pub async fn serve(assistant: FlightAssistant, bind: &str, session_ttl: Duration) -> Result<()> {
    let state = web::Data::new(AppState::new(Arc::new(assistant), session_ttl));
    info!(
        session_ttl_secs = session_ttl.as_secs(),
        "Starting Flightdesk web chat at http://{}", bind
    );
    println!("Flightdesk web chat listening on http://{}", bind);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(bind)
        .with_context(|| format!("Failed to bind web server to {}", bind))?
        .run()
        .await
        .context("Web server terminated with an error")
}
