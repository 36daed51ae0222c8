use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    serve, Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::constants::{HISTORY_VIEW_LIMIT, INTRODUCTION};
use crate::error::ConfigError;
use crate::memory::HistoryItem;
use crate::personalization::LearningStyle;
use crate::planner::{PlanningCoordinator, SessionFactory};

/// Browser to server. Tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientMessage {
    Submit { goal: String },
    Clear,
    History,
}

/// Server to browser, in the `{message_type, payload}` envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "message_type", content = "payload")]
pub enum ServerMessage {
    Welcome {
        introduction: String,
    },
    Thinking {
        message: String,
    },
    Plan {
        text: String,
        failed: bool,
        sequence_number: Option<u64>,
        resources_found: usize,
        learning_style: Option<LearningStyle>,
    },
    Warning {
        message: String,
    },
    History {
        total: usize,
        items: Vec<HistoryItem>,
        report: String,
    },
    Cleared,
    Error {
        message: String,
    },
}

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    planner: Arc<Result<SessionFactory, ConfigError>>,
}

impl AppState {
    /// A configuration error does not stop the server; it is shown on every page instead.
    pub fn new(templates_dir: impl Into<PathBuf>, planner: Result<SessionFactory, ConfigError>) -> Self {
        Self {
            templates: Arc::new(create_minijinja_env(templates_dir.into())),
            planner: Arc::new(planner),
        }
    }

    fn startup_error(&self) -> Option<String> {
        match &*self.planner {
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        }
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: PathBuf) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let error = state.startup_error();
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                let context = minijinja::context! {
                    title => "Professor Planwell",
                    introduction => INTRODUCTION,
                    error => error,
                    features => [
                        "🤖 AI-Powered Planning",
                        "📚 Structured Guidance",
                        "🔍 Web Research",
                        "💾 Memory & Progress",
                        "🎓 Personalized Learning",
                    ],
                    tips => [
                        "Be specific with goals",
                        "Break into small steps",
                        "Track progress daily",
                        "Celebrate small wins",
                    ],
                };
                tmpl.render(context)
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

async fn health_handler() -> &'static str {
    "ok"
}

// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_json(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

// Each connection is one planning session with its own memory.
async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("New WebSocket connection established");
    let (mut sender, mut receiver) = socket.split();

    let mut session = match &*state.planner {
        Ok(factory) => factory.new_session(),
        Err(e) => {
            let _ = send_json(&mut sender, &ServerMessage::Error { message: e.to_string() }).await;
            return;
        }
    };

    let welcome = ServerMessage::Welcome {
        introduction: INTRODUCTION.to_string(),
    };
    if !send_json(&mut sender, &welcome).await {
        warn!("Failed to send welcome message to new WebSocket client");
        return;
    }

    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                info!("Client requested WebSocket close");
                break;
            }
            Ok(Message::Binary(_)) => {
                warn!("Received unexpected binary message from client");
                continue;
            }
            // Axum answers pings itself
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        };

        let replies = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(client_msg) => {
                if let Some(ack) = acknowledgement(&client_msg) {
                    if !send_json(&mut sender, &ack).await {
                        break;
                    }
                }
                respond(&mut session, client_msg).await
            }
            Err(e) => {
                warn!("Unrecognized client message: {}", e);
                vec![ServerMessage::Error {
                    message: format!("Unrecognized message: {e}"),
                }]
            }
        };

        for reply in &replies {
            if !send_json(&mut sender, reply).await {
                warn!("WebSocket client disconnected or send error. Closing connection.");
                return;
            }
        }
    }
    info!("WebSocket connection closed");
}

/// Sent ahead of a slow action. Blank goals are rejected at once, so they get none.
pub fn acknowledgement(msg: &ClientMessage) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Submit { goal } if !goal.trim().is_empty() => Some(ServerMessage::Thinking {
            message: "🧠 Professor is thinking...".to_string(),
        }),
        _ => None,
    }
}

pub fn history_message(session: &PlanningCoordinator) -> ServerMessage {
    let memory = session.memory();
    ServerMessage::History {
        total: memory.len(),
        items: memory.history_view(HISTORY_VIEW_LIMIT),
        report: memory.progress_report(),
    }
}

/// Applies one client action to the session and returns what to send back.
pub async fn respond(session: &mut PlanningCoordinator, msg: ClientMessage) -> Vec<ServerMessage> {
    match msg {
        ClientMessage::Submit { goal } => match session.process_goal(&goal).await {
            Ok(reply) => vec![
                ServerMessage::Plan {
                    failed: reply.outcome.is_failed(),
                    text: reply.text,
                    sequence_number: reply.sequence_number,
                    resources_found: reply.resources.len(),
                    learning_style: reply.learning_style,
                },
                history_message(session),
            ],
            Err(e) => vec![ServerMessage::Warning {
                message: format!("⚠️ {e}"),
            }],
        },
        // Only the browser's input and output areas are reset.
        ClientMessage::Clear => vec![ServerMessage::Cleared],
        ClientMessage::History => vec![history_message(session)],
    }
}

pub fn build_router(state: AppState, static_dir: impl Into<PathBuf>) -> Router {
    let static_files_service = ServeDir::new(static_dir.into()).not_found_service(tower::service_fn(
        |_req: Request| async {
            Ok::<Response, std::convert::Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        },
    ));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server(port: u16, state: AppState, static_dir: impl Into<PathBuf>) -> Result<()> {
    let app = build_router(state, static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_interaction::mock::MockCompletionClient;

    fn session() -> PlanningCoordinator {
        PlanningCoordinator::new(Arc::new(MockCompletionClient::answering("PLAN")))
    }

    #[test]
    fn client_messages_parse_by_action() {
        let submit: ClientMessage = serde_json::from_str(r#"{"action":"submit","goal":"learn Rust"}"#).unwrap();
        assert_eq!(submit, ClientMessage::Submit { goal: "learn Rust".into() });
        let clear: ClientMessage = serde_json::from_str(r#"{"action":"clear"}"#).unwrap();
        assert_eq!(clear, ClientMessage::Clear);
        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"dance"}"#).is_err());
    }

    #[test]
    fn server_messages_use_the_envelope() {
        let json = serde_json::to_value(ServerMessage::Warning { message: "hi".into() }).unwrap();
        assert_eq!(json["message_type"], "Warning");
        assert_eq!(json["payload"]["message"], "hi");
        let cleared = serde_json::to_value(ServerMessage::Cleared).unwrap();
        assert_eq!(cleared["message_type"], "Cleared");
    }

    #[test]
    fn only_real_goals_are_acknowledged() {
        let real = ClientMessage::Submit { goal: "plan a garden".into() };
        assert!(matches!(acknowledgement(&real), Some(ServerMessage::Thinking { .. })));
        for goal in ["", "  \n\t"] {
            assert!(acknowledgement(&ClientMessage::Submit { goal: goal.into() }).is_none());
        }
        assert!(acknowledgement(&ClientMessage::Clear).is_none());
        assert!(acknowledgement(&ClientMessage::History).is_none());
    }

    #[tokio::test]
    async fn submit_returns_plan_then_history() {
        let mut session = session();
        let replies = respond(&mut session, ClientMessage::Submit { goal: "plan a garden".into() }).await;

        assert_eq!(replies.len(), 2);
        match &replies[0] {
            ServerMessage::Plan { text, failed, sequence_number, .. } => {
                assert_eq!(text, "PLAN");
                assert!(!failed);
                assert_eq!(*sequence_number, Some(0));
            }
            other => panic!("expected plan, got {other:?}"),
        }
        match &replies[1] {
            ServerMessage::History { total, items, .. } => {
                assert_eq!(*total, 1);
                assert_eq!(items[0].goal, "plan a garden");
            }
            other => panic!("expected history, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_submit_warns_and_leaves_memory_alone() {
        let mut session = session();
        let replies = respond(&mut session, ClientMessage::Submit { goal: "  ".into() }).await;

        assert!(matches!(&replies[..], [ServerMessage::Warning { .. }]));
        assert!(session.memory().is_empty());
    }

    #[tokio::test]
    async fn clear_keeps_history() {
        let mut session = session();
        respond(&mut session, ClientMessage::Submit { goal: "plan a garden".into() }).await;
        let replies = respond(&mut session, ClientMessage::Clear).await;

        assert!(matches!(&replies[..], [ServerMessage::Cleared]));
        assert_eq!(session.memory().len(), 1);
    }

    #[tokio::test]
    async fn failed_plan_is_flagged() {
        let mut session = PlanningCoordinator::new(Arc::new(MockCompletionClient::failing("503")));
        let replies = respond(&mut session, ClientMessage::Submit { goal: "plan".into() }).await;

        match &replies[0] {
            ServerMessage::Plan { failed, text, .. } => {
                assert!(*failed);
                assert!(text.contains("503"));
            }
            other => panic!("expected plan, got {other:?}"),
        }
    }
}
