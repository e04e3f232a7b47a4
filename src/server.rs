use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use futures::StreamExt;
use serde::Deserialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::error::GenieError;
use crate::events::{UiEvent, sse_event};
use crate::genie::{ChatMessage, ChatRole, GenieSettings, HttpGenieClient, accumulate};
use crate::render::{MessageView, render_notice};
use crate::ui::{download_block, pages};
use crate::workflows::{brand, business_plan, llc, pitch_deck};

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let client = HttpGenieClient::new(GenieSettings::from_config(&config.backend)?)?;
    let settings = client.settings();
    info!(
        name: "genie.config.loaded",
        base_url = %settings.base_url,
        api_key_set = !settings.api_key.is_empty(),
        read_timeout_secs = settings.read_timeout.as_secs(),
        "Genie backend configuration loaded"
    );

    let state = AppState {
        backend: Arc::new(client),
        config: Arc::clone(&config),
    };
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
///
/// The timeout applies to pages, rendering and the workflow calls. The chat
/// stream is bounded by the upstream read timeout instead.
pub fn router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let timeout_duration = Duration::from_secs(config.server.request_timeout_secs);

    let bounded = Router::new()
        .route("/", get(index_handler))
        .route("/services", get(services_page_handler))
        .route("/llc-formation", get(llc_page_handler))
        .route("/business-plan", get(business_plan_page_handler))
        .route("/pitch-deck", get(pitch_deck_page_handler))
        .route("/brand-generator", get(brand_page_handler))
        .route("/api/render", post(api_render))
        .route("/api/llc-formation", post(api_llc_formation))
        .route("/api/business-plan", post(api_business_plan))
        .route("/api/pitch-deck", post(api_pitch_deck))
        .route("/api/brand-generator", post(api_brand_generator))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_elapsed) => {
                        warn!(timeout_secs = timeout_duration.as_secs(), "Request timed out");
                        (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
                    }
                }
            },
        ));

    Router::new()
        .route("/api/chat", post(api_chat))
        .merge(bounded)
        .nest_service("/static", ServeDir::new(&config.server.static_dir))
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Pages
// ─────────────────────────────────────────────────────────────────────────────

async fn index_handler() -> Html<String> {
    Html(pages::chat_page())
}

async fn services_page_handler() -> Html<String> {
    Html(pages::services_page())
}

async fn llc_page_handler() -> Html<String> {
    Html(pages::llc_page())
}

async fn business_plan_page_handler() -> Html<String> {
    Html(pages::business_plan_page())
}

async fn pitch_deck_page_handler() -> Html<String> {
    Html(pages::pitch_deck_page())
}

async fn brand_page_handler() -> Html<String> {
    Html(pages::brand_page())
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the chat API: the whole conversation so far.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

/// The conversation must end with a non-blank user turn.
fn validate_chat(messages: &[ChatMessage]) -> Result<(), &'static str> {
    let last = messages.last().ok_or("At least one message is required.")?;
    if last.role != ChatRole::User {
        return Err("The last message must come from the user.");
    }
    if last.content.trim().is_empty() {
        return Err("The message is empty.");
    }
    Ok(())
}

/// POST /api/chat - Stream the assistant reply as SSE.
///
/// Emits `stream.start`, one `message.update` per delta, and `done`. A
/// request-level failure adds one `notice` and an apology update before `done`.
async fn api_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected chat request");
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };
    if let Err(reason) = validate_chat(&req.messages) {
        warn!(reason, "Rejected chat request");
        return (StatusCode::BAD_REQUEST, reason).into_response();
    }

    let request_id = uuid::Uuid::new_v4().to_string();
    info!(
        name: "chat.request",
        request_id = %request_id,
        message_count = req.messages.len(),
        "Received chat request"
    );

    let backend = Arc::clone(&state.backend);
    let max_bytes = state.config.limits.max_message_bytes;

    let sse_stream = async_stream::stream! {
        yield Ok::<String, Infallible>(sse_event(&UiEvent::StreamStart {
            request_id: request_id.clone(),
        }));

        let mut failure = None;
        let mut updates = 0_usize;
        match backend.stream_chat(req.messages).await {
            Ok(events) => {
                let snapshots = accumulate(events, max_bytes);
                futures::pin_mut!(snapshots);
                while let Some(item) = snapshots.next().await {
                    match item {
                        Ok(text) => {
                            updates += 1;
                            yield Ok(sse_event(&UiEvent::message_update(text)));
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                if failure.is_none() && updates == 0 {
                    failure = Some(GenieError::request_failed("The model returned an empty response."));
                }
            }
            Err(e) => failure = Some(e),
        }

        if let Some(e) = failure {
            warn!(request_id = %request_id, error = %e, "Chat request failed");
            yield Ok(sse_event(&UiEvent::from(e.notice())));
            yield Ok(sse_event(&UiEvent::apology()));
        } else {
            info!(request_id = %request_id, updates, "Stream complete");
        }

        yield Ok(sse_event(&UiEvent::Done));
    };

    build_sse_response(Body::from_stream(sse_stream))
}

fn build_sse_response(body: Body) -> Response {
    let mut resp = Response::new(body);
    let h = resp.headers_mut();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    h.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
    resp
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/render - Render one message behind the trust boundary.
async fn api_render(Json(msg): Json<ChatMessage>) -> Html<String> {
    Html(MessageView::from(&msg).render())
}

// ─────────────────────────────────────────────────────────────────────────────
// Workflows
// ─────────────────────────────────────────────────────────────────────────────

/// Notice fragment with a status matching the error.
fn workflow_error(workflow: &'static str, err: &GenieError) -> Response {
    let status = match err {
        GenieError::MissingField(_) | GenieError::InvalidField { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::BAD_GATEWAY,
    };
    warn!(workflow, status = status.as_u16(), error = %err, "Workflow failed");
    let notice = err.notice();
    (
        status,
        Html(render_notice(&notice.title, &notice.description, true)),
    )
        .into_response()
}

fn workflow_success(title: &str, description: &str, body: &str) -> Response {
    Html(format!("{}{body}", render_notice(title, description, false))).into_response()
}

/// POST /api/llc-formation
async fn api_llc_formation(State(state): State<AppState>, Form(form): Form<llc::LlcForm>) -> Response {
    let max_bytes = state.config.limits.max_message_bytes;
    match llc::generate(state.backend.as_ref(), &form, max_bytes).await {
        Ok(docs) => workflow_success(
            "LLC Documents Generated!",
            "Your formation package is ready for review.",
            &format!(
                "{}{}",
                docs.render(),
                download_block(&docs.download_name(), &docs.text)
            ),
        ),
        Err(e) => workflow_error("llc_formation", &e),
    }
}

/// POST /api/business-plan
async fn api_business_plan(
    State(state): State<AppState>,
    Form(form): Form<business_plan::BusinessPlanForm>,
) -> Response {
    let max_bytes = state.config.limits.max_message_bytes;
    match business_plan::generate(state.backend.as_ref(), &form, max_bytes).await {
        Ok(generated) => workflow_success(
            "Business Plan Generated!",
            "Your comprehensive business plan is ready.",
            &format!(
                "{}{}",
                generated.plan.render(),
                download_block(&generated.download_name(), &generated.download_text())
            ),
        ),
        Err(e) => workflow_error("business_plan", &e),
    }
}

/// POST /api/pitch-deck
async fn api_pitch_deck(
    State(state): State<AppState>,
    Form(form): Form<pitch_deck::PitchDeckForm>,
) -> Response {
    let max_bytes = state.config.limits.max_message_bytes;
    match pitch_deck::generate(state.backend.as_ref(), &form, max_bytes).await {
        Ok(deck) => workflow_success(
            "Pitch Deck Generated!",
            "Your investor presentation is ready.",
            &format!(
                "{}{}",
                deck.render(),
                download_block(&deck.download_name(), &deck.download_text())
            ),
        ),
        Err(e) => workflow_error("pitch_deck", &e),
    }
}

/// POST /api/brand-generator
async fn api_brand_generator(
    State(state): State<AppState>,
    Form(form): Form<brand::BrandForm>,
) -> Response {
    match brand::generate(state.backend.as_ref(), &form).await {
        Ok(logo) => workflow_success(
            "Logo Generated!",
            "Your business logo has been created successfully.",
            &logo.render(),
        ),
        Err(e) => workflow_error("brand_generator", &e),
    }
}
