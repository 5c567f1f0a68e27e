//! HTTP surface: `GET /health`, `POST /critique`, `POST /chat`.

use crate::{
    request::{normalize_images, CritiqueRequest, Goal, ImageInput, MAX_IMAGES},
    session::{ConversationTurn, Role, Session, TurnContent},
    Category, CritiqueError, CritiquePipeline, FollowUpMessage, FollowUpResponse, SubmitResponse,
};
use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<CritiquePipeline>,
}

/// An image as the web client sends it: base64 or a `data:` URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagePayload {
    #[serde(default, alias = "mediaType")]
    pub media_type: Option<String>,
    pub data: String,
}

impl ImagePayload {
    fn into_image(self) -> Result<ImageInput, CritiqueError> {
        if self.data.trim_start().starts_with("data:") {
            ImageInput::from_data_url(&self.data)
        } else {
            ImageInput::from_base64(self.media_type.unwrap_or_default(), &self.data)
        }
    }

    /// The media type as sent, without decoding the payload.
    fn declared_media_type(&self) -> String {
        self.data
            .trim_start()
            .strip_prefix("data:")
            .and_then(|rest| rest.split([';', ',']).next())
            .map(str::to_string)
            .or_else(|| self.media_type.clone())
            .unwrap_or_default()
    }
}

/// Decode images up to [`MAX_IMAGES`]. Later images are only reported by the
/// normalizer, so their payload is never decoded.
fn into_images(payloads: Vec<ImagePayload>) -> Result<Vec<ImageInput>, CritiqueError> {
    payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| {
            if index < MAX_IMAGES {
                payload.into_image()
            } else {
                Ok(ImageInput::new(payload.declared_media_type(), Vec::new()))
            }
        })
        .collect()
}

/// A prior turn as the web client echoes it back. Attachments go through the
/// same checks as fresh uploads.
#[derive(Debug, Deserialize)]
struct TurnPayload {
    role: Role,
    content: TurnContent,
    #[serde(default)]
    attachments: Vec<ImagePayload>,
}

impl TurnPayload {
    fn into_turn(self) -> Result<ConversationTurn, CritiqueError> {
        let (attachments, dropped) = normalize_images(into_images(self.attachments)?)?;
        if !dropped.is_empty() {
            tracing::debug!(dropped = dropped.len(), "dropped prior turn attachments past the limit");
        }
        Ok(ConversationTurn {
            role: self.role,
            content: self.content,
            attachments,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CritiqueBody {
    #[serde(default)]
    text: String,
    #[serde(default)]
    images: Vec<ImagePayload>,
    goal: Option<Goal>,
    audience: Option<String>,
    platform: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody {
    #[serde(default)]
    prior_turns: Vec<TurnPayload>,
    new_message_text: String,
    #[serde(default)]
    images: Vec<ImagePayload>,
    #[serde(default)]
    goal: Goal,
    category: Option<Category>,
    audience: Option<String>,
    platform: Option<String>,
}

struct ApiError(CritiqueError);

impl From<CritiqueError> for ApiError {
    fn from(error: CritiqueError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.http_status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "request failed");
        } else {
            tracing::info!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        (status, Json(self.0.to_body())).into_response()
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn critique_handler(
    State(state): State<AppState>,
    Json(body): Json<CritiqueBody>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let request = CritiqueRequest {
        text: body.text,
        images: into_images(body.images)?,
        goal: body.goal,
        audience: body.audience,
        platform: body.platform,
    };
    Ok(Json(state.pipeline.submit(request).await?))
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<FollowUpResponse>, ApiError> {
    let turns = body
        .prior_turns
        .into_iter()
        .map(TurnPayload::into_turn)
        .collect::<Result<Vec<_>, _>>()?;
    let mut session = Session::new(body.goal).with_turns(turns);
    session.category = body.category;
    session.audience = body.audience;
    session.platform = body.platform;

    let message = FollowUpMessage {
        text: body.new_message_text,
        images: into_images(body.images)?,
    };
    Ok(Json(state.pipeline.follow_up(&session, message).await?))
}

/// The API routes without CORS.
pub fn router(pipeline: Arc<CritiquePipeline>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/critique", post(critique_handler))
        .route("/chat", post(chat_handler))
        .with_state(AppState { pipeline })
}

/// Allow browser calls from `app_url`.
pub fn with_cors(router: Router, app_url: &str) -> Result<Router, CritiqueError> {
    let origin = HeaderValue::from_str(app_url).map_err(|error| {
        CritiqueError::InvalidInput(format!("Invalid CORS origin '{app_url}': {error}"))
    })?;
    Ok(router.layer(
        CorsLayer::new()
            .allow_origin([origin])
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    ))
}
