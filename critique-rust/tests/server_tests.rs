mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{button_critique, fenced, Models, BUTTON_HTML};
use proofit_critique::server::{router, with_cors};
use proofit_sdk::{LanguageModelError, Part};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(models: &Models) -> Router {
    router(Arc::new(models.pipeline()))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let models = Models::new();
    let (status, body) = send(app(&models), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn critique_returns_structured_result() {
    let models = Models::new();
    models.classify_as("html_or_code").reply(fenced(&button_critique()));

    let (status, body) = send(
        app(&models),
        Method::POST,
        "/critique",
        Some(json!({ "text": BUTTON_HTML, "goal": "premium" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "html_or_code");
    assert_eq!(body["cached"], false);
    assert_eq!(body["critique"]["schema_version"], "1.0.0");
    assert_eq!(body["critique"]["top_priorities"][0]["issue_id"], "ISSUE-002");
    assert!(body.get("warnings").is_none());
}

#[tokio::test]
async fn critique_accepts_data_url_images() {
    let models = Models::new();
    models.classify_as("image_only").reply(fenced(&button_critique()));

    let (status, _) = send(
        app(&models),
        Method::POST,
        "/critique",
        Some(json!({
            "images": [
                { "data": "data:image/jpeg;base64,AQID" },
                { "mediaType": "image/webp", "data": "BAUG" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let input = &models.generator.tracked_generate_inputs()[0];
    let content = input.messages[0].content();
    assert_eq!(content[0], Part::image("AQID", "image/jpeg"));
    assert_eq!(content[1], Part::image("BAUG", "image/webp"));
}

#[tokio::test]
async fn images_past_the_limit_are_reported_not_decoded() {
    let models = Models::new();
    models.classify_as("image_only").reply(fenced(&button_critique()));

    let (status, body) = send(
        app(&models),
        Method::POST,
        "/critique",
        Some(json!({
            "images": [
                { "mediaType": "image/png", "data": "AQID" },
                { "mediaType": "image/png", "data": "BAUG" },
                { "data": "data:image/png;base64,BwgJ" },
                { "mediaType": "image/png", "data": "!!notbase64!!" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["warnings"],
        json!([{ "kind": "image_dropped", "index": 3, "media_type": "image/png" }])
    );
    let images = models.generator.tracked_generate_inputs()[0].messages[0]
        .content()
        .iter()
        .filter(|part| matches!(part, Part::Image(_)))
        .count();
    assert_eq!(images, 3);
}

#[tokio::test]
async fn empty_critique_is_a_bad_request() {
    let models = Models::new();
    let (status, body) = send(
        app(&models),
        Method::POST,
        "/critique",
        Some(json!({ "text": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
}

#[tokio::test]
async fn invalid_base64_is_a_bad_request() {
    let models = Models::new();
    let (status, _) = send(
        app(&models),
        Method::POST,
        "/critique",
        Some(json!({ "images": [{ "mediaType": "image/png", "data": "%%%" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upstream_failure_keeps_status_and_details() {
    let models = Models::new();
    models.classify_as("html_or_code");
    models.generator.enqueue_generate(LanguageModelError::StatusCode(
        StatusCode::INTERNAL_SERVER_ERROR,
        "model overloaded".to_string(),
    ));

    let (status, body) = send(
        app(&models),
        Method::POST,
        "/critique",
        Some(json!({ "text": BUTTON_HTML })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
    assert_eq!(body["details"], "model overloaded");
}

#[tokio::test]
async fn chat_replies_with_text() {
    let models = Models::new();
    models.reply("Use px-3 instead.");

    let (status, body) = send(
        app(&models),
        Method::POST,
        "/chat",
        Some(json!({
            "priorTurns": [
                { "role": "user", "content": BUTTON_HTML },
                { "role": "agent", "content": button_critique() }
            ],
            "newMessageText": "What padding should I use?",
            "goal": "consistency",
            "category": "html_or_code"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "Use px-3 instead." }));

    let input = &models.generator.tracked_generate_inputs()[0];
    let prompt = input.system_prompt.as_deref().unwrap_or_default();
    assert!(prompt.contains("Goal: consistency."));
}

#[tokio::test]
async fn chat_rejects_prior_attachments_that_are_not_images() {
    let models = Models::new();
    let attachment = json!({ "media_type": "application/x-evil", "data": "AQID" });

    let (status, body) = send(
        app(&models),
        Method::POST,
        "/chat",
        Some(json!({
            "priorTurns": [
                { "role": "user", "content": BUTTON_HTML },
                { "role": "agent", "content": "Share a screenshot." },
                { "role": "user", "content": "Here", "attachments": [attachment] },
                { "role": "agent", "content": "Thanks." }
            ],
            "newMessageText": "Better?"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(models.generator.tracked_generate_inputs().is_empty());
}

#[tokio::test]
async fn chat_rejects_prior_attachments_with_invalid_base64() {
    let models = Models::new();

    let (status, _) = send(
        app(&models),
        Method::POST,
        "/chat",
        Some(json!({
            "priorTurns": [
                { "role": "user", "content": BUTTON_HTML },
                { "role": "agent", "content": "Share a screenshot." },
                {
                    "role": "user",
                    "content": "Here",
                    "attachments": [{ "media_type": "image/png", "data": "not base64" }]
                }
            ],
            "newMessageText": "Better?"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_caps_prior_attachments() {
    let models = Models::new();
    models.reply("Much better.");
    let attachments: Vec<Value> = (0..5)
        .map(|_| json!({ "media_type": "image/png", "data": "AQID" }))
        .collect();

    let (status, _) = send(
        app(&models),
        Method::POST,
        "/chat",
        Some(json!({
            "priorTurns": [
                { "role": "user", "content": BUTTON_HTML },
                { "role": "agent", "content": "Share a screenshot." },
                { "role": "user", "content": "Here", "attachments": attachments },
                { "role": "agent", "content": "Thanks." }
            ],
            "newMessageText": "Better?"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let input = &models.generator.tracked_generate_inputs()[0];
    let images = input
        .messages
        .iter()
        .flat_map(|message| message.content())
        .filter(|part| matches!(part, Part::Image(_)))
        .count();
    assert_eq!(images, 3);
}

#[tokio::test]
async fn chat_fix_prompt_is_answered_locally() {
    let models = Models::new();

    let (status, body) = send(
        app(&models),
        Method::POST,
        "/chat",
        Some(json!({
            "priorTurns": [
                { "role": "user", "content": BUTTON_HTML },
                { "role": "agent", "content": button_critique() }
            ],
            "newMessageText": "fix prompt please"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["text"].as_str().unwrap().contains("REQUIREMENTS:"));
    assert!(models.generator.tracked_generate_inputs().is_empty());
}

#[tokio::test]
async fn cors_allows_the_configured_origin() {
    let models = Models::new();
    let app = with_cors(app(&models), "http://localhost:5173").unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
}

#[test]
fn rejects_an_invalid_cors_origin() {
    let models = Models::new();
    assert!(with_cors(app(&models), "http://bad\norigin").is_err());
}
