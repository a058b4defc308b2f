//! Runs the real HTTP clients against a local mock of the Apps Script
//! backend and a Google Form.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use formrelay_core::http::build_client;
use formrelay_core::{
    AiConfig, CommandRelay, CommandRequest, HttpCompletionClient, HttpConfigBackend,
    HttpFormSubmitter, RelayError,
};
use serde_json::{json, Value};

type Fields = HashMap<String, String>;

#[derive(Clone, Default)]
struct MockState {
    /// user id -> backend status and body
    users: Arc<Mutex<HashMap<String, (StatusCode, String)>>>,
    saves: Arc<Mutex<Vec<Fields>>>,
    submissions: Arc<Mutex<Vec<Fields>>>,
    completions: Arc<Mutex<Vec<Value>>>,
}

impl MockState {
    fn register(&self, user_id: &str, answer: Value) {
        self.answer(user_id, StatusCode::OK, answer.to_string());
    }

    fn answer(&self, user_id: &str, status: StatusCode, body: impl Into<String>) {
        self.users
            .lock()
            .unwrap()
            .insert(user_id.to_string(), (status, body.into()));
    }
}

async fn lookup(
    State(state): State<MockState>,
    Query(params): Query<Fields>,
) -> (StatusCode, String) {
    let user_id = params.get("userId").cloned().unwrap_or_default();
    state
        .users
        .lock()
        .unwrap()
        .get(&user_id)
        .cloned()
        .unwrap_or_else(|| (StatusCode::OK, json!({"error": "ID not found"}).to_string()))
}

async fn save(State(state): State<MockState>, Form(fields): Form<Fields>) -> StatusCode {
    state.saves.lock().unwrap().push(fields);
    StatusCode::OK
}

async fn form_ok(State(state): State<MockState>, Form(fields): Form<Fields>) -> StatusCode {
    state.submissions.lock().unwrap().push(fields);
    StatusCode::OK
}

async fn form_closed(State(state): State<MockState>, Form(fields): Form<Fields>) -> StatusCode {
    state.submissions.lock().unwrap().push(fields);
    StatusCode::UNAUTHORIZED
}

async fn completion(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.completions.lock().unwrap().push(body);
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": "pong"}}]
    }))
}

async fn start_mock() -> (String, MockState) {
    let state = MockState::default();
    let app = Router::new()
        .route("/exec", get(lookup).post(save))
        .route("/forms/x/formResponse", post(form_ok))
        .route("/forms/closed/formResponse", post(form_closed))
        .route("/v1/chat/completions", post(completion))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

fn relay(base: &str) -> CommandRelay {
    let client = build_client(5).unwrap();
    CommandRelay::new(
        Arc::new(HttpConfigBackend::new(client.clone(), format!("{base}/exec"))),
        Arc::new(HttpFormSubmitter::new(client)),
    )
}

#[tokio::test]
async fn add_submits_to_registered_form() {
    let (base, state) = start_mock().await;
    state.register(
        "42",
        json!({"content": format!("{base}/forms/x/formResponse"), "entry": "99"}),
    );

    let reply = relay(&base)
        .submit(&CommandRequest::new("42", "hello"))
        .await
        .unwrap();

    assert!(reply.content.contains("hello"));
    let submissions = state.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0],
        HashMap::from([("entry.99".to_string(), "hello".to_string())])
    );
}

#[tokio::test]
async fn add_for_unknown_user_makes_no_submission() {
    let (base, state) = start_mock().await;

    let reply = relay(&base)
        .submit(&CommandRequest::new("7", "x"))
        .await
        .unwrap();

    assert_eq!(reply.content, "No user found.");
    assert!(reply.ephemeral);
    assert!(state.submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_for_unknown_user_ignores_lookup_status() {
    let (base, state) = start_mock().await;
    state.answer(
        "7",
        StatusCode::NOT_FOUND,
        json!({"error": "ID not found"}).to_string(),
    );

    let reply = relay(&base)
        .submit(&CommandRequest::new("7", "x"))
        .await
        .unwrap();

    assert_eq!(reply.content, "No user found.");
    assert!(state.submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_uses_registered_form_despite_lookup_status() {
    let (base, state) = start_mock().await;
    state.answer(
        "42",
        StatusCode::ACCEPTED,
        json!({"content": format!("{base}/forms/x/formResponse"), "entry": "99"}).to_string(),
    );

    let reply = relay(&base)
        .submit(&CommandRequest::new("42", "hello"))
        .await
        .unwrap();

    assert!(reply.content.contains("hello"));
    assert_eq!(state.submissions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_lookup_with_unreadable_body_reports_status() {
    let (base, state) = start_mock().await;
    state.answer(
        "42",
        StatusCode::SERVICE_UNAVAILABLE,
        "<html>Script error</html>",
    );

    let err = relay(&base)
        .submit(&CommandRequest::new("42", "hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::LookupStatus(503)));
    assert!(state.submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_reports_form_status() {
    let (base, state) = start_mock().await;
    state.register(
        "42",
        json!({"content": format!("{base}/forms/closed/formResponse"), "entry": 5}),
    );

    let reply = relay(&base)
        .submit(&CommandRequest::new("42", "late entry"))
        .await
        .unwrap();

    assert_eq!(reply.content, "Submission failed: 401");
    assert_eq!(
        state.submissions.lock().unwrap()[0].get("entry.5"),
        Some(&"late entry".to_string())
    );
}

#[tokio::test]
async fn add_with_malformed_lookup_is_an_error() {
    let (base, state) = start_mock().await;
    state.register("42", json!({"url": "https://forms/x"}));

    let err = relay(&base)
        .submit(&CommandRequest::new("42", "hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::MalformedLookup { .. }));
    assert!(state.submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn setting_posts_three_fields() {
    let (base, state) = start_mock().await;

    let reply = relay(&base)
        .register(&CommandRequest::new("42", "https://forms/x/formResponse").with_entry("99"))
        .await
        .unwrap();

    assert_eq!(reply.content, "Google Form URL saved successfully.");
    let saves = state.saves.lock().unwrap().clone();
    assert_eq!(
        saves,
        vec![HashMap::from([
            ("userId".to_string(), "42".to_string()),
            ("content".to_string(), "https://forms/x/formResponse".to_string()),
            ("entry".to_string(), "99".to_string()),
        ])]
    );
}

#[tokio::test]
async fn unreachable_backend_is_an_http_error() {
    let relay = relay("http://127.0.0.1:1");

    let err = relay
        .submit(&CommandRequest::new("42", "hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Http { .. }));
}

#[tokio::test]
async fn ai_relays_first_choice() {
    let (base, state) = start_mock().await;
    let config = AiConfig {
        api_url: format!("{base}/v1/chat/completions"),
        api_key: Some("sk-test".to_string()),
        model: "gpt-test".to_string(),
        ..AiConfig::default()
    };
    let client = build_client(5).unwrap();
    let relay = relay(&base).with_completion(
        Arc::new(HttpCompletionClient::new(client, &config)),
        config.failure_message.clone(),
    );

    let reply = relay.ask_ai("ping").await.unwrap();

    assert_eq!(reply.content, "pong");
    assert_eq!(
        state.completions.lock().unwrap()[0],
        json!({"model": "gpt-test", "messages": [{"role": "user", "content": "ping"}]})
    );
}
