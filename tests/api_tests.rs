//! Tests for the REST client: envelopes, error mapping, XSRF handling.

mod common;

use common::{conversation, message_json};
use parlor::api::ApiClient;
use parlor::config::ClientConfig;
use parlor::error::ParlorError;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let config = ClientConfig::new(server.uri()).unwrap();
    ApiClient::new(&config)
}

#[tokio::test]
async fn fetch_messages_sends_page_and_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/c1/messages"))
        .and(query_param("page", "3"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "messages": [message_json("m1", "user", 1_700_000_000.0)],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server);
    let messages = api.fetch_messages("c1", 3, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id.as_deref(), Some("m1"));
}

#[tokio::test]
async fn non_2xx_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let err = api.get_conversation("missing").await.unwrap_err();
    match err {
        ParlorError::Api { status, .. } => assert_eq!(status, 404),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn success_false_envelope_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "not signed in",
        })))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let err = api.list_conversations().await.unwrap_err();
    match err {
        ParlorError::Api { message, .. } => assert_eq!(message, "not signed in"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn xsrf_cookie_is_captured_and_replayed_as_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "_xsrf=tok-123; Path=/")
                .set_body_json(json!({"success": true, "conversations": []})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/conversations/c1"))
        .and(header("X-XSRFToken", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server);
    assert!(api.xsrf_token().is_none());
    api.list_conversations().await.unwrap();
    assert_eq!(api.xsrf_token().as_deref(), Some("tok-123"));
    api.delete_conversation("c1").await.unwrap();
}

#[tokio::test]
async fn update_returns_the_server_representation() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/conversations/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "conversation": conversation("c1", Some(1_700_000_100.0)),
        })))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let settings = parlor::types::ConversationSettings {
        model_id: "gpt-test".to_string(),
        system_prompt: "be brief".to_string(),
    };
    let updated = api.update_conversation("c1", &settings).await.unwrap();
    assert_eq!(updated.id, "c1");
    assert_eq!(updated.model_name.as_deref(), Some("GPT Test"));
}

#[tokio::test]
async fn list_models_unwraps_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "models": [
                {"id": "gpt-test", "name": "GPT Test"},
                {"id": "claude-test", "name": "Claude Test"},
            ],
        })))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let models = api.list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].id, "gpt-test");
}
