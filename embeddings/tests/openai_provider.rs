//! HTTP-level tests for the OpenAI embedding provider.
//!
//! These run against a local wiremock server; no real API calls are made.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use recall_embeddings::{EmbeddingError, EmbeddingRequest, EmbeddingProvider, OpenAIProvider};

fn provider_for(server: &MockServer) -> OpenAIProvider {
    OpenAIProvider::new()
        .with_api_key("test-key")
        .with_base_url(server.uri())
}

#[tokio::test]
async fn embed_returns_vector_from_api() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "text-embedding-3-small" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": [0.1, 0.2, 0.3], "index": 0 }],
            "model": "text-embedding-3-small",
            "usage": { "prompt_tokens": 4, "total_tokens": 4 }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let response = provider
        .embed(EmbeddingRequest::new("hello world"))
        .await
        .unwrap();

    assert_eq!(response.embedding, vec![0.1, 0.2, 0.3]);
    assert_eq!(response.dimension, 3);
    assert_eq!(response.model, "text-embedding-3-small");
    assert_eq!(response.tokens_used, Some(4));
}

#[tokio::test]
async fn embed_maps_429_to_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .embed(EmbeddingRequest::new("hello"))
        .await
        .unwrap_err();

    match err {
        EmbeddingError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 7),
        other => panic!("expected RateLimited, got: {other}"),
    }
}

#[tokio::test]
async fn embed_maps_server_error_to_api_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .embed(EmbeddingRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, EmbeddingError::ApiRequest(_)));
}

#[tokio::test]
async fn embed_rejects_empty_data() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "model": "text-embedding-3-small",
            "usage": null
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .embed(EmbeddingRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
}

#[tokio::test]
async fn embed_batch_returns_one_response_per_input() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "embedding": [1.0, 0.0], "index": 0 },
                { "embedding": [0.0, 1.0], "index": 1 }
            ],
            "model": "text-embedding-3-small",
            "usage": { "prompt_tokens": 8, "total_tokens": 8 }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let responses = provider
        .embed_batch(vec![
            EmbeddingRequest::new("first"),
            EmbeddingRequest::new("second"),
        ])
        .await
        .unwrap();

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].embedding, vec![1.0, 0.0]);
    assert_eq!(responses[1].embedding, vec![0.0, 1.0]);
}

#[tokio::test]
async fn embed_without_key_is_provider_not_configured() {
    // No server needed: the provider refuses before sending anything.
    let provider = OpenAIProvider::new()
        .with_base_url("http://127.0.0.1:9")
        .with_model("text-embedding-3-small");

    let provider = match std::env::var("OPENAI_API_KEY") {
        // If the env var leaks into the test environment the construction
        // above picked it up; rebuild without it.
        Ok(_) => return,
        Err(_) => provider,
    };

    let err = provider
        .embed(EmbeddingRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, EmbeddingError::ProviderNotConfigured));
}
