// Provider adapter tests against a mock OpenAI-compatible server.

use folio_kb::config::OpenAiConfig;
use folio_kb::openai::{ChatMessage, OpenAiClient};
use folio_kb::FolioError;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIM: usize = 4;

fn test_config(server: &MockServer) -> OpenAiConfig {
    OpenAiConfig {
        base_url: format!("{}/v1", server.uri()),
        embedding_dimension: DIM as u32,
        retry_attempts: 1,
        timeout_seconds: 5,
        ..OpenAiConfig::default()
    }
}

fn test_client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(&test_config(server))
        .expect("Failed to create client")
        .with_api_key(Some("test-key".to_string()))
}

fn embedding_body(items: &[(usize, [f32; DIM])]) -> serde_json::Value {
    let data: Vec<_> = items
        .iter()
        .map(|(index, embedding)| json!({ "index": index, "embedding": embedding }))
        .collect();
    json!({ "data": data })
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_sends_bearer_token_and_returns_vector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(embedding_body(&[(0, [0.1, 0.2, 0.3, 0.4])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let embedding = test_client(&server)
        .embed("hello world")
        .await
        .expect("embed should succeed");
    assert_eq!(embedding, vec![0.1, 0.2, 0.3, 0.4]);
}

#[tokio::test(flavor = "multi_thread")]
#[serial_test::serial]
async fn api_key_is_read_from_the_environment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("Authorization", "Bearer env-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(embedding_body(&[(0, [0.1, 0.2, 0.3, 0.4])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    // SAFETY: the test is serialized; nothing else touches the environment
    // while it runs.
    unsafe { std::env::set_var("OPENAI_API_KEY", "env-key") };
    let client = OpenAiClient::new(&test_config(&server)).expect("Failed to create client");
    // SAFETY: as above.
    unsafe { std::env::remove_var("OPENAI_API_KEY") };

    client.embed("hello").await.expect("embed should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_rejects_wrong_dimension() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [{ "index": 0, "embedding": [0.1, 0.2] }] })),
        )
        .mount(&server)
        .await;

    let result = test_client(&server).embed("hello").await;
    assert!(matches!(result, Err(FolioError::EmbeddingUnavailable(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_rejects_empty_text_without_calling_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = test_client(&server).embed("   ").await;
    assert!(matches!(result, Err(FolioError::EmbeddingUnavailable(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_batch_restores_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[
            (1, [0.0, 1.0, 0.0, 0.0]),
            (0, [1.0, 0.0, 0.0, 0.0]),
        ])))
        .mount(&server)
        .await;

    let embeddings = test_client(&server)
        .embed_batch(&["first".to_string(), "second".to_string()])
        .await
        .expect("batch should succeed");
    assert_eq!(embeddings[0], vec![1.0, 0.0, 0.0, 0.0]);
    assert_eq!(embeddings[1], vec![0.0, 1.0, 0.0, 0.0]);
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_batch_rejects_count_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(embedding_body(&[(0, [1.0, 0.0, 0.0, 0.0])])),
        )
        .mount(&server)
        .await;

    let result = test_client(&server)
        .embed_batch(&["one".to_string(), "two".to_string()])
        .await;
    assert!(matches!(result, Err(FolioError::EmbeddingUnavailable(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_batch_with_no_inputs_skips_the_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let embeddings = test_client(&server)
        .embed_batch(&[])
        .await
        .expect("empty batch should succeed");
    assert!(embeddings.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(embedding_body(&[(0, [1.0, 0.0, 0.0, 0.0])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).with_retry_attempts(2);
    let embedding = client.embed("hello").await.expect("retry should succeed");
    assert_eq!(embedding.len(), DIM);
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).with_retry_attempts(3);
    let result = client.embed("hello").await;
    assert!(matches!(result, Err(FolioError::EmbeddingUnavailable(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn chat_returns_completion_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("what did you build"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "I built a portfolio site." } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = test_client(&server)
        .chat(&[
            ChatMessage::system("You are helpful."),
            ChatMessage::user("what did you build?"),
        ])
        .await
        .expect("chat should succeed");
    assert_eq!(reply, "I built a portfolio site.");
}

#[tokio::test(flavor = "multi_thread")]
async fn chat_makes_exactly_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    // Even with retries configured, generation gets a single attempt.
    let client = test_client(&server).with_retry_attempts(3);
    let result = client.chat(&[ChatMessage::user("hi")]).await;
    assert!(matches!(result, Err(FolioError::GenerationUnavailable(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn chat_rejects_empty_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "" } }]
        })))
        .mount(&server)
        .await;

    let result = test_client(&server).chat(&[ChatMessage::user("hi")]).await;
    assert!(matches!(result, Err(FolioError::GenerationUnavailable(_))));
}
