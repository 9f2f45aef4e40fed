use std::time::Duration;
use postgen::config::GeneratorConfig;
use postgen::{CategoryContext, ContentGenerator, ErrorKind, GenerateOptions, ParameterPatch};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn completion(content: &str) -> Value
{   json!({
      "id": "gen-123",
      "model": "openai/gpt-4o-mini",
      "choices": [{
        "index": 0,
        "message": { "role": "assistant", "content": content },
        "finish_reason": "stop"
      }]
    })
}

async fn server_replying(template: ResponseTemplate) -> MockServer
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .and(header("Authorization", "Bearer test-token"))
      .respond_with(template)
      .mount(&server)
      .await;
    server
}

fn generator_for(server: &MockServer) -> ContentGenerator
{   ContentGenerator::new(GeneratorConfig::new(TOKEN, server.uri()))
}

async fn sent_body(server: &MockServer) -> Value
{   let requests = server.received_requests().await
      .unwrap_or_default();
    assert_eq!(requests.len(), 1, "expected exactly one provider call");
    requests[0].body_json::<Value>().unwrap()
}

#[tokio::test]
async fn test_generate_short_post()
{   let server = server_replying(
      ResponseTemplate::new(200)
        .set_body_json(completion("Testing catches bugs early."))
    ).await;
    let generator = generator_for(&server);

    let result = assert_ok!(
      generator
        .generate("Write about testing", "short", GenerateOptions::new())
        .await
    );
    assert_eq!(result.text, "Testing catches bugs early.");
    assert_eq!(result.word_count(), 4);

    let body = sent_body(&server).await;
    assert!(body["max_tokens"].as_u64().unwrap() <= 300);
    assert_eq!(body["model"], "openai/gpt-4o-mini");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert!(body["messages"][1]["content"]
      .as_str()
      .unwrap()
      .contains("Write about testing"));
}

#[tokio::test]
async fn test_overrides_and_category_reach_the_wire()
{   let server = server_replying(
      ResponseTemplate::new(200).set_body_json(completion("ok then"))
    ).await;
    let generator = generator_for(&server);
    generator.set_default_parameters(&ParameterPatch
    {   top_p: Some(0.5)
      , ..ParameterPatch::default()
    });

    let opts = GenerateOptions::new()
      .with_category(
        CategoryContext::new("Rust").with_description("Systems language")
      )
      .with_max_tokens(9_999)
      .with_temperature(0.3);
    generator.generate("ownership", "long", opts).await.unwrap();

    let body = sent_body(&server).await;
    assert_eq!(body["max_tokens"], 800);
    assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    assert!((body["top_p"].as_f64().unwrap() - 0.5).abs() < 1e-6);
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("Category: Rust"));
    assert!(user.contains("Category Description: Systems language"));
}

#[tokio::test]
async fn test_structured_content_is_unpacked()
{   let encoded = r#"{"text":"hi","additionalInfo":{"tone":"casual"}}"#;
    let server = server_replying(
      ResponseTemplate::new(200).set_body_json(completion(encoded))
    ).await;
    let result = generator_for(&server)
      .generate("greet", "short", GenerateOptions::new())
      .await
      .unwrap();
    assert_eq!(result.text, "hi");
    assert_eq!(result.additional_info.tone.as_deref(), Some("casual"));
    assert_eq!(result.additional_info.word_count, 1);
}

#[tokio::test]
async fn test_status_errors_are_classified()
{   let cases = [
      (401u16, ErrorKind::Auth)
    , (403u16, ErrorKind::Auth)
    , (429u16, ErrorKind::RateLimit)
    , (500u16, ErrorKind::Unknown)
    ];
    for (status, expected) in cases
    {   let server = server_replying(
          ResponseTemplate::new(status)
            .set_body_json(json!({"error": {"message": "nope"}}))
        ).await;
        let err = generator_for(&server)
          .generate("p", "short", GenerateOptions::new())
          .await
          .unwrap_err();
        assert_eq!(err.kind, expected, "status {}", status);
        assert_eq!(err.message, expected.user_message());
    }
}

#[tokio::test]
async fn test_unusable_bodies_are_invalid_response()
{   for template in [
      ResponseTemplate::new(200).set_body_json(json!({}))
    , ResponseTemplate::new(200).set_body_json(json!({"choices": []}))
    , ResponseTemplate::new(200).set_body_string("<html>oops</html>")
    ]
    {   let server = server_replying(template).await;
        let generator = generator_for(&server);
        let err = assert_err!(
          generator
            .generate("p", "short", GenerateOptions::new())
            .await
        );
        assert_eq!(err.kind, ErrorKind::InvalidResponse);
        assert!(generator.last_result().is_none());
    }
}

#[tokio::test]
async fn test_slow_provider_times_out_as_network()
{   let server = server_replying(
      ResponseTemplate::new(200)
        .set_body_json(completion("late"))
        .set_delay(Duration::from_millis(500))
    ).await;
    let opts = GenerateOptions::new()
      .with_timeout(Duration::from_millis(50));
    let err = generator_for(&server)
      .generate("p", "short", opts)
      .await
      .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
}

#[tokio::test]
async fn test_per_call_timeout_outlasts_configured_one()
{   let server = server_replying(
      ResponseTemplate::new(200)
        .set_body_json(completion("worth the wait"))
        .set_delay(Duration::from_millis(1500))
    ).await;
    let generator = ContentGenerator::new(
      GeneratorConfig::new(TOKEN, server.uri()).with_timeout_secs(1)
    );
    let opts = GenerateOptions::new()
      .with_timeout(Duration::from_secs(3));
    let result = assert_ok!(generator.generate("p", "short", opts).await);
    assert_eq!(result.text, "worth the wait");
}

#[tokio::test]
async fn test_server_error_body_is_not_classified()
{   let server = server_replying(
      ResponseTemplate::new(500u16).set_body_json(json!({
        "error": {"message": "Upstream failure", "id": "gen-1742913"}
      }))
    ).await;
    let err = generator_for(&server)
      .generate("p", "short", GenerateOptions::new())
      .await
      .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
}

#[tokio::test]
async fn test_prose_with_leading_quote_or_brace_is_kept()
{   for text in [
      "\"Test early,\" they say. Then ship."
    , "{Draft} Testing is underrated."
    ]
    {   let server = server_replying(
          ResponseTemplate::new(200).set_body_json(completion(text))
        ).await;
        let result = assert_ok!(
          generator_for(&server)
            .generate("p", "short", GenerateOptions::new())
            .await
        );
        assert_eq!(result.text, text);
    }
}

#[tokio::test]
async fn test_unreachable_provider_is_network()
{   let generator = ContentGenerator::new(
      GeneratorConfig::new(TOKEN, "http://127.0.0.1:1")
    );
    let err = generator
      .generate("p", "short", GenerateOptions::new())
      .await
      .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
}

#[tokio::test]
async fn test_empty_token_is_sent_as_is()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;
    let generator = ContentGenerator::new(
      GeneratorConfig::new("", server.uri())
    );
    let err = generator
      .generate("p", "short", GenerateOptions::new())
      .await
      .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Auth);

    let requests = server.received_requests().await.unwrap_or_default();
    let auth = requests[0].headers
      .get("authorization")
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default();
    assert!(auth.starts_with("Bearer"));
}

#[tokio::test]
#[ignore]
async fn test_live_openrouter_generate()
{   if std::env::var(postgen::config::ENV_API_KEY).is_err()
    {   println!("Skipping: OPENROUTER_API_KEY not set");
        return;
    }
    let generator = ContentGenerator::from_env();
    match generator
      .generate("Say hello", "short", GenerateOptions::new())
      .await
    {   Ok(result) => {
          println!("Response: {}", result.text);
          assert!(!result.text.is_empty());
        }
      , Err(e) => {
          println!("API Error: {}", e);
        }
    }
}
