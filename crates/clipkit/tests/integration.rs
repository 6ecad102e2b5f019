//! Integration tests for Clipkit using wiremock

use clipkit::{
    AiConfig, Annotator, AnnotateError, ChatAnnotator, CollectionExporter, CollectionLister,
    ConfigError, ConfigLoader, ContentKind, DocumentPipeline, ExportEvent, ExportSummary,
    FetchError, ListError, Session, SessionOptions, Throttle,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(server: &MockServer) -> Session {
    Session::new(
        SessionOptions::default()
            .api_base(format!("{}/api/v4", server.uri()))
            .cookie("z_c0=token; _xsrf=abc"),
    )
    .unwrap()
}

async fn mount_totals(server: &MockServer, collection_id: &str, totals: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v4/collections/{collection_id}/items")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"paging": {"totals": totals}, "data": []})),
        )
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, collection_id: &str, offset: u64, data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v4/collections/{collection_id}/items")))
        .and(query_param("offset", offset.to_string()))
        .and(query_param("limit", "20"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"paging": {}, "data": data})),
        )
        .with_priority(1)
        .expect(1)
        .mount(server)
        .await;
}

fn answer_item(url: &str, title: &str) -> serde_json::Value {
    json!({"content": {"type": "answer", "url": url, "question": {"title": title}}})
}

fn answer_page(body: &str) -> String {
    format!(
        r#"<html><body><div class="AnswerCard"><div class="RichContent-inner">{body}</div></div></body></html>"#
    )
}

fn ai() -> AiConfig {
    AiConfig {
        model: "test-model".to_string(),
        temperature: 0.3,
    }
}

// ---- Collection listing ----

#[tokio::test]
async fn test_list_items_pages_and_drops_malformed() {
    let server = MockServer::start().await;
    mount_totals(&server, "7", 21).await;
    mount_page(
        &server,
        "7",
        0,
        json!([
            answer_item("https://www.zhihu.com/question/1/answer/1", "First"),
            {"content": {"type": "pin", "url": "https://www.zhihu.com/pin/2"}},
        ]),
    )
    .await;
    mount_page(
        &server,
        "7",
        20,
        json!([
            {"content": {"type": "article", "url": "https://zhuanlan.zhihu.com/p/3", "title": "Third"}},
        ]),
    )
    .await;

    let session = session_for(&server);
    let items = CollectionLister::new(&session).list_items("7").await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "First");
    assert_eq!(items[0].kind, ContentKind::Answer);
    assert_eq!(items[1].url, "https://zhuanlan.zhihu.com/p/3");
    assert_eq!(items[1].kind, ContentKind::Post);
}

#[tokio::test]
async fn test_list_items_empty_collection() {
    let server = MockServer::start().await;
    mount_totals(&server, "8", 0).await;

    let session = session_for(&server);
    let items = CollectionLister::new(&session).list_items("8").await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_totals_failure_is_distinct_from_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/collections/9/items"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let session = session_for(&server);
    let result = CollectionLister::new(&session).list_items("9").await;
    match result {
        Err(ListError::TotalsUnavailable {
            collection_id,
            source: FetchError::Status { status, .. },
        }) => {
            assert_eq!(collection_id, "9");
            assert_eq!(status, 403);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn test_session_sends_cookie_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/collections/5/items"))
        .and(header("cookie", "z_c0=token; _xsrf=abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"paging": {"totals": 0}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let totals = CollectionLister::new(&session).totals("5").await.unwrap();
    assert_eq!(totals, 0);
}

// ---- Export ----

#[tokio::test]
async fn test_export_writes_markdown_with_source_line() {
    let server = MockServer::start().await;
    let url = format!("{}/question/1/answer/1", server.uri());
    mount_totals(&server, "11", 1).await;
    mount_page(&server, "11", 0, json!([answer_item(&url, "What/is this?")])).await;
    Mock::given(method("GET"))
        .and(path("/question/1/answer/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(answer_page("<p>Hello <b>world</b></p>"))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let exporter = CollectionExporter::new(session_for(&server), out.path())
        .with_throttle(Throttle::disabled());
    let mut events = Vec::new();
    let summary = exporter.export("11", |e| events.push(e)).await.unwrap();

    assert_eq!(
        summary,
        ExportSummary {
            listed: 1,
            written: 1,
            skipped: 0,
            failed: 0
        }
    );
    let file = out.path().join("What_is this_.md");
    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.starts_with(&format!("> {url}\n\n")));
    assert!(text.contains("Hello **world**"));
    assert_eq!(events[0], ExportEvent::Listed { total: 1 });
    assert_eq!(events[1], ExportEvent::Written { path: file });
}

#[tokio::test]
async fn test_export_skips_existing_without_fetching() {
    let server = MockServer::start().await;
    let url = format!("{}/question/2/answer/2", server.uri());
    mount_totals(&server, "12", 1).await;
    mount_page(&server, "12", 0, json!([answer_item(&url, "Existing")])).await;
    Mock::given(method("GET"))
        .and(path("/question/2/answer/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(answer_page("<p>new</p>")))
        .expect(0)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    std::fs::write(out.path().join("Existing.md"), "old").unwrap();

    let exporter = CollectionExporter::new(session_for(&server), out.path())
        .with_throttle(Throttle::disabled());
    let summary = exporter.export("12", |_| {}).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.written, 0);
    assert_eq!(
        std::fs::read_to_string(out.path().join("Existing.md")).unwrap(),
        "old"
    );
}

#[tokio::test]
async fn test_export_continues_after_item_failure() {
    let server = MockServer::start().await;
    let gone = format!("{}/question/3/answer/3", server.uri());
    let deleted = format!("{}/question/4/answer/4", server.uri());
    mount_totals(&server, "13", 2).await;
    mount_page(
        &server,
        "13",
        0,
        json!([answer_item(&gone, "Gone"), answer_item(&deleted, "Deleted")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/question/3/answer/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/question/4/answer/4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let exporter = CollectionExporter::new(session_for(&server), out.path())
        .with_throttle(Throttle::disabled());
    let mut failures = Vec::new();
    let summary = exporter
        .export("13", |e| {
            if let ExportEvent::Failed { url, .. } = e {
                failures.push(url);
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(failures, vec![gone]);
    assert!(!out.path().join("Gone.md").exists());
    let placeholder = std::fs::read_to_string(out.path().join("Deleted.md")).unwrap();
    assert!(placeholder.contains("This content is inaccessible (deleted or 404)."));
}

// ---- Annotation ----

#[tokio::test]
async fn test_chat_annotator_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "Be brief."},
                {"role": "user", "content": "Please analyze the following article:\n\n# Doc"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "  ## Notes\n- Tags: rust  "}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let annotator =
        ChatAnnotator::new(&format!("{}/v1", server.uri()), "secret", ai(), "Be brief.").unwrap();
    let annotation = annotator.annotate("# Doc").await.unwrap();
    assert_eq!(annotation, "## Notes\n- Tags: rust");
}

#[tokio::test]
async fn test_chat_annotator_empty_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let annotator = ChatAnnotator::new(&format!("{}/v1", server.uri()), "k", ai(), "p").unwrap();
    let result = annotator.annotate("x").await;
    assert!(matches!(result, Err(AnnotateError::EmptyResponse)));
}

#[tokio::test]
async fn test_pipeline_writes_fallback_on_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::write(input.path().join("a.md"), "alpha").unwrap();
    std::fs::write(input.path().join("b.md"), "beta").unwrap();
    std::fs::write(input.path().join("notes.txt"), "ignored").unwrap();

    let annotator = ChatAnnotator::new(&format!("{}/v1", server.uri()), "k", ai(), "p").unwrap();
    let pipeline = DocumentPipeline::new(Box::new(annotator));
    let summary = pipeline.process(input.path(), output.path()).await.unwrap();

    assert_eq!(summary.fallback, 2);
    assert_eq!(summary.written(), 2);
    for (name, body) in [("a.md", "alpha"), ("b.md", "beta")] {
        let text = std::fs::read_to_string(output.path().join(name)).unwrap();
        assert!(text.contains("- Relevance: low"));
        assert!(text.contains("HTTP 500"));
        assert!(text.ends_with(&format!("\n\n{body}")));
    }
    assert!(!output.path().join("notes.txt").exists());
}

// ---- Configuration ----

const EXAMPLE_CONFIG: &str = "ai:
  model: test-model
  temperature: 0.5
directories:
  input: ./input
  output: ./output
metadata:
  system_prompt: Annotate this.
";

#[test]
fn test_config_materialized_from_example() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.example.yaml"), EXAMPLE_CONFIG).unwrap();
    std::fs::create_dir(dir.path().join("input")).unwrap();
    let config_path = dir.path().join("config.yaml");

    let raw = ConfigLoader::load(Some(&config_path)).unwrap();
    assert!(config_path.exists());

    let config = raw.validate().unwrap();
    assert_eq!(config.ai, ai_with(0.5));
    assert_eq!(config.input_dir, dir.path().join("./input"));
    assert_eq!(config.output_dir, dir.path().join("./output"));
    assert_eq!(config.system_prompt, "Annotate this.");
}

fn ai_with(temperature: f32) -> AiConfig {
    AiConfig {
        model: "test-model".to_string(),
        temperature,
    }
}

#[test]
fn test_config_missing_without_example() {
    let dir = TempDir::new().unwrap();
    let result = ConfigLoader::load(Some(&dir.path().join("config.yaml")));
    assert!(matches!(result, Err(ConfigError::Missing { .. })));
}

#[test]
fn test_config_existing_file_not_overwritten() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.example.yaml"), EXAMPLE_CONFIG).unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        EXAMPLE_CONFIG.replace("test-model", "own-model"),
    )
    .unwrap();

    let raw = ConfigLoader::load(Some(&dir.path().join("config.yaml"))).unwrap();
    assert_eq!(
        raw.ai.and_then(|ai| ai.model).as_deref(),
        Some("own-model")
    );
}

#[test]
fn test_config_missing_input_dir_is_invalid() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.yaml"), EXAMPLE_CONFIG).unwrap();

    let raw = ConfigLoader::load(Some(&dir.path().join("config.yaml"))).unwrap();
    match raw.validate() {
        Err(ConfigError::Invalid(msg)) => assert!(msg.contains("input directory")),
        other => panic!("unexpected result {other:?}"),
    }
}
