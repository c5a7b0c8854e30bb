// file: tests/legal_query_flow.rs
// description: end-to-end legal queries over the real tool servers with mocked upstream APIs
// reference: https://docs.rs/wiremock

use serde_json::{Value, json};
use tamilguardian::models::{LegalQuery, UploadedDocument, UserPreferences};
use tamilguardian::{Config, LegalOrchestrator, report};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

struct Harness {
    config: Config,
    _db: TempDir,
    audio: TempDir,
}

fn harness(upstream: Option<&MockServer>) -> Harness {
    let db = tempfile::tempdir().unwrap();
    let audio = tempfile::tempdir().unwrap();

    let mut config = Config::default_config();
    config.rag.uri = db.path().to_string_lossy().to_string();
    config.rag.nebius_api_key = None;
    config.search.api_key = None;
    config.llm.api_key = None;
    config.tts.api_key = None;
    config.tts.output_dir = audio.path().to_path_buf();
    config.orchestrator.retry_backoff_ms = 1;

    if let Some(server) = upstream {
        config.llm.api_key = Some("sk-test".to_string());
        config.llm.base_url = server.uri();
        config.tts.api_key = Some("xi-test".to_string());
        config.tts.base_url = server.uri();
    }

    Harness {
        config,
        _db: db,
        audio,
    }
}

async fn mount_upstream(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Analyze the legal query"))
        .respond_with(chat_reply(
            r#"```json
{"summary": "Your landlord must refund the deposit [tn_rent_control_act_2019].", "key_points": ["Deposit is capped"]}
```"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("practical legal options"))
        .respond_with(chat_reply(
            r#"{"options": [
                {"title": "Send a legal notice", "description": "Demand the refund in writing", "steps": ["Draft notice", "Send by registered post"], "estimated_cost": "Rs. 500", "timeline": "15 days"},
                {"title": "broken option"}
            ]}"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Draft a formal legal notice"))
        .respond_with(chat_reply(
            "Notice to the landlord: refund my deposit. Reach me on 9876543210 or tenant@example.com.",
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/text-to-speech/.+$"))
        .and(header("xi-api-key", "xi-test"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3-fake-mp3".to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_query_with_documents_and_audio() {
    let server = MockServer::start().await;
    mount_upstream(&server).await;
    let h = harness(Some(&server));

    let orchestrator = LegalOrchestrator::from_config(&h.config).await.unwrap();
    let query = LegalQuery::new("  My landlord refuses to return my security deposit  ")
        .with_documents(vec![UploadedDocument::from_text(
            Some("agreement.txt".to_string()),
            "Rental agreement dated 01/04/2023. Deposit of Rs. 1,00,000 paid.",
        )])
        .with_preferences(UserPreferences {
            enable_audio: true,
            ..UserPreferences::default()
        });

    let result = orchestrator.process_legal_query(query).await;

    assert!(result.success, "query failed: {:?}", result.error);
    assert_eq!(
        result.summary.as_deref(),
        Some("Your landlord must refund the deposit [tn_rent_control_act_2019].")
    );
    assert_eq!(result.legal_options.len(), 1);
    assert_eq!(result.legal_options[0].title, "Send a legal notice");
    assert!(result.draft_document.as_deref().unwrap().starts_with("Notice to the landlord"));
    assert!(!result.citations.is_empty());
    assert!(result.confidence_score.is_some());

    let audio_url = result.audio_url.clone().unwrap();
    assert!(audio_url.starts_with(&h.audio.path().to_string_lossy().to_string()));
    assert_eq!(std::fs::read(&audio_url).unwrap(), b"ID3-fake-mp3");

    let ran: Vec<&str> = result
        .traces
        .iter()
        .filter(|t| !t.skipped)
        .map(|t| t.task_id.as_str())
        .collect();
    for task in [
        "parse_documents",
        "rag_retrieval",
        "llm_reasoning",
        "generate_options",
        "draft_documents",
        "tts_narration",
    ] {
        assert!(ran.contains(&task), "{} did not run", task);
    }
    assert!(result.traces.iter().all(|t| t.success));

    // narration never carries contact details unless allowed
    let requests = server.received_requests().await.unwrap();
    let tts_body: Value = requests
        .iter()
        .find(|r| r.url.path().starts_with("/text-to-speech/"))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .unwrap();
    let spoken = tts_body["text"].as_str().unwrap();
    assert!(spoken.contains("[PHONE NUMBER]"));
    assert!(spoken.contains("[EMAIL ADDRESS]"));
    assert!(!spoken.contains("9876543210"));

    let markdown = report::render_markdown(&result);
    assert!(markdown.contains("### Option 1: Send a legal notice"));
    assert!(markdown.contains("## Sources:"));
}

#[tokio::test]
async fn query_without_credentials_still_returns_sources() {
    let h = harness(None);
    let orchestrator = LegalOrchestrator::from_config(&h.config).await.unwrap();

    let result = orchestrator
        .process_legal_query(LegalQuery::new("What are tenant rights in Chennai?"))
        .await;

    assert!(result.success);
    assert!(result.summary.is_none());
    assert!(result.audio_url.is_none());
    assert!(!result.citations.is_empty());

    let reasoning = result
        .traces
        .iter()
        .find(|t| t.task_id == "llm_reasoning")
        .unwrap();
    assert!(!reasoning.success);
    assert_eq!(reasoning.attempts, 1);
    assert!(reasoning.error.as_deref().unwrap().contains("API key"));
    assert!(result.traces.iter().all(|t| t.task_id != "tts_narration"));
}

#[tokio::test]
async fn empty_query_is_rejected_before_planning() {
    let h = harness(None);
    let orchestrator = LegalOrchestrator::from_config(&h.config).await.unwrap();

    let result = orchestrator.process_legal_query(LegalQuery::new("   ")).await;

    assert!(!result.success);
    assert!(result.traces.is_empty());
    assert_eq!(
        result.summary.as_deref(),
        Some("An error occurred while processing your request.")
    );
}

#[tokio::test]
async fn health_reports_every_server() {
    let h = harness(None);
    let orchestrator = LegalOrchestrator::from_config(&h.config).await.unwrap();

    let report = orchestrator.health_check().await;
    for name in ["rag", "websearch", "parser", "llm", "elevenlabs"] {
        assert!(report.component(name).is_some(), "missing {}", name);
    }
    assert!(report.is_unhealthy());
}
