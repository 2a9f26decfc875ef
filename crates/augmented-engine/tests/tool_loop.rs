//! Orchestrator tests against the scripted provider.
//!
//! No network: every stream is replayed from `augmented_llm::mock`.

use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use augmented_config::{Credentials, SessionConfig};
use augmented_core::{ContentBlock, FieldSpec, ProviderKind, Role, SessionError, StreamEvent, ToolDeclaration};
use augmented_engine::Session;
use augmented_llm::mock::{text_turn, tool_turn, Script, ScriptedProvider};
use augmented_tools::{handler_fn, required_arg, Tool, ToolArgs, ToolError, ToolHandler};
use futures::StreamExt;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────

fn add_declaration() -> ToolDeclaration {
    ToolDeclaration::new("add", "Add two integers")
        .field("a", FieldSpec::required("integer"))
        .field("b", FieldSpec::required("integer"))
}

fn register_add(session: &mut Session) {
    session.register(
        add_declaration(),
        handler_fn(|args| {
            let a: i64 = required_arg(&args, "a")?;
            let b: i64 = required_arg(&args, "b")?;
            Ok((a + b).to_string())
        }),
    );
}

fn session_with(kind: ProviderKind, provider: &Arc<ScriptedProvider>, tmp: &TempDir) -> Session {
    let config = SessionConfig::builder(kind).log_dir(tmp.path()).build();
    Session::with_provider(config, provider.clone()).unwrap()
}

/// Drains one `generate` call into its text and terminal error, if any.
async fn run(session: &mut Session, text: &str) -> (String, Option<SessionError>) {
    let stream = session.generate(text);
    futures::pin_mut!(stream);
    let mut out = String::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => out.push_str(&chunk),
            Err(e) => return (out, Some(e)),
        }
    }
    (out, None)
}

fn tool_results(session: &Session) -> Vec<(String, String)> {
    session
        .history()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| {
            (
                m.tool_call_id.clone().unwrap_or_default(),
                m.tool_result_content().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

// ── Plain turns ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_text_only_turn_issues_one_stream() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(ProviderKind::Anthropic).with_events(text_turn("Hello there")));
    let mut session = session_with(ProviderKind::Anthropic, &provider, &tmp);

    let (out, err) = run(&mut session, "Hi").await;

    assert!(err.is_none());
    assert!(out.contains("Hello there"));
    assert!(out.starts_with("[Stream Started]\n"));
    assert!(out.ends_with("\n[Message Complete]\n"));
    assert_eq!(provider.requests().len(), 1);
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[1].text(), "Hello there");
}

#[tokio::test]
async fn test_request_carries_configuration() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(ProviderKind::OpenAi).with_events(text_turn("ok")));
    let config = SessionConfig::builder(ProviderKind::OpenAi)
        .model("gpt-4o")
        .temperature(0.2)
        .system_prompt("Be brief.")
        .log_dir(tmp.path())
        .build();
    let mut session = Session::with_provider(config, provider.clone()).unwrap();
    register_add(&mut session);

    run(&mut session, "Hi").await;

    let request = &provider.requests()[0];
    assert_eq!(request.model, "gpt-4o");
    assert_eq!(request.temperature, 0.2);
    assert_eq!(request.max_tokens, 4096);
    assert!(request.system_prompt.starts_with("Be brief.\nCurrent Date and Time: "));
    assert_eq!(request.tools.len(), 1);
    assert_eq!(request.tools[0]["function"]["strict"], true);
    assert_eq!(request.messages.len(), 1);
}

#[tokio::test]
async fn test_debug_tools_routes_markers_to_log() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(
        ScriptedProvider::new(ProviderKind::Anthropic)
            .with_events(tool_turn("", &[("toolu_1", "add", r#"{"a": 1, "b": 1}"#)]))
            .with_events(text_turn("2")),
    );
    let config = SessionConfig::builder(ProviderKind::Anthropic).debug_tools(true).log_dir(tmp.path()).build();
    let mut session = Session::with_provider(config, provider.clone()).unwrap();
    register_add(&mut session);

    let (out, err) = run(&mut session, "1 + 1?").await;

    assert!(err.is_none());
    assert_eq!(out, "2");
}

// ── Tool loop ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_tool_result_resumes_stream() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(
        ScriptedProvider::new(ProviderKind::Anthropic)
            .with_events(tool_turn("", &[("toolu_1", "add", r#"{"a":2,"b":3}"#)]))
            .with_events(text_turn("2 + 3 = 5")),
    );
    let mut session = session_with(ProviderKind::Anthropic, &provider, &tmp);
    register_add(&mut session);

    let (out, err) = run(&mut session, "What is 2 + 3?").await;

    assert!(err.is_none());
    assert!(out.contains("[Tool Use Started: add]"));
    assert!(out.contains("[Tool Input: {\"a\":2,\"b\":3}]"));
    assert!(out.contains("\n[Tool Result]\n5\n"));
    assert!(out.contains("[Continuing conversation with tool result...]"));
    assert!(out.contains("2 + 3 = 5"));
    assert_eq!(tool_results(&session), vec![("toolu_1".to_string(), "5".to_string())]);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let resumed = &requests[1].messages;
    assert_eq!(resumed.len(), 3);
    assert_eq!(resumed[2].role, Role::Tool);
    assert_eq!(resumed[2].tool_result_content(), Some("5"));
}

#[tokio::test]
async fn test_anthropic_executes_first_call_only() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(
        ScriptedProvider::new(ProviderKind::Anthropic)
            .with_events(tool_turn(
                "Let me add.",
                &[("toolu_1", "add", r#"{"a":1,"b":1}"#), ("toolu_2", "add", r#"{"a":2,"b":2}"#)],
            ))
            .with_events(text_turn("done")),
    );
    let mut session = session_with(ProviderKind::Anthropic, &provider, &tmp);
    register_add(&mut session);

    run(&mut session, "add twice").await;

    assert_eq!(tool_results(&session), vec![("toolu_1".to_string(), "2".to_string())]);
}

#[tokio::test]
async fn test_openai_executes_every_call_and_reports_malformed_arguments() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(
        ScriptedProvider::new(ProviderKind::OpenAi)
            .with_events(tool_turn(
                "",
                &[("call_a", "add", r#"{"a":1,"b":2}"#), ("call_b", "add", r#"{"a":"#)],
            ))
            .with_events(text_turn("partial answer")),
    );
    let mut session = session_with(ProviderKind::OpenAi, &provider, &tmp);
    register_add(&mut session);

    let (out, err) = run(&mut session, "add").await;

    assert!(err.is_none());
    assert!(out.contains("\n[Tool Result]\n3\n"));
    assert!(out.contains("\n[Error] Error parsing tool arguments: "));

    let results = tool_results(&session);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], ("call_a".to_string(), "3".to_string()));
    assert_eq!(results[1].0, "call_b");
    assert!(results[1].1.starts_with("Error parsing tool arguments"));

    let assistant = &session.history()[1];
    assert_eq!(
        assistant.tool_uses()[1],
        &ContentBlock::tool_use("call_b", "add", serde_json::Value::String(r#"{"a":"#.into()))
    );
}

#[tokio::test]
async fn test_unknown_tool_becomes_result_text() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(
        ScriptedProvider::new(ProviderKind::Anthropic)
            .with_events(tool_turn("", &[("toolu_1", "weather", "{}")]))
            .with_events(text_turn("I cannot check the weather.")),
    );
    let mut session = session_with(ProviderKind::Anthropic, &provider, &tmp);

    let (out, err) = run(&mut session, "Weather?").await;

    assert!(err.is_none());
    assert!(out.contains("not found"));
    assert!(tool_results(&session)[0].1.contains("not found"));
    assert!(!tmp.path().join("tool_errors").exists());
}

#[tokio::test]
async fn test_handler_failure_is_logged_and_fed_back() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(
        ScriptedProvider::new(ProviderKind::Anthropic)
            .with_events(tool_turn("", &[("toolu_1", "divide", r#"{"a":1,"b":0}"#)]))
            .with_events(text_turn("Division by zero is undefined.")),
    );
    let mut session = session_with(ProviderKind::Anthropic, &provider, &tmp);
    session.register(
        ToolDeclaration::new("divide", "Divide a by b"),
        handler_fn(|args| {
            let b: i64 = required_arg(&args, "b")?;
            if b == 0 {
                return Err(ToolError::failed("division by zero"));
            }
            Ok("ok".to_string())
        }),
    );

    let (_, err) = run(&mut session, "1 / 0").await;

    assert!(err.is_none());
    assert_eq!(tool_results(&session)[0].1, "Error executing tool divide: division by zero");

    let logs: Vec<_> = fs::read_dir(tmp.path().join("tool_errors")).unwrap().collect();
    assert_eq!(logs.len(), 1);
    let record: serde_json::Value =
        serde_json::from_slice(&fs::read(logs[0].as_ref().unwrap().path()).unwrap()).unwrap();
    assert_eq!(record["error"]["kind"], "ToolFailed");
    assert_eq!(record["context"]["tools_registered"][0], "divide");
}

#[tokio::test]
async fn test_turn_limit_stops_runaway_loop() {
    let tmp = TempDir::new().unwrap();
    let looping = tool_turn("", &[("toolu_1", "add", r#"{"a":1,"b":1}"#)]);
    let provider = Arc::new(
        ScriptedProvider::new(ProviderKind::Anthropic)
            .with_events(looping.clone())
            .with_events(looping.clone())
            .with_events(looping),
    );
    let config = SessionConfig::builder(ProviderKind::Anthropic).max_turns(2).log_dir(tmp.path()).build();
    let mut session = Session::with_provider(config, provider.clone()).unwrap();
    register_add(&mut session);

    let (_, err) = run(&mut session, "loop").await;

    assert!(matches!(err, Some(SessionError::TurnLimit(2))));
    assert_eq!(provider.requests().len(), 2);
    assert_eq!(tool_results(&session).len(), 2);
}

// ── Failures and diagnostics ─────────────────────────────────────────

#[tokio::test]
async fn test_transport_failure_aborts_without_turn_and_saves_transcript() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(ProviderKind::Anthropic).with_script(Script::FailAfter(
        vec![StreamEvent::MessageStart, StreamEvent::text_delta(0, "Par")],
        "connection reset".into(),
    )));
    let config = SessionConfig::builder(ProviderKind::Anthropic).debug_messages(true).log_dir(tmp.path()).build();
    let mut session = Session::with_provider(config, provider.clone()).unwrap();

    let (out, err) = run(&mut session, "Hi").await;

    assert!(out.contains("Par"));
    assert!(matches!(err, Some(SessionError::Transport(m)) if m == "connection reset"));
    assert_eq!(session.history().len(), 1);

    let transcripts: Vec<_> = fs::read_dir(tmp.path().join("messages")).unwrap().collect();
    assert_eq!(transcripts.len(), 1);
}

#[tokio::test]
async fn test_open_error_is_transport_failure() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(ProviderKind::OpenAi).with_script(Script::OpenError("401".into())));
    let mut session = session_with(ProviderKind::OpenAi, &provider, &tmp);

    let (out, err) = run(&mut session, "Hi").await;

    assert!(out.is_empty());
    assert!(matches!(err, Some(SessionError::Transport(_))));
}

#[test]
fn test_missing_credentials_fail_at_construction() {
    let config = SessionConfig::builder(ProviderKind::OpenAi)
        .credentials(Credentials::default().with_anthropic_key("sk-ant"))
        .build();
    match Session::new(config) {
        Err(SessionError::InvalidConfiguration(message)) => assert!(message.contains("OPENAI_API_KEY")),
        Err(other) => panic!("expected invalid configuration, got {:?}", other),
        Ok(_) => panic!("expected invalid configuration"),
    }
}

#[test]
fn test_provider_mismatch_is_rejected() {
    let provider = Arc::new(ScriptedProvider::new(ProviderKind::OpenAi));
    let config = SessionConfig::builder(ProviderKind::Anthropic).build();
    assert!(matches!(
        Session::with_provider(config, provider),
        Err(SessionError::InvalidConfiguration(_))
    ));
}

// ── Ledger and registry ──────────────────────────────────────────────

#[tokio::test]
async fn test_ledger_tracks_user_tool_and_assistant() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(
        ScriptedProvider::new(ProviderKind::Anthropic)
            .with_events(tool_turn("", &[("toolu_1", "add", r#"{"a":2,"b":3}"#)]))
            .with_events(text_turn("The answer is 5")),
    );
    let mut session = session_with(ProviderKind::Anthropic, &provider, &tmp)
        .with_token_counter(Arc::new(|text: &str| text.split_whitespace().count()));
    register_add(&mut session);

    run(&mut session, "What is 2 + 3?").await;

    let ledger = session.ledger();
    let roles: Vec<Role> = ledger.entries().iter().map(|e| e.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Tool, Role::Assistant]);
    assert_eq!(ledger.tool_calls(), 1);
    assert_eq!(ledger.output_tokens(), 4);
    assert_eq!(ledger.input_tokens() + ledger.output_tokens(), ledger.total_tokens());
    assert!(ledger.tool_tokens() <= ledger.input_tokens());

    session.clear_history();
    assert!(session.history().is_empty());
    assert_eq!(session.ledger().entries().len(), 1);
}

#[tokio::test]
async fn test_duplicate_registration_last_wins() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(ProviderKind::Anthropic));
    let mut session = session_with(ProviderKind::Anthropic, &provider, &tmp);
    session.register(ToolDeclaration::new("greet", "old"), handler_fn(|_| Ok("old".to_string())));
    session.register(ToolDeclaration::new("greet", "new"), handler_fn(|_| Ok("new".to_string())));

    assert_eq!(session.tools().len(), 1);
    assert_eq!(session.tools().wire_declarations()[0]["description"], "new");
    assert_eq!(session.execute_tool("greet", &serde_json::json!({})).await, "new");
}

struct Clock;

#[async_trait]
impl ToolHandler for Clock {
    async fn call(&self, _args: ToolArgs) -> Result<String, ToolError> {
        Ok("12:00".to_string())
    }
}

impl Tool for Clock {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::new("current_time", "Returns the current time")
    }
}

#[tokio::test]
async fn test_log_tools_writes_provider_schemas() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(ProviderKind::OpenAi));
    let mut session = session_with(ProviderKind::OpenAi, &provider, &tmp);
    register_add(&mut session);
    session.register_tool(Clock);

    let path = session.log_tools().unwrap();
    let record: serde_json::Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
    assert_eq!(record["provider"], "openai");
    assert_eq!(record["total_tools"], 2);
    assert_eq!(record["registered_tools"][1]["function"]["name"], "current_time");
    assert_eq!(session.execute_tool("current_time", &serde_json::Value::Null).await, "12:00");
}
