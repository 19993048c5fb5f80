//! End-to-end orchestration over a scripted model backend.
//!
//! Drives the real self-correcting executor and task library against
//! scripted model replies and canned search results, verifying the full
//! request sequence of a run as well as graceful degradation when the model
//! endpoint is down.

use std::sync::Arc;

use agent::core::conversation::Role;
use agent::core::types::PromptMode;
use agent::executor::{MAX_ATTEMPTS, SelfCorrectingExecutor};
use agent::io::model::ModelError;
use agent::io::prompt;
use agent::orchestrator::{OUTER_ATTEMPTS, OrchestrationRequest, SearchOrchestrator};
use agent::test_support::{ScriptedBackend, ScriptedSearch, search_result, tool_context};
use serde_json::{Value, json};

fn request() -> OrchestrationRequest {
    OrchestrationRequest {
        goal: "Find a quirky local news story".to_string(),
        context_message: "Day 3: cycling to Bruges".to_string(),
        background: "Step 2: Ghent (2024-05-01)\nCanals".to_string(),
        mode: PromptMode::Strict,
    }
}

/// Requirements, candidate and an accepting critique for one task.
fn accepted(candidate: Value) -> Vec<Result<String, ModelError>> {
    vec![
        ScriptedBackend::reply(json!(["be concise"])),
        ScriptedBackend::reply(candidate),
        ScriptedBackend::reply(json!({ "feedback": "good", "score": 0.95 })),
    ]
}

#[tokio::test]
async fn run_reaches_translated_answer_through_every_task() {
    let script = [
        accepted(json!(["Bruges", "cycling"])),
        accepted(json!(["bruges local news"])),
        accepted(json!([{ "id": 1, "confidenceScore": 0.9 }])),
        accepted(json!("🎤 _Local News:_ teddy-bear competition")),
        accepted(json!("🎤 _Lokaal nieuws:_ teddyberenwedstrijd")),
    ]
    .concat();
    let backend = Arc::new(ScriptedBackend::new(script));
    let search = Arc::new(
        ScriptedSearch::new()
            .with_results("bruges local news", vec![search_result(1), search_result(2)])
            .with_page("https://example.com/2", "Annual teddy-bear competition in Bruges"),
    );
    let executor = Arc::new(SelfCorrectingExecutor::new(tool_context(&backend)));
    let orchestrator = SearchOrchestrator::new(executor, Arc::clone(&search), "Dutch");

    let answer = orchestrator.run(&request()).await;
    assert_eq!(answer, "🎤 _Lokaal nieuws:_ teddyberenwedstrijd");

    let requests = backend.requests();
    assert_eq!(requests.len(), 15);
    assert_eq!(search.fetches(), vec!["https://example.com/2"]);

    // Fourth task is the domain answer; index 10 is its generation request.
    let answer_request = &requests[10];
    assert_eq!(
        answer_request.system_instruction.as_deref(),
        Some(prompt::travel_persona())
    );
    let turns = answer_request.conversation.turns();
    assert_eq!(turns[0].role, Role::User);
    assert!(turns[1].text().contains("Annual teddy-bear competition in Bruges"));
    assert!(turns[1].text().contains("Step 2: Ghent"));
    assert_eq!(
        answer_request.response_schema,
        json!({ "type": "STRING", "nullable": true })
    );

    // Critique requests carry the critic persona, never the task persona.
    assert_eq!(
        requests[11].system_instruction.as_deref(),
        Some(prompt::critic_persona())
    );
}

#[tokio::test]
async fn unavailable_model_degrades_to_empty_answer() {
    let backend = Arc::new(ScriptedBackend::new(Vec::new()));
    let search = Arc::new(ScriptedSearch::new());
    let executor = Arc::new(SelfCorrectingExecutor::new(tool_context(&backend)));
    let orchestrator = SearchOrchestrator::new(executor, Arc::clone(&search), "Dutch");

    assert_eq!(orchestrator.run(&request()).await, "");

    // Topics once, then one query generation per outer attempt; each task is
    // one requirements call plus every generation attempt.
    let per_task = 1 + MAX_ATTEMPTS as usize;
    let expected = per_task * (1 + OUTER_ATTEMPTS as usize);
    assert_eq!(backend.requests().len(), expected);
    assert!(search.searches().is_empty());
}
