//! Prompt catalog and concurrent fan-out over orchestration runs.

use agent::core::types::PromptMode;
use agent::io::search::SearchProvider;
use agent::orchestrator::{OrchestrationRequest, SearchOrchestrator};
use agent::tasks::TaskExecutor;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

const TRIVIA_PROMPT: &str = include_str!("prompts/trivia.md");
const LOCAL_NEWS_PROMPT: &str = include_str!("prompts/local_news.md");

/// One scheduled goal and how strictly its answer must follow search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptItem {
    pub mode: PromptMode,
    pub prompt: String,
}

/// Built-in catalog: relaxed trivia, then strict local news.
pub fn default_prompts() -> Vec<PromptItem> {
    vec![
        PromptItem {
            mode: PromptMode::Relaxed,
            prompt: TRIVIA_PROMPT.trim().to_string(),
        },
        PromptItem {
            mode: PromptMode::Strict,
            prompt: LOCAL_NEWS_PROMPT.trim().to_string(),
        },
    ]
}

/// Run every prompt as its own orchestration, concurrently.
///
/// Results keep catalog order; prompts that produced nothing are dropped.
#[instrument(skip_all, fields(prompts = prompts.len()))]
pub async fn run_all_prompts<E, S>(
    orchestrator: &SearchOrchestrator<E, S>,
    prompts: &[PromptItem],
    context_message: &str,
    background: &str,
) -> Vec<String>
where
    E: TaskExecutor,
    S: SearchProvider + ?Sized,
{
    let runs = prompts.iter().map(|item| {
        let request = OrchestrationRequest {
            goal: item.prompt.clone(),
            context_message: context_message.to_string(),
            background: background.to_string(),
            mode: item.mode,
        };
        async move { orchestrator.run(&request).await }
    });
    let outputs: Vec<String> = join_all(runs)
        .await
        .into_iter()
        .filter(|output| !output.trim().is_empty())
        .collect();
    info!(produced = outputs.len(), "prompt fan-out finished");
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent::tasks::{
        GenerateSearchQuery, SelectRelevantResults, Translate, TravelAgent,
    };
    use agent::test_support::{ScriptedExecutor, ScriptedSearch, search_result};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn default_catalog_is_trivia_then_local_news() {
        let prompts = default_prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].mode, PromptMode::Relaxed);
        assert!(prompts[0].prompt.contains("Did you know?"));
        assert_eq!(prompts[1].mode, PromptMode::Strict);
        assert!(prompts[1].prompt.contains("Local News:"));
        assert!(!prompts[1].prompt.ends_with('\n'));
    }

    #[tokio::test]
    async fn empty_results_are_dropped() {
        let executor = ScriptedExecutor::new()
            .on(GenerateSearchQuery::<ScriptedExecutor>::DESCRIPTION, json!(["ghent"]))
            .on(
                SelectRelevantResults::<ScriptedExecutor>::DESCRIPTION,
                json!([{ "id": 0, "confidenceScore": 0.9 }]),
            )
            .on(TravelAgent::<ScriptedExecutor>::DESCRIPTION, json!("🌟 fact"))
            .on(Translate::<ScriptedExecutor>::DESCRIPTION, json!("🌟 feit"));
        let search = ScriptedSearch::new().with_results("ghent", vec![search_result(1)]);
        let orchestrator =
            SearchOrchestrator::new(Arc::new(executor), Arc::new(search), "Dutch");

        let outputs = run_all_prompts(
            &orchestrator,
            &default_prompts(),
            "Day 2 in Ghent",
            "Step 1: Ghent",
        )
        .await;
        assert_eq!(outputs, vec!["🌟 feit"]);
    }

    #[tokio::test]
    async fn no_prompts_no_output() {
        let orchestrator = SearchOrchestrator::new(
            Arc::new(ScriptedExecutor::new()),
            Arc::new(ScriptedSearch::new()),
            "English",
        );
        assert!(run_all_prompts(&orchestrator, &[], "ctx", "bg").await.is_empty());
    }
}
