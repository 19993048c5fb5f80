//! Domain answer generation from fetched search results.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::core::conversation::Turn;
use crate::core::shape::TargetShape;
use crate::core::types::{PageContent, PromptMode};
use crate::io::prompt;

use super::{TaskExecutor, TaskRequest, rendered};

#[derive(Debug)]
pub struct TravelAgent<E> {
    executor: Arc<E>,
}

impl<E: TaskExecutor> TravelAgent<E> {
    pub const DESCRIPTION: &'static str =
        "Retrieve formatted interesting information related to a given text";

    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// An answer to `goal`, or `None` when the model judged the pages
    /// insufficient or the task was exhausted.
    ///
    /// A blank answer is treated the same as `None`.
    #[instrument(skip_all, fields(mode = %mode, pages = pages.len()))]
    pub async fn run(
        &self,
        goal: &str,
        context_message: &str,
        background: &str,
        mode: PromptMode,
        pages: &[PageContent],
    ) -> Option<String> {
        let prompt = rendered(
            Self::DESCRIPTION,
            prompt::travel_agent(goal, context_message, background, mode, pages),
        )?;
        let request = TaskRequest::new(
            Self::DESCRIPTION,
            vec![Turn::user(prompt)],
            TargetShape::String.nullable(),
        )
        .with_system_instruction(prompt::travel_persona());
        let answer: Option<String> = self.executor.execute(request, None).await;
        let answer = answer.filter(|text| !text.trim().is_empty());
        debug!(answered = answer.is_some(), "domain answer generated");
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedExecutor;
    use serde_json::{Value, json};

    fn page() -> PageContent {
        PageContent {
            title: "Quilts".to_string(),
            link: "https://q.example".to_string(),
            snippet: "Annual".to_string(),
            content: "The elderly club hosts its annual quilt festival.".to_string(),
        }
    }

    fn agent(reply: Option<Value>) -> (Arc<ScriptedExecutor>, TravelAgent<ScriptedExecutor>) {
        let mut executor = ScriptedExecutor::new();
        if let Some(reply) = reply {
            executor = executor.on(TravelAgent::<ScriptedExecutor>::DESCRIPTION, reply);
        }
        let executor = Arc::new(executor);
        (Arc::clone(&executor), TravelAgent::new(executor))
    }

    #[tokio::test]
    async fn returns_answer_with_persona_and_pages() {
        let (executor, agent) = agent(Some(json!("🎤 _Local News:_ quilts!")));
        let answer = agent
            .run("goal", "today", "journal", PromptMode::Strict, &[page()])
            .await;
        assert_eq!(answer.as_deref(), Some("🎤 _Local News:_ quilts!"));

        let call = &executor.calls()[0];
        assert!(call.prompt.contains("annual quilt festival"));
        assert!(call.prompt.contains("Use only the provided search results"));
        assert_eq!(call.system_instruction.as_deref(), Some(prompt::travel_persona()));
        assert_eq!(call.shape, TargetShape::String.nullable());
    }

    #[tokio::test]
    async fn null_answer_is_none() {
        let (_, agent) = agent(Some(Value::Null));
        let answer = agent
            .run("goal", "today", "journal", PromptMode::Strict, &[page()])
            .await;
        assert_eq!(answer, None);
    }

    #[tokio::test]
    async fn blank_answer_is_none() {
        let (_, agent) = agent(Some(json!("   ")));
        let answer = agent
            .run("goal", "today", "journal", PromptMode::Relaxed, &[page()])
            .await;
        assert_eq!(answer, None);
    }
}
