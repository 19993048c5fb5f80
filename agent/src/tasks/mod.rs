//! Task library: named sub-workflows built from structured model calls.
//!
//! Every task except [`requirements`] and [`critic`] delegates to a
//! [`TaskExecutor`], which owns retry and critique policy. Tasks never fail;
//! an exhausted task yields its default value.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::core::conversation::Turn;
use crate::core::shape::TargetShape;
use crate::io::model::StructuredModel;

pub mod critic;
pub mod requirements;
pub mod search_query;
pub mod select;
pub mod topics;
pub mod translate;
pub mod travel_agent;

pub use critic::CheckAnswer;
pub use requirements::ExtractRequirements;
pub use search_query::GenerateSearchQuery;
pub use select::SelectRelevantResults;
pub use topics::IdentifyTopics;
pub use translate::Translate;
pub use travel_agent::TravelAgent;

/// Handle to the structured model client for one orchestration run.
#[derive(Debug, Clone)]
pub struct ToolContext {
    model: StructuredModel,
}

impl ToolContext {
    pub fn new(model: StructuredModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &StructuredModel {
        &self.model
    }
}

/// One task invocation handed to an executor.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    /// Log label and the quality bar handed to critique.
    pub description: &'static str,
    pub contents: Vec<Turn>,
    pub shape: TargetShape,
    pub system_instruction: Option<String>,
}

impl TaskRequest {
    pub fn new(description: &'static str, contents: Vec<Turn>, shape: TargetShape) -> Self {
        Self {
            description,
            contents,
            shape,
            system_instruction: None,
        }
    }

    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Runs a task to a typed value, falling back to `default` on exhaustion.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute<T>(&self, request: TaskRequest, default: T) -> T
    where
        T: DeserializeOwned + Send + 'static;
}

/// The executor-backed tasks used by the orchestrator.
#[derive(Debug)]
pub struct TaskLibrary<E> {
    pub topics: IdentifyTopics<E>,
    pub search_query: GenerateSearchQuery<E>,
    pub select: SelectRelevantResults<E>,
    pub travel_agent: TravelAgent<E>,
    pub translate: Translate<E>,
}

impl<E: TaskExecutor> TaskLibrary<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self {
            topics: IdentifyTopics::new(Arc::clone(&executor)),
            search_query: GenerateSearchQuery::new(Arc::clone(&executor)),
            select: SelectRelevantResults::new(Arc::clone(&executor)),
            travel_agent: TravelAgent::new(Arc::clone(&executor)),
            translate: Translate::new(executor),
        }
    }
}

/// Unwrap a rendered prompt, logging render failures.
///
/// Templates are compiled in, so a failure here means a task argument could
/// not be serialized. The task then returns its default.
pub(crate) fn rendered(task: &'static str, prompt: anyhow::Result<String>) -> Option<String> {
    match prompt {
        Ok(prompt) => Some(prompt),
        Err(err) => {
            warn!(task, error = %format!("{err:#}"), "prompt render failed");
            None
        }
    }
}
