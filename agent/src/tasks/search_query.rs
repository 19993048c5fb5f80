//! Search query generation.

use std::sync::Arc;

use tracing::instrument;

use crate::core::conversation::Turn;
use crate::core::shape::TargetShape;
use crate::io::prompt;

use super::{TaskExecutor, TaskRequest, rendered};

#[derive(Debug)]
pub struct GenerateSearchQuery<E> {
    executor: Arc<E>,
}

impl<E: TaskExecutor> GenerateSearchQuery<E> {
    pub const DESCRIPTION: &'static str =
        "Generate a list of search queries to get necessary information for a given task";

    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Queries for `goal`, steered away from `previous_queries`.
    ///
    /// The goal is presented as context only; the model is told not to act
    /// on it.
    #[instrument(skip_all, fields(previous = previous_queries.len()))]
    pub async fn run(
        &self,
        goal: &str,
        context_message: &str,
        topics: &[String],
        previous_queries: &[String],
    ) -> Vec<String> {
        let Some(prompt) = rendered(
            Self::DESCRIPTION,
            prompt::search_query(goal, context_message, topics, previous_queries),
        ) else {
            return Vec::new();
        };
        let request = TaskRequest::new(
            Self::DESCRIPTION,
            vec![Turn::user(prompt)],
            TargetShape::string_list(),
        );
        self.executor
            .execute::<Vec<String>>(request, Vec::new())
            .await
            .into_iter()
            .map(|query| query.trim().to_string())
            .filter(|query| !query.is_empty())
            .collect()
    }
}
