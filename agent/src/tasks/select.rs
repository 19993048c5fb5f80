//! Relevance selection over an id-tagged result pool.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::core::conversation::Turn;
use crate::core::relevance::ResultPool;
use crate::core::types::{MAX_JUDGMENTS, RelevanceJudgment};
use crate::io::prompt;

use super::{TaskExecutor, TaskRequest, rendered};

#[derive(Debug)]
pub struct SelectRelevantResults<E> {
    executor: Arc<E>,
}

impl<E: TaskExecutor> SelectRelevantResults<E> {
    pub const DESCRIPTION: &'static str = "Select relevant search results for the given task";

    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Verified judgments for `pool`: at most five, each scoring at least 0.7.
    #[instrument(skip_all, fields(pool = pool.len()))]
    pub async fn run(
        &self,
        goal: &str,
        context_message: &str,
        pool: &ResultPool,
    ) -> Vec<RelevanceJudgment> {
        let Some(prompt) = rendered(
            Self::DESCRIPTION,
            prompt::select_results(goal, context_message, pool),
        ) else {
            return Vec::new();
        };
        let request = TaskRequest::new(
            Self::DESCRIPTION,
            vec![Turn::user(prompt)],
            RelevanceJudgment::list_shape(),
        );
        let judgments: Vec<RelevanceJudgment> = self.executor.execute(request, Vec::new()).await;
        let judged = judgments.len();
        let verified: Vec<_> = judgments
            .into_iter()
            .take(MAX_JUDGMENTS)
            .filter(RelevanceJudgment::is_verified)
            .collect();
        debug!(judged, verified = verified.len(), "relevance judged");
        verified
    }
}
