//! Search-augmented orchestration loop.
//!
//! One run turns a goal into a translated answer:
//!
//! 1. Identify topics of the context message (once per run).
//! 2. Up to [`OUTER_ATTEMPTS`] times: generate queries, search, and tag the
//!    results into a fresh [`ResultPool`].
//! 3. Up to [`INNER_ATTEMPTS`] times per pool: select relevant results, fetch
//!    their pages, and ask the domain answer task. A `null` answer moves on to
//!    the remaining pool entries.
//!
//! Results already handed to the domain answer task are not offered again
//! later in the same run. A run that finds no answer returns an empty string.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::core::relevance::{ResultPool, TaggedResult};
use crate::core::types::{PromptMode, SearchResult};
use crate::io::search::{SearchProvider, fetch_many, fetch_pages};
use crate::tasks::{TaskExecutor, TaskLibrary};

/// Query generations per run.
pub const OUTER_ATTEMPTS: u32 = 3;
/// Relevance selections per result pool.
pub const INNER_ATTEMPTS: u32 = 3;

/// Inputs of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationRequest {
    /// What the final answer should achieve.
    pub goal: String,
    /// The message the answer accompanies; also the source of search topics.
    pub context_message: String,
    /// Surrounding material shown to the domain answer task only.
    pub background: String,
    pub mode: PromptMode,
}

pub struct SearchOrchestrator<E, S: ?Sized> {
    tasks: TaskLibrary<E>,
    search: Arc<S>,
    language: String,
}

impl<E: TaskExecutor, S: SearchProvider + ?Sized> SearchOrchestrator<E, S> {
    pub fn new(executor: Arc<E>, search: Arc<S>, language: impl Into<String>) -> Self {
        Self {
            tasks: TaskLibrary::new(executor),
            search,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Run to a translated answer, or an empty string when every attempt
    /// is exhausted. Never fails.
    #[instrument(skip_all, fields(mode = %request.mode))]
    pub async fn run(&self, request: &OrchestrationRequest) -> String {
        let goal = request.goal.as_str();
        let context_message = request.context_message.as_str();

        let topics = self.tasks.topics.run(context_message).await;
        debug!(?topics, "topics identified");

        let mut previous_queries: Vec<String> = Vec::new();
        let mut offered: HashSet<String> = HashSet::new();

        for outer in 1..=OUTER_ATTEMPTS {
            let queries = self
                .tasks
                .search_query
                .run(goal, context_message, &topics, &previous_queries)
                .await;
            previous_queries.extend(queries.iter().cloned());

            let results = fetch_many(self.search.as_ref(), &queries).await;
            let mut pool = ResultPool::tag(
                results
                    .into_iter()
                    .filter(|result| !offered.contains(&result.link)),
            );
            info!(outer, queries = queries.len(), pool = pool.len(), "search round");

            let mut inner = 0;
            while !pool.is_empty() && inner < INNER_ATTEMPTS {
                inner += 1;
                let judgments = self.tasks.select.run(goal, context_message, &pool).await;
                let verified: Vec<SearchResult> = pool
                    .take_verified(&judgments)
                    .into_iter()
                    .map(TaggedResult::into_result)
                    .collect();
                if verified.is_empty() {
                    debug!(outer, inner, "no verified results");
                    continue;
                }
                offered.extend(verified.iter().map(|result| result.link.clone()));

                let pages = fetch_pages(self.search.as_ref(), &verified).await;
                let answer = self
                    .tasks
                    .travel_agent
                    .run(
                        goal,
                        context_message,
                        &request.background,
                        request.mode,
                        &pages,
                    )
                    .await;
                match answer {
                    Some(answer) => {
                        info!(outer, inner, verified = verified.len(), "answer found");
                        return self.tasks.translate.run(&answer, &self.language).await;
                    }
                    None => debug!(outer, inner, "answer insufficient, trying remaining results"),
                }
            }
            debug!(outer, "result pool exhausted, generating new queries");
        }

        warn!(attempts = OUTER_ATTEMPTS, "orchestration exhausted");
        String::new()
    }
}
