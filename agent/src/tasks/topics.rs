//! Topic identification for a context message.

use std::sync::Arc;

use tracing::instrument;

use crate::core::conversation::Turn;
use crate::core::shape::TargetShape;
use crate::io::prompt;

use super::{TaskExecutor, TaskRequest, rendered};

#[derive(Debug)]
pub struct IdentifyTopics<E> {
    executor: Arc<E>,
}

impl<E: TaskExecutor> IdentifyTopics<E> {
    pub const DESCRIPTION: &'static str = "Identify topics of a given text";

    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Topics of `text`, or an empty list when the task is exhausted.
    #[instrument(skip_all)]
    pub async fn run(&self, text: &str) -> Vec<String> {
        let Some(prompt) = rendered(Self::DESCRIPTION, prompt::identify_topics(text)) else {
            return Vec::new();
        };
        let request = TaskRequest::new(
            Self::DESCRIPTION,
            vec![Turn::user(prompt)],
            TargetShape::string_list(),
        );
        self.executor.execute(request, Vec::new()).await
    }
}
