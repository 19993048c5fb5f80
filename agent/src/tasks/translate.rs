//! Final-answer translation.

use std::sync::Arc;

use tracing::instrument;

use crate::core::conversation::Turn;
use crate::core::shape::TargetShape;
use crate::io::prompt;

use super::{TaskExecutor, TaskRequest, rendered};

#[derive(Debug)]
pub struct Translate<E> {
    executor: Arc<E>,
}

impl<E: TaskExecutor> Translate<E> {
    pub const DESCRIPTION: &'static str = "translate text to a given language";

    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// `text` in `language`, or an empty string when the task is exhausted.
    #[instrument(skip_all, fields(language = language))]
    pub async fn run(&self, text: &str, language: &str) -> String {
        let Some(prompt) = rendered(Self::DESCRIPTION, prompt::translate(text, language)) else {
            return String::new();
        };
        let request = TaskRequest::new(
            Self::DESCRIPTION,
            vec![Turn::user(prompt)],
            TargetShape::String,
        );
        self.executor.execute(request, String::new()).await
    }
}
