//! Answer critique used as the executor's acceptance gate.

use tracing::{debug, instrument};

use crate::core::conversation::{Conversation, Turn};
use crate::core::types::Critique;
use crate::io::model::ModelError;
use crate::io::prompt;

use super::ToolContext;

/// Scores the last model turn of a conversation against a task description.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckAnswer;

impl CheckAnswer {
    pub const DESCRIPTION: &'static str =
        "Given a previous prompt and the AI answer, determine if the answer is good";

    #[instrument(skip_all, fields(task = description))]
    pub async fn run(
        &self,
        ctx: &ToolContext,
        answered: &Conversation,
        description: &str,
    ) -> Result<Critique, ModelError> {
        let request = answered.with(Turn::user(question(description)));
        let critique: Critique = ctx
            .model()
            .generate(&request, &Critique::shape(), Some(prompt::critic_persona()))
            .await?;
        debug!(score = critique.score, "answer critiqued");
        Ok(critique)
    }
}

fn question(description: &str) -> String {
    format!(
        "Does the AI answer satisfy the requirements of the given task?\n\
         Keep in mind that the task description is \"{description}\""
    )
}
