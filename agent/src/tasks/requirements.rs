//! Requirement extraction run ahead of every executed task.

use tracing::{debug, instrument};

use crate::core::conversation::{Conversation, Turn};
use crate::core::shape::TargetShape;
use crate::io::model::ModelError;
use crate::io::prompt;

use super::ToolContext;

const EXTRACT_REQUEST: &str = "Extract the requirements of the above user query";

/// Lists what a task's answer must satisfy. Not itself critiqued.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractRequirements;

impl ExtractRequirements {
    pub const DESCRIPTION: &'static str = "extract requirements of a task";

    #[instrument(skip_all, fields(turns = conversation.len()))]
    pub async fn run(
        &self,
        ctx: &ToolContext,
        conversation: &Conversation,
    ) -> Result<Vec<String>, ModelError> {
        let request = conversation.with(Turn::user(EXTRACT_REQUEST));
        let requirements: Vec<String> = ctx
            .model()
            .generate(
                &request,
                &TargetShape::string_list(),
                Some(prompt::requirements_persona()),
            )
            .await?;
        debug!(count = requirements.len(), "requirements extracted");
        Ok(requirements)
    }
}
