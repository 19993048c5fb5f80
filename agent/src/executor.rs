//! Self-correcting task executor.
//!
//! Each task runs through requirement extraction, then up to
//! [`MAX_ATTEMPTS`] rounds of generation and critique. A rejected answer is
//! kept in the conversation together with the critic's feedback, so every
//! retry sees the full history of earlier attempts.
//!
//! The executor never fails. When no attempt is accepted the caller's default
//! is returned, and [`SelfCorrectingExecutor::execute_traced`] exposes the
//! per-attempt record for logging and tests.

use std::iter;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::core::conversation::{Conversation, Turn};
use crate::core::shape::TargetShape;
use crate::core::types::Critique;
use crate::io::model::ModelError;
use crate::tasks::{CheckAnswer, ExtractRequirements, TaskExecutor, TaskRequest, ToolContext};

/// Generation attempts per task invocation.
pub const MAX_ATTEMPTS: u32 = 4;

/// What happened to one generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Generation, decoding or critique produced no usable output.
    Failed { reason: String },
    /// Critique scored the candidate below the acceptance threshold.
    Rejected(Critique),
    Accepted(Critique),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub outcome: AttemptOutcome,
}

/// Full trace of one task execution.
#[derive(Debug, Clone)]
pub struct TaskRun<T> {
    /// The accepted value, or `None` when every attempt failed or was rejected.
    pub value: Option<T>,
    pub requirements: Vec<String>,
    pub attempts: Vec<AttemptRecord>,
    /// Working conversation at the end of the run. For an accepted value this
    /// ends with the accepted model turn.
    pub conversation: Conversation,
}

/// [`TaskExecutor`] that critiques every candidate and retries with feedback.
#[derive(Debug, Clone)]
pub struct SelfCorrectingExecutor {
    ctx: ToolContext,
}

impl SelfCorrectingExecutor {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    #[instrument(skip_all, fields(task = request.description))]
    pub async fn execute_traced<T: DeserializeOwned>(&self, request: TaskRequest) -> TaskRun<T> {
        info!("executing task");
        let expected = Turn::user(expected_schema(&request.shape));

        let analysed = Conversation::new(
            request
                .contents
                .iter()
                .cloned()
                .chain(iter::once(expected.clone())),
        );
        let requirements = match ExtractRequirements.run(&self.ctx, &analysed).await {
            Ok(requirements) => requirements,
            Err(err) => {
                warn!(error = %err, "requirement extraction failed, continuing without requirements");
                Vec::new()
            }
        };

        let mut conversation = Conversation::new(
            iter::once(Turn::user(request.description))
                .chain(request.contents.iter().cloned())
                .chain([Turn::model(requirements_summary(&requirements)), expected]),
        );
        let mut attempts = Vec::new();

        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = self
                .generate_candidate::<T>(&conversation, &request)
                .await
                .map(|(value, typed)| (conversation.with(Turn::model(value)), typed));
            let (answered, typed) = match candidate {
                Ok(candidate) => candidate,
                Err(err) => {
                    warn!(attempt, error = %err, "attempt produced no usable output");
                    attempts.push(AttemptRecord {
                        attempt,
                        outcome: AttemptOutcome::Failed {
                            reason: err.to_string(),
                        },
                    });
                    continue;
                }
            };

            let critique = match CheckAnswer
                .run(&self.ctx, &answered, request.description)
                .await
            {
                Ok(critique) => critique,
                Err(err) => {
                    warn!(attempt, error = %err, "critique failed, discarding candidate");
                    attempts.push(AttemptRecord {
                        attempt,
                        outcome: AttemptOutcome::Failed {
                            reason: err.to_string(),
                        },
                    });
                    continue;
                }
            };

            if critique.is_accepted() {
                info!(attempt, score = critique.score, "answer accepted");
                attempts.push(AttemptRecord {
                    attempt,
                    outcome: AttemptOutcome::Accepted(critique),
                });
                return TaskRun {
                    value: Some(typed),
                    requirements,
                    attempts,
                    conversation: answered,
                };
            }

            debug!(attempt, score = critique.score, "answer rejected");
            conversation = if attempt < MAX_ATTEMPTS {
                answered.with(Turn::user(retry_feedback(&critique)))
            } else {
                answered
            };
            attempts.push(AttemptRecord {
                attempt,
                outcome: AttemptOutcome::Rejected(critique),
            });
        }

        warn!(attempts = MAX_ATTEMPTS, "task exhausted, falling back to default");
        TaskRun {
            value: None,
            requirements,
            attempts,
            conversation,
        }
    }

    /// One generation: the serialized candidate plus its decoded value.
    async fn generate_candidate<T: DeserializeOwned>(
        &self,
        conversation: &Conversation,
        request: &TaskRequest,
    ) -> Result<(String, T), ModelError> {
        let value = self
            .ctx
            .model()
            .generate_value(
                conversation,
                &request.shape,
                request.system_instruction.as_deref(),
            )
            .await?;
        let serialized = value.to_string();
        let typed = request.shape.decode(value)?;
        Ok((serialized, typed))
    }
}

#[async_trait]
impl TaskExecutor for SelfCorrectingExecutor {
    async fn execute<T>(&self, request: TaskRequest, default: T) -> T
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.execute_traced(request).await.value.unwrap_or(default)
    }
}

fn expected_schema(shape: &TargetShape) -> String {
    format!("Expected schema: {}", shape.describe())
}

fn requirements_summary(requirements: &[String]) -> String {
    format!("Requirements:\n {}", requirements.join("\n"))
}

fn retry_feedback(critique: &Critique) -> String {
    format!(
        "The previous answer is not good enough.\n\
         It got a score of {}.\n\
         Give a new answer based on this feedback: {}",
        critique.score, critique.feedback
    )
}
