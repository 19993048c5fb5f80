//! Structured model client.
//!
//! The [`ModelBackend`] trait decouples structured generation from the actual
//! endpoint (currently Gemini, see [`crate::io::gemini`]). Tests use scripted
//! backends that return predetermined raw text without network access.
//!
//! [`StructuredModel`] issues exactly one backend request per call and never
//! retries; retry policy belongs to [`crate::executor`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::core::conversation::Conversation;
use crate::core::shape::{ShapeError, TargetShape};

/// Why a structured generation produced no usable output.
///
/// Callers treat both variants identically: the attempt is spent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Transport, authentication, rate limit or timeout failure.
    #[error("generation failed: {0}")]
    Generation(String),
    /// Response text was not JSON or did not match the target shape.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl From<ShapeError> for ModelError {
    fn from(err: ShapeError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// One request to the language-model endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub conversation: Conversation,
    /// Shape hint passed as the endpoint's response schema.
    pub response_schema: Value,
    pub system_instruction: Option<String>,
}

/// Abstraction over language-model endpoints.
///
/// Implementations must be stateless request/response wrappers so one
/// backend can serve concurrent orchestration runs.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Return the raw response text, expected to be JSON.
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError>;
}

/// Model client that returns values already validated against a [`TargetShape`].
#[derive(Clone)]
pub struct StructuredModel {
    backend: Arc<dyn ModelBackend>,
}

impl fmt::Debug for StructuredModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredModel").finish_non_exhaustive()
    }
}

impl StructuredModel {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    /// Generate and validate, returning the shape-conforming JSON value.
    #[instrument(skip_all, fields(turns = conversation.len()))]
    pub async fn generate_value(
        &self,
        conversation: &Conversation,
        shape: &TargetShape,
        system_instruction: Option<&str>,
    ) -> Result<Value, ModelError> {
        let request = ModelRequest {
            conversation: conversation.clone(),
            response_schema: shape.response_schema(),
            system_instruction: system_instruction.map(str::to_string),
        };
        let raw = self.backend.generate(&request).await?;
        let value = shape.parse_value(&raw).map_err(|err| {
            warn!(error = %err, raw_len = raw.len(), "model output rejected by shape");
            ModelError::from(err)
        })?;
        debug!("model output validated");
        Ok(value)
    }

    /// Generate, validate and decode into `T`.
    pub async fn generate<T: DeserializeOwned>(
        &self,
        conversation: &Conversation,
        shape: &TargetShape,
        system_instruction: Option<&str>,
    ) -> Result<T, ModelError> {
        let value = self
            .generate_value(conversation, shape, system_instruction)
            .await?;
        Ok(shape.decode(value)?)
    }
}
