use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::error::{DecoderError, Result};
use crate::prompts::{
    ComposedPrompt, PromptScope, SYSTEM_INSTRUCTION_DIAGNOSIS, SYSTEM_INSTRUCTION_STATEMENT,
};

/// Low temperature for single statements, favouring repeatable analyses.
pub const STATEMENT_TEMPERATURE: f32 = 0.3;

/// Higher temperature for the persona-driven diagnosis, favouring richer narrative.
pub const DIAGNOSIS_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub system_instruction: Option<String>,
}

/// A hosted text-completion endpoint. One call per request, no streaming.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for std::sync::Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request).await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    pub scope: PromptScope,
    pub model: String,
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

impl PromptScope {
    pub fn temperature(&self) -> f32 {
        match self {
            PromptScope::Statement(_) => STATEMENT_TEMPERATURE,
            PromptScope::FullDiagnosis => DIAGNOSIS_TEMPERATURE,
        }
    }

    pub fn system_instruction(&self) -> &'static str {
        match self {
            PromptScope::Statement(_) => SYSTEM_INSTRUCTION_STATEMENT,
            PromptScope::FullDiagnosis => SYSTEM_INSTRUCTION_DIAGNOSIS,
        }
    }
}

pub struct ReportGenerator<S> {
    service: S,
    model: String,
}

impl<S: CompletionService> ReportGenerator<S> {
    pub fn new(service: S, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn request_for(&self, prompt: &ComposedPrompt) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            prompt: prompt.text.clone(),
            temperature: prompt.scope.temperature(),
            system_instruction: Some(prompt.scope.system_instruction().to_string()),
        }
    }

    /// Sends the prompt once. Any service error comes back as
    /// `CompletionFailed`; nothing is retried.
    pub async fn generate(&self, prompt: &ComposedPrompt) -> Result<GeneratedReport> {
        let request = self.request_for(prompt);
        info!(
            "Requesting {:?} report from {} (temperature {})",
            prompt.scope, self.model, request.temperature
        );
        debug!("Prompt is {} characters", request.prompt.len());

        let text = self
            .service
            .complete(&request)
            .await
            .map_err(|e| match e {
                DecoderError::CompletionFailed(msg) => DecoderError::CompletionFailed(msg),
                other => DecoderError::CompletionFailed(other.to_string()),
            })?;

        if text.trim().is_empty() {
            return Err(DecoderError::CompletionFailed(
                "Model returned an empty response".to_string(),
            ));
        }

        Ok(GeneratedReport {
            scope: prompt.scope,
            model: self.model.clone(),
            text,
            generated_at: Utc::now(),
        })
    }
}
