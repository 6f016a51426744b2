use crate::config::AppConfig;
use crate::error::{DecoderError, Result};
use crate::llm::types::*;
use crate::report::{CompletionRequest, CompletionService};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    pub(crate) async fn generate_content(
        &self,
        model: &str,
        payload: &GenerateContentRequest,
    ) -> Result<String> {
        let res = self
            .client
            .post(self.endpoint(model))
            .json(payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(DecoderError::CompletionFailed(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;
        extract_text(body)
    }
}

pub(crate) fn build_request(request: &CompletionRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(request.prompt.clone())],
        system_instruction: request
            .system_instruction
            .as_ref()
            .map(|text| Content::system(text.clone())),
        generation_config: GenerationConfig {
            temperature: request.temperature,
        },
    }
}

pub(crate) fn extract_text(body: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(DecoderError::CompletionFailed(format!(
            "Prompt was blocked: {}",
            reason
        )));
    }

    let candidate = body
        .candidates
        .ok_or_else(|| DecoderError::CompletionFailed("No candidates returned".to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| DecoderError::CompletionFailed("Empty candidates list".to_string()))?;

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "unknown".to_string());
        return Err(DecoderError::CompletionFailed(format!(
            "Model returned no text (finish reason: {})",
            reason
        )));
    }

    Ok(text)
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        debug!("Calling Gemini model {}", request.model);
        let payload = build_request(request);
        self.generate_content(&request.model, &payload).await
    }
}
