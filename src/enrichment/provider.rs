// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Inference provider abstraction.
//!
//! The pipeline only needs free-text completion: one prompt in, one raw
//! completion out. Normalization of whatever the model answers happens in
//! the enrichment engine, never here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::EnrichmentError;

#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Send one free-text prompt and return the raw completion.
    async fn complete(&self, prompt: &str) -> Result<String, EnrichmentError>;

    /// Provider name for display
    fn name(&self) -> &str;

    /// Model identifier for display
    fn model(&self) -> &str;
}

/// Ollama provider (local models).
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaProvider {
    pub fn new(
        base_url: Option<String>,
        model: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, EnrichmentError> {
        // Local models can be slow, hence the generous timeout.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".to_string()),
            model: model.unwrap_or_else(|| "phi:2.7b".to_string()),
            client,
        })
    }
}

#[async_trait]
impl InferenceProvider for OllamaProvider {
    async fn complete(&self, prompt: &str) -> Result<String, EnrichmentError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: GenerateResponse = response.json().await?;
        Ok(completion.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
