// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generative-model and embedding access via the Ollama HTTP API

use crate::config::OllamaConfig;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
	pub role: String,
	pub content: String,
}

impl ChatMessage {
	pub fn user(content: impl Into<String>) -> Self {
		Self {
			role: "user".to_string(),
			content: content.into(),
		}
	}
}

/// Prompt-in, text-out chat interface. Model selection is by name so one
/// provider can serve both the synthesis and the answer role.
#[async_trait]
pub trait ChatProvider: Send + Sync {
	async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// Text-in, vector-out embedding interface used by the vector index client.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
	async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Client for a local or remote Ollama server. Constructed once at startup
/// and cheaply cloned because `reqwest::Client` is an `Arc` internally.
pub struct OllamaProvider {
	client: Client,
	base_url: String,
	embedding_model: String,
}

impl OllamaProvider {
	pub fn new(config: &OllamaConfig) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_secs(config.timeout))
			.build()?;
		Ok(Self {
			client,
			base_url: config.base_url.trim_end_matches('/').to_string(),
			embedding_model: config.embedding_model.clone(),
		})
	}
}

#[derive(Deserialize)]
struct ChatResponse {
	message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
	content: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
	embedding: Vec<f32>,
}

#[async_trait]
impl ChatProvider for OllamaProvider {
	async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
		let request_body = json!({
			"model": model,
			"messages": messages,
			"stream": false
		});

		debug!(model, messages = messages.len(), "sending chat request");

		let response = self
			.client
			.post(format!("{}/api/chat", self.base_url))
			.json(&request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			let status = response.status();
			let error_text = response
				.text()
				.await
				.unwrap_or_else(|_| "Unable to read error response".to_string());
			return Err(anyhow::anyhow!("Ollama API error: {} - {}", status, error_text));
		}

		let parsed = response.json::<ChatResponse>().await?;
		if parsed.message.content.trim().is_empty() {
			return Err(anyhow::anyhow!("Ollama returned an empty completion"));
		}
		Ok(parsed.message.content)
	}
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
	async fn embed(&self, text: &str) -> Result<Vec<f32>> {
		let request_body = json!({
			"model": self.embedding_model,
			"prompt": text
		});

		let response = self
			.client
			.post(format!("{}/api/embeddings", self.base_url))
			.json(&request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			let status = response.status();
			let error_text = response
				.text()
				.await
				.unwrap_or_else(|_| "Unable to read error response".to_string());
			return Err(anyhow::anyhow!(
				"Ollama embeddings error: {} - {}",
				status,
				error_text
			));
		}

		let parsed = response.json::<EmbeddingResponse>().await?;
		if parsed.embedding.is_empty() {
			return Err(anyhow::anyhow!("Ollama returned an empty embedding"));
		}
		Ok(parsed.embedding)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_chat_message_serialization() {
		let message = ChatMessage::user("hello");
		let value = serde_json::to_value(&message).unwrap();
		assert_eq!(value["role"], "user");
		assert_eq!(value["content"], "hello");
	}

	#[test]
	fn test_provider_trims_trailing_slash() {
		let config = OllamaConfig {
			base_url: "http://localhost:11434/".to_string(),
			..OllamaConfig::default()
		};
		let provider = OllamaProvider::new(&config).unwrap();
		assert_eq!(provider.base_url, "http://localhost:11434");
	}
}
