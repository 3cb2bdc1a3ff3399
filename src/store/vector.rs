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

//! Chroma vector index access: text-in, ranked-documents-out with optional
//! metadata filtering. Embeddings come from the configured provider.

use crate::config::ChromaConfig;
use crate::llm::EmbeddingProvider;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

/// Documents uploaded to the index per add request
const ADD_BATCH_SIZE: usize = 64;

/// A chunk of method source queued for indexing.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
	pub id: String,
	pub content: String,
	pub method_name: String,
	pub class_name: String,
}

/// A ranked similarity-search hit.
#[derive(Debug, Clone, Default)]
pub struct ScoredDocument {
	pub content: String,
	pub metadata: HashMap<String, String>,
	pub distance: Option<f32>,
}

/// Structured metadata predicate: `$in` over a single key, composable with
/// `$and` / `$or`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataFilter {
	In { key: String, values: Vec<String> },
	And(Vec<MetadataFilter>),
	Or(Vec<MetadataFilter>),
}

impl MetadataFilter {
	pub fn any_of(key: &str, values: &[String]) -> Self {
		Self::In {
			key: key.to_string(),
			values: values.to_vec(),
		}
	}

	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Self::In { key, values } => json!({ key: { "$in": values } }),
			Self::And(parts) => {
				json!({ "$and": parts.iter().map(Self::to_json).collect::<Vec<_>>() })
			}
			Self::Or(parts) => {
				json!({ "$or": parts.iter().map(Self::to_json).collect::<Vec<_>>() })
			}
		}
	}
}

/// Text-in, ranked-documents-out interface to the vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
	async fn similarity_search(
		&self,
		text: &str,
		k: usize,
		filter: Option<&MetadataFilter>,
	) -> Result<Vec<ScoredDocument>>;

	async fn add(&self, chunks: &[DocumentChunk]) -> Result<()>;
}

pub struct ChromaClient {
	client: Client,
	base_url: String,
	collection: String,
	embedder: Arc<dyn EmbeddingProvider>,
	collection_id: OnceCell<String>,
}

#[derive(Deserialize)]
struct CollectionResponse {
	id: String,
}

#[derive(Deserialize)]
struct QueryResponse {
	documents: Option<Vec<Vec<Option<String>>>>,
	metadatas: Option<Vec<Vec<Option<HashMap<String, serde_json::Value>>>>>,
	distances: Option<Vec<Vec<Option<f32>>>>,
}

impl ChromaClient {
	pub fn new(config: &ChromaConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_secs(config.timeout))
			.build()?;
		Ok(Self {
			client,
			base_url: config.base_url.trim_end_matches('/').to_string(),
			collection: config.collection.clone(),
			embedder,
			collection_id: OnceCell::new(),
		})
	}

	/// Resolve (and lazily create) the collection, caching its id.
	async fn collection_id(&self) -> Result<&str> {
		let id = self
			.collection_id
			.get_or_try_init(|| async {
				let response = self
					.client
					.post(format!("{}/api/v1/collections", self.base_url))
					.json(&json!({
						"name": self.collection,
						"get_or_create": true,
						"metadata": { "hnsw:space": "cosine" }
					}))
					.send()
					.await?;

				if !response.status().is_success() {
					let status = response.status();
					let error_text = response
						.text()
						.await
						.unwrap_or_else(|_| "Unable to read error response".to_string());
					return Err(anyhow::anyhow!(
						"Chroma collection error: {} - {}",
						status,
						error_text
					));
				}

				let parsed = response.json::<CollectionResponse>().await?;
				Ok::<String, anyhow::Error>(parsed.id)
			})
			.await?;
		Ok(id.as_str())
	}
}

#[async_trait]
impl VectorIndex for ChromaClient {
	async fn similarity_search(
		&self,
		text: &str,
		k: usize,
		filter: Option<&MetadataFilter>,
	) -> Result<Vec<ScoredDocument>> {
		let collection_id = self.collection_id().await?;
		let embedding = self.embedder.embed(text).await?;

		let mut request_body = json!({
			"query_embeddings": [embedding],
			"n_results": k,
			"include": ["documents", "metadatas", "distances"]
		});
		if let Some(filter) = filter {
			request_body["where"] = filter.to_json();
		}

		debug!(k, filtered = filter.is_some(), "querying vector index");

		let response = self
			.client
			.post(format!(
				"{}/api/v1/collections/{}/query",
				self.base_url, collection_id
			))
			.json(&request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			let status = response.status();
			let error_text = response
				.text()
				.await
				.unwrap_or_else(|_| "Unable to read error response".to_string());
			return Err(anyhow::anyhow!("Chroma query error: {} - {}", status, error_text));
		}

		let parsed = response.json::<QueryResponse>().await?;
		Ok(first_query_batch(parsed))
	}

	async fn add(&self, chunks: &[DocumentChunk]) -> Result<()> {
		let collection_id = self.collection_id().await?.to_string();

		for batch in chunks.chunks(ADD_BATCH_SIZE) {
			let mut ids = Vec::with_capacity(batch.len());
			let mut embeddings = Vec::with_capacity(batch.len());
			let mut metadatas = Vec::with_capacity(batch.len());
			let mut documents = Vec::with_capacity(batch.len());

			for chunk in batch {
				ids.push(chunk.id.clone());
				embeddings.push(self.embedder.embed(&chunk.content).await?);
				metadatas.push(json!({
					"method_name": chunk.method_name,
					"class_name": chunk.class_name,
				}));
				documents.push(chunk.content.clone());
			}

			let response = self
				.client
				.post(format!(
					"{}/api/v1/collections/{}/add",
					self.base_url, collection_id
				))
				.json(&json!({
					"ids": ids,
					"embeddings": embeddings,
					"metadatas": metadatas,
					"documents": documents,
				}))
				.send()
				.await?;

			if !response.status().is_success() {
				let status = response.status();
				let error_text = response
					.text()
					.await
					.unwrap_or_else(|_| "Unable to read error response".to_string());
				return Err(anyhow::anyhow!("Chroma add error: {} - {}", status, error_text));
			}
		}

		Ok(())
	}
}

/// Flatten the first (and only) query batch into scored documents.
fn first_query_batch(response: QueryResponse) -> Vec<ScoredDocument> {
	let documents = response
		.documents
		.and_then(|mut batches| if batches.is_empty() { None } else { Some(batches.remove(0)) })
		.unwrap_or_default();
	let mut metadatas = response
		.metadatas
		.and_then(|mut batches| if batches.is_empty() { None } else { Some(batches.remove(0)) })
		.unwrap_or_default();
	let mut distances = response
		.distances
		.and_then(|mut batches| if batches.is_empty() { None } else { Some(batches.remove(0)) })
		.unwrap_or_default();

	let mut results = Vec::with_capacity(documents.len());
	for (i, content) in documents.into_iter().enumerate() {
		let metadata = if i < metadatas.len() {
			metadatas[i].take().unwrap_or_default()
		} else {
			HashMap::new()
		};
		let metadata = metadata
			.into_iter()
			.map(|(key, value)| {
				let text = match value {
					serde_json::Value::String(text) => text,
					other => other.to_string(),
				};
				(key, text)
			})
			.collect();

		let distance = if i < distances.len() {
			distances[i].take()
		} else {
			None
		};

		results.push(ScoredDocument {
			content: content.unwrap_or_default(),
			metadata,
			distance,
		});
	}
	results
}
