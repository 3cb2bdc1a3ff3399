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

use crate::config::Config;
use crate::llm::OllamaProvider;
use crate::store::graph::Neo4jHttpClient;
use crate::store::vector::ChromaClient;
use anyhow::Result;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

/// Process-wide backend handles, initialized once at startup and shared by
/// every request. Each handle is stateless per call or provides its own
/// session-level isolation, so no extra locking is needed.
#[derive(Clone)]
pub struct AppState {
	pub config: Arc<Config>,
	pub llm: Arc<OllamaProvider>,
	pub graph: Arc<Neo4jHttpClient>,
	pub vectors: Arc<ChromaClient>,
}

impl AppState {
	pub fn initialize(config: Config) -> Result<Self> {
		let llm = Arc::new(OllamaProvider::new(&config.ollama)?);
		let graph = Arc::new(Neo4jHttpClient::new(&config.neo4j)?);
		let vectors = Arc::new(ChromaClient::new(&config.chroma, llm.clone())?);
		Ok(Self {
			config: Arc::new(config),
			llm,
			graph,
			vectors,
		})
	}
}

#[derive(Default)]
pub struct IngestState {
	pub current_directory: PathBuf,
	pub parsed_files: usize,
	pub namespace_count: usize,
	pub class_count: usize,
	pub method_count: usize,
	pub chunk_count: usize,
	pub ingest_complete: bool,
	pub status_message: String,
}

pub type SharedIngestState = Arc<RwLock<IngestState>>;

pub fn create_ingest_state() -> SharedIngestState {
	Arc::new(RwLock::new(IngestState::default()))
}
