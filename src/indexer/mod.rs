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

//! Ingestion pipeline: walk a legacy source tree, extract structural
//! entities, upsert them into the code graph and index method chunks into
//! the vector store.

pub mod chunker;
pub mod extractor;

use crate::constants::SOURCE_EXTENSION;
use crate::state::{AppState, SharedIngestState};
use crate::store::graph::GraphLoader;
use crate::store::vector::{DocumentChunk, VectorIndex};
use anyhow::Result;
use extractor::{CSharpExtractor, SourceEntities};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestReport {
	pub files: usize,
	pub namespaces: usize,
	pub classes: usize,
	pub methods: usize,
	pub chunks: usize,
}

/// All source files with the legacy extension under `dir`, in file-system
/// traversal order.
pub fn collect_source_files(dir: &Path) -> Vec<PathBuf> {
	let mut files = Vec::new();
	let walker = ignore::WalkBuilder::new(dir).follow_links(false).build();
	for entry in walker.flatten() {
		let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
		if is_file
			&& entry
				.path()
				.extension()
				.and_then(|ext| ext.to_str())
				.is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
		{
			files.push(entry.into_path());
		}
	}
	files
}

/// Extract structural entities from every source file under `dir`.
pub fn extract_directory(dir: &Path, progress: &SharedIngestState) -> Result<SourceEntities> {
	let mut extractor = CSharpExtractor::new()?;
	let mut entities = SourceEntities::default();

	for path in collect_source_files(dir) {
		let code = match std::fs::read_to_string(&path) {
			Ok(code) => code,
			Err(e) => {
				warn!(path = %path.display(), error = %e, "skipping unreadable file");
				continue;
			}
		};

		debug!(path = %path.display(), "parsing source file");
		let file_entities = extractor.extract_source(&path.display().to_string(), &code)?;
		entities.merge(file_entities);

		let mut state = progress.write();
		state.parsed_files += 1;
		state.status_message = format!("Parsed {}", path.display());
	}

	Ok(entities)
}

/// Chunk every method body for vector indexing. Chunk ids are derived from
/// content so re-ingestion overwrites instead of accumulating duplicates.
pub fn build_chunks(entities: &SourceEntities, chunk_size: usize, chunk_overlap: usize) -> Vec<DocumentChunk> {
	let mut chunks = Vec::new();
	for method in &entities.methods {
		for (i, piece) in chunker::chunk_text(&method.code, chunk_size, chunk_overlap)
			.into_iter()
			.enumerate()
		{
			chunks.push(DocumentChunk {
				id: chunk_id(&method.class_name, &method.name, i, &piece),
				content: piece,
				method_name: method.name.clone(),
				class_name: method.class_name.clone(),
			});
		}
	}
	chunks
}

fn chunk_id(class_name: &str, method_name: &str, index: usize, content: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(class_name.as_bytes());
	hasher.update(b"\0");
	hasher.update(method_name.as_bytes());
	hasher.update(b"\0");
	hasher.update(index.to_le_bytes());
	hasher.update(b"\0");
	hasher.update(content.as_bytes());
	format!("{:x}", hasher.finalize())[..32].to_string()
}

/// Run the full batch ingestion pass against both stores.
pub async fn ingest_directory(
	state: &AppState,
	progress: &SharedIngestState,
	dir: &Path,
) -> Result<IngestReport> {
	info!(dir = %dir.display(), "starting ingestion");
	progress.write().current_directory = dir.to_path_buf();

	let entities = extract_directory(dir, progress)?;
	{
		let mut state = progress.write();
		state.namespace_count = entities.namespaces.len();
		state.class_count = entities.classes.len();
		state.method_count = entities.methods.len();
		state.status_message = "Loading code graph".to_string();
	}

	let loader = GraphLoader::new(&state.graph, state.config.index.graph_batch_size);
	let graph_stats = loader.load(&entities).await?;

	let chunks = build_chunks(
		&entities,
		state.config.index.chunk_size,
		state.config.index.chunk_overlap,
	);
	{
		let mut state = progress.write();
		state.chunk_count = chunks.len();
		state.status_message = "Embedding method chunks".to_string();
	}
	state.vectors.add(&chunks).await?;

	let report = IngestReport {
		files: progress.read().parsed_files,
		namespaces: graph_stats.namespaces,
		classes: graph_stats.classes,
		methods: graph_stats.methods,
		chunks: chunks.len(),
	};

	let mut done = progress.write();
	done.ingest_complete = true;
	done.status_message = "Ingestion complete".to_string();
	info!(
		files = report.files,
		chunks = report.chunks,
		"ingestion finished"
	);
	Ok(report)
}
