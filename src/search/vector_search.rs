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

//! Semantic retrieval enriched with structural hits: the vector query is
//! the question plus method/class names and leading docstring sentences,
//! and metadata filters narrow the search with a defined fallback ladder.

use crate::constants::{
	DOCSTRING_SENTENCE_MAX_CHARS, ENHANCEMENT_MAX_CHARS, SNIPPET_MAX_CHARS,
	SNIPPET_TRUNCATION_MARKER, VECTOR_SNIPPET_SEPARATOR,
};
use crate::store::vector::{MetadataFilter, ScoredDocument, VectorIndex};
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct EnhancedVectorRetriever {
	index: Arc<dyn VectorIndex>,
}

impl EnhancedVectorRetriever {
	pub fn new(index: Arc<dyn VectorIndex>) -> Self {
		Self { index }
	}

	/// Retrieve up to `k` documents for the question, enriched and filtered
	/// with the structural hits. Returns the documents and the enhanced
	/// query text that was searched.
	pub async fn retrieve(
		&self,
		question: &str,
		method_names: &[String],
		class_names: &[String],
		docstrings: &[String],
		k: usize,
	) -> (Vec<ScoredDocument>, String) {
		let enhanced_query = build_enhanced_query(question, method_names, class_names, docstrings);
		info!(enhanced_query = %enhanced_query, "running vector search");

		let documents = self
			.retrieve_with_filters(&enhanced_query, method_names, class_names, k)
			.await;
		info!(documents = documents.len(), "vector search finished");
		(documents, enhanced_query)
	}

	/// Pick the filter for the available structural hits. Filtered searches
	/// that error fall back to an unfiltered search with the same query.
	async fn retrieve_with_filters(
		&self,
		query: &str,
		method_names: &[String],
		class_names: &[String],
		k: usize,
	) -> Vec<ScoredDocument> {
		let filtered = match (method_names.is_empty(), class_names.is_empty()) {
			(false, false) => self.search_and_or_ladder(query, method_names, class_names, k).await,
			(false, true) => {
				let filter = MetadataFilter::any_of("method_name", method_names);
				self.index.similarity_search(query, k, Some(&filter)).await
			}
			(true, false) => {
				let filter = MetadataFilter::any_of("class_name", class_names);
				self.index.similarity_search(query, k, Some(&filter)).await
			}
			(true, true) => self.index.similarity_search(query, k, None).await,
		};

		match filtered {
			Ok(documents) => documents,
			Err(e) => {
				warn!(error = %e, "filtered vector search failed, falling back to unfiltered");
				match self.index.similarity_search(query, k, None).await {
					Ok(documents) => documents,
					Err(e) => {
						error!(error = %e, "unfiltered vector search failed");
						Vec::new()
					}
				}
			}
		}
	}

	/// Both name lists present: require method AND class to match, and
	/// relax to OR when the strict filter finds nothing.
	async fn search_and_or_ladder(
		&self,
		query: &str,
		method_names: &[String],
		class_names: &[String],
		k: usize,
	) -> Result<Vec<ScoredDocument>> {
		let and_filter = MetadataFilter::And(vec![
			MetadataFilter::any_of("method_name", method_names),
			MetadataFilter::any_of("class_name", class_names),
		]);
		let documents = self.index.similarity_search(query, k, Some(&and_filter)).await?;
		if !documents.is_empty() {
			return Ok(documents);
		}

		info!("strict metadata filter matched nothing, relaxing to OR");
		let or_filter = MetadataFilter::Or(vec![
			MetadataFilter::any_of("method_name", method_names),
			MetadataFilter::any_of("class_name", class_names),
		]);
		self.index.similarity_search(query, k, Some(&or_filter)).await
	}
}

/// Question plus deduplicated names and leading docstring sentences. The
/// appended portion is capped so the embedding input stays bounded.
pub fn build_enhanced_query(
	question: &str,
	method_names: &[String],
	class_names: &[String],
	docstrings: &[String],
) -> String {
	let mut seen: HashSet<String> = HashSet::new();
	let mut enhancements: Vec<String> = Vec::new();

	for name in method_names.iter().chain(class_names) {
		if name.is_empty() {
			continue;
		}
		if seen.insert(name.clone()) {
			enhancements.push(name.clone());
		}
	}

	for docstring in docstrings {
		if docstring.is_empty() {
			continue;
		}
		let first_sentence = docstring.split('.').next().unwrap_or(docstring);
		let lead = truncate_chars(first_sentence, DOCSTRING_SENTENCE_MAX_CHARS);
		if seen.insert(lead.clone()) {
			enhancements.push(lead);
		}
	}

	if enhancements.is_empty() {
		return question.to_string();
	}

	let appended = truncate_chars(&enhancements.join(" "), ENHANCEMENT_MAX_CHARS);
	format!("{} {}", question, appended)
}

/// Render ranked documents into the vector context block: a metadata prefix
/// per document, a hard length cap, and a fixed separator line.
pub fn format_results(documents: &[ScoredDocument]) -> String {
	let mut snippets = Vec::with_capacity(documents.len());

	for document in documents {
		let method = document
			.metadata
			.get("method_name")
			.map(String::as_str)
			.unwrap_or("Unknown");
		let class = document
			.metadata
			.get("class_name")
			.map(String::as_str)
			.unwrap_or("Unknown");

		let mut enriched = format!("Method: {} | Class: {}\n\n{}", method, class, document.content);
		if enriched.chars().count() > SNIPPET_MAX_CHARS {
			enriched = truncate_chars(&enriched, SNIPPET_MAX_CHARS);
			enriched.push_str(SNIPPET_TRUNCATION_MARKER);
		}
		snippets.push(enriched);
	}

	snippets.join(VECTOR_SNIPPET_SEPARATOR)
}

fn truncate_chars(text: &str, max: usize) -> String {
	if text.chars().count() <= max {
		text.to_string()
	} else {
		text.chars().take(max).collect()
	}
}
