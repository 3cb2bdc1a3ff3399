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

//! Question answering pipeline: graph retrieval feeds vector retrieval,
//! both contexts feed the answer model.

pub mod context;
pub mod graph_search;
pub mod vector_search;

mod tests;

pub use graph_search::GraphRetriever;
pub use vector_search::EnhancedVectorRetriever;

use crate::constants::FINAL_RESPONSE_PROMPT;
use crate::llm::{ChatMessage, ChatProvider};
use crate::state::AppState;
use crate::store::{GraphDatabase, GraphRow, VectorIndex};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// One question's worth of pipeline state. Instances are per-request; the
/// backend handles they borrow are process-wide.
pub struct QueryPipeline {
	graph: Arc<dyn GraphDatabase>,
	vectors: Arc<dyn VectorIndex>,
	llm: Arc<dyn ChatProvider>,
	synthesis_model: String,
	answer_model: String,
	vector_k: usize,
	refinement: bool,
}

impl QueryPipeline {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		graph: Arc<dyn GraphDatabase>,
		vectors: Arc<dyn VectorIndex>,
		llm: Arc<dyn ChatProvider>,
		synthesis_model: impl Into<String>,
		answer_model: impl Into<String>,
		vector_k: usize,
		refinement: bool,
	) -> Self {
		Self {
			graph,
			vectors,
			llm,
			synthesis_model: synthesis_model.into(),
			answer_model: answer_model.into(),
			vector_k,
			refinement,
		}
	}

	pub fn from_state(state: &AppState) -> Self {
		Self::new(
			state.graph.clone(),
			state.vectors.clone(),
			state.llm.clone(),
			state.config.synthesis_model(),
			state.config.answer_model(),
			state.config.search.vector_k,
			state.config.search.refinement,
		)
	}

	/// Answer a question. Both retrieval stages degrade to empty context on
	/// failure; only the final answer-model call can fail this method.
	pub async fn answer(&self, question: &str) -> Result<String> {
		info!(question, "processing question");

		let mut retriever = GraphRetriever::new(
			self.graph.clone(),
			self.llm.clone(),
			self.synthesis_model.as_str(),
		);
		if !self.refinement {
			retriever = retriever.without_refinement();
		}
		let rows = retriever.fetch_related_code(question).await;
		debug!(rows = rows.len(), "graph retrieval finished");

		let (method_names, class_names, docstrings) = harvest_row_entities(&rows);
		let graph_context = context::assemble_graph_context(&rows);

		let vector_retriever = EnhancedVectorRetriever::new(self.vectors.clone());
		let (documents, enhanced_query) = vector_retriever
			.retrieve(question, &method_names, &class_names, &docstrings, self.vector_k)
			.await;
		debug!(
			documents = documents.len(),
			enhanced_query = %enhanced_query,
			"vector retrieval finished"
		);
		let vector_context = vector_search::format_results(&documents);

		let prompt = context::render_answer_prompt(
			FINAL_RESPONSE_PROMPT,
			&graph_context,
			&vector_context,
			question,
		);
		debug!(prompt_chars = prompt.chars().count(), "requesting final answer");

		self.llm
			.chat(&self.answer_model, &[ChatMessage::user(prompt)])
			.await
	}
}

/// Pull method names, class names and docstrings out of graph rows, keyed
/// by the aliases the synthesis prompt asks for.
pub fn harvest_row_entities(rows: &[GraphRow]) -> (Vec<String>, Vec<String>, Vec<String>) {
	let mut method_names = Vec::new();
	let mut class_names = Vec::new();
	let mut docstrings = Vec::new();

	for row in rows {
		if let Some(Value::String(method)) = row.get("Method") {
			method_names.push(method.clone());
			if let Some(Value::String(documentation)) = row.get("Documentation") {
				docstrings.push(documentation.clone());
			}
		}
		if let Some(Value::String(class)) = row.get("Class") {
			class_names.push(class.clone());
		}
	}

	(method_names, class_names, docstrings)
}
