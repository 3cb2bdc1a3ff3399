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

#[cfg(test)]
mod pipeline_tests {
	use crate::llm::{ChatMessage, ChatProvider};
	use crate::search::vector_search::EnhancedVectorRetriever;
	use crate::search::{GraphRetriever, QueryPipeline};
	use crate::store::vector::{DocumentChunk, MetadataFilter, ScoredDocument, VectorIndex};
	use crate::store::{GraphDatabase, GraphRow};
	use anyhow::Result;
	use async_trait::async_trait;
	use serde_json::json;
	use std::collections::{HashMap, VecDeque};
	use std::sync::{Arc, Mutex};

	const VALID_QUERY: &str = "MATCH (m:Method) WHERE toLower(m.name) CONTAINS toLower(\"option\") RETURN m.name AS Method LIMIT 10";
	const OTHER_VALID_QUERY: &str = "MATCH (c:Class)-[:CONTAINS]->(m:Method) WHERE toLower(m.docstring) CONTAINS toLower(\"price\") RETURN c.name AS Class, m.name AS Method LIMIT 10";

	/// Chat provider that replays canned replies and records every prompt.
	struct ScriptedChat {
		replies: Mutex<VecDeque<Result<String, String>>>,
		prompts: Mutex<Vec<String>>,
	}

	impl ScriptedChat {
		fn new(replies: Vec<Result<String, String>>) -> Arc<Self> {
			Arc::new(Self {
				replies: Mutex::new(replies.into_iter().collect()),
				prompts: Mutex::new(Vec::new()),
			})
		}

		fn prompts(&self) -> Vec<String> {
			self.prompts.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl ChatProvider for ScriptedChat {
		async fn chat(&self, _model: &str, messages: &[ChatMessage]) -> Result<String> {
			let prompt = messages
				.last()
				.map(|message| message.content.clone())
				.unwrap_or_default();
			self.prompts.lock().unwrap().push(prompt);

			match self.replies.lock().unwrap().pop_front() {
				Some(Ok(reply)) => Ok(reply),
				Some(Err(error)) => Err(anyhow::anyhow!(error)),
				None => Err(anyhow::anyhow!("no scripted reply left")),
			}
		}
	}

	/// Graph backend that replays canned row sets and records every query.
	struct ScriptedGraph {
		results: Mutex<VecDeque<Result<Vec<GraphRow>, String>>>,
		queries: Mutex<Vec<String>>,
	}

	impl ScriptedGraph {
		fn new(results: Vec<Result<Vec<GraphRow>, String>>) -> Arc<Self> {
			Arc::new(Self {
				results: Mutex::new(results.into_iter().collect()),
				queries: Mutex::new(Vec::new()),
			})
		}

		fn queries(&self) -> Vec<String> {
			self.queries.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl GraphDatabase for ScriptedGraph {
		async fn run(&self, cypher: &str) -> Result<Vec<GraphRow>> {
			self.queries.lock().unwrap().push(cypher.to_string());
			match self.results.lock().unwrap().pop_front() {
				Some(Ok(rows)) => Ok(rows),
				Some(Err(error)) => Err(anyhow::anyhow!(error)),
				None => Ok(Vec::new()),
			}
		}
	}

	/// Vector index whose strict AND filter matches nothing but whose OR
	/// relaxation matches one document.
	struct LadderIndex {
		document: ScoredDocument,
	}

	#[async_trait]
	impl VectorIndex for LadderIndex {
		async fn similarity_search(
			&self,
			_text: &str,
			_k: usize,
			filter: Option<&MetadataFilter>,
		) -> Result<Vec<ScoredDocument>> {
			match filter {
				Some(MetadataFilter::And(_)) => Ok(Vec::new()),
				Some(MetadataFilter::Or(_)) => Ok(vec![self.document.clone()]),
				_ => Ok(Vec::new()),
			}
		}

		async fn add(&self, _chunks: &[DocumentChunk]) -> Result<()> {
			Ok(())
		}
	}

	/// Vector index that returns the same documents for every search.
	struct StaticIndex {
		documents: Vec<ScoredDocument>,
	}

	#[async_trait]
	impl VectorIndex for StaticIndex {
		async fn similarity_search(
			&self,
			_text: &str,
			_k: usize,
			_filter: Option<&MetadataFilter>,
		) -> Result<Vec<ScoredDocument>> {
			Ok(self.documents.clone())
		}

		async fn add(&self, _chunks: &[DocumentChunk]) -> Result<()> {
			Ok(())
		}
	}

	/// Vector index where any filtered search errors out.
	struct FilterRejectingIndex {
		documents: Vec<ScoredDocument>,
	}

	#[async_trait]
	impl VectorIndex for FilterRejectingIndex {
		async fn similarity_search(
			&self,
			_text: &str,
			_k: usize,
			filter: Option<&MetadataFilter>,
		) -> Result<Vec<ScoredDocument>> {
			if filter.is_some() {
				return Err(anyhow::anyhow!("filter predicate not supported"));
			}
			Ok(self.documents.clone())
		}

		async fn add(&self, _chunks: &[DocumentChunk]) -> Result<()> {
			Ok(())
		}
	}

	fn row(pairs: &[(&str, &str)]) -> GraphRow {
		pairs
			.iter()
			.map(|(key, value)| (key.to_string(), json!(value)))
			.collect()
	}

	fn code_document() -> ScoredDocument {
		ScoredDocument {
			content: "public double Calculate(double strike) { return strike * 2.0; }".to_string(),
			metadata: HashMap::from([
				("method_name".to_string(), "Calculate".to_string()),
				("class_name".to_string(), "OptionPricing".to_string()),
			]),
			distance: Some(0.12),
		}
	}

	#[tokio::test]
	async fn test_and_filter_relaxes_to_or() {
		let retriever = EnhancedVectorRetriever::new(Arc::new(LadderIndex {
			document: code_document(),
		}));

		let (documents, _) = retriever
			.retrieve(
				"How does OptionPricing work?",
				&["Calculate".to_string()],
				&["OptionPricing".to_string()],
				&[],
				5,
			)
			.await;

		assert_eq!(documents.len(), 1);
		assert_eq!(documents[0].metadata["method_name"], "Calculate");
	}

	#[tokio::test]
	async fn test_filter_errors_fall_back_to_unfiltered() {
		let retriever = EnhancedVectorRetriever::new(Arc::new(FilterRejectingIndex {
			documents: vec![code_document()],
		}));

		let (documents, _) = retriever
			.retrieve("question", &["Calculate".to_string()], &[], &[], 5)
			.await;

		assert_eq!(documents.len(), 1);
	}

	#[tokio::test]
	async fn test_refinement_never_replaces_rows_with_nothing() {
		// Initial rows exist but overlap the question poorly; the refined
		// query runs and finds nothing, so the initial rows win.
		let initial_rows = vec![row(&[("Method", "WriteLine"), ("Class", "Logger")])];
		let graph = ScriptedGraph::new(vec![Ok(initial_rows.clone()), Ok(Vec::new())]);
		let llm = ScriptedChat::new(vec![
			Ok(VALID_QUERY.to_string()),
			Ok(OTHER_VALID_QUERY.to_string()),
		]);

		let retriever = GraphRetriever::new(graph.clone(), llm, "test-model");
		let rows = retriever.fetch_related_code("how does option pricing work").await;

		assert_eq!(rows, initial_rows);
		assert_eq!(graph.queries().len(), 2);
	}

	#[tokio::test]
	async fn test_refinement_runs_on_empty_initial_rows() {
		let refined_rows = vec![row(&[("Method", "Calculate")])];
		let graph = ScriptedGraph::new(vec![Ok(Vec::new()), Ok(refined_rows.clone())]);
		let llm = ScriptedChat::new(vec![
			Ok(VALID_QUERY.to_string()),
			Ok(OTHER_VALID_QUERY.to_string()),
		]);

		let retriever = GraphRetriever::new(graph.clone(), llm.clone(), "test-model");
		let rows = retriever.fetch_related_code("how does option pricing work").await;

		assert_eq!(rows, refined_rows);
		// The refinement prompt carries the question and the prior query.
		let refinement_prompt = &llm.prompts()[1];
		assert!(refinement_prompt.contains("how does option pricing work"));
		assert!(refinement_prompt.contains(VALID_QUERY));
		assert!(refinement_prompt.contains("0 rows"));
	}

	#[tokio::test]
	async fn test_identical_refinement_is_rejected() {
		let graph = ScriptedGraph::new(vec![Ok(Vec::new())]);
		let llm = ScriptedChat::new(vec![
			Ok(VALID_QUERY.to_string()),
			Ok(VALID_QUERY.to_string()),
		]);

		let retriever = GraphRetriever::new(graph.clone(), llm, "test-model");
		let rows = retriever.fetch_related_code("how does option pricing work").await;

		assert!(rows.is_empty());
		assert_eq!(graph.queries().len(), 1);
	}

	#[tokio::test]
	async fn test_good_overlap_skips_refinement() {
		let rows = vec![row(&[
			("Method", "calculate option pricing"),
			("Class", "OptionPricing"),
		])];
		let graph = ScriptedGraph::new(vec![Ok(rows.clone())]);
		let llm = ScriptedChat::new(vec![Ok(VALID_QUERY.to_string())]);

		let retriever = GraphRetriever::new(graph.clone(), llm.clone(), "test-model");
		let fetched = retriever.fetch_related_code("calculate option pricing").await;

		assert_eq!(fetched, rows);
		assert_eq!(graph.queries().len(), 1);
		assert_eq!(llm.prompts().len(), 1);
	}

	#[tokio::test]
	async fn test_synthesis_failure_uses_fallback_template() {
		let rows = vec![row(&[("Method", "calculate option pricing details")])];
		let graph = ScriptedGraph::new(vec![Ok(rows.clone())]);
		let llm = ScriptedChat::new(vec![Err("model unreachable".to_string())]);

		let retriever = GraphRetriever::new(graph.clone(), llm, "test-model");
		let fetched = retriever.fetch_related_code("calculate option pricing details").await;

		assert_eq!(fetched, rows);
		let queries = graph.queries();
		assert!(queries[0].contains("toLower(m.name) CONTAINS toLower(\"calculate\")"));
		assert!(queries[0].contains("LIMIT 50"));
	}

	#[tokio::test]
	async fn test_failed_execution_retries_with_degraded_query() {
		let rows = vec![row(&[("Method", "calculate option pricing details")])];
		let graph = ScriptedGraph::new(vec![Err("connection reset".to_string()), Ok(rows.clone())]);
		let llm = ScriptedChat::new(vec![Ok(VALID_QUERY.to_string())]);

		let retriever = GraphRetriever::new(graph.clone(), llm, "test-model");
		let fetched = retriever.fetch_related_code("calculate option pricing details").await;

		assert_eq!(fetched, rows);
		let queries = graph.queries();
		assert_eq!(queries.len(), 2);
		assert!(queries[1].contains("toLower(\"code\")"));
	}

	#[tokio::test]
	async fn test_everything_failing_degrades_to_empty() {
		let graph = ScriptedGraph::new(vec![
			Err("down".to_string()),
			Err("still down".to_string()),
			Err("down".to_string()),
			Err("still down".to_string()),
		]);
		let llm = ScriptedChat::new(vec![
			Err("model down".to_string()),
			Err("model down".to_string()),
		]);

		let retriever = GraphRetriever::new(graph, llm, "test-model");
		let rows = retriever.fetch_related_code("anything at all").await;
		assert!(rows.is_empty());
	}

	#[tokio::test]
	async fn test_pipeline_end_to_end() {
		let graph = ScriptedGraph::new(vec![Ok(vec![row(&[
			("Namespace", "Pricing"),
			("Class", "OptionPricing"),
			("Method", "Calculate"),
		])])]);
		let vectors = Arc::new(StaticIndex {
			documents: vec![code_document()],
		});
		let llm = ScriptedChat::new(vec![
			Ok(VALID_QUERY.to_string()),
			Ok("The Calculate method doubles the strike.".to_string()),
		]);

		let pipeline = QueryPipeline::new(
			graph,
			vectors,
			llm.clone(),
			"synthesis-model",
			"answer-model",
			7,
			false,
		);
		let answer = pipeline.answer("How does OptionPricing work?").await.unwrap();
		assert_eq!(answer, "The Calculate method doubles the strike.");

		let prompts = llm.prompts();
		assert_eq!(prompts.len(), 2);
		let final_prompt = &prompts[1];
		assert!(final_prompt.contains("Method: Calculate"));
		assert!(final_prompt.contains("Method: Calculate | Class: OptionPricing"));
		assert!(final_prompt.contains("public double Calculate(double strike)"));
		assert!(final_prompt.contains("How does OptionPricing work?"));
	}

	#[tokio::test]
	async fn test_pipeline_answer_fails_only_on_answer_model() {
		let graph = ScriptedGraph::new(vec![Err("graph down".to_string()), Err("graph down".to_string())]);
		let vectors = Arc::new(FilterRejectingIndex { documents: vec![] });
		let llm = ScriptedChat::new(vec![
			Err("synthesis down".to_string()),
			Err("answer model down".to_string()),
		]);

		let pipeline = QueryPipeline::new(
			graph,
			vectors,
			llm,
			"synthesis-model",
			"answer-model",
			7,
			false,
		);
		let error = pipeline.answer("question").await.unwrap_err();
		assert!(error.to_string().contains("answer model down"));
	}
}
