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

//! Structural retrieval: synthesize a Cypher query from a natural-language
//! question (HyDE), validate and repair it, execute it with a degraded
//! retry, and refine it once when the first result set looks weak.

use crate::constants::{
	FALLBACK_ROW_LIMIT, HYDE_SYSTEM_PROMPT, OVERLAP_SAMPLE_ROWS, OVERLAP_THRESHOLD,
	REFINEMENT_PROMPT, REFINEMENT_SAMPLE_ROWS,
};
use crate::llm::{ChatMessage, ChatProvider};
use crate::store::{GraphDatabase, GraphRow};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const REQUIRED_KEYWORDS: [&str; 3] = ["MATCH", "RETURN", "LIMIT"];

/// Property names the schema does not have; models invent these regularly.
const INVALID_PROPERTIES: [&str; 5] = ["description", "comments", "content", "body", "type"];

lazy_static! {
	// `prop.name CONTAINS "literal"` (or STARTS WITH / ENDS WITH) with no
	// case folding. The leading character class keeps operands already
	// inside toLower(...) from matching again.
	static ref CASE_BLIND_COMPARISON: Regex = Regex::new(
		r#"(?i)(^|[^(\w])([A-Za-z_]\w*\.[A-Za-z_]\w*)\s+(CONTAINS|STARTS\s+WITH|ENDS\s+WITH)\s+("[^"]*"|'[^']*')"#
	)
	.unwrap();
}

pub struct GraphRetriever {
	graph: Arc<dyn GraphDatabase>,
	llm: Arc<dyn ChatProvider>,
	model: String,
	refinement_prompt: Option<String>,
}

impl GraphRetriever {
	pub fn new(graph: Arc<dyn GraphDatabase>, llm: Arc<dyn ChatProvider>, model: impl Into<String>) -> Self {
		Self {
			graph,
			llm,
			model: model.into(),
			refinement_prompt: Some(REFINEMENT_PROMPT.to_string()),
		}
	}

	/// Disable the second synthesis pass; the initial result set is final.
	pub fn without_refinement(mut self) -> Self {
		self.refinement_prompt = None;
		self
	}

	/// Fetch graph rows for a question. Degrades stage by stage: every
	/// failure falls back to the last successful result, bottoming out at
	/// an empty row set.
	pub async fn fetch_related_code(&self, question: &str) -> Vec<GraphRow> {
		let initial_query = self.generate_query(question).await;
		let initial_rows = self.execute_query(&initial_query).await;
		info!(rows = initial_rows.len(), "initial graph query executed");

		if !should_refine(question, &initial_rows) {
			return initial_rows;
		}

		let Some(refined_query) = self
			.refine_query(question, &initial_query, &initial_rows)
			.await
		else {
			return initial_rows;
		};

		info!(refined_query = %refined_query, "executing refined query");
		let refined_rows = self.execute_query(&refined_query).await;
		// A refinement that finds nothing never replaces non-empty results.
		if refined_rows.is_empty() {
			initial_rows
		} else {
			refined_rows
		}
	}

	/// Synthesize a Cypher query for the question. Always returns a
	/// non-empty, validator-passing query: generation or validation
	/// failures fall back to the deterministic keyword template.
	pub async fn generate_query(&self, question: &str) -> String {
		match self.synthesize(question).await {
			Ok(query) => {
				info!(query = %query, "synthesized graph query");
				query
			}
			Err(e) => {
				warn!(error = %e, "query synthesis failed, using fallback template");
				fallback_query(question)
			}
		}
	}

	async fn synthesize(&self, question: &str) -> anyhow::Result<String> {
		let prompt = format!("{}\n\nUser question: {}", HYDE_SYSTEM_PROMPT, question);
		let reply = self
			.llm
			.chat(&self.model, &[ChatMessage::user(prompt)])
			.await?;
		let candidate = strip_code_fences(&reply);
		validate_and_repair(&candidate)
			.ok_or_else(|| anyhow::anyhow!("generated query failed validation"))
	}

	/// Execute a query, retrying once with the simplest possible template
	/// before giving up with an empty row set.
	async fn execute_query(&self, cypher: &str) -> Vec<GraphRow> {
		match self.graph.run(cypher).await {
			Ok(rows) => rows,
			Err(e) => {
				warn!(error = %e, "graph query failed, retrying with degraded query");
				let retry = fallback_query("code");
				match self.graph.run(&retry).await {
					Ok(rows) => rows,
					Err(e) => {
						error!(error = %e, "degraded graph query also failed");
						Vec::new()
					}
				}
			}
		}
	}

	/// Ask the model for an improved query conditioned on the question, the
	/// prior query and a sample of its results. Returns `None` when no
	/// refinement template is configured, the model call fails, or the
	/// candidate is invalid or identical to the prior query.
	async fn refine_query(
		&self,
		question: &str,
		initial_query: &str,
		initial_rows: &[GraphRow],
	) -> Option<String> {
		let template = self.refinement_prompt.as_deref()?;

		let sample_rows: Vec<&GraphRow> = initial_rows.iter().take(REFINEMENT_SAMPLE_ROWS).collect();
		let sample = serde_json::to_string(&sample_rows).unwrap_or_default();
		let prompt = template
			.replace("{user_question}", question)
			.replace("{previous_query}", initial_query)
			.replace("{row_count}", &initial_rows.len().to_string())
			.replace("{sample_rows}", &sample);

		let reply = match self.llm.chat(&self.model, &[ChatMessage::user(prompt)]).await {
			Ok(reply) => reply,
			Err(e) => {
				warn!(error = %e, "query refinement failed, keeping initial results");
				return None;
			}
		};

		let candidate = strip_code_fences(&reply);
		let Some(refined) = validate_and_repair(&candidate) else {
			warn!("refined query failed validation, keeping initial results");
			return None;
		};
		if refined == initial_query {
			debug!("refined query identical to initial query, keeping initial results");
			return None;
		}
		Some(refined)
	}
}

/// Recover the bare query from a model reply that may wrap it in a fenced
/// code block with an optional language tag.
pub fn strip_code_fences(reply: &str) -> String {
	let trimmed = reply.trim();
	if !trimmed.contains("```") {
		return trimmed.to_string();
	}

	let parts: Vec<&str> = trimmed.split("```").collect();
	if parts.len() >= 3 {
		let mut inner = parts[1].trim_start();
		for tag in ["cypher", "sql"] {
			if let Some(rest) = inner.strip_prefix(tag) {
				inner = rest;
				break;
			}
		}
		return inner.trim().to_string();
	}

	trimmed.replace("```", "").trim().to_string()
}

/// Validate a synthesized query against the schema rules. Returns the query
/// with case folding applied, or `None` when it is unusable.
pub fn validate_and_repair(query: &str) -> Option<String> {
	let upper = query.to_uppercase();
	for keyword in REQUIRED_KEYWORDS {
		if !upper.contains(keyword) {
			warn!(keyword, "query validation failed: missing required keyword");
			return None;
		}
	}

	for property in INVALID_PROPERTIES {
		if query.contains(&format!(".{}", property)) {
			warn!(property, "query validation failed: unknown property");
			return None;
		}
	}

	Some(apply_case_folding(query))
}

/// Wrap both operands of case-blind substring comparisons in `toLower`.
/// Regex-based and best-effort; only the documented comparison shapes are
/// rewritten.
pub fn apply_case_folding(query: &str) -> String {
	CASE_BLIND_COMPARISON
		.replace_all(query, "${1}toLower(${2}) ${3} toLower(${4})")
		.to_string()
}

/// Deterministic keyword query: longest question token (or the whole
/// question when every token is shorter than 3 characters), matched
/// case-insensitively against method names and docstrings, joined up to the
/// containing class and namespace.
pub fn fallback_query(question: &str) -> String {
	let term = fallback_search_term(question).replace(['"', '\\'], "");
	format!(
		"MATCH (m:Method)\n\
		WHERE toLower(m.name) CONTAINS toLower(\"{term}\") OR toLower(m.docstring) CONTAINS toLower(\"{term}\")\n\
		MATCH (c:Class)-[:CONTAINS]->(m)\n\
		MATCH (n:Namespace)-[:CONTAINS]->(c)\n\
		RETURN n.name AS Namespace, c.name AS Class, m.name AS Method\n\
		LIMIT {FALLBACK_ROW_LIMIT}"
	)
}

fn fallback_search_term(question: &str) -> String {
	let mut longest: Option<&str> = None;
	for word in question.split_whitespace() {
		if longest.is_none_or(|current| word.len() > current.len()) {
			longest = Some(word);
		}
	}
	match longest {
		Some(word) if word.len() >= 3 => word.to_string(),
		_ => question.to_string(),
	}
}

/// Whether the initial result set warrants a refinement pass: always on
/// emptiness, otherwise on weak word overlap with the question.
pub fn should_refine(question: &str, rows: &[GraphRow]) -> bool {
	if rows.is_empty() {
		return true;
	}
	overlap_ratio(question, rows) < OVERLAP_THRESHOLD
}

/// Fraction of the question's words found in the text fields of the first
/// few rows. A question with no words yields 1.0: emptiness is then the
/// only refinement trigger.
pub fn overlap_ratio(question: &str, rows: &[GraphRow]) -> f32 {
	let question_words: HashSet<String> = question
		.split_whitespace()
		.map(|word| word.to_lowercase())
		.collect();
	if question_words.is_empty() {
		return 1.0;
	}

	let mut row_words: HashSet<String> = HashSet::new();
	for row in rows.iter().take(OVERLAP_SAMPLE_ROWS) {
		for value in row.values() {
			if let Value::String(text) = value {
				row_words.extend(text.split_whitespace().map(|word| word.to_lowercase()));
			}
		}
	}

	let hits = question_words.intersection(&row_words).count();
	hits as f32 / question_words.len() as f32
}
