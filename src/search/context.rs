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

//! Context assembly: render graph rows into a bounded text block and build
//! the final answer prompt, with a fallback that always yields a prompt.

use crate::store::GraphRow;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

const PLACEHOLDERS: [&str; 3] = ["{graph_context}", "{vector_context}", "{user_question}"];

/// One `key: value` line per non-empty string field, deduplicated within
/// each row; row blocks joined by blank lines.
pub fn assemble_graph_context(rows: &[GraphRow]) -> String {
	let mut blocks = Vec::with_capacity(rows.len());

	for row in rows {
		let mut seen: HashSet<String> = HashSet::new();
		let mut lines: Vec<String> = Vec::new();
		for (key, value) in row {
			if let Value::String(text) = value {
				if text.is_empty() {
					continue;
				}
				let line = format!("{}: {}", key, text);
				if seen.insert(line.clone()) {
					lines.push(line);
				}
			}
		}
		if !lines.is_empty() {
			blocks.push(lines.join("\n"));
		}
	}

	blocks.join("\n\n")
}

/// Substitute the prompt template's placeholders. A template missing any
/// placeholder falls back to labeled sections, so a prompt is always
/// produced.
pub fn render_answer_prompt(
	template: &str,
	graph_context: &str,
	vector_context: &str,
	question: &str,
) -> String {
	if PLACEHOLDERS.iter().all(|placeholder| template.contains(placeholder)) {
		template
			.replace("{graph_context}", graph_context)
			.replace("{vector_context}", vector_context)
			.replace("{user_question}", question)
	} else {
		warn!("answer prompt template is missing placeholders, using labeled sections");
		format!(
			"{}\n\nGraph Context:\n{}\n\nVector Context:\n{}\n\nUser Question: {}",
			template, graph_context, vector_context, question
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_rows_render_as_key_value_lines() {
		let row: GraphRow = [
			("Namespace".to_string(), json!("Pricing")),
			("Class".to_string(), json!("OptionPricing")),
			("Method".to_string(), json!("Calculate")),
		]
		.into_iter()
		.collect();

		let context = assemble_graph_context(&[row]);
		assert!(context.contains("Method: Calculate"));
		assert!(context.contains("Class: OptionPricing"));
		assert!(context.contains("Namespace: Pricing"));
	}

	#[test]
	fn test_non_string_and_empty_values_skipped() {
		let row: GraphRow = [
			("Method".to_string(), json!("Calculate")),
			("Count".to_string(), json!(3)),
			("Documentation".to_string(), json!("")),
			("Missing".to_string(), json!(null)),
		]
		.into_iter()
		.collect();

		let context = assemble_graph_context(&[row]);
		assert_eq!(context, "Method: Calculate");
	}

	#[test]
	fn test_duplicate_lines_within_row_deduplicated() {
		let row: GraphRow = [
			("Class".to_string(), json!("OptionPricing")),
			("Method".to_string(), json!("Calculate")),
		]
		.into_iter()
		.collect();
		let other = row.clone();

		let context = assemble_graph_context(&[row, other]);
		// Dedup applies within a row; both row blocks survive.
		assert_eq!(context.matches("Method: Calculate").count(), 2);
	}

	#[test]
	fn test_row_blocks_joined_by_blank_lines() {
		let first: GraphRow = [("Method".to_string(), json!("A"))].into_iter().collect();
		let second: GraphRow = [("Method".to_string(), json!("B"))].into_iter().collect();
		assert_eq!(assemble_graph_context(&[first, second]), "Method: A\n\nMethod: B");
	}

	#[test]
	fn test_template_substitution() {
		let prompt = render_answer_prompt(
			"G={graph_context} V={vector_context} Q={user_question}",
			"graph",
			"vector",
			"question",
		);
		assert_eq!(prompt, "G=graph V=vector Q=question");
	}

	#[test]
	fn test_malformed_template_falls_back_to_labeled_sections() {
		let prompt = render_answer_prompt("broken template", "graph", "vector", "question");
		assert!(prompt.starts_with("broken template"));
		assert!(prompt.contains("Graph Context:\ngraph"));
		assert!(prompt.contains("Vector Context:\nvector"));
		assert!(prompt.contains("User Question: question"));
	}
}
