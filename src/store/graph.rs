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

//! Neo4j access over the HTTP transactional endpoint, plus the graph loader
//! that upserts extracted entities with MERGE-by-name semantics.

use crate::config::Neo4jConfig;
use crate::indexer::extractor::SourceEntities;
use crate::store::GraphRow;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Query-string-in, row-set-out interface to the code graph.
#[async_trait]
pub trait GraphDatabase: Send + Sync {
	async fn run(&self, cypher: &str) -> Result<Vec<GraphRow>>;
}

/// One Cypher statement with parameters, as accepted by `tx/commit`.
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
	statement: String,
	parameters: serde_json::Value,
}

impl Statement {
	pub fn new(statement: impl Into<String>, parameters: serde_json::Value) -> Self {
		Self {
			statement: statement.into(),
			parameters,
		}
	}

	pub fn without_parameters(statement: impl Into<String>) -> Self {
		Self::new(statement, json!({}))
	}
}

pub struct Neo4jHttpClient {
	client: Client,
	commit_url: String,
	user: String,
	password: String,
}

#[derive(Deserialize)]
struct TxResponse {
	results: Vec<TxResult>,
	errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
	columns: Vec<String>,
	data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
	row: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct TxError {
	code: String,
	message: String,
}

impl Neo4jHttpClient {
	pub fn new(config: &Neo4jConfig) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_secs(config.timeout))
			.build()?;
		let commit_url = format!(
			"{}/db/{}/tx/commit",
			config.base_url.trim_end_matches('/'),
			config.database
		);
		Ok(Self {
			client,
			commit_url,
			user: config.user.clone(),
			password: config.password.clone().unwrap_or_default(),
		})
	}

	/// Execute a batch of statements in one auto-committed transaction and
	/// return the row sets in statement order.
	pub async fn commit(&self, statements: &[Statement]) -> Result<Vec<Vec<GraphRow>>> {
		debug!(statements = statements.len(), "committing transaction");

		let response = self
			.client
			.post(&self.commit_url)
			.basic_auth(&self.user, Some(&self.password))
			.json(&json!({ "statements": statements }))
			.send()
			.await?;

		if !response.status().is_success() {
			let status = response.status();
			let error_text = response
				.text()
				.await
				.unwrap_or_else(|_| "Unable to read error response".to_string());
			return Err(anyhow::anyhow!("Neo4j HTTP error: {} - {}", status, error_text));
		}

		let parsed = response.json::<TxResponse>().await?;
		if let Some(error) = parsed.errors.first() {
			return Err(anyhow::anyhow!("Neo4j error {}: {}", error.code, error.message));
		}

		Ok(parsed.results.into_iter().map(result_rows).collect())
	}
}

fn result_rows(result: TxResult) -> Vec<GraphRow> {
	let TxResult { columns, data } = result;
	data.into_iter()
		.map(|entry| columns.iter().cloned().zip(entry.row).collect())
		.collect()
}

#[async_trait]
impl GraphDatabase for Neo4jHttpClient {
	async fn run(&self, cypher: &str) -> Result<Vec<GraphRow>> {
		let mut results = self
			.commit(&[Statement::without_parameters(cypher)])
			.await?;
		Ok(results.pop().unwrap_or_default())
	}
}

const MERGE_NAMESPACE: &str = "MERGE (n:Namespace {name: $name})";

const MERGE_CLASS: &str = "MERGE (c:Class {name: $name}) \
	SET c.filename = $filename, c.docstring = $docstring \
	MERGE (n:Namespace {name: $namespace}) \
	MERGE (n)-[:CONTAINS]->(c)";

const MERGE_METHOD: &str = "MERGE (m:Method {name: $name}) \
	SET m.docstring = $docstring, m.code = $code \
	MERGE (c:Class {name: $class}) \
	MERGE (c)-[:CONTAINS]->(m)";

#[derive(Debug, Default, Clone, Copy)]
pub struct GraphStats {
	pub namespaces: usize,
	pub classes: usize,
	pub methods: usize,
}

/// Upserts extracted entities into the graph. Merge keys are bare names, so
/// re-running ingestion updates nodes in place instead of duplicating them.
pub struct GraphLoader<'a> {
	client: &'a Neo4jHttpClient,
	batch_size: usize,
}

impl<'a> GraphLoader<'a> {
	pub fn new(client: &'a Neo4jHttpClient, batch_size: usize) -> Self {
		Self {
			client,
			batch_size: batch_size.max(1),
		}
	}

	pub async fn load(&self, entities: &SourceEntities) -> Result<GraphStats> {
		let statements = build_statements(entities);
		for batch in statements.chunks(self.batch_size) {
			self.client.commit(batch).await?;
		}

		let stats = GraphStats {
			namespaces: entities.namespaces.len(),
			classes: entities.classes.len(),
			methods: entities.methods.len(),
		};
		info!(
			namespaces = stats.namespaces,
			classes = stats.classes,
			methods = stats.methods,
			"graph load finished"
		);
		Ok(stats)
	}
}

fn build_statements(entities: &SourceEntities) -> Vec<Statement> {
	let mut statements = Vec::new();

	for namespace in &entities.namespaces {
		statements.push(Statement::new(
			MERGE_NAMESPACE,
			json!({ "name": namespace.name }),
		));
	}

	for class in &entities.classes {
		statements.push(Statement::new(
			MERGE_CLASS,
			json!({
				"name": class.name,
				"filename": class.filename,
				"docstring": class.docstring,
				"namespace": class.namespace,
			}),
		));
	}

	for method in &entities.methods {
		statements.push(Statement::new(
			MERGE_METHOD,
			json!({
				"name": method.name,
				"docstring": method.docstring,
				"code": method.code,
				"class": method.class_name,
			}),
		));
	}

	statements
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::indexer::extractor::{ClassRecord, MethodRecord, NamespaceRecord};

	#[test]
	fn test_result_rows_keyed_by_alias() {
		let result = TxResult {
			columns: vec!["Namespace".to_string(), "Class".to_string()],
			data: vec![TxRow {
				row: vec![json!("Pricing"), json!("OptionPricing")],
			}],
		};
		let rows = result_rows(result);
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0]["Namespace"], json!("Pricing"));
		assert_eq!(rows[0]["Class"], json!("OptionPricing"));
	}

	#[test]
	fn test_statements_cover_all_entities() {
		let entities = SourceEntities {
			namespaces: vec![NamespaceRecord {
				name: "Pricing".to_string(),
			}],
			classes: vec![ClassRecord {
				name: "OptionPricing".to_string(),
				filename: "OptionPricing.cs".to_string(),
				docstring: String::new(),
				namespace: "Pricing".to_string(),
			}],
			methods: vec![MethodRecord {
				name: "Calculate".to_string(),
				docstring: "// prices an option".to_string(),
				class_name: "OptionPricing".to_string(),
				code: "public double Calculate() { return 0.0; }".to_string(),
			}],
		};

		let statements = build_statements(&entities);
		assert_eq!(statements.len(), 3);
		assert!(statements[0].statement.contains("MERGE (n:Namespace"));
		assert!(statements[1].statement.contains("MERGE (c:Class"));
		assert!(statements[1].statement.contains("[:CONTAINS]->(c)"));
		assert!(statements[2].statement.contains("MERGE (m:Method"));
		assert_eq!(statements[2].parameters["class"], json!("OptionPricing"));
	}

	#[test]
	fn test_merge_statements_are_idempotent_by_shape() {
		// Every write statement merges on the name key; none uses CREATE.
		for statement in [MERGE_NAMESPACE, MERGE_CLASS, MERGE_METHOD] {
			assert!(statement.contains("MERGE"));
			assert!(!statement.contains("CREATE"));
			assert!(statement.contains("{name: $name}"));
		}
	}
}
