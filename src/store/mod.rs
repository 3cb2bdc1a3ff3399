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

//! Store backends: the Neo4j code graph and the Chroma vector index

pub mod graph;
pub mod vector;

use std::collections::BTreeMap;

/// A single graph result row, keyed by the query's `AS` aliases.
pub type GraphRow = BTreeMap<String, serde_json::Value>;

pub use graph::{GraphDatabase, GraphLoader, GraphStats, Neo4jHttpClient, Statement};
pub use vector::{ChromaClient, DocumentChunk, MetadataFilter, ScoredDocument, VectorIndex};
