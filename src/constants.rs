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

//! Application-wide constants and prompt templates

/// File extension of the legacy sources fed to the extractor
pub const SOURCE_EXTENSION: &str = "cs";

/// Rows sampled from the initial result set when judging relevance
pub const OVERLAP_SAMPLE_ROWS: usize = 5;

/// Question-word overlap ratio below which the initial query gets refined
pub const OVERLAP_THRESHOLD: f32 = 0.3;

/// Sample rows serialized into the refinement prompt
pub const REFINEMENT_SAMPLE_ROWS: usize = 3;

/// Row cap applied by the deterministic fallback query
pub const FALLBACK_ROW_LIMIT: usize = 50;

/// Cap on the enhancement text appended to the vector query (characters)
pub const ENHANCEMENT_MAX_CHARS: usize = 500;

/// Cap on the leading docstring sentence used for query enhancement (characters)
pub const DOCSTRING_SENTENCE_MAX_CHARS: usize = 100;

/// Cap on a single formatted vector snippet (characters)
pub const SNIPPET_MAX_CHARS: usize = 800;

/// Marker appended to vector snippets cut at [`SNIPPET_MAX_CHARS`]
pub const SNIPPET_TRUNCATION_MARKER: &str = " [content truncated...]";

/// Separator between formatted vector snippets
pub const VECTOR_SNIPPET_SEPARATOR: &str = "\n\n---\n\n";

/// System prompt for Cypher query synthesis from a natural-language question.
pub const HYDE_SYSTEM_PROMPT: &str = r#"You are an expert Neo4j Cypher query generator. Generate executable Cypher queries for exploring C# code repositories.

The Neo4j database has this schema:
- (Namespace) nodes with properties: name
- (Class) nodes with properties: name, filename, docstring
- (Method) nodes with properties: name, docstring, code
- Relationships: (Namespace)-[:CONTAINS]->(Class)-[:CONTAINS]->(Method)

IMPORTANT RULES:
- Always use label names exactly as given: Namespace, Class, Method
- Don't use property names that don't exist in the schema
- Never create complex queries with multiple unrelated operations
- Keep queries simple and focused on one specific task
- Use CONTAINS for string matching, not = or EQUALS
- String comparisons must be case-insensitive: wrap both operands in toLower()
- Properties are accessed with dot notation (node.property)
- For filtering, always use WHERE clauses, not direct property matching in MATCH
- Every query must end with a LIMIT clause of 200 or fewer rows
- Always use short, clear alias names (AS Namespace, AS Class, etc.)
- Return ONLY the complete, executable Cypher query
- Do NOT include explanations, markdown, or comments in the response
- Do NOT include any text other than the Cypher query itself

QUERY EXAMPLES:
1. Find a namespace:
   MATCH (n:Namespace)
   WHERE toLower(n.name) CONTAINS toLower("Target")
   RETURN n.name AS Namespace
   LIMIT 5

2. Find classes in a namespace:
   MATCH (n:Namespace)-[:CONTAINS]->(c:Class)
   WHERE toLower(n.name) CONTAINS toLower("Target")
   RETURN n.name AS Namespace, c.name AS Class
   LIMIT 10

3. Find methods in a class:
   MATCH (c:Class)-[:CONTAINS]->(m:Method)
   WHERE toLower(c.name) CONTAINS toLower("Target")
   RETURN c.name AS Class, m.name AS Method
   LIMIT 10

4. Search by functionality:
   MATCH (m:Method)
   WHERE toLower(m.code) CONTAINS toLower("keyword") OR toLower(m.docstring) CONTAINS toLower("keyword")
   MATCH (c:Class)-[:CONTAINS]->(m)
   RETURN c.name AS Class, m.name AS Method, m.docstring AS Documentation
   LIMIT 10"#;

/// Prompt asking the model to improve a Cypher query that returned poor results.
/// Placeholders: `{user_question}`, `{previous_query}`, `{row_count}`, `{sample_rows}`.
pub const REFINEMENT_PROMPT: &str = r#"You are an expert Neo4j Cypher query generator. A previous query for a user question returned results with low relevance. Produce an improved Cypher query.

The Neo4j database has this schema:
- (Namespace) nodes with properties: name
- (Class) nodes with properties: name, filename, docstring
- (Method) nodes with properties: name, docstring, code
- Relationships: (Namespace)-[:CONTAINS]->(Class)-[:CONTAINS]->(Method)

User question: {user_question}

Previous query:
{previous_query}

It returned {row_count} rows. Sample rows:
{sample_rows}

RULES:
- The improved query must differ from the previous query
- Use only the schema labels and properties listed above
- String comparisons must be case-insensitive: wrap both operands in toLower()
- Every query must end with a LIMIT clause of 200 or fewer rows
- Return ONLY the complete, executable Cypher query, with no explanations or markdown"#;

/// Final answer-composition prompt.
/// Placeholders: `{graph_context}`, `{vector_context}`, `{user_question}`.
pub const FINAL_RESPONSE_PROMPT: &str = r#"You are an expert C# developer with deep knowledge of functional programming patterns. Answer questions about legacy C# code based on the provided context.

<graph_context>
{graph_context}
</graph_context>

<vector_context>
{vector_context}
</vector_context>

CORE RESPONSIBILITIES:
1. Explain C# code concepts, patterns, and implementation details
2. Explain functional programming principles in the C# codebase
3. Analyze relationships between namespaces, classes, and methods

RESPONSE GUIDELINES:
- Prioritize information from both graph and vector contexts
- Highlight functional programming patterns (monads, partial application, etc.)
- Explain both "what" the code does and "why" it's designed that way
- Use ```csharp blocks for code examples
- Focus on the most relevant information to the user's question

If the context seems insufficient, acknowledge limitations in your response.

User question: {user_question}"#;
