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

//! C# entity extraction: namespaces, classes and methods with their
//! preceding-comment docstrings, flattened for the graph loader.

use anyhow::{Context, Result};
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceRecord {
	pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord {
	pub name: String,
	pub filename: String,
	pub docstring: String,
	pub namespace: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodRecord {
	pub name: String,
	pub docstring: String,
	pub class_name: String,
	pub code: String,
}

/// Flat structural dataset produced from one file or a whole source tree.
/// Record order follows traversal order and is not guaranteed stable.
#[derive(Debug, Default)]
pub struct SourceEntities {
	pub namespaces: Vec<NamespaceRecord>,
	pub classes: Vec<ClassRecord>,
	pub methods: Vec<MethodRecord>,
}

impl SourceEntities {
	pub fn merge(&mut self, other: SourceEntities) {
		self.namespaces.extend(other.namespaces);
		self.classes.extend(other.classes);
		self.methods.extend(other.methods);
	}

	pub fn is_empty(&self) -> bool {
		self.namespaces.is_empty() && self.classes.is_empty() && self.methods.is_empty()
	}
}

pub struct CSharpExtractor {
	parser: Parser,
}

impl CSharpExtractor {
	pub fn new() -> Result<Self> {
		let mut parser = Parser::new();
		parser
			.set_language(&tree_sitter_c_sharp::LANGUAGE.into())
			.context("failed to load the C# grammar")?;
		Ok(Self { parser })
	}

	/// Parse one source file and collect its namespaces, classes and methods.
	pub fn extract_source(&mut self, filename: &str, code: &str) -> Result<SourceEntities> {
		let tree = self
			.parser
			.parse(code, None)
			.with_context(|| format!("tree-sitter failed to parse {}", filename))?;

		let mut entities = SourceEntities::default();
		collect_namespaces(tree.root_node(), code, filename, &mut entities);
		Ok(entities)
	}
}

fn collect_namespaces(node: Node, code: &str, filename: &str, out: &mut SourceEntities) {
	if matches!(
		node.kind(),
		"namespace_declaration" | "file_scoped_namespace_declaration"
	) {
		if let Some(name) = field_text(node, "name", code) {
			out.namespaces.push(NamespaceRecord { name: name.clone() });
			collect_classes(node, code, filename, &name, out);
		}
	}

	for child in node.children(&mut node.walk()) {
		collect_namespaces(child, code, filename, out);
	}
}

fn collect_classes(scope: Node, code: &str, filename: &str, namespace: &str, out: &mut SourceEntities) {
	for node in descendants_of_kind(scope, &["class_declaration", "struct_declaration"]) {
		let Some(name) = field_text(node, "name", code) else {
			continue;
		};
		out.classes.push(ClassRecord {
			name: name.clone(),
			filename: filename.to_string(),
			docstring: preceding_comment(node, code),
			namespace: namespace.to_string(),
		});
		collect_methods(node, code, &name, out);
	}
}

fn collect_methods(class_node: Node, code: &str, class_name: &str, out: &mut SourceEntities) {
	for node in descendants_of_kind(class_node, &["method_declaration"]) {
		let Some(name) = field_text(node, "name", code) else {
			continue;
		};
		out.methods.push(MethodRecord {
			name,
			docstring: preceding_comment(node, code),
			class_name: class_name.to_string(),
			code: node_text(node, code),
		});
	}
}

/// All nodes of the given kinds in the subtree below `scope` (excluding
/// `scope` itself), in document order.
fn descendants_of_kind<'tree>(scope: Node<'tree>, kinds: &[&str]) -> Vec<Node<'tree>> {
	let mut found = Vec::new();
	let mut stack: Vec<Node> = scope.children(&mut scope.walk()).collect();
	stack.reverse();
	while let Some(node) = stack.pop() {
		if kinds.contains(&node.kind()) {
			found.push(node);
		}
		let mut children: Vec<Node> = node.children(&mut node.walk()).collect();
		children.reverse();
		stack.extend(children);
	}
	found
}

/// The docstring rule: the immediately preceding sibling's text iff that
/// sibling is a comment, else empty.
fn preceding_comment(node: Node, code: &str) -> String {
	match node.prev_sibling() {
		Some(sibling) if sibling.kind() == "comment" => node_text(sibling, code),
		_ => String::new(),
	}
}

fn field_text(node: Node, field: &str, code: &str) -> Option<String> {
	node.child_by_field_name(field)
		.and_then(|child| child.utf8_text(code.as_bytes()).ok())
		.map(str::to_string)
}

fn node_text(node: Node, code: &str) -> String {
	node.utf8_text(code.as_bytes()).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	const FIXTURE: &str = r#"
namespace Pricing
{
    public class OptionPricing
    {
        // Calculates the fair value of the option.
        public double Calculate(double strike)
        {
            return strike * 2.0;
        }
    }
}
"#;

	fn extract(code: &str) -> SourceEntities {
		let mut extractor = CSharpExtractor::new().unwrap();
		extractor.extract_source("Fixture.cs", code).unwrap()
	}

	#[test]
	fn test_single_namespace_class_method() {
		let entities = extract(FIXTURE);

		assert_eq!(entities.namespaces.len(), 1);
		assert_eq!(entities.namespaces[0].name, "Pricing");

		assert_eq!(entities.classes.len(), 1);
		let class = &entities.classes[0];
		assert_eq!(class.name, "OptionPricing");
		assert_eq!(class.filename, "Fixture.cs");
		assert_eq!(class.namespace, "Pricing");
		assert_eq!(class.docstring, "");

		assert_eq!(entities.methods.len(), 1);
		let method = &entities.methods[0];
		assert_eq!(method.name, "Calculate");
		assert_eq!(method.class_name, "OptionPricing");
		assert_eq!(method.docstring, "// Calculates the fair value of the option.");
		assert!(method.code.starts_with("public double Calculate"));
		assert!(method.code.contains("return strike * 2.0;"));
	}

	#[test]
	fn test_class_docstring_from_preceding_comment() {
		let entities = extract(
			r#"
namespace Pricing
{
    // Black-Scholes helpers.
    public class Greeks
    {
        public double Delta() { return 0.5; }
    }
}
"#,
		);
		assert_eq!(entities.classes[0].docstring, "// Black-Scholes helpers.");
		assert_eq!(entities.methods[0].docstring, "");
	}

	#[test]
	fn test_struct_treated_as_class() {
		let entities = extract(
			r#"
namespace Pricing
{
    public struct Quote
    {
        public double Mid() { return 1.0; }
    }
}
"#,
		);
		assert_eq!(entities.classes.len(), 1);
		assert_eq!(entities.classes[0].name, "Quote");
		assert_eq!(entities.methods[0].class_name, "Quote");
	}

	#[test]
	fn test_file_scoped_namespace() {
		let entities = extract(
			r#"
namespace Pricing.Models;

public class Surface
{
    public double At(double tenor) { return tenor; }
}
"#,
		);
		assert_eq!(entities.namespaces.len(), 1);
		assert_eq!(entities.namespaces[0].name, "Pricing.Models");
		assert_eq!(entities.classes[0].namespace, "Pricing.Models");
	}

	#[test]
	fn test_code_outside_namespaces_is_ignored() {
		let entities = extract("public class Orphan { public void Run() { } }");
		assert!(entities.is_empty());
	}
}
