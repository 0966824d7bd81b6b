//! Turning model JSON into tree nodes.
//!
//! Parsing never fails: a missing or blank `text` becomes the placeholder
//! label and a missing `children` an empty list.

use std::sync::Arc;

use serde_json::Value;

use crate::components::mind_map::{NodeId, PLACEHOLDER_TEXT, TreeNode};

fn label(value: &Value) -> String {
	value
		.get("text")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|t| !t.is_empty())
		.unwrap_or(PLACEHOLDER_TEXT)
		.to_owned()
}

fn node_from(value: &Value, depth: u32) -> TreeNode {
	let children = value
		.get("children")
		.and_then(Value::as_array)
		.map(|items| {
			items
				.iter()
				.map(|c| Arc::new(node_from(c, depth + 1)))
				.collect()
		})
		.unwrap_or_default();
	TreeNode {
		id: NodeId::fresh(),
		text: label(value),
		children,
		depth,
		expanded: true,
	}
}

/// A generated outline: fresh ids, depths from 0, every node expanded.
pub fn outline_tree(value: &Value) -> TreeNode {
	node_from(value, 0)
}

/// Proposed sub-topics for an expansion: childless, not expanded.
///
/// Accepts a bare array or an object wrapping it under `topics`; anything
/// else yields no topics.
pub fn expansion_topics(value: &Value) -> Vec<TreeNode> {
	let items = match value {
		Value::Array(items) => items.as_slice(),
		Value::Object(map) => map
			.get("topics")
			.and_then(Value::as_array)
			.map(Vec::as_slice)
			.unwrap_or_default(),
		_ => &[],
	};
	items
		.iter()
		.map(|item| TreeNode {
			id: NodeId::fresh(),
			text: label(item),
			children: Vec::new(),
			depth: 0,
			expanded: false,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn builds_tree_with_depths_and_flags() {
		let tree = outline_tree(&json!({
			"text": "Space",
			"children": [
				{ "text": "Planets", "children": [{ "text": "Mars" }] },
				{ "text": "Stars" }
			]
		}));
		assert_eq!(tree.text, "Space");
		assert_eq!(tree.depth, 0);
		assert!(tree.expanded);
		assert_eq!(tree.children[0].children[0].depth, 2);
		assert!(tree.children[1].children.is_empty());
		assert_eq!(tree.ids().len(), 4);
	}

	#[test]
	fn missing_text_gets_placeholder() {
		let tree = outline_tree(&json!({ "children": [{ "text": "" }, { "text": 3 }] }));
		assert_eq!(tree.text, PLACEHOLDER_TEXT);
		assert!(tree.children.iter().all(|c| c.text == PLACEHOLDER_TEXT));
	}

	#[test]
	fn empty_object_is_a_lone_root() {
		let tree = outline_tree(&json!({}));
		assert_eq!(tree.len(), 1);
	}

	#[test]
	fn topics_from_array_or_wrapper() {
		let bare = expansion_topics(&json!([{ "text": "Mars" }, { "text": "Venus" }]));
		assert_eq!(bare.len(), 2);
		assert!(bare.iter().all(|t| !t.expanded && t.children.is_empty()));

		let wrapped = expansion_topics(&json!({ "topics": [{ "text": "Mars" }] }));
		assert_eq!(wrapped[0].text, "Mars");

		assert!(expansion_topics(&json!({ "other": 1 })).is_empty());
		assert!(expansion_topics(&json!("nope")).is_empty());
	}
}
