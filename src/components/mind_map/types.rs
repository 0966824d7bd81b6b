//! The tree model and its node identifiers.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Label used when the model omits a node's text.
pub const PLACEHOLDER_TEXT: &str = "Untitled";

const ID_PREFIX: char = 'n';

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque node identifier, unique across a tree for the node's lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
	/// Allocate a fresh id from the process-wide counter. Never reused.
	pub fn fresh() -> Self {
		Self(format!("{ID_PREFIX}{}", NEXT_ID.fetch_add(1, Ordering::Relaxed)))
	}

	/// Wrap an id that was assigned elsewhere (tests, restored sessions).
	pub fn from_raw(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	/// The id as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	fn counter_value(&self) -> Option<u64> {
		self.0.strip_prefix(ID_PREFIX)?.parse().ok()
	}

	/// Make sure the allocator never hands out this id again.
	pub fn reserve(&self) {
		if let Some(n) = self.counter_value() {
			NEXT_ID.fetch_max(n + 1, Ordering::Relaxed);
		}
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A labeled node of the mind map.
///
/// Children are held behind [`Arc`] so that a structural change can rebuild
/// the path from the root to the changed node while every untouched subtree
/// keeps pointing at the same allocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
	#[serde(default)]
	pub id: NodeId,
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub children: Vec<Arc<TreeNode>>,
	#[serde(default)]
	pub depth: u32,
	#[serde(default, rename = "isExpanded")]
	pub expanded: bool,
}

impl TreeNode {
	/// A childless node with a freshly allocated id.
	pub fn leaf(text: impl Into<String>, depth: u32) -> Self {
		Self {
			id: NodeId::fresh(),
			text: text.into(),
			children: Vec::new(),
			depth,
			expanded: false,
		}
	}

	/// Builder helper used when assembling trees by hand.
	pub fn with_children(mut self, children: impl IntoIterator<Item = TreeNode>) -> Self {
		self.children = children.into_iter().map(Arc::new).collect();
		self
	}

	/// Whether the node has at least one child.
	pub fn has_children(&self) -> bool {
		!self.children.is_empty()
	}

	/// Depth-first search for the node with `id`.
	pub fn find(&self, id: &NodeId) -> Option<&TreeNode> {
		if &self.id == id {
			return Some(self);
		}
		self.children.iter().find_map(|c| c.find(id))
	}

	/// Visit every node in pre-order.
	pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TreeNode)) {
		f(self);
		for child in &self.children {
			child.walk(f);
		}
	}

	/// Number of nodes in this subtree, including `self`.
	pub fn len(&self) -> usize {
		1 + self.children.iter().map(|c| c.len()).sum::<usize>()
	}

	/// Always false: a tree has at least its root.
	pub fn is_empty(&self) -> bool {
		false
	}

	/// All ids in this subtree.
	pub fn ids(&self) -> HashSet<NodeId> {
		let mut ids = HashSet::new();
		self.walk(&mut |n| {
			ids.insert(n.id.clone());
		});
		ids
	}

	/// Rewrite this subtree so that it starts at `depth`.
	///
	/// Depths are recomputed top-down, and blank or duplicate ids (checked
	/// against `taken`) are replaced by fresh ones. Every id kept is also
	/// reserved with the allocator.
	pub fn normalized(&self, depth: u32, taken: &mut HashSet<NodeId>) -> TreeNode {
		let id = if self.id.as_str().is_empty() || taken.contains(&self.id) {
			if !self.id.as_str().is_empty() {
				log::warn!("duplicate node id {} re-assigned", self.id);
			}
			NodeId::fresh()
		} else {
			self.id.reserve();
			self.id.clone()
		};
		taken.insert(id.clone());
		TreeNode {
			id,
			text: self.text.clone(),
			children: self
				.children
				.iter()
				.map(|c| Arc::new(c.normalized(depth + 1, taken)))
				.collect(),
			depth,
			expanded: self.expanded,
		}
	}

	/// Normalize a freshly deserialized root (see [`TreeNode::normalized`]).
	pub fn into_normalized_root(self) -> TreeNode {
		self.normalized(0, &mut HashSet::new())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fresh_ids_are_distinct() {
		let a = NodeId::fresh();
		let b = NodeId::fresh();
		assert_ne!(a, b);
	}

	#[test]
	fn reserve_moves_allocator_past_restored_ids() {
		let restored = NodeId::from_raw("n900000");
		restored.reserve();
		let next = NodeId::fresh();
		assert!(next.counter_value().unwrap() > 900_000);
	}

	#[test]
	fn find_locates_deep_nodes() {
		let deep = TreeNode::leaf("deep", 2);
		let deep_id = deep.id.clone();
		let root = TreeNode::leaf("root", 0)
			.with_children([TreeNode::leaf("mid", 1).with_children([deep])]);
		assert_eq!(root.find(&deep_id).map(|n| n.text.as_str()), Some("deep"));
		assert!(root.find(&NodeId::from_raw("missing")).is_none());
		assert_eq!(root.len(), 3);
	}

	#[test]
	fn legacy_shape_without_depth_or_flag_is_repaired() {
		let json = r#"{"id":"a","text":"Space","children":[{"id":"b","text":"Planets","children":[{"id":"c","text":"Mars"}]},{"id":"b","text":"Stars"}]}"#;
		let root: TreeNode = serde_json::from_str(json).unwrap();
		let root = root.into_normalized_root();

		assert_eq!(root.depth, 0);
		assert_eq!(root.children[0].depth, 1);
		assert_eq!(root.children[0].children[0].depth, 2);
		assert_eq!(root.ids().len(), root.len());
		assert_eq!(root.children[0].id.as_str(), "b");
		assert_ne!(root.children[1].id.as_str(), "b");
	}

	#[test]
	fn serializes_expanded_flag_under_legacy_name() {
		let mut node = TreeNode::leaf("x", 0);
		node.expanded = true;
		let json = serde_json::to_value(&node).unwrap();
		assert_eq!(json["isExpanded"], serde_json::Value::Bool(true));
	}
}
