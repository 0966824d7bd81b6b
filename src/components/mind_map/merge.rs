//! Merging model-proposed children into an existing tree.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use super::types::{NodeId, TreeNode};

/// Append `new_children` under the node `target`, returning the new root.
///
/// Proposed children whose text already appears among the target's children
/// (or earlier in the same batch) are dropped. Only the ancestor chain of the
/// target is rebuilt; all other subtrees are shared with `root`. When the
/// target is missing or nothing survives deduplication, `root` itself is
/// returned.
pub fn merge(root: &Arc<TreeNode>, target: &NodeId, new_children: Vec<TreeNode>) -> Arc<TreeNode> {
	let mut taken = root.ids();
	match rebuild(root, target, new_children, &mut taken) {
		Some(next) => next,
		None => Arc::clone(root),
	}
}

fn rebuild(
	node: &Arc<TreeNode>,
	target: &NodeId,
	new_children: Vec<TreeNode>,
	taken: &mut HashSet<NodeId>,
) -> Option<Arc<TreeNode>> {
	if &node.id == target {
		return append_unique(node, new_children, taken);
	}

	// Ids are unique, so at most one child subtree can hold the target.
	let (idx, replacement) = node
		.children
		.iter()
		.enumerate()
		.find(|(_, c)| c.find(target).is_some())
		.map(|(i, c)| (i, rebuild(c, target, new_children, taken)))?;
	let replacement = replacement?;

	let mut children = node.children.clone();
	children[idx] = replacement;
	Some(Arc::new(TreeNode {
		children,
		..TreeNode::clone(node)
	}))
}

fn append_unique(
	node: &Arc<TreeNode>,
	new_children: Vec<TreeNode>,
	taken: &mut HashSet<NodeId>,
) -> Option<Arc<TreeNode>> {
	let mut seen: HashSet<String> = node.children.iter().map(|c| c.text.clone()).collect();
	let proposed = new_children.len();

	let mut children = node.children.clone();
	for child in new_children {
		if !seen.insert(child.text.clone()) {
			continue;
		}
		children.push(Arc::new(child.normalized(node.depth + 1, taken)));
	}

	let added = children.len() - node.children.len();
	debug!("merge into {}: {added} of {proposed} proposed children kept", node.id);
	if added == 0 {
		return None;
	}
	Some(Arc::new(TreeNode {
		children,
		..TreeNode::clone(node)
	}))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(id: &str, text: &str, depth: u32, children: Vec<TreeNode>) -> TreeNode {
		TreeNode {
			id: NodeId::from_raw(id),
			text: text.into(),
			children: children.into_iter().map(Arc::new).collect(),
			depth,
			expanded: false,
		}
	}

	fn space() -> Arc<TreeNode> {
		Arc::new(node(
			"a",
			"Space",
			0,
			vec![
				node("b", "Planets", 1, vec![]),
				node("c", "Stars", 1, vec![]),
			],
		))
	}

	fn texts(n: &TreeNode) -> Vec<&str> {
		n.children.iter().map(|c| c.text.as_str()).collect()
	}

	#[test]
	fn appends_new_topic_with_fresh_id() {
		let root = space();
		let merged = merge(&root, &NodeId::from_raw("a"), vec![TreeNode::leaf("Galaxies", 0)]);

		assert_eq!(texts(&merged), ["Planets", "Stars", "Galaxies"]);
		let added = &merged.children[2];
		assert!(!["a", "b", "c"].contains(&added.id.as_str()));
		assert_eq!(added.depth, 1);
	}

	#[test]
	fn existing_text_is_not_duplicated() {
		let root = space();
		let merged = merge(&root, &NodeId::from_raw("a"), vec![TreeNode::leaf("Planets", 0)]);
		assert_eq!(texts(&merged), ["Planets", "Stars"]);
		assert!(Arc::ptr_eq(&root, &merged));
	}

	#[test]
	fn text_comparison_is_case_sensitive() {
		let root = space();
		let merged = merge(&root, &NodeId::from_raw("a"), vec![TreeNode::leaf("planets", 0)]);
		assert_eq!(texts(&merged), ["Planets", "Stars", "planets"]);
	}

	#[test]
	fn duplicates_within_one_batch_collapse() {
		let root = space();
		let merged = merge(
			&root,
			&NodeId::from_raw("b"),
			vec![TreeNode::leaf("Mars", 0), TreeNode::leaf("Mars", 0)],
		);
		assert_eq!(texts(&merged.children[0]), ["Mars"]);
	}

	#[test]
	fn missing_target_returns_same_tree() {
		let root = space();
		let merged = merge(&root, &NodeId::from_raw("nonexistent-id"), vec![TreeNode::leaf("X", 0)]);
		assert!(Arc::ptr_eq(&root, &merged));
		assert_eq!(*root, *merged);
	}

	#[test]
	fn untouched_siblings_are_shared() {
		let root = space();
		let merged = merge(&root, &NodeId::from_raw("b"), vec![TreeNode::leaf("Mars", 0)]);

		assert!(!Arc::ptr_eq(&root, &merged));
		assert!(!Arc::ptr_eq(&root.children[0], &merged.children[0]));
		assert!(Arc::ptr_eq(&root.children[1], &merged.children[1]));
		assert_eq!(merged.children[0].children[0].depth, 2);
		// The previous value is left as it was.
		assert!(root.children[0].children.is_empty());
	}

	#[test]
	fn colliding_incoming_id_is_reassigned() {
		let root = space();
		let mut clash = TreeNode::leaf("Comets", 0);
		clash.id = NodeId::from_raw("b");
		let merged = merge(&root, &NodeId::from_raw("a"), vec![clash]);
		assert_eq!(merged.ids().len(), merged.len());
	}

	#[test]
	fn nested_new_children_get_depths() {
		let root = space();
		let incoming = TreeNode::leaf("Moons", 7).with_children([TreeNode::leaf("Europa", 9)]);
		let merged = merge(&root, &NodeId::from_raw("b"), vec![incoming]);
		let moons = &merged.children[0].children[0];
		assert_eq!(moons.depth, 2);
		assert_eq!(moons.children[0].depth, 3);
	}
}
