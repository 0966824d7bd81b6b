//! Host-side state behind the mind map view, free of any DOM access.

use std::sync::Arc;

use log::debug;

use super::layout::{LayoutConfig, layout};
use super::scene::{ReconcileReport, Scene, SceneFrame, TransitionConfig};
use super::svg;
use super::types::{NodeId, TreeNode};
use super::viewport::{ViewTransform, Viewport, ViewportConfig};

/// Everything the mind map view keeps between frames.
pub struct MindMapState {
	pub viewport: Viewport,
	layout_config: LayoutConfig,
	scene: Scene,
	tree: Option<Arc<TreeNode>>,
	dirty: bool,
	was_animating: bool,
}

impl MindMapState {
	pub fn new(width: f64, height: f64) -> Self {
		Self::with_config(
			LayoutConfig::default(),
			TransitionConfig::default(),
			ViewportConfig::default(),
			width,
			height,
		)
	}

	pub fn with_config(
		layout_config: LayoutConfig,
		transitions: TransitionConfig,
		viewport: ViewportConfig,
		width: f64,
		height: f64,
	) -> Self {
		Self {
			viewport: Viewport::new(viewport, width, height),
			layout_config,
			scene: Scene::new(transitions),
			tree: None,
			dirty: true,
			was_animating: false,
		}
	}

	/// Show `tree`, or nothing. Returns `None` when `tree` is the value
	/// already shown.
	pub fn set_data(&mut self, tree: Option<Arc<TreeNode>>, now: f64) -> Option<ReconcileReport> {
		let unchanged = match (&self.tree, &tree) {
			(Some(a), Some(b)) => Arc::ptr_eq(a, b),
			(None, None) => true,
			_ => false,
		};
		if unchanged {
			return None;
		}

		let report = match &tree {
			Some(root) => {
				let laid_out = layout(root, &self.layout_config);
				let report = self.scene.reconcile(Some(&laid_out), now);
				self.viewport.place_initial();
				report
			}
			None => {
				self.viewport.unplace();
				self.scene.reconcile(None, now)
			}
		};
		self.tree = tree;
		self.dirty = true;
		Some(report)
	}

	/// A copy of the node with `id` from the tree currently shown.
	pub fn node(&self, id: &NodeId) -> Option<TreeNode> {
		self.tree.as_ref()?.find(id).cloned()
	}

	/// Flag a redraw after an out-of-band change (gesture, resize).
	pub fn invalidate(&mut self) {
		self.dirty = true;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
		self.dirty = true;
	}

	/// Advance animations. Returns whether the surface needs a redraw.
	pub fn tick(&mut self, now: f64) -> bool {
		let moved = self.viewport.tick(now);
		let animating = self.scene.is_animating(now);
		let redraw = self.dirty || moved || animating || self.was_animating;
		self.scene.prune(now);
		self.was_animating = animating;
		self.dirty = false;
		redraw
	}

	pub fn frame(&self, now: f64) -> SceneFrame {
		self.scene.frame(now)
	}

	pub fn transform(&self) -> ViewTransform {
		self.viewport.transform()
	}

	/// The current frame as a standalone SVG document.
	pub fn export_svg(&self, now: f64) -> String {
		let (width, height) = self.viewport.size();
		let doc = svg::document(&self.frame(now), &self.transform(), width, height);
		debug!("export: {} bytes", doc.len());
		doc
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tree() -> Arc<TreeNode> {
		Arc::new(TreeNode::leaf("Space", 0).with_children([TreeNode::leaf("Stars", 1)]))
	}

	#[test]
	fn same_tree_value_is_not_reconciled_twice() {
		let mut state = MindMapState::new(1000.0, 800.0);
		let t = tree();
		assert!(state.set_data(Some(t.clone()), 0.0).is_some());
		assert!(state.set_data(Some(t), 10.0).is_none());
	}

	#[test]
	fn data_updates_keep_the_users_transform() {
		let mut state = MindMapState::new(1000.0, 800.0);
		let t = tree();
		state.set_data(Some(t.clone()), 0.0);
		assert_eq!(state.transform(), state.viewport.canonical());

		state.viewport.wheel(100.0, 100.0, -1.0);
		let zoomed = state.transform();
		let grown = crate::components::mind_map::merge::merge(
			&t,
			&t.id,
			vec![TreeNode::leaf("Planets", 0)],
		);
		state.set_data(Some(grown), 100.0);
		assert_eq!(state.transform(), zoomed);
	}

	#[test]
	fn clearing_resets_placement_for_next_tree() {
		let mut state = MindMapState::new(1000.0, 800.0);
		state.set_data(Some(tree()), 0.0);
		state.viewport.wheel(100.0, 100.0, -1.0);
		state.set_data(None, 10.0);
		state.set_data(Some(tree()), 20.0);
		assert_eq!(state.transform(), state.viewport.canonical());
	}

	#[test]
	fn redraws_once_after_animation_settles() {
		let mut state = MindMapState::new(1000.0, 800.0);
		state.set_data(Some(tree()), 0.0);
		assert!(state.tick(0.0));
		assert!(state.tick(300.0));
		assert!(state.tick(600.0));
		assert!(!state.tick(616.0));
	}

	#[test]
	fn export_matches_current_frame() {
		let mut state = MindMapState::new(1000.0, 800.0);
		state.set_data(Some(tree()), 0.0);
		state.tick(600.0);
		let doc = state.export_svg(600.0);
		assert!(doc.contains(">Space</text>"));
		assert!(doc.contains(">Stars</text>"));
		assert!(doc.contains(&state.transform().to_svg()));
		assert!(doc.contains(r#"width="1000""#));
	}

	#[test]
	fn node_lookup_returns_full_data() {
		let mut state = MindMapState::new(1000.0, 800.0);
		let t = tree();
		state.set_data(Some(t.clone()), 0.0);
		let child = state.node(&t.children[0].id).unwrap();
		assert_eq!(child.text, "Stars");
		assert!(state.node(&NodeId::from_raw("gone")).is_none());
	}
}
