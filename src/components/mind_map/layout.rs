//! Tree layout: a tidy-tree placement pass followed by a bounded collision
//! relaxation.
//!
//! Coordinates follow the tree's own axes: `x` is the cross axis (spread of
//! siblings), `y` is the along axis (distance by depth). The renderer maps
//! `(x, y)` to screen `(y, x)` so the map grows left to right.

use log::debug;

use super::types::{NodeId, TreeNode};

/// Geometry parameters for [`layout`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Cross-axis distance for one unit of separation.
	pub node_spacing: f64,
	/// Along-axis distance between depth levels.
	pub level_spacing: f64,
	/// Separation (in units of `node_spacing`) between siblings.
	pub sibling_separation: f64,
	/// Separation between neighbouring nodes that do not share a parent.
	pub cousin_separation: f64,
	/// Radius of the circle every node occupies during relaxation.
	pub collision_radius: f64,
	/// Upper bound on relaxation sweeps.
	pub relaxation_iterations: usize,
	pub min_box_width: f64,
	pub char_width: f64,
	pub box_padding: f64,
	/// How far links reach into the boxes they connect.
	pub link_inset: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			node_spacing: 120.0,
			level_spacing: 360.0,
			sibling_separation: 1.0,
			cousin_separation: 2.0,
			collision_radius: 75.0,
			relaxation_iterations: 100,
			min_box_width: 140.0,
			char_width: 9.0,
			box_padding: 24.0,
			link_inset: 10.0,
		}
	}
}

impl LayoutConfig {
	/// Width of the label box drawn for `text`.
	pub fn box_width(&self, text: &str) -> f64 {
		let chars = text.chars().count() as f64;
		(chars * self.char_width + self.box_padding).max(self.min_box_width)
	}
}

/// A 2D point in layout coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	/// Construct a point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Linear interpolation towards `to`.
	pub fn lerp(self, to: Point, t: f64) -> Point {
		Point::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

/// Position of one tree node for the current pass.
#[derive(Clone, Debug)]
pub struct LayoutNode<'a> {
	pub node: &'a TreeNode,
	/// Index of the parent in [`TreeLayout::nodes`].
	pub parent: Option<usize>,
	pub x: f64,
	pub y: f64,
	pub box_width: f64,
}

impl LayoutNode<'_> {
	/// Position as a point.
	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// Endpoints of a parent→child link, already inset to the box edges.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkGeometry {
	pub source_id: NodeId,
	pub target_id: NodeId,
	pub source: Point,
	pub target: Point,
}

/// Result of a layout pass. Borrows the tree for the duration of the pass.
#[derive(Clone, Debug)]
pub struct TreeLayout<'a> {
	/// One entry per tree node, in pre-order (root first).
	pub nodes: Vec<LayoutNode<'a>>,
	link_inset: f64,
}

impl TreeLayout<'_> {
	/// Parent→child links. A link starts at the parent's right edge and ends
	/// just before the child's left edge.
	pub fn links(&self) -> Vec<LinkGeometry> {
		self.nodes
			.iter()
			.filter_map(|child| {
				let parent = &self.nodes[child.parent?];
				Some(LinkGeometry {
					source_id: parent.node.id.clone(),
					target_id: child.node.id.clone(),
					source: Point::new(parent.x, parent.y + parent.box_width - self.link_inset),
					target: Point::new(child.x, child.y - self.link_inset),
				})
			})
			.collect()
	}
}

/// Per-level extent of a subtree, relative to the subtree root.
#[derive(Clone, Copy, Debug)]
struct Extent {
	left: f64,
	right: f64,
}

struct Slot<'a> {
	node: &'a TreeNode,
	parent: Option<usize>,
	children: Vec<usize>,
	depth: usize,
	/// Offset from the parent along the cross axis, in separation units.
	offset: f64,
	contour: Vec<Extent>,
}

/// Lay out `root`. Deterministic for a given tree and config.
pub fn layout<'a>(root: &'a TreeNode, config: &LayoutConfig) -> TreeLayout<'a> {
	let mut slots = flatten(root);
	tidy(&mut slots, config);

	// Parents precede their children, so the parent's position is final here.
	let mut positions = vec![Point::default(); slots.len()];
	for i in 0..slots.len() {
		let base = slots[i].parent.map_or(0.0, |p| positions[p].x);
		positions[i] = Point::new(
			base + slots[i].offset * config.node_spacing,
			slots[i].depth as f64 * config.level_spacing,
		);
	}

	let sweeps = relax(&mut positions, config);
	debug!("layout: {} nodes, relaxed in {sweeps} sweeps", slots.len());

	let nodes = slots
		.iter()
		.zip(&positions)
		.map(|(slot, pos)| LayoutNode {
			node: slot.node,
			parent: slot.parent,
			x: pos.x,
			y: pos.y,
			box_width: config.box_width(&slot.node.text),
		})
		.collect();

	TreeLayout {
		nodes,
		link_inset: config.link_inset,
	}
}

fn flatten(root: &TreeNode) -> Vec<Slot<'_>> {
	let mut slots = Vec::with_capacity(root.len());
	let mut stack = vec![(root, None, 0usize)];
	while let Some((node, parent, depth)) = stack.pop() {
		let idx = slots.len();
		slots.push(Slot {
			node,
			parent,
			children: Vec::with_capacity(node.children.len()),
			depth,
			offset: 0.0,
			contour: Vec::new(),
		});
		if let Some(p) = parent {
			slots[p].children.push(idx);
		}
		for child in node.children.iter().rev() {
			stack.push((child.as_ref(), Some(idx), depth + 1));
		}
	}
	slots
}

/// Bottom-up contour placement: each child subtree is pushed right until it
/// clears every level of its left siblings, then the parent is centred over
/// its first and last child.
fn tidy(slots: &mut [Slot<'_>], config: &LayoutConfig) {
	for v in (0..slots.len()).rev() {
		let children = std::mem::take(&mut slots[v].children);
		let mut placed: Vec<f64> = Vec::with_capacity(children.len());
		let mut merged: Vec<Extent> = Vec::new();

		for &c in &children {
			let contour = std::mem::take(&mut slots[c].contour);
			let pos = if merged.is_empty() {
				0.0
			} else {
				merged
					.iter()
					.zip(&contour)
					.enumerate()
					.map(|(level, (left, right))| {
						let sep = if level == 0 {
							config.sibling_separation
						} else {
							config.cousin_separation
						};
						left.right - right.left + sep
					})
					.fold(f64::NEG_INFINITY, f64::max)
			};
			for (level, ext) in contour.iter().enumerate() {
				let shifted = Extent {
					left: ext.left + pos,
					right: ext.right + pos,
				};
				match merged.get_mut(level) {
					Some(m) => {
						m.left = m.left.min(shifted.left);
						m.right = m.right.max(shifted.right);
					}
					None => merged.push(shifted),
				}
			}
			placed.push(pos);
		}

		let mid = match (placed.first(), placed.last()) {
			(Some(first), Some(last)) => (first + last) / 2.0,
			_ => 0.0,
		};
		for (&c, pos) in children.iter().zip(&placed) {
			slots[c].offset = pos - mid;
		}

		let mut contour = Vec::with_capacity(merged.len() + 1);
		contour.push(Extent {
			left: 0.0,
			right: 0.0,
		});
		contour.extend(merged.into_iter().map(|e| Extent {
			left: e.left - mid,
			right: e.right - mid,
		}));
		slots[v].contour = contour;
		slots[v].children = children;
	}
}

/// Push apart every pair of nodes closer than two collision radii, along the
/// line through their centres. Returns the number of sweeps run.
fn relax(positions: &mut [Point], config: &LayoutConfig) -> usize {
	let min_dist = 2.0 * config.collision_radius;
	let mut sweeps = 0;
	while sweeps < config.relaxation_iterations {
		sweeps += 1;
		let mut moved = false;
		for i in 0..positions.len() {
			for j in (i + 1)..positions.len() {
				let (dx, dy) = (positions[j].x - positions[i].x, positions[j].y - positions[i].y);
				if dx.abs() >= min_dist || dy.abs() >= min_dist {
					continue;
				}
				let dist = dx.hypot(dy);
				if dist >= min_dist {
					continue;
				}
				// Coincident centres separate along the cross axis.
				let (ux, uy) = if dist < 1e-9 {
					(1.0, 0.0)
				} else {
					(dx / dist, dy / dist)
				};
				let half = (min_dist - dist) / 2.0;
				positions[i].x -= ux * half;
				positions[i].y -= uy * half;
				positions[j].x += ux * half;
				positions[j].y += uy * half;
				moved = true;
			}
		}
		if !moved {
			break;
		}
	}
	sweeps
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fan(n: usize) -> TreeNode {
		TreeNode::leaf("root", 0).with_children((0..n).map(|i| TreeNode::leaf(format!("c{i}"), 1)))
	}

	#[test]
	fn single_root_sits_at_origin_without_links() {
		let root = TreeNode::leaf("alone", 0);
		let out = layout(&root, &LayoutConfig::default());
		assert_eq!(out.nodes.len(), 1);
		assert_eq!(out.nodes[0].position(), Point::new(0.0, 0.0));
		assert!(out.links().is_empty());
	}

	#[test]
	fn box_width_clamps_and_scales() {
		let cfg = LayoutConfig::default();
		assert_eq!(cfg.box_width(""), 140.0);
		assert_eq!(cfg.box_width("short"), 140.0);
		let long = "x".repeat(20);
		assert_eq!(cfg.box_width(&long), 20.0 * 9.0 + 24.0);
	}

	#[test]
	fn parent_is_centred_over_children() {
		let root = fan(3);
		let mut cfg = LayoutConfig::default();
		cfg.relaxation_iterations = 0;
		let out = layout(&root, &cfg);
		let xs: Vec<f64> = out.nodes[1..].iter().map(|n| n.x).collect();
		assert_eq!(xs, [-120.0, 0.0, 120.0]);
		assert_eq!(out.nodes[0].x, 0.0);
		assert!(out.nodes[1..].iter().all(|n| n.y == 360.0));
	}

	#[test]
	fn cousins_get_wider_separation() {
		let root = TreeNode::leaf("r", 0).with_children([
			TreeNode::leaf("a", 1).with_children([TreeNode::leaf("a1", 2)]),
			TreeNode::leaf("b", 1).with_children([TreeNode::leaf("b1", 2)]),
		]);
		let mut cfg = LayoutConfig::default();
		cfg.relaxation_iterations = 0;
		let out = layout(&root, &cfg);
		// pre-order: r, a, a1, b, b1
		assert_eq!(out.nodes[4].x - out.nodes[2].x, 240.0);
	}

	#[test]
	fn identical_labels_do_not_collapse() {
		let root = TreeNode::leaf("r", 0)
			.with_children([TreeNode::leaf("same", 1), TreeNode::leaf("same", 1)]);
		let out = layout(&root, &LayoutConfig::default());
		assert_ne!(out.nodes[1].position(), out.nodes[2].position());
	}

	#[test]
	fn relaxation_spreads_siblings_to_collision_diameter() {
		let root = fan(5);
		let cfg = LayoutConfig::default();
		let out = layout(&root, &cfg);
		for i in 1..out.nodes.len() {
			for j in (i + 1)..out.nodes.len() {
				let d = out.nodes[i].position().distance(out.nodes[j].position());
				assert!(d >= 2.0 * cfg.collision_radius - 1e-6, "{i},{j}: {d}");
			}
		}
		// Depth stays on its level and sibling order is kept.
		assert!(out.nodes[1..].iter().all(|n| n.y == 360.0));
		assert!(out.nodes[1..].windows(2).all(|w| w[0].x < w[1].x));
	}

	#[test]
	fn links_attach_to_box_edges() {
		let root = TreeNode::leaf("root", 0).with_children([TreeNode::leaf("leaf", 1)]);
		let cfg = LayoutConfig::default();
		let out = layout(&root, &cfg);
		let links = out.links();
		assert_eq!(links.len(), 1);
		assert_eq!(links[0].source, Point::new(0.0, 140.0 - 10.0));
		assert_eq!(links[0].target, Point::new(0.0, 360.0 - 10.0));
		assert_eq!(links[0].source_id, root.id);
	}
}
