//! SVG element descriptions for a scene frame.
//!
//! The live DOM and the exported document are both produced from these
//! descriptions, so an export is exactly what is on screen.

use super::layout::Point;
use super::scene::{LinkEnds, LinkFrame, NodeFrame, SceneFrame};
use super::viewport::ViewTransform;

/// Namespace for every element created on the surface.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Default file name offered for exports.
pub const EXPORT_FILENAME: &str = "mindmap.svg";

const PALETTE: [&str; 10] = [
	"#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
	"#9c755f", "#bab0ab",
];

const ROOT_FILL: &str = "#0f172a";
const ROOT_LABEL: &str = "#f8fafc";
const NODE_FILL: &str = "white";
const NODE_LABEL: &str = "#1e293b";
const LINK_STROKE: &str = "#e2e8f0";
const FONT_FAMILY: &str = "Inter, system-ui, sans-serif";

const BOX_HEIGHT: f64 = 44.0;
const BOX_OFFSET: (f64, f64) = (-10.0, -22.0);
const BADGE_RADIUS: f64 = 5.0;

/// Ordinal colour for a depth. Depth 1 takes the first palette entry and
/// the palette wraps as depth grows.
pub fn depth_color(depth: u32) -> &'static str {
	let n = PALETTE.len();
	PALETTE[(depth as usize + n - 1) % n]
}

/// Attribute name used to find the node under a pointer.
pub const NODE_ID_ATTR: &str = "data-node-id";

/// A minimal SVG element tree.
#[derive(Clone, Debug, PartialEq)]
pub struct SvgNode {
	pub tag: &'static str,
	pub attrs: Vec<(&'static str, String)>,
	pub text: Option<String>,
	pub children: Vec<SvgNode>,
}

impl SvgNode {
	fn new(tag: &'static str) -> Self {
		Self {
			tag,
			attrs: Vec::new(),
			text: None,
			children: Vec::new(),
		}
	}

	fn attr(mut self, name: &'static str, value: impl ToString) -> Self {
		self.attrs.push((name, value.to_string()));
		self
	}

	fn child(mut self, child: SvgNode) -> Self {
		self.children.push(child);
		self
	}

	fn text(mut self, text: &str) -> Self {
		self.text = Some(text.to_owned());
		self
	}

	/// Value of an attribute, if set.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.attrs
			.iter()
			.find(|(k, _)| *k == name)
			.map(|(_, v)| v.as_str())
	}

	/// Serialize as XML.
	pub fn write_xml(&self, out: &mut String) {
		out.push('<');
		out.push_str(self.tag);
		for (name, value) in &self.attrs {
			out.push(' ');
			out.push_str(name);
			out.push_str("=\"");
			escape_into(value, out);
			out.push('"');
		}
		if self.text.is_none() && self.children.is_empty() {
			out.push_str("/>");
			return;
		}
		out.push('>');
		if let Some(text) = &self.text {
			escape_into(text, out);
		}
		for child in &self.children {
			child.write_xml(out);
		}
		out.push_str("</");
		out.push_str(self.tag);
		out.push('>');
	}
}

fn escape_into(raw: &str, out: &mut String) {
	for ch in raw.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&apos;"),
			c => out.push(c),
		}
	}
}

/// Horizontal cubic link path. Layout `(x, y)` maps to screen `(y, x)`.
pub fn link_path(ends: &LinkEnds) -> String {
	let LinkEnds {
		source: Point { x: sx, y: sy },
		target: Point { x: tx, y: ty },
	} = *ends;
	let mid = (sy + ty) / 2.0;
	format!("M{sy},{sx}C{mid},{sx},{mid},{tx},{ty},{tx}")
}

/// `<path>` for a link.
pub fn link_element(link: &LinkFrame) -> SvgNode {
	SvgNode::new("path")
		.attr("class", "link")
		.attr("fill", "none")
		.attr("stroke", LINK_STROKE)
		.attr("stroke-width", 2)
		.attr("opacity", link.opacity)
		.attr("d", link_path(&link.ends))
}

/// `<g>` for a node: box, label and, for parents, the child indicator.
pub fn node_element(node: &NodeFrame) -> SvgNode {
	let is_root = node.depth == 0;
	let mut group = SvgNode::new("g").attr("class", "node");
	if node.interactive {
		group = group
			.attr(NODE_ID_ATTR, node.id.as_str())
			.attr("style", "cursor: pointer");
	} else {
		group = group.attr("style", "pointer-events: none");
	}
	group = group
		.attr(
			"transform",
			format!("translate({},{})", node.position.y, node.position.x),
		)
		.attr("opacity", node.opacity);

	let (fill, stroke) = if is_root {
		(ROOT_FILL, ROOT_FILL)
	} else {
		(NODE_FILL, depth_color(node.depth))
	};
	let rect = SvgNode::new("rect")
		.attr("rx", 12)
		.attr("ry", 12)
		.attr("x", BOX_OFFSET.0)
		.attr("y", BOX_OFFSET.1)
		.attr("width", node.box_width)
		.attr("height", BOX_HEIGHT)
		.attr("fill", fill)
		.attr("stroke", stroke)
		.attr("stroke-width", 2);

	let (label_fill, size, weight) = if is_root {
		(ROOT_LABEL, 15, 700)
	} else {
		(NODE_LABEL, 13, 500)
	};
	let label = SvgNode::new("text")
		.attr("dy", "0.35em")
		.attr("x", 12)
		.attr("y", 0)
		.attr("text-anchor", "start")
		.attr("fill", label_fill)
		.attr(
			"style",
			format!(
				"font-family: {FONT_FAMILY}; font-size: {size}px; font-weight: {weight}; pointer-events: none"
			),
		)
		.text(&node.text);

	group = group.child(rect).child(label);
	if node.has_children {
		group = group.child(
			SvgNode::new("circle")
				.attr("r", BADGE_RADIUS)
				.attr("cx", node.box_width - 10.0)
				.attr("cy", 0)
				.attr("fill", depth_color(node.depth)),
		);
	}
	group
}

/// The transformed scene group with its link and node layers.
pub fn scene_element(frame: &SceneFrame, transform: &ViewTransform) -> SvgNode {
	let links = frame
		.links
		.iter()
		.fold(SvgNode::new("g").attr("class", "links"), |g, l| {
			g.child(link_element(l))
		});
	let nodes = frame
		.nodes
		.iter()
		.fold(SvgNode::new("g").attr("class", "nodes"), |g, n| {
			g.child(node_element(n))
		});
	SvgNode::new("g")
		.attr("transform", transform.to_svg())
		.child(links)
		.child(nodes)
}

/// A standalone SVG document of the frame as currently transformed.
pub fn document(frame: &SceneFrame, transform: &ViewTransform, width: f64, height: f64) -> String {
	let root = SvgNode::new("svg")
		.attr("xmlns", SVG_NS)
		.attr("width", width)
		.attr("height", height)
		.attr("viewBox", format!("0 0 {width} {height}"))
		.child(scene_element(frame, transform));
	let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
	root.write_xml(&mut out);
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::types::NodeId;

	fn frame_node(depth: u32, text: &str, has_children: bool) -> NodeFrame {
		NodeFrame {
			id: NodeId::from_raw(format!("id-{depth}")),
			text: text.into(),
			depth,
			has_children,
			box_width: 140.0,
			position: Point::new(20.0, 360.0),
			opacity: 1.0,
			interactive: true,
		}
	}

	#[test]
	fn depth_colors_cycle_after_palette() {
		assert_eq!(depth_color(1), PALETTE[0]);
		assert_eq!(depth_color(2), PALETTE[1]);
		assert_eq!(depth_color(11), depth_color(1));
	}

	#[test]
	fn root_is_styled_apart_from_children() {
		let root = node_element(&frame_node(0, "Space", true));
		let child = node_element(&frame_node(1, "Planets", false));
		assert_eq!(root.children[0].get("fill"), Some(ROOT_FILL));
		assert_eq!(child.children[0].get("fill"), Some(NODE_FILL));
		assert_eq!(child.children[0].get("stroke"), Some(depth_color(1)));
	}

	#[test]
	fn only_parents_carry_indicator() {
		assert_eq!(node_element(&frame_node(1, "a", true)).children.len(), 3);
		assert_eq!(node_element(&frame_node(1, "a", false)).children.len(), 2);
	}

	#[test]
	fn node_is_placed_on_swapped_axes() {
		let g = node_element(&frame_node(1, "a", false));
		assert_eq!(g.get("transform"), Some("translate(360,20)"));
	}

	#[test]
	fn exiting_nodes_are_not_addressable() {
		let mut node = frame_node(1, "a", false);
		node.interactive = false;
		let g = node_element(&node);
		assert_eq!(g.get(NODE_ID_ATTR), None);
		assert_eq!(g.get("style"), Some("pointer-events: none"));
	}

	#[test]
	fn link_path_is_horizontal_curve() {
		let ends = LinkEnds {
			source: Point::new(0.0, 130.0),
			target: Point::new(60.0, 350.0),
		};
		assert_eq!(link_path(&ends), "M130,0C240,0,240,60,350,60");
	}

	#[test]
	fn document_escapes_labels() {
		let frame = SceneFrame {
			links: Vec::new(),
			nodes: vec![frame_node(0, "R&D <core>", false)],
		};
		let doc = document(&frame, &ViewTransform::default(), 800.0, 600.0);
		assert!(doc.contains("R&amp;D &lt;core&gt;"));
		assert!(doc.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
		assert!(doc.contains(r#"transform="translate(0,0) scale(1)""#));
	}
}
