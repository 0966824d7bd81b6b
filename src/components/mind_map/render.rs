use std::collections::HashMap;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, Document, Element, HtmlAnchorElement, Url};

use super::scene::{LinkKey, SceneFrame};
use super::svg::{self, SVG_NS, SvgNode};
use super::types::NodeId;
use super::viewport::ViewTransform;

/// The `<svg>` element and the keyed elements drawn into it.
///
/// Elements are created once per key and updated in place on every frame,
/// so a node keeps its DOM identity across layout passes.
pub struct SvgSurface {
	document: Document,
	svg: Element,
	layer: Element,
	links_layer: Element,
	nodes_layer: Element,
	links: HashMap<LinkKey, Element>,
	nodes: HashMap<NodeId, Element>,
}

impl SvgSurface {
	/// Create the surface inside `container`.
	pub fn mount(container: &Element, width: f64, height: f64) -> Result<Self, JsValue> {
		let document = container
			.owner_document()
			.ok_or_else(|| JsValue::from_str("container is detached"))?;
		let svg = document.create_element_ns(Some(SVG_NS), "svg")?;
		svg.set_attribute("class", "mind-map-surface")?;
		svg.set_attribute("style", "display: block; width: 100%; height: 100%; touch-action: none;")?;
		let layer = document.create_element_ns(Some(SVG_NS), "g")?;
		let links_layer = document.create_element_ns(Some(SVG_NS), "g")?;
		links_layer.set_attribute("class", "links")?;
		let nodes_layer = document.create_element_ns(Some(SVG_NS), "g")?;
		nodes_layer.set_attribute("class", "nodes")?;

		layer.append_child(&links_layer)?;
		layer.append_child(&nodes_layer)?;
		svg.append_child(&layer)?;
		container.append_child(&svg)?;

		let surface = Self {
			document,
			svg,
			layer,
			links_layer,
			nodes_layer,
			links: HashMap::new(),
			nodes: HashMap::new(),
		};
		surface.resize(width, height)?;
		Ok(surface)
	}

	pub fn resize(&self, width: f64, height: f64) -> Result<(), JsValue> {
		self.svg.set_attribute("width", &width.to_string())?;
		self.svg.set_attribute("height", &height.to_string())?;
		self.svg
			.set_attribute("viewBox", &format!("0 0 {width} {height}"))
	}

	/// Bring the DOM in line with `frame`.
	pub fn render(&mut self, frame: &SceneFrame, transform: &ViewTransform) -> Result<(), JsValue> {
		self.layer.set_attribute("transform", &transform.to_svg())?;

		let live: Vec<(LinkKey, SvgNode)> = frame
			.links
			.iter()
			.map(|l| (l.key.clone(), svg::link_element(l)))
			.collect();
		sync_keyed(&self.document, &self.links_layer, &mut self.links, live)?;

		let live: Vec<(NodeId, SvgNode)> = frame
			.nodes
			.iter()
			.map(|n| (n.id.clone(), svg::node_element(n)))
			.collect();
		sync_keyed(&self.document, &self.nodes_layer, &mut self.nodes, live)
	}
}

fn sync_keyed<K: std::hash::Hash + Eq + Clone>(
	document: &Document,
	parent: &Element,
	elements: &mut HashMap<K, Element>,
	live: Vec<(K, SvgNode)>,
) -> Result<(), JsValue> {
	let mut next = HashMap::with_capacity(live.len());
	for (key, spec) in live {
		let el = match elements.remove(&key) {
			Some(el) => el,
			None => {
				let el = document.create_element_ns(Some(SVG_NS), spec.tag)?;
				parent.append_child(&el)?;
				el
			}
		};
		sync_element(document, &el, &spec)?;
		next.insert(key, el);
	}
	for stale in elements.values() {
		stale.remove();
	}
	*elements = next;
	Ok(())
}

fn sync_element(document: &Document, el: &Element, spec: &SvgNode) -> Result<(), JsValue> {
	for (name, value) in &spec.attrs {
		if el.get_attribute(name).as_deref() != Some(value.as_str()) {
			el.set_attribute(name, value)?;
		}
	}
	for name in el.get_attribute_names().iter().filter_map(|n| n.as_string()) {
		if spec.get(&name).is_none() {
			el.remove_attribute(&name)?;
		}
	}

	if let Some(text) = &spec.text {
		if el.text_content().as_deref() != Some(text.as_str()) {
			el.set_text_content(Some(text));
		}
		return Ok(());
	}

	let mut current = el.first_element_child();
	for child_spec in &spec.children {
		let child = match current.take() {
			Some(existing) if existing.tag_name() == child_spec.tag => existing,
			Some(existing) => {
				let fresh = document.create_element_ns(Some(SVG_NS), child_spec.tag)?;
				el.replace_child(&fresh, &existing)?;
				fresh
			}
			None => {
				let fresh = document.create_element_ns(Some(SVG_NS), child_spec.tag)?;
				el.append_child(&fresh)?;
				fresh
			}
		};
		sync_element(document, &child, child_spec)?;
		current = child.next_element_sibling();
	}
	while let Some(extra) = current {
		current = extra.next_element_sibling();
		extra.remove();
	}
	Ok(())
}

/// Offer `contents` to the user as a file download.
pub fn download_svg(document: &Document, contents: &str, filename: &str) -> Result<(), JsValue> {
	let parts = js_sys::Array::of1(&JsValue::from_str(contents));
	let options = BlobPropertyBag::new();
	options.set_type("image/svg+xml;charset=utf-8");
	let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
	let url = Url::create_object_url_with_blob(&blob)?;

	let link: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
	link.set_href(&url);
	link.set_download(filename);
	link.click();
	Url::revoke_object_url(&url)
}
