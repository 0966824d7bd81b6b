//! Keyed scene reconciliation.
//!
//! The scene keeps one persistent element per tree node (keyed by node id)
//! and per link (keyed by the source/target id pair). Every layout pass is
//! reconciled against the live elements: new keys enter, surviving keys are
//! re-targeted from wherever they currently are, vanished keys fade out and
//! are dropped once their exit has finished.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::layout::{Point, TreeLayout};
use super::types::NodeId;

/// Durations (milliseconds) of the enter/update/exit transitions.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionConfig {
	pub enter_ms: f64,
	pub update_ms: f64,
	pub exit_ms: f64,
}

impl Default for TransitionConfig {
	fn default() -> Self {
		Self {
			enter_ms: 600.0,
			update_ms: 600.0,
			exit_ms: 400.0,
		}
	}
}

/// Cubic in-out easing on `[0, 1]`.
pub fn ease_cubic_in_out(t: f64) -> f64 {
	let t = t.clamp(0.0, 1.0);
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

trait Interpolate: Copy {
	fn interpolate(self, to: Self, t: f64) -> Self;
}

impl Interpolate for Point {
	fn interpolate(self, to: Self, t: f64) -> Self {
		self.lerp(to, t)
	}
}

/// Both endpoints of a link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkEnds {
	pub source: Point,
	pub target: Point,
}

impl Interpolate for LinkEnds {
	fn interpolate(self, to: Self, t: f64) -> Self {
		Self {
			source: self.source.lerp(to.source, t),
			target: self.target.lerp(to.target, t),
		}
	}
}

#[derive(Clone, Debug)]
struct Motion<G> {
	from: G,
	to: G,
	opacity_from: f64,
	opacity_to: f64,
	start: f64,
	duration: f64,
}

impl<G: Interpolate> Motion<G> {
	fn enter(to: G, now: f64, duration: f64) -> Self {
		Self {
			from: to,
			to,
			opacity_from: 0.0,
			opacity_to: 1.0,
			start: now,
			duration,
		}
	}

	fn progress(&self, now: f64) -> f64 {
		if self.duration <= 0.0 {
			return 1.0;
		}
		ease_cubic_in_out((now - self.start) / self.duration)
	}

	fn sample(&self, now: f64) -> (G, f64) {
		let t = self.progress(now);
		if t >= 1.0 {
			return (self.to, self.opacity_to);
		}
		(
			self.from.interpolate(self.to, t),
			self.opacity_from + (self.opacity_to - self.opacity_from) * t,
		)
	}

	/// Restart from the current sampled state towards a new target.
	fn retarget(&mut self, to: G, opacity_to: f64, now: f64, duration: f64) {
		let (from, opacity_from) = self.sample(now);
		*self = Self {
			from,
			to,
			opacity_from,
			opacity_to,
			start: now,
			duration,
		};
	}

	fn done(&self, now: f64) -> bool {
		now - self.start >= self.duration
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
	Entering,
	Present,
	Exiting,
}

#[derive(Clone, Debug)]
struct NodeElement {
	id: NodeId,
	text: String,
	depth: u32,
	has_children: bool,
	box_width: f64,
	phase: Phase,
	motion: Motion<Point>,
}

/// Link key: (source id, target id).
pub type LinkKey = (NodeId, NodeId);

#[derive(Clone, Debug)]
struct LinkElement {
	key: LinkKey,
	phase: Phase,
	motion: Motion<LinkEnds>,
}

/// Counts of what a reconcile pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
	pub entered_nodes: usize,
	pub updated_nodes: usize,
	pub exited_nodes: usize,
	pub entered_links: usize,
	pub updated_links: usize,
	pub exited_links: usize,
}

/// A node as it should be drawn at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeFrame {
	pub id: NodeId,
	pub text: String,
	pub depth: u32,
	pub has_children: bool,
	pub box_width: f64,
	pub position: Point,
	pub opacity: f64,
	/// False while the node is exiting.
	pub interactive: bool,
}

/// A link as it should be drawn at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkFrame {
	pub key: LinkKey,
	pub ends: LinkEnds,
	pub opacity: f64,
}

/// Everything visible at one instant, in draw order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneFrame {
	pub links: Vec<LinkFrame>,
	pub nodes: Vec<NodeFrame>,
}

/// Persistent visual elements of the mind map.
#[derive(Clone, Debug, Default)]
pub struct Scene {
	config: TransitionConfig,
	nodes: Vec<NodeElement>,
	links: Vec<LinkElement>,
}

impl Scene {
	/// An empty scene.
	pub fn new(config: TransitionConfig) -> Self {
		Self {
			config,
			nodes: Vec::new(),
			links: Vec::new(),
		}
	}

	/// Reconcile live elements against a new layout. `None` exits everything.
	pub fn reconcile(&mut self, layout: Option<&TreeLayout<'_>>, now: f64) -> ReconcileReport {
		let mut report = ReconcileReport::default();
		let cfg = self.config.clone();

		let targets: HashMap<&NodeId, usize> = layout
			.map(|l| l.nodes.iter().enumerate().map(|(i, n)| (&n.node.id, i)).collect())
			.unwrap_or_default();
		let mut seen: HashSet<NodeId> = HashSet::with_capacity(targets.len());

		for el in &mut self.nodes {
			match (layout, targets.get(&el.id)) {
				(Some(l), Some(&i)) => {
					let target = &l.nodes[i];
					el.text.clone_from(&target.node.text);
					el.depth = target.node.depth;
					el.has_children = target.node.has_children();
					el.box_width = target.box_width;
					el.phase = Phase::Present;
					el.motion.retarget(target.position(), 1.0, now, cfg.update_ms);
					seen.insert(el.id.clone());
					report.updated_nodes += 1;
				}
				_ if el.phase != Phase::Exiting => {
					let (here, _) = el.motion.sample(now);
					el.phase = Phase::Exiting;
					el.motion.retarget(here, 0.0, now, cfg.exit_ms);
					report.exited_nodes += 1;
				}
				_ => {}
			}
		}

		if let Some(l) = layout {
			for target in l.nodes.iter().filter(|n| !seen.contains(&n.node.id)) {
				self.nodes.push(NodeElement {
					id: target.node.id.clone(),
					text: target.node.text.clone(),
					depth: target.node.depth,
					has_children: target.node.has_children(),
					box_width: target.box_width,
					phase: Phase::Entering,
					motion: Motion::enter(target.position(), now, cfg.enter_ms),
				});
				report.entered_nodes += 1;
			}
		}

		let link_targets: HashMap<LinkKey, LinkEnds> = layout
			.map(|l| {
				l.links()
					.into_iter()
					.map(|g| {
						(
							(g.source_id, g.target_id),
							LinkEnds {
								source: g.source,
								target: g.target,
							},
						)
					})
					.collect()
			})
			.unwrap_or_default();
		let mut seen_links: HashSet<LinkKey> = HashSet::with_capacity(link_targets.len());

		for el in &mut self.links {
			match link_targets.get(&el.key) {
				Some(&ends) => {
					el.phase = Phase::Present;
					el.motion.retarget(ends, 1.0, now, cfg.update_ms);
					seen_links.insert(el.key.clone());
					report.updated_links += 1;
				}
				None if el.phase != Phase::Exiting => {
					let (here, _) = el.motion.sample(now);
					el.phase = Phase::Exiting;
					el.motion.retarget(here, 0.0, now, cfg.exit_ms);
					report.exited_links += 1;
				}
				None => {}
			}
		}

		if let Some(l) = layout {
			// Walk in layout order so new links are appended deterministically.
			for geometry in l.links() {
				let key = (geometry.source_id, geometry.target_id);
				if seen_links.contains(&key) {
					continue;
				}
				let ends = LinkEnds {
					source: geometry.source,
					target: geometry.target,
				};
				self.links.push(LinkElement {
					key,
					phase: Phase::Entering,
					motion: Motion::enter(ends, now, cfg.enter_ms),
				});
				report.entered_links += 1;
			}
		}

		debug!("reconcile: {report:?}");
		report
	}

	/// Drop elements whose exit transition has finished.
	pub fn prune(&mut self, now: f64) {
		self.nodes
			.retain(|el| el.phase != Phase::Exiting || !el.motion.done(now));
		self.links
			.retain(|el| el.phase != Phase::Exiting || !el.motion.done(now));
	}

	/// Whether any element is still mid-transition.
	pub fn is_animating(&self, now: f64) -> bool {
		self.nodes.iter().any(|el| !el.motion.done(now))
			|| self.links.iter().any(|el| !el.motion.done(now))
	}

	/// Number of live node elements, exiting ones included.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of live link elements, exiting ones included.
	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	/// Sample every element at `now`.
	pub fn frame(&self, now: f64) -> SceneFrame {
		let links = self
			.links
			.iter()
			.map(|el| {
				let (ends, opacity) = el.motion.sample(now);
				LinkFrame {
					key: el.key.clone(),
					ends,
					opacity,
				}
			})
			.collect();
		let nodes = self
			.nodes
			.iter()
			.map(|el| {
				let (position, opacity) = el.motion.sample(now);
				NodeFrame {
					id: el.id.clone(),
					text: el.text.clone(),
					depth: el.depth,
					has_children: el.has_children,
					box_width: el.box_width,
					position,
					opacity,
					interactive: el.phase != Phase::Exiting,
				}
			})
			.collect();
		SceneFrame { links, nodes }
	}
}
