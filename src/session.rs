//! Application state: the active tree, the one request allowed in flight,
//! and the last error.
//!
//! Every change to the tree replaces the held value wholesale. A request is
//! started with `begin_*`, which hands out a [`Ticket`]; the matching
//! `finish_*` only applies its result if no reset happened in between.

use std::fmt::Display;
use std::sync::Arc;

use log::{info, warn};

use crate::components::mind_map::{NodeId, TreeNode, merge};

/// Proof that a request was started, tied to the session epoch it began in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Ticket {
	epoch: u64,
}

/// Everything the home page shows outside the map itself.
#[derive(Clone, Debug, Default)]
pub struct Session {
	/// Contents of the topic input.
	pub topic: String,
	tree: Option<Arc<TreeNode>>,
	loading: bool,
	error: Option<String>,
	epoch: u64,
}

impl Session {
	/// A session showing a tree restored from storage, if any.
	pub fn restored(tree: Option<TreeNode>) -> Self {
		Self {
			tree: tree.map(Arc::new),
			..Self::default()
		}
	}

	/// The active tree.
	pub fn tree(&self) -> Option<&Arc<TreeNode>> {
		self.tree.as_ref()
	}

	/// Whether a request is in flight.
	pub fn is_loading(&self) -> bool {
		self.loading
	}

	/// Message of the last failed request, until dismissed.
	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	/// Whether the generate action is currently allowed.
	pub fn can_generate(&self) -> bool {
		!self.loading && !self.topic.trim().is_empty()
	}

	/// Start generating a map for the current topic.
	pub fn begin_generate(&mut self) -> Option<Ticket> {
		if !self.can_generate() {
			return None;
		}
		self.loading = true;
		self.error = None;
		Some(Ticket { epoch: self.epoch })
	}

	/// Start expanding a node of the current tree.
	pub fn begin_expand(&mut self) -> Option<Ticket> {
		if self.loading || self.tree.is_none() {
			return None;
		}
		self.loading = true;
		Some(Ticket { epoch: self.epoch })
	}

	fn settle(&mut self, ticket: Ticket) -> bool {
		if ticket.epoch != self.epoch {
			warn!("dropping result of a request made before the last reset");
			return false;
		}
		self.loading = false;
		true
	}

	fn fail(&mut self, err: impl Display, fallback: &str) {
		let message = err.to_string();
		self.error = Some(if message.trim().is_empty() {
			fallback.to_owned()
		} else {
			message
		});
	}

	/// Apply a generation result. Returns whether the session changed.
	pub fn finish_generate<E: Display>(&mut self, ticket: Ticket, result: Result<TreeNode, E>) -> bool {
		if !self.settle(ticket) {
			return false;
		}
		match result {
			Ok(tree) => {
				info!("generated map with {} nodes", tree.len());
				self.tree = Some(Arc::new(tree));
			}
			Err(err) => self.fail(err, "Failed to generate mind map."),
		}
		true
	}

	/// Merge an expansion result under `target`. A failure leaves the tree
	/// exactly as it was. Returns whether the session changed.
	pub fn finish_expand<E: Display>(
		&mut self,
		ticket: Ticket,
		target: &NodeId,
		result: Result<Vec<TreeNode>, E>,
	) -> bool {
		if !self.settle(ticket) {
			return false;
		}
		match (result, &self.tree) {
			(Ok(children), Some(root)) => {
				let merged = merge(root, target, children);
				if !Arc::ptr_eq(root, &merged) {
					info!("expanded {target}: tree now has {} nodes", merged.len());
				}
				self.tree = Some(merged);
			}
			(Ok(_), None) => {}
			(Err(err), _) => self.fail(err, "Failed to expand node."),
		}
		true
	}

	/// Back to the empty state. Any request in flight is abandoned.
	pub fn reset(&mut self) {
		self.tree = None;
		self.topic.clear();
		self.error = None;
		self.loading = false;
		self.epoch += 1;
	}

	/// Hide the error toast.
	pub fn dismiss_error(&mut self) {
		self.error = None;
	}
}
