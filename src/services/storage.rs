//! Browser `localStorage` persistence for settings and the active tree.

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use web_sys::Storage;

use super::settings::AiSettings;
use crate::components::mind_map::TreeNode;

/// Key of the persisted [`AiSettings`].
pub const SETTINGS_KEY: &str = "mindspark_settings";
/// Key of the persisted active tree.
pub const TREE_KEY: &str = "mindspark_tree";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
	#[error("local storage is not available")]
	Unavailable,

	#[error("local storage rejected the write")]
	Rejected,

	#[error("stored value is not valid: {0}")]
	Serialization(#[from] serde_json::Error),
}

fn local_storage() -> Result<Storage, StorageError> {
	web_sys::window()
		.and_then(|w| w.local_storage().ok().flatten())
		.ok_or(StorageError::Unavailable)
}

fn read<T: DeserializeOwned>(key: &str) -> Result<Option<T>, StorageError> {
	let raw = local_storage()?
		.get_item(key)
		.map_err(|_| StorageError::Unavailable)?;
	raw.map(|raw| decode(&raw)).transpose()
}

fn write<T: Serialize>(key: &str, value: &T) -> Result<(), StorageError> {
	let raw = serde_json::to_string(value)?;
	local_storage()?
		.set_item(key, &raw)
		.map_err(|_| StorageError::Rejected)
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
	Ok(serde_json::from_str(raw)?)
}

/// Saved settings, or defaults when nothing usable is stored.
pub fn load_settings() -> AiSettings {
	match read::<AiSettings>(SETTINGS_KEY) {
		Ok(saved) => saved.unwrap_or_default(),
		Err(err) => {
			warn!("ignoring saved settings: {err}");
			AiSettings::default()
		}
	}
}

/// Persist `settings`. Failures are logged and otherwise ignored.
pub fn save_settings(settings: &AiSettings) {
	if let Err(err) = write(SETTINGS_KEY, settings) {
		warn!("could not save settings: {err}");
	}
}

/// The tree from the previous session, if one was saved. Depths and ids
/// are repaired so trees saved by older builds still lay out.
pub fn load_tree() -> Option<TreeNode> {
	match read::<TreeNode>(TREE_KEY) {
		Ok(tree) => tree.map(TreeNode::into_normalized_root),
		Err(err) => {
			warn!("discarding saved tree: {err}");
			None
		}
	}
}

/// Persist `tree`, or forget the saved one.
pub fn save_tree(tree: Option<&TreeNode>) {
	let result = match tree {
		Some(tree) => write(TREE_KEY, tree),
		None => local_storage().and_then(|s| s.remove_item(TREE_KEY).map_err(|_| StorageError::Rejected)),
	};
	if let Err(err) = result {
		warn!("could not save tree: {err}");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stored_tree_without_depths_is_repaired() {
		let tree = decode::<TreeNode>(
			r#"{"id":"x1","text":"Root","children":[{"id":"x2","text":"Child","children":[]}]}"#,
		)
		.unwrap()
		.into_normalized_root();
		assert_eq!(tree.children[0].depth, 1);
		assert!(!tree.expanded);
	}

	#[test]
	fn garbage_is_a_serialization_error() {
		assert!(matches!(decode::<TreeNode>("not json"), Err(StorageError::Serialization(_))));
	}

	#[test]
	fn settings_decode_through_same_path() {
		let s: AiSettings = decode(r#"{"provider":"gemini"}"#).unwrap();
		assert_eq!(s, AiSettings::default());
	}
}
