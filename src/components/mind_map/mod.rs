//! Mind map core: tree model, expansion merge, layout, keyed scene, viewport
//! and the Leptos view that ties them to an SVG surface.

mod component;
pub mod layout;
pub mod merge;
mod render;
pub mod scene;
pub mod state;
pub mod svg;
pub mod types;
pub mod viewport;

pub use component::MindMapView;
pub use merge::merge;
pub use types::{NodeId, PLACEHOLDER_TEXT, TreeNode};
