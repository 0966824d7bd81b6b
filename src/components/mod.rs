//! Reusable views. `mind_map` is the diagram itself; the rest is page chrome.

mod error_toast;
pub mod mind_map;
mod settings_panel;

pub use error_toast::ErrorToast;
pub use settings_panel::SettingsPanel;
