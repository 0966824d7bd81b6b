//! Model provider settings.

use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
/// Default OpenAI-compatible model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Gemini model used for both generation and expansion.
pub const GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Which model backend to call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
	#[default]
	Gemini,
	#[serde(rename = "openai")]
	OpenAi,
}

impl Provider {
	/// Name shown in the loading overlay.
	pub fn label(self) -> &'static str {
		match self {
			Provider::Gemini => "gemini",
			Provider::OpenAi => "openai",
		}
	}
}

/// User-editable model settings, persisted as JSON.
///
/// Every field has a default so settings saved by older builds still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
	pub provider: Provider,
	pub openai_endpoint: String,
	pub openai_model: String,
	pub openai_api_key: String,
}

impl Default for AiSettings {
	fn default() -> Self {
		Self {
			provider: Provider::Gemini,
			openai_endpoint: DEFAULT_OPENAI_ENDPOINT.into(),
			openai_model: DEFAULT_OPENAI_MODEL.into(),
			openai_api_key: String::new(),
		}
	}
}

impl AiSettings {
	/// `.../chat/completions` under the configured endpoint.
	pub fn chat_completions_url(&self) -> String {
		format!("{}/chat/completions", self.openai_endpoint.trim_end_matches('/'))
	}
}

/// Gemini key baked in at build time.
pub fn gemini_api_key() -> Option<&'static str> {
	option_env!("GEMINI_API_KEY")
		.or(option_env!("API_KEY"))
		.filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_saved_settings_fill_defaults() {
		let s: AiSettings = serde_json::from_str(r#"{"provider":"openai","openaiApiKey":"sk-1"}"#).unwrap();
		assert_eq!(s.provider, Provider::OpenAi);
		assert_eq!(s.openai_api_key, "sk-1");
		assert_eq!(s.openai_model, DEFAULT_OPENAI_MODEL);
		assert_eq!(s.openai_endpoint, DEFAULT_OPENAI_ENDPOINT);
	}

	#[test]
	fn serializes_camel_case_keys() {
		let json = serde_json::to_value(AiSettings::default()).unwrap();
		assert_eq!(json["provider"], "gemini");
		assert!(json.get("openaiEndpoint").is_some());
		assert!(json.get("openaiModel").is_some());
	}

	#[test]
	fn endpoint_trailing_slash_is_trimmed() {
		let s = AiSettings {
			openai_endpoint: "http://localhost:8080/v1/".into(),
			..AiSettings::default()
		};
		assert_eq!(s.chat_completions_url(), "http://localhost:8080/v1/chat/completions");
	}
}
