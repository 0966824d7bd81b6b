//! Calls to the language-model backends.

use log::{debug, error};
use serde_json::{Value, json};

use super::outline::{expansion_topics, outline_tree};
use super::settings::{AiSettings, GEMINI_MODEL, Provider, gemini_api_key};
use crate::components::mind_map::TreeNode;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Errors from a model call. `Display` is the message shown to the user.
#[derive(thiserror::Error, Debug)]
pub enum AiError {
	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("{0}")]
	Api(String),

	#[error("OpenAI API error: {0}")]
	Status(u16),

	#[error("the model returned an unreadable response: {0}")]
	Malformed(String),

	#[error("no API key configured for {0}")]
	MissingKey(&'static str),
}

fn outline_prompt(topic: &str) -> String {
	format!(
		"Create a comprehensive mind map for the topic: \"{topic}\".\n\
		 Focus on key concepts, sub-topics, and interesting relations.\n\
		 Provide a structure with at least 5 main branches and 2-3 sub-branches each.\n\
		 Format as JSON matching this schema: {{ text: string, children: [ {{ text: string, children: [ {{ text: string }} ] }} ] }}"
	)
}

fn expansion_prompt(parent: &str) -> String {
	format!(
		"Given the node \"{parent}\", generate 4-5 relevant sub-topics to expand this mind map node.\n\
		 Format as JSON array of objects: [ {{ \"text\": \"string\" }} ]"
	)
}

fn outline_schema() -> Value {
	let leaf = json!({
		"type": "OBJECT",
		"properties": { "text": { "type": "STRING" } },
		"required": ["text"]
	});
	json!({
		"type": "OBJECT",
		"properties": {
			"text": { "type": "STRING" },
			"children": {
				"type": "ARRAY",
				"items": {
					"type": "OBJECT",
					"properties": {
						"text": { "type": "STRING" },
						"children": { "type": "ARRAY", "items": leaf }
					},
					"required": ["text"]
				}
			}
		},
		"required": ["text", "children"]
	})
}

fn topics_schema() -> Value {
	json!({
		"type": "ARRAY",
		"items": {
			"type": "OBJECT",
			"properties": { "text": { "type": "STRING" } },
			"required": ["text"]
		}
	})
}

fn parse_json(text: &str) -> Result<Value, AiError> {
	serde_json::from_str(text).map_err(|e| AiError::Malformed(e.to_string()))
}

/// Body of an OpenAI-compatible chat completion request.
pub fn openai_request(settings: &AiSettings, prompt: &str) -> Value {
	json!({
		"model": settings.openai_model,
		"messages": [{ "role": "user", "content": format!("{prompt}\nReturn ONLY valid JSON.") }],
		"response_format": { "type": "json_object" },
		"temperature": 0.7
	})
}

/// Body of a Gemini `generateContent` request.
pub fn gemini_request(prompt: &str, schema: Value) -> Value {
	json!({
		"contents": [{ "parts": [{ "text": prompt }] }],
		"generationConfig": {
			"responseMimeType": "application/json",
			"responseSchema": schema,
			"temperature": 0.7
		}
	})
}

/// JSON payload carried in a chat completion's first message.
pub fn openai_content(response: &Value) -> Result<Value, AiError> {
	let content = response
		.pointer("/choices/0/message/content")
		.and_then(Value::as_str)
		.ok_or_else(|| AiError::Malformed("missing message content".into()))?;
	parse_json(content)
}

/// JSON payload carried in a Gemini response's first candidate.
pub fn gemini_content(response: &Value, fallback: &str) -> Result<Value, AiError> {
	let text = response
		.pointer("/candidates/0/content/parts/0/text")
		.and_then(Value::as_str)
		.unwrap_or(fallback);
	parse_json(text)
}

async fn call_openai(settings: &AiSettings, prompt: &str) -> Result<Value, AiError> {
	let response = reqwest::Client::new()
		.post(settings.chat_completions_url())
		.bearer_auth(&settings.openai_api_key)
		.json(&openai_request(settings, prompt))
		.send()
		.await?;

	let status = response.status();
	if !status.is_success() {
		let body: Value = response.json().await.unwrap_or(Value::Null);
		return Err(match body.pointer("/error/message").and_then(Value::as_str) {
			Some(message) => AiError::Api(message.to_owned()),
			None => AiError::Status(status.as_u16()),
		});
	}
	openai_content(&response.json().await?)
}

async fn call_gemini(prompt: &str, schema: Value, fallback: &str) -> Result<Value, AiError> {
	let key = gemini_api_key().ok_or(AiError::MissingKey("gemini"))?;
	let response = reqwest::Client::new()
		.post(format!("{GEMINI_BASE}/{GEMINI_MODEL}:generateContent"))
		.header("x-goog-api-key", key)
		.json(&gemini_request(prompt, schema))
		.send()
		.await?;

	let status = response.status();
	if !status.is_success() {
		let body: Value = response.json().await.unwrap_or(Value::Null);
		return Err(AiError::Api(
			body.pointer("/error/message")
				.and_then(Value::as_str)
				.map(str::to_owned)
				.unwrap_or_else(|| format!("Gemini API error: {}", status.as_u16())),
		));
	}
	gemini_content(&response.json().await?, fallback)
}

/// Ask the configured model for an outline of `topic`.
pub async fn generate_outline(topic: &str, settings: &AiSettings) -> Result<TreeNode, AiError> {
	let prompt = outline_prompt(topic);
	let value = match settings.provider {
		Provider::Gemini => call_gemini(&prompt, outline_schema(), "{}").await,
		Provider::OpenAi => call_openai(settings, &prompt).await,
	}
	.inspect_err(|e| error!("outline generation failed: {e}"))?;
	let tree = outline_tree(&value);
	debug!("outline for {topic:?}: {} nodes", tree.len());
	Ok(tree)
}

/// Ask the configured model for sub-topics of `node_text`.
pub async fn expand_topic(node_text: &str, settings: &AiSettings) -> Result<Vec<TreeNode>, AiError> {
	let prompt = expansion_prompt(node_text);
	let value = match settings.provider {
		Provider::Gemini => call_gemini(&prompt, topics_schema(), "[]").await,
		Provider::OpenAi => call_openai(settings, &prompt).await,
	}
	.inspect_err(|e| error!("expansion of {node_text:?} failed: {e}"))?;
	let topics = expansion_topics(&value);
	debug!("expansion of {node_text:?}: {} topics", topics.len());
	Ok(topics)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn openai_body_asks_for_json_object() {
		let body = openai_request(&AiSettings::default(), "hi");
		assert_eq!(body["model"], "gpt-4o-mini");
		assert_eq!(body["response_format"]["type"], "json_object");
		assert!(
			body["messages"][0]["content"]
				.as_str()
				.unwrap()
				.ends_with("Return ONLY valid JSON.")
		);
	}

	#[test]
	fn gemini_body_carries_schema() {
		let body = gemini_request("hi", topics_schema());
		assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
		assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
	}

	#[test]
	fn extracts_openai_content() {
		let response = json!({
			"choices": [{ "message": { "content": "{\"topics\":[{\"text\":\"Mars\"}]}" } }]
		});
		let value = openai_content(&response).unwrap();
		assert_eq!(expansion_topics(&value)[0].text, "Mars");
	}

	#[test]
	fn gemini_without_candidates_uses_fallback() {
		let value = gemini_content(&json!({}), "[]").unwrap();
		assert!(expansion_topics(&value).is_empty());
	}

	#[test]
	fn non_json_content_is_malformed() {
		let response = json!({ "choices": [{ "message": { "content": "sorry, no" } }] });
		assert!(matches!(openai_content(&response), Err(AiError::Malformed(_))));
	}

	#[test]
	fn status_error_reads_like_a_message() {
		assert_eq!(AiError::Status(401).to_string(), "OpenAI API error: 401");
	}

	#[test]
	fn prompts_name_the_subject() {
		assert!(outline_prompt("Rust").contains("\"Rust\""));
		assert!(expansion_prompt("Ownership").contains("\"Ownership\""));
	}
}
