use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::AiRecipeSuggestion;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SUGGESTION_COUNT: usize = 3;

/// Free-form recipe generation from a list of ingredient names.
///
/// This path is independent of the category ranking in `engine`: output is
/// non-deterministic and may be empty.
#[async_trait]
pub trait RecipeSuggester: Send + Sync {
    async fn suggest(&self, ingredients: &[String], count: usize)
        -> Result<Vec<AiRecipeSuggestion>>;
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send a single-turn text prompt and return the first candidate's text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ]
        });

        debug!(model = %self.model, "sending generateContent request");
        let resp = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini generateContent failed: {} - {}", status, body));
        }

        let data: GenerateContentResponse = resp.json().await.map_err(|e| e.without_url())?;
        let text = data
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl RecipeSuggester for GeminiClient {
    async fn suggest(
        &self,
        ingredients: &[String],
        count: usize,
    ) -> Result<Vec<AiRecipeSuggestion>> {
        if ingredients.is_empty() || count == 0 {
            return Ok(Vec::new());
        }
        let text = self.generate_text(&recipe_prompt(ingredients, count)).await?;
        Ok(parse_suggestions(&text))
    }
}

/// Prompt asking the model for `count` recipes as a `{"recipes": [...]}` object.
pub fn recipe_prompt(ingredients: &[String], count: usize) -> String {
    format!(
        r#"You are a cooking assistant.

Using these ingredients:
{}

Suggest {} recipes.

Return ONLY valid JSON in this format:
{{
  "recipes": [
    {{
      "name": "Recipe name",
      "description": "Short description",
      "ingredients": ["item1", "item2"],
      "instructions": "Step-by-step instructions"
    }}
  ]
}}"#,
        ingredients.join(", "),
        count
    )
}

/// Pull a JSON value out of model output that may be wrapped in markdown
/// fences or surrounded by prose.
pub fn extract_json(text: &str) -> Result<Value> {
    let cleaned = text
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "");
    let cleaned = cleaned.trim();

    if let Ok(value) = serde_json::from_str(cleaned) {
        return Ok(value);
    }

    let start = cleaned.find('{');
    let end = cleaned.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            Ok(serde_json::from_str(&cleaned[start..=end])?)
        }
        _ => Err(anyhow!("No JSON object found in model response")),
    }
}

/// Best-effort parse of a recipe-suggestion response. Anything unusable
/// yields an empty list rather than an error.
pub fn parse_suggestions(text: &str) -> Vec<AiRecipeSuggestion> {
    let value = match extract_json(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "discarding malformed recipe suggestions");
            return Vec::new();
        }
    };

    // Accept either {"recipes": [...]} or a bare array.
    let entries = match value {
        Value::Array(arr) => arr,
        Value::Object(mut obj) => match obj.remove("recipes") {
            Some(Value::Array(arr)) => arr,
            _ => {
                warn!("recipe suggestions response has no recipes array");
                return Vec::new();
            }
        },
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<AiRecipeSuggestion>(entry).ok())
        .filter(|s| !s.name.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_json() {
        let text = "```json\n{\"recipes\": []}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"recipes": []}));
    }

    #[test]
    fn extracts_json_surrounded_by_prose() {
        let text = "Sure! Here you go: {\"a\": {\"b\": 1}} Enjoy your meal.";
        assert_eq!(extract_json(text).unwrap(), json!({"a": {"b": 1}}));
    }

    #[test]
    fn extract_fails_without_json() {
        assert!(extract_json("I cannot help with that.").is_err());
        assert!(extract_json("} backwards {").is_err());
    }

    #[test]
    fn parses_recipes_and_fills_missing_fields() {
        let text = r#"{"recipes": [
            {"name": "Omelette", "description": "Quick", "ingredients": ["Eggs", "Milk"], "instructions": "Whisk and fry"},
            {"name": "Toast"},
            {"description": "nameless"},
            "garbage"
        ]}"#;
        let parsed = parse_suggestions(text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].ingredients, vec!["Eggs", "Milk"]);
        assert_eq!(parsed[1].name, "Toast");
        assert!(parsed[1].instructions.is_empty());
    }

    #[test]
    fn null_fields_keep_the_recipe() {
        let parsed = parse_suggestions(
            r#"{"recipes":[{"name":"Soup","description":null,"ingredients":["a"],"instructions":"x"}]}"#,
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Soup");
        assert!(parsed[0].description.is_empty());

        let parsed = parse_suggestions(
            r#"{"recipes":[{"name":"Salad","ingredients":"Lettuce, Tomato","instructions":null}]}"#,
        );
        assert_eq!(parsed[0].ingredients, vec!["Lettuce", "Tomato"]);
    }

    #[test]
    fn parses_bare_array() {
        let parsed = parse_suggestions(r#"[{"name": "Salad"}]"#);
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn malformed_or_empty_responses_yield_nothing() {
        assert!(parse_suggestions("").is_empty());
        assert!(parse_suggestions("not json at all").is_empty());
        assert!(parse_suggestions(r#"{"items": []}"#).is_empty());
        assert!(parse_suggestions(r#"{"recipes": "none"}"#).is_empty());
    }

    #[test]
    fn prompt_lists_ingredients_and_count() {
        let prompt = recipe_prompt(&["Milk".to_string(), "Eggs".to_string()], 4);
        assert!(prompt.contains("Milk, Eggs"));
        assert!(prompt.contains("Suggest 4 recipes"));
        assert!(prompt.contains("\"recipes\""));
    }

    #[tokio::test]
    async fn empty_ingredients_skip_the_network() {
        let client = GeminiClient::new("unused".to_string()).with_base_url("http://127.0.0.1:9");
        assert!(client.suggest(&[], 3).await.unwrap().is_empty());
    }

    #[test]
    fn builds_generate_url_without_the_key() {
        let client = GeminiClient::new("k3y".to_string())
            .with_model("gemini-test")
            .with_base_url("https://example.test/v1/");
        assert_eq!(
            client.generate_url(),
            "https://example.test/v1/models/gemini-test:generateContent"
        );
        assert_eq!(client.model(), "gemini-test");
    }

    #[tokio::test]
    async fn connection_errors_do_not_leak_the_key() {
        let client = GeminiClient::new("SUPERSECRET".to_string()).with_base_url("http://127.0.0.1:9");
        let err = client
            .suggest(&["Milk".to_string()], 1)
            .await
            .expect_err("nothing listens on port 9");
        assert!(!format!("{:#}", err).contains("SUPERSECRET"));
        assert!(!format!("{:?}", err).contains("SUPERSECRET"));
    }
}
