use anyhow::Result;
use serde_json::json;

/// Model identifier sent with every generation request.
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the client at a different service root. Used by tests to
    /// simulate an unreachable upstream.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send a multi-turn conversation and return the generated text.
    ///
    /// `turns` are `(role, text)` pairs in order ("user" or "model").
    /// The request constrains the reply to JSON via the response MIME type,
    /// so the returned string is expected (not guaranteed) to parse.
    pub async fn generate_json(&self, turns: &[(&str, &str)]) -> Result<String> {
        let contents: Vec<serde_json::Value> = turns
            .iter()
            .map(|(role, text)| {
                json!({
                    "role": role,
                    "parts": [{ "text": text }],
                })
            })
            .collect();

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, GEMINI_MODEL, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&json!({
                "contents": contents,
                "generationConfig": {
                    "responseMimeType": "application/json"
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Gemini API error ({}): {}",
                status,
                error_text
            ));
        }

        let response_json: serde_json::Value = response.json().await?;

        let text = response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("no text in Gemini response"))?
            .trim()
            .to_string();

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_upstream_is_an_error() {
        // Port 9 (discard) is never listening; the request fails fast with
        // a connection error instead of hanging.
        let client =
            GeminiClient::with_base_url("test-key".into(), "http://127.0.0.1:9".into());
        let result = client.generate_json(&[("user", "hello")]).await;
        assert!(result.is_err());
    }
}
