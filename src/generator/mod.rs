use std::path::Path;

use anyhow::Result;
use thiserror::Error;

use crate::llm::GeminiClient;
use crate::models::{Documentation, DocumentationEntry, ResponseSpec};

/// Instruction turn sent ahead of every uploaded file.
const INSTRUCTION: &str = "You are an expert API documentation generator. Given the following file content, extract comprehensive API documentation.
The API documentation should be structured to clearly define each endpoint, its parameters, request body, responses, and any other relevant information.
Pay close attention to details like data types, required fields, example values, and response codes.
The documentation should be suitable for developers to understand and implement the API.

If you don't find any relevant information in the code, just assume it or put a \"-\" dash.
If any sub parts exist, then and only then give them. For example, if authentication exists, then only give authentication for that, else don't.";

/// Worked example presented as a model turn, pinning the exact JSON shape
/// expected back.
const WORKED_EXAMPLE: &str = r#"[
  {
    "Endpoint": "POST /api/v1/auth/register",
    "Description": "Register a new user.",
    "Parameters": [
      {
        "Name": "email",
        "Type": "string",
        "In": "body",
        "Required": "Yes",
        "Description": "User's email",
        "Example Value": "user@example.com"
      }
    ],
    "Request Body": {
      "Content Type": "application/json",
      "Schema": "{\n \"email\": \"string\"\n}",
      "Example Value": "{\n \"email\": \"user@example.com\"\n}"
    },
    "Responses": [
      {
        "Code": "201",
        "Description": "Successful Response",
        "Media Type": "application/json",
        "Schema": "-",
        "Example Value": "{ \"email\": \"user@example.com\" }"
      }
    ],
    "Authentication": "-",
    "Other Details": "-",
    "Links": "-"
  }
]"#;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("GOOGLE_API_KEY environment variable is not set")]
    MissingApiKey,
}

/// Generates endpoint documentation for a source file via the Gemini API.
///
/// Upstream failures never propagate: any error talking to the service or
/// parsing its reply is logged and replaced by a single fallback entry that
/// reports the failure in-band. Only a missing credential is returned as an
/// error.
pub struct DocGenerator {
    base_url: Option<String>,
}

impl DocGenerator {
    pub fn new() -> Self {
        Self { base_url: None }
    }

    /// Use a non-default service root. Tests point this at an unroutable
    /// address to exercise the fallback path.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
        }
    }

    /// Generate documentation for the given file text.
    pub async fn generate(&self, file_text: &str) -> Result<Documentation, GeneratorError> {
        let api_key = load_api_key()?;
        Ok(self.generate_or_fallback(api_key, file_text).await)
    }

    /// Read a file and generate documentation for its contents.
    ///
    /// Read and UTF-8 decode failures (e.g. binary uploads) take the same
    /// fallback path as upstream failures; the credential check still comes
    /// first.
    pub async fn generate_from_file(&self, path: &Path) -> Result<Documentation, GeneratorError> {
        let api_key = load_api_key()?;

        let file_text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("could not read upload as text: {e}");
                return Ok(fallback_documentation(&e.to_string()));
            }
        };

        Ok(self.generate_or_fallback(api_key, &file_text).await)
    }

    async fn generate_or_fallback(&self, api_key: String, file_text: &str) -> Documentation {
        match self.call_service(api_key, file_text).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!("error generating documentation: {e}");
                fallback_documentation(&e.to_string())
            }
        }
    }

    async fn call_service(&self, api_key: String, file_text: &str) -> Result<Documentation> {
        let client = match &self.base_url {
            Some(url) => GeminiClient::with_base_url(api_key, url.clone()),
            None => GeminiClient::new(api_key),
        };

        let reply = client
            .generate_json(&[
                ("user", INSTRUCTION),
                ("model", WORKED_EXAMPLE),
                ("user", file_text),
            ])
            .await?;

        // Parse success is the only requirement; the value is passed through
        // as-is even if it does not match the documented entry shape.
        let docs: Documentation = serde_json::from_str(&reply)?;
        Ok(docs)
    }
}

impl Default for DocGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// The single-entry documentation substituted when generation fails.
pub fn fallback_documentation(error: &str) -> Documentation {
    let entry = DocumentationEntry {
        endpoint: "GET /".into(),
        description: "Could not generate documentation. Error occurred during processing.".into(),
        parameters: vec![],
        request_body: Default::default(),
        responses: vec![ResponseSpec {
            code: "200".into(),
            description: "Successful Response".into(),
            media_type: "application/json".into(),
            schema: "-".into(),
            example_value: "{}".into(),
        }],
        authentication: "-".into(),
        other_details: format!("Error: {error}"),
        links: "-".into(),
    };

    serde_json::to_value(vec![entry]).expect("fallback entry is serialisable")
}

/// Load the Gemini credential from the environment, reading a local `.env`
/// file first if one exists.
fn load_api_key() -> Result<String, GeneratorError> {
    dotenvy::dotenv().ok();
    std::env::var("GOOGLE_API_KEY").map_err(|_| GeneratorError::MissingApiKey)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn worked_example_matches_the_documented_shape() {
        let entries: Vec<DocumentationEntry> = serde_json::from_str(WORKED_EXAMPLE).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].endpoint, "POST /api/v1/auth/register");
        assert_eq!(entries[0].parameters[0].required, "Yes");
    }

    #[test]
    fn fallback_reports_the_error_in_band() {
        let docs = fallback_documentation("connection refused");
        let entries = docs.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["Endpoint"], "GET /");
        assert_eq!(entries[0]["Responses"][0]["Code"], "200");
        assert!(
            entries[0]["Other Details"]
                .as_str()
                .unwrap()
                .contains("connection refused")
        );
    }

    #[tokio::test]
    #[serial]
    async fn missing_credential_is_a_configuration_error() {
        unsafe { std::env::remove_var("GOOGLE_API_KEY") };
        let generator = DocGenerator::new();
        let result = generator.generate("fn main() {}").await;
        assert!(matches!(result, Err(GeneratorError::MissingApiKey)));
    }

    #[tokio::test]
    #[serial]
    async fn upstream_failure_yields_fallback_not_error() {
        // Generation failures are deliberately reported inside a 2xx
        // documentation value, never as an error to the caller.
        unsafe { std::env::set_var("GOOGLE_API_KEY", "test-key") };
        let generator = DocGenerator::with_base_url("http://127.0.0.1:9");
        let docs = generator.generate("fn main() {}").await.unwrap();
        let entries = docs.as_array().unwrap();
        assert_eq!(entries[0]["Endpoint"], "GET /");
        assert!(
            entries[0]["Other Details"]
                .as_str()
                .unwrap()
                .starts_with("Error: ")
        );
        unsafe { std::env::remove_var("GOOGLE_API_KEY") };
    }
}
