use serde::{Deserialize, Serialize};

/// The full documentation value for one uploaded file, exactly as parsed
/// from the generation service's reply.
///
/// The service's output is passed through unmodified; parse success is the
/// only requirement, so downstream code must tolerate values that do not
/// match [`DocumentationEntry`]. The typed structs below describe the shape
/// the prompt asks for and are used to build the fallback entry.
pub type Documentation = serde_json::Value;

/// One inferred endpoint description.
///
/// Field names follow the JSON key contract of the generation prompt
/// (`"Endpoint"`, `"Example Value"`, …). Scalar fields that the model cannot
/// infer carry the literal placeholder `"-"` rather than being omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentationEntry {
    #[serde(rename = "Endpoint")]
    pub endpoint: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Parameters", default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(rename = "Request Body", default)]
    pub request_body: RequestBody,
    #[serde(rename = "Responses", default)]
    pub responses: Vec<ResponseSpec>,
    #[serde(rename = "Authentication", default = "placeholder")]
    pub authentication: String,
    #[serde(rename = "Other Details", default = "placeholder")]
    pub other_details: String,
    #[serde(rename = "Links", default = "placeholder")]
    pub links: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub param_type: String,
    /// Where the parameter lives: body, query, path, header. Free-form
    /// text from the model.
    #[serde(rename = "In")]
    pub location: String,
    /// Yes/No string, not a bool; part of the prompt's key contract.
    #[serde(rename = "Required")]
    pub required: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Example Value")]
    pub example_value: String,
}

/// A request body is either a full spec or the `"-"` placeholder string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    Spec(RequestBodySpec),
    Placeholder(String),
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Placeholder(placeholder())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBodySpec {
    #[serde(rename = "Content Type")]
    pub content_type: String,
    /// Schema as text, possibly multi-line JSON.
    #[serde(rename = "Schema")]
    pub schema: String,
    #[serde(rename = "Example Value")]
    pub example_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSpec {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Media Type")]
    pub media_type: String,
    #[serde(rename = "Schema", default = "placeholder")]
    pub schema: String,
    #[serde(rename = "Example Value", default = "placeholder")]
    pub example_value: String,
}

fn placeholder() -> String {
    "-".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_roundtrips_with_wire_keys() {
        let entry = DocumentationEntry {
            endpoint: "POST /api/v1/auth/register".into(),
            description: "Register a new user.".into(),
            parameters: vec![ParameterSpec {
                name: "email".into(),
                param_type: "string".into(),
                location: "body".into(),
                required: "Yes".into(),
                description: "User's email".into(),
                example_value: "user@example.com".into(),
            }],
            request_body: RequestBody::Spec(RequestBodySpec {
                content_type: "application/json".into(),
                schema: "{\n \"email\": \"string\"\n}".into(),
                example_value: "{\n \"email\": \"user@example.com\"\n}".into(),
            }),
            responses: vec![ResponseSpec {
                code: "201".into(),
                description: "Successful Response".into(),
                media_type: "application/json".into(),
                schema: "-".into(),
                example_value: "{ \"email\": \"user@example.com\" }".into(),
            }],
            authentication: "-".into(),
            other_details: "-".into(),
            links: "-".into(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"Endpoint\""));
        assert!(json.contains("\"Example Value\""));
        assert!(json.contains("\"Request Body\""));

        let back: DocumentationEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.endpoint, entry.endpoint);
        assert_eq!(back.parameters.len(), 1);
        assert_eq!(back.parameters[0].required, "Yes");
    }

    #[test]
    fn placeholder_request_body_serialises_as_dash() {
        let body = RequestBody::default();
        assert_eq!(serde_json::to_string(&body).unwrap(), "\"-\"");
    }

    #[test]
    fn missing_optional_fields_default_to_placeholder() {
        let entry: DocumentationEntry = serde_json::from_str(
            r#"{"Endpoint": "GET /health", "Description": "Liveness probe."}"#,
        )
        .unwrap();
        assert_eq!(entry.authentication, "-");
        assert_eq!(entry.other_details, "-");
        assert_eq!(entry.links, "-");
        assert!(entry.parameters.is_empty());
        assert!(matches!(entry.request_body, RequestBody::Placeholder(ref p) if p == "-"));
    }
}
