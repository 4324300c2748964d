// ============================================================================
// TEXT GENERATION — backend client + background job pipeline
// ============================================================================
//
// The backend owns prompts and model choice; this side sends the raw notes
// plus an action discriminator and gets structured text back. All calls run
// on worker threads and report through an mpsc channel so the UI thread
// never blocks on the network.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::mpsc::Sender;

/// Target length for a generated post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostLength {
    Short,
    Thoughtful,
}

impl PostLength {
    pub const ALL: [PostLength; 2] = [PostLength::Short, PostLength::Thoughtful];

    pub fn label(&self) -> &'static str {
        match self {
            PostLength::Short => "Short",
            PostLength::Thoughtful => "Thoughtful",
        }
    }
}

/// Which single card text field to regenerate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisualField {
    Headline,
    SubHeadline,
}

impl VisualField {
    fn wire_name(&self) -> &'static str {
        match self {
            VisualField::Headline => "headline",
            VisualField::SubHeadline => "subHeadline",
        }
    }
}

/// A full generation result: post body plus the two card text fields.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub post_text: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub sub_headline: String,
}

/// Abstraction over the generation backend so the app logic is testable
/// without a network.
pub trait TextGenerationClient: Send + Sync {
    /// Raw notes → post body + headline + sub-headline.
    fn generate_post(&self, raw_input: &str, length: PostLength) -> Result<GeneratedContent, String>;

    /// Produce a fresh post body from the same notes.
    fn regenerate_text(&self, raw_input: &str, length: PostLength) -> Result<String, String>;

    /// Produce a fresh value for one card text field.
    fn regenerate_field(&self, raw_input: &str, field: VisualField) -> Result<String, String>;
}

// ============================================================================
// HTTP client
// ============================================================================

#[derive(Serialize)]
struct ApiRequest<'a> {
    action: &'static str,
    #[serde(rename = "rawInput")]
    raw_input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

pub struct HttpTextGenerationClient {
    endpoint: String,
    http: reqwest::blocking::Client,
}

impl HttpTextGenerationClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Endpoint comes from `LINGENS_API_URL`; `None` means generation is
    /// unavailable and the UI disables its buttons.
    pub fn from_env() -> Option<Self> {
        std::env::var("LINGENS_API_URL").ok().map(Self::new)
    }

    fn post(&self, request: &ApiRequest<'_>) -> Result<serde_json::Value, String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Generation backend returned {}", response.status()));
        }
        response
            .json::<serde_json::Value>()
            .map_err(|e| format!("Invalid response body: {}", e))
    }
}

impl TextGenerationClient for HttpTextGenerationClient {
    fn generate_post(&self, raw_input: &str, length: PostLength) -> Result<GeneratedContent, String> {
        let body = self.post(&ApiRequest {
            action: "generatePost",
            raw_input,
            length: Some(length.label()),
            field: None,
        })?;
        serde_json::from_value(body).map_err(|e| format!("Malformed generation response: {}", e))
    }

    fn regenerate_text(&self, raw_input: &str, length: PostLength) -> Result<String, String> {
        let body = self.post(&ApiRequest {
            action: "regenerateText",
            raw_input,
            length: Some(length.label()),
            field: None,
        })?;
        extract_text(&body, &["postText"]).ok_or_else(|| "Response missing postText".to_string())
    }

    fn regenerate_field(&self, raw_input: &str, field: VisualField) -> Result<String, String> {
        let body = self.post(&ApiRequest {
            action: "regenerateVisualField",
            raw_input,
            length: None,
            field: Some(field.wire_name()),
        })?;
        // Backends answer with `text` or echo the field name as the key.
        extract_text(&body, &["text", field.wire_name()])
            .ok_or_else(|| format!("Response missing {} text", field.wire_name()))
    }
}

/// First non-empty string found under the given keys.
fn extract_text(body: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| body.get(k).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

// ============================================================================
// Background jobs
// ============================================================================

/// A generation request carried to a worker thread.
#[derive(Clone, Debug)]
pub enum GenerationJob {
    GeneratePost { raw_input: String, length: PostLength },
    RegenerateText { raw_input: String, length: PostLength },
    RegenerateField { raw_input: String, field: VisualField },
}

/// Result delivered back to the UI thread through the update channel.
#[derive(Debug)]
pub enum GenerationUpdate {
    PostGenerated(GeneratedContent),
    TextRegenerated(String),
    FieldRegenerated(VisualField, String),
    Failed(String),
}

/// Run a generation job on a worker thread, delivering the outcome through
/// `tx`. A dropped receiver just discards the result.
pub fn spawn_generation(
    client: Arc<dyn TextGenerationClient>,
    job: GenerationJob,
    tx: Sender<GenerationUpdate>,
) {
    std::thread::spawn(move || {
        let update = match job {
            GenerationJob::GeneratePost { raw_input, length } => {
                match client.generate_post(&raw_input, length) {
                    Ok(content) => GenerationUpdate::PostGenerated(content),
                    Err(e) => GenerationUpdate::Failed(e),
                }
            }
            GenerationJob::RegenerateText { raw_input, length } => {
                match client.regenerate_text(&raw_input, length) {
                    Ok(text) => GenerationUpdate::TextRegenerated(text),
                    Err(e) => GenerationUpdate::Failed(e),
                }
            }
            GenerationJob::RegenerateField { raw_input, field } => {
                match client.regenerate_field(&raw_input, field) {
                    Ok(text) => GenerationUpdate::FieldRegenerated(field, text),
                    Err(e) => GenerationUpdate::Failed(e),
                }
            }
        };
        let _ = tx.send(update);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generate_request_serializes_to_wire_shape() {
        let req = ApiRequest {
            action: "generatePost",
            raw_input: "shipped a thing",
            length: Some(PostLength::Thoughtful.label()),
            field: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "generatePost",
                "rawInput": "shipped a thing",
                "length": "Thoughtful"
            })
        );
    }

    #[test]
    fn field_request_omits_length() {
        let req = ApiRequest {
            action: "regenerateVisualField",
            raw_input: "notes",
            length: None,
            field: Some(VisualField::SubHeadline.wire_name()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "regenerateVisualField",
                "rawInput": "notes",
                "field": "subHeadline"
            })
        );
    }

    #[test]
    fn generated_content_parses_camel_case() {
        let content: GeneratedContent = serde_json::from_str(
            r#"{"postText":"body","headline":"Big idea","subHeadline":"small print"}"#,
        )
        .unwrap();
        assert_eq!(content.post_text, "body");
        assert_eq!(content.headline, "Big idea");
        assert_eq!(content.sub_headline, "small print");
    }

    #[test]
    fn missing_card_fields_default_to_empty() {
        let content: GeneratedContent = serde_json::from_str(r#"{"postText":"body"}"#).unwrap();
        assert_eq!(content.headline, "");
        assert_eq!(content.sub_headline, "");
    }

    #[test]
    fn field_responses_accept_either_key() {
        let generic = serde_json::json!({"text": "fresh take"});
        assert_eq!(
            extract_text(&generic, &["text", "headline"]),
            Some("fresh take".to_string())
        );

        let named = serde_json::json!({"subHeadline": "quieter line"});
        assert_eq!(
            extract_text(&named, &["text", "subHeadline"]),
            Some("quieter line".to_string())
        );

        let empty = serde_json::json!({"text": ""});
        assert_eq!(extract_text(&empty, &["text"]), None);
    }

    struct StubClient;

    impl TextGenerationClient for StubClient {
        fn generate_post(&self, raw: &str, length: PostLength) -> Result<GeneratedContent, String> {
            Ok(GeneratedContent {
                post_text: format!("{} ({})", raw, length.label()),
                headline: "H".to_string(),
                sub_headline: "S".to_string(),
            })
        }
        fn regenerate_text(&self, _: &str, _: PostLength) -> Result<String, String> {
            Ok("again".to_string())
        }
        fn regenerate_field(&self, _: &str, field: VisualField) -> Result<String, String> {
            Ok(field.wire_name().to_string())
        }
    }

    #[test]
    fn spawned_job_reports_through_channel() {
        let (tx, rx) = std::sync::mpsc::channel();
        spawn_generation(
            Arc::new(StubClient),
            GenerationJob::GeneratePost {
                raw_input: "notes".to_string(),
                length: PostLength::Short,
            },
            tx,
        );
        match rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap() {
            GenerationUpdate::PostGenerated(content) => {
                assert_eq!(content.post_text, "notes (Short)");
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn field_job_carries_the_field_back() {
        let (tx, rx) = std::sync::mpsc::channel();
        spawn_generation(
            Arc::new(StubClient),
            GenerationJob::RegenerateField {
                raw_input: "notes".to_string(),
                field: VisualField::SubHeadline,
            },
            tx,
        );
        match rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap() {
            GenerationUpdate::FieldRegenerated(field, text) => {
                assert_eq!(field, VisualField::SubHeadline);
                assert_eq!(text, "subHeadline");
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }
}
