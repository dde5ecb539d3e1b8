use crate::domain::model::ExplainSettings;
use crate::utils::error::{PgxError, Result};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Clinical-explanation collaborator backed by an OpenAI-compatible
/// chat-completions endpoint.
///
/// `generate` never fails: a disabled client, a missing key, or any
/// transport/status/body problem degrades to the templated fallback text, so
/// report generation cannot be blocked by the explanation service.
pub struct ExplanationClient {
    client: reqwest::Client,
    settings: ExplainSettings,
}

impl ExplanationClient {
    pub fn new(settings: ExplainSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    pub async fn generate(&self, drug: &str, gene: &str, phenotype: Option<&str>) -> String {
        if !self.settings.enabled {
            tracing::debug!("Explanation generation disabled, using template text");
            return fallback_explanation(drug, gene, phenotype);
        }

        let api_key = match self.settings.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                tracing::debug!("No explanation API key configured, using template text");
                return fallback_explanation(drug, gene, phenotype);
            }
        };

        match self.request(api_key, drug, gene, phenotype).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("🤖 Explanation request failed ({}), using template text", e);
                fallback_explanation(drug, gene, phenotype)
            }
        }
    }

    async fn request(
        &self,
        api_key: &str,
        drug: &str,
        gene: &str,
        phenotype: Option<&str>,
    ) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.settings.endpoint.trim_end_matches('/')
        );
        let prompt = build_prompt(drug, gene, phenotype);
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PgxError::ProcessingError {
                message: format!("explanation API returned status {}", response.status()),
            });
        }

        let payload: serde_json::Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| PgxError::ProcessingError {
                message: "explanation API response had no message content".to_string(),
            })
    }
}

fn build_prompt(drug: &str, gene: &str, phenotype: Option<&str>) -> String {
    format!(
        "Explain pharmacogenomic impact:\n\n\
         Drug: {}\n\
         Gene: {}\n\
         Phenotype: {}\n\n\
         Include:\n\
         - Mechanism\n\
         - Clinical impact\n\
         - Recommendation\n\
         Keep concise.",
        drug,
        gene,
        phenotype.unwrap_or("Unknown")
    )
}

/// Template text used whenever the explanation service is unavailable. The
/// collaborator only receives drug, gene, and phenotype, so the closing
/// recommendation slot carries the phenotype label.
pub fn fallback_explanation(drug: &str, gene: &str, phenotype: Option<&str>) -> String {
    let phenotype = phenotype.unwrap_or("Unknown");
    format!(
        "This patient has {} status for {}. This affects how {} is metabolized. Recommendation: {}.",
        phenotype, gene, drug, phenotype
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn settings(enabled: bool, endpoint: &str, api_key: Option<&str>) -> ExplainSettings {
        ExplainSettings {
            enabled,
            endpoint: endpoint.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.map(|k| k.to_string()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn fallback_template_carries_phenotype_in_both_slots() {
        let text = fallback_explanation("Codeine", "CYP2D6", Some("Poor metabolizer"));
        assert_eq!(
            text,
            "This patient has Poor metabolizer status for CYP2D6. This affects how Codeine is metabolized. Recommendation: Poor metabolizer."
        );
    }

    #[test]
    fn fallback_renders_missing_phenotype_as_unknown() {
        let text = fallback_explanation("Simvastatin", "SLCO1B1", None);
        assert!(text.starts_with("This patient has Unknown status for SLCO1B1."));
    }

    #[tokio::test]
    async fn disabled_client_uses_template_without_network() {
        let client = ExplanationClient::new(settings(false, "http://127.0.0.1:1", Some("key")));
        let text = client.generate("Codeine", "CYP2D6", Some("Poor metabolizer")).await;
        assert!(text.contains("Poor metabolizer status for CYP2D6"));
    }

    #[tokio::test]
    async fn missing_api_key_uses_template_without_network() {
        let client = ExplanationClient::new(settings(true, "http://127.0.0.1:1", None));
        let text = client.generate("Warfarin", "CYP2C9", Some("Poor metabolizer")).await;
        assert!(text.contains("Poor metabolizer status for CYP2C9"));
    }

    #[tokio::test]
    async fn successful_response_returns_generated_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key");
            then.status(200).json_body(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "CYP2D6 poor metabolizers cannot activate codeine."}}
                ]
            }));
        });

        let client = ExplanationClient::new(settings(true, &server.base_url(), Some("test-key")));
        let text = client.generate("Codeine", "CYP2D6", Some("Poor metabolizer")).await;

        mock.assert();
        assert_eq!(text, "CYP2D6 poor metabolizers cannot activate codeine.");
    }

    #[tokio::test]
    async fn server_error_falls_back_to_template() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500);
        });

        let client = ExplanationClient::new(settings(true, &server.base_url(), Some("test-key")));
        let text = client.generate("Codeine", "CYP2D6", Some("Poor metabolizer")).await;

        mock.assert();
        assert!(text.starts_with("This patient has Poor metabolizer status for CYP2D6."));
    }

    #[tokio::test]
    async fn unexpected_body_shape_falls_back_to_template() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(serde_json::json!({"unexpected": true}));
        });

        let client = ExplanationClient::new(settings(true, &server.base_url(), Some("test-key")));
        let text = client.generate("Simvastatin", "SLCO1B1", None).await;

        mock.assert();
        assert!(text.starts_with("This patient has Unknown status for SLCO1B1."));
    }
}
