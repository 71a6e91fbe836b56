use async_trait::async_trait;
use log::{ debug, error };
use serde::Deserialize;

use super::{ GenerateRequest, GenerativeClient, UpstreamError };

#[derive(Deserialize, Default)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidatePart {
    text: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// `reqwest`-backed client for the Gemini `generateContent` REST endpoint.
/// The API key travels only in the upstream URL, never in logs or errors.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            model,
        }
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            api_key
        )
    }
}

/// First candidate, first part, or empty when the response shape is
/// unexpected (safety blocks return candidates without parts).
fn extract_text(response: GenerateContentResponse) -> String {
    response.candidates
        .first()
        .and_then(|candidate| candidate.content.parts.first())
        .map(|part| part.text.clone())
        .unwrap_or_default()
}

fn extract_error_message(body: &str) -> String {
    serde_json
        ::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .map(|detail| detail.message)
        .unwrap_or_else(|| "Gemini API Error".to_string())
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        request: GenerateRequest
    ) -> Result<String, UpstreamError> {
        debug!("GeminiClient::generate() → model={}", self.model);

        let response = self.http.post(self.endpoint(api_key)).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            error!("Gemini API returned {}: {}", status.as_u16(), message);
            return Err(UpstreamError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        Ok(extract_text(body))
    }
}
