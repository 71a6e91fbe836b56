pub mod retry;
pub mod session;

use std::time::Duration;

use log::{ error, info };
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::config::prompt::{
    recommendation_prompt,
    DEFAULT_RECOMMENDATION_REASON,
    DEFAULT_RECOMMENDATION_SERVICE,
    SYSTEM_INSTRUCTION,
};
use crate::models::api::{ Blob, Content, EndpointType, RelayError, RelayRequest, RelayResponse };

/// Wall-clock budget for one relay round trip.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

#[derive(Debug, Error)]
pub enum ShaperError {
    #[error("Connection timed out. AI System is unresponsive.")]
    Timeout,
    #[error("{message}")]
    Status { code: u16, message: String },
    #[error("Connection failed: {0}")]
    Transport(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub service: String,
    pub reason: String,
}

/// Client request shaper: turns chat and recommendation intents into relay
/// calls and classifies every outcome into something the UI can render.
pub struct RelayClient {
    endpoint: String,
    timeout: Duration,
}

impl RelayClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Shrink the transport budget; used by callers with tighter deadlines.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one chat turn. Never fails: any error comes back as a renderable
    /// alert string so the chat UI always has a model message to append.
    pub async fn send_chat(
        &self,
        history: Vec<Content>,
        message: &str,
        image: Option<Blob>,
    ) -> String {
        let payload = RelayRequest {
            endpoint_type: EndpointType::Chat,
            system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
            history: Some(history),
            message: Some(message.to_string()),
            image,
            prompt: None,
        };

        match self.call(&payload).await {
            Ok(text) => text,
            Err(err) => {
                error!("chat request failed: {}", err);
                format!("System Alert: {}", err)
            }
        }
    }

    /// Ask for the one best-fitting service package for a niche. Never fails:
    /// unparseable answers fall back to the fixed default recommendation and
    /// transport errors to an offline diagnosis.
    pub async fn get_recommendation(&self, niche: &str) -> Recommendation {
        let payload = RelayRequest {
            endpoint_type: EndpointType::Recommendation,
            prompt: Some(recommendation_prompt(niche)),
            ..Default::default()
        };

        match self.call(&payload).await {
            Ok(text) => parse_recommendation(&text),
            Err(err) => {
                error!("recommendation request failed: {}", err);
                Recommendation {
                    service: "System Offline".to_string(),
                    reason: format!("Diagnosis failed: {}", err),
                }
            }
        }
    }

    async fn call(&self, payload: &RelayRequest) -> Result<String, ShaperError> {
        info!("sending {:?} request to relay", payload.endpoint_type);
        retry::with_backoff(move || self.post(payload)).await
    }

    async fn post(&self, payload: &RelayRequest) -> Result<String, ShaperError> {
        let send = HTTP.post(&self.endpoint).json(payload).send();
        let response = match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                return Err(ShaperError::Transport(err.to_string()));
            }
            Err(_) => {
                return Err(ShaperError::Timeout);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json
                ::from_str::<RelayError>(&body)
                .ok()
                .map(|relay_error| relay_error.error)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| status_message(code));
            return Err(ShaperError::Status { code, message });
        }

        let body: RelayResponse = response
            .json().await
            .map_err(|err| ShaperError::Transport(err.to_string()))?;
        Ok(body.text)
    }
}

/// Status-keyed fallback text for error bodies the relay did not shape.
fn status_message(code: u16) -> String {
    match code {
        404 => "AI Backend Not Found (404). Relay function missing.".to_string(),
        502 => "AI System Rebooting (Bad Gateway). Please try again.".to_string(),
        500 => "Internal Server Error. Check API Key.".to_string(),
        429 | 503 => "AI System overloaded by traffic. Please retry shortly.".to_string(),
        _ => format!("Server Error ({})", code),
    }
}

/// Split on the first `|` only, trimming both fields. Zero pipes means the
/// model ignored the format; answer with the fixed default instead.
pub fn parse_recommendation(text: &str) -> Recommendation {
    match text.split_once('|') {
        Some((service, reason)) => Recommendation {
            service: service.trim().to_string(),
            reason: reason.trim().to_string(),
        },
        None => Recommendation {
            service: DEFAULT_RECOMMENDATION_SERVICE.to_string(),
            reason: DEFAULT_RECOMMENDATION_REASON.to_string(),
        },
    }
}
