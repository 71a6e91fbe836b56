use serde::{ Serialize, Deserialize };

use super::chat::Role;

/// Inline binary payload for an image part, base64-encoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

/// One piece of a turn's content: plain text or inline image data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline_data(blob: Blob) -> Self {
        Part::InlineData { inline_data: blob }
    }
}

/// One turn in the upstream "contents" sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

/// Which relay path the request targets. Unknown values fall through to the
/// single-prompt recommendation path, matching the permissive inbound contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    Chat,
    #[default]
    Recommendation,
}

impl<'de> Deserialize<'de> for EndpointType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: serde::Deserializer<'de> {
        let value = String::deserialize(deserializer)?;
        Ok(match value.as_str() {
            "chat" => EndpointType::Chat,
            _ => EndpointType::Recommendation,
        })
    }
}

/// Inbound payload accepted by the relay. Constructed fresh per call by the
/// client request shaper; never persisted on either side.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayRequest {
    pub endpoint_type: EndpointType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Content>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Blob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Success body returned by the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub text: String,
}

/// Error body returned by the relay on any failure branch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayError {
    pub error: String,
}
