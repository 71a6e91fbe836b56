use serde::{ Serialize, Deserialize };

/// Author of a conversation turn. Serialized lowercase to match the wire format
/// expected by the upstream API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in a chat session, optionally carrying an uploaded image as a
/// base64 data URI. Turns are append-only and live only for the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}
