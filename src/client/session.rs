use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;

use super::RelayClient;
use crate::config::prompt::{ faq_answer, IMAGE_HISTORY_MARKER, WELCOME_BANNER };
use crate::models::api::{ Blob, Content, Part };
use crate::models::chat::{ ConversationTurn, Role };

/// An uploaded image, held as its MIME type plus base64 payload.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: String,
}

impl ImageAttachment {
    /// Parse a `data:<mime>;base64,<payload>` URI, the form file pickers hand
    /// over. Anything else is rejected.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (mime_type, data) = rest.split_once(";base64,")?;
        if mime_type.is_empty() || data.is_empty() {
            return None;
        }
        Some(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: BASE64.encode(bytes),
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn as_blob(&self) -> Blob {
        Blob {
            mime_type: self.mime_type.clone(),
            data: self.data.clone(),
        }
    }
}

/// One chat widget's conversation: an append-only list of turns, owned by the
/// UI session and gone on reload. Index 0 is always the welcome banner.
pub struct ChatSession {
    turns: Vec<ConversationTurn>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            turns: vec![ConversationTurn {
                role: Role::Model,
                text: WELCOME_BANNER.to_string(),
                timestamp: Utc::now().timestamp_millis(),
                image: None,
            }],
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn push_user(&mut self, text: &str, image: Option<String>) {
        self.turns.push(ConversationTurn {
            role: Role::User,
            text: text.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            image,
        });
    }

    pub fn push_model(&mut self, text: &str) {
        self.turns.push(ConversationTurn {
            role: Role::Model,
            text: text.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            image: None,
        });
    }

    /// History for the upstream call. The welcome banner at index 0 is always
    /// dropped: the first forwarded turn must be user-authored. Image bytes
    /// are not replayed; prior uploads collapse to a marker text part.
    pub fn api_history(&self) -> Vec<Content> {
        self.turns
            .iter()
            .skip(1)
            .map(|turn| {
                let mut parts = Vec::new();
                if turn.image.is_some() {
                    parts.push(Part::text(IMAGE_HISTORY_MARKER));
                }
                parts.push(
                    Part::text(if turn.text.is_empty() {
                        " ".to_string()
                    } else {
                        turn.text.clone()
                    })
                );
                Content { role: turn.role, parts }
            })
            .collect()
    }

    /// Drive one send: record the user turn, answer from the FAQ table when it
    /// matches (text-only sends), otherwise round-trip through the relay. The
    /// model's reply (or the shaper's alert string) is always appended, so the
    /// session never ends a send without a renderable answer.
    pub async fn send(
        &mut self,
        client: &RelayClient,
        text: &str,
        image: Option<ImageAttachment>,
    ) -> &ConversationTurn {
        let text = text.trim();

        // Quick answers only apply to plain text; an image implies a request
        // for analysis.
        if image.is_none() {
            if let Some(answer) = faq_answer(text) {
                self.push_user(text, None);
                self.push_model(answer);
                return self.turns.last().unwrap();
            }
        }

        // History excludes the turn being sent; it travels as `message`.
        let history = self.api_history();
        self.push_user(text, image.as_ref().map(|attachment| attachment.to_data_uri()));

        let reply = client
            .send_chat(history, text, image.map(|attachment| attachment.as_blob()))
            .await;
        self.push_model(&reply);
        self.turns.last().unwrap()
    }
}
