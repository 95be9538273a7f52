#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::TurnRequest;
use super::WireMessage;

/// Wire generations of `POST /send/message`. The two are incompatible, a
/// client speaks exactly one of them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ProtocolGeneration {
    /// Bare array of messages in, `{ "message": ... }` out.
    V1,
    /// `{ "messages": [...], "use_external_llm": bool }` in,
    /// `{ "response": ... }` out.
    V2,
}

impl ProtocolGeneration {
    pub fn parse(text: String) -> Option<ProtocolGeneration> {
        return ProtocolGeneration::iter().find(|e| return e.to_string() == text);
    }

    pub fn default_context_window(&self) -> usize {
        match self {
            ProtocolGeneration::V1 => return 2,
            ProtocolGeneration::V2 => return 4,
        }
    }

    pub fn supports_external_llm(&self) -> bool {
        return *self == ProtocolGeneration::V2;
    }

    pub fn encode(&self, request: &TurnRequest) -> TurnPayload {
        let messages = request.messages();
        match self {
            ProtocolGeneration::V1 => return TurnPayload::V1(messages),
            ProtocolGeneration::V2 => {
                return TurnPayload::V2 {
                    messages,
                    use_external_llm: request.use_external,
                }
            }
        }
    }

    pub fn decode_reply(&self, body: &str) -> Result<String> {
        let text = match self {
            ProtocolGeneration::V1 => serde_json::from_str::<V1Reply>(body)?.message,
            ProtocolGeneration::V2 => serde_json::from_str::<V2Reply>(body)?.response,
        };

        if text.trim().is_empty() {
            bail!("Backend replied with an empty message");
        }

        return Ok(text);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TurnPayload {
    V1(Vec<WireMessage>),
    V2 {
        messages: Vec<WireMessage>,
        use_external_llm: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct V1Reply {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2Reply {
    pub response: String,
}
