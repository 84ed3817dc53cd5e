//! osc.js "metadata" JSON codec
//!
//! Wire form, one message per text frame:
//! `{"address":"/bar","args":[{"type":"s","value":"helloworld"},{"type":"i","value":1234}]}`

use super::{Codec, Frame};
use crate::osc::{Message, OscError, TypeTag, TypedValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
struct JsonMessage {
    address: String,
    #[serde(default)]
    args: Vec<JsonArg>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonArg {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    value: Value,
}

/// JSON messages in WebSocket text frames
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn encode(&self, message: &Message) -> Result<Frame, OscError> {
        // JSON has no representation for NaN or infinities
        let non_finite = message
            .args()
            .iter()
            .enumerate()
            .find(|(_, arg)| !is_finite(arg));
        if let Some((index, arg)) = non_finite {
            return Err(OscError::EncodeError(format!(
                "argument {} ({}) is not a finite number",
                index,
                arg.describe()
            )));
        }

        let wire = JsonMessage {
            address: message.address().to_string(),
            args: message
                .args()
                .iter()
                .map(|arg| JsonArg {
                    tag: arg.tag().to_string(),
                    value: arg.to_raw(),
                })
                .collect(),
        };
        let text = serde_json::to_string(&wire).map_err(|e| OscError::EncodeError(e.to_string()))?;
        Ok(Frame::Text(text))
    }

    fn decode(&self, frame: &Frame) -> Result<Vec<Message>, OscError> {
        let text = match frame {
            Frame::Text(text) => text,
            Frame::Binary(_) => {
                return Err(OscError::DecodeError(
                    "binary frame received by json codec".to_string(),
                ))
            },
        };

        let wire: JsonMessage =
            serde_json::from_str(text).map_err(|e| OscError::DecodeError(e.to_string()))?;

        let args = wire
            .args
            .iter()
            .map(|arg| {
                let mut chars = arg.tag.chars();
                let tag = match (chars.next(), chars.next()) {
                    (Some(c), None) => TypeTag::from_char(c),
                    _ => Err(OscError::DecodeError(format!("bad type tag '{}'", arg.tag))),
                }?;
                TypedValue::from_raw(tag, &arg.value)
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| match e {
                OscError::DecodeError(_) => e,
                other => OscError::DecodeError(other.to_string()),
            })?;

        let message =
            Message::new(wire.address, args).map_err(|e| OscError::DecodeError(e.to_string()))?;
        Ok(vec![message])
    }
}

fn is_finite(value: &TypedValue) -> bool {
    match value {
        TypedValue::Float32(v) => v.is_finite(),
        TypedValue::Float64(v) => v.is_finite(),
        _ => true,
    }
}
