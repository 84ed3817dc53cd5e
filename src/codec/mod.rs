//! Codecs - conversion between `Message` and WebSocket frames
//!
//! The session never looks inside a frame; it hands frames to a `Codec` and
//! gets messages back. Two codecs ship with the crate:
//! - `BinaryCodec`: OSC 1.0 binary packets (what osc.js `WebSocketPort` sends)
//! - `JsonCodec`: osc.js "metadata" JSON, `{address, args: [{type, value}]}`

mod binary;
mod json;

pub use binary::BinaryCodec;
pub use json::JsonCodec;

use crate::osc::{Message, OscError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One transport-level unit
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Binary(Bytes),
    Text(String),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Frame::Binary(b) => b.len(),
            Frame::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encoder/decoder between messages and frames
///
/// `decode` returns every message carried by the frame (a bundle carries
/// several); order is preserved.
pub trait Codec: Send + Sync {
    fn name(&self) -> &str;
    fn encode(&self, message: &Message) -> Result<Frame, OscError>;
    fn decode(&self, frame: &Frame) -> Result<Vec<Message>, OscError>;
}

/// Codec selection as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Binary,
    Json,
}

impl CodecKind {
    pub fn build(self) -> std::sync::Arc<dyn Codec> {
        match self {
            CodecKind::Binary => std::sync::Arc::new(BinaryCodec::new()),
            CodecKind::Json => std::sync::Arc::new(JsonCodec::new()),
        }
    }
}
