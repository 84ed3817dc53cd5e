//! OSC 1.0 binary codec backed by `rosc`

use super::{Codec, Frame};
use crate::osc::{Message, OscError, TypedValue};
use bytes::Bytes;
use rosc::{OscMessage, OscPacket, OscType};

/// Binary OSC packets in WebSocket binary frames
#[derive(Debug, Clone, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for BinaryCodec {
    fn name(&self) -> &str {
        "binary"
    }

    fn encode(&self, message: &Message) -> Result<Frame, OscError> {
        let packet = OscPacket::Message(OscMessage {
            addr: message.address().to_string(),
            args: message.args().iter().map(to_osc_type).collect(),
        });
        let buf = rosc::encoder::encode(&packet).map_err(|e| OscError::EncodeError(e.to_string()))?;
        Ok(Frame::Binary(Bytes::from(buf)))
    }

    fn decode(&self, frame: &Frame) -> Result<Vec<Message>, OscError> {
        let data = match frame {
            Frame::Binary(data) => data,
            Frame::Text(_) => {
                return Err(OscError::DecodeError(
                    "text frame received by binary codec".to_string(),
                ))
            },
        };

        let (rest, packet) =
            rosc::decoder::decode_udp(data).map_err(|e| OscError::DecodeError(e.to_string()))?;
        if !rest.is_empty() {
            return Err(OscError::DecodeError(format!(
                "{} trailing bytes after packet",
                rest.len()
            )));
        }

        let mut messages = Vec::new();
        flatten(packet, &mut messages)?;
        Ok(messages)
    }
}

/// Collect messages from a packet, descending into nested bundles
fn flatten(packet: OscPacket, out: &mut Vec<Message>) -> Result<(), OscError> {
    match packet {
        OscPacket::Message(msg) => {
            let args = msg
                .args
                .into_iter()
                .map(from_osc_type)
                .collect::<Result<Vec<_>, _>>()?;
            let message = Message::new(msg.addr, args)
                .map_err(|e| OscError::DecodeError(e.to_string()))?;
            out.push(message);
        },
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out)?;
            }
        },
    }
    Ok(())
}

fn to_osc_type(value: &TypedValue) -> OscType {
    match value {
        TypedValue::String(s) => OscType::String(s.clone()),
        TypedValue::Int32(n) => OscType::Int(*n),
        TypedValue::Float32(v) => OscType::Float(*v),
        TypedValue::Int64(n) => OscType::Long(*n),
        TypedValue::Float64(v) => OscType::Double(*v),
        TypedValue::Blob(b) => OscType::Blob(b.clone()),
        TypedValue::Bool(b) => OscType::Bool(*b),
        TypedValue::Nil => OscType::Nil,
    }
}

fn from_osc_type(value: OscType) -> Result<TypedValue, OscError> {
    match value {
        OscType::String(s) => Ok(TypedValue::String(s)),
        OscType::Int(n) => Ok(TypedValue::Int32(n)),
        OscType::Float(v) => Ok(TypedValue::Float32(v)),
        OscType::Long(n) => Ok(TypedValue::Int64(n)),
        OscType::Double(v) => Ok(TypedValue::Float64(v)),
        OscType::Blob(b) => Ok(TypedValue::Blob(b)),
        OscType::Bool(b) => Ok(TypedValue::Bool(b)),
        OscType::Nil => Ok(TypedValue::Nil),
        other => Err(OscError::DecodeError(format!(
            "unsupported argument type {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{OscBundle, OscTime};

    fn bar() -> Message {
        Message::new(
            "/bar",
            vec![
                TypedValue::from("helloworld"),
                TypedValue::Int32(1234),
                TypedValue::Float32(567.89),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_bar_round_trip() {
        let codec = BinaryCodec::new();
        let frame = codec.encode(&bar()).unwrap();
        assert!(matches!(frame, Frame::Binary(_)));

        let decoded = codec.decode(&frame).unwrap();
        assert_eq!(decoded, vec![bar()]);
    }

    #[test]
    fn test_encoded_layout_is_osc_1_0() {
        let codec = BinaryCodec::new();
        let message = Message::new("/lang", vec![TypedValue::Int32(2)]).unwrap();
        let Frame::Binary(bytes) = codec.encode(&message).unwrap() else {
            panic!("expected binary frame");
        };

        // "/lang" padded to 8, ",i" padded to 4, big-endian int32
        assert_eq!(&bytes[..8], b"/lang\0\0\0");
        assert_eq!(&bytes[8..12], b",i\0\0");
        assert_eq!(&bytes[12..], &[0, 0, 0, 2]);
    }

    #[test]
    fn test_bundle_flattens_in_order() {
        let first = Message::new("/detecting", vec![TypedValue::Int32(1)]).unwrap();
        let second = Message::new("/lang", vec![TypedValue::Int32(3)]).unwrap();

        let packet = OscPacket::Bundle(OscBundle {
            timetag: OscTime::from((0, 1)),
            content: vec![
                OscPacket::Message(OscMessage {
                    addr: "/detecting".to_string(),
                    args: vec![OscType::Int(1)],
                }),
                OscPacket::Bundle(OscBundle {
                    timetag: OscTime::from((0, 1)),
                    content: vec![OscPacket::Message(OscMessage {
                        addr: "/lang".to_string(),
                        args: vec![OscType::Int(3)],
                    })],
                }),
            ],
        });
        let bytes = rosc::encoder::encode(&packet).unwrap();

        let decoded = BinaryCodec::new()
            .decode(&Frame::Binary(Bytes::from(bytes)))
            .unwrap();
        assert_eq!(decoded, vec![first, second]);
    }

    #[test]
    fn test_rejects_garbage_and_text() {
        let codec = BinaryCodec::new();
        assert!(matches!(
            codec.decode(&Frame::Binary(Bytes::from_static(b"\x01\x02\x03"))),
            Err(OscError::DecodeError(_))
        ));
        assert!(matches!(
            codec.decode(&Frame::Text("{}".to_string())),
            Err(OscError::DecodeError(_))
        ));
    }

    #[test]
    fn test_rejects_unsupported_argument_type() {
        let packet = OscPacket::Message(OscMessage {
            addr: "/c".to_string(),
            args: vec![OscType::Char('x')],
        });
        let bytes = rosc::encoder::encode(&packet).unwrap();
        let result = BinaryCodec::new().decode(&Frame::Binary(Bytes::from(bytes)));
        assert!(matches!(result, Err(OscError::DecodeError(_))));
    }
}
