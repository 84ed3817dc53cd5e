//! Connection task - owns the socket for the lifetime of an open session
//!
//! Handles inbound frames, outbound sends and close requests one event at a
//! time, in arrival order.

use super::{Command, SessionState};
use crate::codec::{Codec, Frame};
use crate::dispatch::Dispatcher;
use crate::osc::OscError;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

pub(super) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Run until the remote closes, the socket fails, or `Command::Close` arrives
pub(super) async fn run(
    ws: WsStream,
    mut commands: mpsc::UnboundedReceiver<Command>,
    codec: Arc<dyn Codec>,
    dispatcher: Arc<Mutex<Dispatcher>>,
    state_tx: Arc<watch::Sender<SessionState>>,
) {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Send { frame, ack }) => {
                    let len = frame.len();
                    let result = write
                        .send(to_ws(frame))
                        .await
                        .map_err(|e| OscError::Transport(e.to_string()));
                    let failed = result.is_err();
                    if let Err(e) = &result {
                        warn!("Failed to write frame: {}", e);
                    } else {
                        trace!(bytes = len, "Frame written");
                    }
                    let _ = ack.send(result);
                    if failed {
                        break;
                    }
                },
                Some(Command::Close) | None => {
                    debug!("Close requested, sending close frame");
                    if let Err(e) = write.send(WsMessage::Close(None)).await {
                        debug!("Close frame not delivered: {}", e);
                    }
                    break;
                },
            },

            incoming = read.next() => match incoming {
                Some(Ok(WsMessage::Binary(data))) => {
                    handle_frame(&Frame::Binary(Bytes::from(data)), codec.as_ref(), &dispatcher);
                },
                Some(Ok(WsMessage::Text(text))) => {
                    handle_frame(&Frame::Text(text), codec.as_ref(), &dispatcher);
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    info!("🔌 Remote closed the connection: {:?}", frame);
                    break;
                },
                Some(Ok(_)) => {
                    trace!("Control frame");
                },
                Some(Err(e)) => {
                    warn!("🔌 WebSocket read error: {}", e);
                    break;
                },
                None => {
                    warn!("🔌 WebSocket stream ended");
                    break;
                },
            },
        }
    }

    state_tx.send_replace(SessionState::Closed);
    info!("OSC session closed");
}

/// Decode one frame and dispatch each message it carries, in order
///
/// Undecodable frames are logged and dropped; the session stays open.
fn handle_frame(frame: &Frame, codec: &dyn Codec, dispatcher: &Mutex<Dispatcher>) {
    let messages = match codec.decode(frame) {
        Ok(messages) => messages,
        Err(e) => {
            warn!(bytes = frame.len(), "Dropping frame: {}", e);
            return;
        },
    };

    let dispatcher = dispatcher.lock();
    for message in &messages {
        debug!("Received OSC: {}", message);
        dispatcher.dispatch(message);
    }
}

fn to_ws(frame: Frame) -> WsMessage {
    match frame {
        Frame::Binary(data) => WsMessage::Binary(data.to_vec()),
        Frame::Text(text) => WsMessage::Text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BinaryCodec;
    use crate::osc::{Message, TypedValue};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_handle_frame_dispatches_and_drops_garbage() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("/lang", move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        let dispatcher = Mutex::new(dispatcher);
        let codec = BinaryCodec::new();

        let message = Message::new("/lang", vec![TypedValue::Int32(1)]).unwrap();
        let frame = codec.encode(&message).unwrap();

        handle_frame(&frame, &codec, &dispatcher);
        handle_frame(&Frame::Binary(Bytes::from_static(b"junk")), &codec, &dispatcher);
        handle_frame(&Frame::Text("hello".to_string()), &codec, &dispatcher);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_to_ws_preserves_frame_kind() {
        assert!(matches!(
            to_ws(Frame::Binary(Bytes::from_static(b"/x"))),
            WsMessage::Binary(_)
        ));
        assert!(matches!(to_ws(Frame::Text("{}".to_string())), WsMessage::Text(_)));
    }
}
