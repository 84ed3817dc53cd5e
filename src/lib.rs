//! Baton client - Open Sound Control over WebSocket
//!
//! Receives OSC messages from a relay, routes them by address pattern to
//! handlers that update an observable state store, and sends typed OSC
//! messages back.
//!
//! ```text
//! WebSocket frame → Codec → Message → Dispatcher → handler → StateStore → observers
//! Message → Session::send → Codec → WebSocket frame
//! ```

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod osc;
pub mod profiles;
pub mod session;
pub mod state;

pub use codec::{BinaryCodec, Codec, CodecKind, Frame, JsonCodec};
pub use dispatch::{DispatchReport, Dispatcher, HandlerError, HandlerId};
pub use osc::{Message, OscError, TypeTag, TypedValue};
pub use session::{Endpoint, Session, SessionState};
pub use state::{StateStore, StateValue};
