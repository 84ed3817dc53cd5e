//! OSC data model - typed arguments, messages and address matching
//!
//! Everything that crosses the wire is expressed with these types. Construction
//! validates: a `TypedValue` can never hold a payload its tag cannot represent,
//! and a `Message` always has an address starting with `/`.

mod error;
mod message;
mod types;

pub use error::OscError;
pub use message::{validate_pattern, Message, RESERVED_ADDRESS_CHARS};
pub use types::{TypeTag, TypedValue};
