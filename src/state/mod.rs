//! Observable state - named slots updated by handlers, read by the UI side
//!
//! The dispatcher's handlers are the only writers. Observers are called
//! synchronously on every write, which is how a UI collaborator learns about
//! changes (e.g. "detected-visible" flipping to true).

mod store;
mod types;

pub use store::StateStore;
pub use types::{StateValue, SubscriptionId};
