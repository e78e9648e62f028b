//! Client relay for the tripchat proxy.
//!
//! [`RelayClient`] forwards one message per call to `POST /api/chat`.
//! [`ChatSession`] wraps any [`Relay`] with the UI-side state: the transcript,
//! the selected provider and model, and the single in-flight send.

mod client;
mod error;
mod session;

pub use client::{Relay, RelayClient};
pub use error::RelayError;
pub use session::{
    ChatSession, ConversationTurn, DEFAULT_MODEL, DEFAULT_PROVIDER, Sender, error_text,
};
pub use tripchat_types::{Provider, RelayRequest, RelayResponse};
