//! Chat session state: transcript, provider selection, and single-flight sends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;
use tripchat_types::{Provider, RelayRequest};

use crate::client::Relay;
use crate::error::RelayError;

pub const DEFAULT_PROVIDER: Provider = Provider::OpenRouter;
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet:beta";

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sender: Sender,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }

    /// Whether this is an assistant turn that reports a failure.
    pub fn is_error(&self) -> bool {
        self.sender == Sender::Assistant && self.text.starts_with("Error:")
    }
}

/// Formats a relay failure as the assistant's reply.
pub fn error_text(err: &RelayError) -> String {
    format!("Error: {err}. Please try again or switch to a different AI provider.")
}

#[derive(Debug, Clone)]
struct Selection {
    provider: Provider,
    model: Option<String>,
}

/// A UI session. History lives only as long as the session.
///
/// At most one send is in flight; a second `submit` while one is pending
/// fails with [`RelayError::Busy`] and leaves the transcript untouched.
pub struct ChatSession {
    relay: Arc<dyn Relay>,
    turns: Mutex<Vec<ConversationTurn>>,
    selection: Mutex<Selection>,
    pending: AtomicBool,
}

impl ChatSession {
    pub fn new(relay: Arc<dyn Relay>) -> Self {
        Self {
            relay,
            turns: Mutex::new(Vec::new()),
            selection: Mutex::new(Selection {
                provider: DEFAULT_PROVIDER,
                model: Some(DEFAULT_MODEL.to_string()),
            }),
            pending: AtomicBool::new(false),
        }
    }

    pub fn provider(&self) -> Provider {
        lock(&self.selection).provider
    }

    pub fn model(&self) -> Option<String> {
        lock(&self.selection).model.clone()
    }

    pub fn set_provider(&self, provider: Provider) {
        lock(&self.selection).provider = provider;
    }

    /// Set the model override. Blank clears it, leaving the server default.
    pub fn set_model(&self, model: Option<String>) {
        lock(&self.selection).model = model.filter(|m| !m.trim().is_empty());
    }

    /// True while a send is outstanding; input should be disabled.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Snapshot of the transcript in insertion order.
    pub fn history(&self) -> Vec<ConversationTurn> {
        lock(&self.turns).clone()
    }

    /// Send one user turn and record the reply.
    ///
    /// Returns the assistant turn that was appended. Relay failures are not
    /// returned as errors: they become an `Error:` assistant turn so the
    /// transcript stays the single feedback channel. Only empty input and
    /// overlapping sends are reported as `Err`.
    pub async fn submit(&self, text: &str) -> Result<ConversationTurn, RelayError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RelayError::Validation);
        }

        let _flight = InFlight::acquire(&self.pending)?;

        lock(&self.turns).push(ConversationTurn::user(text));

        let request = {
            let selection = lock(&self.selection);
            RelayRequest {
                message: text.to_string(),
                provider: selection.provider,
                model: selection.model.clone(),
            }
        };

        let reply = match self.relay.send(&request).await {
            Ok(response) => ConversationTurn::assistant(response),
            Err(err) => {
                warn!(provider = %request.provider, error = %err, "Relay failed");
                ConversationTurn::assistant(error_text(&err))
            }
        };

        lock(&self.turns).push(reply.clone());
        Ok(reply)
    }
}

/// Clears the pending flag on drop, including when the send future is cancelled.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, RelayError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| RelayError::Busy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
