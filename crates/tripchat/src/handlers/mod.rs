//! HTTP request handlers.

mod chat;
mod health;
mod version;

pub use chat::{chat, method_not_allowed};
pub use health::{livez, readyz};
pub use version::version;
