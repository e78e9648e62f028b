//! Text rendering for turns and status lines.

use tripchat_client::{ConversationTurn, Provider, Sender};

pub fn turn(turn: &ConversationTurn) -> String {
    match turn.sender {
        Sender::User => format!("you> {}", turn.text),
        Sender::Assistant => format!("assistant> {}", turn.text),
    }
}

pub fn status(provider: Provider, model: Option<&str>) -> String {
    match (provider, model) {
        (Provider::OpenRouter, Some(model)) => format!("Connected to {model} via OpenRouter"),
        (Provider::OpenRouter, None) => "Connected to OpenRouter (server default model)".to_string(),
        (Provider::Gemini, _) => "Connected to Gemini".to_string(),
    }
}

pub fn thinking(provider: Provider, model: Option<&str>) -> String {
    match (provider, model) {
        (Provider::OpenRouter, Some(model)) => format!("{model} is thinking..."),
        _ => format!("{} is thinking...", provider.label()),
    }
}

pub fn welcome(provider: Provider, model: Option<&str>) -> String {
    format!(
        "Welcome! I'm your AI travel assistant. {}.\n\
         Ask me anything about trip planning or destinations. Type /help for commands.",
        status(provider, model)
    )
}
