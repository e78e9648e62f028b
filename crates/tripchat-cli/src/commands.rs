//! Parsing of prompt input into chat messages and slash commands.

use thiserror::Error;
use tripchat_client::Provider;

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Empty,
    Message(String),
    Command(Command),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Switch the upstream provider.
    Provider(Provider),
    /// Set the model override; `None` falls back to the server default.
    Model(Option<String>),
    History,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: /{0} (try /help)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown provider '{0}' (expected gemini or openrouter)")]
    Provider(String),
}

pub const HELP: &str = "\
/provider <gemini|openrouter>  switch provider
/model [id]                    set the OpenRouter model (blank for server default)
/history                       show the conversation so far
/help                          show this help
/quit                          leave";

pub fn parse(line: &str) -> Result<Input, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Input::Message(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "provider" => {
            if arg.is_empty() {
                return Err(CommandError::Usage("/provider <gemini|openrouter>"));
            }
            let provider = arg
                .parse()
                .map_err(|_| CommandError::Provider(arg.to_string()))?;
            Command::Provider(provider)
        }
        "model" => Command::Model(Some(arg.to_string()).filter(|m| !m.is_empty())),
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Input::Command(command))
}
