mod commands;
mod render;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use tracing_subscriber::EnvFilter;
use tripchat_client::{ChatSession, Provider, RelayClient, RelayError};

use commands::{Command, Input};

/// Chat with the Travel Craft assistant through a tripchat server.
#[derive(Parser)]
#[command(name = "tripchat-cli", version)]
struct Cli {
    /// Base URL of the tripchat server.
    #[arg(long, env = "TRIPCHAT_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// Provider to start with (gemini or openrouter).
    #[arg(long)]
    provider: Option<Provider>,

    /// OpenRouter model to start with.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session = ChatSession::new(Arc::new(RelayClient::new(&cli.server)));
    if let Some(provider) = cli.provider {
        session.set_provider(provider);
    }
    if cli.model.is_some() {
        session.set_model(cli.model);
    }

    println!(
        "{}",
        render::welcome(session.provider(), session.model().as_deref())
    );

    let mut editor = Reedline::create();
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("tripchat".to_string()),
        DefaultPromptSegment::Empty,
    );

    loop {
        let line = match editor.read_line(&prompt).context("failed to read input")? {
            Signal::Success(line) => line,
            Signal::CtrlC => continue,
            _ => break,
        };

        let input = match commands::parse(&line) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match input {
            Input::Empty => {}
            Input::Message(text) => {
                let model = session.model();
                eprintln!("{}", render::thinking(session.provider(), model.as_deref()));
                match session.submit(&text).await {
                    Ok(reply) => println!("{}", render::turn(&reply)),
                    Err(RelayError::Busy) => eprintln!("Still waiting for the previous reply."),
                    Err(e) => eprintln!("{e}"),
                }
            }
            Input::Command(Command::Provider(provider)) => {
                session.set_provider(provider);
                println!("{}", render::status(provider, session.model().as_deref()));
            }
            Input::Command(Command::Model(model)) => {
                session.set_model(model);
                println!(
                    "{}",
                    render::status(session.provider(), session.model().as_deref())
                );
            }
            Input::Command(Command::History) => {
                for turn in session.history() {
                    println!("{}", render::turn(&turn));
                }
            }
            Input::Command(Command::Help) => println!("{}", commands::HELP),
            Input::Command(Command::Quit) => break,
        }
    }

    Ok(())
}
