//! Cassia Terminal Chat
//!
//! Entry point: CLI parsing, logging setup, the one-shot location lookup,
//! and the interactive transcript loop.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use dialoguer::Input;
use tracing_subscriber::EnvFilter;

use cassia::agent::session::{ChatSession, TURN_FAILURE_FALLBACK};
use cassia::config::{load_config, save_config, API_KEY_ENV};
use cassia::gemini::GeminiClient;
use cassia::geo::{resolve_annotation, IpLocator};
use cassia::types::Message;

const GREETING: &str = "Oi! Sou a Cassia, da TravelCash.";

/// Cassia -- TravelCash travel assistant in your terminal.
#[derive(Parser, Debug)]
#[command(
    name = "cassia",
    version,
    about = "Cassia -- TravelCash travel assistant in your terminal"
)]
struct Cli {
    /// Override the configured model identifier
    #[arg(long)]
    model: Option<String>,

    /// Skip the startup location lookup
    #[arg(long)]
    no_location: bool,

    /// Send a single message, print the reply, and exit
    #[arg(short, long)]
    message: Option<String>,

    /// Write the current configuration to ~/.cassia/config.json and exit
    #[arg(long)]
    init_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "cassia=debug" } else { "cassia=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print one model-authored transcript entry, with citation links when the
/// answer carried grounding metadata.
fn render_reply(message: &Message) {
    println!();
    println!("{} {}", "Cassia:".cyan().bold(), message.text);

    let citations = message.citations();
    if !citations.is_empty() {
        println!("{}", "Fontes consultadas:".dimmed());
        for citation in &citations {
            println!("  {} <{}>", citation.title.dimmed(), citation.uri.dimmed());
        }
    }

    println!(
        "{}",
        message
            .timestamp
            .format("%H:%M")
            .to_string()
            .dimmed()
    );
}

/// Run one turn and render the outcome. A failed turn degrades to the fixed
/// fallback bubble; the session keeps its pre-turn history.
async fn run_turn(session: &mut ChatSession, text: &str) -> bool {
    println!("{}", "Cassia está digitando...".dimmed());

    match session.send_message(text).await {
        Ok(reply) => {
            render_reply(&reply);
            true
        }
        Err(err) => {
            tracing::warn!(error = %err, "turn failed");
            session.push_local(TURN_FAILURE_FALLBACK);
            println!();
            println!("{} {}", "Cassia:".cyan().bold(), TURN_FAILURE_FALLBACK.red());
            false
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config();
    if let Some(model) = cli.model {
        config.model = model;
    }

    if cli.init_config {
        save_config(&config)?;
        println!("Config written to {}", cassia::config::get_config_path().display());
        return Ok(());
    }

    if config.api_key.is_empty() {
        eprintln!("No API key configured. Set {API_KEY_ENV} or edit ~/.cassia/config.json.");
        std::process::exit(1);
    }

    let model = Arc::new(GeminiClient::new(
        config.api_url.clone(),
        config.api_key.clone(),
        config.model.clone(),
    ));
    let mut session = ChatSession::new(config, model);

    // One-shot location lookup, independent of the chat flow.
    if !cli.no_location {
        session.set_location(resolve_annotation(&IpLocator::new()).await);
    }

    if let Some(message) = cli.message {
        if !run_turn(&mut session, &message).await {
            std::process::exit(1);
        }
        return Ok(());
    }

    session.push_local(GREETING);
    println!("{} {}", "Cassia:".cyan().bold(), GREETING);
    println!("{}", "(digite /sair para encerrar)".dimmed());

    loop {
        let input: String = Input::new()
            .with_prompt("você".green().bold().to_string())
            .allow_empty(true)
            .interact_text()?;

        let text = input.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/sair" {
            println!("{}", "Até a próxima viagem!".dimmed());
            break;
        }

        run_turn(&mut session, text).await;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Fatal: {e}");
        std::process::exit(1);
    }
}
