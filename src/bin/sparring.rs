//! Sparring - play chess against a remote bot from the terminal.
//!
//! Reads one command per line from stdin: a move in compact notation
//! (`e2e4`, `e7e8q`), `reset`, `recheck` or `quit`.

use anyhow::{Context, Result};
use clap::Parser;
use sparring::core::Disposition;
use sparring::effects::HttpApiClient;
use sparring::{GameResult, Session, SessionBuilder, SessionConfig, Side, StandardChess, UserAction};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sparring", about = "Play chess against a remote bot")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the bot and game-storage API
    #[arg(long)]
    base_url: Option<String>,

    /// Side you play
    #[arg(long, value_parser = parse_side)]
    side: Option<Side>,
}

fn parse_side(s: &str) -> Result<Side, String> {
    match s.to_ascii_lowercase().as_str() {
        "white" | "w" => Ok(Side::White),
        "black" | "b" => Ok(Side::Black),
        other => Err(format!("unknown side '{other}', expected white or black")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url;
    }
    if let Some(side) = cli.side {
        config.human_side = side;
    }
    debug!(?config, "Configuration resolved");

    let api = Arc::new(HttpApiClient::new(config.api_base_url.clone()));
    let session = SessionBuilder::new()
        .rules(StandardChess)
        .bot_client(api.clone())
        .persistence(api)
        .config(config)
        .build()
        .context("starting session")?;

    info!(human = %session.human_side(), "Session started");
    session.settle().await;
    print_board(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" => break,
            "reset" => {
                session.dispatch(UserAction::Reset);
            }
            "recheck" => {
                if !session.recheck() {
                    println!("Nothing to do: it is not the bot's turn.");
                }
            }
            notation => {
                if let Disposition::Rejected(rejection) =
                    session.dispatch(UserAction::SubmitMove(notation.to_string()))
                {
                    println!("Rejected: {rejection}");
                    continue;
                }
            }
        }

        session.settle().await;
        print_board(&session);
    }

    Ok(())
}

fn print_board(session: &Session<StandardChess>) {
    let state = session.snapshot();
    println!("{}", state.position);

    match session.projection() {
        Ok(projection) => {
            if !projection.notation.is_empty() {
                println!("{}", projection.move_pairs().join(" "));
            }
            for side in [Side::White, Side::Black] {
                let taken = projection.captures.by(side);
                if !taken.is_empty() {
                    let pieces: String = taken.iter().map(|p| p.char()).collect();
                    println!("{side} captured: {pieces}");
                }
            }
        }
        Err(e) => println!("Cannot display history: {e}"),
    }

    match state.result {
        GameResult::InProgress if state.bot_thinking => println!("Bot is thinking..."),
        GameResult::InProgress => println!("{} to move", side_to_move(session)),
        result => println!("Game over: {}", result.name()),
    }
}

fn side_to_move(session: &Session<StandardChess>) -> String {
    session
        .snapshot()
        .turn_owner(session.rules())
        .map(|side| side.to_string())
        .unwrap_or_else(|_| "?".to_string())
}
