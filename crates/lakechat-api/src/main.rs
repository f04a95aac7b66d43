//! lakechat terminal client entry point.
//!
//! Binary name: `lakechat`
//!
//! Parses CLI arguments, initializes tracing, the database and the chat
//! session, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,lakechat_core=debug,lakechat_infra=debug",
        _ => "trace",
    };
    lakechat_observe::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "lakechat", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    lakechat_observe::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Rooms => cli::rooms::list_rooms(&state, cli.json).await?,
        Commands::New { title } => cli::rooms::new_room(&state, title, cli.json).await?,
        Commands::Delete { room, force } => {
            cli::rooms::delete_room(&state, &room, force, cli.json).await?
        }
        Commands::History { room } => cli::rooms::show_history(&state, &room, cli.json).await?,
        Commands::Chat { room } => cli::chat::loop_runner::run_chat_loop(&state, room).await?,
        Commands::Completions { .. } => unreachable!("handled in main"),
    }

    Ok(())
}
