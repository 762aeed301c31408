mod cli;
mod context;
mod handlers;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use context::CliContext;
use kanban_core::AppConfig;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Ok(log_path) = std::env::var("KANBAN_DEBUG_LOG") {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::WARN)
            .init();
    }

    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(PathBuf::from)
        .or_else(AppConfig::config_path);
    let mut config = config_path
        .as_deref()
        .map(AppConfig::load_from)
        .unwrap_or_default();
    if let Some(token) = cli.api_token {
        config.remote.api_token = Some(token);
    }
    if let Some(list_id) = cli.list_id {
        config.remote.list_id = Some(list_id);
    }

    let result = match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "kanban", &mut std::io::stdout());
            Ok(())
        }
        Commands::Config(config_cmd) => {
            handlers::config::handle(config_cmd.action, &config, config_path.as_deref())
        }
        board_cmd => {
            let ctx = CliContext::load(&cli.file, &config).await?;
            let result = match board_cmd {
                Commands::Board(cmd) => handlers::board::handle(&ctx, cmd.action).await,
                Commands::Column(cmd) => handlers::column::handle(&ctx, cmd.action).await,
                Commands::Card(cmd) => handlers::card::handle(&ctx, cmd.action).await,
                Commands::Comment(cmd) => handlers::comment::handle(&ctx, cmd.action).await,
                Commands::Checklist(cmd) => handlers::checklist::handle(&ctx, cmd.action).await,
                Commands::Label(cmd) => handlers::label::handle(&ctx, cmd.action).await,
                Commands::Completions { .. } | Commands::Config(_) => Ok(()),
            };
            ctx.finish().await?;
            result
        }
    };

    if let Err(e) = result {
        output::output_error(&e.to_string());
        std::process::exit(1);
    }
    Ok(())
}
