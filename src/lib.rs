pub mod cli;
pub mod config;
pub mod conversation;
pub mod format;
pub mod history;
pub mod logging;
pub mod model;
pub mod model_gateway;
pub mod model_selector;
pub mod progress;
pub mod providers;
pub mod render;
pub mod repl;
pub mod request;
pub mod session;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal};
use tracing::info;

use cli::Cli;
use config::Config;
use providers::anthropic::AnthropicGateway;
use repl::run_repl;
use session::Session;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = Config::from_env()?;
    info!(
        api_base_url = %cfg.api_base_url,
        api_version = %cfg.api_version,
        model_timeout_secs = cfg.model_timeout_secs,
        history_dir = %cfg.history_dir.display(),
        light_model = %cfg.models.light,
        capable_model = %cfg.models.capable,
        "loaded runtime configuration"
    );

    let color = !(cli.no_color || cfg.no_color);
    if !color {
        colored::control::set_override(false);
    }

    let gateway = AnthropicGateway::new(&cfg)?;
    let show_progress = io::stderr().is_terminal();
    let mut session = Session::new(&gateway, &cfg, cli.session_settings(color, show_progress));

    if let Some(path) = &cli.resume {
        let prior = history::read_transcript(path)
            .with_context(|| format!("Failed to resume from {}", path.display()))?;
        session.resume(path.clone(), &prior);
    }

    let prompt = cli.prompt_text();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.interactive {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        run_repl(&mut session, prompt.as_deref(), &mut input, &mut out).await?;
    } else {
        let prompt = prompt.context("No prompt given. Pass a prompt or use --interactive.")?;
        session.ask(&prompt, &mut out).await?;
    }

    session.persist(&mut out, &mut io::stderr());
    Ok(())
}
