//! Daily travel-memory bot.
//!
//! `bot run` picks a day from the configured trip archives, prints it, and
//! follows up with one search-augmented message per configured prompt.

use std::path::PathBuf;
use std::sync::Arc;

use agent::core::types::PromptMode;
use agent::executor::SelfCorrectingExecutor;
use agent::io::gemini::GeminiBackend;
use agent::io::model::StructuredModel;
use agent::io::search::GoogleSearch;
use agent::orchestrator::{OrchestrationRequest, SearchOrchestrator};
use agent::tasks::ToolContext;
use anyhow::{Context, Result, bail};
use bot::config::{BotConfig, DEFAULT_CONFIG_PATH, load_config};
use bot::daily::{plan_day, run_day};
use bot::exit_codes;
use bot::sender::{MessageSender, WriterSender};
use bot::trip::load_archive;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "bot",
    version,
    about = "Daily travel-memory bot with search-augmented extras"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a random day from a configured trip plus generated extras.
    Run {
        /// Index into the configured trips; random (weighted by step count) if omitted.
        #[arg(long)]
        trip: Option<usize>,
    },
    /// Run one orchestration for an ad-hoc goal and print the answer.
    Ask {
        #[arg(long)]
        goal: String,
        /// Message the answer accompanies; topics are derived from it.
        #[arg(long)]
        context: String,
        #[arg(long, default_value = "")]
        background: String,
        #[arg(long, default_value_t = PromptMode::Strict)]
        mode: PromptMode,
    },
    /// List the prompts `run` will use.
    Prompts,
}

#[tokio::main]
async fn main() {
    agent::logging::init();
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    match cli.command {
        Command::Run { trip } => cmd_run(&config, trip).await,
        Command::Ask {
            goal,
            context,
            background,
            mode,
        } => {
            let request = OrchestrationRequest {
                goal,
                context_message: context,
                background,
                mode,
            };
            cmd_ask(&config, &request).await
        }
        Command::Prompts => cmd_prompts(&config),
    }
}

async fn cmd_run(config: &BotConfig, selector: Option<usize>) -> Result<()> {
    if config.trips.is_empty() {
        bail!("no trips configured in [[trips]]");
    }
    let trips = config
        .trips
        .iter()
        .map(load_archive)
        .collect::<Result<Vec<_>>>()?;
    let plan = plan_day(config, &trips, selector, &mut rand::thread_rng())?;
    info!(trip = plan.trip_index, step = plan.step_index, "day selected");

    let orchestrator = build_orchestrator(config)?;
    let mut sender = WriterSender::stdout();
    run_day(&orchestrator, &config.prompts(), &plan, &mut sender).await?;
    Ok(())
}

async fn cmd_ask(config: &BotConfig, request: &OrchestrationRequest) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let answer = orchestrator.run(request).await;
    if answer.is_empty() {
        bail!("no answer found for goal");
    }
    WriterSender::stdout().send_message(&answer)
}

fn cmd_prompts(config: &BotConfig) -> Result<()> {
    let mut sender = WriterSender::stdout();
    for item in config.prompts() {
        sender.send_message(&format!("[{}]\n{}", item.mode, item.prompt))?;
    }
    Ok(())
}

fn build_orchestrator(
    config: &BotConfig,
) -> Result<SearchOrchestrator<SelfCorrectingExecutor, GoogleSearch>> {
    let backend = GeminiBackend::from_config(&config.model).context("configure model endpoint")?;
    let model = StructuredModel::new(Arc::new(backend));
    let executor = SelfCorrectingExecutor::new(ToolContext::new(model));
    let search = GoogleSearch::from_config(&config.search).context("configure search")?;
    Ok(SearchOrchestrator::new(
        Arc::new(executor),
        Arc::new(search),
        config.language.clone(),
    ))
}
