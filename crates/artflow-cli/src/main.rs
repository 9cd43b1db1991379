mod cli;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use artflow_browser::{CdpPage, HttpFetcher};
use artflow_core::actions::register_defaults;
use artflow_core::{ActionRegistry, PromptQueue, RunConfig, Runner};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if cli.describe {
        println!("{}", describe_actions()?);
        return Ok(());
    }

    let config = Arc::new(build_config(&cli)?);
    let queue = load_queue(&cli)?;
    info!(jobs = queue.len(), endpoint = %cli.cdp_url, "starting run");

    let page = CdpPage::attach(&cli.cdp_url)
        .await
        .with_context(|| format!("attaching to browser at {}", cli.cdp_url))?;

    let runner = Runner::new(Box::new(page), config, Arc::new(HttpFetcher::new()))?
        .with_subtle_upscale(cli.subtle);
    runner
        .run(&queue, |percent| info!(percent, "run progress"))
        .await?;

    info!("all jobs finished");
    Ok(())
}

fn build_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = RunConfig::from_env();
    if let Some(url) = &cli.channel_url {
        config.channel_url = url.clone();
    }
    if let Some(placeholder) = &cli.chat_placeholder {
        config.chat_placeholder = placeholder.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = Some(dir.clone());
    }
    config.bot_command = cli.command.clone();
    config.image_count = cli.count;

    if config.channel_url.is_empty() {
        bail!("no channel URL; pass --channel-url or set DISCORD_CHANNEL_URL");
    }
    if config.chat_placeholder.is_empty() {
        bail!("no chat placeholder; pass --chat-placeholder or set ARTFLOW_CHAT_PLACEHOLDER");
    }
    if !(1..=4).contains(&config.image_count) {
        bail!("--count must be between 1 and 4");
    }
    if let Some(dir) = &config.output_dir
        && !dir.is_dir()
    {
        bail!("output directory {} does not exist", dir.display());
    }
    Ok(config)
}

fn load_queue(cli: &Cli) -> Result<PromptQueue> {
    match &cli.prompts_file {
        Some(path) => PromptQueue::from_file(path)
            .with_context(|| format!("reading prompts from {}", path.display())),
        None => PromptQueue::from_lines(&cli.prompts)
            .context("no prompts; pass --prompt or --prompts-file"),
    }
}

fn describe_actions() -> Result<String> {
    let mut registry = ActionRegistry::new();
    register_defaults(
        &mut registry,
        Arc::new(RunConfig::default()),
        Arc::new(HttpFetcher::new()),
    )?;
    Ok(registry.describe_all())
}
