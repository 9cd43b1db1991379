use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "artflow")]
#[command(version, about = "ArtFlow - image generation over a chat bot")]
pub struct Cli {
    /// Channel URL the worker posts prompts into
    #[arg(long, env = "DISCORD_CHANNEL_URL")]
    pub channel_url: Option<String>,

    /// DevTools endpoint of an already-running, logged-in browser
    #[arg(long, env = "ARTFLOW_CDP_URL", default_value = "http://localhost:9222")]
    pub cdp_url: String,

    /// File with one prompt per line
    #[arg(long, conflicts_with = "prompts")]
    pub prompts_file: Option<PathBuf>,

    /// Inline prompt; repeat for a multi-job queue
    #[arg(long = "prompt")]
    pub prompts: Vec<String>,

    /// Existing directory to write images into (defaults to the current one)
    #[arg(long, env = "ARTFLOW_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Images to upscale and save per prompt (1-4)
    #[arg(long, default_value_t = 1)]
    pub count: usize,

    /// Slash command that invokes the image bot
    #[arg(long, default_value = "/imagine")]
    pub command: String,

    /// Placeholder label of the channel's chat textbox
    #[arg(long, env = "ARTFLOW_CHAT_PLACEHOLDER")]
    pub chat_placeholder: Option<String>,

    /// Click the single "Upscale (Subtle)" control instead of U1-U4
    #[arg(long)]
    pub subtle: bool,

    /// Print the action catalog and exit
    #[arg(long)]
    pub describe: bool,
}
