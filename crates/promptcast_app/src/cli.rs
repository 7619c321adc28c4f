use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "promptcast", about = "Send one prompt to many chat panels and gather the answers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding config.ron.
    #[arg(long, global = true, env = "PROMPTCAST_CONFIG_DIR", default_value = ".promptcast")]
    pub config: PathBuf,

    /// Load panels from `{hostname}.html` files in this directory instead of over HTTP.
    #[arg(long, global = true)]
    pub snapshots: Option<PathBuf>,

    /// Value for `${lang}` in templates.
    #[arg(long, global = true, default_value = promptcast_core::DEFAULT_LANGUAGE)]
    pub lang: String,

    /// How long a collection waits for slow panels.
    #[arg(long, global = true, default_value_t = 1500)]
    pub deadline_ms: u64,

    #[arg(long, global = true, default_value = cast_logging::DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Also log to the terminal.
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[arg(long, global = true, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inject a prompt into every selected panel.
    Send(PromptArgs),
    /// Gather the latest answer of every selected panel (or one host).
    Collect {
        /// Only ask the panel of this hostname.
        #[arg(long)]
        host: Option<String>,
    },
    /// Send, wait, then collect.
    Run {
        #[command(flatten)]
        prompt: PromptArgs,
        /// Time the panels get to answer before collecting.
        #[arg(long, default_value_t = 20)]
        wait_secs: u64,
    },
    /// List configured sources.
    Sources,
    /// List prompt templates.
    Templates,
}

#[derive(Debug, clap::Args)]
pub struct PromptArgs {
    /// Prompt text; with --template it fills `${input}`.
    #[arg(required_unless_present = "template")]
    pub text: Vec<String>,

    /// Name of a prompt template to expand.
    #[arg(long, short)]
    pub template: Option<String>,
}

impl PromptArgs {
    pub fn input(&self) -> String {
        self.text.join(" ")
    }
}
