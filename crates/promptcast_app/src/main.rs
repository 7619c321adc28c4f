mod cli;
mod clipboard;
mod session;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cast_logging::{cast_error, cast_info, LogDestination};
use clap::Parser;
use promptcast_engine::ConfigStore;

use crate::cli::{Cli, Command};
use crate::clipboard::SystemClipboard;
use crate::session::Session;

/// Time injections get before `send` returns.
const SEND_SETTLE: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let destination = if cli.verbose {
        LogDestination::Both(cli.log_file.clone())
    } else {
        LogDestination::File(cli.log_file.clone())
    };
    cast_logging::initialize(destination, cli.log_level);
    cast_info!("promptcast {} starting", env!("CARGO_PKG_VERSION"));

    let result = run(cli).await;
    if let Err(err) = &result {
        cast_error!("{:#}", err);
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut session = Session::open(&cli, Arc::new(SystemClipboard));
    match &cli.command {
        Command::Sources => {
            let sources = session.store().sources().context("reading sources")?;
            for (index, source) in sources.iter().enumerate() {
                let mark = if source.selected { "x" } else { " " };
                println!("{index:>2} [{mark}] {:<24} {}", source.hostname(), source.url);
            }
        }
        Command::Templates => {
            let prompts = session.store().prompts().context("reading prompt templates")?;
            for template in prompts {
                let menu = if template.show_in_menu { "" } else { " (hidden)" };
                println!("{}{}", template.name, menu);
            }
        }
        Command::Send(args) => {
            session.start().await?;
            let attempted = session.send(args, SEND_SETTLE).await?;
            println!("sent to {attempted} panel(s)");
        }
        Command::Collect { host } => {
            session.start().await?;
            let report = session.collect(host.as_deref()).await?;
            print_report(&session, &report);
        }
        Command::Run { prompt, wait_secs } => {
            session.start().await?;
            session.send(prompt, Duration::from_secs(*wait_secs)).await?;
            let report = session.collect(None).await?;
            print_report(&session, &report);
        }
    }
    Ok(())
}

fn print_report(session: &Session, report: &promptcast_core::CollectionReport) {
    if !report.has_output() {
        eprintln!("no output found");
        return;
    }
    if report.is_partial() {
        eprintln!(
            "{} of {} panel(s) answered before the deadline",
            report.results.len(),
            report.expected_count
        );
    }
    println!("{}", session.composed());
}
