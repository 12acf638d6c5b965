use std::io;

use anyhow::Context;
use assist_cli::chat::ChatSession;
use assist_cli::commands::{parse_slash_command, SlashCommand, HELP_TEXT};
use assist_cli::providers;
use assist_transport::{logging, CancellationToken, EnvConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EnvConfig::from_env()?;
    logging::init(config.log_filter.as_deref())?;

    let collaborators = providers::collaborators_for(&config)?;
    info!(provider = collaborators.provider_id, "starting assistant");
    let client = collaborators.into_client(&config);

    let mut chat =
        ChatSession::new(client, io::stdout()).with_transcript_root(config.transcript_dir.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        chat.prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_slash_command(&line) {
            Some(SlashCommand::Help) => chat.print(HELP_TEXT)?,
            Some(SlashCommand::Session) => {
                let summary = chat.session_summary();
                chat.print(&summary)?;
            }
            Some(SlashCommand::Quit) => break,
            Some(SlashCommand::Unknown(command)) => {
                chat.print(&format!("unknown command {command}; try /help"))?;
            }
            None if line.trim().is_empty() => {}
            None => {
                let cancel = CancellationToken::new();
                let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
                let outcome = chat.exchange(&line, &cancel).await;
                watcher.abort();
                outcome?;
            }
        }
    }

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        cancel.cancel();
    }
}
