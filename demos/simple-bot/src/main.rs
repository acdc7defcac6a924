//! Simple Bot Example
//!
//! A console bot built on Herald. Each line typed on stdin is one chat
//! message; replies are printed back.
//!
//! ```text
//! ?hello            Hello, World!
//! ?greet bob        Hello, bob!
//! @herald hi        Hello, <you>!
//! ?echo some text   some text
//! !version          simple-bot 0.1.0
//! ?commands         the command list
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package simple-bot -- --user alice --owner
//! ```

mod console;
mod plugin;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use herald::prelude::*;
use tracing::{error, info};

use crate::console::ConsoleClient;
use crate::plugin::ExamplePlugin;

#[derive(Parser, Debug)]
#[command(name = "simple-bot", version, about = "A console chat bot built on Herald")]
struct Args {
    /// Configuration file; herald.toml in the current directory by default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// User id the console input is attributed to
    #[arg(short, long, default_value = "console")]
    user: String,

    /// Make the console user the bot owner
    #[arg(long)]
    owner: bool,

    /// Directory for plugin save data
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = HeraldRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    let mut runtime = builder.build()?;

    let owner = if args.owner {
        Some(args.user.clone())
    } else {
        runtime.config().bot.owner_user_id.clone()
    };

    runtime
        .register_plugin(ExamplePlugin::new(&args.data_dir))
        .register_command("ping", "Replies pong", |ctx| async move {
            let _ = ctx.reply("pong").await;
        })
        .register_prefix_command("!", "version", "Shows the bot version", |ctx| async move {
            let version = format!("simple-bot {}", env!("CARGO_PKG_VERSION"));
            let _ = ctx.reply(&version).await;
        })
        .register_command_definition(
            CommandDefinition::new("echo")
                .trigger("echo")
                .description("Repeats your text")
                .argument(CommandArgument::new(".+", "text"))
                .callback(|ctx| async move {
                    let text = ctx.arg("text").unwrap_or_default().to_string();
                    let _ = ctx.reply(&text).await;
                }),
        );

    let client = Arc::new(ConsoleClient::new(args.user, owner));
    let closed = client.closed();

    runtime
        .run_until(client, async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!(error = %e, "Failed to listen for Ctrl+C");
                    }
                    info!("Received Ctrl+C, shutting down");
                }
                _ = closed.cancelled() => {
                    info!("Console input closed, shutting down");
                }
            }
        })
        .await?;

    Ok(())
}
