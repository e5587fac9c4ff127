//! chatgate - a line-driven shell for the chat client.
//!
//! Every navigation goes through the route guard and every request through
//! the authenticated transport, exactly as the web client does.

mod app;

use std::io;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{parse_command, App, Flow, HELP_TEXT};
use chatgate_core::Config;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--init-config" {
        Config::default().save()?;
        eprintln!("Wrote default configuration");
        return Ok(());
    }
    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        println!("usage: chatgate [--init-config]\n\n{}", HELP_TEXT);
        return Ok(());
    }

    let config = Config::load()?;
    info!(api_url = %config.api_url, "chatgate starting");

    let app = App::new(&config)?;
    run(&app).await?;

    info!("chatgate shutting down");
    Ok(())
}

async fn run(app: &App) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    app.execute(app::Command::Go("/".to_string())).await?;
    loop {
        stdout.write_all(format!("{}> ", app.location()).as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(command) => {
                if app.execute(command).await? == Flow::Exit {
                    break;
                }
            }
            Err(msg) => eprintln!("{}", msg),
        }
    }
    Ok(())
}
