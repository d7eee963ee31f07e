//! Command-line client for a cursor relay.
//!
//! Reads pointer and settings commands from stdin, shares them through the
//! relay configured in the environment, and logs remote cursors as they
//! change. Useful for poking at a relay without a browser.
//!
//! ```text
//! move <page_x> <page_y> <doc_width> <doc_height>
//! leave
//! channel <name>|-
//! name <name>|-
//! share on|off
//! quality high|middle|low
//! enable | disable
//! show-local on|off
//! reopen
//! quit
//! ```

use std::process::ExitCode;
use std::time::Duration;

use cocursor::{ClientConfig, Command, PointerSample, QualityTier, Session, SettingsUpdate, WsTransport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How long to wait for closing links to flush on exit
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting cocursor client...");
    info!("  relay:   {}", config.endpoint);
    info!("  channel: {}", config.settings.channel.as_deref().unwrap_or("(default)"));
    info!("  quality: {}", config.settings.quality);

    let (transport, events) = WsTransport::new();
    let links = transport.link_tasks();
    let session = Session::new(transport, config);
    info!("Participant id: {}", session.local_id());

    let mut view = session.presence();
    tokio::spawn(async move {
        while view.changed().await {
            let snapshot = view.snapshot();
            info!("{} remote cursors visible", snapshot.visible().count());
            for cursor in snapshot.visible() {
                if let Some((x, y)) = cursor.position() {
                    info!(
                        "  {} ({}) at {:.3}, {:.3}",
                        cursor.id,
                        cursor.name.as_deref().unwrap_or("anonymous"),
                        x,
                        y
                    );
                }
            }
        }
    });

    let (commands, inbox) = mpsc::unbounded_channel();
    tokio::spawn(read_commands(commands));

    session.run(events, inbox).await;

    // The session is gone; let the socket tasks deliver the farewell frame
    if timeout(DRAIN_TIMEOUT, links.drain()).await.is_err() {
        warn!("relay connection did not close within {:?}", DRAIN_TIMEOUT);
    }
    info!("cocursor client stopped");
    ExitCode::SUCCESS
}

/// Forwards stdin commands until `quit` or end of input
async fn read_commands(commands: mpsc::UnboundedSender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(command) = parse_command(line) else {
            warn!("Unrecognized command: {}", line);
            continue;
        };
        let quit = command == Command::Shutdown;
        if commands.send(command).is_err() || quit {
            break;
        }
    }
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let command = match (verb, rest.as_slice()) {
        ("move", [x, y, width, height]) => Command::PointerMoved(PointerSample::new(
            x.parse().ok()?,
            y.parse().ok()?,
            width.parse().ok()?,
            height.parse().ok()?,
        )),
        ("leave", []) => Command::PointerLeft,
        ("channel", [name]) => Command::Update(SettingsUpdate::Channel(optional(name))),
        ("name", [name]) => Command::Update(SettingsUpdate::Name(optional(name))),
        ("share", [flag]) => Command::Update(SettingsUpdate::Sharing(switch(flag)?)),
        ("quality", [tier]) => Command::Update(SettingsUpdate::Quality(QualityTier::parse_lenient(tier))),
        ("enable", []) => Command::Update(SettingsUpdate::Disabled(false)),
        ("disable", []) => Command::Update(SettingsUpdate::Disabled(true)),
        ("show-local", [flag]) => Command::Update(SettingsUpdate::ShowLocalCursor(switch(flag)?)),
        ("reopen", []) => Command::Reopen,
        ("quit", []) => Command::Shutdown,
        _ => return None,
    };
    Some(command)
}

fn optional(value: &str) -> Option<String> {
    (value != "-").then(|| value.to_string())
}

fn switch(value: &str) -> Option<bool> {
    match value {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}
