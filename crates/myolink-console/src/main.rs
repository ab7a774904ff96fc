//! Console consumer for MyoLink.
//!
//! Starts the datagram event listener, maps incoming `emgJoystick` events to
//! a paddle command, and prints the latest command once a second until
//! Ctrl-C. Teardown always goes through `stop()` so the port is released
//! deterministically.
//!
//! Run with: `cargo run -p myolink-console [port]`

mod command;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use myolink_net::{DEFAULT_PORT, Event, ListenerConfig, UdpEventListener};

use crate::command::{CommandCell, DOWN, UP, command_for};

#[tokio::main]
async fn main() -> myolink_net::Result<()> {
    tracing_subscriber::fmt::init();

    let port = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let latest = Arc::new(CommandCell::new());
    let listener = UdpEventListener::new(ListenerConfig::any_address(port))?;

    let cell = latest.clone();
    listener.set_handler(move |event: &Event, source: SocketAddr| {
        if let Some(cmd) = command_for(event) {
            debug!(target: "myolink_console", "command {cmd} from {source}");
            cell.store(cmd);
        }
    });

    listener.start().await?;
    info!(
        target: "myolink_console",
        "listening for EMG joystick datagrams on port {port}, Ctrl-C to stop"
    );

    let mut tick = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let cmd = latest.load();
                let label = match cmd {
                    UP => "up",
                    DOWN => "down",
                    _ => "neutral",
                };
                info!(target: "myolink_console", "paddle command: {label} ({cmd})");
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!(target: "myolink_console", "failed to listen for Ctrl-C: {e}");
                }
                break;
            }
        }
    }

    info!(target: "myolink_console", "stopping listener");
    listener.stop().await;
    Ok(())
}
