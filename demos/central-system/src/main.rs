//! OCPP 1.6 central system with an HTTP command bridge.
//!
//! Run with: cargo run -p central-system
//!
//! Charge points connect to ws://localhost:8887/{id}; the operator console is
//! at http://localhost:8777.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::Parser;
use ocpp_bridge_core::{ConnectionHooks, CoreHandler};
use ocpp_bridge_session::{CommandBridge, EventHandler, PendingTransactions};
use ocpp_bridge_transport::{CentralSystem, create_command_router};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address charge points connect to.
    #[arg(long, env = "OCPP_WS_ADDR", default_value = "0.0.0.0:8887")]
    ws_addr: SocketAddr,

    /// Address of the HTTP command API and console.
    #[arg(long, env = "OCPP_HTTP_ADDR", default_value = "0.0.0.0:8777")]
    http_addr: SocketAddr,

    /// Log filter directives.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_new(&args.log_filter)
                .context("invalid log filter")?,
        )
        .init();

    let transactions = Arc::new(PendingTransactions::new());
    let handler = Arc::new(EventHandler::new(Arc::clone(&transactions)));
    let central_system = CentralSystem::new(
        Arc::clone(&handler) as Arc<dyn CoreHandler>,
        handler as Arc<dyn ConnectionHooks>,
    );
    let bridge = Arc::new(CommandBridge::new(central_system.clone(), transactions));

    let ws_listener = TcpListener::bind(args.ws_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.ws_addr))?;
    let http_listener = TcpListener::bind(args.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.http_addr))?;

    tracing::info!("Central system listening on ws://{}", args.ws_addr);
    tracing::info!("Command API listening on http://{}", args.http_addr);

    tokio::try_join!(
        async {
            axum::serve(ws_listener, central_system.router())
                .await
                .context("charge point listener failed")
        },
        async {
            axum::serve(http_listener, create_command_router(bridge))
                .await
                .context("command listener failed")
        },
    )?;

    Ok(())
}
