//! Bridge Agent Binary Entry Point

use clap::Parser;
use bridge_agent::{build_context, run_agent, Args};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bridge_agent=info,bridge_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let context = build_context(&args)?;
    let shutdown = context.shutdown().clone();

    let agent = run_agent(args, context);
    tokio::pin!(agent);

    tokio::select! {
        result = &mut agent => {
            if let Err(e) = &result {
                tracing::error!("Bridge failed: {:#}", e);
            }
            return result;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping bridge...");
            shutdown.trigger();
        }
    }

    // Let the accept loop observe the signal and exit.
    agent.await
}
