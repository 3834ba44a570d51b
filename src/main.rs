use std::sync::Arc;

use futures::StreamExt;

use viktor_bot::catalog::JsonCatalogStore;
use viktor_bot::channels::{Channel, TelegramChannel};
use viktor_bot::config::BotConfig;
use viktor_bot::engine::ConversationEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export VIKTOR_BOT_TOKEN=123:ABC...");
        eprintln!("  export VIKTOR_ADMIN_ID=123456789");
        std::process::exit(1);
    });

    eprintln!("🤖 Viktor Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Clubs: {}", config.clubs_path.display());
    eprintln!("   Masterclasses: {}", config.masterclasses_path.display());

    let store = Arc::new(JsonCatalogStore::new(
        config.clubs_path.clone(),
        config.masterclasses_path.clone(),
    ));
    let engine = Arc::new(ConversationEngine::new(store, config.engine.clone()));
    let channel = Arc::new(TelegramChannel::new(config.bot_token.clone()));

    if let Err(e) = channel.health_check().await {
        eprintln!("Error: Telegram health check failed: {e}");
        std::process::exit(1);
    }

    // Periodically drop sessions abandoned mid-flow.
    {
        let engine = Arc::clone(&engine);
        let interval = config.engine.session_idle_timeout.min(
            std::time::Duration::from_secs(300),
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                engine.prune_idle_sessions().await;
            }
        });
    }

    let mut events = channel.start().await?;
    tracing::info!("Viktor bot up, waiting for events");

    while let Some(event) = events.next().await {
        let engine = Arc::clone(&engine);
        let channel = Arc::clone(&channel);
        tokio::spawn(async move {
            for action in engine.handle_event(event).await {
                if let Err(e) = channel.deliver(action).await {
                    tracing::error!("Failed to deliver action: {e}");
                }
            }
        });
    }

    channel.shutdown().await?;
    Ok(())
}
