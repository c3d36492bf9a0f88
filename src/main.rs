//! NamjaNinja - event program companion bot
//!
//! A Telegram bot that logs participants in with their participant code and
//! answers schedule questions about the program.

mod backend;
mod config;
mod dispatcher;
mod runtime;
mod schedule;
mod state_machine;
mod telegram;

use backend::{HttpBackend, LoggingBackend};
use config::BotConfig;
use dispatcher::Dispatcher;
use runtime::ProductionRuntime;
use schedule::ScheduleResponder;
use std::net::SocketAddr;
use std::sync::Arc;
use telegram::{create_router, TelegramClient, WebhookState};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "namja_bot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = BotConfig::from_env()?;
    let rules = Arc::new(config.category_rules()?);
    let responder = Arc::new(ScheduleResponder::new(rules, config.responder_settings()?));

    tracing::info!(
        backend = %config.backend_url,
        timezone = %config.timezone,
        login_policy = ?config.login_policy,
        code_pattern = config.code_grammar.as_str(),
        program = %config.program_name,
        "Configuration loaded"
    );

    let backend = LoggingBackend::new(HttpBackend::new(
        &config.backend_url,
        config.timezone,
        config.http_timeout,
    )?);
    let runtime: ProductionRuntime =
        ProductionRuntime::new(Arc::new(config.session_context()), backend, responder);
    let dispatcher = Arc::new(Dispatcher::new(runtime, config.timezone));

    let telegram = Arc::new(TelegramClient::new(&config.token, config.http_timeout)?);
    match &config.webhook_url {
        Some(base) => {
            let url = format!("{}/{}", base.trim_end_matches('/'), config.token);
            telegram.set_webhook(&url).await?;
            tracing::info!(base = %base, "Webhook registered");
        }
        None => tracing::warn!("NAMJA_WEBHOOK_URL not set; assuming the webhook is already registered"),
    }

    let state = WebhookState {
        dispatcher,
        sender: telegram,
        token: Arc::from(config.token.as_str()),
    };
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("NamjaNinja bot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
