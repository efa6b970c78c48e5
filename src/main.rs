mod compose;
mod config;
mod deeplink;
mod event;
mod extract;
mod render;
mod router;
mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use tracing::info;
use tracing_subscriber::prelude::*;

use config::Config;
use event::BotIdentity;
use render::RenderClient;
use router::BotState;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let default_level = if config.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(default_level.into()),
                ),
        )
        .init();

    info!("🚀 Starting texbot...");

    let bot = Bot::new(&config.bot_token);

    let me = match bot.get_me().await {
        Ok(me) => {
            info!("Bot user ID: {}, username: @{}", me.id, me.username());
            BotIdentity {
                id: me.id,
                username: me.username().to_string(),
            }
        }
        Err(e) => {
            eprintln!("Failed to fetch bot identity: {e}");
            std::process::exit(1);
        }
    };

    let state = Arc::new(BotState {
        me,
        render: RenderClient::new(),
    });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(router::handle_message))
        .branch(Update::filter_inline_query().endpoint(router::handle_inline_query));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build();

    match (config.webhook_url.clone(), config.debug) {
        (Some(url), false) => {
            let address = SocketAddr::from(([0, 0, 0, 0], config.port));
            let options =
                webhooks::Options::new(address, url).secret_token(config.webhook_secret());
            let listener = match webhooks::axum(bot, options).await {
                Ok(listener) => listener,
                Err(e) => {
                    eprintln!("Failed to register webhook: {e}");
                    std::process::exit(1);
                }
            };
            info!("Listening for webhook updates on port {}", config.port);
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        _ => {
            info!("Polling for updates");
            dispatcher.dispatch().await;
        }
    }
}
