use anyhow::{Context, Result};
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::AppState;
use crate::api::routes::create_router;
use crate::bot::{Dispatcher, TelegramClient};
use crate::config::AppConfig;
use crate::database::SqlitePlayerStore;
use crate::domain::SystemClock;

pub struct ServerService {
    port: u16,
    config: Arc<AppConfig>,
}

impl ServerService {
    pub fn new(port: u16, config: AppConfig) -> Self {
        Self {
            port,
            config: Arc::new(config),
        }
    }

    pub async fn run(&self) -> Result<()> {
        self.config.bot.check_webhook()?;
        let state = Arc::new(self.build_state()?);

        if let Some(telegram) = &state.telegram {
            self.register_webhook(telegram).await?;
        }

        let app = create_router(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    fn build_state(&self) -> Result<AppState> {
        let store = SqlitePlayerStore::open(&self.config.store)?;
        let dispatcher = Dispatcher::new(
            Arc::new(store),
            Arc::new(SystemClock),
            self.config.clone(),
        )?;

        let telegram = match self.config.bot.token {
            Some(_) => Some(TelegramClient::new(&self.config.bot)?),
            None => {
                warn!("TELEGRAM_BOT_TOKEN is not set, replies will only be logged");
                None
            }
        };

        Ok(AppState {
            dispatcher,
            telegram,
            config: self.config.clone(),
        })
    }

    async fn register_webhook(&self, telegram: &TelegramClient) -> Result<()> {
        let Some(public_url) = &self.config.bot.public_url else {
            info!("PUBLIC_URL is not set, skipping webhook registration");
            return Ok(());
        };

        let secret = self.config.bot.require_webhook_secret()?;
        let url = format!("{}/webhook/{}", public_url, secret);
        telegram.set_webhook(&url).await
    }
}
