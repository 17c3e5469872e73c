use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct RatingSettings {
    pub starter_rating: f64,
    pub k_factor: f64,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            starter_rating: 1200.0,
            k_factor: 32.0,
        }
    }
}

/// What to do with a score where both sides won the same number of sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiePolicy {
    /// Refuse the report
    Reject,
    /// Legacy behaviour: the second-named player is recorded as the winner
    SecondNamedWins,
}

impl TiePolicy {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "reject" => Ok(TiePolicy::Reject),
            "second-named" | "second_named" => Ok(TiePolicy::SecondNamedWins),
            other => anyhow::bail!("Unknown tie policy: {}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub tie_policy: TiePolicy,
    pub form_window: usize,
    pub default_label: &'static str,
    pub group_chats_only: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            tie_policy: TiePolicy::Reject,
            form_window: 5,
            default_label: "Friendlies",
            group_chats_only: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub ttl_secs: i64,
    pub capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            capacity: 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub database_path: String,
    /// Attempts at a player update when the database is locked by another writer
    pub update_retries: usize,
    pub busy_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_path: "tennis_ladder.db".to_string(),
            update_retries: 3,
            busy_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub token: Option<String>,
    pub username: String,
    pub api_base_url: String,
    /// Path segment Telegram must post updates to; no webhook is accepted without it
    pub webhook_secret: Option<String>,
    pub public_url: Option<String>,
    pub rate_limit_ms: u64,
    pub user_agent: &'static str,
    pub timeout_secs: u64,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            token: None,
            username: "tennis_ladder_bot".to_string(),
            api_base_url: "https://api.telegram.org".to_string(),
            webhook_secret: None,
            public_url: None,
            rate_limit_ms: 50, // Bot API allows ~30 msg/sec
            user_agent: "TennisLadder/1.0",
            timeout_secs: 30,
        }
    }
}

impl BotSettings {
    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .context("TELEGRAM_BOT_TOKEN is not set")
    }

    pub fn require_webhook_secret(&self) -> Result<&str> {
        self.webhook_secret
            .as_deref()
            .context("WEBHOOK_SECRET is not set")
    }

    /// Fails when a public webhook URL is configured without a secret
    pub fn check_webhook(&self) -> Result<()> {
        if self.public_url.is_some() {
            self.require_webhook_secret()
                .context("PUBLIC_URL is set but the webhook would be unprotected")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rating: RatingSettings,
    pub report: ReportSettings,
    pub session: SessionSettings,
    pub store: StoreSettings,
    pub bot: BotSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            rating: RatingSettings::default(),
            report: ReportSettings::default(),
            session: SessionSettings::default(),
            store: StoreSettings::default(),
            bot: BotSettings::default(),
        }
    }

    /// Defaults overlaid with whatever the environment provides
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with the values `lookup` returns; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::new();

        if let Some(path) = var("DATABASE_PATH") {
            config.store.database_path = path;
        }
        if let Some(token) = var("TELEGRAM_BOT_TOKEN") {
            config.bot.token = Some(token);
        }
        if let Some(username) = var("BOT_USERNAME") {
            config.bot.username = username.trim_start_matches('@').to_string();
        }
        if let Some(secret) = var("WEBHOOK_SECRET") {
            config.bot.webhook_secret = Some(secret);
        }
        if let Some(url) = var("PUBLIC_URL") {
            config.bot.public_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(policy) = var("TIE_POLICY") {
            config.report.tie_policy =
                TiePolicy::parse(&policy).context("Invalid TIE_POLICY")?;
        }

        Ok(config)
    }
}
