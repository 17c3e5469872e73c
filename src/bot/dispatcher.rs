use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;

use super::commands::{parse_input, Command, Input};
use super::messages::{self, Reply, TextFormat};
use super::session::PendingReports;
use super::updates::{Message, Update, User};
use crate::config::AppConfig;
use crate::database::PlayerStore;
use crate::domain::{Clock, Player};
use crate::errors::{BotError, BotResult};
use crate::services::{MatchReportService, PlayerService};
use crate::stats::{group_activity, summarize};

/// A reply ready to be sent through the Bot API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub thread_id: Option<i64>,
    pub reply_to: Option<i64>,
    pub text: String,
    pub format: TextFormat,
}

/// Routes incoming updates to the services and renders their replies
pub struct Dispatcher {
    players: PlayerService,
    reports: MatchReportService,
    pending: PendingReports,
    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn PlayerStore>, clock: Arc<dyn Clock>, config: Arc<AppConfig>) -> Result<Self> {
        Ok(Self {
            players: PlayerService::new(store.clone(), clock.clone(), config.clone()),
            reports: MatchReportService::new(store, clock.clone(), config.clone())?,
            pending: PendingReports::new(&config.session),
            clock,
            config,
        })
    }

    pub fn players(&self) -> &PlayerService {
        &self.players
    }

    /// Replies for one update; empty when the update needs no answer
    pub fn handle(&self, update: &Update) -> Vec<OutgoingMessage> {
        let Some(message) = &update.message else {
            return Vec::new();
        };
        let (Some(user), Some(text)) = (&message.from, &message.text) else {
            return Vec::new();
        };
        if user.is_bot {
            return Vec::new();
        }

        let reply = match parse_input(text, &self.config.bot.username) {
            Input::Command(command) => {
                self.pending.cancel(user.id);
                info!("{:?} from {} in chat {}", command, user.id, message.chat.id);
                self.run_command(command, message, user)
            }
            Input::Foreign => {
                self.pending.cancel(user.id);
                None
            }
            Input::Text(body) => self
                .pending
                .take(user.id, message.chat.id, self.clock.now())
                .map(|_| self.report_match(user, &body)),
        };

        reply
            .map(|reply| vec![Self::outgoing(message, reply)])
            .unwrap_or_default()
    }

    fn run_command(&self, command: Command, message: &Message, user: &User) -> Option<Reply> {
        let reply = match command {
            Command::Start => match self.players.is_registered(user.id) {
                Ok(true) => messages::intro_registered(&user.full_name()),
                Ok(false) => messages::intro(),
                Err(e) => self.error_reply(e),
            },
            Command::Help => messages::help(),
            Command::Register => self.respond(
                self.players
                    .register(user.id, &user.full_name(), user.username.as_deref()),
                messages::registered,
            ),
            Command::Profile(handle) => {
                let window = self.config.report.form_window;
                self.respond(self.lookup(user, handle.as_deref()), |player| {
                    messages::profile(&summarize(player, window), window)
                })
            }
            Command::Activity(handle) => {
                let default_label = self.config.report.default_label;
                self.respond(self.lookup(user, handle.as_deref()), |player| {
                    messages::activity(&player.name, &group_activity(&player.matches, default_label))
                })
            }
            Command::Rankings => {
                let window = self.config.report.form_window;
                self.respond(self.players.rankings(), |entries| {
                    messages::rankings(entries, window)
                })
            }
            Command::MatchResult(body) => {
                if self.config.report.group_chats_only && !message.chat.is_group() {
                    return Some(messages::group_chats_only());
                }
                match body {
                    Some(body) => self.report_match(user, &body),
                    None => {
                        self.pending.open(user.id, message.chat.id, self.clock.now());
                        messages::report_instructions()
                    }
                }
            }
            Command::Unknown(name) => {
                if message.chat.is_group() {
                    return None;
                }
                warn!("Unknown command /{} from {}", name, user.id);
                messages::help()
            }
        };

        Some(reply)
    }

    fn lookup(&self, user: &User, handle: Option<&str>) -> BotResult<Player> {
        match handle {
            Some(handle) => self.players.profile_by_handle(handle),
            None => self.players.profile(user.id),
        }
    }

    fn report_match(&self, user: &User, body: &str) -> Reply {
        info!("Match report from {}: {}", user.id, body);
        self.respond(self.reports.report(user.id, body), messages::match_report)
    }

    fn respond<T>(&self, result: BotResult<T>, render: impl FnOnce(&T) -> Reply) -> Reply {
        match result {
            Ok(value) => render(&value),
            Err(e) => self.error_reply(e),
        }
    }

    fn error_reply(&self, error: BotError) -> Reply {
        match &error {
            BotError::Persistence(_) | BotError::PartialUpdate { .. } => error!("{}", error),
            _ => info!("Rejected: {}", error),
        }
        messages::error(&error)
    }

    fn outgoing(message: &Message, reply: Reply) -> OutgoingMessage {
        OutgoingMessage {
            chat_id: message.chat.id,
            thread_id: message.message_thread_id,
            reply_to: Some(message.message_id),
            text: reply.text,
            format: reply.format,
        }
    }
}
