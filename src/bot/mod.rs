pub mod commands;
pub mod dispatcher;
pub mod messages;
pub mod session;
pub mod telegram;
pub mod updates;

pub use commands::{parse_input, Command, Input};
pub use dispatcher::{Dispatcher, OutgoingMessage};
pub use messages::{Reply, TextFormat};
pub use session::{PendingReport, PendingReports};
pub use telegram::TelegramClient;
pub use updates::{Chat, Message, Update, User};
