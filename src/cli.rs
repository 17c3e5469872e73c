use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tennis community ladder bot")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Start the webhook server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Create or upgrade the database schema
    Init,
    /// Print the current leaderboard
    Rankings,
    /// Print a player's profile and match activity
    Profile {
        /// Telegram username, with or without '@'
        handle: String,
    },
    /// Hide a player from the rankings, keeping their history
    Deactivate { handle: String },
    /// Bring a deactivated player back into the rankings
    Activate { handle: String },
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
