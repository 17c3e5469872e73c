use anyhow::Result;

use tennis_ladder::cli::Command;
use tennis_ladder::{
    handle_completions, handle_init, handle_profile, handle_rankings, handle_serve,
    handle_set_active, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Serve { port } => handle_serve(*port),
        Command::Init => handle_init(),
        Command::Rankings => handle_rankings(),
        Command::Profile { handle } => handle_profile(handle),
        Command::Deactivate { handle } => handle_set_active(handle, false),
        Command::Activate { handle } => handle_set_active(handle, true),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
