use crate::domain::normalize_handle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Register,
    /// Optional handle of another player
    Profile(Option<String>),
    Activity(Option<String>),
    Rankings,
    /// Report body, if given inline
    MatchResult(Option<String>),
    Unknown(String),
}

/// How a message should be treated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// A command addressed to a different bot
    Foreign,
    Text(String),
}

/// Classifies message text.
///
/// Commands are `/name` or `/name@bot`. For `/profile` and `/activity` an
/// `@suffix` that is not this bot names the player to look up.
pub fn parse_input(text: &str, bot_username: &str) -> Input {
    let text = text.trim();
    let Some(body) = text.strip_prefix('/') else {
        return Input::Text(text.to_string());
    };

    let (head, rest) = match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (body, ""),
    };
    let (name, target) = match head.split_once('@') {
        Some((name, target)) => (name.to_lowercase(), Some(target)),
        None => (head.to_lowercase(), None),
    };

    let addressed_here = target.is_none_or(|t| t.eq_ignore_ascii_case(bot_username));
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let command = match name.as_str() {
        "profile" | "activity" => {
            let handle = if addressed_here {
                argument.as_deref().and_then(first_handle)
            } else {
                target.and_then(first_handle)
            };
            if name == "profile" {
                Command::Profile(handle)
            } else {
                Command::Activity(handle)
            }
        }
        _ if !addressed_here => return Input::Foreign,
        "start" => Command::Start,
        "help" => Command::Help,
        "register" => Command::Register,
        "rankings" => Command::Rankings,
        "matchresult" => Command::MatchResult(argument.filter(|a| !is_bot_mention(a, bot_username))),
        other => Command::Unknown(other.to_string()),
    };

    Input::Command(command)
}

fn first_handle(argument: &str) -> Option<String> {
    argument
        .split_whitespace()
        .next()
        .map(normalize_handle)
        .filter(|h| !h.is_empty())
}

/// `/matchresult @bot` on its own is the same as no argument
fn is_bot_mention(argument: &str, bot_username: &str) -> bool {
    normalize_handle(argument).eq_ignore_ascii_case(bot_username) && argument.starts_with('@')
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "tennis_ladder_bot";

    fn command(text: &str) -> Command {
        match parse_input(text, BOT) {
            Input::Command(command) => command,
            other => panic!("expected a command, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(command("/start"), Command::Start);
        assert_eq!(command("/HELP"), Command::Help);
        assert_eq!(command("/register"), Command::Register);
        assert_eq!(command("/rankings@tennis_ladder_bot"), Command::Rankings);
        assert_eq!(command("/serve"), Command::Unknown("serve".to_string()));
    }

    #[test]
    fn test_profile_targets() {
        assert_eq!(command("/profile"), Command::Profile(None));
        assert_eq!(command("/profile @bob"), Command::Profile(Some("bob".to_string())));
        assert_eq!(command("/profile@bob"), Command::Profile(Some("bob".to_string())));
        assert_eq!(command("/profile@Tennis_Ladder_Bot"), Command::Profile(None));
        assert_eq!(
            command("/activity@tennis_ladder_bot @cara"),
            Command::Activity(Some("cara".to_string()))
        );
    }

    #[test]
    fn test_match_result_argument() {
        assert_eq!(command("/matchresult"), Command::MatchResult(None));
        assert_eq!(command("/matchresult @tennis_ladder_bot"), Command::MatchResult(None));
        assert_eq!(
            command("/matchresult @bob 6-2 6-3"),
            Command::MatchResult(Some("@bob 6-2 6-3".to_string()))
        );
        assert_eq!(
            command("/matchresult@tennis_ladder_bot  @ana - @bob 6-2  "),
            Command::MatchResult(Some("@ana - @bob 6-2".to_string()))
        );
    }

    #[test]
    fn test_other_bots_and_plain_text() {
        assert_eq!(parse_input("/rankings@other_bot", BOT), Input::Foreign);
        assert_eq!(parse_input("  @bob 6-2 6-2 ", BOT), Input::Text("@bob 6-2 6-2".to_string()));
    }
}
