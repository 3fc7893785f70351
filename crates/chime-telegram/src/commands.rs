//! Slash commands understood by the bot, mapped onto reminder tools.

use serde_json::{json, Value};

pub const HELP_TEXT: &str = "\
Reminder commands:
/remind <when> | <text> - one-time reminder, e.g. /remind in 2 hours | call mom
/every <pattern> | <text> - recurring, e.g. /every daily at 9am | standup
/reminders - list active reminders
/cancel <id> - cancel a reminder, e.g. /cancel r_1
/clear - cancel all reminders
/time [timezone] - current time, e.g. /time Europe/Berlin
/help - this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Remind { when: String, text: String },
    Every { pattern: String, text: String },
    List,
    Cancel(String),
    Clear,
    Time(Option<String>),
    Help,
}

impl Command {
    /// Tool name and JSON input that carry out this command, or `None` for
    /// commands answered locally.
    pub fn tool_call(&self) -> Option<(&'static str, Value)> {
        let call = match self {
            Command::Remind { when, text } => {
                ("set_reminder", json!({ "text": text, "when": when }))
            }
            Command::Every { pattern, text } => (
                "set_recurring_reminder",
                json!({ "text": text, "pattern": pattern }),
            ),
            Command::List => ("list_reminders", json!({})),
            Command::Cancel(id) => ("cancel_reminder", json!({ "id": id })),
            Command::Clear => ("clear_all_reminders", json!({})),
            Command::Time(tz) => ("get_current_time", json!({ "timezone": tz })),
            Command::Help => return None,
        };
        Some(call)
    }
}

/// Parse a message as a command.
///
/// Returns `None` when the text is not a slash command or is addressed to a
/// different bot (`/cmd@otherbot`), and `Some(Err(usage))` when the command is
/// known but malformed or unknown.
pub fn parse_command(text: &str, bot_username: &str) -> Option<Result<Command, String>> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = match head.split_once('@') {
        Some((name, target)) => {
            if !target.eq_ignore_ascii_case(bot_username) {
                return None;
            }
            name
        }
        None => head,
    };

    let parsed = match name.to_ascii_lowercase().as_str() {
        "remind" => split_pair(args, "/remind <when> | <text>")
            .map(|(when, text)| Command::Remind { when, text }),
        "every" => split_pair(args, "/every <pattern> | <text>")
            .map(|(pattern, text)| Command::Every { pattern, text }),
        "reminders" | "list" => Ok(Command::List),
        "cancel" if args.is_empty() => Err("Usage: /cancel <id>".to_string()),
        "cancel" => Ok(Command::Cancel(args.to_string())),
        "clear" => Ok(Command::Clear),
        "time" => Ok(Command::Time((!args.is_empty()).then(|| args.to_string()))),
        "help" | "start" => Ok(Command::Help),
        other => Err(format!("Unknown command /{other}. Send /help for the list.")),
    };
    Some(parsed)
}

fn split_pair(args: &str, usage: &str) -> Result<(String, String), String> {
    match args.split_once('|') {
        Some((left, right)) if !left.trim().is_empty() && !right.trim().is_empty() => {
            Ok((left.trim().to_string(), right.trim().to_string()))
        }
        _ => Err(format!("Usage: {usage}")),
    }
}
