//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and drive room management from inside a chat.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat.
    Exit,
    /// Create a room (optional title) and switch to it.
    New(Option<String>),
    /// List rooms.
    Rooms,
    /// Switch to another room by id or id prefix.
    Switch(String),
    /// Delete a room by id or id prefix.
    Delete(String),
    /// Unknown command or missing argument.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.splitn(2, ' ');
    let cmd = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/new" => ChatCommand::New(arg),
        "/rooms" | "/ls" => ChatCommand::Rooms,
        "/switch" | "/sw" => match arg {
            Some(room) => ChatCommand::Switch(room),
            None => ChatCommand::Unknown("/switch requires a room id".to_string()),
        },
        "/delete" | "/rm" => match arg {
            Some(room) => ChatCommand::Delete(room),
            None => ChatCommand::Unknown("/delete requires a room id".to_string()),
        },
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}           {}", style("/help").cyan(), "Show this help message");
    println!("  {}    {}", style("/new [title]").cyan(), "Create a room and switch to it");
    println!("  {}          {}", style("/rooms").cyan(), "List rooms");
    println!("  {}   {}", style("/switch <id>").cyan(), "Switch to another room");
    println!("  {}   {}", style("/delete <id>").cyan(), "Delete a room");
    println!("  {}          {}", style("/clear").cyan(), "Clear the screen");
    println!("  {}           {}", style("/quit").cyan(), "End the chat");
    println!();
    println!(
        "  {}",
        style("Room ids may be shortened to any unique prefix. Ctrl+D to exit.").dim()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/quit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/EXIT"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_new_with_and_without_title() {
        assert_eq!(parse("/new"), Some(ChatCommand::New(None)));
        assert_eq!(
            parse("/new  Churn analysis "),
            Some(ChatCommand::New(Some("Churn analysis".to_string())))
        );
    }

    #[test]
    fn test_parse_switch_and_delete() {
        assert_eq!(
            parse("/switch 0190ab"),
            Some(ChatCommand::Switch("0190ab".to_string()))
        );
        assert_eq!(
            parse("/rm 0190ab"),
            Some(ChatCommand::Delete("0190ab".to_string()))
        );
    }

    #[test]
    fn test_parse_missing_argument() {
        assert!(matches!(parse("/switch"), Some(ChatCommand::Unknown(_))));
        assert!(matches!(parse("/delete   "), Some(ChatCommand::Unknown(_))));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("revenue by region"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse("/foo"),
            Some(ChatCommand::Unknown("/foo".to_string()))
        );
    }
}
