#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Session,
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
/help     show this help
/session  show the current session id and transcript
/quit     exit (Ctrl-D works too)
Anything else is sent to the assistant. Ctrl-C cancels a reply in progress.";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let command = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_string();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/session" => SlashCommand::Session,
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("hello /help"), None);
    }

    #[test]
    fn commands_ignore_arguments_and_whitespace() {
        assert_eq!(parse_slash_command("  /quit now "), Some(SlashCommand::Quit));
        assert_eq!(parse_slash_command("/exit"), Some(SlashCommand::Quit));
        assert_eq!(parse_slash_command("/session"), Some(SlashCommand::Session));
        assert_eq!(
            parse_slash_command("/frobnicate x"),
            Some(SlashCommand::Unknown("/frobnicate".to_string()))
        );
    }
}
