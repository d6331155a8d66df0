use compute_core::{Msg, TextColor};
use thiserror::Error;

/// One line typed at the terminal, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Dispatch(Msg),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum CommandError {
    #[error("unknown command {0:?}; type `help` for the list")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("unknown color {0:?}; expected black, red or blue")]
    UnknownColor(String),
}

/// Parse a terminal line. Blank lines yield `None`.
pub(crate) fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "category" | "cat" => {
            let name = words.next().ok_or(CommandError::MissingArgument("category"))?;
            Command::Dispatch(Msg::CategorySelected(name.to_string()))
        }
        // An empty item list is a valid selection: it clears the listing.
        "select" | "sel" => {
            Command::Dispatch(Msg::ItemsSelected(words.map(str::to_string).collect()))
        }
        "color" | "colour" => {
            let raw = words.next().ok_or(CommandError::MissingArgument("color"))?;
            let color =
                TextColor::parse(raw).ok_or_else(|| CommandError::UnknownColor(raw.to_string()))?;
            Command::Dispatch(Msg::TextColorChanged(color))
        }
        "clear" => Command::Dispatch(Msg::ClearCacheClicked),
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}
