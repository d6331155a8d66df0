use compute_core::TextColor;

pub(crate) const PROMPT: &str = "> ";

const ANSI_RED: &str = "\x1b[31m";
const ANSI_BLUE: &str = "\x1b[34m";
pub(crate) const ANSI_RESET: &str = "\x1b[0m";

/// Escape sequence for `color`; black uses the terminal's own foreground.
pub(crate) fn ansi_color(color: TextColor) -> Option<&'static str> {
    match color {
        TextColor::Black => None,
        TextColor::Red => Some(ANSI_RED),
        TextColor::Blue => Some(ANSI_BLUE),
    }
}
