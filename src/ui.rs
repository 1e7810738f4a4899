//! Terminal presentation helpers.
//!
//! Pure formatting functions taking a supports-color capability flag. The
//! core pipeline never touches these; only the CLI boundary does.

const BOLD: &str = "\x1b[1m";
const INVERT_ON: &str = "\x1b[7m";
const DARK_RED_BG: &str = "\x1b[41m";
const DARK_GREEN_BG: &str = "\x1b[42m";
const RESET: &str = "\x1b[0m";

fn styled(codes: &str, text: &str, color: bool) -> String {
    if color {
        format!("{codes}{text}{RESET}")
    } else {
        text.to_string()
    }
}

pub fn bold(text: &str, color: bool) -> String {
    styled(BOLD, text, color)
}

pub fn warning_line(text: &str) -> String {
    format!("\u{26a0} {text}")
}

pub fn banner(color: bool) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let title = format!("     TSS Vault Recovery Tool v{version}     ");
    let pad = " ".repeat(title.len());
    let codes = format!("{INVERT_ON}{BOLD}");
    format!(
        "\n{}\n{}\n{}\n\n",
        styled(&codes, &pad, color),
        styled(&codes, &title, color),
        styled(&codes, &pad, color),
    )
}

pub fn error_box(message: &str, color: bool) -> String {
    let codes = format!("{DARK_RED_BG}{BOLD}");
    format!(
        "\n{}\n{}  {message}\n{}\n\n",
        styled(&codes, "         ", color),
        styled(&codes, "  Error  ", color),
        styled(&codes, "         ", color),
    )
}

pub fn success_box(color: bool) -> String {
    let codes = format!("{DARK_GREEN_BG}{BOLD}");
    format!(
        "{}\n{}\n{}",
        styled(&codes, "                ", color),
        styled(&codes, "    Success!    ", color),
        styled(&codes, "                ", color),
    )
}
