//! Terminal output utilities: ANSI styling, notes, and two-column tables.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Wrap `text` in `style` when color is on.
pub fn paint(text: &str, style: &str) -> String {
    if supports_color() {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip until 'm'
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Print a formatted WARNING note to stderr.
pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

/// Print a formatted ERROR note to stderr.
pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

/// Print a formatted SUCCESS note.
pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

/// Render `label  value` rows with labels padded to a common width.
/// Cells may carry ANSI codes; widths count visible characters only.
pub fn render_table(header: (&str, &str), rows: &[(String, String)]) -> String {
    let visible = |s: &str| strip_ansi(s).chars().count();
    let width = rows
        .iter()
        .map(|(label, _)| visible(label))
        .chain(std::iter::once(visible(header.0)))
        .max()
        .unwrap_or(0);

    let pad = |s: &str| format!("{s}{}", " ".repeat(width.saturating_sub(visible(s))));

    let mut out = String::new();
    out.push_str(&format!("  {}  {}\n", pad(&paint(header.0, BOLD)), paint(header.1, BOLD)));
    out.push_str(&format!("  {}  {}\n", "-".repeat(width), "-".repeat(visible(header.1).max(5))));
    for (label, value) in rows {
        out.push_str(&format!("  {}  {}\n", pad(label), value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn renders_aligned_rows() {
        let rows = vec![
            ("Type".to_string(), "ABC".to_string()),
            ("Condition".to_string(), format!("{GREEN}Good{RESET}")),
        ];
        let table = strip_ansi(&render_table(("Field", "Value"), &rows));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[2], "  Type       ABC");
        assert_eq!(lines[3], "  Condition  Good");
    }
}
