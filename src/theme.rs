//! Terminal styling for human-readable output

use colored::Colorize;

pub struct Theme;

impl Theme {
    pub fn header(text: &str) -> String {
        text.bold().to_string()
    }

    pub fn label(text: &str) -> String {
        text.cyan().to_string()
    }

    pub fn value(text: &str) -> String {
        text.bright_white().to_string()
    }

    pub fn size(text: &str) -> String {
        text.yellow().to_string()
    }

    pub fn muted(text: &str) -> String {
        text.dimmed().to_string()
    }

    pub fn success(text: &str) -> String {
        text.green().bold().to_string()
    }

    pub fn warning(text: &str) -> String {
        text.yellow().bold().to_string()
    }

    pub fn error(text: &str) -> String {
        text.red().bold().to_string()
    }

    pub fn divider(width: usize) -> String {
        "─".repeat(width).dimmed().to_string()
    }

    pub fn divider_bold(width: usize) -> String {
        "━".repeat(width).to_string()
    }
}
