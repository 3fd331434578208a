//! Color and styling helpers for CLI output.
//!
//! Semantic colors:
//!   - green:   resolved status, successful actions
//!   - yellow:  medium priority, warnings
//!   - red:     high priority, errors
//!   - cyan:    bug IDs and user IDs
//!   - dimmed:  field labels, chart axes
//!   - bold:    section headers

use crate::domain::{BugStatus, Priority};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply color to status text.
pub(crate) fn colorize_status(status: BugStatus, config: &OutputConfig) -> String {
    let text = status.to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        BugStatus::Open => text.white().to_string(),
        BugStatus::Resolved => text.green().to_string(),
    }
}

/// Apply color to priority text.
pub(crate) fn colorize_priority(priority: Priority, config: &OutputConfig) -> String {
    let text = format!("{:<6}", priority.to_string());
    if !config.use_colors {
        return text;
    }
    match priority {
        Priority::High => text.red().bold().to_string(),
        Priority::Medium => text.yellow().to_string(),
        Priority::Low => text.dimmed().to_string(),
    }
}

/// Colorize an identifier (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Status icon, with ASCII fallback.
pub(crate) fn colored_status_icon(status: BugStatus, config: &OutputConfig) -> String {
    let icon = match (status, config.use_ascii) {
        (BugStatus::Open, true) => "o",
        (BugStatus::Resolved, true) => "+",
        (BugStatus::Open, false) => "○",
        (BugStatus::Resolved, false) => "✓",
    };
    if !config.use_colors {
        return icon.to_string();
    }
    match status {
        BugStatus::Open => icon.white().to_string(),
        BugStatus::Resolved => icon.green().to_string(),
    }
}

/// Apply dimmed style to text.
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text.
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}
