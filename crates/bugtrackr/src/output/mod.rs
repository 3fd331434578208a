//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable text or JSON. Text writers
//! take any `Write` so they can be tested against a buffer; the public
//! `print_*` functions lock stdout and read [`OutputConfig`] from the
//! environment.
//!
//! Submodules:
//! - [`color`]: semantic colors and icons

pub mod color;

use crate::domain::{AnnotatedBug, Bug, Preferences, RosterEntry};
use crate::stats::BugStats;
use crate::suggestions::Suggestion;
use crate::tracker::SubmitOutcome;
use crate::trend::TrendSeries;
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{success, warning};

use color::{bold, colored_status_icon, colorize_id, colorize_priority, colorize_status, dimmed};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: usize = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Room left for the date, count and padding on each trend row
const TREND_ROW_OVERHEAD: usize = 20;

/// Settings that control text formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping and charts
    pub max_width: usize,
    /// ASCII-only icons and bars
    pub use_ascii: bool,
    /// Colored output
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a config with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Read the config from the process environment.
    ///
    /// - `BUGTRACKR_MAX_WIDTH`: content width (default 80)
    /// - `BUGTRACKR_ASCII`: `1`/`true` for ASCII-only icons
    /// - `NO_COLOR`: any value disables colors
    /// - `BUGTRACKR_COLOR`: `0`/`false` disables colors
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_width = match lookup("BUGTRACKR_MAX_WIDTH") {
            Some(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    env_var = "BUGTRACKR_MAX_WIDTH",
                    value = %s,
                    default = DEFAULT_MAX_CONTENT_WIDTH,
                    "Invalid value, using default"
                );
                DEFAULT_MAX_CONTENT_WIDTH
            }),
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = lookup("BUGTRACKR_ASCII")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        // https://no-color.org/
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("BUGTRACKR_COLOR")
                .is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    fn content_width(&self) -> usize {
        terminal_width().min(self.max_width)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_WIDTH, false, true)
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size().map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| usize::from(w.0))
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

fn emit<T: Serialize + ?Sized>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&mut io::StdoutLock<'_>, &OutputConfig) -> io::Result<()>,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Text => text(&mut handle, &OutputConfig::from_env()),
        OutputMode::Json => write_json(&mut handle, value),
    }
}

/// Print the reconciled bug list
pub fn print_bugs(bugs: &[AnnotatedBug], mode: OutputMode) -> io::Result<()> {
    emit(mode, bugs, |w, config| write_bugs_text(w, bugs, config))
}

/// Print one bug in full
pub fn print_bug(bug: &Bug, mode: OutputMode) -> io::Result<()> {
    emit(mode, bug, |w, config| write_bug_details_text(w, bug, config))
}

/// Print the result of `submit`
pub fn print_submitted(outcome: &SubmitOutcome, mode: OutputMode) -> io::Result<()> {
    let value = serde_json::json!({
        "bug": outcome.bug,
        "assignee": outcome.assignee.uid,
        "counterIncremented": outcome.counter_incremented,
        "notified": outcome.notified,
    });
    emit(mode, &value, |w, config| {
        write_submitted_text(w, outcome, config)
    })
}

/// Print the roster
pub fn print_roster(entries: &[RosterEntry], mode: OutputMode) -> io::Result<()> {
    emit(mode, entries, |w, config| {
        write_roster_text(w, entries, config)
    })
}

/// Print dashboard counts
pub fn print_stats(stats: &BugStats, mode: OutputMode) -> io::Result<()> {
    emit(mode, stats, |w, config| write_stats_text(w, stats, config))
}

/// Print a trend series as a horizontal bar chart
pub fn print_trend(series: &TrendSeries, mode: OutputMode) -> io::Result<()> {
    emit(mode, series, |w, config| {
        write_trend_text(w, series, config)
    })
}

/// Print keyword suggestions
pub fn print_suggestions(suggestions: &[Suggestion], mode: OutputMode) -> io::Result<()> {
    emit(mode, suggestions, |w, config| {
        write_suggestions_text(w, suggestions, config)
    })
}

/// Print a user's preferences
pub fn print_preferences(preferences: &Preferences, mode: OutputMode) -> io::Result<()> {
    emit(mode, preferences, |w, config| {
        write_preferences_text(w, preferences, config)
    })
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

/// Print a value as one line of JSON, for streaming output
pub fn print_json_line<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string(value).map_err(io::Error::other)?;
    writeln!(handle, "{json}")
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(w, "{json}")
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_bug_line<W: Write>(w: &mut W, bug: &Bug, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "{} {}  {}  {}",
        colored_status_icon(bug.status, config),
        colorize_id(bug.id.as_str(), config),
        colorize_priority(bug.priority, config),
        bug.title
    )
}

fn write_bugs_text<W: Write>(
    w: &mut W,
    bugs: &[AnnotatedBug],
    config: &OutputConfig,
) -> io::Result<()> {
    if bugs.is_empty() {
        writeln!(w, "No bugs found.")?;
        return Ok(());
    }

    writeln!(w, "Found {} bug(s):", bugs.len())?;
    writeln!(w)?;

    for entry in bugs {
        write_bug_line(w, &entry.bug, config)?;
        if entry.assigned {
            writeln!(w, "    {}", dimmed("assigned to you", config))?;
        } else {
            writeln!(
                w,
                "    {} {}",
                dimmed("assignee:", config),
                colorize_id(entry.bug.assigned_to.as_str(), config)
            )?;
        }
    }

    Ok(())
}

fn write_bug_details_text<W: Write>(
    w: &mut W,
    bug: &Bug,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}: {}",
        colored_status_icon(bug.status, config),
        colorize_id(bug.id.as_str(), config),
        bug.title
    )?;
    writeln!(
        w,
        "{} {}    {} {}",
        dimmed("Status:", config),
        colorize_status(bug.status, config),
        dimmed("Priority:", config),
        colorize_priority(bug.priority, config).trim_end()
    )?;
    writeln!(
        w,
        "{} {}    {} {}",
        dimmed("Filed by:", config),
        colorize_id(bug.created_by.as_str(), config),
        dimmed("Assignee:", config),
        colorize_id(bug.assigned_to.as_str(), config)
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Created:", config),
        bug.created_at.format("%Y-%m-%d %H:%M")
    )?;

    if !bug.description.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}:", bold("Description", config))?;
        for line in wrap_text(&bug.description, config.content_width().saturating_sub(2)) {
            writeln!(w, "  {line}")?;
        }
    }

    Ok(())
}

fn write_submitted_text<W: Write>(
    w: &mut W,
    outcome: &SubmitOutcome,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        success("Filed", config),
        colorize_id(outcome.bug.id.as_str(), config)
    )?;
    writeln!(
        w,
        "  {} {}",
        dimmed("Assigned to:", config),
        colorize_id(outcome.assignee.uid.as_str(), config)
    )?;
    if !outcome.notified {
        writeln!(
            w,
            "  {}",
            warning("Assignee was not notified", config)
        )?;
    }
    Ok(())
}

fn write_roster_text<W: Write>(
    w: &mut W,
    entries: &[RosterEntry],
    config: &OutputConfig,
) -> io::Result<()> {
    if entries.is_empty() {
        writeln!(w, "No users yet. Run `bugtrackr login` to add one.")?;
        return Ok(());
    }

    let uid_width = entries.iter().map(|e| e.uid.as_str().len()).max().unwrap_or(0);
    for entry in entries {
        let padded = format!("{:<uid_width$}", entry.uid.as_str());
        writeln!(
            w,
            "{}  {:>4}  {}  {}",
            colorize_id(&padded, config),
            entry.assigned_bug_count,
            entry.email,
            dimmed(&entry.role, config)
        )?;
    }
    Ok(())
}

fn write_stats_text<W: Write>(w: &mut W, stats: &BugStats, config: &OutputConfig) -> io::Result<()> {
    writeln!(w, "{}", bold("Bugs you filed", config))?;
    writeln!(w, "  {} {}", dimmed("Total:        ", config), stats.total)?;
    writeln!(w, "  {} {}", dimmed("Open:         ", config), stats.open)?;
    writeln!(w, "  {} {}", dimmed("Resolved:     ", config), stats.resolved)?;
    writeln!(w, "  {} {}", dimmed("High priority:", config), stats.high_priority)
}

fn write_trend_text<W: Write>(
    w: &mut W,
    series: &TrendSeries,
    config: &OutputConfig,
) -> io::Result<()> {
    let bar_room = config.content_width().saturating_sub(TREND_ROW_OVERHEAD).max(1);
    let peak = series.peak();
    let glyph = if config.use_ascii { "#" } else { "█" };

    for bucket in &series.buckets {
        let length = if peak == 0 {
            0
        } else {
            usize::try_from(bucket.count * bar_room as u64 / peak).unwrap_or(bar_room)
        };
        writeln!(
            w,
            "{} {} {}",
            dimmed(&bucket.date.format("%Y-%m-%d").to_string(), config),
            glyph.repeat(length),
            bucket.count
        )?;
    }
    writeln!(
        w,
        "{} {} over {} days",
        dimmed("Total:", config),
        series.total,
        series.buckets.len()
    )
}

fn write_suggestions_text<W: Write>(
    w: &mut W,
    suggestions: &[Suggestion],
    config: &OutputConfig,
) -> io::Result<()> {
    if suggestions.is_empty() {
        writeln!(w, "No suggestions.")?;
        return Ok(());
    }
    for suggestion in suggestions {
        for (i, line) in wrap_text(&suggestion.message(), config.content_width().saturating_sub(2))
            .into_iter()
            .enumerate()
        {
            let bullet = if i == 0 { "-" } else { " " };
            writeln!(w, "{bullet} {line}")?;
        }
    }
    Ok(())
}

fn write_preferences_text<W: Write>(
    w: &mut W,
    preferences: &Preferences,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        dimmed("Default filter:", config),
        preferences.bug_filter_default
    )?;
    writeln!(w, "{} {}", dimmed("Theme:         ", config), preferences.theme)?;
    writeln!(
        w,
        "{} {}",
        dimmed("Notifications: ", config),
        on_off(preferences.notifications_enabled)
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Suggestions:   ", config),
        on_off(preferences.ai_suggestions)
    )
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// Wrap text to `max_width`, keeping existing line breaks.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width.max(1))
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::Assignee;
    use crate::domain::{BugId, BugStatus, Priority, UserId};
    use crate::trend::bucketize_ending;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::HashMap;

    fn plain() -> OutputConfig {
        OutputConfig::new(80, true, false)
    }

    fn sample_bug() -> Bug {
        Bug {
            id: BugId::new("bug-a1b2"),
            title: "Checkout hangs".to_string(),
            description: "Spinner never stops after paying".to_string(),
            priority: Priority::High,
            status: BugStatus::Open,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            created_by: UserId::new("alice"),
            assigned_to: UserId::new("bob"),
            assigned_email: "bob@example.com".to_string(),
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_output_config_from_lookup() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("BUGTRACKR_MAX_WIDTH", "120"), ("BUGTRACKR_ASCII", "1")]);
        let config = OutputConfig::from_lookup(|k| vars.get(k).map(ToString::to_string));
        assert_eq!(config, OutputConfig::new(120, true, true));

        let vars: HashMap<&str, &str> =
            HashMap::from([("BUGTRACKR_MAX_WIDTH", "wide"), ("NO_COLOR", "")]);
        let config = OutputConfig::from_lookup(|k| vars.get(k).map(ToString::to_string));
        assert_eq!(config, OutputConfig::new(DEFAULT_MAX_CONTENT_WIDTH, false, false));

        let config = OutputConfig::from_lookup(|k| {
            (k == "BUGTRACKR_COLOR").then(|| "false".to_string())
        });
        assert!(!config.use_colors);
    }

    #[test]
    fn test_bug_list_marks_assigned() {
        let mine = AnnotatedBug {
            bug: sample_bug(),
            assigned: true,
        };
        let theirs = AnnotatedBug {
            bug: Bug {
                id: BugId::new("bug-c3d4"),
                ..sample_bug()
            },
            assigned: false,
        };

        let output = render(|w| write_bugs_text(w, &[mine, theirs], &plain()));
        assert!(output.contains("Found 2 bug(s)"));
        assert!(output.contains("o bug-a1b2  high    Checkout hangs"));
        assert!(output.contains("assigned to you"));
        assert!(output.contains("assignee: bob"));
    }

    #[test]
    fn test_empty_bug_list() {
        let output = render(|w| write_bugs_text(w, &[], &plain()));
        assert_eq!(output, "No bugs found.\n");
    }

    #[test]
    fn test_bug_details() {
        let output = render(|w| write_bug_details_text(w, &sample_bug(), &plain()));
        assert!(output.contains("bug-a1b2: Checkout hangs"));
        assert!(output.contains("Priority: high"));
        assert!(output.contains("Filed by: alice"));
        assert!(output.contains("Created: 2026-03-01 09:30"));
        assert!(output.contains("Description:"));
    }

    #[test]
    fn test_submitted_warns_when_not_notified() {
        let outcome = SubmitOutcome {
            bug: sample_bug(),
            assignee: Assignee {
                uid: UserId::new("bob"),
                email: "bob@example.com".to_string(),
                assigned_bug_count: 2,
            },
            counter_incremented: true,
            notified: false,
        };
        let output = render(|w| write_submitted_text(w, &outcome, &plain()));
        assert!(output.contains("Filed bug-a1b2"));
        assert!(output.contains("Assigned to: bob"));
        assert!(output.contains("not notified"));
    }

    #[test]
    fn test_trend_chart_scales_to_peak() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let at = |d: u32| Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap();
        let series = bucketize_ending([at(2), at(3), at(3)], 3, today);

        let config = OutputConfig::new(TREND_ROW_OVERHEAD + 10, true, false);
        let output = render(|w| write_trend_text(w, &series, &config));
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "2026-03-01  0");
        assert!(lines[2].starts_with("2026-03-03 ##########"));
        assert_eq!(lines[3], "Total: 3 over 3 days");
    }

    #[test]
    fn test_stats_and_preferences() {
        let stats = BugStats {
            total: 4,
            open: 3,
            resolved: 1,
            high_priority: 2,
        };
        let output = render(|w| write_stats_text(w, &stats, &plain()));
        assert!(output.contains("Total:         4"));
        assert!(output.contains("High priority: 2"));

        let output = render(|w| write_preferences_text(w, &Preferences::default(), &plain()));
        assert!(output.contains("Default filter: all"));
        assert!(output.contains("Notifications:  on"));
    }

    #[test]
    fn test_write_json_is_camel_case() {
        let output = render(|w| write_json(w, &sample_bug()));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["assignedTo"], "bob");
        assert_eq!(parsed["priority"], "high");
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("This is a test of text wrapping functionality", 20);
        assert!(wrapped.iter().all(|line| line.len() <= 20));
        assert_eq!(wrap_text("Line one\nLine two", 50).len(), 2);
    }
}
