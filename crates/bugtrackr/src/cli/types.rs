//! CLI value enums and their domain conversions.

use clap::ValueEnum;

use crate::domain::{Priority, StatusFilter, Theme};

/// Priority for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityArg {
    /// Can wait
    Low,
    /// Normal priority
    #[default]
    Medium,
    /// Needs attention soon
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

/// Status filter for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilterArg {
    /// Every bug
    All,
    /// Open bugs only
    Open,
    /// Resolved bugs only
    Resolved,
}

impl From<StatusFilterArg> for StatusFilter {
    fn from(arg: StatusFilterArg) -> Self {
        match arg {
            StatusFilterArg::All => StatusFilter::All,
            StatusFilterArg::Open => StatusFilter::Open,
            StatusFilterArg::Resolved => StatusFilter::Resolved,
        }
    }
}

/// Theme for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArg {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

/// On/off switch for boolean preferences
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Enabled
    #[value(alias = "true")]
    On,
    /// Disabled
    #[value(alias = "false")]
    Off,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> Self {
        toggle == Toggle::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Priority::from(PriorityArg::High), Priority::High);
        assert_eq!(Priority::from(PriorityArg::default()), Priority::Medium);
        assert_eq!(
            StatusFilter::from(StatusFilterArg::Resolved),
            StatusFilter::Resolved
        );
        assert_eq!(Theme::from(ThemeArg::Dark), Theme::Dark);
        assert!(bool::from(Toggle::On));
        assert!(!bool::from(Toggle::Off));
    }

    #[test]
    fn test_toggle_aliases() {
        assert_eq!(Toggle::from_str("true", true).unwrap(), Toggle::On);
        assert_eq!(Toggle::from_str("off", true).unwrap(), Toggle::Off);
    }
}
