//! CLI argument structs for all commands.

use clap::{Args, Parser, Subcommand};

use super::types::{PriorityArg, StatusFilterArg, ThemeArg, Toggle};
use super::validators::{
    validate_bug_id, validate_description, validate_email, validate_prefix, validate_title,
    validate_uid, validate_window,
};
use crate::trend::DEFAULT_WINDOW_DAYS;

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Bug ID prefix (e.g., "bug" for "bug-k3f9")
    ///
    /// Must be 2-20 alphanumeric characters.
    #[arg(short, long, value_parser = validate_prefix)]
    pub prefix: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `login` command
#[derive(Parser, Debug, Clone)]
pub struct LoginArgs {
    /// User ID to sign in as
    #[arg(value_parser = validate_uid)]
    pub uid: String,

    /// Contact address for assignment notifications
    #[arg(short, long, value_parser = validate_email)]
    pub email: String,
}

/// Arguments for the `submit` command
#[derive(Parser, Debug, Clone)]
pub struct SubmitArgs {
    /// Short summary (maximum 200 characters)
    #[arg(long, value_parser = validate_title)]
    pub title: String,

    /// Full description
    #[arg(short = 'D', long, value_parser = validate_description)]
    pub description: String,

    /// Priority level
    #[arg(short, long, value_enum, default_value_t = PriorityArg::Medium)]
    pub priority: PriorityArg,

    /// Assignment target; least-loaded teammate when omitted
    #[command(flatten)]
    pub assign: AssignArgs,
}

/// Manual assignment flags for `submit`
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct AssignArgs {
    /// Assign to this teammate (falls back to you if they can't be found)
    #[arg(short = 'a', long = "assign-to", value_parser = validate_uid)]
    pub assign_to: Option<String>,

    /// Keep the bug yourself
    #[arg(long = "assign-self")]
    pub assign_self: bool,
}

/// Filter flags shared by `list` and `watch`
#[derive(Args, Debug, Clone, Default)]
pub struct ListFilterArgs {
    /// Status filter; defaults to your saved preference
    #[arg(short, long, value_enum)]
    pub status: Option<StatusFilterArg>,

    /// Case-insensitive text to find in title or description
    #[arg(long)]
    pub search: Option<String>,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Status and search filters
    #[command(flatten)]
    pub filter: ListFilterArgs,
}

/// Arguments for the `watch` command
#[derive(Parser, Debug, Clone)]
pub struct WatchArgs {
    /// Status and search filters
    #[command(flatten)]
    pub filter: ListFilterArgs,

    /// Seconds between checks for changes written by other processes
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub interval: u64,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Bug ID to display
    #[arg(value_parser = validate_bug_id)]
    pub bug_id: String,
}

/// Arguments for the `resolve` command
#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    /// Bug ID to resolve
    #[arg(value_parser = validate_bug_id)]
    pub bug_id: String,
}

/// Arguments for the `delete` command
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// Bug ID to delete
    #[arg(value_parser = validate_bug_id)]
    pub bug_id: String,
}

/// Arguments for the `trend` command
#[derive(Parser, Debug, Clone)]
pub struct TrendArgs {
    /// Window size in days (7, 14 or 30)
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_DAYS, value_parser = validate_window)]
    pub days: u32,
}

/// Arguments for the `prefs` command
#[derive(Parser, Debug, Clone)]
pub struct PrefsArgs {
    /// Show or change preferences
    #[command(subcommand)]
    pub action: PrefsAction,
}

/// `prefs` subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PrefsAction {
    /// Show your preferences
    Show,

    /// Change one or more preferences
    Set(PrefsSetArgs),
}

/// Arguments for `prefs set`; omitted fields keep their current value
#[derive(Parser, Debug, Clone)]
#[command(group = clap::ArgGroup::new("fields").multiple(true).required(true))]
pub struct PrefsSetArgs {
    /// Status filter the bug list opens with
    #[arg(long, value_enum, group = "fields")]
    pub filter: Option<StatusFilterArg>,

    /// UI theme
    #[arg(long, value_enum, group = "fields")]
    pub theme: Option<ThemeArg>,

    /// Assignment notifications
    #[arg(long, value_enum, group = "fields")]
    pub notifications: Option<Toggle>,

    /// Keyword suggestions
    #[arg(long, value_enum, group = "fields")]
    pub suggestions: Option<Toggle>,
}
