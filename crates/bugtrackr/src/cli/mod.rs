//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: create a `.bugtrackr/` workspace
//! - `login`: add yourself to the roster (or refresh your email)
//! - `users`: show the roster with assignment counts
//! - `submit`: file a bug, auto-assigned to the least-loaded teammate
//! - `list` / `watch`: bugs you filed or are assigned, once or live
//! - `show`: one bug in full
//! - `resolve` / `delete`: act on a bug you filed or are assigned
//! - `stats`, `trend`, `suggest`: dashboard views over bugs you filed
//! - `prefs show|set`: your preferences
//!
//! # Global Flags
//!
//! - `--json`: JSON output
//! - `--as <UID>`: who you are (or set `BUGTRACKR_USER`)
//!
//! # Example
//!
//! ```bash
//! bugtrackr login alice --email alice@example.com
//! export BUGTRACKR_USER=alice
//! bugtrackr submit --title "Checkout hangs" -D "Spinner never stops" -p high
//! bugtrackr list --status open
//! bugtrackr trend --days 7
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

pub use args::{
    AssignArgs, DeleteArgs, InitArgs, ListArgs, ListFilterArgs, LoginArgs, PrefsAction,
    PrefsArgs, PrefsSetArgs, ResolveArgs, ShowArgs, SubmitArgs, TrendArgs, WatchArgs,
};
pub use types::{PriorityArg, StatusFilterArg, ThemeArg, Toggle};
pub use validators::{
    validate_bug_id, validate_description, validate_email, validate_prefix, validate_title,
    validate_uid, validate_window,
};

use crate::app::App;
use crate::domain::{Identity, UserId};
use crate::output::OutputMode;

/// Environment variable naming the acting user
pub const USER_ENV_VAR: &str = "BUGTRACKR_USER";

/// bugtrackr - bug tracking for small teams
///
/// File bugs, have them assigned to whoever has the fewest, and follow what
/// you filed or were handed. Data lives in `.bugtrackr/data/*.jsonl`.
#[derive(Parser, Debug)]
#[command(name = "bugtrackr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Act as this user (must have run `login` first)
    #[arg(
        long = "as",
        global = true,
        env = "BUGTRACKR_USER",
        value_parser = validate_uid
    )]
    pub as_user: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new workspace
    ///
    /// Creates `.bugtrackr/` with a configuration file and empty data files.
    Init(InitArgs),

    /// Sign in: add yourself to the roster, or update your email
    Login(LoginArgs),

    /// Show the roster of assignable users
    Users,

    /// File a new bug
    ///
    /// Without --assign-to or --assign-self the bug goes to the teammate
    /// with the fewest assigned bugs.
    Submit(SubmitArgs),

    /// List bugs you filed or are assigned
    List(ListArgs),

    /// Follow your bug list as it changes (Ctrl-C to stop)
    Watch(WatchArgs),

    /// Show one bug in full
    Show(ShowArgs),

    /// Mark a bug resolved
    Resolve(ResolveArgs),

    /// Delete a bug permanently
    Delete(DeleteArgs),

    /// Counts over the bugs you filed
    Stats,

    /// Daily count of the bugs you filed
    Trend(TrendArgs),

    /// Recurring keywords in the titles of bugs you filed
    Suggest,

    /// Show or change your preferences
    Prefs(PrefsArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("bugtrackr bug tracking");
            println!("Use --help for more information");
            return Ok(());
        };

        match command {
            Commands::Init(args) => execute::execute_init(args).await,
            command => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                self.execute_in(&app, command, output_mode).await
            }
        }
    }

    async fn execute_in(
        &self,
        app: &App,
        command: &Commands,
        output_mode: OutputMode,
    ) -> Result<()> {
        match command {
            Commands::Init(args) => execute::execute_init(args).await,
            Commands::Login(args) => execute::execute_login(app, args, output_mode).await,
            Commands::Users => execute::execute_users(app, output_mode).await,
            Commands::Submit(args) => {
                let viewer = self.viewer(app).await?;
                execute::execute_submit(app, &viewer, args, output_mode).await
            }
            Commands::List(args) => {
                let viewer = self.viewer(app).await?;
                execute::execute_list(app, viewer, args, output_mode).await
            }
            Commands::Watch(args) => {
                let viewer = self.viewer(app).await?;
                execute::execute_watch(app, viewer, args, output_mode).await
            }
            Commands::Show(args) => {
                let viewer = self.viewer(app).await?;
                execute::execute_show(app, &viewer, args, output_mode).await
            }
            Commands::Resolve(args) => {
                let viewer = self.viewer(app).await?;
                execute::execute_resolve(app, &viewer, args, output_mode).await
            }
            Commands::Delete(args) => {
                let viewer = self.viewer(app).await?;
                execute::execute_delete(app, &viewer, args, output_mode).await
            }
            Commands::Stats => {
                let viewer = self.viewer(app).await?;
                execute::execute_stats(app, &viewer, output_mode).await
            }
            Commands::Trend(args) => {
                let viewer = self.viewer(app).await?;
                execute::execute_trend(app, &viewer, args, output_mode).await
            }
            Commands::Suggest => {
                let viewer = self.viewer(app).await?;
                execute::execute_suggest(app, &viewer, output_mode).await
            }
            Commands::Prefs(args) => {
                let viewer = self.viewer(app).await?;
                execute::execute_prefs(app, &viewer, args, output_mode).await
            }
        }
    }

    /// The signed-in identity selected with `--as` / `BUGTRACKR_USER`.
    async fn viewer(&self, app: &App) -> Result<Identity> {
        let uid = self.as_user.as_deref().with_context(|| {
            format!("No user selected. Pass --as <UID> or set {USER_ENV_VAR}")
        })?;
        app.tracker()
            .identity_for(&UserId::new(uid))
            .await
            .with_context(|| format!("Run `bugtrackr login {uid} --email <EMAIL>` first"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bugtrackr").chain(args.iter().copied())).unwrap()
    }

    fn parse_err(args: &[&str]) -> clap::Error {
        Cli::try_parse_from(std::iter::once("bugtrackr").chain(args.iter().copied()))
            .unwrap_err()
    }

    #[test]
    fn test_parse_no_command() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_global_flags_after_command() {
        let cli = parse(&["list", "--json", "--as", "alice"]);
        assert!(cli.json);
        assert_eq!(cli.as_user.as_deref(), Some("alice"));
        assert!(matches!(cli.command, Some(Commands::List(_))));
    }

    #[test]
    fn test_parse_init_with_prefix() {
        match parse(&["init", "--prefix", "web", "-q"]).command {
            Some(Commands::Init(args)) => {
                assert_eq!(args.prefix.as_deref(), Some("web"));
                assert!(args.quiet);
            }
            other => panic!("Expected Init command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_init_invalid_prefix() {
        parse_err(&["init", "--prefix", "x"]);
    }

    #[test]
    fn test_parse_login() {
        match parse(&["login", "alice", "--email", "alice@example.com"]).command {
            Some(Commands::Login(args)) => {
                assert_eq!(args.uid, "alice");
                assert_eq!(args.email, "alice@example.com");
            }
            other => panic!("Expected Login command, got {other:?}"),
        }
        parse_err(&["login", "alice", "--email", "not-an-email"]);
    }

    #[test]
    fn test_parse_submit_defaults_to_auto() {
        match parse(&["submit", "--title", "Crash", "-D", "Steps"]).command {
            Some(Commands::Submit(args)) => {
                assert_eq!(args.title, "Crash");
                assert_eq!(args.priority, PriorityArg::Medium);
                assert!(args.assign.assign_to.is_none());
                assert!(!args.assign.assign_self);
            }
            other => panic!("Expected Submit command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_submit_manual() {
        match parse(&[
            "submit", "--title", "Crash", "-D", "Steps", "-p", "high", "--assign-to", "bob",
        ])
        .command
        {
            Some(Commands::Submit(args)) => {
                assert_eq!(args.priority, PriorityArg::High);
                assert_eq!(args.assign.assign_to.as_deref(), Some("bob"));
            }
            other => panic!("Expected Submit command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_submit_rejects_conflicting_assignment() {
        parse_err(&[
            "submit",
            "--title",
            "Crash",
            "-D",
            "Steps",
            "--assign-to",
            "bob",
            "--assign-self",
        ]);
    }

    #[test]
    fn test_parse_submit_rejects_blank_title() {
        parse_err(&["submit", "--title", "  ", "-D", "Steps"]);
    }

    #[test]
    fn test_parse_list_filters() {
        match parse(&["list", "--status", "resolved", "--search", "login"]).command {
            Some(Commands::List(args)) => {
                assert_eq!(args.filter.status, Some(StatusFilterArg::Resolved));
                assert_eq!(args.filter.search.as_deref(), Some("login"));
            }
            other => panic!("Expected List command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_watch_interval() {
        match parse(&["watch", "--interval", "5"]).command {
            Some(Commands::Watch(args)) => assert_eq!(args.interval, 5),
            other => panic!("Expected Watch command, got {other:?}"),
        }
        parse_err(&["watch", "--interval", "0"]);
    }

    #[test]
    fn test_parse_bug_id_commands() {
        assert!(matches!(
            parse(&["resolve", "bug-k3f9"]).command,
            Some(Commands::Resolve(args)) if args.bug_id == "bug-k3f9"
        ));
        assert!(matches!(
            parse(&["delete", "bug-k3f9"]).command,
            Some(Commands::Delete(args)) if args.bug_id == "bug-k3f9"
        ));
        assert!(matches!(
            parse(&["show", "bug-k3f9"]).command,
            Some(Commands::Show(args)) if args.bug_id == "bug-k3f9"
        ));
        parse_err(&["resolve", "bug k3f9"]);
    }

    #[test]
    fn test_parse_trend_window() {
        match parse(&["trend"]).command {
            Some(Commands::Trend(args)) => assert_eq!(args.days, 14),
            other => panic!("Expected Trend command, got {other:?}"),
        }
        match parse(&["trend", "--days", "30"]).command {
            Some(Commands::Trend(args)) => assert_eq!(args.days, 30),
            other => panic!("Expected Trend command, got {other:?}"),
        }
        parse_err(&["trend", "--days", "10"]);
    }

    #[test]
    fn test_parse_prefs() {
        assert!(matches!(
            parse(&["prefs", "show"]).command,
            Some(Commands::Prefs(PrefsArgs {
                action: PrefsAction::Show
            }))
        ));

        match parse(&["prefs", "set", "--filter", "open", "--notifications", "off"]).command {
            Some(Commands::Prefs(PrefsArgs {
                action: PrefsAction::Set(args),
            })) => {
                assert_eq!(args.filter, Some(StatusFilterArg::Open));
                assert_eq!(args.notifications, Some(Toggle::Off));
                assert!(args.theme.is_none());
            }
            other => panic!("Expected Prefs Set command, got {other:?}"),
        }

        parse_err(&["prefs", "set"]);
    }
}
