//! Command execution logic.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, warn};

use super::args::{
    DeleteArgs, InitArgs, ListArgs, ListFilterArgs, LoginArgs, PrefsAction, PrefsArgs,
    ResolveArgs, ShowArgs, SubmitArgs, TrendArgs, WatchArgs,
};
use crate::app::App;
use crate::assignment::{AssignmentMode, ManualChoice};
use crate::domain::{AnnotatedBug, BugId, Identity, UserId};
use crate::output::{self, OutputMode};
use crate::session::{BugListSession, LiveBugList};
use crate::tracker::BugSubmission;

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;

    if !args.quiet {
        println!(
            "Initializing bugtrackr workspace{}...",
            args.prefix
                .as_ref()
                .map(|p| format!(" with prefix '{p}'"))
                .unwrap_or_default()
        );
    }

    let result = init::init(&current_dir, args.prefix.as_deref()).await?;

    if !args.quiet {
        println!("Initialized bugtrackr in {}", result.bugtrackr_dir.display());
        println!("  Config: {}", result.config_file.display());
        println!("  Data:   {}", result.data_dir.display());
        println!("  Bug prefix: {}", result.prefix);
    }

    Ok(())
}

/// Execute the login command
pub async fn execute_login(app: &App, args: &LoginArgs, output_mode: OutputMode) -> Result<()> {
    let identity = Identity::new(args.uid.as_str(), args.email.as_str());
    let entry = app.tracker().sign_in(&identity).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&entry)?,
        OutputMode::Text => {
            output::print_message(&format!("Signed in as {} ({})", entry.uid, entry.email))?;
            output::print_message(&format!(
                "Use --as {0} or export BUGTRACKR_USER={0} for other commands",
                entry.uid
            ))?;
        }
    }
    Ok(())
}

/// Execute the users command
pub async fn execute_users(app: &App, output_mode: OutputMode) -> Result<()> {
    let roster = app.tracker().roster().await?;
    output::print_roster(&roster, output_mode)?;
    Ok(())
}

/// Execute the submit command
pub async fn execute_submit(
    app: &App,
    viewer: &Identity,
    args: &SubmitArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let mode = match (&args.assign.assign_to, args.assign.assign_self) {
        (_, true) => AssignmentMode::Manual(ManualChoice::SelfAssign),
        (Some(uid), false) => {
            AssignmentMode::Manual(ManualChoice::User(UserId::new(uid.as_str())))
        }
        (None, false) => AssignmentMode::Auto,
    };

    let outcome = app
        .tracker()
        .submit_bug(
            viewer,
            BugSubmission {
                title: args.title.clone(),
                description: args.description.clone(),
                priority: args.priority.into(),
                mode,
            },
        )
        .await?;
    app.save().await?;

    output::print_submitted(&outcome, output_mode)?;
    Ok(())
}

/// Open a live list for `viewer`, overriding the saved filter with any flags.
async fn open_list(app: &App, viewer: Identity, filter: &ListFilterArgs) -> Result<LiveBugList> {
    let session = BugListSession::new(app.store(), viewer);
    let preferences = session.load_preferences().await;
    let mut list = session.start(preferences).await?;
    list.wait_synced().await?;

    if let Some(status) = filter.status {
        list.set_status_filter(status.into());
    }
    if let Some(search) = &filter.search {
        list.set_search(search.as_str());
    }
    Ok(list)
}

/// Execute the list command
pub async fn execute_list(
    app: &App,
    viewer: Identity,
    args: &ListArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let list = open_list(app, viewer, &args.filter).await?;
    // Persist preferences created on first use
    app.save().await?;

    output::print_bugs(&list.visible(), output_mode)?;
    list.cancel();
    Ok(())
}

/// Execute the watch command.
///
/// Prints the list, then again whenever the visible part changes. Changes
/// made by other processes are picked up by reloading the store every
/// `--interval` seconds.
pub async fn execute_watch(
    app: &App,
    viewer: Identity,
    args: &WatchArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let mut list = open_list(app, viewer, &args.filter).await?;
    app.save().await?;

    let store = app.store();
    let mut reload = tokio::time::interval(Duration::from_secs(args.interval));
    let mut shown: Vec<AnnotatedBug> = list.visible();
    print_watch_frame(&shown, output_mode)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("Interrupted, stopping watch");
                break;
            }
            changed = list.changed() => {
                if !changed {
                    break;
                }
                let visible = list.visible();
                if visible != shown {
                    print_watch_frame(&visible, output_mode)?;
                    shown = visible;
                }
            }
            _ = reload.tick() => {
                if let Err(e) = store.reload().await {
                    warn!(error = %e, "Reload failed");
                }
            }
        }
    }

    list.cancel();
    Ok(())
}

fn print_watch_frame(bugs: &[AnnotatedBug], output_mode: OutputMode) -> Result<()> {
    match output_mode {
        OutputMode::Json => output::print_json_line(bugs)?,
        OutputMode::Text => {
            output::print_message(&format!(
                "--- {} ---",
                chrono::Local::now().format("%H:%M:%S")
            ))?;
            output::print_bugs(bugs, output_mode)?;
        }
    }
    Ok(())
}

/// Execute the show command
pub async fn execute_show(
    app: &App,
    viewer: &Identity,
    args: &ShowArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let bug = app
        .tracker()
        .bug(&viewer.uid, &BugId::new(args.bug_id.as_str()))
        .await?;
    output::print_bug(&bug, output_mode)?;
    Ok(())
}

/// Execute the resolve command
pub async fn execute_resolve(
    app: &App,
    viewer: &Identity,
    args: &ResolveArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let bug = app
        .tracker()
        .resolve_bug(&viewer.uid, &BugId::new(args.bug_id.as_str()))
        .await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&bug)?,
        OutputMode::Text => {
            output::print_message(&format!("Resolved {}: {}", bug.id, bug.title))?;
        }
    }
    Ok(())
}

/// Execute the delete command
pub async fn execute_delete(
    app: &App,
    viewer: &Identity,
    args: &DeleteArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let bug = app
        .tracker()
        .delete_bug(&viewer.uid, &BugId::new(args.bug_id.as_str()))
        .await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({ "deleted": bug.id }))?,
        OutputMode::Text => {
            output::print_message(&format!("Deleted {}: {}", bug.id, bug.title))?;
        }
    }
    Ok(())
}

/// Execute the stats command
pub async fn execute_stats(app: &App, viewer: &Identity, output_mode: OutputMode) -> Result<()> {
    let stats = app.tracker().stats_for(&viewer.uid).await?;
    output::print_stats(&stats, output_mode)?;
    Ok(())
}

/// Execute the trend command
pub async fn execute_trend(
    app: &App,
    viewer: &Identity,
    args: &TrendArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let series = app.tracker().trend_for(&viewer.uid, args.days).await?;
    output::print_trend(&series, output_mode)?;
    Ok(())
}

/// Execute the suggest command
pub async fn execute_suggest(app: &App, viewer: &Identity, output_mode: OutputMode) -> Result<()> {
    let preferences = app.tracker().load_preferences(&viewer.uid).await;
    app.save().await?;

    if !preferences.ai_suggestions && output_mode == OutputMode::Text {
        output::print_message(
            "Suggestions are turned off. Enable them with `bugtrackr prefs set --suggestions on`.",
        )?;
        return Ok(());
    }

    let suggestions = app.tracker().suggestions_for(&viewer.uid).await?;
    output::print_suggestions(&suggestions, output_mode)?;
    Ok(())
}

/// Execute the prefs command
pub async fn execute_prefs(
    app: &App,
    viewer: &Identity,
    args: &PrefsArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let mut preferences = app.tracker().load_preferences(&viewer.uid).await;

    if let PrefsAction::Set(set) = &args.action {
        if let Some(filter) = set.filter {
            preferences.bug_filter_default = filter.into();
        }
        if let Some(theme) = set.theme {
            preferences.theme = theme.into();
        }
        if let Some(notifications) = set.notifications {
            preferences.notifications_enabled = notifications.into();
        }
        if let Some(suggestions) = set.suggestions {
            preferences.ai_suggestions = suggestions.into();
        }
        app.tracker()
            .save_preferences(&viewer.uid, preferences)
            .await?;
    }
    app.save().await?;

    output::print_preferences(&preferences, output_mode)?;
    Ok(())
}
