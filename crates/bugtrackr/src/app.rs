//! Application context for CLI command execution.
//!
//! [`App`] finds the workspace, loads its configuration, opens the store and
//! wires a [`BugTracker`] with the configured dispatcher and policy.
//!
//! ```no_run
//! use bugtrackr::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     println!("{} users", app.tracker().roster().await?.len());
//!     Ok(())
//! }
//! ```

use crate::config::{BUGTRACKR_DIR_NAME, BugtrackrConfig, CONFIG_FILE_NAME, find_workspace_root};
use crate::error::{Error, Result};
use crate::store::{DocumentStore, create_store};
use crate::tracker::BugTracker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Application context for CLI operations.
pub struct App {
    tracker: BugTracker,
    config: BugtrackrConfig,
    root_dir: PathBuf,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("root_dir", &self.root_dir)
            .field("config", &self.config)
            .field("tracker", &self.tracker)
            .finish()
    }
}

impl App {
    /// Open the workspace containing `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No `.bugtrackr/` directory is found up the tree
    /// - The configuration can't be loaded or names a bad data directory
    /// - The store or the dispatcher can't be created
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_workspace_root(working_dir)
            .ok_or_else(|| Error::NotInitialized(working_dir.to_path_buf()))?;
        let config_path = root_dir.join(BUGTRACKR_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = BugtrackrConfig::load(&config_path).await?;

        let backend = config.storage.to_backend(&root_dir)?;
        let store = create_store(backend, config.bug_prefix.clone()).await?;
        let dispatcher = config.notifications.dispatcher()?;
        debug!(root = %root_dir.display(), "Opened workspace");

        let tracker = BugTracker::new(store, dispatcher)
            .with_policy(config.assignment)
            .with_default_role(config.default_role.as_str());

        Ok(Self {
            tracker,
            config,
            root_dir,
        })
    }

    /// The tracker service
    pub fn tracker(&self) -> &BugTracker {
        &self.tracker
    }

    /// The shared store
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(self.tracker.store())
    }

    /// The loaded configuration
    pub fn config(&self) -> &BugtrackrConfig {
        &self.config
    }

    /// The directory containing `.bugtrackr/`
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Persist the store. Call after any mutating command.
    pub async fn save(&self) -> Result<()> {
        self.tracker.store().save().await
    }
}
