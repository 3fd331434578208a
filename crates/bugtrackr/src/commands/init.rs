//! Implementation of the `init` command.
//!
//! Creates the `.bugtrackr/` directory with a configuration file and an
//! empty data directory.

use crate::config::{
    BUGTRACKR_DIR_NAME, BugtrackrConfig, CONFIG_FILE_NAME, DATA_DIR_NAME, DEFAULT_PREFIX,
    validate_prefix,
};
use crate::error::{Error, Result};
use crate::store::in_memory::{BUGS_FILE, PREFERENCES_FILE, USERS_FILE};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Name of the gitignore file within `.bugtrackr/`
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

const GITIGNORE_CONTENT: &str = "\
# Temporary files left behind by an interrupted save
*.tmp
";

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created `.bugtrackr` directory
    pub bugtrackr_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created data directory
    pub data_dir: PathBuf,
    /// The prefix used for bug IDs
    pub prefix: String,
}

/// Initialize a new workspace in `base_dir`.
///
/// The prefix defaults to [`DEFAULT_PREFIX`] and is trimmed before use.
///
/// # Errors
///
/// Returns an error if `.bugtrackr/` already exists, the prefix is invalid,
/// or a file system operation fails.
pub async fn init(base_dir: &Path, prefix: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix)?;

    let bugtrackr_dir = base_dir.join(BUGTRACKR_DIR_NAME);
    if bugtrackr_dir.exists() {
        return Err(Error::Config(format!(
            "bugtrackr is already initialized in this directory. Found existing '{BUGTRACKR_DIR_NAME}'"
        )));
    }

    let config = BugtrackrConfig::new(prefix);
    let data_dir = match config.storage.to_backend(base_dir)?.data_dir() {
        Some(dir) => dir.to_path_buf(),
        None => bugtrackr_dir.join(DATA_DIR_NAME),
    };

    fs::create_dir_all(&data_dir).await?;
    for file in [BUGS_FILE, USERS_FILE, PREFERENCES_FILE] {
        fs::write(data_dir.join(file), "").await?;
    }

    let config_file = bugtrackr_dir.join(CONFIG_FILE_NAME);
    config.save(&config_file).await?;

    fs::write(bugtrackr_dir.join(GITIGNORE_FILE_NAME), GITIGNORE_CONTENT).await?;

    info!(dir = %bugtrackr_dir.display(), prefix, "Initialized workspace");

    Ok(InitResult {
        bugtrackr_dir,
        config_file,
        data_dir,
        prefix: prefix.to_string(),
    })
}

/// Whether `base_dir` itself holds a `.bugtrackr/` directory.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(BUGTRACKR_DIR_NAME).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_layout() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), Some("web")).await.unwrap();

        assert!(is_initialized(temp_dir.path()));
        assert!(result.config_file.is_file());
        assert!(result.data_dir.join(BUGS_FILE).is_file());
        assert!(result.data_dir.join(USERS_FILE).is_file());
        assert!(result.data_dir.join(PREFERENCES_FILE).is_file());
        assert!(result.bugtrackr_dir.join(GITIGNORE_FILE_NAME).is_file());
        assert_eq!(result.prefix, "web");

        let config = BugtrackrConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config.bug_prefix, "web");
    }

    #[tokio::test]
    async fn test_init_default_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), None).await.unwrap();
        assert_eq!(result.prefix, DEFAULT_PREFIX);
    }

    #[tokio::test]
    async fn test_init_trims_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), Some("  web  ")).await.unwrap();
        assert_eq!(result.prefix, "web");
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).await.unwrap();

        let err = init(temp_dir.path(), None).await.unwrap_err();
        assert!(err.to_string().contains("already initialized"));
    }

    #[tokio::test]
    async fn test_init_invalid_prefix_creates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(init(temp_dir.path(), Some("x")).await.is_err());
        assert!(!is_initialized(temp_dir.path()));
    }
}
