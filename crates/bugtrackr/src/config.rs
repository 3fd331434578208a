//! Workspace configuration.
//!
//! A bugtrackr workspace is any directory containing `.bugtrackr/`. Its
//! `config.yaml` looks like:
//!
//! ```yaml
//! bug-prefix: bug
//! storage:
//!   backend: jsonl
//!   data-dir: .bugtrackr/data
//! assignment:
//!   lone-candidate-to-self: true
//! notifications:
//!   endpoint: https://example.com/sendAssignmentEmail
//!   timeout-secs: 10
//! default-role: Developer
//! ```
//!
//! Every section except `bug-prefix` and `storage` may be omitted.

use crate::assignment::AssignmentPolicy;
use crate::domain::DEFAULT_ROLE;
use crate::error::{Error, Result};
use crate::notify::{DEFAULT_TIMEOUT, HttpDispatcher, LogDispatcher, NotificationDispatcher};
use crate::store::StoreBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Default bug ID prefix
pub const DEFAULT_PREFIX: &str = "bug";

/// Name of the workspace directory
pub const BUGTRACKR_DIR_NAME: &str = ".bugtrackr";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the data directory inside `.bugtrackr/`
pub const DATA_DIR_NAME: &str = "data";

/// Minimum prefix length
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Maximum prefix length
pub const MAX_PREFIX_LENGTH: usize = 20;

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct BugtrackrConfig {
    /// Bug ID prefix (e.g., "bug" for "bug-k3f9")
    pub bug_prefix: String,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Auto-assignment tunables
    #[serde(default)]
    pub assignment: AssignmentPolicy,

    /// Notification delivery
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Role label given to first-time users
    #[serde(default = "default_role")]
    pub default_role: String,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Ephemeral, nothing written to disk
    Memory,

    /// JSONL files in `data-dir`
    Jsonl,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Backend kind
    pub backend: StorageKind,

    /// Data directory, relative to the workspace root
    pub data_dir: String,
}

impl StorageConfig {
    /// Resolve to a store backend rooted at `root_dir`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `data-dir` is absolute or escapes the
    /// workspace.
    pub fn to_backend(&self, root_dir: &Path) -> Result<StoreBackend> {
        match self.backend {
            StorageKind::Memory => Ok(StoreBackend::InMemory),
            StorageKind::Jsonl => {
                let relative = Path::new(&self.data_dir);
                if relative.is_absolute()
                    || relative
                        .components()
                        .any(|c| matches!(c, std::path::Component::ParentDir))
                {
                    return Err(Error::Config(format!(
                        "data-dir must be a relative path inside the workspace, got '{}'",
                        self.data_dir
                    )));
                }
                Ok(StoreBackend::Jsonl(root_dir.join(relative)))
            }
        }
    }
}

/// Notification section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct NotificationConfig {
    /// Callable endpoint; notifications are only logged when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl NotificationConfig {
    /// Build the configured dispatcher.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client can't be built.
    pub fn dispatcher(&self) -> Result<Arc<dyn NotificationDispatcher>> {
        match &self.endpoint {
            Some(endpoint) => {
                let dispatcher =
                    HttpDispatcher::new(endpoint.as_str(), Duration::from_secs(self.timeout_secs))
                        .map_err(|e| Error::Config(e.to_string()))?;
                debug!(endpoint = dispatcher.endpoint(), "Using HTTP notification dispatcher");
                Ok(Arc::new(dispatcher))
            }
            None => Ok(Arc::new(LogDispatcher)),
        }
    }
}

impl BugtrackrConfig {
    /// Create a new configuration with the given prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            bug_prefix: prefix.to_string(),
            storage: StorageConfig {
                backend: StorageKind::Jsonl,
                data_dir: format!("{BUGTRACKR_DIR_NAME}/{DATA_DIR_NAME}"),
            },
            assignment: AssignmentPolicy::default(),
            notifications: NotificationConfig::default(),
            default_role: default_role(),
        }
    }

    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        validate_prefix(&config.bug_prefix)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for BugtrackrConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Validate bug ID prefix format.
///
/// Requirements:
/// - 2-20 characters
/// - ASCII letters and digits only
///
/// Expects pre-trimmed input.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < MIN_PREFIX_LENGTH {
        return Err(Error::Config(format!(
            "Prefix must be at least {MIN_PREFIX_LENGTH} characters"
        )));
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(Error::Config(format!(
            "Prefix cannot exceed {MAX_PREFIX_LENGTH} characters"
        )));
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Config(
            "Prefix must contain only alphanumeric characters".to_string(),
        ));
    }

    Ok(())
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory containing `.bugtrackr/`, or `None` if there is
/// none within [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_workspace_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(BUGTRACKR_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::short("ab")]
    #[case::default("bug")]
    #[case::alphanumeric("web2")]
    #[case::max_length("a1b2c3d4e5f6g7h8i9j0")]
    fn test_validate_prefix_valid(#[case] prefix: &str) {
        assert!(validate_prefix(prefix).is_ok());
    }

    #[rstest]
    #[case::too_short("a", "at least 2")]
    #[case::empty("", "at least 2")]
    #[case::too_long("a".repeat(21), "cannot exceed 20")]
    #[case::hyphen("bug-x", "alphanumeric")]
    #[case::space("bug x", "alphanumeric")]
    fn test_validate_prefix_invalid(#[case] prefix: impl AsRef<str>, #[case] expected: &str) {
        let err = validate_prefix(prefix.as_ref()).unwrap_err().to_string();
        assert!(
            err.to_lowercase().contains(expected),
            "Expected error to contain '{expected}', got: '{err}'"
        );
    }

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let yaml = "bug-prefix: web\nstorage:\n  backend: memory\n  data-dir: x\n";
        let config: BugtrackrConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bug_prefix, "web");
        assert_eq!(config.storage.backend, StorageKind::Memory);
        assert!(config.assignment.lone_candidate_to_self);
        assert_eq!(config.notifications.endpoint, None);
        assert_eq!(config.notifications.timeout_secs, 10);
        assert_eq!(config.default_role, DEFAULT_ROLE);
    }

    #[test]
    fn test_assignment_policy_from_yaml() {
        let yaml = "bug-prefix: web\nstorage:\n  backend: jsonl\n  data-dir: d\nassignment:\n  lone-candidate-to-self: false\n";
        let config: BugtrackrConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.assignment.lone_candidate_to_self);
    }

    #[test]
    fn test_to_backend() {
        let root = Path::new("/work");
        let config = BugtrackrConfig::default();
        assert_eq!(
            config.storage.to_backend(root).unwrap(),
            StoreBackend::Jsonl(PathBuf::from("/work/.bugtrackr/data"))
        );

        let escaping = StorageConfig {
            backend: StorageKind::Jsonl,
            data_dir: "../elsewhere".to_string(),
        };
        assert!(escaping.to_backend(root).is_err());

        let memory = StorageConfig {
            backend: StorageKind::Memory,
            data_dir: String::new(),
        };
        assert_eq!(memory.to_backend(root).unwrap(), StoreBackend::InMemory);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        let mut config = BugtrackrConfig::new("web");
        config.notifications.endpoint = Some("http://localhost:5001/notify".to_string());
        config.save(&path).await.unwrap();

        assert_eq!(BugtrackrConfig::load(&path).await.unwrap(), config);
    }

    #[test]
    fn test_find_workspace_root_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(BUGTRACKR_DIR_NAME)).unwrap();
        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_workspace_root(&nested).as_deref(),
            Some(temp_dir.path())
        );
    }

    #[test]
    fn test_find_workspace_root_none() {
        let temp_dir = TempDir::new().unwrap();
        // A parent of the temp dir could be a workspace; only check that the
        // answer, if any, is not inside the temp dir.
        let found = find_workspace_root(temp_dir.path());
        assert!(found.is_none_or(|root| !root.starts_with(temp_dir.path())));
    }
}
