//! Tracked state for reconciled resources
//!
//! Manages the `.gameflow/state.json` file which records, per declared
//! resource, the remote identifier and the last observed attribute snapshot.

use crate::codec::DesiredState;
use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".gameflow";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// All tracked resources, keyed by `type:name`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    pub resources: BTreeMap<String, TrackedState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reconciler's outcome: `Some` stores, `None` forgets
    pub fn record(&mut self, key: &str, tracked: Option<TrackedState>) {
        match tracked {
            Some(state) => self.set_resource(key.to_string(), state),
            None => {
                self.remove_resource(key);
            }
        }
    }

    /// Add or update a resource
    pub fn set_resource(&mut self, key: String, state: TrackedState) {
        self.resources.insert(key, state);
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, key: &str) -> Option<TrackedState> {
        let result = self.resources.remove(key);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    pub fn get_resource(&self, key: &str) -> Option<&TrackedState> {
        self.resources.get(key)
    }

    /// Resources of one type, as `(name, state)` pairs
    pub fn by_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a TrackedState)> + 'a {
        self.resources.iter().filter_map(move |(key, state)| {
            let (kind, name) = key.split_once(':')?;
            (kind == resource_type).then_some((name, state))
        })
    }
}

/// Status of a tracked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Backed by a live remote entity
    Present,
    /// Remote entity is in an error condition; only deletion clears this
    Tainted,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Present => write!(f, "present"),
            ResourceStatus::Tainted => write!(f, "tainted"),
        }
    }
}

/// Reconciler record of one remote entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedState {
    /// Identifier assigned by the remote service
    pub id: String,

    pub resource_type: String,

    pub status: ResourceStatus,

    /// Last observed attributes, in local shape
    pub attributes: DesiredState,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl TrackedState {
    pub fn new(
        id: impl Into<String>,
        resource_type: impl Into<String>,
        attributes: DesiredState,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            status: ResourceStatus::Present,
            attributes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_tainted(&self) -> bool {
        self.status == ResourceStatus::Tainted
    }

    pub fn taint(&mut self) {
        self.status = ResourceStatus::Tainted;
        self.updated_at = Utc::now();
    }

    /// Replace the snapshot with freshly observed attributes
    pub fn refresh(&mut self, attributes: DesiredState) {
        self.attributes = attributes;
        self.updated_at = Utc::now();
    }
}

/// Reads and writes `.gameflow/state.json` under a project root
///
/// Writes go to a temporary file first and are renamed into place; the
/// previous file is kept as `state.json.backup`.
pub struct StateManager {
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No state at {}, starting empty", path.display());
                return Ok(GlobalState::new());
            }
            Err(e) => return Err(e.into()),
        };

        let state: GlobalState = serde_json::from_str(&content).map_err(|e| {
            CloudError::StateError(format!(
                "{} is unreadable ({}); the previous state is kept in {}",
                path.display(),
                e,
                self.backup_path().display()
            ))
        })?;
        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!(resources = state.resources.len(), "Loaded state");
        Ok(state)
    }

    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        fs::create_dir_all(self.state_dir()).await?;

        let path = self.state_path();
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(state)?).await?;

        if fs::try_exists(&path).await? {
            fs::copy(&path, self.backup_path()).await?;
        }
        fs::rename(&staging, &path).await?;

        tracing::debug!(resources = state.resources.len(), "Saved state");
        Ok(())
    }

    /// Take the advisory lock for `command`
    ///
    /// The lock file is created exclusively. A lock older than
    /// [`LOCK_EXPIRY_MINUTES`] is treated as abandoned and taken over.
    pub async fn acquire_lock(&self, command: &str) -> Result<StateLock> {
        fs::create_dir_all(self.state_dir()).await?;
        let lock_path = self.lock_path();
        let info = LockInfo::current(command);
        let content = serde_json::to_string_pretty(&info)?;

        for _ in 0..2 {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(content.as_bytes()).await?;
                    file.flush().await?;
                    tracing::debug!(command, "Acquired state lock");
                    return Ok(StateLock {
                        lock_path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let held = fs::read_to_string(&lock_path).await?;
                    let holder: LockInfo = serde_json::from_str(&held)?;
                    if !holder.is_expired() {
                        return Err(CloudError::LockError(holder.to_string()));
                    }
                    tracing::warn!("Taking over abandoned lock: {}", holder);
                    fs::remove_file(&lock_path).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CloudError::LockError(format!(
            "{} keeps reappearing",
            lock_path.display()
        )))
    }
}

/// Lock abandonment threshold
pub const LOCK_EXPIRY_MINUTES: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    host: String,
    pid: u32,
    command: String,
    acquired_at: DateTime<Utc>,
}

impl LockInfo {
    fn current(command: &str) -> Self {
        Self {
            host: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            command: command.to_string(),
            acquired_at: Utc::now(),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now().signed_duration_since(self.acquired_at).num_minutes() >= LOCK_EXPIRY_MINUTES
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`gameflow {}` (pid {} on {}) holds the state since {}",
            self.command,
            self.pid,
            self.host,
            self.acquired_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Held state lock; removed on [`release`](Self::release) or drop
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.lock_path).await {
            Ok(()) => {
                tracing::debug!("Released state lock");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.set_resource(
            "alias:main".to_string(),
            TrackedState::new(
                "alias-abc",
                "alias",
                DesiredState::new()
                    .with("name", "alias1")
                    .with("routing_strategy", Value::Blocks(vec![])),
            )
            .with_status(ResourceStatus::Tainted),
        );

        manager.save(&state).await.unwrap();
        manager.save(&state).await.unwrap();
        assert!(temp_dir.path().join(STATE_DIR).join(STATE_BACKUP).exists());

        let loaded = manager.load().await.unwrap();
        let tracked = loaded.get_resource("alias:main").unwrap();
        assert_eq!(tracked.id, "alias-abc");
        assert!(tracked.is_tainted());
        assert_eq!(tracked.attributes.get("name"), Some(&Value::scalar("alias1")));
    }

    #[tokio::test]
    async fn test_empty_state() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load().await.unwrap();
        assert!(state.resources.is_empty());
    }

    #[tokio::test]
    async fn test_newer_state_version_rejected() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.version = STATE_VERSION + 1;
        manager.save(&state).await.unwrap();

        assert!(matches!(manager.load().await, Err(CloudError::StateError(_))));
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock("apply").await.unwrap();
        match manager.acquire_lock("destroy").await {
            Err(CloudError::LockError(message)) => {
                assert!(message.contains("gameflow apply"));
                assert!(message.contains(&std::process::id().to_string()));
            }
            other => panic!("expected LockError, got {:?}", other.map(|_| ())),
        }

        lock.release().await.unwrap();
        let again = manager.acquire_lock("refresh").await.unwrap();
        drop(again);
        assert!(!temp_dir.path().join(STATE_DIR).join(LOCK_FILE).exists());
    }

    #[tokio::test]
    async fn test_abandoned_lock_is_taken_over() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());
        let old = LockInfo {
            host: "ci-runner".to_string(),
            pid: 1,
            command: "apply".to_string(),
            acquired_at: Utc::now() - chrono::Duration::minutes(LOCK_EXPIRY_MINUTES + 5),
        };
        std::fs::create_dir_all(temp_dir.path().join(STATE_DIR)).unwrap();
        std::fs::write(
            temp_dir.path().join(STATE_DIR).join(LOCK_FILE),
            serde_json::to_string(&old).unwrap(),
        )
        .unwrap();

        let lock = manager.acquire_lock("apply").await.unwrap();
        lock.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_state_points_at_backup() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());
        manager.save(&GlobalState::new()).await.unwrap();
        manager.save(&GlobalState::new()).await.unwrap();
        std::fs::write(manager.state_path(), "{ truncated").unwrap();

        match manager.load().await {
            Err(CloudError::StateError(message)) => assert!(message.contains(STATE_BACKUP)),
            other => panic!("expected StateError, got {:?}", other.map(|_| ())),
        }
        assert!(!manager.state_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_record_and_by_type() {
        let mut state = GlobalState::new();
        state.record(
            "fleet:arena",
            Some(TrackedState::new("fleet-1", "fleet", DesiredState::new())),
        );
        state.record(
            "build:server",
            Some(TrackedState::new("build-1", "build", DesiredState::new())),
        );

        let fleets: Vec<_> = state.by_type("fleet").map(|(name, _)| name).collect();
        assert_eq!(fleets, vec!["arena"]);

        state.record("fleet:arena", None);
        assert!(state.get_resource("fleet:arena").is_none());
    }
}
