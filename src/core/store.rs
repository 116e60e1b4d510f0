use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::StoreError;
use super::snapshot::Snapshot;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Keyed document storage for user snapshots.
pub trait DocumentStore: Send + Sync {
    fn load(&self, user_id: &str) -> Result<Option<Snapshot>>;
    fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<()>;
}

/// One pretty-printed JSON document per user under `<root>/users/`.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, user_id: &str) -> Result<PathBuf> {
        let valid = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !user_id.starts_with('.');
        if !valid {
            return Err(StoreError::Backend(format!("invalid user id: {user_id:?}")));
        }
        Ok(self.root.join("users").join(format!("{user_id}.json")))
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self, user_id: &str) -> Result<Option<Snapshot>> {
        let path = self.path_for(user_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<()> {
        let path = self.path_for(user_id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        // Write then rename so a crash never leaves half a document behind.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-process store. Counts saves so debounce behaviour can be observed.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, Snapshot>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn docs(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Snapshot>>> {
        self.docs
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, user_id: &str) -> Result<Option<Snapshot>> {
        Ok(self.docs()?.get(user_id).cloned())
    }

    fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<()> {
        self.docs()?.insert(user_id.to_string(), snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Debounced, best-effort writer.
///
/// Snapshots handed to [`Persister::schedule`] are coalesced: only the latest
/// one is written, once no newer snapshot has arrived for the quiet period.
/// Failed writes are logged and dropped; in-memory state is never touched.
pub struct Persister {
    sender: Option<mpsc::UnboundedSender<Snapshot>>,
    task: Option<JoinHandle<()>>,
}

impl Persister {
    pub fn spawn(store: Arc<dyn DocumentStore>, user_id: String, quiet: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_debounced(store, user_id, quiet, receiver));
        Persister {
            sender: Some(sender),
            task: Some(task),
        }
    }

    pub fn schedule(&self, snapshot: Snapshot) {
        if let Some(sender) = &self.sender {
            if sender.send(snapshot).is_err() {
                tracing::warn!("persister stopped, snapshot dropped");
            }
        }
    }

    /// Write whatever is still pending and stop.
    pub async fn close(mut self) {
        self.sender.take();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "persister task ended abnormally");
            }
        }
    }
}

impl Drop for Persister {
    /// Teardown without `close` discards the pending write.
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_debounced(
    store: Arc<dyn DocumentStore>,
    user_id: String,
    quiet: Duration,
    mut receiver: mpsc::UnboundedReceiver<Snapshot>,
) {
    let mut pending: Option<Snapshot> = None;
    loop {
        tokio::select! {
            message = receiver.recv() => match message {
                Some(snapshot) => pending = Some(snapshot),
                None => {
                    if let Some(snapshot) = pending.take() {
                        write(store.as_ref(), &user_id, &snapshot);
                    }
                    break;
                }
            },
            _ = tokio::time::sleep(quiet), if pending.is_some() => {
                if let Some(snapshot) = pending.take() {
                    write(store.as_ref(), &user_id, &snapshot);
                }
            }
        }
    }
}

fn write(store: &dyn DocumentStore, user_id: &str, snapshot: &Snapshot) {
    match store.save(user_id, snapshot) {
        Ok(()) => tracing::debug!(user = user_id, "snapshot persisted"),
        Err(e) => tracing::warn!(user = user_id, error = %e, "failed to persist snapshot"),
    }
}
