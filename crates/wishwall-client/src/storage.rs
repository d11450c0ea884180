//! Client-local key/value state: which wishes the owner has opened, which
//! ones they liked, and the persisted session token.
//!
//! Nothing here is authoritative. Failures are logged and swallowed so a
//! broken store never blocks the wall page.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;
use uuid::Uuid;

use crate::error::ClientError;

pub const READ_WISHES_KEY: &str = "wishwall_read_wishes";
pub const LIKED_PREFIX: &str = "wishwall_liked_";
pub const SESSION_KEY: &str = "wishwall_auth_session";

pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// Process-lifetime store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        Ok(())
    }
}

/// All entries in one JSON object on disk, rewritten on every change.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open `path`, starting empty if it doesn't exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), ClientError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }

    // Memory only changes once the new state is on disk.

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Read and liked flags for wishes, as seen by whoever uses this store.
#[derive(Clone, Copy)]
pub struct WishFlags<'a> {
    store: &'a dyn KvStore,
}

impl<'a> WishFlags<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    fn read_set(&self) -> HashSet<Uuid> {
        let Some(raw) = self.store.get(READ_WISHES_KEY) else {
            return HashSet::new();
        };
        match serde_json::from_str::<Vec<Uuid>>(&raw) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!("discarding unreadable {}: {}", READ_WISHES_KEY, e);
                HashSet::new()
            }
        }
    }

    pub fn is_read(&self, id: Uuid) -> bool {
        self.read_set().contains(&id)
    }

    pub fn mark_read(&self, id: Uuid) {
        let mut read = self.read_set();
        if !read.insert(id) {
            return;
        }
        let mut ids: Vec<Uuid> = read.into_iter().collect();
        ids.sort();
        let result = serde_json::to_string(&ids)
            .map_err(ClientError::from)
            .and_then(|raw| self.store.set(READ_WISHES_KEY, &raw));
        if let Err(e) = result {
            warn!("failed to mark wish {} as read: {}", id, e);
        }
    }

    /// How many of `ids` haven't been opened yet.
    pub fn unread_count(&self, ids: impl IntoIterator<Item = Uuid>) -> usize {
        let read = self.read_set();
        ids.into_iter().filter(|id| !read.contains(id)).count()
    }

    pub fn is_liked(&self, id: Uuid) -> bool {
        self.store.get(&liked_key(id)).as_deref() == Some("true")
    }

    /// Flip the liked flag, returning the new value.
    pub fn toggle_like(&self, id: Uuid) -> bool {
        let key = liked_key(id);
        let liked = !self.is_liked(id);
        let result = if liked {
            self.store.set(&key, "true")
        } else {
            self.store.remove(&key)
        };
        match result {
            Ok(()) => liked,
            Err(e) => {
                warn!("failed to update like for wish {}: {}", id, e);
                !liked
            }
        }
    }
}

fn liked_key(id: Uuid) -> String {
    format!("{LIKED_PREFIX}{id}")
}

// -- Session --

pub fn save_session(store: &dyn KvStore, token: &str) {
    if let Err(e) = store.set(SESSION_KEY, token) {
        warn!("failed to persist session: {}", e);
    }
}

pub fn load_session(store: &dyn KvStore) -> Option<String> {
    store.get(SESSION_KEY).filter(|t| !t.is_empty())
}

pub fn clear_session(store: &dyn KvStore) {
    if let Err(e) = store.remove(SESSION_KEY) {
        warn!("failed to clear session: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_flags_accumulate() {
        let store = MemoryStore::new();
        let flags = WishFlags::new(&store);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(flags.unread_count([a, b]), 2);
        flags.mark_read(a);
        flags.mark_read(a);
        assert!(flags.is_read(a));
        assert!(!flags.is_read(b));
        assert_eq!(flags.unread_count([a, b]), 1);

        let stored: Vec<Uuid> = serde_json::from_str(&store.get(READ_WISHES_KEY).unwrap()).unwrap();
        assert_eq!(stored, vec![a]);
    }

    #[test]
    fn like_toggles_and_uses_per_wish_key() {
        let store = MemoryStore::new();
        let flags = WishFlags::new(&store);
        let id = Uuid::new_v4();

        assert!(flags.toggle_like(id));
        assert_eq!(store.get(&format!("wishwall_liked_{id}")).as_deref(), Some("true"));
        assert!(!flags.toggle_like(id));
        assert!(store.get(&format!("wishwall_liked_{id}")).is_none());
    }

    #[test]
    fn corrupt_read_list_is_treated_as_empty() {
        let store = MemoryStore::new();
        store.set(READ_WISHES_KEY, "not json").unwrap();
        let flags = WishFlags::new(&store);
        assert!(!flags.is_read(Uuid::new_v4()));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        save_session(&store, "tok");
        drop(store);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        assert_eq!(load_session(&store).as_deref(), Some("tok"));

        clear_session(&store);
        let store = FileStore::open(&path).unwrap();
        assert!(load_session(&store).is_none());
    }

    #[test]
    fn failed_write_leaves_flags_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileStore::open(&path).unwrap();
        let flags = WishFlags::new(&store);
        let (kept, fresh) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(flags.toggle_like(kept));

        // The temp file can't be created while a directory sits in its place
        std::fs::create_dir(path.with_extension("tmp")).unwrap();

        assert!(!flags.toggle_like(fresh));
        assert!(!flags.is_liked(fresh));
        assert!(flags.toggle_like(kept));
        assert!(flags.is_liked(kept));
        flags.mark_read(fresh);
        assert!(!flags.is_read(fresh));
        assert!(store.set("k", "v").is_err());
        assert!(store.get("k").is_none());

        let reopened = FileStore::open(&path).unwrap();
        assert!(WishFlags::new(&reopened).is_liked(kept));
        assert!(!WishFlags::new(&reopened).is_liked(fresh));
    }
}
