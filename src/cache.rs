//! Named, TTL-checked document stores.
//!
//! A [`NamedStore`] keeps one JSON document per key on top of a [`CacheBackend`].
//! Values go through their persisted (serialized) shape on every write and are
//! rehydrated on read, so memory and file backends behave the same way.
//!
//! Staleness is checked by the caller at read time via [`is_fresh`]; nothing is
//! evicted in the background.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDateTime};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::ingest::normalize::short_hash;
use crate::ingest::types::{Posting, SourceTag};

pub const HYBRID_STORE: &str = "hybrid_jobs_cache";
pub const KEYWORD_STORE: &str = "cached_jobs";

/// Raw key/document storage. Writes replace the whole document atomically.
pub trait CacheBackend: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, doc: &str) -> Result<()>;
    /// Returns whether something was removed.
    fn remove(&self, key: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    docs: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let docs = self.docs.read().map_err(|_| anyhow!("cache lock poisoned"))?;
        Ok(docs.get(key).cloned())
    }

    fn save(&self, key: &str, doc: &str) -> Result<()> {
        let mut docs = self.docs.write().map_err(|_| anyhow!("cache lock poisoned"))?;
        docs.insert(key.to_string(), doc.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut docs = self.docs.write().map_err(|_| anyhow!("cache lock poisoned"))?;
        Ok(docs.remove(key).is_some())
    }
}

/// One `<hash>.json` file per key. Writes go to a temp file and are renamed into place.
///
/// File names are a short hash, so each file also records the full key; a file
/// holding a different key reads as absent.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating cache dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", short_hash(key)))
    }
}

#[derive(Serialize, Deserialize)]
struct KeyedDoc {
    key: String,
    doc: String,
}

fn tmp_path(path: &Path) -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let n = SEQ.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("json.{}.{}.tmp", std::process::id(), n))
}

impl CacheBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let stored: KeyedDoc = serde_json::from_str(&raw)
            .with_context(|| format!("decoding {}", path.display()))?;
        if stored.key != key {
            tracing::debug!(path = %path.display(), "cache file holds another key; treating as miss");
            return Ok(None);
        }
        Ok(Some(stored.doc))
    }

    fn save(&self, key: &str, doc: &str) -> Result<()> {
        let path = self.path_for(key);
        let body = serde_json::to_string(&KeyedDoc {
            key: key.to_string(),
            doc: doc.to_string(),
        })?;
        let tmp = tmp_path(&path);
        let mut f = fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(body.as_bytes())?;
        f.sync_all()?;
        fs::rename(&tmp, &path).with_context(|| format!("renaming into {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        if self.load(key)?.is_none() {
            return Ok(false);
        }
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("removing cache file"),
        }
    }
}

/// Typed view over a backend, identified by a store name used in logs and metrics.
pub struct NamedStore<T> {
    name: &'static str,
    backend: Arc<dyn CacheBackend>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> Clone for NamedStore<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            backend: Arc::clone(&self.backend),
            _doc: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> NamedStore<T> {
    pub fn new(name: &'static str, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            name,
            backend,
            _doc: PhantomData,
        }
    }

    pub fn in_memory(name: &'static str) -> Self {
        Self::new(name, Arc::new(MemoryBackend::new()))
    }

    /// File-backed store living in `<root>/<name>/`.
    pub fn on_disk(name: &'static str, root: &Path) -> Result<Self> {
        let backend = FileBackend::new(root.join(name))?;
        Ok(Self::new(name, Arc::new(backend)))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, key: &str) -> Result<Option<T>> {
        let Some(doc) = self.backend.load(key)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&doc)
            .with_context(|| format!("decoding `{}` entry for {key}", self.name))?;
        Ok(Some(value))
    }

    /// Overwrite-on-key.
    pub fn upsert(&self, key: &str, value: &T) -> Result<()> {
        let doc = serde_json::to_string(value)
            .with_context(|| format!("encoding `{}` entry for {key}", self.name))?;
        self.backend.save(key, &doc)
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        self.backend.remove(key)
    }
}

/// Aggregated result set for one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub query_key: String,
    pub postings: Vec<Posting>,
    pub sources_used: Vec<SourceTag>,
    pub fetched_at: NaiveDateTime,
}

/// Raw structured-API page for one keyword query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordCacheEntry {
    pub query_key: String,
    pub postings: Vec<Posting>,
    pub fetched_at: NaiveDateTime,
}

/// `now - fetched_at < ttl`. Entries from the future count as fresh.
pub fn is_fresh(fetched_at: NaiveDateTime, now: NaiveDateTime, ttl: Duration) -> bool {
    now.signed_duration_since(fetched_at) < ttl
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn freshness_boundary_is_exclusive() {
        let ttl = Duration::hours(6);
        assert!(is_fresh(t(0, 0), t(5, 59), ttl));
        assert!(!is_fresh(t(0, 0), t(6, 0), ttl));
        assert!(!is_fresh(t(0, 0), t(6, 1), ttl));
    }

    #[test]
    fn memory_store_upserts_and_deletes() {
        let store: NamedStore<KeywordCacheEntry> = NamedStore::in_memory(KEYWORD_STORE);
        let mut e = KeywordCacheEntry {
            query_key: "k".into(),
            postings: vec![],
            fetched_at: t(1, 0),
        };
        store.upsert("k", &e).unwrap();
        e.fetched_at = t(2, 0);
        store.upsert("k", &e).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap().fetched_at, t(2, 0));
        assert!(store.delete("k").unwrap());
        assert!(!store.delete("k").unwrap());
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store: NamedStore<KeywordCacheEntry> =
            NamedStore::on_disk(KEYWORD_STORE, dir.path()).unwrap();
        let e = KeywordCacheEntry {
            query_key: "python_remote".into(),
            postings: vec![],
            fetched_at: t(3, 30),
        };
        store.upsert(&e.query_key, &e).unwrap();
        assert_eq!(store.get("python_remote").unwrap(), Some(e));
        assert!(dir.path().join(KEYWORD_STORE).is_dir());
    }

    #[test]
    fn file_named_for_another_key_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        backend.save("rust-berlin-true", "{}").unwrap();

        // same file name, different key
        fs::copy(backend.path_for("rust-berlin-true"), backend.path_for("go-tokyo-false")).unwrap();
        assert_eq!(backend.load("go-tokyo-false").unwrap(), None);
        assert!(!backend.remove("go-tokyo-false").unwrap());
        assert_eq!(backend.load("rust-berlin-true").unwrap().as_deref(), Some("{}"));

        let store: NamedStore<KeywordCacheEntry> = NamedStore::new(KEYWORD_STORE, Arc::new(backend));
        assert!(store.get("go-tokyo-false").unwrap().is_none());
    }

    #[test]
    fn corrupt_documents_surface_as_errors() {
        let backend = Arc::new(MemoryBackend::new());
        backend.save("bad", "{not json").unwrap();
        let store: NamedStore<CacheEntry> = NamedStore::new(HYBRID_STORE, backend);
        assert!(store.get("bad").is_err());
    }
}
