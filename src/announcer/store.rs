//! Persisted message store for runtime-added announcements.
//!
//! Two independent sub-stores live here: the permanent list
//! (`runtime_announcements.json`) and the temporary list
//! (`temp_announcements.json`). Each is a small field-keyed JSON document with
//! a schema version, so a future format change can migrate record-by-record
//! instead of guessing at positional data.
//!
//! Loading is lenient per record: a malformed entry (missing lines, spent
//! cycle count) is dropped with a warning while the rest of the file loads.
//! A single corrupt record must not empty the whole pool.
//!
//! Every mutating operation writes its sub-store back to disk before
//! returning. A failed save is reported to the caller but the in-memory
//! change stands; the next successful save rewrites the full document.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::errors::AnnounceError;

const PERMANENT_FILE: &str = "runtime_announcements.json";
const TEMPORARY_FILE: &str = "temp_announcements.json";
const SCHEMA_VERSION: u32 = 1;

/// Which source an announcement entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Read-only entry from the config file.
    Static,
    /// Runtime-added entry that lives until deleted.
    Permanent,
    /// Runtime-added entry with a finite number of emissions left.
    Temporary,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Static => write!(f, "static"),
            Provenance::Permanent => write!(f, "permanent"),
            Provenance::Temporary => write!(f, "temporary"),
        }
    }
}

/// A runtime-added announcement that stays in the pool until deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermanentEntry {
    /// In-memory routing handle, assigned on load/insert. Never persisted;
    /// positional indices on disk are enough since whole documents are
    /// rewritten atomically.
    #[serde(skip)]
    pub id: u64,
    pub lines: Vec<String>,
    #[serde(default = "default_true")]
    pub enable_sound: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_name: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A runtime-added announcement that expires after `remaining_cycles`
/// emissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporaryEntry {
    #[serde(skip)]
    pub id: u64,
    pub lines: Vec<String>,
    pub remaining_cycles: u32,
    #[serde(default = "default_true")]
    pub enable_sound: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_name: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct PermanentDoc {
    version: u32,
    #[serde(default)]
    runtime: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TemporaryDoc {
    version: u32,
    #[serde(default)]
    temporary: Vec<serde_json::Value>,
}

/// Authoritative mutable state for runtime-added announcements.
///
/// Entries are addressed positionally at the API boundary (that is what a
/// management surface shows its user), but each loaded entry also carries a
/// monotonic in-memory ID. Selection captures the ID, so a concurrent delete
/// between snapshot and expiry bookkeeping turns the bookkeeping into a no-op
/// instead of hitting the wrong entry.
pub struct MessageStore {
    data_dir: PathBuf,
    permanent: Vec<PermanentEntry>,
    temporary: Vec<TemporaryEntry>,
    next_id: u64,
}

impl MessageStore {
    /// Create an empty store rooted at `data_dir`. Nothing is read or written.
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            permanent: Vec::new(),
            temporary: Vec::new(),
            next_id: 1,
        }
    }

    /// Load both sub-stores from `data_dir`. Missing files mean empty lists;
    /// individually malformed records are dropped with a warning.
    pub fn load<P: Into<PathBuf>>(data_dir: P) -> Result<Self, AnnounceError> {
        let mut store = Self::new(data_dir);

        if let Some(doc) = read_doc::<PermanentDoc>(&store.data_dir.join(PERMANENT_FILE))? {
            if doc.version != SCHEMA_VERSION {
                warn!(
                    "Permanent announcement file has schema version {}, expected {}; \
                     loading records best-effort",
                    doc.version, SCHEMA_VERSION
                );
            }
            for value in doc.runtime {
                match serde_json::from_value::<PermanentEntry>(value) {
                    Ok(entry) if has_content(&entry.lines) => {
                        let id = store.take_id();
                        store.permanent.push(PermanentEntry { id, ..entry });
                    }
                    Ok(_) => warn!("Dropping permanent announcement with no usable lines"),
                    Err(e) => warn!("Dropping malformed permanent announcement record: {}", e),
                }
            }
        }

        if let Some(doc) = read_doc::<TemporaryDoc>(&store.data_dir.join(TEMPORARY_FILE))? {
            if doc.version != SCHEMA_VERSION {
                warn!(
                    "Temporary announcement file has schema version {}, expected {}; \
                     loading records best-effort",
                    doc.version, SCHEMA_VERSION
                );
            }
            for value in doc.temporary {
                match serde_json::from_value::<TemporaryEntry>(value) {
                    Ok(entry) if has_content(&entry.lines) && entry.remaining_cycles >= 1 => {
                        let id = store.take_id();
                        store.temporary.push(TemporaryEntry { id, ..entry });
                    }
                    Ok(_) => warn!("Dropping temporary announcement with no lines or spent cycles"),
                    Err(e) => warn!("Dropping malformed temporary announcement record: {}", e),
                }
            }
        }

        debug!(
            "Loaded {} permanent and {} temporary announcements from {}",
            store.permanent.len(),
            store.temporary.len(),
            store.data_dir.display()
        );
        Ok(store)
    }

    pub fn permanent(&self) -> &[PermanentEntry] {
        &self.permanent
    }

    pub fn temporary(&self) -> &[TemporaryEntry] {
        &self.temporary
    }

    /// Append a permanent announcement and persist. Returns the new index.
    pub fn add_permanent(
        &mut self,
        lines: Vec<String>,
        enable_sound: bool,
        sound_name: Option<String>,
    ) -> Result<usize, AnnounceError> {
        validate_lines(&lines)?;
        let entry = PermanentEntry {
            id: self.take_id(),
            lines,
            enable_sound,
            sound_name,
            created_at: Utc::now(),
        };
        self.permanent.push(entry);
        self.save_permanent()?;
        Ok(self.permanent.len() - 1)
    }

    /// Append a temporary announcement and persist. `cycles` below 1 is
    /// clamped to 1, never rejected. Returns the new index.
    pub fn add_temporary(
        &mut self,
        lines: Vec<String>,
        cycles: i64,
        enable_sound: bool,
        sound_name: Option<String>,
    ) -> Result<usize, AnnounceError> {
        validate_lines(&lines)?;
        let entry = TemporaryEntry {
            id: self.take_id(),
            lines,
            remaining_cycles: cycles.clamp(1, u32::MAX as i64) as u32,
            enable_sound,
            sound_name,
            created_at: Utc::now(),
        };
        self.temporary.push(entry);
        self.save_temporary()?;
        Ok(self.temporary.len() - 1)
    }

    /// Replace the fields of the entry at `index` in the given sub-store and
    /// persist. Static entries are read-only.
    pub fn edit(
        &mut self,
        provenance: Provenance,
        index: usize,
        lines: Vec<String>,
        enable_sound: bool,
        sound_name: Option<String>,
    ) -> Result<(), AnnounceError> {
        validate_lines(&lines)?;
        match provenance {
            Provenance::Static => Err(AnnounceError::Validation(
                "static announcements are read-only; edit the config file".into(),
            )),
            Provenance::Permanent => {
                let len = self.permanent.len();
                let entry = self.permanent.get_mut(index).ok_or(
                    AnnounceError::IndexNotFound {
                        provenance,
                        index,
                        len,
                    },
                )?;
                entry.lines = lines;
                entry.enable_sound = enable_sound;
                entry.sound_name = sound_name;
                self.save_permanent()
            }
            Provenance::Temporary => {
                let len = self.temporary.len();
                let entry = self.temporary.get_mut(index).ok_or(
                    AnnounceError::IndexNotFound {
                        provenance,
                        index,
                        len,
                    },
                )?;
                entry.lines = lines;
                entry.enable_sound = enable_sound;
                entry.sound_name = sound_name;
                self.save_temporary()
            }
        }
    }

    /// Remove the entry at `index` from the given sub-store, compact the
    /// list, and persist. Static entries are read-only.
    pub fn delete(&mut self, provenance: Provenance, index: usize) -> Result<(), AnnounceError> {
        match provenance {
            Provenance::Static => Err(AnnounceError::Validation(
                "static announcements are read-only; edit the config file".into(),
            )),
            Provenance::Permanent => {
                if index >= self.permanent.len() {
                    return Err(AnnounceError::IndexNotFound {
                        provenance,
                        index,
                        len: self.permanent.len(),
                    });
                }
                self.permanent.remove(index);
                self.save_permanent()
            }
            Provenance::Temporary => {
                if index >= self.temporary.len() {
                    return Err(AnnounceError::IndexNotFound {
                        provenance,
                        index,
                        len: self.temporary.len(),
                    });
                }
                self.temporary.remove(index);
                self.save_temporary()
            }
        }
    }

    /// Decrement the remaining cycles of the temporary entry with the given
    /// ID, removing it when the count reaches zero, then persist.
    ///
    /// Returns the remaining cycle count (`Some(0)` means the entry was just
    /// removed), or `None` when no entry carries the ID anymore — the entry
    /// was deleted between snapshot and bookkeeping, which is not an error.
    pub fn decrement_temporary(&mut self, id: u64) -> Result<Option<u32>, AnnounceError> {
        let Some(pos) = self.temporary.iter().position(|e| e.id == id) else {
            debug!("Temporary announcement {} vanished before decrement", id);
            return Ok(None);
        };
        self.temporary[pos].remaining_cycles -= 1;
        let remaining = self.temporary[pos].remaining_cycles;
        if remaining == 0 {
            self.temporary.remove(pos);
        }
        self.save_temporary()?;
        Ok(Some(remaining))
    }

    /// Persist the permanent list.
    pub fn save_permanent(&self) -> Result<(), AnnounceError> {
        let doc = serde_json::json!({
            "version": SCHEMA_VERSION,
            "runtime": self.permanent,
        });
        let content = serde_json::to_string_pretty(&doc)?;
        write_file_locked(&self.data_dir.join(PERMANENT_FILE), &content)
    }

    /// Persist the temporary list.
    pub fn save_temporary(&self) -> Result<(), AnnounceError> {
        let doc = serde_json::json!({
            "version": SCHEMA_VERSION,
            "temporary": self.temporary,
        });
        let content = serde_json::to_string_pretty(&doc)?;
        write_file_locked(&self.data_dir.join(TEMPORARY_FILE), &content)
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn validate_lines(lines: &[String]) -> Result<(), AnnounceError> {
    if !has_content(lines) {
        return Err(AnnounceError::Validation(
            "an announcement needs at least one non-empty line".into(),
        ));
    }
    Ok(())
}

fn has_content(lines: &[String]) -> bool {
    lines.iter().any(|l| !l.trim().is_empty())
}

/// Read and parse a state document, treating a missing file as absent.
fn read_doc<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, AnnounceError> {
    match std::fs::read_to_string(path) {
        Ok(data) => {
            // Guard against any accidental leading NULs
            let cleaned = data.trim_start_matches('\0');
            match serde_json::from_str::<T>(cleaned) {
                Ok(doc) => Ok(Some(doc)),
                Err(e) => {
                    warn!(
                        "State file {} is unreadable ({}); starting that list empty",
                        path.display(),
                        e
                    );
                    Ok(None)
                }
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AnnounceError::Io(e)),
    }
}

/// Write content to a file under an exclusive lock, via a temp file and
/// atomic rename, so readers never observe a half-written document.
fn write_file_locked(path: &Path, content: &str) -> Result<(), AnnounceError> {
    use std::fs::{self, File, OpenOptions};
    use std::io::Write;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Open (or create) the destination to hold the exclusive lock for the
    // whole replace sequence.
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("state.json");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                tmp.write_all(content.as_bytes())?;
                tmp.flush()?;
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
                continue;
            }
            Err(e) => return Err(AnnounceError::Io(e)),
        }
    };

    fs::rename(&tmp_path, path)?;

    // Fsync the directory to persist the rename (best-effort)
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }

    drop(lock_file);
    Ok(())
}
