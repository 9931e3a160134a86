//! # Announcer Core - Pool Management and Rotation Engine
//!
//! This module owns the announcement pool and everything that mutates it:
//! the persisted [`store::MessageStore`], the static catalog loaded from
//! configuration, the rotation cursor, and the per-tick selection pass.
//!
//! One [`Announcer`] instance is the single logical owner of all of that
//! state. The scheduler loop and any management surface share it behind one
//! lock (see [`crate::service`]), so a snapshot-then-mutate selection pass
//! can never interleave with an edit or delete that would invalidate a
//! positional index.
//!
//! Data flow per tick:
//!
//! ```text
//! tick() → pool::snapshot() → selector::select() → expiry bookkeeping
//!        → resolved Announcement → caller hands it to a Dispatcher
//! ```

pub mod errors;
pub mod pool;
pub mod selector;
pub mod store;

use log::{debug, info, warn};

use crate::config::{Config, StaticAnnouncement};

pub use errors::AnnounceError;
pub use pool::{PoolItem, SoundDefaults};
pub use selector::SelectionMode;
pub use store::{MessageStore, Provenance};

/// One fully resolved broadcast, immutable once constructed.
///
/// `sound` is already gated: it is `None` whenever the chosen entry had
/// sound disabled, regardless of any configured sound name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub lines: Vec<String>,
    pub sound: Option<String>,
}

/// Pool manager and selection engine.
pub struct Announcer {
    catalog: Vec<StaticAnnouncement>,
    store: MessageStore,
    defaults: SoundDefaults,
    mode: SelectionMode,
    cursor: usize,
}

impl Announcer {
    /// Build an announcer from loaded configuration and a loaded store.
    pub fn new(config: &Config, store: MessageStore) -> Self {
        let mode = if config.settings.random {
            SelectionMode::Random
        } else {
            SelectionMode::RoundRobin
        };
        info!(
            "Announcer ready: {} static, {} permanent, {} temporary announcements ({:?} mode)",
            config.announcements.len(),
            store.permanent().len(),
            store.temporary().len(),
            mode
        );
        Self {
            catalog: config.announcements.clone(),
            store,
            defaults: SoundDefaults {
                enable_sound: config.settings.enable_sound,
                sound_name: config.settings.sound.clone(),
            },
            mode,
            cursor: 0,
        }
    }

    /// Current selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Fresh flattened view of every eligible announcement. Recomputed on
    /// each call; indices are only valid until the next mutation.
    pub fn snapshot(&self) -> Vec<PoolItem> {
        pool::snapshot(&self.catalog, &self.store, &self.defaults)
    }

    /// Run one selection pass and return the announcement to emit, if any.
    ///
    /// An empty pool yields `None` and no side effects. Selecting a
    /// temporary entry decrements its remaining cycles (removing it at
    /// zero) and persists the temporary store before this returns. A failed
    /// persistence write is logged and left for the next save to repair;
    /// the in-memory decrement stands either way.
    pub fn tick(&mut self) -> Option<Announcement> {
        let pool = self.snapshot();
        let (chosen, next_cursor) = match selector::select(&pool, self.mode, self.cursor) {
            Some(picked) => picked,
            None => {
                debug!("Announcement pool is empty; skipping tick");
                return None;
            }
        };
        self.cursor = next_cursor;
        let chosen = chosen.clone();

        if chosen.provenance == Provenance::Temporary {
            if let Some(id) = chosen.id {
                match self.store.decrement_temporary(id) {
                    Ok(Some(0)) => debug!("Temporary announcement expired and was removed"),
                    Ok(Some(left)) => debug!("Temporary announcement has {} cycles left", left),
                    Ok(None) => {}
                    Err(e) => warn!(
                        "Failed to persist temporary announcements after decrement: {}",
                        e
                    ),
                }
            }
        }

        let sound = if chosen.enable_sound {
            chosen.sound_name
        } else {
            None
        };
        Some(Announcement {
            lines: chosen.lines,
            sound,
        })
    }

    /// Add a permanent announcement. Returns its index in the permanent list.
    pub fn add_permanent(
        &mut self,
        lines: Vec<String>,
        enable_sound: bool,
        sound_name: Option<String>,
    ) -> Result<usize, AnnounceError> {
        self.store.add_permanent(lines, enable_sound, sound_name)
    }

    /// Add a temporary announcement with a finite cycle count (clamped to at
    /// least 1). Returns its index in the temporary list.
    pub fn add_temporary(
        &mut self,
        lines: Vec<String>,
        cycles: i64,
        enable_sound: bool,
        sound_name: Option<String>,
    ) -> Result<usize, AnnounceError> {
        self.store
            .add_temporary(lines, cycles, enable_sound, sound_name)
    }

    /// Replace a stored announcement in place.
    pub fn edit(
        &mut self,
        provenance: Provenance,
        index: usize,
        lines: Vec<String>,
        enable_sound: bool,
        sound_name: Option<String>,
    ) -> Result<(), AnnounceError> {
        self.store
            .edit(provenance, index, lines, enable_sound, sound_name)
    }

    /// Delete a stored announcement; following indices compact down.
    pub fn delete(&mut self, provenance: Provenance, index: usize) -> Result<(), AnnounceError> {
        self.store.delete(provenance, index)
    }

    /// Direct access to the backing store (status reporting, tests).
    pub fn store(&self) -> &MessageStore {
        &self.store
    }
}
