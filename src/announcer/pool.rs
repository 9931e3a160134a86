//! Flattened read-only view of every announcement source.
//!
//! The pool is a projection, never a cache: membership and indices change
//! whenever a temporary entry expires, so every selection pass asks for a
//! fresh snapshot. Ordering is stable within a snapshot: static catalog
//! first, then permanent, then temporary, each in source order.

use crate::config::StaticAnnouncement;

use super::store::{MessageStore, Provenance};

/// Global fallbacks applied when an entry does not carry its own sound
/// settings.
#[derive(Debug, Clone)]
pub struct SoundDefaults {
    pub enable_sound: bool,
    pub sound_name: Option<String>,
}

/// One eligible announcement, tagged with enough routing information to send
/// post-selection bookkeeping back to the right sub-store.
#[derive(Debug, Clone)]
pub struct PoolItem {
    pub provenance: Provenance,
    /// Positional index within the source sub-store at snapshot time.
    pub index: usize,
    /// Stable in-memory ID for store-backed entries; `None` for static ones.
    pub id: Option<u64>,
    pub lines: Vec<String>,
    pub enable_sound: bool,
    pub sound_name: Option<String>,
    /// Emissions left before removal; only set for temporary entries.
    pub remaining_cycles: Option<u32>,
}

/// Build a fresh flattened view of all currently eligible announcements.
///
/// Static entries with no usable lines are skipped rather than emitted
/// blank. An empty result means "nothing to announce" and is not an error.
pub fn snapshot(
    catalog: &[StaticAnnouncement],
    store: &MessageStore,
    defaults: &SoundDefaults,
) -> Vec<PoolItem> {
    let mut items = Vec::with_capacity(
        catalog.len() + store.permanent().len() + store.temporary().len(),
    );

    for (index, entry) in catalog.iter().enumerate() {
        if entry.lines.iter().all(|l| l.trim().is_empty()) {
            continue;
        }
        items.push(PoolItem {
            provenance: Provenance::Static,
            index,
            id: None,
            lines: entry.lines.clone(),
            enable_sound: defaults.enable_sound,
            sound_name: entry.sound.clone().or_else(|| defaults.sound_name.clone()),
            remaining_cycles: None,
        });
    }

    for (index, entry) in store.permanent().iter().enumerate() {
        items.push(PoolItem {
            provenance: Provenance::Permanent,
            index,
            id: Some(entry.id),
            lines: entry.lines.clone(),
            enable_sound: entry.enable_sound,
            sound_name: entry
                .sound_name
                .clone()
                .or_else(|| defaults.sound_name.clone()),
            remaining_cycles: None,
        });
    }

    for (index, entry) in store.temporary().iter().enumerate() {
        items.push(PoolItem {
            provenance: Provenance::Temporary,
            index,
            id: Some(entry.id),
            lines: entry.lines.clone(),
            enable_sound: entry.enable_sound,
            sound_name: entry
                .sound_name
                .clone()
                .or_else(|| defaults.sound_name.clone()),
            remaining_cycles: Some(entry.remaining_cycles),
        });
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> SoundDefaults {
        SoundDefaults {
            enable_sound: true,
            sound_name: Some("bell".to_string()),
        }
    }

    fn static_entry(lines: &[&str], sound: Option<&str>) -> StaticAnnouncement {
        StaticAnnouncement {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            sound: sound.map(|s| s.to_string()),
        }
    }

    #[test]
    fn merge_order_is_static_then_permanent_then_temporary() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = MessageStore::new(dir.path());
        store
            .add_permanent(vec!["perm".into()], true, None)
            .unwrap();
        store
            .add_temporary(vec!["temp".into()], 2, true, None)
            .unwrap();

        let catalog = vec![static_entry(&["stat"], None)];
        let pool = snapshot(&catalog, &store, &defaults());
        let provenances: Vec<_> = pool.iter().map(|i| i.provenance).collect();
        assert_eq!(
            provenances,
            vec![Provenance::Static, Provenance::Permanent, Provenance::Temporary]
        );
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn blank_static_entries_are_skipped() {
        let dir = TempDir::new().expect("tempdir");
        let store = MessageStore::new(dir.path());
        let catalog = vec![
            static_entry(&["visible"], None),
            static_entry(&["", "   "], None),
        ];
        let pool = snapshot(&catalog, &store, &defaults());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].lines[0], "visible");
    }

    #[test]
    fn sound_falls_back_to_global_default() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = MessageStore::new(dir.path());
        store
            .add_permanent(vec!["quiet".into()], true, None)
            .unwrap();
        store
            .add_permanent(vec!["custom".into()], true, Some("horn".into()))
            .unwrap();

        let catalog = vec![
            static_entry(&["plain"], None),
            static_entry(&["override"], Some("chime")),
        ];
        let pool = snapshot(&catalog, &store, &defaults());
        assert_eq!(pool[0].sound_name.as_deref(), Some("bell"));
        assert_eq!(pool[1].sound_name.as_deref(), Some("chime"));
        assert_eq!(pool[2].sound_name.as_deref(), Some("bell"));
        assert_eq!(pool[3].sound_name.as_deref(), Some("horn"));
    }

    #[test]
    fn empty_sources_produce_empty_snapshot() {
        let dir = TempDir::new().expect("tempdir");
        let store = MessageStore::new(dir.path());
        assert!(snapshot(&[], &store, &defaults()).is_empty());
    }
}
