//! Selection of the next announcement from a pool snapshot.
//!
//! Two modes: round-robin walks the snapshot in order with a persisted
//! cursor, random draws uniformly and keeps no state. The cursor is clamped
//! before every use because temporary expiry can shrink the pool between
//! ticks.

use rand::Rng;

use super::pool::PoolItem;

/// How the next announcement is chosen on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Walk the pool in order, wrapping at the end.
    RoundRobin,
    /// Uniform random draw over the current pool.
    Random,
}

/// Pick one item from the snapshot.
///
/// Returns the chosen item and the cursor value to carry into the next call,
/// or `None` when the pool is empty (callers skip emission silently). The
/// modulus floor of 1 keeps the advance well-defined on a one-element pool
/// that is about to shrink.
pub fn select(
    pool: &[PoolItem],
    mode: SelectionMode,
    cursor: usize,
) -> Option<(&PoolItem, usize)> {
    if pool.is_empty() {
        return None;
    }
    match mode {
        SelectionMode::Random => {
            let choice = rand::thread_rng().gen_range(0..pool.len());
            Some((&pool[choice], cursor))
        }
        SelectionMode::RoundRobin => {
            let current = if cursor >= pool.len() { 0 } else { cursor };
            let next = (current + 1) % pool.len().max(1);
            Some((&pool[current], next))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcer::store::Provenance;

    fn item(tag: &str) -> PoolItem {
        PoolItem {
            provenance: Provenance::Static,
            index: 0,
            id: None,
            lines: vec![tag.to_string()],
            enable_sound: false,
            sound_name: None,
            remaining_cycles: None,
        }
    }

    #[test]
    fn empty_pool_selects_nothing() {
        assert!(select(&[], SelectionMode::RoundRobin, 0).is_none());
        assert!(select(&[], SelectionMode::Random, 3).is_none());
    }

    #[test]
    fn round_robin_advances_and_wraps() {
        let pool = vec![item("a"), item("b"), item("c")];
        let (chosen, cursor) = select(&pool, SelectionMode::RoundRobin, 0).unwrap();
        assert_eq!(chosen.lines[0], "a");
        let (chosen, cursor) = select(&pool, SelectionMode::RoundRobin, cursor).unwrap();
        assert_eq!(chosen.lines[0], "b");
        let (chosen, cursor) = select(&pool, SelectionMode::RoundRobin, cursor).unwrap();
        assert_eq!(chosen.lines[0], "c");
        assert_eq!(cursor, 0);
    }

    #[test]
    fn cursor_beyond_pool_resets_to_front() {
        let pool = vec![item("a"), item("b")];
        let (chosen, cursor) = select(&pool, SelectionMode::RoundRobin, 7).unwrap();
        assert_eq!(chosen.lines[0], "a");
        assert_eq!(cursor, 1);
    }

    #[test]
    fn random_leaves_cursor_untouched() {
        let pool = vec![item("a"), item("b")];
        let (_, cursor) = select(&pool, SelectionMode::Random, 5).unwrap();
        assert_eq!(cursor, 5);
    }

    #[test]
    fn single_item_pool_keeps_cursor_at_zero() {
        let pool = vec![item("solo")];
        let (chosen, cursor) = select(&pool, SelectionMode::RoundRobin, 0).unwrap();
        assert_eq!(chosen.lines[0], "solo");
        assert_eq!(cursor, 0);
    }
}
