//! Hand-maintained episode counts
//!
//! Long-running shows whose live metadata is stale or impractical to page
//! through. Consulted once, before any network call.

use std::collections::BTreeMap;

/// Built-in corrections, keyed by MyAnimeList id
const BUILTIN_OVERRIDES: &[(u64, u32)] = &[
    (21, 1100), // One Piece
    (1535, 37), // Death Note
    (20, 720),  // Naruto (with Shippuden)
];

/// Immutable id -> episode count table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: BTreeMap<u64, u32>,
}

impl OverrideTable {
    /// Empty table (no overrides at all)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table with the built-in corrections
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_OVERRIDES.iter().copied().collect(),
        }
    }

    /// Add entries, replacing existing ones with the same id
    pub fn extend(mut self, entries: impl IntoIterator<Item = (u64, u32)>) -> Self {
        self.entries.extend(entries);
        self
    }

    pub fn get(&self, id: u64) -> Option<u32> {
        self.entries.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.entries.iter().map(|(&id, &count)| (id, count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let table = OverrideTable::builtin();
        assert_eq!(table.get(21), Some(1100));
        assert_eq!(table.get(1535), Some(37));
        assert_eq!(table.get(20), Some(720));
        assert_eq!(table.get(52991), None);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_extend_replaces() {
        let table = OverrideTable::builtin().extend([(21, 1120), (99, 12)]);
        assert_eq!(table.get(21), Some(1120));
        assert_eq!(table.get(99), Some(12));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_iter_is_sorted_by_id() {
        let ids: Vec<u64> = OverrideTable::builtin().iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![20, 21, 1535]);
    }
}
