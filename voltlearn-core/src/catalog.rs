//! Course catalog mapping legacy lesson identifiers to hosted playback ids.
//!
//! The training content was originally published under a numbering scheme of
//! short "unit-lesson" keys ("1-1", "2-3", ...). After migrating to a hosted
//! video provider, each lesson resolves to an opaque playback identifier
//! consumed by the provider's player. The tables below are the compiled-in
//! migration record: one table for the basic curriculum, one for the advanced
//! curriculum, with basic taking precedence on lookup.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Basic curriculum: units 1-4, five lessons each.
static BASIC_LESSONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("1-1", "812034551"),
        ("1-2", "812034607"),
        ("1-3", "812034688"),
        ("1-4", "812034742"),
        ("1-5", "812034815"),
        ("2-1", "812035099"),
        ("2-2", "812035164"),
        ("2-3", "812035230"),
        ("2-4", "812035287"),
        ("2-5", "812035341"),
        ("3-1", "812035580"),
        ("3-2", "812035652"),
        ("3-3", "812035719"),
        ("3-4", "812035766"),
        ("3-5", "812035838"),
        ("4-1", "812036021"),
        ("4-2", "812036099"),
        ("4-3", "812036158"),
        ("4-4", "812036214"),
        ("4-5", "812036277"),
    ])
});

/// Advanced curriculum: unit 5, seven lessons.
static ADVANCED_LESSONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("5-1", "812037410"),
        ("5-2", "812037468"),
        ("5-3", "812037529"),
        ("5-4", "812037586"),
        ("5-5", "812037633"),
        ("5-6", "812037701"),
        ("5-7", "812037764"),
    ])
});

/// Cardinalities of the catalog tables, for diagnostics and status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCounts {
    /// Number of basic-curriculum lessons.
    pub basic: usize,
    /// Number of advanced-curriculum lessons.
    pub advanced: usize,
    /// Total lessons across both tables.
    pub total: usize,
}

/// Read-only view over the two lesson tables.
///
/// Safe for concurrent readers without synchronization; the underlying tables
/// are process-wide constants built on first access and never mutated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog;

impl Catalog {
    pub fn new() -> Self {
        Self
    }

    /// Resolves a legacy lesson id to its hosted playback id.
    ///
    /// The basic table is checked first, then the advanced table. Returns
    /// `None` when the id appears in neither. Pure lookup, no side effects.
    pub fn lookup(&self, lesson_id: &str) -> Option<&'static str> {
        BASIC_LESSONS
            .get(lesson_id)
            .or_else(|| ADVANCED_LESSONS.get(lesson_id))
            .copied()
    }

    /// Returns whether the lesson id exists in either table.
    pub fn is_known(&self, lesson_id: &str) -> bool {
        self.lookup(lesson_id).is_some()
    }

    /// Reports per-table and total lesson counts.
    pub fn counts(&self) -> CatalogCounts {
        let basic = BASIC_LESSONS.len();
        let advanced = ADVANCED_LESSONS.len();
        CatalogCounts {
            basic,
            advanced,
            total: basic + advanced,
        }
    }

    /// Lesson ids present in both tables, where basic precedence would shadow
    /// the advanced entry.
    ///
    /// The shipped tables are disjoint; this exists to validate future data
    /// drops before they land.
    pub fn overlapping_ids(&self) -> Vec<&'static str> {
        let mut overlap: Vec<&'static str> = BASIC_LESSONS
            .keys()
            .filter(|id| ADVANCED_LESSONS.contains_key(*id))
            .copied()
            .collect();
        overlap.sort_unstable();
        overlap
    }

    /// All known lesson ids with their playback ids, basic table first,
    /// sorted within each table for stable display.
    pub fn entries(&self) -> Vec<(&'static str, &'static str)> {
        let mut basic: Vec<_> = BASIC_LESSONS.iter().map(|(k, v)| (*k, *v)).collect();
        basic.sort_unstable();
        let mut advanced: Vec<_> = ADVANCED_LESSONS.iter().map(|(k, v)| (*k, *v)).collect();
        advanced.sort_unstable();
        basic.extend(advanced);
        basic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_lookup() {
        let catalog = Catalog::new();
        assert_eq!(catalog.lookup("1-1"), Some("812034551"));
        assert_eq!(catalog.lookup("4-5"), Some("812036277"));
    }

    #[test]
    fn test_advanced_lookup() {
        let catalog = Catalog::new();
        assert_eq!(catalog.lookup("5-1"), Some("812037410"));
        assert_eq!(catalog.lookup("5-7"), Some("812037764"));
    }

    #[test]
    fn test_unknown_lookup() {
        let catalog = Catalog::new();
        assert_eq!(catalog.lookup("1-8"), None);
        assert_eq!(catalog.lookup("6-1"), None);
        assert_eq!(catalog.lookup(""), None);
    }

    #[test]
    fn test_is_known_matches_lookup() {
        let catalog = Catalog::new();
        for id in ["1-1", "3-4", "5-6", "1-8", "0-0", "garbage"] {
            assert_eq!(catalog.is_known(id), catalog.lookup(id).is_some());
        }
    }

    #[test]
    fn test_counts() {
        let counts = Catalog::new().counts();
        assert_eq!(counts.basic, 20);
        assert_eq!(counts.advanced, 7);
        assert_eq!(counts.total, 27);
        assert_eq!(counts.total, counts.basic + counts.advanced);
    }

    #[test]
    fn test_tables_are_disjoint() {
        assert!(Catalog::new().overlapping_ids().is_empty());
    }

    #[test]
    fn test_entries_cover_both_tables() {
        let catalog = Catalog::new();
        let entries = catalog.entries();
        assert_eq!(entries.len(), catalog.counts().total);
        // Basic table listed first.
        assert_eq!(entries[0].0, "1-1");
        assert_eq!(entries[20].0, "5-1");
    }
}
