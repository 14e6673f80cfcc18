//! Tablix page counters
//!
//! Paging state is not kept by the renderer. The caller sends back the
//! metadata entries of the previous response, optionally with a navigation
//! request, and receives the updated entries. Pages are 1-based and never
//! drop below 1. A table without an entry is on page 1.

use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::request::{Direction, Navigate};

/// Metadata key for Tablix page counters
pub const TABLIX_PAGE_KEY: &str = "key_tablixpage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    pub key: String,
    pub object_name: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn page(table: impl Into<String>, page: usize) -> Self {
        Self {
            key: TABLIX_PAGE_KEY.to_string(),
            object_name: table.into(),
            value: page.to_string(),
        }
    }

    fn is_page_of(&self, table: &str) -> bool {
        self.key == TABLIX_PAGE_KEY && self.object_name.eq_ignore_ascii_case(table)
    }
}

/// Page counters of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    entries: Vec<MetadataEntry>,
}

impl PageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<MetadataEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<MetadataEntry> {
        self.entries
    }

    /// Current page of `table`; unparseable or zero counters read as 1
    pub fn page(&self, table: &str) -> usize {
        self.entries
            .iter()
            .find(|e| e.is_page_of(table))
            .and_then(|e| e.value.trim().parse::<usize>().ok())
            .map_or(1, |page| page.max(1))
    }

    pub fn set_page(&mut self, table: &str, page: usize) {
        let page = page.max(1);
        match self.entries.iter_mut().find(|e| e.is_page_of(table)) {
            Some(entry) => entry.value = page.to_string(),
            None => self.entries.push(MetadataEntry::page(table, page)),
        }
    }

    /// Apply a navigation request and return the new page
    pub fn navigate(&mut self, navigate: &Navigate) -> usize {
        let current = self.page(&navigate.table);
        let page = match navigate.direction {
            Direction::Next => current.saturating_add(1),
            Direction::Prev => current.saturating_sub(1).max(1),
        };
        debug!(
            "Tablix '{}' page {} -> {}",
            navigate.table, current, page
        );
        self.set_page(&navigate.table, page);
        page
    }
}

/// Row window shown for `page`, clamped to the last non-empty page
pub fn page_window(row_count: usize, page: usize, page_size: usize) -> Range<usize> {
    if page_size == 0 || row_count == 0 {
        return 0..row_count;
    }
    let last_page = row_count.div_ceil(page_size);
    let page = page.clamp(1, last_page);
    let start = (page - 1) * page_size;
    start..(start + page_size).min(row_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_next_on_new_table_stores_two() {
        let mut pages = PageMetadata::new();
        assert_eq!(pages.navigate(&Navigate::next("T1")), 2);
        assert_eq!(pages.entries(), &[MetadataEntry::page("T1", 2)]);
    }

    #[test]
    fn test_prev_floors_at_one() {
        let mut pages = PageMetadata::new();
        assert_eq!(pages.navigate(&Navigate::prev("T1")), 1);
        assert_eq!(pages.page("T1"), 1);
    }

    #[test]
    fn test_tables_are_independent() {
        let mut pages = PageMetadata::from_entries(vec![MetadataEntry::page("A", 4)]);
        pages.navigate(&Navigate::next("B"));
        pages.navigate(&Navigate::prev("a"));
        assert_eq!(pages.page("A"), 3);
        assert_eq!(pages.page("B"), 2);
        assert_eq!(pages.entries().len(), 2);
    }

    #[rstest]
    #[case(10, 1, 4, 0..4)]
    #[case(10, 3, 4, 8..10)]
    #[case(10, 9, 4, 8..10)]
    #[case(0, 2, 4, 0..0)]
    #[case(5, 2, 0, 0..5)]
    fn test_page_window(
        #[case] rows: usize,
        #[case] page: usize,
        #[case] size: usize,
        #[case] expected: Range<usize>,
    ) {
        assert_eq!(page_window(rows, page, size), expected);
    }
}
