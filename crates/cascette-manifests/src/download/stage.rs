//! Stage-partitioned entry table
//!
//! Download entries are kept in two contiguous blocks, all stage 0 entries
//! before all stage 1 entries. The table tracks the exclusive end of each
//! block so an insertion finds its position without scanning.

use super::entry::{DownloadEntry, HIGH_PRIORITY_STAGE};
use crate::tag::{TagSet, TaggedTable};

/// Entry table with O(1) stage boundaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTable {
    table: TaggedTable<DownloadEntry>,
    /// Exclusive end of the stage 0 block and of the stage 1 block
    ends: [usize; 2],
}

impl StagedTable {
    /// Create an empty table with the given tags
    pub fn new(tags: TagSet) -> Self {
        Self {
            table: TaggedTable::new(tags),
            ends: [0, 0],
        }
    }

    /// Wrap a parsed table, locating the block ends once
    ///
    /// Each end is one past the last entry of that stage; the stage 1 end
    /// never precedes the stage 0 end.
    pub fn from_table(table: TaggedTable<DownloadEntry>) -> Self {
        let end_of = |stage: u8| {
            table
                .entries()
                .iter()
                .rposition(|entry| entry.stage == stage)
                .map_or(0, |index| index + 1)
        };
        let end0 = end_of(0);
        let end1 = end_of(1).max(end0);
        Self {
            table,
            ends: [end0, end1],
        }
    }

    /// Insert an entry at the end of its stage block
    ///
    /// Stage 0 entries go right after the last stage 0 entry, shifting every
    /// later entry and mask bit; all other stages go to the end of the
    /// stage 1 block. Returns the insertion index.
    pub fn insert(&mut self, entry: DownloadEntry) -> usize {
        let index = if entry.stage == HIGH_PRIORITY_STAGE {
            let index = self.ends[0];
            self.ends[0] += 1;
            self.ends[1] += 1;
            index
        } else {
            let index = self.ends[1];
            self.ends[1] += 1;
            index
        };
        self.table.insert(index, entry);
        index
    }

    /// Remove the entry at `index`
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> DownloadEntry {
        for end in &mut self.ends {
            if *end > index {
                *end -= 1;
            }
        }
        self.table.remove(index)
    }

    /// Exclusive ends of the stage 0 and stage 1 blocks
    pub fn boundaries(&self) -> (usize, usize) {
        (self.ends[0], self.ends[1])
    }

    /// Underlying entry/tag table
    pub fn table(&self) -> &TaggedTable<DownloadEntry> {
        &self.table
    }

    /// Mutable tag access; entries cannot be added or removed through it
    pub fn tags_mut(&mut self) -> &mut TagSet {
        self.table.tags_mut()
    }

    /// Split into entries and tags for a one-shot write
    pub fn into_parts(self) -> (Vec<DownloadEntry>, TagSet) {
        self.table.into_parts()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::entry::NORMAL_STAGE;
    use crate::hash::ContentHash;
    use proptest::prelude::*;

    fn entry(seed: u32, stage: u8) -> DownloadEntry {
        DownloadEntry::new(ContentHash::from_data(&seed.to_be_bytes()), 10, stage)
            .expect("entry")
    }

    fn stages(table: &StagedTable) -> Vec<u8> {
        table.table().entries().iter().map(|e| e.stage).collect()
    }

    #[test]
    fn test_high_priority_inserted_before_normal() {
        let mut table = StagedTable::new(TagSet::catalog(false));
        assert_eq!(table.insert(entry(1, NORMAL_STAGE)), 0);
        assert_eq!(table.insert(entry(2, NORMAL_STAGE)), 1);
        assert_eq!(table.insert(entry(3, HIGH_PRIORITY_STAGE)), 0);
        assert_eq!(table.insert(entry(4, HIGH_PRIORITY_STAGE)), 1);

        assert_eq!(stages(&table), vec![0, 0, 1, 1]);
        assert_eq!(table.boundaries(), (2, 4));
    }

    #[test]
    fn test_remove_adjusts_boundaries() {
        let mut table = StagedTable::new(TagSet::catalog(false));
        table.insert(entry(1, HIGH_PRIORITY_STAGE));
        table.insert(entry(2, NORMAL_STAGE));
        table.insert(entry(3, NORMAL_STAGE));

        table.remove(0);
        assert_eq!(table.boundaries(), (0, 2));
        table.insert(entry(4, HIGH_PRIORITY_STAGE));
        assert_eq!(stages(&table), vec![0, 1, 1]);

        table.remove(2);
        assert_eq!(table.boundaries(), (1, 2));
    }

    #[test]
    fn test_from_table_boundaries() {
        let mut parsed = TaggedTable::new(TagSet::new());
        for (seed, stage) in [(1, 0), (2, 0), (3, 1), (4, 2)] {
            parsed.push(entry(seed, stage));
        }
        let table = StagedTable::from_table(parsed);
        assert_eq!(table.boundaries(), (2, 3));

        let mut only_normal = TaggedTable::new(TagSet::new());
        only_normal.push(entry(1, 1));
        assert_eq!(StagedTable::from_table(only_normal).boundaries(), (0, 1));
    }

    proptest! {
        #[test]
        fn inserts_keep_stages_sorted(priorities in prop::collection::vec(any::<bool>(), 0..64)) {
            let mut table = StagedTable::new(TagSet::catalog(true));
            for (seed, high) in priorities.iter().enumerate() {
                let stage = if *high { HIGH_PRIORITY_STAGE } else { NORMAL_STAGE };
                table.insert(entry(seed as u32, stage));
            }

            let stages = stages(&table);
            prop_assert!(stages.windows(2).all(|pair| pair[0] <= pair[1]));
            let high = priorities.iter().filter(|high| **high).count();
            prop_assert_eq!(table.boundaries(), (high, priorities.len()));
            for tag in table.table().tags() {
                prop_assert_eq!(tag.mask().len(), priorities.len());
            }
        }
    }
}
