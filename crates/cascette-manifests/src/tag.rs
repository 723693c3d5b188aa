//! Manifest tags and the tag-set mutation protocol
//!
//! Every tag carries one bit per manifest entry. [`TaggedTable`] owns both the
//! entry list and the [`TagSet`], and is the only way to insert or remove
//! entries, so each entry mutation reaches every tag's mask in the same call
//! and `mask.len() == entries.len()` holds for every tag at all times.

use crate::binary::{ManifestReader, ManifestWriter};
use crate::bitmask::PackedBitMask;
use crate::error::Result;

/// Tag categories used by the build tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    /// Operating system (OSX, Windows)
    Platform,
    /// CPU architecture (x86_64, x86_32)
    Architecture,
    /// Locale (enUS, frFR, ...)
    Locale,
    /// Region (EU, US, ...)
    Region,
    /// Content category (speech, text)
    Category,
    /// Alternate content; reserved, never set by normal insertion
    Alternate,
    /// Any other category value found in a parsed manifest
    Other(u16),
}

impl TagType {
    /// Convert from the wire value
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::Platform,
            2 => Self::Architecture,
            3 => Self::Locale,
            4 => Self::Region,
            5 => Self::Category,
            0x4000 => Self::Alternate,
            other => Self::Other(other),
        }
    }

    /// Wire value
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Platform => 1,
            Self::Architecture => 2,
            Self::Locale => 3,
            Self::Region => 4,
            Self::Category => 5,
            Self::Alternate => 0x4000,
            Self::Other(value) => value,
        }
    }
}

/// Named tag with one mask bit per manifest entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name (e.g. "OSX", "enUS")
    pub name: String,
    /// Tag category
    pub tag_type: TagType,
    mask: PackedBitMask,
}

impl Tag {
    /// Create a tag with an empty mask
    pub fn new(name: impl Into<String>, tag_type: TagType) -> Self {
        Self {
            name: name.into(),
            tag_type,
            mask: PackedBitMask::new(),
        }
    }

    /// The value a new entry receives in this tag's mask
    ///
    /// Ordinary tags match every newly registered entry; the alternate tag
    /// never does.
    pub fn seed(&self) -> bool {
        self.tag_type != TagType::Alternate
    }

    /// Check if the entry at `index` carries this tag
    pub fn has_entry(&self, index: usize) -> bool {
        self.mask.get(index).unwrap_or(false)
    }

    /// Read-only view of the mask
    pub fn mask(&self) -> &PackedBitMask {
        &self.mask
    }

    /// Number of entries carrying this tag
    pub fn entry_count(&self) -> usize {
        self.mask.count_ones()
    }

    fn read(reader: &mut ManifestReader<'_>, entry_count: usize) -> Result<Self> {
        let name = reader.read_cstring()?;
        let tag_type = TagType::from_u16(reader.read_u16()?);
        let bytes = reader.read_bytes(PackedBitMask::byte_len(entry_count))?;
        let mask = PackedBitMask::from_bytes(&bytes, entry_count)?;
        Ok(Self {
            name,
            tag_type,
            mask,
        })
    }

    fn write(&self, writer: &mut ManifestWriter) -> Result<()> {
        writer.write_cstring(&self.name)?;
        writer.write_u16(self.tag_type.as_u16())?;
        writer.write_bytes(&self.mask.to_bytes())
    }
}

/// Ordered set of tags sharing one entry count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<Tag>,
    entry_count: usize,
}

/// Platform tags in the default catalog
pub const PLATFORMS: &[&str] = &["OSX"];
/// Architecture tags in the default catalog
pub const ARCHITECTURES: &[&str] = &["x86_64", "x86_32"];
/// Locale tags in the default catalog
pub const LOCALES: &[&str] = &[
    "enUS", "esES", "esMX", "frFR", "itIT", "koKR", "ptBR", "ruRU", "zhCN", "zhTW",
];
/// Region tags in the default catalog
pub const REGIONS: &[&str] = &["CN", "EU", "KR", "TW", "US"];
/// Category tags in the default catalog
pub const CATEGORIES: &[&str] = &["speech", "text"];
/// Name of the reserved alternate tag
pub const ALTERNATE: &str = "Alternate";

impl TagSet {
    /// Create an empty tag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the fixed catalog of platform, architecture, locale, region and
    /// category tags, optionally with the alternate tag after the platforms
    pub fn catalog(with_alternate: bool) -> Self {
        let mut tags: Vec<Tag> = PLATFORMS
            .iter()
            .map(|name| Tag::new(*name, TagType::Platform))
            .collect();

        if with_alternate {
            tags.push(Tag::new(ALTERNATE, TagType::Alternate));
        }

        let groups: [(&[&str], TagType); 4] = [
            (ARCHITECTURES, TagType::Architecture),
            (LOCALES, TagType::Locale),
            (REGIONS, TagType::Region),
            (CATEGORIES, TagType::Category),
        ];
        for (names, tag_type) in groups {
            tags.extend(names.iter().map(|name| Tag::new(*name, tag_type)));
        }

        Self {
            tags,
            entry_count: 0,
        }
    }

    /// Add a tag; its mask is sized to the current entry count, all unset
    pub fn add_tag(&mut self, name: impl Into<String>, tag_type: TagType) {
        let mut tag = Tag::new(name, tag_type);
        tag.mask = PackedBitMask::filled(self.entry_count, false);
        self.tags.push(tag);
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if there are no tags
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Entry count every mask is sized to
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Iterate over tags in wire order
    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    /// Find a tag by exact name
    pub fn find(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    /// Set or clear one entry's bit in a named tag
    ///
    /// Returns false if the tag or entry does not exist.
    pub fn set_entry(&mut self, name: &str, index: usize, value: bool) -> bool {
        self.tags
            .iter_mut()
            .find(|tag| tag.name == name)
            .is_some_and(|tag| tag.mask.set(index, value))
    }

    fn reset(&mut self) {
        for tag in &mut self.tags {
            tag.mask.clear();
        }
        self.entry_count = 0;
    }

    fn insert_at(&mut self, index: usize) {
        for tag in &mut self.tags {
            let seed = tag.seed();
            tag.mask.insert(index, seed);
        }
        self.entry_count += 1;
    }

    fn remove_at(&mut self, index: usize) {
        for tag in &mut self.tags {
            tag.mask.remove(index);
        }
        self.entry_count -= 1;
    }

    /// Read `tag_count` tags whose masks cover `entry_count` entries
    pub fn read(
        reader: &mut ManifestReader<'_>,
        tag_count: usize,
        entry_count: usize,
    ) -> Result<Self> {
        let tags = (0..tag_count)
            .map(|_| Tag::read(reader, entry_count))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tags, entry_count })
    }

    /// Write the tag block: name, NUL, category, packed mask per tag
    pub fn write(&self, writer: &mut ManifestWriter) -> Result<()> {
        for tag in &self.tags {
            tag.write(writer)?;
        }
        Ok(())
    }

    /// Write the tag block and release each mask once emitted
    ///
    /// The set keeps its tag names but is no longer tied to any entry list.
    pub fn drain_into(&mut self, writer: &mut ManifestWriter) -> Result<()> {
        self.write(writer)?;
        self.reset();
        Ok(())
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Entry list paired with a tag set
///
/// All entry mutations fan out to every tag's mask, so the two can never
/// drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedTable<E> {
    entries: Vec<E>,
    tags: TagSet,
}

impl<E> TaggedTable<E> {
    /// Create an empty table with the given tags
    ///
    /// Masks left over from a previous entry list are cleared; tag names and
    /// categories are kept.
    pub fn new(mut tags: TagSet) -> Self {
        tags.reset();
        Self {
            entries: Vec::new(),
            tags,
        }
    }

    /// Pair parsed entries with parsed tags
    ///
    /// Returns `None` if the tag masks were sized for a different entry count.
    pub fn from_parts(entries: Vec<E>, tags: TagSet) -> Option<Self> {
        (tags.entry_count() == entries.len()).then_some(Self { entries, tags })
    }

    /// Insert an entry at `index`, inserting the tag seed into every mask
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, entry: E) {
        self.entries.insert(index, entry);
        self.tags.insert_at(index);
    }

    /// Append an entry
    pub fn push(&mut self, entry: E) {
        let index = self.entries.len();
        self.insert(index, entry);
    }

    /// Remove the entry at `index` together with its bit in every mask
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> E {
        self.tags.remove_at(index);
        self.entries.remove(index)
    }

    /// Entries in wire order
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Mutable access to entry fields; the entry count cannot change
    pub fn entries_mut(&mut self) -> &mut [E] {
        &mut self.entries
    }

    /// Tags
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Mutable access to tag bits; mask lengths cannot change
    pub fn tags_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Split into entries and tags for a one-shot write
    pub fn into_parts(self) -> (Vec<E>, TagSet) {
        (self.entries, self.tags)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_masks_match(table: &TaggedTable<u32>) {
        for tag in table.tags() {
            assert_eq!(tag.mask().len(), table.len(), "mask length of {}", tag.name);
        }
    }

    #[test]
    fn test_tag_type_values() {
        for (tag_type, value) in [
            (TagType::Platform, 1),
            (TagType::Architecture, 2),
            (TagType::Locale, 3),
            (TagType::Region, 4),
            (TagType::Category, 5),
            (TagType::Alternate, 0x4000),
            (TagType::Other(0x0800), 0x0800),
        ] {
            assert_eq!(tag_type.as_u16(), value);
            assert_eq!(TagType::from_u16(value), tag_type);
        }
    }

    #[test]
    fn test_catalog_layout() {
        let plain = TagSet::catalog(false);
        assert_eq!(plain.len(), 20);
        assert!(plain.find(ALTERNATE).is_none());

        let with_alternate = TagSet::catalog(true);
        assert_eq!(with_alternate.len(), 21);
        let names: Vec<&str> = with_alternate.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(&names[..4], &["OSX", "Alternate", "x86_64", "x86_32"]);
        assert_eq!(names.last(), Some(&"text"));
    }

    #[test]
    fn test_insert_seeds_alternate_false() {
        let mut table = TaggedTable::new(TagSet::catalog(true));
        table.push(10u32);
        table.push(20);
        table.insert(1, 15);

        assert_masks_match(&table);
        assert_eq!(table.entries(), &[10, 15, 20]);
        for tag in table.tags() {
            let expected = tag.tag_type != TagType::Alternate;
            assert!(tag.mask().iter().all(|bit| bit == expected), "{}", tag.name);
        }
    }

    #[test]
    fn test_remove_shifts_every_mask() {
        let mut table = TaggedTable::new(TagSet::catalog(false));
        for value in 0..4u32 {
            table.push(value);
        }
        assert!(table.tags_mut().set_entry("enUS", 2, false));

        assert_eq!(table.remove(1), 1);
        assert_masks_match(&table);

        let enus = table.tags().find("enUS").expect("catalog tag");
        assert_eq!(enus.mask().iter().collect::<Vec<_>>(), vec![true, false, true]);
    }

    #[test]
    fn test_tag_block_round_trip() {
        let mut table = TaggedTable::new(TagSet::catalog(true));
        for value in 0..9u32 {
            table.push(value);
        }
        table.tags_mut().set_entry("speech", 8, false);

        let mut writer = ManifestWriter::new();
        table.tags().write(&mut writer).expect("write tags");
        let data = writer.into_inner();

        let mut reader = ManifestReader::new(&data);
        let parsed = TagSet::read(&mut reader, table.tags().len(), 9).expect("read tags");
        assert_eq!(&parsed, table.tags());
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_from_parts_checks_entry_count() {
        let tags = TagSet::catalog(false);
        assert!(TaggedTable::from_parts(vec![1u32], tags.clone()).is_none());
        assert!(TaggedTable::<u32>::from_parts(Vec::new(), tags).is_some());
    }

    #[test]
    fn test_new_table_clears_used_masks() {
        let mut used = TaggedTable::new(TagSet::catalog(true));
        used.push(1u32);
        used.push(2);
        let (_, tags) = used.into_parts();
        assert_eq!(tags.entry_count(), 2);

        let mut table = TaggedTable::new(tags);
        assert_eq!(table.tags().entry_count(), 0);
        assert_eq!(table.tags().len(), TagSet::catalog(true).len());
        assert!(table.tags().iter().all(|tag| tag.mask().is_empty()));

        table.push(3);
        assert_masks_match(&table);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push,
        Insert(usize),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Push),
            any::<usize>().prop_map(Op::Insert),
            any::<usize>().prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn mask_length_tracks_entry_count(ops in prop::collection::vec(op(), 0..100)) {
            let mut table = TaggedTable::new(TagSet::catalog(true));
            let mut next = 0u32;
            for op in ops {
                match op {
                    Op::Push => table.push(next),
                    Op::Insert(seed) => table.insert(seed % (table.len() + 1), next),
                    Op::Remove(seed) => {
                        if !table.is_empty() {
                            table.remove(seed % table.len());
                        }
                    }
                }
                next += 1;
                for tag in table.tags() {
                    prop_assert_eq!(tag.mask().len(), table.len());
                }
            }
        }
    }
}
