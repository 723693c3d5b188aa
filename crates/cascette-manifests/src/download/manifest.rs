//! Download manifest codec

use super::DOWNLOAD_MANIFEST;
use super::entry::{DownloadEntry, HIGH_PRIORITY_STAGE, NORMAL_STAGE};
use super::header::DownloadHeader;
use super::stage::StagedTable;
use crate::binary::ManifestReader;
use crate::encoding::{DOWNLOAD_LAYOUT, EncodingMap, Section, SectionPart};
use crate::error::{ManifestError, Result};
use crate::hash::ContentHash;
use crate::store::{CasRecord, CasWriter, ContentIndex, LocatorStore};
use crate::tag::{TagSet, TaggedTable};
use crate::writer::{self, WriteOutcome};
use tracing::{debug, info};

/// Download manifest bound to a content index
///
/// The index is consulted by [`add_entry`](Self::add_entry) so content that
/// is already registered is not listed twice. Writing consumes the manifest.
#[derive(Debug)]
pub struct DownloadManifest<I> {
    header: DownloadHeader,
    table: StagedTable,
    encoding: EncodingMap,
    index: I,
}

impl<I: ContentIndex> DownloadManifest<I> {
    /// Create an empty version 1 manifest with the default tag catalog
    pub fn new(index: I) -> Self {
        Self {
            header: DownloadHeader::default(),
            table: StagedTable::new(TagSet::catalog(false)),
            encoding: DOWNLOAD_LAYOUT.default_map(),
            index,
        }
    }

    /// Create an empty manifest of a specific format version
    pub fn with_version(version: u8, index: I) -> Result<Self> {
        let mut manifest = Self::new(index);
        manifest.header = DownloadHeader::new(version)?;
        Ok(manifest)
    }

    /// Create an empty manifest with a custom tag set
    ///
    /// Any existing mask bits in `tags` are discarded.
    pub fn with_tags(tags: TagSet, index: I) -> Self {
        let mut manifest = Self::new(index);
        manifest.table = StagedTable::new(tags);
        manifest
    }

    /// Parse decompressed manifest bytes
    pub fn parse(data: &[u8], index: I) -> Result<Self> {
        let mut entries = Vec::new();
        let mut tags = TagSet::new();

        let header = writer::decode_parts(
            &DOWNLOAD_LAYOUT,
            data,
            DownloadHeader::read,
            |header, part, reader| {
                match part {
                    SectionPart::Header => {}
                    SectionPart::Entries => {
                        entries = read_entries(reader, header)?;
                    }
                    SectionPart::Tags => {
                        tags = TagSet::read(
                            reader,
                            usize::from(header.tag_count),
                            header.entry_count as usize,
                        )?;
                    }
                }
                Ok(())
            },
        )?;

        let table = TaggedTable::from_parts(entries, tags).ok_or_else(|| {
            ManifestError::truncated("tags", 0, "tag masks do not cover every entry")
        })?;
        let table = StagedTable::from_table(table);

        debug!(
            "Parsed download manifest v{}: {} entries, {} tags",
            header.version,
            header.entry_count,
            header.tag_count
        );

        Ok(Self {
            header,
            table,
            encoding: DOWNLOAD_LAYOUT.default_map(),
            index,
        })
    }

    /// Decode a stored container and parse it
    ///
    /// Fails with [`ManifestError::CorruptContainer`] if the decompressed
    /// length differs from `download-size` in `store`. The section encodings
    /// found in the container are kept for the next write.
    pub fn from_container(container: &[u8], store: &impl LocatorStore, index: I) -> Result<Self> {
        let (data, encoding) =
            writer::open_container(DOWNLOAD_MANIFEST, &DOWNLOAD_LAYOUT, container, store)?;
        let mut manifest = Self::parse(&data, index)?;
        manifest.encoding = encoding;
        Ok(manifest)
    }

    /// Register stored content
    ///
    /// Does nothing and returns `Ok(false)` if the content index already
    /// holds the record's stored hash. Otherwise the entry goes to the end of
    /// its stage block and every tag receives its seed bit.
    pub fn add_entry(&mut self, record: &CasRecord) -> Result<bool> {
        if self.index.contains(&record.stored_hash) {
            debug!(
                "Skipping download entry {}: already registered",
                record.stored_hash
            );
            return Ok(false);
        }

        let stage = if record.high_priority {
            HIGH_PRIORITY_STAGE
        } else {
            NORMAL_STAGE
        };
        let mut entry = DownloadEntry::new(record.stored_hash, record.container_size(), stage)?;
        if self.header.has_entry_flags() {
            entry.version_flag = Some(0);
        }
        self.table.insert(entry);
        Ok(true)
    }

    /// Remove the first entry with `hash`, along with its bit in every tag
    pub fn remove_entry(&mut self, hash: &ContentHash) -> Option<DownloadEntry> {
        let index = self.position(hash)?;
        Some(self.table.remove(index))
    }

    /// Serialize into one section per layout section
    ///
    /// Tag masks are released as they are written.
    pub fn into_sections(self) -> Result<Vec<Section>> {
        let mut header = self.header;
        header.entry_count = u32::try_from(self.table.table().len()).map_err(|_| {
            ManifestError::CountOverflow {
                what: "entry",
                count: self.table.table().len(),
            }
        })?;
        header.tag_count = u16::try_from(self.table.table().tags().len()).map_err(|_| {
            ManifestError::CountOverflow {
                what: "tag",
                count: self.table.table().tags().len(),
            }
        })?;

        let (entries, mut tags) = self.table.into_parts();
        writer::encode_sections(&DOWNLOAD_LAYOUT, &self.encoding, |part, w| match part {
            SectionPart::Header => header.write(w),
            SectionPart::Entries => {
                for entry in &entries {
                    entry.write(w, &header)?;
                }
                Ok(())
            }
            SectionPart::Tags => tags.drain_into(w),
        })
    }

    /// Write the manifest through `cas` and publish `download`/`download-size`
    pub fn write(
        self,
        cas: &mut impl CasWriter,
        store: &mut impl LocatorStore,
    ) -> Result<WriteOutcome> {
        let entry_count = self.table.table().len();
        let sections = self.into_sections()?;
        let outcome = writer::publish(DOWNLOAD_MANIFEST, &sections, cas, store)?;
        info!("Download manifest written with {entry_count} entries");
        Ok(outcome)
    }

    fn position(&self, hash: &ContentHash) -> Option<usize> {
        self.table
            .table()
            .entries()
            .iter()
            .position(|entry| entry.hash == *hash)
    }

    /// Header as parsed or configured; counts are refreshed on write
    pub fn header(&self) -> &DownloadHeader {
        &self.header
    }

    /// Entries in wire order
    pub fn entries(&self) -> &[DownloadEntry] {
        self.table.table().entries()
    }

    /// Tags
    pub fn tags(&self) -> &TagSet {
        self.table.table().tags()
    }

    /// Mutable tag bits
    pub fn tags_mut(&mut self) -> &mut TagSet {
        self.table.tags_mut()
    }

    /// Find the first entry with `hash`
    pub fn find_entry(&self, hash: &ContentHash) -> Option<&DownloadEntry> {
        self.position(hash).map(|index| &self.entries()[index])
    }

    /// Exclusive ends of the stage 0 and stage 1 blocks
    pub fn stage_boundaries(&self) -> (usize, usize) {
        self.table.boundaries()
    }

    /// Sum of all entry sizes
    pub fn total_size(&self) -> u64 {
        self.entries().iter().map(|entry| entry.size.as_u64()).sum()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Section encodings the next write uses
    pub fn encoding_map(&self) -> &EncodingMap {
        &self.encoding
    }

    /// Replace the section encodings
    pub fn set_encoding_map(&mut self, encoding: EncodingMap) {
        self.encoding = encoding;
    }

    /// Content index used for deduplication
    pub fn index(&self) -> &I {
        &self.index
    }
}

fn read_entries(
    reader: &mut ManifestReader<'_>,
    header: &DownloadHeader,
) -> Result<Vec<DownloadEntry>> {
    let count = header.entry_count as usize;
    let needed = count.saturating_mul(DownloadEntry::wire_size(header));
    if reader.remaining() < needed {
        return Err(ManifestError::truncated(
            "entries",
            reader.position(),
            format!("{count} entries need {needed} bytes, {} available", reader.remaining()),
        ));
    }
    (0..count)
        .map(|_| DownloadEntry::read(reader, header))
        .collect()
}
