//! Install manifest codec

use super::INSTALL_MANIFEST;
use super::entry::InstallEntry;
use super::header::InstallHeader;
use crate::encoding::{EncodingMap, INSTALL_LAYOUT, Section, SectionPart};
use crate::error::{ManifestError, Result};
use crate::store::{CasRecord, CasWriter, LocatorStore};
use crate::tag::{TagSet, TaggedTable};
use crate::writer::{self, WriteOutcome};
use tracing::{debug, info};

/// Launcher executables whose install entries track the latest build
pub const LAUNCHER_FILES: &[&str] = &[
    "wow.exe",
    "wow-64.exe",
    r"world of warcraft.app\contents\macos\world of warcraft",
];

/// Install manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallManifest {
    header: InstallHeader,
    table: TaggedTable<InstallEntry>,
    encoding: EncodingMap,
}

impl InstallManifest {
    /// Create an empty manifest with the default catalog, including the
    /// alternate tag
    pub fn new() -> Self {
        Self::with_tags(TagSet::catalog(true))
    }

    /// Create an empty manifest with a custom tag set
    ///
    /// Any existing mask bits in `tags` are discarded.
    pub fn with_tags(tags: TagSet) -> Self {
        Self {
            header: InstallHeader::default(),
            table: TaggedTable::new(tags),
            encoding: INSTALL_LAYOUT.default_map(),
        }
    }

    /// Parse decompressed manifest bytes; tags come before entries
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut tags = TagSet::new();

        let header = writer::decode_parts(
            &INSTALL_LAYOUT,
            data,
            InstallHeader::read,
            |header, part, reader| {
                match part {
                    SectionPart::Header => {}
                    SectionPart::Tags => {
                        tags = TagSet::read(
                            reader,
                            usize::from(header.tag_count),
                            header.entry_count as usize,
                        )?;
                    }
                    SectionPart::Entries => {
                        entries = (0..header.entry_count)
                            .map(|_| InstallEntry::read(reader))
                            .collect::<Result<Vec<_>>>()?;
                    }
                }
                Ok(())
            },
        )?;

        let table = TaggedTable::from_parts(entries, tags).ok_or_else(|| {
            ManifestError::truncated("tags", 0, "tag masks do not cover every entry")
        })?;

        debug!(
            "Parsed install manifest: {} entries, {} tags",
            header.entry_count, header.tag_count
        );

        Ok(Self {
            header,
            table,
            encoding: INSTALL_LAYOUT.default_map(),
        })
    }

    /// Decode a stored container and parse it
    ///
    /// Fails with [`ManifestError::CorruptContainer`] if the decompressed
    /// length differs from `install-size` in `store`.
    pub fn from_container(container: &[u8], store: &impl LocatorStore) -> Result<Self> {
        let (data, encoding) =
            writer::open_container(INSTALL_MANIFEST, &INSTALL_LAYOUT, container, store)?;
        let mut manifest = Self::parse(&data)?;
        manifest.encoding = encoding;
        Ok(manifest)
    }

    /// Append an entry for a stored file
    ///
    /// The entry is named by the record's path and holds its content hash and
    /// uncompressed size. Every tag receives its seed bit: set for ordinary
    /// tags, clear for the alternate tag.
    pub fn add(&mut self, record: &CasRecord) -> Result<()> {
        let name = record
            .path
            .as_deref()
            .ok_or_else(|| ManifestError::MissingPath(record.content_hash.to_hex()))?;
        let entry = InstallEntry::new(name, record.content_hash, record.decompressed_size)?;
        self.table.push(entry);
        Ok(())
    }

    /// Find an entry by name, ignoring case
    pub fn get_entry(&self, name: &str) -> Option<&InstallEntry> {
        self.table.entries().iter().find(|entry| entry.matches(name))
    }

    /// Find an entry by name for in-place updates, ignoring case
    pub fn get_entry_mut(&mut self, name: &str) -> Option<&mut InstallEntry> {
        self.table
            .entries_mut()
            .iter_mut()
            .find(|entry| entry.matches(name))
    }

    /// Remove the first entry named `name` (ignoring case) and its tag bits
    pub fn remove_entry(&mut self, name: &str) -> Option<InstallEntry> {
        let index = self
            .table
            .entries()
            .iter()
            .position(|entry| entry.matches(name))?;
        Some(self.table.remove(index))
    }

    /// Bring launcher entries up to date with freshly stored files
    ///
    /// For each of [`LAUNCHER_FILES`], the first record whose path ends with
    /// that name is compared against the entry of the same name. A differing
    /// content hash or size updates the entry. Returns true if any entry
    /// changed, meaning the manifest needs to be written again.
    pub fn refresh_launcher_entries(&mut self, records: &[CasRecord]) -> Result<bool> {
        let mut changed = false;

        for file in LAUNCHER_FILES {
            let Some(record) = records.iter().find(|record| {
                record
                    .path
                    .as_deref()
                    .filter(|path| !path.trim().is_empty())
                    .is_some_and(|path| path.to_lowercase().ends_with(file))
            }) else {
                continue;
            };
            let Some(entry) = self.get_entry_mut(file) else {
                continue;
            };

            let size = u32::try_from(record.decompressed_size)
                .map_err(|_| ManifestError::InstallSizeTooLarge(record.decompressed_size))?;
            if entry.hash != record.content_hash || entry.size != size {
                debug!("Launcher entry {} changed", entry.name);
                entry.hash = record.content_hash;
                entry.size = size;
                changed = true;
            }
        }

        Ok(changed)
    }

    /// Serialize into one section per layout section
    pub fn into_sections(self) -> Result<Vec<Section>> {
        let mut header = self.header;
        header.entry_count =
            u32::try_from(self.table.len()).map_err(|_| ManifestError::CountOverflow {
                what: "entry",
                count: self.table.len(),
            })?;
        header.tag_count =
            u16::try_from(self.table.tags().len()).map_err(|_| ManifestError::CountOverflow {
                what: "tag",
                count: self.table.tags().len(),
            })?;

        let (entries, mut tags) = self.table.into_parts();
        writer::encode_sections(&INSTALL_LAYOUT, &self.encoding, |part, w| match part {
            SectionPart::Header => header.write(w),
            SectionPart::Tags => tags.drain_into(w),
            SectionPart::Entries => {
                for entry in &entries {
                    entry.write(w)?;
                }
                Ok(())
            }
        })
    }

    /// Write the manifest through `cas` and publish `install`/`install-size`
    pub fn write(
        self,
        cas: &mut impl CasWriter,
        store: &mut impl LocatorStore,
    ) -> Result<WriteOutcome> {
        let entry_count = self.table.len();
        let sections = self.into_sections()?;
        let outcome = writer::publish(INSTALL_MANIFEST, &sections, cas, store)?;
        info!("Install manifest written with {entry_count} entries");
        Ok(outcome)
    }

    /// Header as parsed or configured; counts are refreshed on write
    pub fn header(&self) -> &InstallHeader {
        &self.header
    }

    /// Entries in wire order
    pub fn entries(&self) -> &[InstallEntry] {
        self.table.entries()
    }

    /// Tags
    pub fn tags(&self) -> &TagSet {
        self.table.tags()
    }

    /// Mutable tag bits
    pub fn tags_mut(&mut self) -> &mut TagSet {
        self.table.tags_mut()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Section encodings the next write uses
    pub fn encoding_map(&self) -> &EncodingMap {
        &self.encoding
    }

    /// Replace the section encodings
    pub fn set_encoding_map(&mut self, encoding: EncodingMap) {
        self.encoding = encoding;
    }
}

impl Default for InstallManifest {
    fn default() -> Self {
        Self::new()
    }
}
