//! Download manifest support
#![allow(clippy::cast_possible_truncation)]
//!
//! The Download manifest lists every stored container a client must fetch,
//! with its size and priority stage, plus tags that say which platforms,
//! locales and regions need each entry.
//!
//! # Layout
//!
//! The manifest is stored as three container sections:
//!
//! | Section | Contents | Default encoding |
//! |---------|----------|------------------|
//! | 0 | header (11 bytes) | none |
//! | 1 | entries | none |
//! | 2 | tags | ZLib level 9 |
//!
//! Each entry is a 16-byte stored hash, a 40-bit size, a stage byte and four
//! opaque bytes. From version 2 every entry is preceded by a flag byte; the
//! tag block follows the last entry directly.
//!
//! # Priority stages
//!
//! Entries stay partitioned by stage: every stage 0 (high priority) entry
//! precedes every stage 1 entry. [`DownloadManifest::add_entry`] places new
//! entries at the end of their stage block and shifts tag bits to match.
//!
//! ```rust,no_run
//! use cascette_manifests::download::DownloadManifest;
//! use cascette_manifests::store::{BuildConfig, CasWriter, MemoryCasWriter};
//! use cascette_manifests::encoding::{EncodingProfile, Section};
//! use cascette_manifests::hash::ContentHash;
//! use std::collections::HashSet;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cas = MemoryCasWriter::new();
//! let mut config = BuildConfig::new();
//! let registered: HashSet<ContentHash> = HashSet::new();
//!
//! let record = cas
//!     .write(&[Section { data: b"file".to_vec(), profile: EncodingProfile::none() }])?
//!     .with_high_priority(true);
//!
//! let mut manifest = DownloadManifest::new(&registered);
//! manifest.add_entry(&record)?;
//! let outcome = manifest.write(&mut cas, &mut config)?;
//! println!("download manifest stored as {}", outcome.record.stored_hash);
//! # Ok(())
//! # }
//! ```

mod entry;
mod header;
mod manifest;
mod stage;

pub use entry::{DownloadEntry, HIGH_PRIORITY_STAGE, NORMAL_STAGE};
pub use header::{DOWNLOAD_MAGIC, DownloadHeader};
pub use manifest::DownloadManifest;
pub use stage::StagedTable;

/// Locator key of the Download manifest
pub const DOWNLOAD_MANIFEST: &str = "download";
