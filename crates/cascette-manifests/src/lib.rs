//! Download and Install manifest codecs for NGDP/CASC build pipelines
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::doc_markdown)] // Many CASC-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::missing_errors_doc)] // Every fallible call returns ManifestError
#![allow(clippy::missing_panics_doc)] // Panics are documented where they exist
#![allow(clippy::must_use_candidate)] // Accessor-heavy API
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate builds and parses the two manifests a build pipeline publishes
//! alongside the content it stores:
//!
//! - **Download**: every stored container a client fetches, with its size and
//!   priority stage
//! - **Install**: every file written to disk, by path, with its content hash
//!   and size
//!
//! Both carry per-entry tags (platform, architecture, locale, region,
//! category) as packed bit masks that always hold one bit per entry.
//!
//! # Writing
//!
//! Each manifest kind has a fixed [`encoding::SectionLayout`]: which parts go
//! into which container section, and how each section is compressed. Writing
//! serializes the sections, hands them to a [`store::CasWriter`], hashes the
//! uncompressed sections into the manifest content hash, and publishes the
//! size and hash pairs to a [`store::LocatorStore`] such as
//! [`store::BuildConfig`].
//!
//! # Reading
//!
//! `from_container` decodes a stored container, cross-checks its decompressed
//! size against the locator store and keeps the recovered section encodings,
//! so an unchanged manifest is written back byte for byte.

#![warn(missing_docs)]

pub mod binary;
pub mod bitmask;
pub mod blte;
pub mod download;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod install;
pub mod store;
pub mod tag;
pub mod writer;

pub use bitmask::PackedBitMask;
pub use download::{DownloadEntry, DownloadManifest};
pub use encoding::{EncodingMap, EncodingProfile, Section, SectionLayout};
pub use error::{ManifestError, Result};
pub use hash::ContentHash;
pub use install::{InstallEntry, InstallManifest};
pub use store::{BuildConfig, CasRecord, CasWriter, ContentIndex, LocatorStore};
pub use tag::{Tag, TagSet, TagType};
pub use writer::WriteOutcome;
