//! Install manifest support
#![allow(clippy::cast_possible_truncation)]
//!
//! The Install manifest lists the files written to disk by an installation,
//! by path, with their content hash and size, plus tags that say which
//! platforms, architectures, locales and regions receive each file.
//!
//! The manifest is stored as two container sections, the header and tag
//! block together (ZLib level 9) followed by the entry block (uncompressed).
//! New manifests start with the default tag catalog, which includes a
//! reserved `Alternate` tag that new entries never carry.

mod entry;
mod header;
mod manifest;

pub use entry::InstallEntry;
pub use header::{INSTALL_MAGIC, InstallHeader};
pub use manifest::{InstallManifest, LAUNCHER_FILES};

/// Locator key of the Install manifest
pub const INSTALL_MANIFEST: &str = "install";
