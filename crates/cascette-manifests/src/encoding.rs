//! Per-section encoding profiles and manifest section layouts
//!
//! A manifest is stored as a container of independently compressed sections.
//! Which parts of the manifest go into which section, and how each section is
//! compressed, is fixed per manifest kind by a [`SectionLayout`] table.

use crate::blte::CompressionMode;

/// Compression method and effort for one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingProfile {
    /// Compression method
    pub mode: CompressionMode,
    /// Effort level (0-9 for ZLib, ignored otherwise)
    pub level: u32,
}

impl EncodingProfile {
    /// Effort used when a profile is recovered without a known level
    pub const DEFAULT_LEVEL: u32 = 6;

    /// Create a profile
    pub const fn new(mode: CompressionMode, level: u32) -> Self {
        Self { mode, level }
    }

    /// Uncompressed section
    pub const fn none() -> Self {
        Self::new(CompressionMode::None, Self::DEFAULT_LEVEL)
    }

    /// ZLib-compressed section at `level`
    pub const fn zlib(level: u32) -> Self {
        Self::new(CompressionMode::ZLib, level)
    }
}

/// Logical part of a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionPart {
    /// Magic, version and counts
    Header,
    /// Entry records
    Entries,
    /// Tag records
    Tags,
}

impl SectionPart {
    /// Name used in logs and error context
    pub fn name(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Entries => "entries",
            Self::Tags => "tags",
        }
    }
}

/// One container section: the parts it holds, in order, and its default
/// encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    /// Manifest parts serialized into this section
    pub parts: &'static [SectionPart],
    /// Encoding used unless a recovered profile replaces it
    pub default_profile: EncodingProfile,
}

/// Declarative section layout of a manifest kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    /// Sections in container order
    pub sections: &'static [SectionSpec],
}

impl SectionLayout {
    /// Number of container sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if the layout has no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Every part in wire order, regardless of section boundaries
    pub fn parts(&self) -> impl Iterator<Item = SectionPart> + '_ {
        self.sections
            .iter()
            .flat_map(|section| section.parts.iter().copied())
    }

    /// Default encoding profile per section
    pub fn default_map(&self) -> EncodingMap {
        EncodingMap(
            self.sections
                .iter()
                .map(|section| section.default_profile)
                .collect(),
        )
    }

    /// Adopt profiles recovered from a container
    ///
    /// Recovered modes replace the defaults section by section. Containers do
    /// not record the compression effort, so a section keeps its default level
    /// when the recovered mode matches the default and falls back to
    /// [`EncodingProfile::DEFAULT_LEVEL`] otherwise. Returns `None` when the
    /// container has a different number of sections than the layout.
    pub fn adopt(&self, recovered: &[CompressionMode]) -> Option<EncodingMap> {
        if recovered.len() != self.sections.len() {
            return None;
        }
        let profiles = self
            .sections
            .iter()
            .zip(recovered)
            .map(|(section, &mode)| {
                if section.default_profile.mode == mode {
                    section.default_profile
                } else {
                    EncodingProfile::new(mode, EncodingProfile::DEFAULT_LEVEL)
                }
            })
            .collect();
        Some(EncodingMap(profiles))
    }
}

/// Download manifest layout: header, entries and tags in separate sections
pub const DOWNLOAD_LAYOUT: SectionLayout = SectionLayout {
    sections: &[
        SectionSpec {
            parts: &[SectionPart::Header],
            default_profile: EncodingProfile::none(),
        },
        SectionSpec {
            parts: &[SectionPart::Entries],
            default_profile: EncodingProfile::none(),
        },
        SectionSpec {
            parts: &[SectionPart::Tags],
            default_profile: EncodingProfile::zlib(9),
        },
    ],
};

/// Install manifest layout: header and tags share the first section
pub const INSTALL_LAYOUT: SectionLayout = SectionLayout {
    sections: &[
        SectionSpec {
            parts: &[SectionPart::Header, SectionPart::Tags],
            default_profile: EncodingProfile::zlib(9),
        },
        SectionSpec {
            parts: &[SectionPart::Entries],
            default_profile: EncodingProfile::none(),
        },
    ],
};

/// Encoding profile per container section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingMap(Vec<EncodingProfile>);

impl EncodingMap {
    /// Profiles in section order
    pub fn profiles(&self) -> &[EncodingProfile] {
        &self.0
    }

    /// Profile for section `index`
    pub fn get(&self, index: usize) -> Option<EncodingProfile> {
        self.0.get(index).copied()
    }

    /// Number of sections covered
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no sections are covered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Uncompressed section bytes with the encoding to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Raw section bytes
    pub data: Vec<u8>,
    /// Encoding for this section
    pub profile: EncodingProfile,
}
