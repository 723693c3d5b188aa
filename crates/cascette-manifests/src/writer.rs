//! Shared read/write loop for manifest containers
//!
//! Both manifest kinds are driven by their [`SectionLayout`]: the writer
//! serializes each part into its section in layout order, and the reader walks
//! the same parts over the decompressed container. The header part always
//! leads a layout, since the counts it holds size everything after it.

use crate::binary::{ManifestReader, ManifestWriter};
use crate::blte;
use crate::encoding::{EncodingMap, Section, SectionLayout, SectionPart};
use crate::error::{ManifestError, Result};
use crate::hash::ContentHash;
use crate::store::{CasRecord, CasWriter, LocatorStore};
use tracing::{debug, info, warn};

/// Outcome of writing a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Record of the new container; `content_hash` and `decompressed_size`
    /// describe the manifest's own uncompressed sections
    pub record: CasRecord,
    /// Stored hash of the previous container, if one was removed
    pub replaced: Option<ContentHash>,
}

/// Serialize every part of `layout` into one [`Section`] per layout section
pub(crate) fn encode_sections(
    layout: &SectionLayout,
    encoding: &EncodingMap,
    mut write_part: impl FnMut(SectionPart, &mut ManifestWriter) -> Result<()>,
) -> Result<Vec<Section>> {
    layout
        .sections
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let mut writer = ManifestWriter::new();
            for &part in spec.parts {
                write_part(part, &mut writer)?;
            }
            Ok(Section {
                data: writer.into_inner(),
                profile: encoding.get(index).unwrap_or(spec.default_profile),
            })
        })
        .collect()
}

/// Walk the parts of `layout` over decompressed manifest bytes
///
/// `read_header` consumes the leading header part; `read_part` is then called
/// for each following part with the parsed header.
pub(crate) fn decode_parts<H>(
    layout: &SectionLayout,
    data: &[u8],
    read_header: impl FnOnce(&mut ManifestReader<'_>) -> Result<H>,
    mut read_part: impl FnMut(&H, SectionPart, &mut ManifestReader<'_>) -> Result<()>,
) -> Result<H> {
    let mut reader = ManifestReader::new(data);
    reader.enter(SectionPart::Header.name());
    let header = read_header(&mut reader)?;

    for part in layout.parts().filter(|part| *part != SectionPart::Header) {
        reader.enter(part.name());
        read_part(&header, part, &mut reader)?;
    }

    if reader.remaining() > 0 {
        debug!(
            "Ignoring {} trailing bytes after manifest body",
            reader.remaining()
        );
    }
    Ok(header)
}

/// Decompress a stored manifest container
///
/// Cross-checks the decompressed length against slot 0 of `<manifest>-size`
/// when the locator store records one, and recovers the section encodings
/// from the container's chunk modes.
pub(crate) fn open_container(
    manifest: &'static str,
    layout: &SectionLayout,
    container: &[u8],
    store: &impl LocatorStore,
) -> Result<(Vec<u8>, EncodingMap)> {
    let decoded = blte::decode(container)?;
    let actual = decoded.data.len() as u64;

    let size_key = format!("{manifest}-size");
    if let Some(expected) = store
        .get_slot(&size_key, 0)
        .and_then(|value| value.parse::<u64>().ok())
        && expected != actual
    {
        return Err(ManifestError::CorruptContainer {
            manifest,
            expected,
            actual,
        });
    }

    let encoding = layout.adopt(&decoded.modes).unwrap_or_else(|| {
        warn!(
            "{manifest} container has {} chunks, layout has {} sections; using default encodings",
            decoded.modes.len(),
            layout.len()
        );
        layout.default_map()
    });

    Ok((decoded.data, encoding))
}

/// Store encoded sections and publish the manifest's locator keys
///
/// The manifest content hash covers the uncompressed sections concatenated
/// in order. The previous container named by slot 1 of `<manifest>` is
/// removed before the keys move to the new one; each key's pair of values is
/// replaced in a single update.
pub(crate) fn publish(
    manifest: &'static str,
    sections: &[Section],
    cas: &mut impl CasWriter,
    store: &mut impl LocatorStore,
) -> Result<WriteOutcome> {
    let previous = store
        .get_slot(manifest, 1)
        .and_then(|hex| ContentHash::from_hex(hex).ok());

    let mut record = cas.write(sections)?;
    record.content_hash = ContentHash::from_parts(sections.iter().map(|s| s.data.as_slice()));
    record.decompressed_size = sections.iter().map(|s| s.data.len() as u64).sum();

    let replaced = match previous {
        Some(stale) if stale != record.stored_hash => {
            if cas.remove_artifact(&stale)? {
                info!("Removed stale {manifest} container {stale}");
                Some(stale)
            } else {
                None
            }
        }
        _ => None,
    };

    store.set_pair(
        &format!("{manifest}-size"),
        record.decompressed_size.to_string(),
        record.container_size().to_string(),
    );
    store.set_pair(
        manifest,
        record.content_hash.to_hex(),
        record.stored_hash.to_hex(),
    );

    info!(
        "Wrote {manifest} manifest: content {} ({} bytes), stored {} ({} bytes)",
        record.content_hash,
        record.decompressed_size,
        record.stored_hash,
        record.container_size()
    );

    Ok(WriteOutcome { record, replaced })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::{DOWNLOAD_LAYOUT, EncodingProfile, INSTALL_LAYOUT};
    use crate::store::{LOCAL_HEADER_SIZE, MemoryCasWriter};
    use std::collections::HashMap;

    fn part_bytes(part: SectionPart) -> &'static [u8] {
        match part {
            SectionPart::Header => b"HH",
            SectionPart::Entries => b"EEEE",
            SectionPart::Tags => b"T",
        }
    }

    #[test]
    fn test_encode_follows_layout() {
        let sections = encode_sections(&INSTALL_LAYOUT, &INSTALL_LAYOUT.default_map(), |part, w| {
            w.write_bytes(part_bytes(part))
        })
        .expect("encode");

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].data, b"HHT");
        assert_eq!(sections[0].profile, EncodingProfile::zlib(9));
        assert_eq!(sections[1].data, b"EEEE");
        assert_eq!(sections[1].profile, EncodingProfile::none());
    }

    #[test]
    fn test_decode_visits_parts_in_order() {
        let mut seen = Vec::new();
        let header = decode_parts(
            &DOWNLOAD_LAYOUT,
            b"HHEEEET",
            |r| r.read_array::<2>(),
            |_, part, r| {
                let len = part_bytes(part).len();
                seen.push((part, r.read_bytes(len)?));
                Ok(())
            },
        )
        .expect("decode");

        assert_eq!(&header, b"HH");
        assert_eq!(
            seen,
            vec![
                (SectionPart::Entries, b"EEEE".to_vec()),
                (SectionPart::Tags, b"T".to_vec())
            ]
        );
    }

    #[test]
    fn test_publish_sets_pairs_and_removes_stale() {
        let mut cas = MemoryCasWriter::new();
        let mut store: HashMap<String, Vec<String>> = HashMap::new();

        let first = encode_sections(&DOWNLOAD_LAYOUT, &DOWNLOAD_LAYOUT.default_map(), |p, w| {
            w.write_bytes(part_bytes(p))
        })
        .expect("encode");
        let outcome = publish("download", &first, &mut cas, &mut store).expect("publish");

        assert_eq!(outcome.replaced, None);
        assert_eq!(
            outcome.record.content_hash,
            ContentHash::from_data(b"HHEEEET")
        );
        assert_eq!(store.get_slot("download-size", 0), Some("7"));
        assert_eq!(
            store.get_slot("download-size", 1),
            Some((outcome.record.compressed_size - LOCAL_HEADER_SIZE).to_string().as_str())
        );
        assert_eq!(
            store.get_slot("download", 1),
            Some(outcome.record.stored_hash.to_hex().as_str())
        );

        let second = encode_sections(&DOWNLOAD_LAYOUT, &DOWNLOAD_LAYOUT.default_map(), |p, w| {
            w.write_bytes(part_bytes(p))?;
            w.write_u8(1)
        })
        .expect("encode");
        let next = publish("download", &second, &mut cas, &mut store).expect("publish");

        assert_eq!(next.replaced, Some(outcome.record.stored_hash));
        assert!(!cas.contains(&outcome.record.stored_hash));
        assert!(cas.contains(&next.record.stored_hash));
    }

    #[test]
    fn test_open_container_size_check() {
        let mut cas = MemoryCasWriter::new();
        let mut store: HashMap<String, Vec<String>> = HashMap::new();
        let sections = encode_sections(&INSTALL_LAYOUT, &INSTALL_LAYOUT.default_map(), |p, w| {
            w.write_bytes(part_bytes(p))
        })
        .expect("encode");
        let outcome = publish("install", &sections, &mut cas, &mut store).expect("publish");
        let container = cas.get(&outcome.record.stored_hash).expect("stored").to_vec();

        let (data, encoding) =
            open_container("install", &INSTALL_LAYOUT, &container, &store).expect("open");
        assert_eq!(data, b"HHTEEEE");
        assert_eq!(encoding, INSTALL_LAYOUT.default_map());

        store.set("install-size", "8".to_string(), 0);
        assert!(matches!(
            open_container("install", &INSTALL_LAYOUT, &container, &store),
            Err(ManifestError::CorruptContainer {
                manifest: "install",
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_open_container_section_count_fallback() {
        let single = blte::encode(&[Section {
            data: b"HHTEEEE".to_vec(),
            profile: EncodingProfile::none(),
        }])
        .expect("encode");
        let store: HashMap<String, Vec<String>> = HashMap::new();

        let (_, encoding) =
            open_container("install", &INSTALL_LAYOUT, &single.data, &store).expect("open");
        assert_eq!(encoding, INSTALL_LAYOUT.default_map());
    }
}
