#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! End-to-end tests for writing manifests to a directory store and reading
//! them back through the build configuration.

use cascette_manifests::encoding::{EncodingProfile, Section};
use cascette_manifests::store::{DirectoryCasWriter, ManifestLocation};
use cascette_manifests::tag::ALTERNATE;
use cascette_manifests::{
    BuildConfig, CasRecord, CasWriter, ContentHash, DownloadManifest, InstallManifest,
    LocatorStore, ManifestError,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use tempfile::TempDir;

fn store_file(cas: &mut DirectoryCasWriter, data: &[u8]) -> CasRecord {
    cas.write(&[Section {
        data: data.to_vec(),
        profile: EncodingProfile::zlib(9),
    }])
    .expect("store content")
}

fn read_location(cas: &DirectoryCasWriter, location: &ManifestLocation) -> Vec<u8> {
    let stored = location.stored_hash.expect("stored hash recorded");
    cas.read(&stored).expect("read container")
}

#[test]
fn download_manifest_priority_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut cas = DirectoryCasWriter::new(dir.path());
    let mut config = BuildConfig::new();

    let d2 = store_file(&mut cas, &vec![2u8; 2000]);
    let d1 = store_file(&mut cas, &vec![1u8; 1000]).with_high_priority(true);

    let mut manifest = DownloadManifest::new(HashSet::<ContentHash>::new());
    assert!(manifest.add_entry(&d2).unwrap());
    assert!(manifest.add_entry(&d1).unwrap());
    let outcome = manifest.write(&mut cas, &mut config).unwrap();
    assert_eq!(outcome.replaced, None);

    let location = config.manifest("download").expect("download key");
    assert_eq!(location.content_hash, outcome.record.content_hash);
    assert_eq!(location.size, Some(outcome.record.decompressed_size));
    assert_eq!(location.stored_size, Some(outcome.record.container_size()));

    let container = read_location(&cas, &location);
    assert_eq!(container.len() as u64, outcome.record.container_size());

    let parsed =
        DownloadManifest::from_container(&container, &config, HashSet::<ContentHash>::new())
            .unwrap();
    let entries = parsed.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].hash, d1.stored_hash);
    assert_eq!(entries[0].stage, 0);
    assert_eq!(entries[0].size.as_u64(), d1.container_size());
    assert_eq!(entries[1].hash, d2.stored_hash);
    assert_eq!(entries[1].stage, 1);
    assert_eq!(parsed.stage_boundaries(), (1, 2));
    for tag in parsed.tags() {
        assert_eq!(tag.mask().iter().collect::<Vec<_>>(), vec![true, true]);
    }
}

#[test]
fn download_dedup_against_registered_content() {
    let dir = TempDir::new().unwrap();
    let mut cas = DirectoryCasWriter::new(dir.path());
    let known = store_file(&mut cas, b"already listed");
    let fresh = store_file(&mut cas, b"new content");

    let index: HashSet<ContentHash> = [known.stored_hash].into_iter().collect();
    let mut manifest = DownloadManifest::new(&index);
    assert!(!manifest.add_entry(&known).unwrap());
    assert!(manifest.add_entry(&fresh).unwrap());
    assert!(!manifest.add_entry(&known).unwrap());

    assert_eq!(manifest.len(), 1);
    for tag in manifest.tags() {
        assert_eq!(tag.mask().len(), 1);
    }
}

#[test]
fn download_size_mismatch_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let mut cas = DirectoryCasWriter::new(dir.path());
    let mut config = BuildConfig::new();

    let record = store_file(&mut cas, b"payload");
    let mut manifest = DownloadManifest::new(HashSet::<ContentHash>::new());
    manifest.add_entry(&record).unwrap();
    let outcome = manifest.write(&mut cas, &mut config).unwrap();
    let container = cas.read(&outcome.record.stored_hash).unwrap();

    let actual = outcome.record.decompressed_size;
    config.set("download-size", (actual + 1).to_string(), 0);

    let error =
        DownloadManifest::from_container(&container, &config, HashSet::<ContentHash>::new())
            .expect_err("size mismatch");
    assert!(error.is_input_error());
    match error {
        ManifestError::CorruptContainer {
            manifest,
            expected,
            actual: found,
        } => {
            assert_eq!(manifest, "download");
            assert_eq!(expected, actual + 1);
            assert_eq!(found, actual);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn install_manifest_round_trip_through_config_file() {
    let dir = TempDir::new().unwrap();
    let mut cas = DirectoryCasWriter::new(dir.path().join("out"));
    let mut config = BuildConfig::new();

    let mut manifest = InstallManifest::new();
    let tag_count = manifest.tags().len();
    for (path, data) in [
        ("Wow.exe", b"launcher".as_slice()),
        ("Data/config.wtf", b"SET locale enUS".as_slice()),
    ] {
        let record = store_file(&mut cas, data).with_path(path);
        manifest.add(&record).unwrap();
    }
    manifest.write(&mut cas, &mut config).unwrap();

    let config_path = dir.path().join("build-config");
    config.save(&config_path).unwrap();
    let config = BuildConfig::load(&config_path).unwrap();

    let location = config.manifest("install").expect("install key");
    let container = read_location(&cas, &location);
    let parsed = InstallManifest::from_container(&container, &config).unwrap();

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed.tags().len(), tag_count);
    let exe = parsed.get_entry("WOW.EXE").expect("launcher entry");
    assert_eq!(exe.hash, ContentHash::from_data(b"launcher"));
    assert_eq!(exe.size, 8);
    for tag in parsed.tags() {
        let expected = tag.name != ALTERNATE;
        assert_eq!(
            tag.mask().iter().collect::<Vec<_>>(),
            vec![expected, expected],
            "{}",
            tag.name
        );
    }
}

#[test]
fn unchanged_rewrite_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let mut cas = DirectoryCasWriter::new(dir.path());
    let mut config = BuildConfig::new();

    let mut manifest = InstallManifest::new();
    let record = store_file(&mut cas, b"binary").with_path("Wow-64.exe");
    manifest.add(&record).unwrap();
    let first = manifest.write(&mut cas, &mut config).unwrap();
    let container = cas.read(&first.record.stored_hash).unwrap();

    let reopened = InstallManifest::from_container(&container, &config).unwrap();
    let second = reopened.write(&mut cas, &mut config).unwrap();

    assert_eq!(second.record.stored_hash, first.record.stored_hash);
    assert_eq!(second.record.content_hash, first.record.content_hash);
    assert_eq!(second.replaced, None);
    assert_eq!(cas.read(&second.record.stored_hash).unwrap(), container);
}

#[test]
fn rewrite_removes_stale_container() {
    let dir = TempDir::new().unwrap();
    let mut cas = DirectoryCasWriter::new(dir.path());
    let mut config = BuildConfig::new();

    let a = store_file(&mut cas, b"first");
    let b = store_file(&mut cas, b"second");

    let mut manifest = DownloadManifest::new(HashSet::<ContentHash>::new());
    manifest.add_entry(&a).unwrap();
    let first = manifest.write(&mut cas, &mut config).unwrap();
    let stale_path = cas.path_for(&first.record.stored_hash);
    assert!(stale_path.exists());

    let container = cas.read(&first.record.stored_hash).unwrap();
    let mut manifest =
        DownloadManifest::from_container(&container, &config, HashSet::<ContentHash>::new())
            .unwrap();
    manifest.add_entry(&b).unwrap();
    let second = manifest.write(&mut cas, &mut config).unwrap();

    assert_ne!(second.record.stored_hash, first.record.stored_hash);
    assert_eq!(second.replaced, Some(first.record.stored_hash));
    assert!(!stale_path.exists());
    assert!(cas.path_for(&second.record.stored_hash).exists());
    assert_eq!(
        config.get_slot("download", 1),
        Some(second.record.stored_hash.to_hex().as_str())
    );
}
