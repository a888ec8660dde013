//! Integration tests for the mapping lifecycle

use tempfile::TempDir;

use mapstruct::{
    open_mapping, AccessMode, BackingKind, MapStructError, MappingConfig, MappedRegion,
    RegionRegistry,
};

#[test]
fn test_create_file_backed_region() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("region.bin");

    let region = open_mapping(Some(&path), AccessMode::CreateReadWrite, 4096).unwrap();
    assert_eq!(region.len(), 4096);
    assert_eq!(region.backing(), BackingKind::File);
    assert!(!region.is_closed());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);

    // Fresh regions read as zero
    let mut buf = [1u8; 64];
    region.read_at(0, &mut buf).unwrap();
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn test_create_anonymous_region() {
    let region = open_mapping(None, AccessMode::CreateReadWrite, 4096).unwrap();
    assert_eq!(region.len(), 4096);
    assert_eq!(region.backing(), BackingKind::Anonymous);

    region.write_at(100, &[7, 8, 9]).unwrap();
    let mut buf = [0u8; 3];
    region.read_at(100, &mut buf).unwrap();
    assert_eq!(buf, [7, 8, 9]);
}

#[test]
fn test_zero_initial_size_rejected() {
    let err = open_mapping(None, AccessMode::CreateReadWrite, 0).unwrap_err();
    assert!(matches!(err, MapStructError::Size { .. }));
}

#[test]
fn test_open_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.bin");
    let err = open_mapping(Some(&path), AccessMode::ReadWrite, 4096).unwrap_err();
    assert!(matches!(err, MapStructError::Mapping { .. }));
}

#[test]
fn test_grow_preserves_and_zeroes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("grow.bin");
    let region = open_mapping(Some(&path), AccessMode::CreateReadWrite, 128).unwrap();

    let pattern: Vec<u8> = (0..128).map(|i| i as u8).collect();
    region.write_at(0, &pattern).unwrap();

    let generation = region.generation();
    region.grow(512).unwrap();
    assert_eq!(region.len(), 512);
    assert!(region.generation() > generation);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 512);

    let mut buf = vec![0u8; 512];
    region.read_at(0, &mut buf).unwrap();
    assert_eq!(&buf[..128], &pattern[..]);
    assert!(buf[128..].iter().all(|&b| b == 0));
}

#[test]
fn test_grow_anonymous_preserves_contents() {
    let region = open_mapping(None, AccessMode::CreateReadWrite, 64).unwrap();
    region.write_at(0, b"hello").unwrap();
    region.grow(4096).unwrap();

    let mut buf = [0u8; 5];
    region.read_at(0, &mut buf).unwrap();
    assert_eq!(&buf, b"hello");
}

#[test]
fn test_grow_below_current_length_rejected() {
    let region = open_mapping(None, AccessMode::CreateReadWrite, 256).unwrap();
    let err = region.grow(64).unwrap_err();
    assert!(matches!(err, MapStructError::Size { .. }));
    assert_eq!(region.len(), 256);
}

#[test]
fn test_shrink_truncates_mapping_and_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shrink.bin");
    let region = open_mapping(Some(&path), AccessMode::CreateReadWrite, 256).unwrap();
    region.write_at(0, &[42u8; 256]).unwrap();

    region.shrink(64).unwrap();
    assert_eq!(region.len(), 64);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 64);

    // Accesses past the new length fail lazily with a bounds error
    let mut buf = [0u8; 1];
    let err = region.read_at(64, &mut buf).unwrap_err();
    assert!(matches!(err, MapStructError::Bounds { .. }));

    region.read_at(63, &mut buf).unwrap();
    assert_eq!(buf[0], 42);
}

#[test]
fn test_shrink_to_zero() {
    let region = open_mapping(None, AccessMode::CreateReadWrite, 128).unwrap();
    region.shrink(0).unwrap();
    assert_eq!(region.len(), 0);
    assert!(region.is_empty());
    assert!(!region.is_closed());

    let mut buf = [0u8; 1];
    assert!(matches!(
        region.read_at(0, &mut buf).unwrap_err(),
        MapStructError::Bounds { .. }
    ));

    // The region stays usable: grow brings it back
    region.grow(128).unwrap();
    region.read_at(0, &mut buf).unwrap();
    assert_eq!(buf[0], 0);
}

#[test]
fn test_shrink_above_current_length_rejected() {
    let region = open_mapping(None, AccessMode::CreateReadWrite, 128).unwrap();
    let err = region.shrink(256).unwrap_err();
    assert!(matches!(err, MapStructError::Size { .. }));
}

#[test]
fn test_flush_writes_through_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("flush.bin");
    let region = open_mapping(Some(&path), AccessMode::CreateReadWrite, 64).unwrap();
    region.write_at(0, b"persisted").unwrap();
    region.flush().unwrap();

    let contents = std::fs::read(&path).unwrap();
    assert_eq!(&contents[..9], b"persisted");
}

#[test]
fn test_flush_range_bounds_checked() {
    let region = open_mapping(None, AccessMode::CreateReadWrite, 64).unwrap();
    // No-op on anonymous regions, but the range is still validated
    region.flush_range(0, 64).unwrap();
    let err = region.flush_range(32, 64).unwrap_err();
    assert!(matches!(err, MapStructError::Bounds { .. }));
}

#[test]
fn test_concurrent_disjoint_writes() {
    let region = open_mapping(None, AccessMode::CreateReadWrite, 4096).unwrap();

    std::thread::scope(|s| {
        for t in 0..4usize {
            let region = region.clone();
            s.spawn(move || {
                let chunk = [t as u8 + 1; 1024];
                region.write_at(t * 1024, &chunk).unwrap();
            });
        }
    });

    let mut buf = vec![0u8; 4096];
    region.read_at(0, &mut buf).unwrap();
    for t in 0..4usize {
        assert!(buf[t * 1024..(t + 1) * 1024].iter().all(|&b| b == t as u8 + 1));
    }
}

#[test]
fn test_close_is_idempotent_and_final() {
    let region = open_mapping(None, AccessMode::CreateReadWrite, 64).unwrap();
    region.close().unwrap();
    assert!(region.is_closed());
    region.close().unwrap();

    let mut buf = [0u8; 1];
    assert!(matches!(
        region.read_at(0, &mut buf).unwrap_err(),
        MapStructError::Closed
    ));
    assert!(matches!(
        region.write_at(0, &[0]).unwrap_err(),
        MapStructError::Closed
    ));
    assert!(matches!(region.grow(128).unwrap_err(), MapStructError::Closed));
    assert!(matches!(region.flush().unwrap_err(), MapStructError::Closed));
}

#[test]
fn test_file_survives_close_at_last_length() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("survive.bin");
    let region = open_mapping(Some(&path), AccessMode::CreateReadWrite, 100).unwrap();
    region.write_at(0, &[9u8; 100]).unwrap();
    region.flush().unwrap();
    region.close().unwrap();

    let contents = std::fs::read(&path).unwrap();
    assert_eq!(contents.len(), 100);
    assert!(contents.iter().all(|&b| b == 9));
}

#[test]
fn test_read_only_region() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ro.bin");
    {
        let region = open_mapping(Some(&path), AccessMode::CreateReadWrite, 64).unwrap();
        region.write_at(0, b"fixed").unwrap();
        region.flush().unwrap();
        region.close().unwrap();
    }

    let region = open_mapping(Some(&path), AccessMode::ReadOnly, 64).unwrap();
    let mut buf = [0u8; 5];
    region.read_at(0, &mut buf).unwrap();
    assert_eq!(&buf, b"fixed");

    assert!(matches!(
        region.write_at(0, b"nope").unwrap_err(),
        MapStructError::ReadOnlyRegion
    ));
    assert!(matches!(
        region.grow(128).unwrap_err(),
        MapStructError::ReadOnlyRegion
    ));
    assert!(matches!(
        region.shrink(32).unwrap_err(),
        MapStructError::ReadOnlyRegion
    ));
}

#[test]
fn test_read_only_shorter_file_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("short.bin");
    std::fs::write(&path, [0u8; 16]).unwrap();

    let err = open_mapping(Some(&path), AccessMode::ReadOnly, 64).unwrap_err();
    assert!(matches!(err, MapStructError::Size { .. }));
}

#[test]
fn test_registry_lifecycle() {
    let registry = RegionRegistry::new();
    assert!(registry.is_empty());

    let region = registry.create("control", MappingConfig::new(4096)).unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.contains("control"));
    assert_eq!(registry.total_mapped_bytes(), 4096);

    let err = registry.create("control", MappingConfig::new(64)).unwrap_err();
    assert!(matches!(err, MapStructError::RegionExists { .. }));

    let same = registry.get("control").unwrap();
    same.write_at(0, &[5]).unwrap();
    let mut buf = [0u8; 1];
    region.read_at(0, &mut buf).unwrap();
    assert_eq!(buf[0], 5);

    registry.remove("control").unwrap();
    assert!(matches!(
        registry.get("control").unwrap_err(),
        MapStructError::RegionNotFound { .. }
    ));
}

#[test]
fn test_duplicate_create_leaves_no_backing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dup.bin");

    let registry = RegionRegistry::new();
    registry.create("shared", MappingConfig::new(64)).unwrap();

    // The rejected creator must not create its backing file as a side effect
    let err = registry
        .create("shared", MappingConfig::new(64).with_path(&path))
        .unwrap_err();
    assert!(matches!(err, MapStructError::RegionExists { .. }));
    assert!(!path.exists());
}

#[test]
fn test_region_stats_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stats.bin");
    let region: MappedRegion =
        open_mapping(Some(&path), AccessMode::CreateReadWrite, 256).unwrap();
    region.grow(512).unwrap();

    let stats = region.stats();
    assert_eq!(stats.len, 512);
    assert_eq!(stats.backing, BackingKind::File);
    assert_eq!(stats.generation, 1);
    assert_eq!(stats.path.as_deref(), Some(path.as_path()));
}
