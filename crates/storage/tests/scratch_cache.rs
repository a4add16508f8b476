//! Filesystem behavior of the scratch cache.

use std::fs;

use storage::ScratchCache;
use test_utils::{list_file_names as file_names, temp_test_dir, temp_test_dir_with_prefix};

#[tokio::test]
async fn test_ensure_creates_nested_directory() {
    let tmp = temp_test_dir_with_prefix("firewx_cache_");
    let cache = ScratchCache::new(tmp.path().join("NWS Data").join("nested"));

    cache.ensure().await.unwrap();
    assert!(cache.root().is_dir());

    // Idempotent
    cache.ensure().await.unwrap();
}

#[tokio::test]
async fn test_store_moves_raw_payload_to_qualified_name() {
    let tmp = temp_test_dir();
    let cache = ScratchCache::new(tmp.path());

    let path = cache
        .store("ds.maxt.bin", "ds.maxt_short.bin", b"first")
        .await
        .unwrap();

    assert_eq!(path, tmp.path().join("ds.maxt_short.bin"));
    assert_eq!(fs::read(&path).unwrap(), b"first");
    assert_eq!(file_names(tmp.path()), vec!["ds.maxt_short.bin"]);
}

#[tokio::test]
async fn test_store_replaces_previous_entry() {
    let tmp = temp_test_dir();
    let cache = ScratchCache::new(tmp.path());

    cache
        .store("ds.maxt.bin", "ds.maxt_short.bin", b"first download")
        .await
        .unwrap();
    // A leftover raw file from an interrupted run
    fs::write(tmp.path().join("ds.maxt.bin"), b"partial").unwrap();

    let path = cache
        .store("ds.maxt.bin", "ds.maxt_short.bin", b"second")
        .await
        .unwrap();

    assert_eq!(fs::read(path).unwrap(), b"second");
    assert_eq!(file_names(tmp.path()), vec!["ds.maxt_short.bin"]);
}

#[tokio::test]
async fn test_short_and_extended_do_not_collide() {
    let tmp = temp_test_dir();
    let cache = ScratchCache::new(tmp.path());

    cache
        .store("ds.maxrh.bin", "ds.maxrh_short.bin", b"short")
        .await
        .unwrap();
    cache
        .store("ds.maxrh.bin", "ds.maxrh_extended.bin", b"extended")
        .await
        .unwrap();

    assert_eq!(
        file_names(tmp.path()),
        vec!["ds.maxrh_extended.bin", "ds.maxrh_short.bin"]
    );
    assert_eq!(fs::read(tmp.path().join("ds.maxrh_short.bin")).unwrap(), b"short");
}

#[tokio::test]
async fn test_purge_removes_files_only() {
    let tmp = temp_test_dir();
    let cache = ScratchCache::new(tmp.path());
    fs::write(tmp.path().join("a.bin"), b"a").unwrap();
    fs::write(tmp.path().join("a.bin.idx"), b"idx").unwrap();
    fs::create_dir(tmp.path().join("keep")).unwrap();

    assert_eq!(cache.purge().await, 2);
    assert_eq!(file_names(tmp.path()), vec!["keep"]);
}

#[tokio::test]
async fn test_purge_of_missing_directory_is_silent() {
    let tmp = temp_test_dir();
    let cache = ScratchCache::new(tmp.path().join("never-created"));

    assert_eq!(cache.purge().await, 0);
}

#[tokio::test]
async fn test_remove_files_with_suffix() {
    let tmp = temp_test_dir();
    let cache = ScratchCache::new(tmp.path());
    fs::write(tmp.path().join("ds.wspd_short.bin"), b"grib").unwrap();
    fs::write(tmp.path().join("ds.wspd_short.bin.idx"), b"idx").unwrap();
    fs::write(tmp.path().join("ds.wspd_extended.bin.idx"), b"idx").unwrap();

    assert_eq!(cache.remove_files_with_suffix(".idx").await, 2);
    assert_eq!(file_names(tmp.path()), vec!["ds.wspd_short.bin"]);
}
