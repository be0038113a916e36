#![cfg(feature = "tokio")]

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use predictable_zip::{
    compress::tokio::finish_async, create_predictable_zip, create_predictable_zip_async,
    ArchiveError, PredictableZip,
};

mod common;
use common::*;

#[tokio::test]
async fn archive_tokio_reference_hashes() -> Result<(), ArchiveError> {
    let nested = create_predictable_zip_async(HashMap::from([
        ("test.txt", "Hello World"),
        ("folder/nested.txt", "Nested content"),
    ]))
    .await?;
    assert_eq!(md5_hex(&nested), NESTED_ARCHIVE_MD5);

    let binary = create_predictable_zip_async([("test.bin", vec![0u8, 1, 2, 3])]).await?;
    assert_eq!(md5_hex(&binary), BINARY_ARCHIVE_MD5);

    let empty = create_predictable_zip_async(Vec::<(String, Vec<u8>)>::new()).await?;
    assert_eq!(md5_hex(&empty), EMPTY_ARCHIVE_MD5);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn archive_tokio_many_entries_match_sequential() -> Result<(), ArchiveError> {
    let big = big_payload();
    let files: Vec<(String, Vec<u8>)> = (0..64)
        .rev()
        .map(|i| (format!("dir{}/file{:02}.bin", i % 5, i), big[..1000 * (i + 1)].to_vec()))
        .collect();

    let sequential = create_predictable_zip(files.clone())?;
    let parallel = create_predictable_zip_async(files).await?;

    assert_eq!(parallel.len(), sequential.len());
    assert!(parallel == sequential, "parallel archive differs from the sequential one");
    assert_eq!(unzip_all(&parallel).len(), 64);
    Ok(())
}

#[tokio::test]
async fn archive_tokio_builder() -> Result<(), ArchiveError> {
    let mut builder = PredictableZip::new();
    builder.add("b.txt", "content b")?;
    builder.add("a.txt", "content a")?;

    assert_eq!(md5_hex(&finish_async(builder).await?), SORTED_ARCHIVE_MD5);
    Ok(())
}
