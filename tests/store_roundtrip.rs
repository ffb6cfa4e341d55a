//! Integration tests for the recipe metadata store
//!
//! Writes stores to temporary directories and reads them back through the
//! memory-mapped reader.

use larder::store::{encode, FILE_DATA, FILE_OFFSETS};
use larder::{
    LarderError, OpenMode, RecipeMetadata, RecipeRecord, StoreConfig, StoreReader, StoreWriter,
};
use std::fs;
use tempfile::TempDir;

fn recipe(id: u64) -> RecipeRecord {
    RecipeRecord::new(
        id,
        format!("Recipe {}", id),
        format!("recipe-{}", id),
        format!("https://example.com/recipes/{}", id),
        "example.com",
    )
    .with_ingredients([format!("{} eggs", id % 7), "1 cup flour".to_string()])
    .with_instructions(["Mix everything.", "Bake for 20 minutes."])
    .with_total_time(20 + id as u32)
}

fn write_store(dir: &TempDir, ids: impl IntoIterator<Item = u64>) -> u32 {
    let mut writer = StoreWriter::open(dir.path()).unwrap();
    for id in ids {
        writer.append(&recipe(id)).unwrap();
    }
    writer.close().unwrap()
}

#[test]
fn test_roundtrip_every_field() {
    let tmp = TempDir::new().unwrap();
    let records: Vec<RecipeRecord> = (1..=50).map(recipe).collect();

    let mut writer = StoreWriter::open(tmp.path()).unwrap();
    for record in &records {
        writer.append(record).unwrap();
    }
    assert_eq!(writer.close().unwrap(), 50);

    let reader = StoreReader::open(tmp.path()).unwrap();
    assert_eq!(reader.len(), 50);
    for record in &records {
        let view = reader.find_by_id(record.recipe_id).unwrap().unwrap();
        assert_eq!(view.recipe_id(), record.recipe_id);
        assert_eq!(view.name(), record.name);
        assert_eq!(view.slug(), record.slug);
        assert_eq!(view.crawl_url(), record.crawl_url);
        assert_eq!(view.site_name(), record.site_name);
        assert_eq!(view.instructions(), record.instructions);
        assert_eq!(view.ingredients(), record.ingredients);
        assert_eq!(view.num_ingredients(), record.num_ingredients);
        assert_eq!(view.total_time(), record.total_time);
        assert_eq!(view.calories(), None);
        assert_eq!(&view.to_record(), record);
    }
}

#[test]
fn test_missing_ids() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=10);
    let reader = StoreReader::open(tmp.path()).unwrap();

    assert!(reader.find_by_id(11).unwrap().is_none());
    assert!(reader.find_by_id(0).unwrap().is_none());
    assert!(!reader.contains(42));
}

#[test]
fn test_find_all_preserves_input_order() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=10);
    let reader = StoreReader::open(tmp.path()).unwrap();

    let found = reader.find_all_by_id([7, 99, 2, 5, 100]).unwrap();
    let ids: Vec<u64> = found.iter().map(|view| view.recipe_id()).collect();
    assert_eq!(ids, vec![7, 2, 5]);
}

#[test]
fn test_header_count_after_close() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(write_store(&tmp, 1..=3), 3);

    let index = fs::read(tmp.path().join(FILE_OFFSETS)).unwrap();
    assert_eq!(&index[..4], &3u32.to_le_bytes());
    assert_eq!(index.len(), 4 + 3 * 12);
}

#[test]
fn test_empty_store() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(write_store(&tmp, []), 0);

    let reader = StoreReader::open(tmp.path()).unwrap();
    assert!(reader.is_empty());
    assert_eq!(reader.data_len(), 0);
    assert_eq!(reader.iter().count(), 0);
}

#[test]
fn test_open_existing_store_fails() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=2);

    assert!(matches!(
        StoreWriter::open(tmp.path()),
        Err(LarderError::AlreadyExists(_))
    ));
}

#[test]
fn test_reader_path_errors() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        StoreReader::open(tmp.path().join("nope")),
        Err(LarderError::PathNotFound(_))
    ));

    let file = tmp.path().join("file");
    fs::write(&file, b"not a store").unwrap();
    assert!(matches!(
        StoreReader::open(&file),
        Err(LarderError::NotADirectory(_))
    ));
}

#[test]
fn test_create_mode_truncates() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=5);

    let mut writer =
        StoreWriter::open_with(tmp.path(), OpenMode::Create, StoreConfig::default()).unwrap();
    writer.append(&recipe(100)).unwrap();
    assert_eq!(writer.close().unwrap(), 1);

    let reader = StoreReader::open(tmp.path()).unwrap();
    assert_eq!(reader.ids().collect::<Vec<_>>(), vec![100]);
}

#[test]
fn test_append_mode_continues_store() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=5);

    let mut writer =
        StoreWriter::open_with(tmp.path(), OpenMode::Append, StoreConfig::default()).unwrap();
    assert_eq!(writer.len(), 5);
    for id in 6..=8 {
        writer.append(&recipe(id)).unwrap();
    }
    assert_eq!(writer.close().unwrap(), 8);

    let reader = StoreReader::open(tmp.path()).unwrap();
    assert_eq!(reader.len(), 8);
    for id in 1..=8 {
        assert_eq!(reader.find_by_id(id).unwrap().unwrap().to_record(), recipe(id));
    }
}

#[test]
fn test_create_or_append() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("store");

    for round in 1..=3u64 {
        let mut writer =
            StoreWriter::open_with(&dir, OpenMode::CreateOrAppend, StoreConfig::default())
                .unwrap();
        writer.append(&recipe(round)).unwrap();
        assert_eq!(writer.close().unwrap() as u64, round);
    }

    let reader = StoreReader::open(&dir).unwrap();
    assert_eq!(reader.ids().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_append_mode_requires_store() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        StoreWriter::open_with(tmp.path(), OpenMode::Append, StoreConfig::default()),
        Err(LarderError::PathNotFound(_))
    ));
}

#[test]
fn test_capacity_exceeded() {
    let tmp = TempDir::new().unwrap();
    let record_len = encode(&recipe(1)).unwrap().len() as u64;
    let config = StoreConfig::default().with_max_data_bytes(record_len * 2);

    let mut writer = StoreWriter::open_with(tmp.path(), OpenMode::Create, config).unwrap();
    writer.append(&recipe(1)).unwrap();
    writer.append(&recipe(1)).unwrap();
    let err = writer.append(&recipe(1)).unwrap_err();
    assert!(matches!(err, LarderError::CapacityExceeded { .. }));
    assert_eq!(writer.close().unwrap(), 2);
}

#[test]
fn test_truncated_index_is_corrupt() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=4);

    let path = tmp.path().join(FILE_OFFSETS);
    let index = fs::read(&path).unwrap();
    fs::write(&path, &index[..index.len() - 5]).unwrap();

    assert!(matches!(
        StoreReader::open(tmp.path()),
        Err(LarderError::CorruptStore(_))
    ));
}

#[test]
fn test_unfinalized_header_is_corrupt() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=3);

    // header as left by a writer that never reached close
    let path = tmp.path().join(FILE_OFFSETS);
    let mut index = fs::read(&path).unwrap();
    index[..4].copy_from_slice(&0u32.to_le_bytes());
    fs::write(&path, &index).unwrap();

    assert!(matches!(
        StoreReader::open(tmp.path()),
        Err(LarderError::CorruptStore(_))
    ));
}

#[test]
fn test_truncated_data_is_corrupt() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=4);

    let path = tmp.path().join(FILE_DATA);
    let data = fs::read(&path).unwrap();
    let first_len = encode(&recipe(1)).unwrap().len();
    fs::write(&path, &data[..first_len]).unwrap();

    assert!(matches!(
        StoreReader::open(tmp.path()),
        Err(LarderError::CorruptStore(_))
    ));
}

#[test]
fn test_decode_failure_stays_local() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=3);

    // Flip the last byte of the last record
    let path = tmp.path().join(FILE_DATA);
    let mut data = fs::read(&path).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0xff;
    fs::write(&path, &data).unwrap();

    let reader = StoreReader::open(tmp.path()).unwrap();
    assert!(matches!(
        reader.find_by_id(3),
        Err(LarderError::Decode { .. })
    ));
    assert_eq!(reader.find_by_id(1).unwrap().unwrap().to_record(), recipe(1));
    assert_eq!(reader.find_by_id(2).unwrap().unwrap().to_record(), recipe(2));
    assert!(reader.find_all_by_id([1, 3]).is_err());
}

#[test]
fn test_reader_shared_across_threads() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp, 1..=100);
    let reader = StoreReader::open(tmp.path()).unwrap();

    std::thread::scope(|scope| {
        for t in 0..4u64 {
            let reader = &reader;
            scope.spawn(move || {
                for id in (1..=100).filter(|id| id % 4 == t) {
                    let view = reader.find_by_id(id).unwrap().unwrap();
                    assert_eq!(view.slug(), format!("recipe-{}", id));
                }
            });
        }
    });
}
