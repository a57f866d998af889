use sstlite::comparator::Comparator;
use sstlite::sstable::options::Options;
use sstlite::sstable::Compression;
use sstlite::{SSTLiteError, TableReader, TableWriter};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn write_table(path: &Path, entries: &[(Vec<u8>, Vec<u8>)], options: Options) {
    let mut writer = TableWriter::new(path, options).unwrap();
    for (key, value) in entries {
        writer.add(key, value).unwrap();
    }
    writer.finish().unwrap();
}

fn numbered_entries(n: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..n)
        .map(|i| {
            (
                format!("key{:05}", i).into_bytes(),
                format!("value{:05}", i).into_bytes(),
            )
        })
        .collect()
}

fn table_path(dir: &TempDir) -> PathBuf {
    dir.path().join("0.sst")
}

#[test]
fn test_round_trip_single_block() {
    let _ = env_logger::try_init();
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let entries = vec![
        (b"hello".to_vec(), b"world".to_vec()),
        (b"school".to_vec(), b"1".to_vec()),
        (b"zebra".to_vec(), vec![]),
    ];
    let mut sorted = entries.clone();
    sorted.sort();
    write_table(&path, &sorted, Options::default());

    let table = TableReader::open(&path, Options::default()).unwrap();
    assert_eq!(table.read(b"school").unwrap(), b"1".to_vec());
    assert_eq!(table.read(b"hello").unwrap(), b"world".to_vec());
    assert_eq!(table.read(b"zebra").unwrap(), Vec::<u8>::new());
    assert!(matches!(
        table.read(b"absent"),
        Err(SSTLiteError::NotFound)
    ));
    assert!(matches!(table.read(b""), Err(SSTLiteError::NotFound)));
}

#[test]
fn test_round_trip_multi_block() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let entries = numbered_entries(1000);
    let options = Options {
        block_size: 256,
        ..Options::default()
    };
    write_table(&path, &entries, options.clone());

    let table = TableReader::open(&path, options).unwrap();
    assert!(table.block_index().len() > 1);

    for (key, value) in &entries {
        assert_eq!(&table.read(key).unwrap(), value);
    }
    for missing in ["key-1", "key00500x", "key99999", "zzz"] {
        assert!(matches!(
            table.read(missing.as_bytes()),
            Err(SSTLiteError::NotFound)
        ));
    }
}

#[test]
fn test_round_trip_snappy() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let entries = numbered_entries(500);
    let options = Options {
        block_size: 512,
        compression: Compression::Snappy,
        ..Options::default()
    };
    write_table(&path, &entries, options.clone());

    let table = TableReader::open(&path, options).unwrap();
    for (key, value) in &entries {
        assert_eq!(&table.read(key).unwrap(), value);
    }

    let scanned: Vec<(Vec<u8>, Vec<u8>)> = table
        .iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(scanned, entries);
}

#[test]
fn test_lookup_agrees_with_iteration() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let entries = numbered_entries(300);
    let options = Options {
        block_size: 128,
        ..Options::default()
    };
    write_table(&path, &entries, options.clone());

    let table = TableReader::open(&path, options).unwrap();
    let mut count = 0;
    for item in table.iter() {
        let (key, value) = item.unwrap();
        assert_eq!(table.read(&key).unwrap(), value);
        count += 1;
    }
    assert_eq!(count, entries.len());
}

#[test]
fn test_iteration_is_ordered() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let entries = numbered_entries(400);
    let options = Options {
        block_size: 100,
        ..Options::default()
    };
    write_table(&path, &entries, options.clone());

    let table = TableReader::open(&path, options).unwrap();
    let mut last: Option<Vec<u8>> = None;
    for item in table.iter() {
        let (key, _) = item.unwrap();
        if let Some(prev) = &last {
            assert!(prev < &key, "iteration out of order");
        }
        last = Some(key);
    }
}

#[test]
fn test_iterator_seek() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let entries = numbered_entries(200);
    let options = Options {
        block_size: 128,
        ..Options::default()
    };
    write_table(&path, &entries, options.clone());

    let table = TableReader::open(&path, options).unwrap();

    // Exact key.
    let mut iter = table.iter();
    assert!(iter.seek(b"key00100").unwrap());
    let (key, value) = iter.next().unwrap().unwrap();
    assert_eq!(key, b"key00100".to_vec());
    assert_eq!(value, b"value00100".to_vec());

    // Between keys: lands on the next one.
    let mut iter = table.iter();
    assert!(iter.seek(b"key00100x").unwrap());
    let (key, _) = iter.next().unwrap().unwrap();
    assert_eq!(key, b"key00101".to_vec());

    // Before the first key.
    let mut iter = table.iter();
    assert!(iter.seek(b"a").unwrap());
    let (key, _) = iter.next().unwrap().unwrap();
    assert_eq!(key, b"key00000".to_vec());

    // Past the last key.
    let mut iter = table.iter();
    assert!(!iter.seek(b"zzz").unwrap());
    assert!(iter.next().is_none());

    // Seek, then run to the end in order.
    let mut iter = table.iter();
    assert!(iter.seek(b"key00190").unwrap());
    let remaining: Vec<(Vec<u8>, Vec<u8>)> =
        iter.collect::<Result<_, _>>().unwrap();
    assert_eq!(remaining.len(), 10);
    assert_eq!(remaining[0].0, b"key00190".to_vec());
    assert_eq!(remaining[9].0, b"key00199".to_vec());
}

#[test]
fn test_crc_corruption_detected() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let entries = numbered_entries(100);
    write_table(&path, &entries, Options::default());

    // Flip one bit inside the first data block; the footer and the index
    // blocks at the tail stay intact, so open still succeeds.
    let mut contents = std::fs::read(&path).unwrap();
    contents[2] ^= 0x01;
    std::fs::write(&path, &contents).unwrap();

    let table = TableReader::open(&path, Options::default()).unwrap();
    assert!(matches!(
        table.read(b"key00000"),
        Err(SSTLiteError::BlockCRC32Corruption)
    ));
}

#[test]
fn test_verify_checksums_opt_out() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    // One entry, laid out as: shared=0, unshared=1, value_len=4, "a", "xxxx".
    write_table(
        &path,
        &[(b"a".to_vec(), b"xxxx".to_vec())],
        Options::default(),
    );

    let mut contents = std::fs::read(&path).unwrap();
    // Flip a bit inside the value bytes of the first entry.
    contents[5] ^= 0x20;
    std::fs::write(&path, &contents).unwrap();

    // Default options verify and reject.
    let table = TableReader::open(&path, Options::default()).unwrap();
    assert!(matches!(
        table.read(b"a"),
        Err(SSTLiteError::BlockCRC32Corruption)
    ));

    // The explicit opt-out returns the (corrupted) bytes without checking.
    let options = Options {
        verify_checksums: false,
        ..Options::default()
    };
    let table = TableReader::open(&path, options).unwrap();
    let value = table.read(b"a").unwrap();
    assert_eq!(value.len(), 4);
    assert_ne!(value, b"xxxx".to_vec());
}

#[test]
fn test_filter_present_and_absent() {
    let dir = TempDir::new().unwrap();

    let with_filter = dir.path().join("filtered.sst");
    let entries = numbered_entries(50);
    write_table(&with_filter, &entries, Options::default());
    let table = TableReader::open(&with_filter, Options::default()).unwrap();
    assert_eq!(table.meta_index().len(), 1);
    assert_eq!(table.read(b"key00007").unwrap(), b"value00007".to_vec());
    assert!(matches!(
        table.read(b"nope"),
        Err(SSTLiteError::NotFound)
    ));

    // A table written without a filter still opens and reads under options
    // that would use one.
    let without_filter = dir.path().join("plain.sst");
    let options = Options {
        filter_policy: false,
        ..Options::default()
    };
    write_table(&without_filter, &entries, options);
    let table = TableReader::open(&without_filter, Options::default()).unwrap();
    assert!(table.meta_index().is_empty());
    assert_eq!(table.read(b"key00007").unwrap(), b"value00007".to_vec());
    assert!(matches!(
        table.read(b"nope"),
        Err(SSTLiteError::NotFound)
    ));
}

#[test]
fn test_approximate_offsets() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let entries = numbered_entries(500);
    let options = Options {
        block_size: 128,
        ..Options::default()
    };
    write_table(&path, &entries, options.clone());

    let table = TableReader::open(&path, options).unwrap();
    assert_eq!(table.approximate_offset_of(b"a"), 0);
    assert_eq!(table.approximate_offset_of(b"key00000"), 0);

    let mut last_offset = 0;
    for (key, _) in &entries {
        let offset = table.approximate_offset_of(key);
        assert!(offset >= last_offset, "offsets must be nondecreasing");
        last_offset = offset;
    }

    let past_end = table.approximate_offset_of(b"zzz");
    assert!(past_end > last_offset);
}

#[test]
fn test_empty_table() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    write_table(&path, &[], Options::default());

    let table = TableReader::open(&path, Options::default()).unwrap();
    assert!(table.block_index().is_empty());
    assert!(matches!(
        table.read(b"anything"),
        Err(SSTLiteError::NotFound)
    ));
    assert!(table.iter().next().is_none());
}

#[test]
fn test_close_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);
    write_table(&path, &numbered_entries(10), Options::default());

    let mut table = TableReader::open(&path, Options::default()).unwrap();
    assert!(table.read(b"key00001").is_ok());
    table.close().unwrap();
    table.close().unwrap();
    assert!(matches!(
        table.read(b"key00001"),
        Err(SSTLiteError::Io(_))
    ));
}

struct ReverseComparator;

impl Comparator for ReverseComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        b.cmp(a)
    }

    fn name(&self) -> &'static str {
        "test.ReverseComparator"
    }
}

#[test]
fn test_custom_comparator() {
    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let options = Options {
        comparator: Arc::new(ReverseComparator),
        block_size: 128,
        ..Options::default()
    };

    // Increasing comparator order means decreasing bytewise order.
    let mut entries = numbered_entries(200);
    entries.reverse();
    write_table(&path, &entries, options.clone());

    let table = TableReader::open(&path, options).unwrap();
    for (key, value) in &entries {
        assert_eq!(&table.read(key).unwrap(), value);
    }

    let scanned: Vec<(Vec<u8>, Vec<u8>)> = table
        .iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(scanned, entries);
}

#[test]
fn test_randomized_round_trip() {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let dir = TempDir::new().unwrap();
    let path = table_path(&dir);

    let mut keys: Vec<Vec<u8>> = (0..2000)
        .map(|_| {
            let len = rng.gen_range(1..24);
            (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect()
        })
        .collect();
    keys.sort();
    keys.dedup();
    let entries: Vec<(Vec<u8>, Vec<u8>)> = keys
        .into_iter()
        .enumerate()
        .map(|(i, key)| (key, format!("v{}", i).into_bytes()))
        .collect();

    let options = Options {
        block_size: 512,
        compression: Compression::Snappy,
        ..Options::default()
    };
    write_table(&path, &entries, options.clone());

    let table = TableReader::open(&path, options).unwrap();
    for (key, value) in &entries {
        assert_eq!(&table.read(key).unwrap(), value);
    }

    // Probes longer than any stored key are certainly absent.
    for _ in 0..100 {
        let probe: Vec<u8> = (0..30).map(|_| rng.gen_range(b'a'..=b'z')).collect();
        assert!(matches!(
            table.read(&probe),
            Err(SSTLiteError::NotFound)
        ));
    }
}
