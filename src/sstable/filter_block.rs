use crate::bloom::BloomFilter;
use crate::sstable::block::Block;

/// Meta-index key under which a table announces its filter block.
pub(crate) fn meta_key(filter_name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity("filter.".len() + filter_name.len());
    key.extend_from_slice(b"filter.");
    key.extend_from_slice(filter_name.as_bytes());
    key
}

/// Wraps a fetched filter block as a queryable filter. The block bytes are
/// the filter encoding itself; a too-short block yields a filter that
/// matches nothing, which the reader treats as "no filter".
pub(crate) fn decode(block: Block) -> BloomFilter {
    BloomFilter::from_bytes(block.into_data())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_key() {
        assert_eq!(meta_key("Bloom Filter"), b"filter.Bloom Filter".to_vec());
    }

    #[test]
    fn test_decode_round_trip() {
        let keys: Vec<&[u8]> = vec![b"hello", b"world"];
        let filter = BloomFilter::new(&keys, 10);
        let restored = decode(Block::new(filter.as_bytes().to_vec()));
        assert!(restored.key_may_match(b"hello"));
        assert!(restored.key_may_match(b"world"));
        assert!(!restored.key_may_match(b"foo"));
    }
}
