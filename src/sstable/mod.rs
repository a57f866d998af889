//! Sorted String Table, an immutable sorted map stored on disk.
//!
//! # Table layout
//!
//! Key/value pairs live in prefix-compressed data blocks at the front of the
//! file. Every stored block, data or not, carries a 5-byte trailer holding a
//! compression tag and a masked CRC-32C of the stored bytes plus the tag.
//!
//! ```text
//! +-------------------------+ (offset 0)
//! | Data Block 1            |<-+
//! +-------------------------+  |
//! | ...                     |  |
//! +-------------------------+  |
//! | Data Block n            |<-+
//! +-------------------------+  |
//! | Filter Block            |<---+
//! +-------------------------+  | |
//! | Meta Index Block        |----+
//! +-------------------------+  |
//! | Index Block             |--+
//! +-------------------------+
//! | Footer (48 bytes)       |
//! +-------------------------+
//! ```
//!
//! The footer stores the handles of the meta index and index blocks as two
//! varint pairs, zero padding up to byte 40, and the 8-byte little-endian
//! magic number (the leading 64 bits of the SHA-1 of
//! `"http://code.google.com/p/leveldb/"`).
//!
//! ## Data block
//!
//! ```text
//! +----------------------+
//! | Shared (varint32)    |
//! +----------------------+
//! | Unshared (varint32)  |
//! +----------------------+
//! | Value len (varint32) |
//! +----------------------+
//! | Key delta            | -> Unshared bytes of the key
//! +----------------------+
//! | Value                |
//! +----------------------+
//! ```
//!
//! Entries drop the key prefix shared with the previous entry. Once every
//! `block_restart_interval` entries the full key is stored instead; such a
//! restart point has `Shared == 0`. The block ends with the restart offsets
//! (`u32` each, little-endian) followed by the restart count, which is what
//! intra-block binary search runs over.
//!
//! Index and meta index blocks use the same encoding with every entry its
//! own restart point; their values are serialized block handles.

use crate::byteutils::MAX_VARINT_LEN64;
use crate::error::SSTLiteError;
use crate::Result;

pub mod block;
pub mod block_builder;
pub(crate) mod filter_block;
pub mod footer;
pub mod index_block;
pub mod options;
pub mod table_reader;
pub mod table_writer;

/// LevelDB format magic number: leading 64 bits of
/// `echo http://code.google.com/p/leveldb/ | sha1sum`.
pub const TABLE_MAGIC_NUMBER: u64 = 0xdb4775248b80fb57;

/// 1-byte compression tag plus 32-bit checksum.
pub const BLOCK_TRAILER_SIZE: usize = 5;

/// Maximum encoded length of a block handle.
pub const MAX_ENCODED_LENGTH: usize = 2 * MAX_VARINT_LEN64;

/// Encoded length of a footer.
pub const FOOTER_ENCODED_LENGTH: usize = 2 * MAX_ENCODED_LENGTH + 8;

/// Compression applied to stored blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Snappy,
}

impl Compression {
    /// Wire tag stored in the block trailer.
    pub fn tag(self) -> u8 {
        match self {
            Compression::None => 0,
            Compression::Snappy => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Compression> {
        match tag {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Snappy),
            _ => Err(SSTLiteError::WrongCompressionFormat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_tags() {
        assert_eq!(Compression::None.tag(), 0);
        assert_eq!(Compression::Snappy.tag(), 1);
        assert!(matches!(
            Compression::from_tag(0),
            Ok(Compression::None)
        ));
        assert!(matches!(
            Compression::from_tag(1),
            Ok(Compression::Snappy)
        ));
        assert!(matches!(
            Compression::from_tag(2),
            Err(SSTLiteError::WrongCompressionFormat)
        ));
    }
}
