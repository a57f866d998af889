use crate::byteutils::{put_uvarint, u64_from_le_bytes, uvarint};
use crate::error::SSTLiteError;
use crate::sstable::{FOOTER_ENCODED_LENGTH, MAX_ENCODED_LENGTH, TABLE_MAGIC_NUMBER};
use crate::Result;

/// Locates a byte range in the table file. `size` excludes the 5-byte block
/// trailer stored after the range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHandle {
    pub offset: u64,
    pub size: u64,
}

impl BlockHandle {
    pub fn new(offset: u64, size: u64) -> BlockHandle {
        BlockHandle { offset, size }
    }

    /// Encodes into `buf` as two varints and returns the number of bytes
    /// written. `buf` must hold at least [`MAX_ENCODED_LENGTH`] bytes.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < MAX_ENCODED_LENGTH {
            return Err(SSTLiteError::BufferTooSmall);
        }
        let n = put_uvarint(buf, self.offset);
        let m = put_uvarint(&mut buf[n..], self.size);
        Ok(n + m)
    }

    /// Decodes from the front of `buf`, returning the handle and the number
    /// of bytes read.
    pub fn decode(buf: &[u8]) -> Result<(BlockHandle, usize)> {
        let (offset, n) = uvarint(buf)?;
        let (size, m) = uvarint(&buf[n..])?;
        Ok((BlockHandle { offset, size }, n + m))
    }
}

/// Fixed 48-byte table footer: the meta index and index handles, zero
/// padding, and the format magic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Footer {
    pub meta_index_handle: BlockHandle,
    pub block_index_handle: BlockHandle,
}

impl Footer {
    pub fn new(meta_index_handle: BlockHandle, block_index_handle: BlockHandle) -> Footer {
        Footer {
            meta_index_handle,
            block_index_handle,
        }
    }

    /// Encodes into `buf`, which must hold at least
    /// [`FOOTER_ENCODED_LENGTH`] bytes. Always writes exactly that many.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < FOOTER_ENCODED_LENGTH {
            return Err(SSTLiteError::BufferTooSmall);
        }
        buf[..FOOTER_ENCODED_LENGTH].fill(0);

        let mut pos = self.meta_index_handle.encode(buf)?;
        pos += self.block_index_handle.encode(&mut buf[pos..])?;
        debug_assert!(pos <= 2 * MAX_ENCODED_LENGTH);

        buf[40..48].copy_from_slice(&TABLE_MAGIC_NUMBER.to_le_bytes());
        Ok(FOOTER_ENCODED_LENGTH)
    }

    /// Decodes a footer; a wrong magic number is `WrongTableFormat`.
    pub fn decode(buf: &[u8]) -> Result<Footer> {
        if buf.len() < FOOTER_ENCODED_LENGTH {
            return Err(SSTLiteError::BufferTooSmall);
        }

        let (meta_index_handle, n) = BlockHandle::decode(buf)?;
        let (block_index_handle, _) = BlockHandle::decode(&buf[n..])?;

        let magic = u64_from_le_bytes(&buf[40..48]);
        if magic != TABLE_MAGIC_NUMBER {
            return Err(SSTLiteError::WrongTableFormat);
        }

        Ok(Footer {
            meta_index_handle,
            block_index_handle,
        })
    }
}
