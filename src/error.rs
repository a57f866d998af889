use std::io;

#[derive(thiserror::Error, Debug)]
pub enum SSTLiteError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Snappy(#[from] snap::Error),

    /// Key absent from the table or the in-memory index.
    #[error("key not found")]
    NotFound,

    /// The encode or decode target lacks room for the value.
    #[error("buffer too small")]
    BufferTooSmall,

    /// A varint ran past ten bytes or overflowed 64 bits.
    #[error("value is not 64 bits")]
    NotU64,

    #[error("wrong table format")]
    WrongTableFormat,

    /// Short read against the length a block handle promised.
    #[error("block read corruption")]
    BlockReadCorruption,

    #[error("block checksum mismatch")]
    BlockCRC32Corruption,

    #[error("wrong compression format")]
    WrongCompressionFormat,

    #[error("not implemented")]
    NotImplemented,

    /// Reserved for the transaction surface layered on top of this crate:
    /// a transaction that was already committed or rolled back.
    #[error("transaction has already been committed or rolled back")]
    TxDone,
}
