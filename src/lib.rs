//! sstlite is a read-oriented storage engine core: an immutable sorted
//! string table in the LevelDB v1 on-disk format, the probabilistic skip
//! list that stages writes in memory, and the bloom filter that
//! short-circuits table lookups.

pub mod bloom;
pub mod byteutils;
pub mod collections;
pub mod comparator;
pub mod error;
pub mod hash;
mod ioutils;
pub mod memory;
pub mod sstable;

pub type Result<T> = std::result::Result<T, error::SSTLiteError>;

pub use error::SSTLiteError;
pub use sstable::table_reader::TableReader;
pub use sstable::table_writer::TableWriter;
