use crate::Result;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Seek, SeekFrom, Write};

/// Buffered writer that tracks its write offset, so block handles can be
/// recorded without a seek round trip.
pub struct BufWriterWithPos<W: Write + Seek> {
    writer: BufWriter<W>,
    pub pos: u64,
}

impl BufWriterWithPos<File> {
    pub fn sync_data(&mut self) -> Result<()> {
        self.writer.get_mut().sync_data()?;
        Ok(())
    }
}

impl<W: Write + Seek> BufWriterWithPos<W> {
    pub fn new(mut inner: W) -> Result<Self> {
        let pos = inner.seek(SeekFrom::End(0))?;
        Ok(BufWriterWithPos {
            writer: BufWriter::new(inner),
            pos,
        })
    }
}

impl<W: Write + Seek> Write for BufWriterWithPos<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = self.writer.write(buf)?;
        self.pos += len as u64;
        Ok(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
