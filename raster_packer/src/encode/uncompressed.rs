use super::RasterEncoder;
use std::io::{self, Write};

pub struct UncompressedRasterEncoder<W> {
    writer: W,
    bytes_remaining: u64,
}

impl<W> UncompressedRasterEncoder<W> {
    pub fn new(writer: W, num_bytes: u64) -> Self {
        Self {
            writer,
            bytes_remaining: num_bytes,
        }
    }
}

impl<W> RasterEncoder<W> for UncompressedRasterEncoder<W>
where
    W: Write,
{
    fn bytes_remaining(&self) -> u64 {
        self.bytes_remaining
    }

    fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> Write for UncompressedRasterEncoder<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let buf_size = self.bytes_remaining.min(buf.len() as u64) as usize;
        if buf_size == 0 {
            return Ok(0);
        }
        let total_write = self.writer.write(&buf[..buf_size])?;
        self.bytes_remaining = self.bytes_remaining.saturating_sub(total_write as u64);
        Ok(total_write)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
