use super::{CompressedRasterEncoder, RasterEncoder, UncompressedRasterEncoder};
use derive_more::From;
use num_enum::TryFromPrimitive;
use std::io::{self, Write};

/// Row codec of a RasterStream band, as recorded in the band header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum BandCodec {
    Uncompressed = 0,
    LineRepeat = 1,
}

impl BandCodec {
    pub fn encoder<W>(
        self,
        writer: W,
        chunk_size: u8,
        bytes_per_line: u64,
        num_bytes: u64,
    ) -> io::Result<BandEncoder<W>> {
        Ok(match self {
            BandCodec::Uncompressed => UncompressedRasterEncoder::new(writer, num_bytes).into(),
            BandCodec::LineRepeat => {
                CompressedRasterEncoder::new(writer, chunk_size, bytes_per_line, num_bytes)?.into()
            }
        })
    }
}

#[derive(From)]
pub enum BandEncoder<W> {
    Uncompressed(UncompressedRasterEncoder<W>),
    Compressed(CompressedRasterEncoder<W>),
}

impl<W> RasterEncoder<W> for BandEncoder<W>
where
    W: Write,
{
    fn bytes_remaining(&self) -> u64 {
        match self {
            BandEncoder::Uncompressed(encoder) => encoder.bytes_remaining(),
            BandEncoder::Compressed(encoder) => encoder.bytes_remaining(),
        }
    }

    fn into_inner(self) -> W {
        match self {
            BandEncoder::Uncompressed(encoder) => encoder.into_inner(),
            BandEncoder::Compressed(encoder) => encoder.into_inner(),
        }
    }
}

impl<W> Write for BandEncoder<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BandEncoder::Uncompressed(encoder) => encoder.write(buf),
            BandEncoder::Compressed(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BandEncoder::Uncompressed(encoder) => encoder.flush(),
            BandEncoder::Compressed(encoder) => encoder.flush(),
        }
    }
}
