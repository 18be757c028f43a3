use std::io::{self, Write};

/// A writer adapter that encodes exactly the number of raster bytes it was created for.
pub trait RasterEncoder<W>: Write
where
    W: Write,
{
    fn bytes_remaining(&self) -> u64;
    fn into_inner(self) -> W;
}

pub trait RasterEncoderExt<W>: RasterEncoder<W>
where
    W: Write,
{
    /// Consumes the encoder and returns the underlying writer if all bytes have been written.
    fn try_consume(self) -> io::Result<W>
    where
        Self: Sized,
    {
        if self.bytes_remaining() == 0 {
            Ok(self.into_inner())
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Not all bytes have been written",
            ))
        }
    }
}

impl<E, W> RasterEncoderExt<W> for E
where
    E: RasterEncoder<W>,
    W: Write,
{
}
