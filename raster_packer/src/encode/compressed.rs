use super::RasterEncoder;
use std::io::{self, Write};

/// Line-repeat and chunk run-length encoder.
///
/// Every line starts with a byte counting how many times it is repeated after its first
/// occurrence. The line content follows as blocks of `chunk_size` byte chunks: a tag in
/// `0..=127` repeats the next chunk `tag + 1` times, a tag in `129..=255` is followed by
/// `257 - tag` literal chunks.
pub struct CompressedRasterEncoder<W> {
    writer: W,
    chunk_size: u8,
    line_size: usize,
    bytes_remaining: u64,
    line_buffer: Vec<u8>,
    line_repeat: Option<u8>,
    current_line: Vec<u8>,
}

impl<W> CompressedRasterEncoder<W> {
    pub fn new(writer: W, chunk_size: u8, bytes_per_line: u64, num_bytes: u64) -> io::Result<Self> {
        if bytes_per_line != 0 && (chunk_size == 0 || bytes_per_line % chunk_size as u64 != 0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "bytes_per_line must be multiple of chunk_size",
            ));
        }
        if (num_bytes != 0) && (bytes_per_line == 0 || num_bytes % bytes_per_line != 0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "num_bytes must be multiple of bytes_per_line",
            ));
        }
        // with `num_bytes` = 0 nothing is ever buffered
        let line_size = usize::try_from(bytes_per_line.min(num_bytes)).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "bytes_per_line is too large")
        })?;
        let mut line_buffer = Vec::new();
        line_buffer.try_reserve(line_size)?;
        let mut current_line = Vec::new();
        current_line.try_reserve(line_size)?;
        Ok(Self {
            writer,
            chunk_size,
            line_size,
            bytes_remaining: num_bytes,
            line_buffer,
            line_repeat: None,
            current_line,
        })
    }
}

impl<W> RasterEncoder<W> for CompressedRasterEncoder<W>
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

fn write_line<W: Write>(
    writer: &mut W,
    line: &[u8],
    chunk_size: usize,
    line_repeat: u8,
) -> io::Result<()> {
    writer.write_all(&[line_repeat])?;
    let mut start = 0;
    while start < line.len() {
        let mut chunks = line[start..].chunks(chunk_size);
        let Some(first_chunk) = chunks.next() else {
            break;
        };
        match chunks.next() {
            Some(second_chunk) if first_chunk == second_chunk => {
                let mut tag = 1u8;
                for chunk in chunks {
                    if chunk != first_chunk || tag >= 0x7f {
                        break;
                    }
                    tag += 1;
                }
                writer.write_all(&[tag])?;
                writer.write_all(first_chunk)?;
                start += chunk_size * (tag as usize + 1);
            }
            Some(second_chunk) => {
                let mut count = 1u8;
                let mut prev_chunk = second_chunk;
                for chunk in chunks {
                    if chunk == prev_chunk {
                        break;
                    }
                    count += 1;
                    prev_chunk = chunk;
                    if count >= 0x7f {
                        break;
                    }
                }
                let end = start + chunk_size * count as usize;
                writer.write_all(&[(!count).wrapping_add(2)])?;
                writer.write_all(&line[start..end])?;
                start = end;
            }
            None => {
                // only one chunk remaining
                writer.write_all(&[0])?;
                writer.write_all(first_chunk)?;
                start += chunk_size;
            }
        }
    }
    Ok(())
}

impl<W> CompressedRasterEncoder<W>
where
    W: Write,
{
    fn flush_line_buffer(&mut self) -> io::Result<()> {
        if let Some(line_repeat) = self.line_repeat.take() {
            write_line(
                &mut self.writer,
                &self.line_buffer,
                self.chunk_size as usize,
                line_repeat,
            )?;
        }
        Ok(())
    }

    fn complete_line(&mut self) -> io::Result<()> {
        match self.line_repeat {
            Some(line_repeat) if line_repeat < u8::MAX && self.current_line == self.line_buffer => {
                self.line_repeat = Some(line_repeat + 1);
            }
            _ => {
                self.flush_line_buffer()?;
                std::mem::swap(&mut self.line_buffer, &mut self.current_line);
                self.line_repeat = Some(0);
            }
        }
        self.current_line.clear();
        if self.bytes_remaining == 0 {
            self.flush_line_buffer()?;
        }
        Ok(())
    }
}

impl<W> Write for CompressedRasterEncoder<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line_size = self.line_size;
        let mut buf = &buf[..self.bytes_remaining.min(buf.len() as u64) as usize];
        let mut total_write = 0;
        while !buf.is_empty() {
            let bytes_to_write = buf.len().min(line_size - self.current_line.len());
            self.current_line.extend_from_slice(&buf[..bytes_to_write]);
            buf = &buf[bytes_to_write..];
            total_write += bytes_to_write;
            self.bytes_remaining -= bytes_to_write as u64;
            if self.current_line.len() == line_size {
                self.complete_line()?;
            }
        }
        Ok(total_write)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::RasterEncoderExt;

    fn compress(data: &[u8], chunk_size: u8, bytes_per_line: u64) -> Vec<u8> {
        let mut encoder =
            CompressedRasterEncoder::new(Vec::new(), chunk_size, bytes_per_line, data.len() as u64)
                .unwrap();
        encoder.write_all(data).unwrap();
        encoder.try_consume().unwrap()
    }

    #[test]
    fn test_compress_cmyk_lines() {
        let solid = [1, 2, 3, 4].repeat(4);
        let ramp: Vec<u8> = (0..16).collect();
        let mixed = [9, 9, 9, 9, 1, 2, 3, 4, 5, 6, 7, 8, 5, 6, 7, 8];
        let data = [solid.clone(), solid, ramp, mixed.to_vec()].concat();
        const COMPRESSED_DATA: &[u8] = &[
            0x01, 0x03, 0x01, 0x02, 0x03, 0x04, 0x00, 0xfe, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05,
            0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x00, 0x0c, 0x0d, 0x0e, 0x0f, 0x00, 0xff, 0x09,
            0x09, 0x09, 0x09, 0x01, 0x02, 0x03, 0x04, 0x01, 0x05, 0x06, 0x07, 0x08,
        ];
        assert_eq!(compress(&data, 4, 16), COMPRESSED_DATA);
    }

    #[test]
    fn test_line_repeat_saturates() {
        const COMPRESSED_DATA: &[u8] = &[0xff, 0x00, 0xcc, 0xcc, 0x2b, 0x00, 0xcc, 0xcc];
        assert_eq!(compress(&[0xcc; 600], 2, 2), COMPRESSED_DATA);
    }

    #[test]
    fn test_split_writes() {
        let data: Vec<u8> = (0..96u8).map(|i| i / 7).collect();
        let mut encoder = CompressedRasterEncoder::new(Vec::new(), 3, 24, 96).unwrap();
        for part in data.chunks(5) {
            encoder.write_all(part).unwrap();
        }
        assert_eq!(encoder.try_consume().unwrap(), compress(&data, 3, 24));
    }

    #[test]
    fn test_compress_zero() {
        assert_eq!(compress(&[], 0, 0), Vec::<u8>::new());
    }

    #[test]
    fn test_reject_misaligned_chunks() {
        assert!(CompressedRasterEncoder::new(Vec::<u8>::new(), 4, 10, 20).is_err());
        assert!(CompressedRasterEncoder::new(Vec::<u8>::new(), 1, 10, 25).is_err());
    }
}
