use std::io;

/// Value written by the "fill rest of line" code.
const FILL_BYTE: u8 = 0x00;

fn invalid(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn take<'a>(input: &'a [u8], pos: &mut usize, len: usize) -> io::Result<&'a [u8]> {
    let data = input
        .get(*pos..*pos + len)
        .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "band data ends early"))?;
    *pos += len;
    Ok(data)
}

/// Decodes `num_bytes` bytes of line-repeat compressed rows.
pub fn decode_line_repeat(
    input: &[u8],
    chunk_size: u8,
    bytes_per_line: u32,
    num_bytes: u64,
) -> io::Result<Vec<u8>> {
    let chunk = chunk_size as usize;
    let line_len = bytes_per_line as usize;
    if num_bytes == 0 {
        return match input.is_empty() {
            true => Ok(Vec::new()),
            false => Err(invalid("trailing bytes after the last line")),
        };
    }
    if chunk == 0 || line_len == 0 || line_len % chunk != 0 {
        return Err(invalid("bytes_per_line must be multiple of chunk_size"));
    }
    if num_bytes % bytes_per_line as u64 != 0 {
        return Err(invalid("num_bytes must be multiple of bytes_per_line"));
    }
    let total = usize::try_from(num_bytes).map_err(|_| invalid("band is too large"))?;
    let mut out = Vec::new();
    out.try_reserve(total)?;
    let mut line = vec![0u8; line_len];
    let mut pos = 0;
    while out.len() < total {
        let repeat = take(input, &mut pos, 1)?[0];
        let mut start = 0;
        while start < line_len {
            let code = take(input, &mut pos, 1)?[0];
            match code {
                0x00..=0x7f => {
                    // one chunk, repeated
                    let count = code as usize + 1;
                    if line_len - start < count * chunk {
                        return Err(invalid("invalid block header"));
                    }
                    let pixel = take(input, &mut pos, chunk)?;
                    for _ in 0..count {
                        line[start..start + chunk].copy_from_slice(pixel);
                        start += chunk;
                    }
                }
                0x80 => {
                    line[start..].fill(FILL_BYTE);
                    start = line_len;
                }
                _ => {
                    let len = (!code as usize + 2) * chunk;
                    if line_len - start < len {
                        return Err(invalid("invalid block header"));
                    }
                    line[start..start + len].copy_from_slice(take(input, &mut pos, len)?);
                    start += len;
                }
            }
        }
        let lines = repeat as usize + 1;
        if (total - out.len()) < lines * line_len {
            return Err(invalid("line repeat runs past the band"));
        }
        for _ in 0..lines {
            out.extend_from_slice(&line);
        }
    }
    if pos != input.len() {
        return Err(invalid("trailing bytes after the last line"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{CompressedRasterEncoder, RasterEncoderExt};
    use std::io::Write;

    #[test]
    fn test_decode_repeated_lines() {
        let encoded = [0xff, 0x00, 0xcc, 0xcc, 0x2b, 0x00, 0xcc, 0xcc];
        let decoded = decode_line_repeat(&encoded, 2, 2, 600).unwrap();
        assert_eq!(decoded, vec![0xcc; 600]);
    }

    #[test]
    fn test_decode_encoder_output() {
        let mut line = Vec::new();
        for i in 0..24u8 {
            line.extend_from_slice(&[i / 4, 0x10, 0x20, 0x30]);
        }
        let mut data = line.clone();
        data.extend_from_slice(&line);
        data.extend_from_slice(&[0x7f; 96]);
        let mut encoder =
            CompressedRasterEncoder::new(Vec::<u8>::new(), 4, 96, data.len() as u64).unwrap();
        encoder.write_all(&data).unwrap();
        let encoded = encoder.try_consume().unwrap();
        assert_eq!(
            decode_line_repeat(&encoded, 4, 96, data.len() as u64).unwrap(),
            data
        );
    }

    #[test]
    fn test_fill_code() {
        let encoded = [0x00, 0x00, 0x09, 0x80];
        assert_eq!(
            decode_line_repeat(&encoded, 1, 4, 4).unwrap(),
            vec![0x09, 0, 0, 0]
        );
    }

    #[test]
    fn test_invalid_input() {
        // run longer than the line
        assert!(decode_line_repeat(&[0x00, 0x05, 0x01], 1, 4, 4).is_err());
        // truncated literal
        assert!(decode_line_repeat(&[0x00, 0xfd, 0x01, 0x02], 1, 4, 4).is_err());
        // line repeat past the band
        assert!(decode_line_repeat(&[0x01, 0x03, 0x01], 1, 4, 4).is_err());
        // trailing garbage
        assert!(decode_line_repeat(&[0x00, 0x03, 0x01, 0x00], 1, 4, 4).is_err());
        assert!(decode_line_repeat(&[0x00, 0x01, 0x01], 2, 3, 3).is_err());
    }
}
