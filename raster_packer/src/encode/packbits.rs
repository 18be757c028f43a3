//! TIFF PackBits, the row compression of PCL3 raster mode 2.
//!
//! A header byte `n` in `0..=127` is followed by `n + 1` literal bytes, a header in
//! `129..=255` repeats the next byte `257 - n` times. `128` is a no-op.

use std::io;

const MAX_RUN: usize = 128;

/// Appends the PackBits encoding of `input` to `out`.
pub fn pack_bits(input: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < input.len() {
        let mut run = 1;
        while i + run < input.len() && run < MAX_RUN && input[i + run] == input[i] {
            run += 1;
        }
        if run >= 2 {
            out.push((1 - run as i16) as u8);
            out.push(input[i]);
            i += run;
            continue;
        }
        let start = i;
        i += 1;
        while i < input.len() && i - start < MAX_RUN {
            if i + 1 < input.len() && input[i] == input[i + 1] {
                break;
            }
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend_from_slice(&input[start..i]);
    }
}

pub fn unpack_bits(input: &[u8]) -> io::Result<Vec<u8>> {
    let truncated = || io::Error::new(io::ErrorKind::UnexpectedEof, "truncated PackBits run");
    let mut out = Vec::new();
    let mut i = 0;
    while i < input.len() {
        let header = input[i];
        i += 1;
        match header {
            0..=127 => {
                let end = i + header as usize + 1;
                out.extend_from_slice(input.get(i..end).ok_or_else(truncated)?);
                i = end;
            }
            128 => {}
            _ => {
                let byte = *input.get(i).ok_or_else(truncated)?;
                out.resize(out.len() + 257 - header as usize, byte);
                i += 1;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_bits() {
        const DATA: &[u8] = &[
            0xaa, 0xaa, 0xaa, 0x80, 0x00, 0x2a, 0xaa, 0xaa, 0xaa, 0xaa, 0x80, 0x00, 0x2a, 0x22,
            0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
        ];
        const PACKED: &[u8] = &[
            0xfe, 0xaa, 0x02, 0x80, 0x00, 0x2a, 0xfd, 0xaa, 0x03, 0x80, 0x00, 0x2a, 0x22, 0xf7,
            0xaa,
        ];
        let mut packed = Vec::new();
        pack_bits(DATA, &mut packed);
        assert_eq!(packed, PACKED);
        assert_eq!(unpack_bits(&packed).unwrap(), DATA);
    }

    #[test]
    fn test_long_runs_are_split() {
        let mut data = vec![7u8; 300];
        data.extend((0..200).map(|i| i as u8));
        let mut packed = Vec::new();
        pack_bits(&data, &mut packed);
        assert_eq!(&packed[..4], &[0x81, 7, 0x81, 7]);
        assert_eq!(unpack_bits(&packed).unwrap(), data);
    }

    #[test]
    fn test_truncated() {
        assert!(unpack_bits(&[0x05, 1, 2]).is_err());
        assert!(unpack_bits(&[0xfe]).is_err());
        assert_eq!(unpack_bits(&[0x80]).unwrap(), Vec::<u8>::new());
    }
}
