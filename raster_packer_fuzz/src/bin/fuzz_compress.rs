use arbitrary::Arbitrary;
use honggfuzz::fuzz;
use raster_packer::encode::{CompressedRasterEncoder, RasterEncoderExt};
use raster_packer::inspect::decode_line_repeat;
use std::io::Write;

#[derive(Clone, Debug, Arbitrary)]
pub struct DataInput {
    pub data: Vec<u8>,
    pub chunk_size: u8,
    pub bytes_per_line: u32,
}

fn main() {
    loop {
        fuzz!(|input: DataInput| {
            let Ok(mut encoder) = CompressedRasterEncoder::new(
                Vec::<u8>::new(),
                input.chunk_size,
                input.bytes_per_line as u64,
                input.data.len() as u64,
            ) else {
                return;
            };
            encoder.write_all(input.data.as_slice()).unwrap();
            let compressed = encoder.try_consume().unwrap();
            let decoded = decode_line_repeat(
                &compressed,
                input.chunk_size,
                input.bytes_per_line,
                input.data.len() as u64,
            )
            .unwrap();
            assert_eq!(input.data, decoded);
        });
    }
}
