//! Reading RasterStream jobs back, for diagnostics and tests.

mod decode;
pub use decode::*;

use crate::encode::BandCodec;
use crate::error::InspectError;
use crate::language::{RecordTag, RECORD_HEADER_SIZE};
use crate::model::config_key::Packing;
use crate::model::PageId;
use byteorder::{BigEndian, ByteOrder};
use futures::{AsyncRead, AsyncReadExt};
use std::ops::DerefMut;
use std::pin::Pin;

/// Records larger than this are rejected.
pub const MAX_RECORD_LEN: u32 = 1 << 28;

/// Fixed part of a raster begin payload, the plane order follows.
const RASTER_HEADER_SIZE: usize = 28;

/// Geometry announced by a raster begin record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterHeader {
    pub packing: Packing,
    pub codec: BandCodec,
    pub planes: u8,
    pub chunk_size: u8,
    pub bits_per_pixel: u16,
    pub width: u32,
    pub height: u32,
    pub bytes_per_line: u32,
    pub horizontal_dpi: u32,
    pub vertical_dpi: u32,
    pub plane_order: String,
}

/// A band with its rows decoded: one line per plane for every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band {
    pub start_row: u32,
    pub rows: u32,
    pub codec: BandCodec,
    pub encoded_len: usize,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    JobBegin { settings: String },
    PageBegin { page: PageId, settings: String },
    Preview { page: PageId, data: Vec<u8> },
    RasterBegin(RasterHeader),
    Band(Band),
    RasterEnd,
    PageEnd { page: PageId },
    JobEnd { page_count: u32 },
    Cancel,
}

pub struct RasterStreamReader<R> {
    reader: Pin<R>,
    padding: u8,
    raster: Option<RasterHeader>,
}

fn leading_u32(payload: &[u8]) -> Result<u32, InspectError> {
    payload
        .get(..4)
        .map(BigEndian::read_u32)
        .ok_or(InspectError::Truncated)
}

fn parse_raster_header(payload: &[u8]) -> Result<RasterHeader, InspectError> {
    if payload.len() < RASTER_HEADER_SIZE {
        return Err(InspectError::Truncated);
    }
    let packing = match payload[0] {
        0 => Packing::Chunky,
        1 => Packing::Planar,
        2 => Packing::PlanarHalftone,
        _ => return Err(InspectError::DataLayoutError),
    };
    let codec = BandCodec::try_from(payload[1])
        .map_err(|_| InspectError::UnknownCodec(payload[1]))?;
    Ok(RasterHeader {
        packing,
        codec,
        planes: payload[2],
        chunk_size: payload[3],
        bits_per_pixel: BigEndian::read_u16(&payload[4..6]),
        width: BigEndian::read_u32(&payload[8..12]),
        height: BigEndian::read_u32(&payload[12..16]),
        bytes_per_line: BigEndian::read_u32(&payload[16..20]),
        horizontal_dpi: BigEndian::read_u32(&payload[20..24]),
        vertical_dpi: BigEndian::read_u32(&payload[24..28]),
        plane_order: String::from_utf8(payload[RASTER_HEADER_SIZE..].to_vec())?,
    })
}

fn parse_band(raster: &RasterHeader, payload: &[u8]) -> Result<Band, InspectError> {
    if payload.len() < 9 {
        return Err(InspectError::Truncated);
    }
    let start_row = BigEndian::read_u32(&payload[0..4]);
    let rows = BigEndian::read_u32(&payload[4..8]);
    let codec = BandCodec::try_from(payload[8])
        .map_err(|_| InspectError::UnknownCodec(payload[8]))?;
    let encoded = &payload[9..];
    let num_bytes = rows as u64 * raster.planes as u64 * raster.bytes_per_line as u64;
    let data = match codec {
        BandCodec::Uncompressed if encoded.len() as u64 == num_bytes => encoded.to_vec(),
        BandCodec::Uncompressed => return Err(InspectError::DataLayoutError),
        BandCodec::LineRepeat => {
            decode_line_repeat(encoded, raster.chunk_size, raster.bytes_per_line, num_bytes)?
        }
    };
    Ok(Band {
        start_row,
        rows,
        codec,
        encoded_len: encoded.len(),
        data,
    })
}

impl<R> RasterStreamReader<R>
where
    R: DerefMut<Target: AsyncRead>,
{
    pub fn new(reader: Pin<R>) -> Self {
        Self {
            reader,
            padding: 0x00,
            raster: None,
        }
    }

    /// Skips `padding` bytes found between records.
    pub fn with_padding(mut self, padding: u8) -> Self {
        self.padding = padding;
        self
    }

    /// Geometry of the raster being read, if any.
    pub fn raster(&self) -> Option<&RasterHeader> {
        self.raster.as_ref()
    }

    /// Reads the next record, `None` at the end of the stream.
    pub async fn next_record(&mut self) -> Result<Option<Record>, InspectError> {
        let mut header = [0u8; RECORD_HEADER_SIZE];
        loop {
            if self.reader.as_mut().read(&mut header[..1]).await? == 0 {
                return Ok(None);
            }
            if header[0] != self.padding {
                break;
            }
        }
        let tag =
            RecordTag::try_from(header[0]).map_err(|_| InspectError::UnknownTag(header[0]))?;
        self.reader.as_mut().read_exact(&mut header[1..]).await?;
        let len = BigEndian::read_u32(&header[1..]);
        if len > MAX_RECORD_LEN {
            return Err(InspectError::DataLayoutError);
        }
        let mut payload = vec![0u8; len as usize];
        self.reader.as_mut().read_exact(&mut payload).await?;

        let record = match tag {
            RecordTag::JobBegin => Record::JobBegin {
                settings: String::from_utf8(payload)?,
            },
            RecordTag::PageBegin => Record::PageBegin {
                page: PageId(leading_u32(&payload)?),
                settings: String::from_utf8(payload[4..].to_vec())?,
            },
            RecordTag::Preview => Record::Preview {
                page: PageId(leading_u32(&payload)?),
                data: payload[4..].to_vec(),
            },
            RecordTag::RasterBegin => {
                let raster = parse_raster_header(&payload)?;
                self.raster = Some(raster.clone());
                Record::RasterBegin(raster)
            }
            RecordTag::Band => {
                let raster = self.raster.as_ref().ok_or(InspectError::DataLayoutError)?;
                Record::Band(parse_band(raster, &payload)?)
            }
            RecordTag::RasterEnd => {
                self.raster = None;
                Record::RasterEnd
            }
            RecordTag::PageEnd => Record::PageEnd {
                page: PageId(leading_u32(&payload)?),
            },
            RecordTag::JobEnd => Record::JobEnd {
                page_count: leading_u32(&payload)?,
            },
            RecordTag::Cancel => {
                self.raster = None;
                Record::Cancel
            }
        };
        Ok(Some(record))
    }

    /// Reads every remaining record.
    pub async fn read_to_end(mut self) -> Result<Vec<Record>, InspectError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Parses a RasterStream job held in memory.
pub fn parse_records(data: &[u8], padding: u8) -> Result<Vec<Record>, InspectError> {
    let mut cursor = futures::io::Cursor::new(data);
    let reader = RasterStreamReader::new(Pin::new(&mut cursor)).with_padding(padding);
    futures::executor::block_on(reader.read_to_end())
}

/// Concatenated rows of every band of each raster, in stream order.
pub fn raster_data(records: &[Record]) -> Vec<(RasterHeader, Vec<u8>)> {
    let mut rasters: Vec<(RasterHeader, Vec<u8>)> = Vec::new();
    for record in records {
        match record {
            Record::RasterBegin(header) => rasters.push((header.clone(), Vec::new())),
            Record::Band(band) => {
                if let Some((_, data)) = rasters.last_mut() {
                    data.extend_from_slice(&band.data);
                }
            }
            _ => {}
        }
    }
    rasters
}
