use super::LanguageWriter;
use crate::compressor::RasterGeometry;
use crate::encode::{BandCodec, RasterEncoderExt};
use crate::model::config_key::{Packing, Resolution};
use crate::model::settings::{JobSettings, PageSettings};
use crate::model::{JobPackerType, PageId, Preview};
use byteorder::{BigEndian, WriteBytesExt};
use num_enum::TryFromPrimitive;
use std::io::{self, Write};

/// Tag of a RasterStream record. Every record is `tag: u8, length: u32 BE, payload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum RecordTag {
    /// Settings dump of the job.
    JobBegin = 0x01,
    /// Page id followed by the settings dump of the page.
    PageBegin = 0x02,
    /// Page id followed by the preview image.
    Preview = 0x03,
    /// Raster geometry, see [`RasterStreamWriter`].
    RasterBegin = 0x04,
    /// Start row, row count, codec and encoded rows.
    Band = 0x05,
    RasterEnd = 0x06,
    /// Page id.
    PageEnd = 0x07,
    /// Number of pages of the job.
    JobEnd = 0x08,
    Cancel = 0x7f,
}

impl RecordTag {
    pub fn is_tag(byte: u8) -> bool {
        RecordTag::try_from_primitive(byte).is_ok()
    }
}

pub const RECORD_HEADER_SIZE: usize = 5;

fn packing_code(packing: Packing) -> u8 {
    match packing {
        Packing::Chunky => 0,
        Packing::Planar => 1,
        Packing::PlanarHalftone => 2,
    }
}

/// RasterStream framing.
///
/// The raster begin payload is `packing: u8, codec: u8, planes: u8, chunk_size: u8,
/// bits_per_pixel: u16, reserved: u16, width: u32, height: u32, bytes_per_line: u32,
/// horizontal_dpi: u32, vertical_dpi: u32` followed by the plane order. Integers are big
/// endian. A band holds `rows * planes` encoded lines, planes of a row in plane order.
pub struct RasterStreamWriter {
    codec: BandCodec,
    band: Vec<u8>,
}

impl RasterStreamWriter {
    pub fn new(codec: BandCodec) -> Self {
        Self {
            codec,
            band: Vec::new(),
        }
    }

    pub fn codec_for(packer_type: JobPackerType) -> BandCodec {
        match packer_type {
            JobPackerType::RasterStreamPwax => BandCodec::Uncompressed,
            _ => BandCodec::LineRepeat,
        }
    }
}

fn write_record(out: &mut Vec<u8>, tag: RecordTag, payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "record is too large"))?;
    out.write_u8(tag as u8)?;
    out.write_u32::<BigEndian>(len)?;
    out.write_all(payload)
}

impl LanguageWriter for RasterStreamWriter {
    fn job_begin(&mut self, out: &mut Vec<u8>, settings: &JobSettings) -> io::Result<()> {
        write_record(out, RecordTag::JobBegin, settings.dump().as_bytes())
    }

    fn page_begin(
        &mut self,
        out: &mut Vec<u8>,
        page: PageId,
        settings: &PageSettings,
    ) -> io::Result<()> {
        let mut payload = Vec::new();
        payload.write_u32::<BigEndian>(page.0)?;
        payload.write_all(settings.dump().as_bytes())?;
        write_record(out, RecordTag::PageBegin, &payload)
    }

    fn preview(&mut self, out: &mut Vec<u8>, page: PageId, preview: &Preview) -> io::Result<()> {
        let mut payload = Vec::with_capacity(4 + preview.len());
        payload.write_u32::<BigEndian>(page.0)?;
        payload.write_all(preview.data())?;
        write_record(out, RecordTag::Preview, &payload)
    }

    fn raster_begin(&mut self, out: &mut Vec<u8>, geometry: &RasterGeometry) -> io::Result<()> {
        let planes = u8::try_from(geometry.num_planes())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many planes"))?;
        let bits_per_pixel = u16::try_from(geometry.bits_per_pixel)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pixel is too large"))?;
        let (horizontal, vertical) = match geometry.resolution {
            Resolution::Contone(dpi) => (dpi, dpi),
            Resolution::Halftone {
                horizontal,
                vertical,
            } => (horizontal, vertical),
        };
        let order = geometry.plane_order();
        let mut payload = Vec::with_capacity(28 + order.len());
        payload.write_u8(packing_code(geometry.packing))?;
        payload.write_u8(self.codec as u8)?;
        payload.write_u8(planes)?;
        payload.write_u8(geometry.chunk_size())?;
        payload.write_u16::<BigEndian>(bits_per_pixel)?;
        payload.write_u16::<BigEndian>(0)?;
        payload.write_u32::<BigEndian>(geometry.width)?;
        payload.write_u32::<BigEndian>(geometry.height)?;
        payload.write_u32::<BigEndian>(geometry.bytes_per_line)?;
        payload.write_u32::<BigEndian>(horizontal)?;
        payload.write_u32::<BigEndian>(vertical)?;
        payload.write_all(order.as_bytes())?;
        write_record(out, RecordTag::RasterBegin, &payload)
    }

    fn band(
        &mut self,
        out: &mut Vec<u8>,
        geometry: &RasterGeometry,
        start_row: u32,
        rows: u32,
        data: &[u8],
    ) -> io::Result<()> {
        self.band.clear();
        self.band.write_u32::<BigEndian>(start_row)?;
        self.band.write_u32::<BigEndian>(rows)?;
        self.band.write_u8(self.codec as u8)?;
        let mut encoder = self.codec.encoder(
            &mut self.band,
            geometry.chunk_size(),
            geometry.bytes_per_line as u64,
            data.len() as u64,
        )?;
        encoder.write_all(data)?;
        encoder.try_consume()?;
        log::trace!(
            "band rows {}..{} encoded {} -> {} bytes",
            start_row,
            start_row + rows,
            data.len(),
            self.band.len() - 9
        );
        write_record(out, RecordTag::Band, &self.band)
    }

    fn raster_end(&mut self, out: &mut Vec<u8>) -> io::Result<()> {
        write_record(out, RecordTag::RasterEnd, &[])
    }

    fn page_end(&mut self, out: &mut Vec<u8>, page: PageId) -> io::Result<()> {
        write_record(out, RecordTag::PageEnd, &page.0.to_be_bytes())
    }

    fn job_end(&mut self, out: &mut Vec<u8>, page_count: u32) -> io::Result<()> {
        write_record(out, RecordTag::JobEnd, &page_count.to_be_bytes())
    }

    fn cancel(&mut self, out: &mut Vec<u8>) -> io::Result<()> {
        write_record(out, RecordTag::Cancel, &[])
    }
}
