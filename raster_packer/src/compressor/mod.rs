//! The per-job compressor: turns protocol events and raster rows into the wire format of the
//! packer's language, chunked into transmission buffers.

mod sink;
pub use sink::*;

use crate::error::PackerError;
use crate::language::{language_writer, LanguageWriter};
use crate::memory::CancelToken;
use crate::model::config_key::{Packing, RasterConfigKey, Resolution};
use crate::model::printer::Padding;
use crate::model::settings::{JobSettings, PageSettings};
use crate::model::{JobPackerType, PageId, Preview, RsBuffer};
use std::io;

/// Shape of one raster, resolved from a configuration key or discrete parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterGeometry {
    pub packing: Packing,
    /// Channels in the order the caller supplies them.
    pub layout: String,
    /// Indices into `layout`, in transmission order.
    pub plane_sequence: Vec<usize>,
    /// Bits of one pixel inside one plane.
    pub bits_per_pixel: u32,
    pub width: u32,
    pub height: u32,
    pub bytes_per_line: u32,
    pub resolution: Resolution,
}

impl RasterGeometry {
    pub fn from_key(key: &RasterConfigKey, width: u32, height: u32) -> Result<Self, PackerError> {
        if width == 0 || height == 0 {
            return Err(PackerError::InvalidParameter(format!(
                "raster size {}x{} is empty",
                width, height
            )));
        }
        let bytes_per_line = key.bytes_per_line(width).ok_or_else(|| {
            PackerError::InvalidParameter(format!("raster width {} is too large", width))
        })?;
        let plane_sequence = match key.packing {
            Packing::Chunky => vec![0],
            Packing::Planar | Packing::PlanarHalftone => {
                plane_sequence(&key.layout, key.plane_order()).ok_or_else(|| {
                    PackerError::InvalidParameter(format!(
                        "plane order {} does not match layout {}",
                        key.plane_order(),
                        key.layout
                    ))
                })?
            }
        };
        Ok(RasterGeometry {
            packing: key.packing,
            layout: key.layout.clone(),
            plane_sequence,
            bits_per_pixel: key.bits_per_pixel_total(),
            width,
            height,
            bytes_per_line,
            resolution: key.resolution,
        })
    }

    /// Uses a caller supplied line length, which may exceed the minimum for the width.
    pub fn with_bytes_per_line(mut self, bytes_per_line: u32) -> Result<Self, PackerError> {
        if bytes_per_line < self.bytes_per_line {
            return Err(PackerError::InvalidParameter(format!(
                "{} bytes per line is below the {} bytes a line needs",
                bytes_per_line, self.bytes_per_line
            )));
        }
        self.bytes_per_line = bytes_per_line;
        Ok(self)
    }

    pub fn num_planes(&self) -> usize {
        self.plane_sequence.len()
    }

    /// Channels in transmission order.
    pub fn plane_order(&self) -> String {
        let channels: Vec<char> = self.layout.chars().collect();
        match self.packing {
            Packing::Chunky => self.layout.clone(),
            Packing::Planar | Packing::PlanarHalftone => self
                .plane_sequence
                .iter()
                .filter_map(|&index| channels.get(index))
                .collect(),
        }
    }

    /// Chunk size of the line-repeat codec: one pixel for byte aligned chunky pixels, one
    /// byte otherwise.
    pub fn chunk_size(&self) -> u8 {
        if self.packing != Packing::Chunky || self.bits_per_pixel % 8 != 0 {
            return 1;
        }
        match u8::try_from(self.bits_per_pixel / 8) {
            Ok(size) if size > 0 && self.bytes_per_line % size as u32 == 0 => size,
            _ => 1,
        }
    }

    /// Input bytes of one row, all planes included.
    pub fn row_bytes(&self) -> u64 {
        self.bytes_per_line as u64 * self.num_planes() as u64
    }
}

fn plane_sequence(layout: &str, order: &str) -> Option<Vec<usize>> {
    let channels: Vec<char> = layout.chars().collect();
    let mut used = vec![false; channels.len()];
    let mut sequence = Vec::with_capacity(channels.len());
    for channel in order.chars() {
        let index = (0..channels.len()).find(|&i| !used[i] && channels[i] == channel)?;
        used[index] = true;
        sequence.push(index);
    }
    (sequence.len() == channels.len()).then_some(sequence)
}

/// Raster rows handed to [`Compressor::encode_rows`].
#[derive(Debug, Clone, Copy)]
pub enum RowSource<'a> {
    /// Interleaved pixels, one buffer.
    Chunky(&'a [u8]),
    /// One buffer per plane, in layout order.
    Planar(&'a RsBuffer<'a>),
}

#[derive(Debug)]
struct RasterCursor {
    geometry: RasterGeometry,
    next_row: u32,
}

pub struct Compressor {
    language: Box<dyn LanguageWriter>,
    sink: BufferSink,
    record: Vec<u8>,
    raster: Option<RasterCursor>,
    raster_input_bytes: u64,
}

impl Compressor {
    pub fn new(
        packer_type: JobPackerType,
        target: BufferTarget,
        buffer_size: usize,
        padding: Padding,
        cancel: CancelToken,
    ) -> Result<Self, PackerError> {
        let language = language_writer(packer_type).ok_or_else(|| {
            PackerError::UnsupportedRasterFormat(format!("no language for {}", packer_type))
        })?;
        Ok(Self {
            language,
            sink: BufferSink::new(target, buffer_size, padding, cancel),
            record: Vec::new(),
            raster: None,
            raster_input_bytes: 0,
        })
    }

    fn emit<F>(&mut self, write: F) -> Result<(), PackerError>
    where
        F: FnOnce(&mut dyn LanguageWriter, &mut Vec<u8>) -> io::Result<()>,
    {
        self.record.clear();
        write(self.language.as_mut(), &mut self.record).map_err(PackerError::Compressor)?;
        self.sink.push(&self.record)
    }

    pub fn begin_job(&mut self, settings: &JobSettings) -> Result<(), PackerError> {
        self.emit(|language, out| language.job_begin(out, settings))
    }

    pub fn begin_page(&mut self, page: PageId, settings: &PageSettings) -> Result<(), PackerError> {
        self.emit(|language, out| language.page_begin(out, page, settings))
    }

    pub fn add_preview(&mut self, page: PageId, preview: &Preview) -> Result<(), PackerError> {
        self.emit(|language, out| language.preview(out, page, preview))
    }

    /// Opens a raster and resets the row cursor.
    pub fn start_raster(&mut self, geometry: RasterGeometry) -> Result<(), PackerError> {
        if self.raster.is_some() {
            return Err(PackerError::Internal("a raster is already open".to_string()));
        }
        self.emit(|language, out| language.raster_begin(out, &geometry))?;
        self.raster_input_bytes = 0;
        self.raster = Some(RasterCursor {
            geometry,
            next_row: 0,
        });
        Ok(())
    }

    /// Row the next band must start at.
    pub fn next_row(&self) -> Option<u32> {
        self.raster.as_ref().map(|raster| raster.next_row)
    }

    pub fn geometry(&self) -> Option<&RasterGeometry> {
        self.raster.as_ref().map(|raster| &raster.geometry)
    }

    /// Encodes `rows` rows of `buffer_width` bytes each. Input is validated before anything is
    /// emitted, so a parameter error leaves the cursor where it was.
    pub fn encode_rows(
        &mut self,
        source: RowSource<'_>,
        buffer_width: u32,
        rows: u32,
        start_row: u32,
    ) -> Result<(), PackerError> {
        let raster = self
            .raster
            .as_ref()
            .ok_or_else(|| PackerError::Internal("no raster is open".to_string()))?;
        let band = gather_rows(
            &raster.geometry,
            source,
            buffer_width,
            rows,
            start_row,
            raster.next_row,
        )?;
        let geometry = raster.geometry.clone();
        self.emit(|language, out| language.band(out, &geometry, start_row, rows, &band))?;
        self.raster_input_bytes += band.len() as u64;
        if let Some(raster) = self.raster.as_mut() {
            raster.next_row += rows;
        }
        Ok(())
    }

    /// Closes the raster and flushes the partially filled buffer.
    pub fn end_raster(&mut self) -> Result<(), PackerError> {
        self.raster = None;
        self.emit(|language, out| language.raster_end(out))?;
        self.sink.flush_padded()
    }

    pub fn end_page(&mut self, page: PageId) -> Result<(), PackerError> {
        self.emit(|language, out| language.page_end(out, page))
    }

    pub fn end_job(&mut self, page_count: u32) -> Result<(), PackerError> {
        self.emit(|language, out| language.job_end(out, page_count))?;
        self.sink.flush_padded()
    }

    /// Emits the cancellation marker after whatever is already staged.
    pub fn cancel(&mut self) -> Result<(), PackerError> {
        self.raster = None;
        self.emit(|language, out| language.cancel(out))?;
        self.sink.flush_padded()
    }

    /// Input bytes consumed by the current, or last, raster.
    pub fn raster_input_bytes(&self) -> u64 {
        self.raster_input_bytes
    }

    pub fn stats(&self) -> TransmissionStats {
        self.sink.stats()
    }

    pub fn into_target(self) -> BufferTarget {
        self.sink.into_target()
    }
}

fn gather_rows(
    geometry: &RasterGeometry,
    source: RowSource<'_>,
    buffer_width: u32,
    rows: u32,
    start_row: u32,
    next_row: u32,
) -> Result<Vec<u8>, PackerError> {
    if start_row != next_row {
        return Err(PackerError::InvalidParameter(format!(
            "start row {} does not follow row {}",
            start_row, next_row
        )));
    }
    if rows == 0 || rows > geometry.height - next_row {
        return Err(PackerError::InvalidParameter(format!(
            "{} rows from row {} do not fit a raster of height {}",
            rows, start_row, geometry.height
        )));
    }
    if buffer_width < geometry.bytes_per_line {
        return Err(PackerError::InvalidParameter(format!(
            "buffer width {} is below {} bytes per line",
            buffer_width, geometry.bytes_per_line
        )));
    }
    let stride = buffer_width as usize;
    let line = geometry.bytes_per_line as usize;
    let needed = (rows as usize - 1)
        .checked_mul(stride)
        .and_then(|bytes| bytes.checked_add(line))
        .ok_or_else(|| PackerError::InvalidParameter("raster data is too large".to_string()))?;
    let planes: Vec<&[u8]> = match source {
        RowSource::Chunky(data) => {
            if geometry.num_planes() != 1 {
                return Err(PackerError::InvalidParameter(
                    "planar rasters take one buffer per plane".to_string(),
                ));
            }
            vec![data]
        }
        RowSource::Planar(buffer) => {
            if buffer.num_planes() != geometry.num_planes() {
                return Err(PackerError::InvalidParameter(format!(
                    "{} planes supplied, the raster has {}",
                    buffer.num_planes(),
                    geometry.num_planes()
                )));
            }
            geometry
                .plane_sequence
                .iter()
                .filter_map(|&index| buffer.plane(index))
                .collect()
        }
    };
    if let Some(short) = planes.iter().position(|plane| plane.len() < needed) {
        return Err(PackerError::InvalidParameter(format!(
            "plane {} holds {} bytes, {} rows need {}",
            short,
            planes[short].len(),
            rows,
            needed
        )));
    }
    let mut band = Vec::with_capacity(line * planes.len() * rows as usize);
    for row in 0..rows as usize {
        let offset = row * stride;
        for plane in &planes {
            band.extend_from_slice(&plane[offset..offset + line]);
        }
    }
    Ok(band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{SharedBuffer, WriterMemoryHandler};

    fn compressor(packer_type: JobPackerType, output: &SharedBuffer) -> Compressor {
        Compressor::new(
            packer_type,
            BufferTarget::Handler(Box::new(WriterMemoryHandler::new(output.clone()))),
            64,
            Padding::default(),
            CancelToken::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_geometry_from_key() {
        let key = "PLANAR-CMYK-8-600-RasterStream_BANDS-KCMY".parse().unwrap();
        let geometry = RasterGeometry::from_key(&key, 10, 2).unwrap();
        assert_eq!(geometry.plane_sequence, vec![3, 0, 1, 2]);
        assert_eq!(geometry.plane_order(), "KCMY");
        assert_eq!(geometry.chunk_size(), 1);
        assert_eq!(geometry.row_bytes(), 40);

        let key = "CHUNKY-XRGB-32-600-RasterStream_BANDS".parse().unwrap();
        let geometry = RasterGeometry::from_key(&key, 10, 2).unwrap();
        assert_eq!(geometry.chunk_size(), 4);
        assert_eq!(geometry.clone().with_bytes_per_line(42).unwrap().chunk_size(), 1);
        assert!(geometry.with_bytes_per_line(39).is_err());
        assert!(RasterGeometry::from_key(&key, 0, 2).is_err());
    }

    #[test]
    fn test_rows_are_validated_before_emitting() {
        let output = SharedBuffer::new();
        let mut compressor = compressor(JobPackerType::RasterStreamPwax, &output);
        let key = "CHUNKY-K-8-300-RasterStream_PWAX".parse().unwrap();
        compressor
            .start_raster(RasterGeometry::from_key(&key, 4, 3).unwrap())
            .unwrap();
        let data = [7u8; 12];
        for (rows, start_row, width, buffer) in [
            (1, 1, 4, &data[..]),
            (0, 0, 4, &data[..]),
            (4, 0, 4, &data[..]),
            (1, 0, 3, &data[..]),
            (3, 0, 4, &data[..11]),
        ] {
            assert!(matches!(
                compressor.encode_rows(RowSource::Chunky(buffer), width, rows, start_row),
                Err(PackerError::InvalidParameter(_))
            ));
        }
        assert_eq!(compressor.next_row(), Some(0));
        assert_eq!(compressor.raster_input_bytes(), 0);
        compressor
            .encode_rows(RowSource::Chunky(&data), 4, 3, 0)
            .unwrap();
        assert_eq!(compressor.next_row(), Some(3));
        assert_eq!(compressor.raster_input_bytes(), 12);
    }

    #[test]
    fn test_planar_rows_follow_plane_order() {
        let key = "PLANAR-CM-8-300-RasterStream_PWAX-MC".parse().unwrap();
        let geometry = RasterGeometry::from_key(&key, 2, 2).unwrap();
        let cyan = [1u8, 1, 0, 2, 2, 0];
        let magenta = [3u8, 3, 0, 4, 4, 0];
        let buffer = RsBuffer::new(vec![&cyan[..], &magenta[..]]);
        let band = gather_rows(&geometry, RowSource::Planar(&buffer), 3, 2, 0, 0).unwrap();
        assert_eq!(band, vec![3, 3, 1, 1, 4, 4, 2, 2]);
    }
}
