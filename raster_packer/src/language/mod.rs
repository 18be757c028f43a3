//! Wire framing of the printer languages.
//!
//! A [`LanguageWriter`] turns protocol events into the bytes of one printer language. Writers
//! only append to the record buffer they are given; chunking those bytes into transmission
//! buffers is the job of the compressor.

mod pcl3;
mod rasterstream;
pub use pcl3::*;
pub use rasterstream::*;

use crate::compressor::RasterGeometry;
use crate::model::settings::{JobSettings, PageSettings};
use crate::model::{JobLanguage, JobPackerType, PageId, Preview};
use std::io;

pub trait LanguageWriter: Send {
    fn job_begin(&mut self, out: &mut Vec<u8>, settings: &JobSettings) -> io::Result<()>;
    fn page_begin(
        &mut self,
        out: &mut Vec<u8>,
        page: PageId,
        settings: &PageSettings,
    ) -> io::Result<()>;
    fn preview(&mut self, out: &mut Vec<u8>, page: PageId, preview: &Preview) -> io::Result<()>;
    fn raster_begin(&mut self, out: &mut Vec<u8>, geometry: &RasterGeometry) -> io::Result<()>;
    /// Encodes `rows` rows starting at `start_row`. `data` holds, for every row, one line of
    /// `geometry.bytes_per_line` bytes per plane in transmission order.
    fn band(
        &mut self,
        out: &mut Vec<u8>,
        geometry: &RasterGeometry,
        start_row: u32,
        rows: u32,
        data: &[u8],
    ) -> io::Result<()>;
    fn raster_end(&mut self, out: &mut Vec<u8>) -> io::Result<()>;
    fn page_end(&mut self, out: &mut Vec<u8>, page: PageId) -> io::Result<()>;
    fn job_end(&mut self, out: &mut Vec<u8>, page_count: u32) -> io::Result<()>;
    /// Marker telling the device to drop the job.
    fn cancel(&mut self, out: &mut Vec<u8>) -> io::Result<()>;
}

/// Creates the writer for the language and compression of `packer_type`.
pub fn language_writer(packer_type: JobPackerType) -> Option<Box<dyn LanguageWriter>> {
    match packer_type.language() {
        JobLanguage::RasterStream => Some(Box::new(RasterStreamWriter::new(
            RasterStreamWriter::codec_for(packer_type),
        ))),
        JobLanguage::Pcl3Gui => Some(Box::new(Pcl3Writer::new())),
        JobLanguage::Unknown => None,
    }
}
