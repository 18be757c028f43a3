//! The job packer protocol.
//!
//! A job is driven through `new_job`, `add_page`, `start_raster`/`start_raster_key`,
//! `add_raster_data`, `end_raster`, `end_page` and `end_job`, in that order. Calls made out
//! of order put the packer into [`RasterLibState::Error`], from which only
//! [`JobPacker::job_cancel`] recovers. Rejected parameters leave the state untouched.

mod raster;
mod sequencer;
pub use raster::*;
pub use sequencer::*;

use crate::error::PackerError;
use crate::memory::MemoryHandler;
use crate::model::settings::{JobSettings, PageSettings};
use crate::model::{
    JobLanguage, JobPackerType, PageId, Preview, RasterLibState, RasterParams, RsBuffer,
};
use crate::transport::TransmissionStatusCallback;

pub trait JobPacker: Send {
    /// Opens a job. Without a memory handler the job is sent straight to the device the
    /// packer was created for, and `callback` is told about every write.
    fn new_job(
        &mut self,
        settings: &JobSettings,
        handler: Option<Box<dyn MemoryHandler>>,
        callback: Option<Box<dyn TransmissionStatusCallback>>,
    ) -> Result<(), PackerError>;

    fn end_job(&mut self) -> Result<(), PackerError>;

    /// Drops the open job and returns to [`RasterLibState::WaitingForJobBegin`] whatever the
    /// outcome.
    fn job_cancel(&mut self) -> Result<(), PackerError>;

    fn add_page(&mut self, settings: &PageSettings) -> Result<PageId, PackerError>;

    fn add_preview(&mut self, page: PageId, preview: &Preview) -> Result<(), PackerError>;

    fn end_page(&mut self, page: PageId) -> Result<(), PackerError>;

    fn start_raster(&mut self, page: PageId, params: &RasterParams) -> Result<(), PackerError>;

    /// Starts a raster described by a raster configuration key and returns its bytes per line.
    fn start_raster_key(
        &mut self,
        page: PageId,
        key: &str,
        width: u32,
        height: u32,
    ) -> Result<u32, PackerError>;

    /// Feeds `rows` rows of chunky data, `buffer_width` bytes apart.
    fn add_raster_data(
        &mut self,
        page: PageId,
        buffer_width: u32,
        rows: u32,
        start_row: u32,
        data: &[u8],
    ) -> Result<(), PackerError>;

    /// Feeds `rows` rows of planar data, one buffer per plane.
    fn add_raster_data_rs_buffer(
        &mut self,
        page: PageId,
        buffer_width: u32,
        rows: u32,
        start_row: u32,
        buffer: &RsBuffer<'_>,
    ) -> Result<(), PackerError>;

    fn end_raster(&mut self, page: PageId) -> Result<(), PackerError>;

    fn job_packer_type(&self) -> JobPackerType;

    fn state(&self) -> RasterLibState;

    fn language(&self) -> JobLanguage {
        self.job_packer_type().language()
    }
}
