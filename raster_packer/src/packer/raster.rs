use super::{JobPacker, PageSequencer};
use crate::compressor::{BufferTarget, Compressor, RasterGeometry, RowSource, TransmissionStats};
use crate::config::PackerConfig;
use crate::error::{ErrorKind, PackerError, TransportError};
use crate::memory::{CancelToken, MemoryHandler};
use crate::model::config_key::{Packing, RasterConfigKey, Resolution};
use crate::model::printer::{FormatTable, PrinterModel};
use crate::model::settings::{is_pjl_safe, JobSettings, PageSettings};
use crate::model::{
    JobLanguage, JobPackerType, PageId, Preview, RasterFormat, RasterLibState, RasterParams,
    RsBuffer,
};
use crate::transport::{DeviceSession, TransmissionStatusCallback};
use std::sync::Arc;

use RasterLibState::*;

struct OpenJob {
    compressor: Compressor,
    pages: PageSequencer,
}

/// The job packer of RasterStream and PCL3 printers.
///
/// ```
/// use raster_packer::memory::{SharedBuffer, WriterMemoryHandler};
/// use raster_packer::model::printer::PrinterModel;
/// use raster_packer::model::settings::{JobSettings, PageSettings};
/// use raster_packer::model::{JobPackerType, RasterLibState};
/// use raster_packer::packer::{JobPacker, RasterJobPacker};
/// use std::sync::Arc;
///
/// let model = Arc::new(PrinterModel::new("DesignJet", JobPackerType::RasterStreamBands));
/// let mut packer = RasterJobPacker::new(JobPackerType::RasterStreamBands, model, Default::default())?;
/// let output = SharedBuffer::new();
/// let handler = WriterMemoryHandler::new(output.clone());
///
/// packer.new_job(&JobSettings::new(), Some(Box::new(handler)), None)?;
/// let page = packer.add_page(&PageSettings::new())?;
/// let bytes_per_line =
///     packer.start_raster_key(page, "CHUNKY-CMYK-8-600-RasterStream_BANDS", 100, 10)?;
/// assert_eq!(bytes_per_line, 400);
/// packer.add_raster_data(page, 400, 10, 0, &[0u8; 4000])?;
/// packer.end_raster(page)?;
/// packer.end_page(page)?;
/// packer.end_job()?;
/// assert_eq!(packer.state(), RasterLibState::WaitingForDelete);
/// assert!(!output.is_empty());
/// # Ok::<(), raster_packer::error::PackerError>(())
/// ```
pub struct RasterJobPacker {
    packer_type: JobPackerType,
    model: Arc<PrinterModel>,
    config: PackerConfig,
    device: Option<DeviceSession>,
    state: RasterLibState,
    cancel: CancelToken,
    job: Option<OpenJob>,
    last_stats: TransmissionStats,
    last_raster_input_bytes: u64,
}

impl RasterJobPacker {
    /// Creates a packer whose jobs go to caller supplied memory handlers.
    pub fn new(
        packer_type: JobPackerType,
        model: Arc<PrinterModel>,
        config: PackerConfig,
    ) -> Result<Self, PackerError> {
        if packer_type.language() == JobLanguage::Unknown {
            return Err(PackerError::UnsupportedRasterFormat(format!(
                "no language for {}",
                packer_type
            )));
        }
        model.validate_against(&config)?;
        Ok(Self {
            packer_type,
            model,
            config,
            device: None,
            state: WaitingForJobBegin,
            cancel: CancelToken::new(),
            job: None,
            last_stats: TransmissionStats::default(),
            last_raster_input_bytes: 0,
        })
    }

    /// Sends jobs opened without a memory handler to `device`.
    pub fn with_device(mut self, device: DeviceSession) -> Self {
        self.device = Some(device);
        self
    }

    pub fn model(&self) -> &PrinterModel {
        &self.model
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    /// Token interrupting blocking buffer waits of this packer from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Input bytes consumed by the current raster, or by the last one of the last job.
    pub fn raster_input_bytes(&self) -> u64 {
        match &self.job {
            Some(job) => job.compressor.raster_input_bytes(),
            None => self.last_raster_input_bytes,
        }
    }

    /// Buffer exchanges of the current job, or of the last one.
    pub fn transmission_stats(&self) -> TransmissionStats {
        match &self.job {
            Some(job) => job.compressor.stats(),
            None => self.last_stats,
        }
    }

    fn set_state(&mut self, state: RasterLibState) {
        if self.state != state {
            log::debug!("{} packer: {:?} -> {:?}", self.packer_type, self.state, state);
            self.state = state;
        }
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[RasterLibState],
    ) -> Result<(), PackerError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PackerError::InvalidUsageSequence {
                operation,
                state: self.state,
            })
        }
    }

    /// Runs `operation` and moves to the error state on anything but a parameter error.
    fn guard<T, F>(&mut self, operation: &'static str, f: F) -> Result<T, PackerError>
    where
        F: FnOnce(&mut Self) -> Result<T, PackerError>,
    {
        let result = f(self);
        if let Err(err) = &result {
            match err.kind() {
                ErrorKind::Parameter => log::debug!("{} rejected: {}", operation, err),
                _ => {
                    log::warn!("{} failed in state {:?}: {}", operation, self.state, err);
                    self.set_state(Error);
                }
            }
        }
        result
    }

    fn job_mut(&mut self) -> Result<&mut OpenJob, PackerError> {
        self.job
            .as_mut()
            .ok_or_else(|| PackerError::Internal("no job is open".to_string()))
    }

    fn open_target(
        &self,
        handler: Option<Box<dyn MemoryHandler>>,
        callback: Option<Box<dyn TransmissionStatusCallback>>,
    ) -> Result<BufferTarget, PackerError> {
        if let Some(handler) = handler {
            if callback.is_some() {
                log::warn!("transmission callback ignored, the job uses a memory handler");
            }
            return Ok(BufferTarget::Handler(handler));
        }
        let device = self.device.as_ref().ok_or(TransportError::NoDevice)?;
        Ok(device.open(&self.config, self.cancel.clone(), callback)?.into())
    }

    fn begin_raster(
        &mut self,
        operation: &'static str,
        page: PageId,
        key: &RasterConfigKey,
        width: u32,
        height: u32,
        bytes_per_line: Option<u32>,
    ) -> Result<u32, PackerError> {
        self.expect_state(operation, &[WaitingForFirstRasterStart, WaitingForRasterStart])?;
        self.job_mut()?.pages.current(page)?;
        if key.language != self.packer_type {
            return Err(PackerError::UnsupportedRasterFormat(format!(
                "{} cannot be packed by a {} packer",
                key, self.packer_type
            )));
        }
        if !self.model.supports(key) {
            return Err(PackerError::UnsupportedRasterFormat(format!(
                "{} is not supported by {}",
                key, self.model.name
            )));
        }
        let mut geometry = RasterGeometry::from_key(key, width, height)?;
        if let Some(bytes_per_line) = bytes_per_line {
            geometry = geometry.with_bytes_per_line(bytes_per_line)?;
        }
        let bytes_per_line = geometry.bytes_per_line;
        let job = self.job_mut()?;
        job.compressor.start_raster(geometry)?;
        job.pages.start_raster(page)?;
        self.set_state(WaitingForRaster);
        log::debug!("page {} raster {} {}x{}", page, key, width, height);
        Ok(bytes_per_line)
    }

    fn feed_rows(
        &mut self,
        operation: &'static str,
        page: PageId,
        source: RowSource<'_>,
        buffer_width: u32,
        rows: u32,
        start_row: u32,
    ) -> Result<(), PackerError> {
        self.guard(operation, |packer| {
            packer.expect_state(operation, &[WaitingForRaster])?;
            let job = packer.job_mut()?;
            job.pages.current(page)?;
            job.compressor
                .encode_rows(source, buffer_width, rows, start_row)?;
            let complete = match (job.compressor.next_row(), job.compressor.geometry()) {
                (Some(next_row), Some(geometry)) => next_row >= geometry.height,
                _ => false,
            };
            if complete {
                packer.set_state(WaitingForRasterEnd);
            }
            Ok(())
        })
    }

    fn check_page_settings(&self) -> Result<(), PackerError> {
        let Some(job) = &self.job else {
            return Ok(());
        };
        for page in job.pages.pages() {
            for key in &self.model.mandatory_page_settings {
                if !page.settings().settings().contains(key) {
                    return Err(PackerError::SettingMandatoryNotSet(format!(
                        "{} (page {})",
                        key,
                        page.id()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Drops the job and, with a device session, starts its cooldown.
    fn close_job(&mut self, job: OpenJob) -> Result<(), PackerError> {
        self.last_stats = job.compressor.stats();
        self.last_raster_input_bytes = job.compressor.raster_input_bytes();
        match job.compressor.into_target() {
            BufferTarget::Agent(mut agent) => agent.finish(),
            BufferTarget::Handler(_) => Ok(()),
        }
    }
}

fn key_for_params(
    packer_type: JobPackerType,
    params: &RasterParams,
) -> Result<RasterConfigKey, PackerError> {
    let (packing, layout, bits_per_pixel) = match params.format {
        RasterFormat::xRGB => (Packing::Chunky, "XRGB", 32),
        RasterFormat::xBGR => (Packing::Chunky, "XBGR", 32),
        RasterFormat::RGBx => (Packing::Chunky, "RGBX", 32),
        RasterFormat::BGRx => (Packing::Chunky, "BGRX", 32),
        RasterFormat::KCMY => (Packing::Chunky, "KCMY", 32),
        RasterFormat::KYMC => (Packing::Chunky, "KYMC", 32),
        RasterFormat::CMYK => (Packing::Chunky, "CMYK", 32),
        RasterFormat::RGB => (Packing::Chunky, "RGB", 24),
        RasterFormat::BGR => (Packing::Chunky, "BGR", 24),
        RasterFormat::Planar => {
            let channels = params.plane_order.chars().count();
            if channels == 0
                || channels != params.number_of_planes as usize
                || !params.plane_order.chars().all(|c| c.is_ascii_alphabetic())
            {
                return Err(PackerError::InvalidParameter(format!(
                    "plane order {:?} does not describe {} planes",
                    params.plane_order, params.number_of_planes
                )));
            }
            (Packing::Planar, params.plane_order.as_str(), 8)
        }
        RasterFormat::PlanarHalftone => {
            return Err(PackerError::UnsupportedRasterFormat(
                "planar halftone rasters are started with a raster configuration key".to_string(),
            ))
        }
        RasterFormat::Invalid => {
            return Err(PackerError::InvalidParameter(
                "raster format is not set".to_string(),
            ))
        }
    };
    if params.resolution == 0 {
        return Err(PackerError::InvalidParameter(
            "resolution must not be zero".to_string(),
        ));
    }
    Ok(RasterConfigKey {
        packing,
        layout: layout.to_string(),
        bits_per_pixel,
        resolution: Resolution::Contone(params.resolution),
        language: packer_type,
        plane_order: None,
    })
}

impl JobPacker for RasterJobPacker {
    fn new_job(
        &mut self,
        settings: &JobSettings,
        handler: Option<Box<dyn MemoryHandler>>,
        callback: Option<Box<dyn TransmissionStatusCallback>>,
    ) -> Result<(), PackerError> {
        if let Err(err) =
            self.expect_state("new_job", &[WaitingForJobBegin, WaitingForDelete])
        {
            return self.guard("new_job", |_| Err(err));
        }
        // nothing is open yet, so failures below leave the packer idle
        if let Some(key) = self
            .model
            .mandatory_job_settings
            .iter()
            .find(|key| !settings.settings().contains(key.as_str()))
        {
            return Err(PackerError::SettingMandatoryNotSet(key.clone()));
        }
        if let Some(name) = settings.job_name().filter(|name| !is_pjl_safe(name)) {
            return Err(PackerError::InvalidParameter(format!(
                "job name {:?} holds a quote or a control character",
                name
            )));
        }
        self.cancel.reset();
        let target = self.open_target(handler, callback)?;
        let mut compressor = Compressor::new(
            self.packer_type,
            target,
            self.config.buffer_size,
            self.model.padding,
            self.cancel.clone(),
        )?;
        compressor.begin_job(settings)?;
        self.job = Some(OpenJob {
            compressor,
            pages: PageSequencer::new(self.model.multipage),
        });
        self.last_stats = TransmissionStats::default();
        self.last_raster_input_bytes = 0;
        self.set_state(WaitingForPageBegin);
        log::info!("{} job started for {}", self.packer_type, self.model.name);
        Ok(())
    }

    fn end_job(&mut self) -> Result<(), PackerError> {
        self.guard("end_job", |packer| {
            packer.expect_state("end_job", &[WaitingForPageBegin, WaitingForJobEnd])?;
            packer.check_page_settings()?;
            let job = packer.job_mut()?;
            let page_count = job.pages.page_count();
            job.compressor.end_job(page_count)?;
            if let Some(job) = packer.job.take() {
                packer.close_job(job)?;
            }
            packer.set_state(WaitingForDelete);
            log::info!(
                "{} job ended after {} pages, {} bytes",
                packer.packer_type,
                page_count,
                packer.last_stats.bytes_released
            );
            Ok(())
        })
    }

    fn job_cancel(&mut self) -> Result<(), PackerError> {
        let supported = self.model.cancel_supported;
        if let Some(mut job) = self.job.take() {
            // A tripped token skips the marker, the device may no longer drain.
            if supported {
                if let Err(err) = job.compressor.cancel() {
                    log::warn!("cancel marker not delivered: {}", err);
                }
            }
            if let Err(err) = self.close_job(job) {
                log::warn!("device session closed with an error: {}", err);
            }
            log::info!("{} job cancelled", self.packer_type);
        }
        self.cancel.reset();
        self.set_state(WaitingForJobBegin);
        if supported {
            Ok(())
        } else {
            Err(PackerError::NotSupported)
        }
    }

    fn add_page(&mut self, settings: &PageSettings) -> Result<PageId, PackerError> {
        self.guard("add_page", |packer| {
            packer.expect_state("add_page", &[WaitingForPageBegin, WaitingForJobEnd])?;
            let job = packer.job_mut()?;
            let page = job.pages.open_page(settings)?;
            job.compressor.begin_page(page, settings)?;
            packer.set_state(WaitingForFirstRasterStart);
            Ok(page)
        })
    }

    fn add_preview(&mut self, page: PageId, preview: &Preview) -> Result<(), PackerError> {
        self.guard("add_preview", |packer| {
            packer.expect_state(
                "add_preview",
                &[WaitingForFirstRasterStart, WaitingForRasterStart, WaitingForPageEnd],
            )?;
            packer.job_mut()?.pages.current(page)?;
            if !packer.model.preview_supported {
                return Err(PackerError::NotSupported);
            }
            if preview.is_empty() {
                return Err(PackerError::InvalidParameter("preview is empty".to_string()));
            }
            let job = packer.job_mut()?;
            job.compressor.add_preview(page, preview)?;
            job.pages.add_preview(page, preview)
        })
    }

    fn end_page(&mut self, page: PageId) -> Result<(), PackerError> {
        self.guard("end_page", |packer| {
            packer.expect_state(
                "end_page",
                &[WaitingForFirstRasterStart, WaitingForRasterStart, WaitingForPageEnd],
            )?;
            let job = packer.job_mut()?;
            job.pages.close_page(page)?;
            job.compressor.end_page(page)?;
            packer.set_state(WaitingForJobEnd);
            Ok(())
        })
    }

    fn start_raster(&mut self, page: PageId, params: &RasterParams) -> Result<(), PackerError> {
        self.guard("start_raster", |packer| {
            packer.expect_state(
                "start_raster",
                &[WaitingForFirstRasterStart, WaitingForRasterStart],
            )?;
            let key = key_for_params(packer.packer_type, params)?;
            packer.begin_raster(
                "start_raster",
                page,
                &key,
                params.width,
                params.height,
                Some(params.bytes_per_line),
            )?;
            Ok(())
        })
    }

    fn start_raster_key(
        &mut self,
        page: PageId,
        key: &str,
        width: u32,
        height: u32,
    ) -> Result<u32, PackerError> {
        self.guard("start_raster_key", |packer| {
            packer.expect_state(
                "start_raster_key",
                &[WaitingForFirstRasterStart, WaitingForRasterStart],
            )?;
            let key: RasterConfigKey = key.parse()?;
            packer.begin_raster("start_raster_key", page, &key, width, height, None)
        })
    }

    fn add_raster_data(
        &mut self,
        page: PageId,
        buffer_width: u32,
        rows: u32,
        start_row: u32,
        data: &[u8],
    ) -> Result<(), PackerError> {
        self.feed_rows(
            "add_raster_data",
            page,
            RowSource::Chunky(data),
            buffer_width,
            rows,
            start_row,
        )
    }

    fn add_raster_data_rs_buffer(
        &mut self,
        page: PageId,
        buffer_width: u32,
        rows: u32,
        start_row: u32,
        buffer: &RsBuffer<'_>,
    ) -> Result<(), PackerError> {
        self.feed_rows(
            "add_raster_data_rs_buffer",
            page,
            RowSource::Planar(buffer),
            buffer_width,
            rows,
            start_row,
        )
    }

    fn end_raster(&mut self, page: PageId) -> Result<(), PackerError> {
        self.guard("end_raster", |packer| {
            packer.expect_state("end_raster", &[WaitingForRasterEnd])?;
            let max_rasters = packer.model.max_rasters_per_page;
            let job = packer.job_mut()?;
            let rasters = job.pages.current(page)?.rasters();
            job.compressor.end_raster()?;
            packer.set_state(if rasters < max_rasters {
                WaitingForRasterStart
            } else {
                WaitingForPageEnd
            });
            Ok(())
        })
    }

    fn job_packer_type(&self) -> JobPackerType {
        self.packer_type
    }

    fn state(&self) -> RasterLibState {
        self.state
    }
}

impl Drop for RasterJobPacker {
    fn drop(&mut self) {
        if self.job.is_some() {
            log::warn!("{} packer dropped with an open job", self.packer_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{SharedBuffer, WriterMemoryHandler};
    use crate::model::ResultCode;

    fn packer(model: PrinterModel) -> RasterJobPacker {
        RasterJobPacker::new(model.packer_type, Arc::new(model), PackerConfig::default()).unwrap()
    }

    fn handler(output: &SharedBuffer) -> Option<Box<dyn MemoryHandler>> {
        Some(Box::new(WriterMemoryHandler::new(output.clone())))
    }

    #[test]
    fn test_params_map_to_keys() {
        let params = RasterParams::new(RasterFormat::xRGB, 600, 10, 2, 40);
        let key = key_for_params(JobPackerType::RasterStreamBands, &params).unwrap();
        assert_eq!(key.to_string(), "CHUNKY-XRGB-32-600-RasterStream_BANDS");
        assert_eq!(key.bytes_per_line(10), Some(40));

        let params = RasterParams::new(RasterFormat::RGB, 300, 10, 2, 30);
        let key = key_for_params(JobPackerType::Pcl3Taos, &params).unwrap();
        assert_eq!(key.to_string(), "CHUNKY-RGB-24-300-PCL3_TAOS");

        let params =
            RasterParams::new(RasterFormat::Planar, 600, 10, 2, 10).with_planes("KCMY", 4);
        let key = key_for_params(JobPackerType::RasterStreamBands, &params).unwrap();
        assert_eq!(key.num_planes(), 4);
        assert_eq!(key.bytes_per_line(10), Some(10));

        let params =
            RasterParams::new(RasterFormat::Planar, 600, 10, 2, 10).with_planes("KCMY", 3);
        assert!(matches!(
            key_for_params(JobPackerType::RasterStreamBands, &params),
            Err(PackerError::InvalidParameter(_))
        ));
        let params = RasterParams::new(RasterFormat::PlanarHalftone, 600, 10, 2, 10);
        assert!(matches!(
            key_for_params(JobPackerType::RasterStreamBands, &params),
            Err(PackerError::UnsupportedRasterFormat(_))
        ));
        let params = RasterParams::new(RasterFormat::Invalid, 600, 10, 2, 10);
        assert!(key_for_params(JobPackerType::RasterStreamBands, &params).is_err());
    }

    #[test]
    fn test_rasters_per_page() {
        let mut model = PrinterModel::new("Sandwich", JobPackerType::RasterStreamBands);
        model.max_rasters_per_page = 2;
        let mut packer = packer(model);
        let output = SharedBuffer::new();
        packer
            .new_job(&JobSettings::new(), handler(&output), None)
            .unwrap();
        let page = packer.add_page(&PageSettings::new()).unwrap();
        for expected in [WaitingForRasterStart, WaitingForPageEnd] {
            let bpl = packer
                .start_raster_key(page, "CHUNKY-K-8-300-RasterStream_BANDS", 8, 1)
                .unwrap();
            assert_eq!(bpl, 8);
            packer.add_raster_data(page, 8, 1, 0, &[0; 8]).unwrap();
            packer.end_raster(page).unwrap();
            assert_eq!(packer.state(), expected);
        }
        let err = packer
            .start_raster_key(page, "CHUNKY-K-8-300-RasterStream_BANDS", 8, 1)
            .unwrap_err();
        assert_eq!(err.result_code(), ResultCode::ErrorInvalidUsageSequence);
        assert_eq!(packer.state(), Error);
    }

    #[test]
    fn test_raster_language_must_match() {
        let mut packer = packer(PrinterModel::new("T", JobPackerType::RasterStreamBands));
        packer
            .new_job(&JobSettings::new(), handler(&SharedBuffer::new()), None)
            .unwrap();
        let page = packer.add_page(&PageSettings::new()).unwrap();
        let err = packer
            .start_raster_key(page, "CHUNKY-K-8-300-RasterStream_PWAX", 8, 1)
            .unwrap_err();
        assert_eq!(err.result_code(), ResultCode::ErrorUnsupportedRasterFmt);
        assert_eq!(packer.state(), WaitingForFirstRasterStart);
        let err = packer
            .start_raster_key(page, "CHUNKY-K-8", 8, 1)
            .unwrap_err();
        assert_eq!(err.result_code(), ResultCode::ErrorInvalidParameter);
        assert_eq!(packer.state(), WaitingForFirstRasterStart);
    }

    #[test]
    fn test_mandatory_settings() {
        let mut model = PrinterModel::new("T", JobPackerType::Pcl3Taos);
        model.mandatory_job_settings = vec!["jobName".to_string()];
        model.mandatory_page_settings = vec!["mediaId".to_string()];
        let mut packer = packer(model);

        let err = packer
            .new_job(&JobSettings::new(), handler(&SharedBuffer::new()), None)
            .unwrap_err();
        assert_eq!(err.result_code(), ResultCode::ErrorSettingMandatoryNotSet);
        assert_eq!(packer.state(), WaitingForJobBegin);

        let mut settings = JobSettings::new();
        settings.set_job_name("poster");
        packer
            .new_job(&settings, handler(&SharedBuffer::new()), None)
            .unwrap();
        let page = packer.add_page(&PageSettings::new()).unwrap();
        packer.end_page(page).unwrap();
        let err = packer.end_job().unwrap_err();
        assert_eq!(err.result_code(), ResultCode::ErrorSettingMandatoryNotSet);
        assert_eq!(packer.state(), Error);
        packer.job_cancel().unwrap();
        assert_eq!(packer.state(), WaitingForJobBegin);
    }

    #[test]
    fn test_null_handler_without_device() {
        let mut packer = packer(PrinterModel::new("T", JobPackerType::Pcl3Taos));
        let err = packer.new_job(&JobSettings::new(), None, None).unwrap_err();
        assert_eq!(err.result_code(), ResultCode::ErrorConnection);
        assert_eq!(packer.state(), WaitingForJobBegin);
    }

    #[test]
    fn test_cancel_without_support() {
        let mut model = PrinterModel::new("T", JobPackerType::RasterStreamPwax);
        model.cancel_supported = false;
        let mut packer = packer(model);
        let output = SharedBuffer::new();
        packer
            .new_job(&JobSettings::new(), handler(&output), None)
            .unwrap();
        assert!(matches!(packer.job_cancel(), Err(PackerError::NotSupported)));
        assert_eq!(packer.state(), WaitingForJobBegin);
        // no cancel record after the job header
        let contents = output.contents();
        assert!(!contents.contains(&0x7f));
    }

    #[test]
    fn test_previews() {
        let mut model = PrinterModel::new("T", JobPackerType::RasterStreamBands);
        let mut packer = packer(model.clone());
        packer
            .new_job(&JobSettings::new(), handler(&SharedBuffer::new()), None)
            .unwrap();
        let page = packer.add_page(&PageSettings::new()).unwrap();
        assert!(matches!(
            packer.add_preview(page, &Preview::new(vec![0xff, 0xd8])),
            Err(PackerError::NotSupported)
        ));
        assert_eq!(packer.state(), WaitingForFirstRasterStart);

        model.preview_supported = true;
        let mut packer = self::packer(model);
        packer
            .new_job(&JobSettings::new(), handler(&SharedBuffer::new()), None)
            .unwrap();
        let page = packer.add_page(&PageSettings::new()).unwrap();
        packer
            .add_preview(page, &Preview::new(vec![0xff, 0xd8]))
            .unwrap();
        let err = packer
            .add_preview(PageId(7), &Preview::new(vec![1]))
            .unwrap_err();
        assert_eq!(err.result_code(), ResultCode::ErrorInvalidUsageSequence);
        assert_eq!(packer.state(), Error);
    }
}
