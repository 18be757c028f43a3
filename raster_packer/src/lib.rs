//! A job packer for large-format printers: it turns pages of raster rows into the byte stream of
//! a printer language (RasterStream or PCL3) and hands it out in fixed-size transmission buffers.
//! # Example
//! ## Packing a job
//! Create a packer, either directly or from a [`device::Device`], then drive it through the job
//! protocol. The output goes to the [`memory::MemoryHandler`] passed to `new_job`; without one,
//! the packer connects to its device and sends every buffer there.
//!
//! ```rust
//! use raster_packer::memory::{SharedBuffer, WriterMemoryHandler};
//! use raster_packer::model::printer::PrinterModel;
//! use raster_packer::model::settings::{JobSettings, PageSettings};
//! use raster_packer::model::JobPackerType;
//! use raster_packer::packer::{JobPacker, RasterJobPacker};
//! use std::sync::Arc;
//!
//! let model = Arc::new(PrinterModel::new("DesignJet Z", JobPackerType::RasterStreamBands));
//! let mut packer =
//!     RasterJobPacker::new(JobPackerType::RasterStreamBands, model, Default::default())?;
//! let output = SharedBuffer::new();
//!
//! let mut settings = JobSettings::new();
//! settings.set_job_name("banner").set_job_copies(1);
//! packer.new_job(&settings, Some(Box::new(WriterMemoryHandler::new(output.clone()))), None)?;
//! let page = packer.add_page(&PageSettings::new())?;
//! let bytes_per_line = packer.start_raster_key(page, "CHUNKY-XRGB-32-300-RasterStream_BANDS", 64, 8)?;
//! let rows = vec![0xffu8; bytes_per_line as usize * 8];
//! packer.add_raster_data(page, bytes_per_line, 8, 0, &rows)?;
//! packer.end_raster(page)?;
//! packer.end_page(page)?;
//! packer.end_job()?;
//! # Ok::<(), raster_packer::error::PackerError>(())
//! ```
//!
//! Every call returns a [`error::PackerError`] on failure, which maps to the numeric result code
//! of the printer SDK through [`error::PackerError::result_code`].
//!
//! ## Reading a job back
//! RasterStream output can be parsed again with [`inspect`], which decodes every band.
//!
//! ```rust
//! # use raster_packer::memory::{SharedBuffer, WriterMemoryHandler};
//! # use raster_packer::model::printer::PrinterModel;
//! # use raster_packer::model::settings::{JobSettings, PageSettings};
//! # use raster_packer::model::JobPackerType;
//! # use raster_packer::packer::{JobPacker, RasterJobPacker};
//! # use std::sync::Arc;
//! use raster_packer::inspect::{parse_records, raster_data, Record};
//!
//! # let model = Arc::new(PrinterModel::new("DesignJet Z", JobPackerType::RasterStreamBands));
//! # let mut packer =
//! #     RasterJobPacker::new(JobPackerType::RasterStreamBands, model, Default::default())?;
//! # let output = SharedBuffer::new();
//! # packer.new_job(&JobSettings::new(), Some(Box::new(WriterMemoryHandler::new(output.clone()))), None)?;
//! # let page = packer.add_page(&PageSettings::new())?;
//! # packer.start_raster_key(page, "CHUNKY-K-8-300-RasterStream_BANDS", 4, 2)?;
//! # packer.add_raster_data(page, 4, 2, 0, &[1, 2, 3, 4, 5, 6, 7, 8])?;
//! # packer.end_raster(page)?;
//! # packer.end_page(page)?;
//! # packer.end_job()?;
//! let records = parse_records(&output.contents(), 0x00).unwrap();
//! assert!(matches!(records.last(), Some(Record::JobEnd { page_count: 1 })));
//! let rasters = raster_data(&records);
//! assert_eq!(rasters[0].1, vec![1, 2, 3, 4, 5, 6, 7, 8]);
//! # Ok::<(), raster_packer::error::PackerError>(())
//! ```

pub mod compressor;
pub mod config;
pub mod device;
pub mod encode;
pub mod error;
pub mod inspect;
pub mod language;
pub mod memory;
pub mod model;
pub mod packer;
pub mod transport;
// Re-export byteorder crate.
pub use byteorder;
