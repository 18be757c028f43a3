use arbitrary::Arbitrary;
use raster_packer::error::{ErrorKind, PackerError};
use raster_packer::memory::{SharedBuffer, WriterMemoryHandler};
use raster_packer::model::printer::PrinterModel;
use raster_packer::model::settings::{JobSettings, PageSettings};
use raster_packer::model::{JobPackerType, PageId, Preview, RasterLibState, ResultCode};
use raster_packer::packer::{JobPacker, RasterJobPacker};
use std::sync::Arc;

const KEYS: &[&str] = &[
    "CHUNKY-CMYK-8-600-RasterStream_BANDS",
    "CHUNKY-XRGB-32-300-RasterStream_BANDS",
    "CHUNKY-K-8-300-RasterStream_BANDS",
    "PLANAR-CMYK-8-600-RasterStream_BANDS-KCMY",
    "PLANAR_HT-KCMYkR-2-1200x600-RasterStream_BANDS",
    "CHUNKY-RGB-24-300-RasterStream_PWAX",
];

#[derive(Clone, Debug, Arbitrary)]
pub enum Key {
    Known(u8),
    Raw(String),
}

#[derive(Clone, Debug, Arbitrary)]
pub enum Call {
    NewJob { with_handler: bool },
    EndJob,
    JobCancel,
    AddPage,
    AddPreview { page: u32, data: Vec<u8> },
    EndPage { page: u32 },
    StartRasterKey { page: u32, key: Key, width: u8, height: u8 },
    AddRasterData { page: u32, buffer_width: u16, rows: u8, start_row: u8, fill: u8 },
    EndRaster { page: u32 },
}

fn call(packer: &mut RasterJobPacker, call: &Call) -> Result<(), PackerError> {
    match call {
        Call::NewJob { with_handler } => {
            let handler = with_handler.then(|| {
                Box::new(WriterMemoryHandler::new(SharedBuffer::new()))
                    as Box<dyn raster_packer::memory::MemoryHandler>
            });
            packer.new_job(&JobSettings::new(), handler, None)
        }
        Call::EndJob => packer.end_job(),
        Call::JobCancel => packer.job_cancel(),
        Call::AddPage => packer.add_page(&PageSettings::new()).map(|_| ()),
        Call::AddPreview { page, data } => {
            packer.add_preview(PageId(*page % 4), &Preview::new(data.clone()))
        }
        Call::EndPage { page } => packer.end_page(PageId(*page % 4)),
        Call::StartRasterKey {
            page,
            key,
            width,
            height,
        } => {
            let key = match key {
                Key::Known(index) => KEYS[*index as usize % KEYS.len()].to_string(),
                Key::Raw(key) => key.clone(),
            };
            packer
                .start_raster_key(PageId(*page % 4), &key, *width as u32, *height as u32)
                .map(|_| ())
        }
        Call::AddRasterData {
            page,
            buffer_width,
            rows,
            start_row,
            fill,
        } => {
            let len = (*buffer_width as usize * *rows as usize).min(1 << 16);
            let data = vec![*fill; len];
            packer.add_raster_data(
                PageId(*page % 4),
                *buffer_width as u32,
                *rows as u32,
                *start_row as u32,
                &data,
            )
        }
        Call::EndRaster { page } => packer.end_raster(PageId(*page % 4)),
    }
}

/// Runs `calls` against a fresh packer and checks the state policy after every call.
pub fn run_protocol(calls: &[Call]) {
    let mut model = PrinterModel::new("fuzz", JobPackerType::RasterStreamBands);
    model.preview_supported = true;
    model.max_rasters_per_page = 2;
    let mut packer =
        RasterJobPacker::new(JobPackerType::RasterStreamBands, Arc::new(model), Default::default())
            .unwrap();
    for c in calls.iter().take(256) {
        let before = packer.state();
        let result = call(&mut packer, c);
        let after = packer.state();
        if matches!(c, Call::JobCancel) {
            assert!(result.is_ok());
            assert_eq!(after, RasterLibState::WaitingForJobBegin);
            continue;
        }
        match result {
            Ok(()) => assert_ne!(after, RasterLibState::Error),
            Err(err) if err.kind() == ErrorKind::Parameter => assert_eq!(after, before),
            Err(err) => {
                if before == RasterLibState::Error {
                    assert_eq!(err.result_code(), ResultCode::ErrorInvalidUsageSequence);
                }
                match c {
                    Call::NewJob { .. } if after == before => {}
                    _ => assert_eq!(after, RasterLibState::Error),
                }
            }
        }
    }
}
