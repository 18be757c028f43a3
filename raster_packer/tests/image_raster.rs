use image::{ImageBuffer, Rgb, Rgba};
use raster_packer::inspect::{parse_records, raster_data, Record};
use raster_packer::memory::{SharedBuffer, WriterMemoryHandler};
use raster_packer::model::printer::PrinterModel;
use raster_packer::model::settings::{ColorMode, JobSettings, PageSettings, PrintQuality};
use raster_packer::model::{JobPackerType, RasterFormat, RasterParams};
use raster_packer::packer::{JobPacker, RasterJobPacker};
use std::path::Path;
use std::sync::Arc;

fn gradient(width: u32, height: u32) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    ImageBuffer::from_fn(width, height, |x, y| {
        if (x / 16 + y / 16) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
        }
    })
}

fn pack_pages(packer_type: JobPackerType, pages: &[(RasterParams, Vec<u8>)]) -> Vec<u8> {
    let model = PrinterModel::new("DesignJet Z6", packer_type);
    let mut packer = RasterJobPacker::new(packer_type, Arc::new(model), Default::default()).unwrap();
    let output = SharedBuffer::new();
    let mut settings = JobSettings::new();
    settings.set_job_name("gradient").set_application_name("image_raster");
    packer
        .new_job(&settings, Some(Box::new(WriterMemoryHandler::new(output.clone()))), None)
        .unwrap();
    for (params, data) in pages {
        let mut page_settings = PageSettings::new();
        page_settings
            .set_print_quality(PrintQuality::Normal)
            .set_color_mode(ColorMode::Color);
        let page = packer.add_page(&page_settings).unwrap();
        packer.start_raster(page, params).unwrap();
        // bands of 32 rows
        let stride = params.bytes_per_line as usize;
        let mut row = 0;
        while row < params.height {
            let rows = (params.height - row).min(32);
            let start = row as usize * stride;
            let end = start + rows as usize * stride;
            packer
                .add_raster_data(page, params.bytes_per_line, rows, row, &data[start..end])
                .unwrap();
            row += rows;
        }
        packer.end_raster(page).unwrap();
        packer.end_page(page).unwrap();
    }
    packer.end_job().unwrap();
    output.contents()
}

#[test]
fn test_rgb_image_roundtrip() {
    let image = gradient(200, 120);
    let params = RasterParams::new(RasterFormat::RGB, 300, 200, 120, 600);
    let job = pack_pages(
        JobPackerType::RasterStreamBands,
        &[(params, image.as_raw().clone())],
    );
    // the checkerboard compresses well
    assert!(job.len() < image.as_raw().len());

    let records = parse_records(&job, 0x00).unwrap();
    let bands = records
        .iter()
        .filter(|record| matches!(record, Record::Band(_)))
        .count();
    assert_eq!(bands, 4);
    let rasters = raster_data(&records);
    let (header, data) = &rasters[0];
    assert_eq!((header.width, header.height), (200, 120));
    let decoded =
        ImageBuffer::<Rgb<u8>, Vec<u8>>::from_vec(header.width, header.height, data.clone())
            .unwrap();
    assert_eq!(decoded, image);

    std::fs::create_dir_all(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_outputs"))
        .unwrap();
    decoded
        .save(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_outputs/gradient.png"))
        .unwrap();
}

#[test]
fn test_xrgb_pages_on_pwax() {
    let first = gradient(64, 64);
    let second = gradient(32, 16);
    let pages: Vec<(RasterParams, Vec<u8>)> = [&first, &second]
        .into_iter()
        .map(|image| {
            let mut data = Vec::new();
            for pixel in image.pixels() {
                data.extend_from_slice(&[0, pixel[0], pixel[1], pixel[2]]);
            }
            let params = RasterParams::new(
                RasterFormat::xRGB,
                300,
                image.width(),
                image.height(),
                image.width() * 4,
            );
            (params, data)
        })
        .collect();
    let job = pack_pages(JobPackerType::RasterStreamPwax, &pages);

    let records = parse_records(&job, 0x00).unwrap();
    assert!(matches!(records.last(), Some(Record::JobEnd { page_count: 2 })));
    let rasters = raster_data(&records);
    assert_eq!(rasters.len(), 2);
    for ((header, data), image) in rasters.iter().zip([&first, &second]) {
        assert_eq!(header.bits_per_pixel, 32);
        let decoded =
            ImageBuffer::<Rgba<u8>, Vec<u8>>::from_vec(header.width, header.height, data.clone())
                .unwrap();
        for (decoded, expected) in decoded.pixels().zip(image.pixels()) {
            assert_eq!(&decoded.0[1..], &expected.0[..]);
        }
    }
}
