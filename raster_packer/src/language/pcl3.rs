use super::LanguageWriter;
use crate::compressor::RasterGeometry;
use crate::encode::packbits::pack_bits;
use crate::model::config_key::Resolution;
use crate::model::settings::{is_pjl_safe, JobSettings, PageSettings, SettingValue, COPIES};
use crate::model::{PageId, Preview};
use std::io::{self, Write};

/// Universal exit language, hands the channel back to PJL.
pub const UEL: &[u8] = b"\x1b%-12345X";
const RESET: &[u8] = b"\x1bE";
const FORM_FEED: u8 = 0x0c;

/// PCL3 GUI framing. Rows are compressed with TIFF PackBits (raster mode 2).
#[derive(Default)]
pub struct Pcl3Writer {
    row: Vec<u8>,
}

impl Pcl3Writer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageWriter for Pcl3Writer {
    fn job_begin(&mut self, out: &mut Vec<u8>, settings: &JobSettings) -> io::Result<()> {
        out.write_all(UEL)?;
        out.write_all(b"@PJL\r\n")?;
        if let Some(name) = settings.job_name() {
            if !is_pjl_safe(&name) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "job name cannot be quoted in PJL",
                ));
            }
            write!(out, "@PJL JOB NAME=\"{}\"\r\n", name)?;
        }
        out.write_all(b"@PJL ENTER LANGUAGE=PCL3GUI\r\n")?;
        out.write_all(RESET)
    }

    fn page_begin(
        &mut self,
        out: &mut Vec<u8>,
        _page: PageId,
        settings: &PageSettings,
    ) -> io::Result<()> {
        if let Some(SettingValue::Integer(copies)) = settings.settings().get(COPIES) {
            write!(out, "\x1b&l{}X", copies)?;
        }
        Ok(())
    }

    fn preview(&mut self, _out: &mut Vec<u8>, page: PageId, _preview: &Preview) -> io::Result<()> {
        log::debug!("PCL3 carries no preview, dropped preview of page {}", page);
        Ok(())
    }

    fn raster_begin(&mut self, out: &mut Vec<u8>, geometry: &RasterGeometry) -> io::Result<()> {
        let dpi = match geometry.resolution {
            Resolution::Contone(dpi) => dpi,
            Resolution::Halftone { horizontal, .. } => horizontal,
        };
        write!(out, "\x1b*t{}R", dpi)?;
        write!(out, "\x1b*r{}S", geometry.width)?;
        write!(out, "\x1b*r{}T", geometry.height)?;
        if geometry.num_planes() > 1 {
            write!(out, "\x1b*r{}U", geometry.num_planes())?;
        }
        out.write_all(b"\x1b*b2M")?;
        out.write_all(b"\x1b*r1A")
    }

    fn band(
        &mut self,
        out: &mut Vec<u8>,
        geometry: &RasterGeometry,
        _start_row: u32,
        _rows: u32,
        data: &[u8],
    ) -> io::Result<()> {
        let planes = geometry.num_planes();
        let bytes_per_line = geometry.bytes_per_line as usize;
        if bytes_per_line == 0 {
            return Ok(());
        }
        for (index, line) in data.chunks(bytes_per_line).enumerate() {
            self.row.clear();
            pack_bits(line, &mut self.row);
            // planes of a row end with `W`, the ones before with `V`
            let command = if (index + 1) % planes == 0 { 'W' } else { 'V' };
            write!(out, "\x1b*b{}{}", self.row.len(), command)?;
            out.write_all(&self.row)?;
        }
        Ok(())
    }

    fn raster_end(&mut self, out: &mut Vec<u8>) -> io::Result<()> {
        out.write_all(b"\x1b*rC")
    }

    fn page_end(&mut self, out: &mut Vec<u8>, _page: PageId) -> io::Result<()> {
        out.write_all(&[FORM_FEED])
    }

    fn job_end(&mut self, out: &mut Vec<u8>, _page_count: u32) -> io::Result<()> {
        out.write_all(RESET)?;
        out.write_all(UEL)
    }

    fn cancel(&mut self, out: &mut Vec<u8>) -> io::Result<()> {
        out.write_all(RESET)?;
        out.write_all(UEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_header() {
        let mut settings = JobSettings::new();
        settings.set_job_name("banner");
        let mut out = Vec::new();
        Pcl3Writer::new().job_begin(&mut out, &settings).unwrap();
        assert_eq!(
            out,
            b"\x1b%-12345X@PJL\r\n@PJL JOB NAME=\"banner\"\r\n@PJL ENTER LANGUAGE=PCL3GUI\r\n\x1bE"
        );
    }

    #[test]
    fn test_job_name_cannot_inject_pjl() {
        let mut settings = JobSettings::new();
        settings.set_job_name("x\"\r\n@PJL SET COPIES=999\r\n@PJL COMMENT \"");
        let mut out = Vec::new();
        let err = Pcl3Writer::new()
            .job_begin(&mut out, &settings)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!out.windows(9).any(|w| w == b"SET COPIE"));
    }

    #[test]
    fn test_planar_rows() {
        let key = "PLANAR-KC-8-300-PCL3_BERT".parse().unwrap();
        let geometry = RasterGeometry::from_key(&key, 3, 1).unwrap();
        let mut writer = Pcl3Writer::new();
        let mut out = Vec::new();
        writer.raster_begin(&mut out, &geometry).unwrap();
        assert_eq!(
            out,
            b"\x1b*t300R\x1b*r3S\x1b*r1T\x1b*r2U\x1b*b2M\x1b*r1A"
        );
        out.clear();
        writer
            .band(&mut out, &geometry, 0, 1, &[0, 0, 0, 1, 2, 3])
            .unwrap();
        assert_eq!(out, b"\x1b*b2V\xfe\x00\x1b*b4W\x02\x01\x02\x03");
    }
}
