//! Raster configuration keys.
//!
//! A key describes the raster a printer mode expects, as a dash separated string
//! `PACKING-LAYOUT-BPP-RES-LANG[-PLANEORDER]`:
//!
//! - `PACKING`: `CHUNKY`, `PLANAR` or `PLANAR_HT` (planar halftone)
//! - `LAYOUT`: the channels, one letter each (`XRGB`, `CMYK`, `KCMYkR`, ...)
//! - `BPP`: bits per pixel (see [`RasterConfigKey::bits_per_pixel_total`] for chunky keys)
//! - `RES`: one integer for contone packings, `HxV` for halftone
//! - `LANG`: the wire language and compression (`RasterStream_BANDS`, `PCL3_HALFTONE`, ...)
//! - `PLANEORDER`: optional transmission order of the planes
//!
//! ```
//! use raster_packer::model::config_key::{Packing, RasterConfigKey, Resolution};
//!
//! let key: RasterConfigKey = "PLANAR_HT-KCMYkR-2-1200x600-PCL3_HALFTONE".parse().unwrap();
//! assert_eq!(key.packing, Packing::PlanarHalftone);
//! assert_eq!(key.resolution, Resolution::Halftone { horizontal: 1200, vertical: 600 });
//! assert_eq!(key.num_planes(), 6);
//! assert_eq!(key.bytes_per_line(1000), Some(250));
//! ```

use crate::error::RasterConfigKeyError;
use crate::model::JobPackerType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_CHANNELS: usize = 16;
const MAX_BITS_PER_PIXEL: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Packing {
    /// Interleaved channels in a single plane
    Chunky,
    /// One plane per channel
    Planar,
    /// One bitonal (halftoned) plane per channel
    PlanarHalftone,
}

impl Packing {
    pub fn token(&self) -> &'static str {
        match self {
            Packing::Chunky => "CHUNKY",
            Packing::Planar => "PLANAR",
            Packing::PlanarHalftone => "PLANAR_HT",
        }
    }

    pub fn is_planar(&self) -> bool {
        !matches!(self, Packing::Chunky)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Contone(u32),
    Halftone { horizontal: u32, vertical: u32 },
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Contone(dpi) => write!(f, "{}", dpi),
            Resolution::Halftone {
                horizontal,
                vertical,
            } => write!(f, "{}x{}", horizontal, vertical),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RasterConfigKey {
    pub packing: Packing,
    /// One character per channel.
    pub layout: String,
    pub bits_per_pixel: u32,
    pub resolution: Resolution,
    pub language: JobPackerType,
    pub plane_order: Option<String>,
}

impl RasterConfigKey {
    pub fn num_channels(&self) -> usize {
        self.layout.chars().count()
    }

    /// Number of planes the raster data is split into.
    pub fn num_planes(&self) -> usize {
        match self.packing {
            Packing::Chunky => 1,
            Packing::Planar | Packing::PlanarHalftone => self.num_channels(),
        }
    }

    /// Channels in transmission order.
    pub fn plane_order(&self) -> &str {
        self.plane_order.as_deref().unwrap_or(&self.layout)
    }

    /// Bits used by one pixel inside one plane.
    ///
    /// For chunky keys the field is a whole-pixel size when it leaves at least a byte for
    /// every channel (`CHUNKY-XRGB-32`), and a per-component size otherwise
    /// (`CHUNKY-CMYK-8` is 32 bits per pixel).
    pub fn bits_per_pixel_total(&self) -> u32 {
        match self.packing {
            Packing::Chunky => {
                let channels = self.num_channels() as u32;
                if self.bits_per_pixel % channels == 0 && self.bits_per_pixel / channels >= 8 {
                    self.bits_per_pixel
                } else {
                    self.bits_per_pixel * channels
                }
            }
            Packing::Planar | Packing::PlanarHalftone => self.bits_per_pixel,
        }
    }

    /// Bytes of one line of one plane for a raster `width` pixels wide, `None` on overflow.
    pub fn bytes_per_line(&self, width: u32) -> Option<u32> {
        let bits = (self.bits_per_pixel_total() as u64).checked_mul(width as u64)?;
        u32::try_from(bits.div_ceil(8)).ok()
    }

    pub fn is_halftone(&self) -> bool {
        matches!(self.resolution, Resolution::Halftone { .. })
    }
}

fn parse_layout(field: &str) -> Result<String, RasterConfigKeyError> {
    let count = field.chars().count();
    if count == 0 || count > MAX_CHANNELS || !field.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RasterConfigKeyError::InvalidLayout(field.to_string()));
    }
    Ok(field.to_string())
}

fn parse_positive(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u32>().ok().filter(|v| *v > 0)
}

fn parse_resolution(field: &str, packing: Packing) -> Result<Resolution, RasterConfigKeyError> {
    let resolution = match field.split_once(['x', 'X']) {
        Some((horizontal, vertical)) => Resolution::Halftone {
            horizontal: parse_positive(horizontal)
                .ok_or_else(|| RasterConfigKeyError::InvalidResolution(field.to_string()))?,
            vertical: parse_positive(vertical)
                .ok_or_else(|| RasterConfigKeyError::InvalidResolution(field.to_string()))?,
        },
        None => Resolution::Contone(
            parse_positive(field)
                .ok_or_else(|| RasterConfigKeyError::InvalidResolution(field.to_string()))?,
        ),
    };
    let halftone = matches!(resolution, Resolution::Halftone { .. });
    if halftone != (packing == Packing::PlanarHalftone) {
        return Err(RasterConfigKeyError::ResolutionMismatch(field.to_string()));
    }
    Ok(resolution)
}

fn is_permutation(order: &str, layout: &str) -> bool {
    let mut a: Vec<char> = order.chars().collect();
    let mut b: Vec<char> = layout.chars().collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

impl FromStr for RasterConfigKey {
    type Err = RasterConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split('-').collect();
        if fields.len() != 5 && fields.len() != 6 {
            return Err(RasterConfigKeyError::FieldCount(fields.len()));
        }
        let packing = match fields[0] {
            "CHUNKY" => Packing::Chunky,
            "PLANAR" => Packing::Planar,
            "PLANAR_HT" => Packing::PlanarHalftone,
            other => return Err(RasterConfigKeyError::UnknownPacking(other.to_string())),
        };
        let layout = parse_layout(fields[1])?;
        let bits_per_pixel = fields[2]
            .parse::<u32>()
            .map_err(RasterConfigKeyError::InvalidBitsPerPixel)?;
        if bits_per_pixel == 0 || bits_per_pixel > MAX_BITS_PER_PIXEL {
            return Err(RasterConfigKeyError::BitsPerPixelOutOfRange(bits_per_pixel));
        }
        let resolution = parse_resolution(fields[3], packing)?;
        let language = JobPackerType::from_token(fields[4])
            .ok_or_else(|| RasterConfigKeyError::UnknownLanguage(fields[4].to_string()))?;
        let plane_order = match fields.get(5) {
            Some(order) if is_permutation(order, &layout) => Some(order.to_string()),
            Some(order) => return Err(RasterConfigKeyError::InvalidPlaneOrder(order.to_string())),
            None => None,
        };
        Ok(RasterConfigKey {
            packing,
            layout,
            bits_per_pixel,
            resolution,
            language,
            plane_order,
        })
    }
}

impl TryFrom<String> for RasterConfigKey {
    type Error = RasterConfigKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RasterConfigKey> for String {
    fn from(key: RasterConfigKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for RasterConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.packing.token(),
            self.layout,
            self.bits_per_pixel,
            self.resolution,
            self.language.token()
        )?;
        if let Some(order) = &self.plane_order {
            write!(f, "-{}", order)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chunky() {
        let key: RasterConfigKey = "CHUNKY-CMYK-8-600-RasterStream_BANDS".parse().unwrap();
        assert_eq!(key.packing, Packing::Chunky);
        assert_eq!(key.layout, "CMYK");
        assert_eq!(key.resolution, Resolution::Contone(600));
        assert_eq!(key.language, JobPackerType::RasterStreamBands);
        assert_eq!(key.num_planes(), 1);
        assert_eq!(key.bits_per_pixel_total(), 32);
        assert_eq!(key.bytes_per_line(100), Some(400));
    }

    #[test]
    fn test_chunky_whole_pixel_sizes() {
        let xrgb: RasterConfigKey = "CHUNKY-XRGB-32-600-PCL3_TAOS".parse().unwrap();
        assert_eq!(xrgb.bits_per_pixel_total(), 32);
        assert_eq!(xrgb.bytes_per_line(10), Some(40));
        let rgb: RasterConfigKey = "CHUNKY-RGB-24-300-RasterStream_PWAX".parse().unwrap();
        assert_eq!(rgb.bytes_per_line(3), Some(9));
        let gray: RasterConfigKey = "CHUNKY-K-1-600-RasterStream_BANDS".parse().unwrap();
        assert_eq!(gray.bytes_per_line(9), Some(2));
    }

    #[test]
    fn test_parse_planar_with_order() {
        let key: RasterConfigKey = "PLANAR-CMYK-8-600-RasterStream_BANDS-KCMY".parse().unwrap();
        assert_eq!(key.num_planes(), 4);
        assert_eq!(key.plane_order(), "KCMY");
        assert_eq!(key.bytes_per_line(100), Some(100));
        assert_eq!(key.to_string(), "PLANAR-CMYK-8-600-RasterStream_BANDS-KCMY");
    }

    #[test]
    fn test_parse_halftone() {
        let key: RasterConfigKey = "PLANAR_HT-KCMYkR-2-1200X1200-PCL3_HALFTONE".parse().unwrap();
        assert!(key.is_halftone());
        assert_eq!(key.num_planes(), 6);
        assert_eq!(key.bytes_per_line(7), Some(2));
        assert_eq!(key.to_string(), "PLANAR_HT-KCMYkR-2-1200x1200-PCL3_HALFTONE");
    }

    #[test]
    fn test_resolution_must_match_packing() {
        assert_eq!(
            "PLANAR_HT-KCMY-2-1200-PCL3_HALFTONE".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::ResolutionMismatch("1200".to_string()))
        );
        assert_eq!(
            "CHUNKY-CMYK-8-600x600-RasterStream_BANDS".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::ResolutionMismatch("600x600".to_string()))
        );
    }

    #[test]
    fn test_malformed_keys() {
        assert_eq!(
            "CHUNKY-CMYK-8-600".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::FieldCount(4))
        );
        assert!(matches!(
            "BANDED-CMYK-8-600-PCL3_TAOS".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::UnknownPacking(_))
        ));
        assert!(matches!(
            "CHUNKY-CM1K-8-600-PCL3_TAOS".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::InvalidLayout(_))
        ));
        assert!(matches!(
            "CHUNKY-CMYK-x-600-PCL3_TAOS".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::InvalidBitsPerPixel(_))
        ));
        assert_eq!(
            "CHUNKY-CMYK-0-600-PCL3_TAOS".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::BitsPerPixelOutOfRange(0))
        );
        assert!(matches!(
            "CHUNKY-CMYK-8-+600-PCL3_TAOS".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::InvalidResolution(_))
        ));
        assert!(matches!(
            "CHUNKY-CMYK-8-600-PCL5".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::UnknownLanguage(_))
        ));
        assert!(matches!(
            "PLANAR-CMYK-8-600-RasterStream_BANDS-KCMR".parse::<RasterConfigKey>(),
            Err(RasterConfigKeyError::InvalidPlaneOrder(_))
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let key: RasterConfigKey =
            serde_json::from_str("\"CHUNKY-RGBX-32-1200-RasterStream_BANDS_DESIGN\"").unwrap();
        assert_eq!(key.language, JobPackerType::RasterStreamBandsDesign);
        assert_eq!(
            serde_json::to_string(&key).unwrap(),
            "\"CHUNKY-RGBX-32-1200-RasterStream_BANDS_DESIGN\""
        );
        assert!(serde_json::from_str::<RasterConfigKey>("\"CHUNKY\"").is_err());
    }
}
