pub mod config_key;
pub mod printer;
pub mod settings;

use derive_more::From;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric result codes of the printer SDK. Values match the codes reported by the device
/// firmware and the rest of the SDK, so they can be logged or forwarded unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
pub enum ResultCode {
    Ok = 0,
    ErrorInvalidParameter = 1,
    ErrorUnsupportedRasterFmt = 2,
    ErrorInvalidUsageSequence = 3,
    ErrorCompressor = 4,
    ErrorMemory = 5,
    ErrorInternal = 6,
    ErrorPrinterBusy = 46,
    ErrorConnection = 53,
    Error = 54,
    NotSupported = 57,
    ErrorSettingMandatoryNotSet = 60,
    ErrorTimeout = 81,
}

/// Protocol state of a job packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
pub enum RasterLibState {
    /// No job is being processed.
    WaitingForJobBegin = 0,
    /// A job is open and its header has been emitted.
    WaitingForPageBegin = 1,
    /// A page is open, no raster has been started on it yet.
    WaitingForFirstRasterStart = 2,
    /// A raster of the page has ended and another one may follow.
    WaitingForRasterStart = 3,
    /// A raster is open and accepts rows.
    WaitingForRaster = 4,
    /// Every row of the raster has been consumed.
    WaitingForRasterEnd = 5,
    /// The page holds all the rasters it can take.
    WaitingForPageEnd = 6,
    /// A page has ended.
    WaitingForJobEnd = 7,
    /// The job has ended and its resources were released.
    WaitingForDelete = 8,
    /// The job is in an inconsistent state, only a cancel is accepted.
    Error = 0xffff_ffff,
}

/// Printer families a packer can produce jobs for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u32)]
pub enum JobPackerType {
    /// Page-wide array printers
    #[serde(rename = "RasterStream_PWAX")]
    RasterStreamPwax = 0,
    /// Band-wise DesignJet printers with chunky raster layout
    #[serde(rename = "RasterStream_BANDS_DESIGN")]
    RasterStreamBandsDesign = 1,
    /// Band-wise printers with planar support
    #[serde(rename = "RasterStream_BANDS")]
    RasterStreamBands = 2,
    #[serde(rename = "PCL3_TAOS")]
    Pcl3Taos = 3,
    #[serde(rename = "PCL3_BERT")]
    Pcl3Bert = 4,
    #[serde(rename = "PCL3_HALFTONE")]
    Pcl3Halftone = 5,
    /// Band-wise printers with planar support and high quality compression
    #[serde(rename = "RasterStream_BANDS_ICF4")]
    RasterStreamBandsIcf4 = 6,
    #[serde(skip)]
    None = 0xffff_ffff,
}

impl JobPackerType {
    /// The language and compression token used in raster configuration keys.
    pub fn token(&self) -> &'static str {
        match self {
            JobPackerType::RasterStreamPwax => "RasterStream_PWAX",
            JobPackerType::RasterStreamBandsDesign => "RasterStream_BANDS_DESIGN",
            JobPackerType::RasterStreamBands => "RasterStream_BANDS",
            JobPackerType::RasterStreamBandsIcf4 => "RasterStream_BANDS_ICF4",
            JobPackerType::Pcl3Taos => "PCL3_TAOS",
            JobPackerType::Pcl3Bert => "PCL3_BERT",
            JobPackerType::Pcl3Halftone => "PCL3_HALFTONE",
            JobPackerType::None => "NONE",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        [
            JobPackerType::RasterStreamPwax,
            JobPackerType::RasterStreamBandsDesign,
            JobPackerType::RasterStreamBands,
            JobPackerType::RasterStreamBandsIcf4,
            JobPackerType::Pcl3Taos,
            JobPackerType::Pcl3Bert,
            JobPackerType::Pcl3Halftone,
        ]
        .into_iter()
        .find(|t| t.token() == token)
    }

    pub fn language(&self) -> JobLanguage {
        match self {
            JobPackerType::RasterStreamPwax
            | JobPackerType::RasterStreamBandsDesign
            | JobPackerType::RasterStreamBands
            | JobPackerType::RasterStreamBandsIcf4 => JobLanguage::RasterStream,
            JobPackerType::Pcl3Taos | JobPackerType::Pcl3Bert | JobPackerType::Pcl3Halftone => {
                JobLanguage::Pcl3Gui
            }
            JobPackerType::None => JobLanguage::Unknown,
        }
    }
}

impl fmt::Display for JobPackerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
pub enum JobLanguage {
    Unknown = 0,
    Pcl3Gui = 1,
    RasterStream = 2,
}

/// Discrete raster formats accepted by `start_raster`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
pub enum RasterFormat {
    Invalid = 0,
    /// 32-bit chunky xRGB
    #[allow(non_camel_case_types)]
    xRGB = 1,
    /// 32-bit chunky xBGR
    #[allow(non_camel_case_types)]
    xBGR = 2,
    /// 32-bit chunky RGBx
    RGBx = 3,
    /// 32-bit chunky KCMY
    KCMY = 4,
    /// 32-bit chunky KYMC
    KYMC = 5,
    /// 32-bit chunky CMYK
    CMYK = 6,
    /// 24-bit chunky RGB
    RGB = 7,
    /// 8-bit planar, one plane per channel of the plane order
    Planar = 8,
    /// Planar halftone, only reachable through a raster configuration key
    PlanarHalftone = 9,
    /// 24-bit chunky BGR
    BGR = 10,
    /// 32-bit chunky BGRx
    BGRx = 11,
}

/// Identifier of a page inside a job. Identifiers are issued in increasing order and never
/// reused within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From)]
pub struct PageId(pub u32);

impl PageId {
    pub const INVALID: PageId = PageId(u32::MAX);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A page preview, usually a JPEG image shown by the printer front panel or RIP.
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub struct Preview {
    data: Vec<u8>,
}

impl Preview {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Raster rows for planar formats: one slice per plane, each holding `rows` lines of
/// `buffer_width` bytes.
#[derive(Debug, Clone, From)]
pub struct RsBuffer<'a> {
    planes: Vec<&'a [u8]>,
}

impl<'a> RsBuffer<'a> {
    pub fn new(planes: Vec<&'a [u8]>) -> Self {
        Self { planes }
    }

    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    pub fn plane(&self, index: usize) -> Option<&'a [u8]> {
        self.planes.get(index).copied()
    }
}

/// Parameters of `start_raster`, the discrete (non-key) way of starting a contone raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterParams {
    pub format: RasterFormat,
    pub resolution: u32,
    pub width: u32,
    pub height: u32,
    pub bytes_per_line: u32,
    /// Channel order of the planes, only meaningful for planar formats.
    pub plane_order: String,
    pub number_of_planes: u32,
}

impl RasterParams {
    pub fn new(
        format: RasterFormat,
        resolution: u32,
        width: u32,
        height: u32,
        bytes_per_line: u32,
    ) -> Self {
        Self {
            format,
            resolution,
            width,
            height,
            bytes_per_line,
            plane_order: "CMYK".to_string(),
            number_of_planes: 1,
        }
    }

    pub fn with_planes(mut self, plane_order: &str, number_of_planes: u32) -> Self {
        self.plane_order = plane_order.to_string();
        self.number_of_planes = number_of_planes;
        self
    }
}
