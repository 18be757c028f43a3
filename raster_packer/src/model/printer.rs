use super::config_key::RasterConfigKey;
use super::{JobLanguage, JobPackerType};
use crate::config::PackerConfig;
use crate::error::ConfigError;
use crate::language::RecordTag;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Table of raster configurations a device accepts.
pub trait FormatTable {
    fn supports(&self, key: &RasterConfigKey) -> bool;
}

/// Filler appended when a partially filled transmission buffer is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub byte: u8,
    /// Flushed buffers are padded to a multiple of this many bytes.
    pub alignment: usize,
}

impl Default for Padding {
    fn default() -> Self {
        Padding {
            byte: 0x00,
            alignment: 1,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_rasters_per_page() -> u32 {
    1
}

/// Capabilities of a printer model, as loaded from its model description file.
///
/// ```
/// use raster_packer::model::printer::{FormatTable, PrinterModel};
/// use raster_packer::model::JobPackerType;
///
/// let model = PrinterModel::from_json(
///     r#"{
///         "name": "DesignJet Z6",
///         "packer_type": "RasterStream_BANDS",
///         "multipage": false,
///         "supported_raster_configurations": ["CHUNKY-CMYK-8-600-RasterStream_BANDS"]
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(model.packer_type, JobPackerType::RasterStreamBands);
/// assert!(model.cancel_supported);
/// assert!(model.supports(&"CHUNKY-CMYK-8-600-RasterStream_BANDS".parse().unwrap()));
/// assert!(!model.supports(&"CHUNKY-CMYK-8-300-RasterStream_BANDS".parse().unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterModel {
    pub name: String,
    pub packer_type: JobPackerType,
    #[serde(default = "default_true")]
    pub multipage: bool,
    #[serde(default = "default_true")]
    pub cancel_supported: bool,
    #[serde(default)]
    pub preview_supported: bool,
    /// Rasters a page may hold, more than one on multi-layer printers.
    #[serde(default = "default_rasters_per_page")]
    pub max_rasters_per_page: u32,
    /// An empty table accepts every well-formed configuration.
    #[serde(default)]
    pub supported_raster_configurations: Vec<RasterConfigKey>,
    #[serde(default)]
    pub mandatory_job_settings: Vec<String>,
    #[serde(default)]
    pub mandatory_page_settings: Vec<String>,
    #[serde(default)]
    pub padding: Padding,
}

impl PrinterModel {
    pub fn new(name: &str, packer_type: JobPackerType) -> Self {
        PrinterModel {
            name: name.to_string(),
            packer_type,
            multipage: true,
            cancel_supported: true,
            preview_supported: false,
            max_rasters_per_page: default_rasters_per_page(),
            supported_raster_configurations: Vec::new(),
            mandatory_job_settings: Vec::new(),
            mandatory_page_settings: Vec::new(),
            padding: Padding::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let model: PrinterModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packer_type == JobPackerType::None {
            return Err(ConfigError::Invalid("packer type is not set".to_string()));
        }
        if self.max_rasters_per_page == 0 {
            return Err(ConfigError::Invalid(
                "max_rasters_per_page must be at least 1".to_string(),
            ));
        }
        if self.padding.alignment == 0 {
            return Err(ConfigError::Invalid(
                "padding alignment must be at least 1".to_string(),
            ));
        }
        if self.packer_type.language() == JobLanguage::RasterStream
            && RecordTag::is_tag(self.padding.byte)
        {
            return Err(ConfigError::Invalid(format!(
                "padding byte {:#04x} is a RasterStream record tag",
                self.padding.byte
            )));
        }
        Ok(())
    }

    /// Checks that the model can be driven with the buffers `config` produces.
    pub fn validate_against(&self, config: &PackerConfig) -> Result<(), ConfigError> {
        self.validate()?;
        config.validate()?;
        if config.buffer_size % self.padding.alignment != 0 {
            return Err(ConfigError::Invalid(format!(
                "padding alignment {} does not divide buffer size {}",
                self.padding.alignment, config.buffer_size
            )));
        }
        Ok(())
    }
}

impl FormatTable for PrinterModel {
    fn supports(&self, key: &RasterConfigKey) -> bool {
        self.supported_raster_configurations.is_empty()
            || self.supported_raster_configurations.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let model =
            PrinterModel::from_json(r#"{"name": "T1700", "packer_type": "PCL3_TAOS"}"#).unwrap();
        assert_eq!(model, PrinterModel::new("T1700", JobPackerType::Pcl3Taos));
        assert_eq!(model.padding, Padding::default());
    }

    #[test]
    fn test_invalid_models() {
        assert!(matches!(
            PrinterModel::from_json(r#"{"name": "x", "packer_type": "PCL5"}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            PrinterModel::from_json(
                r#"{"name": "x", "packer_type": "PCL3_TAOS", "max_rasters_per_page": 0}"#
            ),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PrinterModel::from_json(
                r#"{"name": "x", "packer_type": "PCL3_TAOS", "supported_raster_configurations": ["CHUNKY"]}"#
            ),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_padding_must_divide_buffer() {
        let mut model = PrinterModel::new("Z9", JobPackerType::RasterStreamBands);
        model.padding = Padding {
            byte: 0xff,
            alignment: 512,
        };
        let mut config = PackerConfig::default();
        assert!(model.validate_against(&config).is_ok());
        config.buffer_size = 1000;
        assert!(matches!(
            model.validate_against(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_padding_byte_cannot_be_a_record_tag() {
        let mut model = PrinterModel::new("Z9", JobPackerType::RasterStreamBands);
        model.padding.byte = 0x05;
        assert!(model.validate().is_err());
        model.padding.byte = 0x00;
        assert!(model.validate().is_ok());
        // PCL3 has no record tags
        model.packer_type = JobPackerType::Pcl3Taos;
        model.padding.byte = 0x05;
        assert!(model.validate().is_ok());
    }
}
