use crate::config::PackerConfig;
use crate::error::PackerError;
use crate::model::config_key::RasterConfigKey;
use crate::model::printer::{FormatTable, PrinterModel};
use crate::model::JobPackerType;
use crate::packer::RasterJobPacker;
use crate::transport::{CooldownRegistry, DeviceConnector, DeviceSession, TcpConnector};
use std::sync::Arc;

/// A printer reachable at `address`, described by its model.
///
/// The cooldown registry is shared by every packer of every device built with it, so all
/// handles of one printer must be created from the same [`CooldownRegistry`].
pub struct Device {
    address: String,
    model: Arc<PrinterModel>,
    config: PackerConfig,
    connector: Option<Arc<dyn DeviceConnector>>,
    registry: CooldownRegistry,
}

impl Device {
    pub fn new(address: &str, model: PrinterModel, registry: &CooldownRegistry) -> Self {
        Self {
            address: address.to_string(),
            model: Arc::new(model),
            config: PackerConfig::default(),
            connector: None,
            registry: registry.clone(),
        }
    }

    /// Replaces the configuration. The cooldown window stays the one of the registry.
    pub fn with_config(mut self, config: PackerConfig) -> Self {
        if config.cooldown() != self.registry.cooldown() {
            log::warn!(
                "cooldown of {:?} ignored, the registry of {} uses {:?}",
                config.cooldown(),
                self.address,
                self.registry.cooldown()
            );
        }
        self.config = config;
        self
    }

    /// Uses `connector` instead of a raw TCP socket.
    pub fn with_connector(mut self, connector: Arc<dyn DeviceConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn model(&self) -> &PrinterModel {
        &self.model
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    pub fn registry(&self) -> &CooldownRegistry {
        &self.registry
    }

    fn connector(&self) -> Arc<dyn DeviceConnector> {
        match &self.connector {
            Some(connector) => connector.clone(),
            None => Arc::new(TcpConnector::new(self.config.device_port)),
        }
    }

    /// Creates a packer for the language of `key`, which the model must support.
    pub fn create_job_packer_using_raster_configuration(
        &self,
        key: &str,
    ) -> Result<RasterJobPacker, PackerError> {
        let key: RasterConfigKey = key.parse()?;
        if !self.model.supports(&key) {
            return Err(PackerError::UnsupportedRasterFormat(format!(
                "{} is not supported by {}",
                key, self.model.name
            )));
        }
        self.create_job_packer(key.language)
    }

    pub fn create_job_packer_using_packer_type(
        &self,
        packer_type: JobPackerType,
    ) -> Result<RasterJobPacker, PackerError> {
        let known = packer_type == self.model.packer_type
            || self
                .model
                .supported_raster_configurations
                .iter()
                .any(|key| key.language == packer_type);
        if !known {
            return Err(PackerError::UnsupportedRasterFormat(format!(
                "{} does not print {}",
                self.model.name, packer_type
            )));
        }
        self.create_job_packer(packer_type)
    }

    fn create_job_packer(&self, packer_type: JobPackerType) -> Result<RasterJobPacker, PackerError> {
        let session = DeviceSession::new(&self.address, self.connector(), self.registry.clone())?;
        log::debug!(
            "{} packer created for {} at {}",
            packer_type,
            self.model.name,
            self.address
        );
        Ok(
            RasterJobPacker::new(packer_type, self.model.clone(), self.config.clone())?
                .with_device(session),
        )
    }
}
