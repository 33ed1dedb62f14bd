//! A controller together with the devices plugged into it.
use crate::config::BoardConfig;
use crate::driver::GrovePi;
use crate::error::{LifecycleError, RegistryError};
use crate::registry::{Device, Registry};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use std::sync::Arc;

/// Owns the controller driver and the registry built from a [`BoardConfig`].
pub struct Board<I2C: I2c, D> {
    grovepi: Arc<GrovePi<I2C, D>>,
    registry: Registry<I2C, D>,
}

impl<I2C, D> Board<I2C, D>
where
    I2C: I2c + Send + 'static,
    I2C::Error: Send + 'static,
    D: DelayNs + Send + 'static,
{
    /// Connect to the controller and register every configured device.
    pub fn new(i2c: I2C, delay: D, config: &BoardConfig) -> Result<Self, RegistryError> {
        let grovepi = Arc::new(GrovePi::with_address(
            i2c,
            delay,
            config.controller_address(),
        ));
        let mut registry = Registry::new();
        registry.register(&grovepi, &config.devices)?;
        Ok(Self { grovepi, registry })
    }

    pub fn grovepi(&self) -> &Arc<GrovePi<I2C, D>> {
        &self.grovepi
    }

    pub fn registry(&self) -> &Registry<I2C, D> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<I2C, D> {
        &mut self.registry
    }

    pub fn device(&self, name: &str) -> Option<&Device<I2C, D>> {
        self.registry.get(name)
    }

    /// Start polling on every device that is not already running.
    pub fn start(&self) -> Result<(), LifecycleError> {
        for device in self.registry.iter().filter(|d| !d.is_running()) {
            device.start()?;
        }
        tracing::debug!(devices = self.registry.len(), "board started");
        Ok(())
    }

    /// Halt every running device.
    pub fn halt(&self) -> Result<(), LifecycleError> {
        for device in self.registry.iter().filter(|d| d.is_running()) {
            device.halt()?;
        }
        tracing::debug!("board halted");
        Ok(())
    }
}
