//! Turns device descriptors into live drivers, keeping pins and names unique across the board.
use crate::config::DeviceDescriptor;
use crate::dev::analog::{self, AnalogSensor};
use crate::dev::button::{self, Button};
use crate::dev::buzzer::Buzzer;
use crate::dev::dht::{self, TemperatureHumiditySensor};
use crate::dev::lcd::LcdPanel;
use crate::dev::led::Led;
use crate::dev::ultrasonic::{self, UltrasonicRanger};
use crate::driver::GrovePi;
use crate::error::{DecodeError, LifecycleError, RegistryError};
use crate::event::Event;
use crate::pin::{PinClass, PinId};
use core::fmt;
use core::str::FromStr;
use crossbeam_channel::Receiver;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// The driver kinds a descriptor may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Led,
    RotarySensor,
    Button,
    Buzzer,
    SoundSensor,
    LightSensor,
    LcdPanel,
    DhtSensor,
    UltrasonicRanger,
}

impl DriverKind {
    pub const ALL: [DriverKind; 9] = [
        DriverKind::Led,
        DriverKind::RotarySensor,
        DriverKind::Button,
        DriverKind::Buzzer,
        DriverKind::SoundSensor,
        DriverKind::LightSensor,
        DriverKind::LcdPanel,
        DriverKind::DhtSensor,
        DriverKind::UltrasonicRanger,
    ];

    /// Name used for this kind in device descriptors.
    pub fn driver_name(self) -> &'static str {
        match self {
            DriverKind::Led => "GroveLedDriver",
            DriverKind::RotarySensor => "GroveRotaryDriver",
            DriverKind::Button => "GroveButtonDriver",
            DriverKind::Buzzer => "GroveBuzzerDriver",
            DriverKind::SoundSensor => "GroveSoundSensorDriver",
            DriverKind::LightSensor => "GroveLightSensorDriver",
            DriverKind::LcdPanel => "GroveLcdDriver",
            DriverKind::DhtSensor => "GroveTemperatureAndHumidityDriver",
            DriverKind::UltrasonicRanger => "GroveUltrasonicRangerDriver",
        }
    }
}

impl FromStr for DriverKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DriverKind::ALL
            .into_iter()
            .find(|k| k.driver_name() == s)
            .ok_or_else(|| RegistryError::UnsupportedDriver(s.to_owned()))
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver_name())
    }
}

/// A live driver owned by the registry.
pub enum Device<I2C: I2c, D> {
    Led(Led<I2C, D>),
    RotarySensor(AnalogSensor<I2C, D>),
    Button(Button<I2C, D>),
    Buzzer(Buzzer<I2C, D>),
    SoundSensor(AnalogSensor<I2C, D>),
    LightSensor(AnalogSensor<I2C, D>),
    LcdPanel(LcdPanel),
    DhtSensor(TemperatureHumiditySensor<I2C, D>),
    UltrasonicRanger(UltrasonicRanger<I2C, D>),
}

impl<I2C, D> Device<I2C, D>
where
    I2C: I2c + Send + 'static,
    I2C::Error: Send + 'static,
    D: DelayNs + Send + 'static,
{
    /// Build the driver a descriptor asks for.
    pub fn from_descriptor(
        grovepi: &Arc<GrovePi<I2C, D>>,
        kind: DriverKind,
        descriptor: &DeviceDescriptor,
    ) -> Result<Self, DecodeError> {
        let pin = || descriptor.pin.parse::<PinId>();
        let interval = |default: Duration| {
            descriptor
                .sampling_interval()
                .map(|interval| interval.unwrap_or(default))
        };
        let analog_sensor = |interval: Duration| -> Result<_, DecodeError> {
            Ok(AnalogSensor::with_interval(grovepi.clone(), pin()?, interval))
        };

        let device = match kind {
            DriverKind::LcdPanel => Device::LcdPanel(LcdPanel::from_socket(&descriptor.pin)?),
            DriverKind::Led => Device::Led(Led::new(grovepi.clone(), pin()?)),
            DriverKind::Buzzer => Device::Buzzer(Buzzer::new(grovepi.clone(), pin()?)),
            DriverKind::Button => Device::Button(Button::with_interval(
                grovepi.clone(),
                pin()?,
                interval(button::DEFAULT_INTERVAL)?,
            )),
            DriverKind::RotarySensor => {
                Device::RotarySensor(analog_sensor(interval(analog::DEFAULT_INTERVAL)?)?)
            }
            DriverKind::SoundSensor => {
                Device::SoundSensor(analog_sensor(interval(analog::DEFAULT_INTERVAL)?)?)
            }
            DriverKind::LightSensor => {
                Device::LightSensor(analog_sensor(interval(analog::DEFAULT_INTERVAL)?)?)
            }
            DriverKind::DhtSensor => Device::DhtSensor(TemperatureHumiditySensor::with_interval(
                grovepi.clone(),
                pin()?,
                interval(dht::DEFAULT_INTERVAL)?,
            )),
            DriverKind::UltrasonicRanger => {
                Device::UltrasonicRanger(UltrasonicRanger::with_interval(
                    grovepi.clone(),
                    pin()?,
                    interval(ultrasonic::DEFAULT_INTERVAL)?,
                ))
            }
        };
        Ok(device)
    }

    pub fn kind(&self) -> DriverKind {
        match self {
            Device::Led(_) => DriverKind::Led,
            Device::RotarySensor(_) => DriverKind::RotarySensor,
            Device::Button(_) => DriverKind::Button,
            Device::Buzzer(_) => DriverKind::Buzzer,
            Device::SoundSensor(_) => DriverKind::SoundSensor,
            Device::LightSensor(_) => DriverKind::LightSensor,
            Device::LcdPanel(_) => DriverKind::LcdPanel,
            Device::DhtSensor(_) => DriverKind::DhtSensor,
            Device::UltrasonicRanger(_) => DriverKind::UltrasonicRanger,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Device::Led(d) => d.name(),
            Device::Buzzer(d) => d.name(),
            Device::Button(d) => d.name(),
            Device::RotarySensor(d) | Device::SoundSensor(d) | Device::LightSensor(d) => d.name(),
            Device::LcdPanel(d) => d.name(),
            Device::DhtSensor(d) => d.name(),
            Device::UltrasonicRanger(d) => d.name(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Device::Led(d) => d.set_name(name),
            Device::Buzzer(d) => d.set_name(name),
            Device::Button(d) => d.set_name(name),
            Device::RotarySensor(d) | Device::SoundSensor(d) | Device::LightSensor(d) => {
                d.set_name(name)
            }
            Device::LcdPanel(d) => d.set_name(name),
            Device::DhtSensor(d) => d.set_name(name),
            Device::UltrasonicRanger(d) => d.set_name(name),
        }
    }

    /// Polling interval, for the kinds that poll.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Device::Button(d) => Some(d.interval()),
            Device::RotarySensor(d) | Device::SoundSensor(d) | Device::LightSensor(d) => {
                Some(d.interval())
            }
            Device::DhtSensor(d) => Some(d.interval()),
            Device::UltrasonicRanger(d) => Some(d.interval()),
            Device::Led(_) | Device::Buzzer(_) | Device::LcdPanel(_) => None,
        }
    }

    /// Event stream, for the kinds that poll.
    pub fn events(&self) -> Option<Receiver<Event<I2C::Error>>> {
        match self {
            Device::Button(d) => Some(d.events()),
            Device::RotarySensor(d) | Device::SoundSensor(d) | Device::LightSensor(d) => {
                Some(d.events())
            }
            Device::DhtSensor(d) => Some(d.events()),
            Device::UltrasonicRanger(d) => Some(d.events()),
            Device::Led(_) | Device::Buzzer(_) | Device::LcdPanel(_) => None,
        }
    }

    /// Start background polling.  Devices that do not poll accept this as a no-op.
    pub fn start(&self) -> Result<(), LifecycleError> {
        match self {
            Device::Button(d) => d.start(),
            Device::RotarySensor(d) | Device::SoundSensor(d) | Device::LightSensor(d) => {
                d.start()
            }
            Device::DhtSensor(d) => d.start(),
            Device::UltrasonicRanger(d) => d.start(),
            Device::Led(_) | Device::Buzzer(_) | Device::LcdPanel(_) => Ok(()),
        }
    }

    pub fn halt(&self) -> Result<(), LifecycleError> {
        match self {
            Device::Button(d) => d.halt(),
            Device::RotarySensor(d) | Device::SoundSensor(d) | Device::LightSensor(d) => d.halt(),
            Device::DhtSensor(d) => d.halt(),
            Device::UltrasonicRanger(d) => d.halt(),
            Device::Led(_) | Device::Buzzer(_) | Device::LcdPanel(_) => Ok(()),
        }
    }

    pub fn is_running(&self) -> bool {
        match self {
            Device::Button(d) => d.is_running(),
            Device::RotarySensor(d) | Device::SoundSensor(d) | Device::LightSensor(d) => {
                d.is_running()
            }
            Device::DhtSensor(d) => d.is_running(),
            Device::UltrasonicRanger(d) => d.is_running(),
            Device::Led(_) | Device::Buzzer(_) | Device::LcdPanel(_) => false,
        }
    }
}

/// All devices on one board, indexed by name and by pin.
pub struct Registry<I2C: I2c, D> {
    devices: Vec<Device<I2C, D>>,
    by_name: HashMap<String, usize>,
    by_pin: HashMap<String, usize>,
}

impl<I2C: I2c, D> Default for Registry<I2C, D> {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            by_name: HashMap::new(),
            by_pin: HashMap::new(),
        }
    }
}

/// Registry key of a pin: `D<n>` or `A<n>`, with an unprefixed number counting as digital.
/// Identifiers that are not controller pins (LCD sockets) are compared case-folded.
fn pin_key(pin: &str) -> String {
    match pin.parse::<PinId>() {
        Ok(id) if id.class() == PinClass::Analog => format!("A{}", id.number()),
        Ok(id) => format!("D{}", id.number()),
        Err(_) => pin.to_ascii_uppercase(),
    }
}

impl<I2C, D> Registry<I2C, D>
where
    I2C: I2c + Send + 'static,
    I2C::Error: Send + 'static,
    D: DelayNs + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate and register `descriptors` in order.
    ///
    /// The first rejected descriptor aborts the batch and its error is returned.  Devices
    /// registered before it stay registered.
    pub fn register<'a>(
        &mut self,
        grovepi: &Arc<GrovePi<I2C, D>>,
        descriptors: impl IntoIterator<Item = &'a DeviceDescriptor>,
    ) -> Result<(), RegistryError> {
        for descriptor in descriptors {
            self.register_one(grovepi, descriptor)?;
        }
        Ok(())
    }

    fn register_one(
        &mut self,
        grovepi: &Arc<GrovePi<I2C, D>>,
        descriptor: &DeviceDescriptor,
    ) -> Result<(), RegistryError> {
        let pin = pin_key(&descriptor.pin);
        if self.by_pin.contains_key(&pin) {
            return Err(RegistryError::PinInUse(descriptor.pin.clone()));
        }
        if self.by_name.contains_key(&descriptor.name) {
            return Err(RegistryError::NameInUse(descriptor.name.clone()));
        }
        let kind: DriverKind = descriptor.driver.parse()?;
        let mut device = Device::from_descriptor(grovepi, kind, descriptor).map_err(|source| {
            RegistryError::Decode {
                name: descriptor.name.clone(),
                source,
            }
        })?;
        device.set_name(descriptor.name.as_str());

        tracing::info!(
            name = %descriptor.name,
            %kind,
            pin = %descriptor.pin,
            "device registered"
        );
        let index = self.devices.len();
        self.devices.push(device);
        self.by_name.insert(descriptor.name.clone(), index);
        self.by_pin.insert(pin, index);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Device<I2C, D>> {
        self.by_name.get(name).map(|&i| &self.devices[i])
    }

    pub fn get_by_pin(&self, pin: &str) -> Option<&Device<I2C, D>> {
        self.by_pin.get(&pin_key(pin)).map(|&i| &self.devices[i])
    }

    /// Devices in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Device<I2C, D>> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
