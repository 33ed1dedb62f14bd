//! Driver for the GrovePi I2C I/O expansion board and the Grove modules plugged into it.
//!
//! [`GrovePi`] speaks the controller's 4-byte command protocol over any `embedded-hal` I2C bus.
//! The drivers in [`dev`] share one `GrovePi` and either act on demand (LED, buzzer) or poll in
//! a background thread and publish [`Event`]s.  [`Board`] builds all of it from a
//! [`BoardConfig`].

mod board;
mod bus;
mod common;
mod config;
pub mod dev;
mod driver;
mod error;
mod event;
mod pin;
mod polling;
mod registry;

pub use board::Board;
pub use common::decode_f32_le;
pub use common::{Command, Direction, Frame, TemperatureHumidity, DEFAULT_ADDRESS};
pub use config::{parse_duration, BoardConfig, DeviceDescriptor, SAMPLING_INTERVAL};
pub use driver::{GrovePi, ThreadSleep};
pub use error::{DecodeError, Error, LifecycleError, RegistryError};
pub use event::{Event, DATA, ERROR, HUMIDITY, PUSH, RELEASE, TEMPERATURE};
pub use pin::{pin_number, PinClass, PinId};
pub use registry::{Device, DriverKind, Registry};
