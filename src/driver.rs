//! Command protocol driver for the GrovePi bus controller.
//!
//! Every operation is one bus transaction: the driver lock is held from the first frame write
//! to the last response read, including the firmware-mandated delays in between.  A frame from
//! another thread landing inside that window would corrupt both responses.
use crate::bus::I2cExt;
use crate::common::{Command, Direction, TemperatureHumidity, DEFAULT_ADDRESS};
use crate::error::Error;
use crate::pin::PinId;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Settle delay after ordinary command frames.
const SETTLE_MS: u32 = 2;
/// Time for the controller to fire the ranging pulse and time the echo.
const ULTRASONIC_MEASURE_MS: u32 = 300;
/// Sensor acquisition time of a DHT read.
const DHT_MEASURE_MS: u32 = 600;
/// Controller-side processing margin between ack and payload.
const PAYLOAD_MARGIN_MS: u32 = 100;

/// [`DelayNs`] implementation backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl DelayNs for ThreadSleep {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns.into()));
    }
}

/// Exclusively owned bus state: transport, delay source and pin mode cache.
struct Bus<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
    modes: HashMap<u8, Direction>,
}

impl<I2C: I2c, D: DelayNs> Bus<I2C, D> {
    fn force_pin_mode(&mut self, pin: u8, dir: Direction) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write_frame(self.addr, Command::SetPinMode.frame(pin, dir.mode_byte(), 0))?;
        self.delay.delay_ms(SETTLE_MS);
        self.i2c.read_ack(self.addr)?;
        self.modes.insert(pin, dir);
        tracing::debug!(pin, ?dir, "pin mode set");
        Ok(())
    }

    fn ensure_pin_mode(&mut self, pin: u8, dir: Direction) -> Result<(), Error<I2C::Error>> {
        if self.modes.get(&pin) == Some(&dir) {
            return Ok(());
        }
        self.force_pin_mode(pin, dir)
    }

    /// Write `cmd`, settle, then read the 1-byte acknowledgement.
    fn command_with_ack(
        &mut self,
        cmd: Command,
        pin: u8,
        value: u8,
    ) -> Result<(), Error<I2C::Error>> {
        self.i2c.write_frame(self.addr, cmd.frame(pin, value, 0))?;
        self.delay.delay_ms(SETTLE_MS);
        self.i2c.read_ack(self.addr)?;
        Ok(())
    }

    /// Write `cmd`, settle, then read an `N`-byte response echoing the opcode.
    fn query<const N: usize>(
        &mut self,
        cmd: Command,
        pin: u8,
    ) -> Result<[u8; N], Error<I2C::Error>> {
        self.i2c.write_frame(self.addr, cmd.frame(pin, 0, 0))?;
        self.delay.delay_ms(SETTLE_MS);
        let data: [u8; N] = self.i2c.read_payload(self.addr)?;
        if data[0] != u8::from(cmd) {
            return Err(Error::ProtocolMismatch {
                expected: cmd.into(),
                actual: data[0],
            });
        }
        Ok(data)
    }

    /// The long-running sensor commands: forced input mode, frame, measurement wait, ack,
    /// processing margin, payload.
    fn measure<const N: usize>(
        &mut self,
        cmd: Command,
        pin: u8,
        measure_ms: u32,
    ) -> Result<[u8; N], Error<I2C::Error>> {
        self.force_pin_mode(pin, Direction::Input)?;
        self.i2c.write_frame(self.addr, cmd.frame(pin, 0, 0))?;
        self.delay.delay_ms(measure_ms);
        self.i2c.read_ack(self.addr)?;
        self.delay.delay_ms(PAYLOAD_MARGIN_MS);
        self.i2c.read_payload(self.addr)
    }
}

/// Driver for the GrovePi bus controller.
///
/// This is the single point of access to the controller; sensor and actuator drivers share it
/// behind an [`Arc`](std::sync::Arc) and all their traffic funnels through here.
pub struct GrovePi<I2C, D> {
    bus: Mutex<Bus<I2C, D>>,
}

impl<I2C, D> GrovePi<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a driver for a controller at the default address `0x04`.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, delay: D, addr: u8) -> Self {
        Self {
            bus: Mutex::new(Bus {
                i2c,
                delay,
                addr,
                modes: HashMap::new(),
            }),
        }
    }

    pub fn address(&self) -> u8 {
        self.transaction(|bus| bus.addr)
    }

    /// Last direction configured for `pin` by this driver, if any.
    pub fn cached_pin_mode(&self, pin: PinId) -> Option<Direction> {
        self.transaction(|bus| bus.modes.get(&pin.number()).copied())
    }

    /// Configure the direction of `pin`.
    ///
    /// The `SetPinMode` frame is only sent when the cache does not already hold `dir` for this
    /// pin.
    pub fn set_pin_mode(&self, pin: PinId, dir: Direction) -> Result<(), Error<I2C::Error>> {
        self.transaction(|bus| bus.ensure_pin_mode(pin.number(), dir))
    }

    pub fn read_digital(&self, pin: PinId) -> Result<u8, Error<I2C::Error>> {
        let pin = pin.number();
        self.transaction(|bus| {
            bus.ensure_pin_mode(pin, Direction::Input)?;
            let data: [u8; 2] = bus.query(Command::ReadDigital, pin)?;
            Ok(data[1])
        })
    }

    pub fn write_digital(&self, pin: PinId, value: u8) -> Result<(), Error<I2C::Error>> {
        let pin = pin.number();
        self.transaction(|bus| {
            bus.ensure_pin_mode(pin, Direction::Output)?;
            bus.command_with_ack(Command::WriteDigital, pin, value)
        })
    }

    /// Read the 10-bit ADC value of an analog port.
    pub fn read_analog(&self, pin: PinId) -> Result<u16, Error<I2C::Error>> {
        let pin = pin.number();
        self.transaction(|bus| {
            let data: [u8; 3] = bus.query(Command::ReadAnalog, pin)?;
            Ok(u16::from(data[1]) * 256 + u16::from(data[2]))
        })
    }

    /// PWM output on a PWM-capable digital port.  The pin mode is left untouched.
    pub fn write_analog(&self, pin: PinId, value: u8) -> Result<(), Error<I2C::Error>> {
        let pin = pin.number();
        self.transaction(|bus| bus.command_with_ack(Command::WriteAnalog, pin, value))
    }

    /// Distance in centimeters measured by an ultrasonic ranger on `pin`.
    ///
    /// The sensor is retriggered on every call, so input mode is always re-sent.
    pub fn read_ultrasonic(&self, pin: PinId) -> Result<u16, Error<I2C::Error>> {
        let pin = pin.number();
        self.transaction(|bus| {
            let raw: [u8; 3] = bus.measure(Command::ReadUltrasonic, pin, ULTRASONIC_MEASURE_MS)?;
            Ok(u16::from(raw[1]) * 255 + u16::from(raw[2]))
        })
    }

    /// Temperature and humidity from a DHT sensor on `pin`.
    ///
    /// The status byte leading the payload is not validated.
    pub fn read_dht(&self, pin: PinId) -> Result<TemperatureHumidity, Error<I2C::Error>> {
        let pin = pin.number();
        let raw: [u8; TemperatureHumidity::PAYLOAD_LEN] =
            self.transaction(|bus| bus.measure(Command::ReadDht, pin, DHT_MEASURE_MS))?;
        Ok(TemperatureHumidity::from_payload(&raw)?)
    }

    fn transaction<R, F: FnOnce(&mut Bus<I2C, D>) -> R>(&self, f: F) -> R {
        // a panic inside a transaction leaves nothing half-written in the cache
        let mut bus = self.bus.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut bus)
    }
}
