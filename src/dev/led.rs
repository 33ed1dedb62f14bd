//! Support for the Grove "LED Socket Kit"
use crate::driver::GrovePi;
use crate::error::Error;
use crate::pin::PinId;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct Led<I2C, D> {
    name: String,
    grovepi: Arc<GrovePi<I2C, D>>,
    pin: PinId,
    on: AtomicBool,
}

impl<I2C: I2c, D: DelayNs> Led<I2C, D> {
    pub fn new(grovepi: Arc<GrovePi<I2C, D>>, pin: PinId) -> Self {
        Self {
            name: "Led".into(),
            grovepi,
            pin,
            on: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    pub fn on(&self) -> Result<(), Error<I2C::Error>> {
        self.set(true)
    }

    pub fn off(&self) -> Result<(), Error<I2C::Error>> {
        self.set(false)
    }

    pub fn toggle(&self) -> Result<(), Error<I2C::Error>> {
        self.set(!self.is_on())
    }

    /// PWM brightness, only on PWM-capable ports (D3, D5, D6).
    pub fn set_brightness(&self, level: u8) -> Result<(), Error<I2C::Error>> {
        self.grovepi.write_analog(self.pin, level)?;
        self.on.store(level > 0, Ordering::SeqCst);
        Ok(())
    }

    fn set(&self, on: bool) -> Result<(), Error<I2C::Error>> {
        self.grovepi.write_digital(self.pin, on.into())?;
        self.on.store(on, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn led() {
        let expectations = [
            mock_i2c::Transaction::write(0x04, vec![0x05, 0x03, 0x01, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x05]),
            mock_i2c::Transaction::write(0x04, vec![0x02, 0x03, 0x01, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x02]),
            mock_i2c::Transaction::write(0x04, vec![0x02, 0x03, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x02]),
            mock_i2c::Transaction::write(0x04, vec![0x02, 0x03, 0x01, 0x00])
                .with_error(ErrorKind::Other),
            mock_i2c::Transaction::write(0x04, vec![0x04, 0x03, 0x40, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x04]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let gp = Arc::new(GrovePi::new(bus.clone(), NoopDelay::new()));
        let led = Led::new(gp, "D3".parse().unwrap());

        led.on().unwrap();
        assert!(led.is_on());
        led.toggle().unwrap();
        assert!(!led.is_on());
        assert!(led.toggle().is_err());
        assert!(!led.is_on());
        led.set_brightness(0x40).unwrap();
        assert!(led.is_on());

        bus.done();
    }
}
