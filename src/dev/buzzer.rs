//! Support for the Grove "Buzzer"
use crate::driver::GrovePi;
use crate::error::{DecodeError, Error};
use crate::pin::PinId;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Buzzer<I2C, D> {
    name: String,
    grovepi: Arc<GrovePi<I2C, D>>,
    pin: PinId,
    on: AtomicBool,
}

impl<I2C: I2c, D: DelayNs> Buzzer<I2C, D> {
    pub fn new(grovepi: Arc<GrovePi<I2C, D>>, pin: PinId) -> Self {
        Self {
            name: "Buzzer".into(),
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

    /// Square wave of `frequency_hz` for `duration`, ending with the buzzer off.
    ///
    /// Each half period is one bus transaction, so the achievable pitch is bounded by the
    /// controller round trip.  A frequency of zero or below just turns the buzzer off; NaN,
    /// infinite frequencies and frequencies too low to express a half period are rejected.
    pub fn tone(&self, frequency_hz: f64, duration: Duration) -> Result<(), Error<I2C::Error>> {
        let invalid = || DecodeError::InvalidFrequency(frequency_hz.to_string());
        if !frequency_hz.is_finite() {
            return Err(invalid().into());
        }
        if frequency_hz <= 0.0 {
            return self.off();
        }
        let half_period =
            Duration::try_from_secs_f64(0.5 / frequency_hz).map_err(|_| invalid())?;
        let Some(deadline) = Instant::now().checked_add(duration) else {
            return self.off();
        };
        while Instant::now() < deadline {
            self.on()?;
            std::thread::sleep(half_period);
            self.off()?;
            std::thread::sleep(half_period);
        }
        self.off()
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
    use crate::dev::fake::FakeController;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn buzzer() {
        let expectations = [
            mock_i2c::Transaction::write(0x04, vec![0x05, 0x08, 0x01, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x05]),
            mock_i2c::Transaction::write(0x04, vec![0x02, 0x08, 0x01, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x02]),
            mock_i2c::Transaction::write(0x04, vec![0x02, 0x08, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x02]),
            // zero-length tone just makes sure it is off
            mock_i2c::Transaction::write(0x04, vec![0x02, 0x08, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x02]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let gp = Arc::new(GrovePi::new(bus.clone(), NoopDelay::new()));
        let buzzer = Buzzer::new(gp, "D8".parse().unwrap());

        buzzer.toggle().unwrap();
        assert!(buzzer.is_on());
        buzzer.off().unwrap();
        buzzer.tone(440.0, Duration::ZERO).unwrap();
        assert!(!buzzer.is_on());

        bus.done();
    }

    #[test]
    fn unusable_tones() {
        let fake = FakeController::default();
        let gp = Arc::new(GrovePi::new(fake.clone(), NoopDelay::new()));
        let buzzer = Buzzer::new(gp, "D8".parse().unwrap());

        assert!(matches!(
            buzzer.tone(f64::NAN, Duration::from_millis(1)),
            Err(Error::Decode(DecodeError::InvalidFrequency(_)))
        ));
        assert!(matches!(
            buzzer.tone(f64::INFINITY, Duration::from_millis(1)),
            Err(Error::Decode(DecodeError::InvalidFrequency(_)))
        ));
        // half period does not fit a Duration
        assert!(matches!(
            buzzer.tone(1e-320, Duration::from_millis(1)),
            Err(Error::Decode(DecodeError::InvalidFrequency(_)))
        ));
        assert!(fake.frames().is_empty());

        // deadline past the end of time: nothing to play, just off
        buzzer.on().unwrap();
        buzzer.tone(440.0, Duration::MAX).unwrap();
        assert!(!buzzer.is_on());
        assert_eq!(fake.frames().last(), Some(&[0x02, 0x08, 0x00, 0x00]));
    }
}
