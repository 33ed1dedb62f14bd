//! Support for the Grove "Button"
use crate::driver::GrovePi;
use crate::error::{Error, LifecycleError};
use crate::event::{Event, Publisher};
use crate::pin::PinId;
use crate::polling::{lock, Poller, Sample};
use crossbeam_channel::Receiver;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

struct Sampler<I2C: I2c, D> {
    grovepi: Arc<GrovePi<I2C, D>>,
    pin: PinId,
    /// Starts released, so an idle button publishes nothing.
    pressed: Mutex<bool>,
    events: Publisher<I2C::Error>,
}

impl<I2C, D> Sample for Sampler<I2C, D>
where
    I2C: I2c + Send + 'static,
    I2C::Error: Send + 'static,
    D: DelayNs + Send + 'static,
{
    fn sample(&self) {
        match self.grovepi.read_digital(self.pin) {
            Ok(level) => {
                let pressed = level != 0;
                let changed = std::mem::replace(&mut *lock(&self.pressed), pressed) != pressed;
                if changed {
                    self.events
                        .publish(if pressed { Event::Push } else { Event::Release });
                }
            }
            Err(e) => {
                tracing::warn!(pin = %self.pin, error = %e, "button read failed");
                self.events.publish(Event::Error(e));
            }
        }
    }
}

/// Grove push button.  Publishes [`Event::Push`] and [`Event::Release`] on state changes.
pub struct Button<I2C: I2c, D> {
    name: String,
    sampler: Arc<Sampler<I2C, D>>,
    poller: Poller,
}

impl<I2C, D> Button<I2C, D>
where
    I2C: I2c + Send + 'static,
    I2C::Error: Send + 'static,
    D: DelayNs + Send + 'static,
{
    pub fn new(grovepi: Arc<GrovePi<I2C, D>>, pin: PinId) -> Self {
        Self::with_interval(grovepi, pin, DEFAULT_INTERVAL)
    }

    pub fn with_interval(grovepi: Arc<GrovePi<I2C, D>>, pin: PinId, interval: Duration) -> Self {
        Self {
            name: "Button".into(),
            sampler: Arc::new(Sampler {
                grovepi,
                pin,
                pressed: Mutex::new(false),
                events: Publisher::new(),
            }),
            poller: Poller::new(interval),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn pin(&self) -> PinId {
        self.sampler.pin
    }

    pub fn interval(&self) -> Duration {
        self.poller.interval()
    }

    pub fn events(&self) -> Receiver<Event<I2C::Error>> {
        self.sampler.events.subscribe()
    }

    pub fn is_pressed(&self) -> bool {
        *lock(&self.sampler.pressed)
    }

    pub fn read(&self) -> Result<u8, Error<I2C::Error>> {
        self.sampler.grovepi.read_digital(self.sampler.pin)
    }

    /// Start polling from the released state, so a button held down across a restart is
    /// reported with a fresh [`Event::Push`].
    pub fn start(&self) -> Result<(), LifecycleError> {
        if self.poller.is_running() {
            return Err(LifecycleError::AlreadyRunning);
        }
        *lock(&self.sampler.pressed) = false;
        self.poller.start(&self.name, self.sampler.clone())
    }

    pub fn halt(&self) -> Result<(), LifecycleError> {
        self.poller.halt()
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::fake::FakeController;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn push_and_release() {
        let expectations = [
            mock_i2c::Transaction::write(0x04, vec![0x05, 0x02, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x05]),
            mock_i2c::Transaction::write(0x04, vec![0x01, 0x02, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x01, 0x01]),
            mock_i2c::Transaction::write(0x04, vec![0x01, 0x02, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x01, 0x01]),
            mock_i2c::Transaction::write(0x04, vec![0x01, 0x02, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x01, 0x00]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let gp = Arc::new(GrovePi::new(bus.clone(), NoopDelay::new()));
        let button = Button::new(gp, "D2".parse().unwrap());
        let events = button.events();

        button.sampler.sample();
        assert!(button.is_pressed());
        button.sampler.sample();
        button.sampler.sample();
        assert!(!button.is_pressed());

        let names: Vec<_> = events.try_iter().map(|e| e.name()).collect();
        assert_eq!(names, ["push", "release"]);

        bus.done();
    }

    #[test]
    fn restart_reports_held_button() {
        let fake = FakeController::default();
        let gp = Arc::new(GrovePi::new(fake.clone(), NoopDelay::new()));
        let button = Button::with_interval(gp, "D2".parse().unwrap(), Duration::from_millis(1));
        let events = button.events();
        let next = || events.recv_timeout(Duration::from_secs(5)).map(|e| e.name());

        button.start().unwrap();
        fake.set_digital(1);
        assert_eq!(next(), Ok("push"));
        fake.set_digital(0);
        assert_eq!(next(), Ok("release"));
        fake.set_digital(1);
        assert_eq!(next(), Ok("push"));
        button.halt().unwrap();
        assert!(button.is_pressed());

        // still held: the restart starts from released and pushes again
        button.start().unwrap();
        assert_eq!(next(), Ok("push"));
        button.halt().unwrap();
        assert!(events.try_recv().is_err());
    }
}
