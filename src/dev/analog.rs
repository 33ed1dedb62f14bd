//! Support for Grove analog sensors: rotary angle, sound and light
use crate::driver::GrovePi;
use crate::error::{Error, LifecycleError};
use crate::event::{ChangeFilter, Event, Publisher};
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
    value: Mutex<ChangeFilter<u16>>,
    events: Publisher<I2C::Error>,
}

impl<I2C, D> Sample for Sampler<I2C, D>
where
    I2C: I2c + Send + 'static,
    I2C::Error: Send + 'static,
    D: DelayNs + Send + 'static,
{
    fn sample(&self) {
        match self.grovepi.read_analog(self.pin) {
            Ok(value) => {
                if lock(&self.value).update(value) {
                    self.events.publish(Event::Data(value));
                }
            }
            Err(e) => {
                tracing::warn!(pin = %self.pin, error = %e, "analog read failed");
                self.events.publish(Event::Error(e));
            }
        }
    }
}

/// A sensor on one of the analog ports.  Publishes [`Event::Data`] with the raw ADC value
/// (0..=1023) whenever it changes.
pub struct AnalogSensor<I2C: I2c, D> {
    name: String,
    sampler: Arc<Sampler<I2C, D>>,
    poller: Poller,
}

impl<I2C, D> AnalogSensor<I2C, D>
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
            name: "AnalogSensor".into(),
            sampler: Arc::new(Sampler {
                grovepi,
                pin,
                value: Mutex::new(ChangeFilter::new()),
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

    pub fn value(&self) -> Option<u16> {
        lock(&self.sampler.value).last()
    }

    pub fn read(&self) -> Result<u16, Error<I2C::Error>> {
        self.sampler.grovepi.read_analog(self.sampler.pin)
    }

    pub fn start(&self) -> Result<(), LifecycleError> {
        if self.poller.is_running() {
            return Err(LifecycleError::AlreadyRunning);
        }
        *lock(&self.sampler.value) = ChangeFilter::new();
        self.poller.start(&self.name, self.sampler.clone())
    }

    pub fn halt(&self) -> Result<(), LifecycleError> {
        self.poller.halt()
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }
}
