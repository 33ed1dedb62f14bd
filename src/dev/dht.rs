//! Support for the Grove "Temperature & Humidity Sensor" (DHT11/DHT22)
use crate::common::TemperatureHumidity;
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

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(600);

#[derive(Clone, Copy)]
struct Latest {
    temperature: ChangeFilter<f32>,
    humidity: ChangeFilter<f32>,
}

impl Latest {
    fn new() -> Self {
        Self {
            temperature: ChangeFilter::new(),
            humidity: ChangeFilter::new(),
        }
    }
}

struct Sampler<I2C: I2c, D> {
    grovepi: Arc<GrovePi<I2C, D>>,
    pin: PinId,
    latest: Mutex<Latest>,
    events: Publisher<I2C::Error>,
}

impl<I2C, D> Sample for Sampler<I2C, D>
where
    I2C: I2c + Send + 'static,
    I2C::Error: Send + 'static,
    D: DelayNs + Send + 'static,
{
    fn sample(&self) {
        let reading = match self.grovepi.read_dht(self.pin) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(pin = %self.pin, error = %e, "DHT read failed");
                self.events.publish(Event::Error(e));
                return;
            }
        };

        let (new_temperature, new_humidity) = {
            let mut latest = lock(&self.latest);
            (
                latest.temperature.update(reading.temperature),
                latest.humidity.update(reading.humidity),
            )
        };
        if new_temperature {
            self.events.publish(Event::Temperature(reading.temperature));
        }
        if new_humidity {
            self.events.publish(Event::Humidity(reading.humidity));
        }
    }
}

/// Grove temperature and humidity sensor.
///
/// Publishes [`Event::Temperature`] (Celsius) and [`Event::Humidity`] (percent) independently,
/// each only when its value changed.
pub struct TemperatureHumiditySensor<I2C: I2c, D> {
    name: String,
    sampler: Arc<Sampler<I2C, D>>,
    poller: Poller,
}

impl<I2C, D> TemperatureHumiditySensor<I2C, D>
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
            name: "TemperatureAndHumiditySensor".into(),
            sampler: Arc::new(Sampler {
                grovepi,
                pin,
                latest: Mutex::new(Latest::new()),
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

    /// Last published temperature.  Does not touch the bus.
    pub fn temperature(&self) -> Option<f32> {
        lock(&self.sampler.latest).temperature.last()
    }

    /// Last published humidity.  Does not touch the bus.
    pub fn humidity(&self) -> Option<f32> {
        lock(&self.sampler.latest).humidity.last()
    }

    pub fn read(&self) -> Result<TemperatureHumidity, Error<I2C::Error>> {
        self.sampler.grovepi.read_dht(self.sampler.pin)
    }

    pub fn start(&self) -> Result<(), LifecycleError> {
        if self.poller.is_running() {
            return Err(LifecycleError::AlreadyRunning);
        }
        *lock(&self.sampler.latest) = Latest::new();
        self.poller.start(&self.name, self.sampler.clone())
    }

    pub fn halt(&self) -> Result<(), LifecycleError> {
        self.poller.halt()
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }
}
