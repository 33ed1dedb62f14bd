//! Support for the Grove "Ultrasonic Ranger" distance sensor
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
    distance: Mutex<ChangeFilter<u16>>,
    events: Publisher<I2C::Error>,
}

impl<I2C, D> Sample for Sampler<I2C, D>
where
    I2C: I2c + Send + 'static,
    I2C::Error: Send + 'static,
    D: DelayNs + Send + 'static,
{
    fn sample(&self) {
        match self.grovepi.read_ultrasonic(self.pin) {
            Ok(distance) => {
                if lock(&self.distance).update(distance) {
                    self.events.publish(Event::Data(distance));
                }
            }
            Err(e) => {
                tracing::warn!(pin = %self.pin, error = %e, "ultrasonic read failed");
                self.events.publish(Event::Error(e));
            }
        }
    }
}

/// Grove ultrasonic ranger.  Publishes [`Event::Data`] with the distance in centimeters
/// whenever it changes.
pub struct UltrasonicRanger<I2C: I2c, D> {
    name: String,
    sampler: Arc<Sampler<I2C, D>>,
    poller: Poller,
}

impl<I2C, D> UltrasonicRanger<I2C, D>
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
            name: "UltrasonicRanger".into(),
            sampler: Arc::new(Sampler {
                grovepi,
                pin,
                distance: Mutex::new(ChangeFilter::new()),
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

    /// Last published distance.  Does not touch the bus.
    pub fn distance(&self) -> Option<u16> {
        lock(&self.sampler.distance).last()
    }

    /// Take a single reading outside of the polling loop.
    pub fn read(&self) -> Result<u16, Error<I2C::Error>> {
        self.sampler.grovepi.read_ultrasonic(self.sampler.pin)
    }

    /// Start polling.  The first successful sample after a start is always published.
    pub fn start(&self) -> Result<(), LifecycleError> {
        if self.poller.is_running() {
            return Err(LifecycleError::AlreadyRunning);
        }
        *lock(&self.sampler.distance) = ChangeFilter::new();
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
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    fn ranging(distance: u8) -> [mock_i2c::Transaction; 5] {
        [
            mock_i2c::Transaction::write(0x04, vec![0x05, 0x06, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x05]),
            mock_i2c::Transaction::write(0x04, vec![0x07, 0x06, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x07]),
            mock_i2c::Transaction::read(0x04, vec![0x07, 0x00, distance]),
        ]
    }

    #[test]
    fn publishes_changes_only() {
        let expectations: Vec<_> = [5, 5, 7].into_iter().flat_map(ranging).collect();
        let mut bus = mock_i2c::Mock::new(&expectations);

        let gp = Arc::new(GrovePi::new(bus.clone(), NoopDelay::new()));
        let ranger = UltrasonicRanger::new(gp, "D6".parse().unwrap());
        let events = ranger.events();

        for _ in 0..3 {
            ranger.sampler.sample();
        }
        let published: Vec<_> = events
            .try_iter()
            .map(|e| match e {
                Event::Data(d) => d,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(published, [5, 7]);
        assert_eq!(ranger.distance(), Some(7));

        bus.done();
    }

    #[test]
    fn first_sample_of_zero_is_published() {
        let expectations = ranging(0);
        let mut bus = mock_i2c::Mock::new(&expectations);

        let gp = Arc::new(GrovePi::new(bus.clone(), NoopDelay::new()));
        let ranger = UltrasonicRanger::new(gp, "D6".parse().unwrap());
        let events = ranger.events();

        ranger.sampler.sample();
        assert!(matches!(events.try_recv(), Ok(Event::Data(0))));

        bus.done();
    }

    #[test]
    fn error_event_keeps_state() {
        let mut expectations = ranging(9).to_vec();
        expectations.extend([
            mock_i2c::Transaction::write(0x04, vec![0x05, 0x06, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x05]),
            mock_i2c::Transaction::write(0x04, vec![0x07, 0x06, 0x00, 0x00]),
            mock_i2c::Transaction::read(0x04, vec![0x07]),
            mock_i2c::Transaction::read(0x04, vec![0x00, 0x00, 0x00]).with_error(ErrorKind::Other),
        ]);
        expectations.extend(ranging(9));
        let mut bus = mock_i2c::Mock::new(&expectations);

        let gp = Arc::new(GrovePi::new(bus.clone(), NoopDelay::new()));
        let ranger = UltrasonicRanger::new(gp, "D6".parse().unwrap());
        let events = ranger.events();

        for _ in 0..3 {
            ranger.sampler.sample();
        }
        let names: Vec<_> = events.try_iter().map(|e| e.name()).collect();
        assert_eq!(names, ["data", "error"]);
        assert_eq!(ranger.distance(), Some(9));

        bus.done();
    }

    #[test]
    fn halt_stops_events() {
        let fake = FakeController::ramping();
        fake.set_distance(1);
        let gp = Arc::new(GrovePi::new(fake, NoopDelay::new()));
        let ranger =
            UltrasonicRanger::with_interval(gp, "D4".parse().unwrap(), Duration::from_millis(1));
        let events = ranger.events();

        ranger.start().unwrap();
        for expected in 1..=3 {
            match events.recv_timeout(Duration::from_secs(5)) {
                Ok(Event::Data(d)) => assert_eq!(d, expected),
                other => panic!("unexpected {other:?}"),
            }
        }
        ranger.halt().unwrap();
        assert!(!ranger.is_running());

        // drain whatever was published before the halt returned
        let _ = events.try_iter().count();
        std::thread::sleep(Duration::from_millis(20));
        assert!(events.try_recv().is_err());

        assert_eq!(ranger.halt(), Err(LifecycleError::AlreadyStopped));
    }
}
