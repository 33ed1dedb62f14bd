use crate::error::Error;
use core::fmt::Debug;
use crossbeam_channel::{Receiver, Sender};

pub const DATA: &str = "data";
pub const TEMPERATURE: &str = "temperature";
pub const HUMIDITY: &str = "humidity";
pub const ERROR: &str = "error";
pub const PUSH: &str = "push";
pub const RELEASE: &str = "release";

/// Events published by the polling drivers.
#[derive(Debug)]
pub enum Event<E: Debug> {
    /// A new distance (cm) or analog value.
    Data(u16),
    Temperature(f32),
    Humidity(f32),
    /// Button went from released to pressed.
    Push,
    /// Button went from pressed to released.
    Release,
    /// A sample failed.  Polling carries on.
    Error(Error<E>),
}

impl<E: Debug> Event<E> {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Data(_) => DATA,
            Event::Temperature(_) => TEMPERATURE,
            Event::Humidity(_) => HUMIDITY,
            Event::Push => PUSH,
            Event::Release => RELEASE,
            Event::Error(_) => ERROR,
        }
    }
}

/// Per-driver event stream.  Delivery order matches publish order.
pub(crate) struct Publisher<E: Debug> {
    tx: Sender<Event<E>>,
    rx: Receiver<Event<E>>,
}

impl<E: Debug> Publisher<E> {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn publish(&self, event: Event<E>) {
        tracing::trace!(event = event.name(), "publish");
        // we hold a receiver ourselves, so the channel never disconnects
        let _ = self.tx.send(event);
    }

    /// All receivers drain the same queue; each event reaches exactly one of them.
    pub fn subscribe(&self) -> Receiver<Event<E>> {
        self.rx.clone()
    }
}

/// Remembers the last published value and decides whether a sample is news.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChangeFilter<T>(Option<T>);

impl<T: PartialEq + Copy> ChangeFilter<T> {
    pub fn new() -> Self {
        Self(None)
    }

    /// Record `value` and return `true` if it must be published.
    ///
    /// The first value is always published.
    pub fn update(&mut self, value: T) -> bool {
        if self.0 == Some(value) {
            return false;
        }
        self.0 = Some(value);
        true
    }

    pub fn last(&self) -> Option<T> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_filter() {
        let mut f = ChangeFilter::new();
        assert_eq!(f.last(), None);
        assert!(f.update(0u16));
        assert!(!f.update(0));
        assert!(f.update(5));
        assert!(!f.update(5));
        assert!(f.update(0));
        assert_eq!(f.last(), Some(0));
    }

    #[test]
    fn event_names() {
        assert_eq!(Event::<()>::Data(1).name(), "data");
        assert_eq!(Event::<()>::Temperature(1.0).name(), "temperature");
        assert_eq!(Event::<()>::Humidity(1.0).name(), "humidity");
        assert_eq!(Event::<()>::Error(Error::Transport(())).name(), "error");
    }

    #[test]
    fn publisher_keeps_order() {
        let p = Publisher::<()>::new();
        let rx = p.subscribe();
        p.publish(Event::Data(1));
        p.publish(Event::Push);
        p.publish(Event::Data(2));
        let names: Vec<_> = rx.try_iter().map(|e| e.name()).collect();
        assert_eq!(names, ["data", "push", "data"]);
    }
}
