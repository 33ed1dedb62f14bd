//! The device module contains the drivers for the Grove modules plugged into the controller.
//!
//! The polling drivers (analog sensors, button, DHT, ultrasonic ranger) sample in a background
//! thread once started; the actuators and the LCD panel are plain handles.

pub mod analog;
pub mod button;
pub mod buzzer;
pub mod dht;
pub mod lcd;
pub mod led;
pub mod ultrasonic;

#[cfg(test)]
pub(crate) mod fake;
