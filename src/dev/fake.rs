//! In-memory controller answering like the firmware, for threaded tests where a scripted mock
//! cannot know how many samples will be taken.
use crate::polling::lock;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    last: [u8; 4],
    frames: Vec<[u8; 4]>,
    distance: u16,
    analog: u16,
    digital: u8,
    temperature: f32,
    humidity: f32,
    /// Bump `distance` after every ultrasonic payload.
    ramp: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeController(Arc<Mutex<State>>);

impl FakeController {
    /// Every ultrasonic read returns a new distance.
    pub fn ramping() -> Self {
        let fake = Self::default();
        lock(&fake.0).ramp = true;
        fake
    }

    pub fn set_distance(&self, d: u16) {
        lock(&self.0).distance = d;
    }

    pub fn set_analog(&self, v: u16) {
        lock(&self.0).analog = v;
    }

    pub fn set_digital(&self, v: u8) {
        lock(&self.0).digital = v;
    }

    pub fn set_climate(&self, temperature: f32, humidity: f32) {
        let mut s = lock(&self.0);
        s.temperature = temperature;
        s.humidity = humidity;
    }

    pub fn frames(&self) -> Vec<[u8; 4]> {
        lock(&self.0).frames.clone()
    }

    fn respond(s: &mut State, buf: &mut [u8]) {
        let opcode = s.last[0];
        buf.fill(0);
        buf[0] = opcode;
        if buf.len() == 1 {
            return;
        }
        match opcode {
            1 => buf[1] = s.digital,
            3 => buf[1..3].copy_from_slice(&s.analog.to_be_bytes()),
            7 => {
                buf[1] = (s.distance / 255) as u8;
                buf[2] = (s.distance % 255) as u8;
                if s.ramp {
                    s.distance += 1;
                }
            }
            40 => {
                buf[1..5].copy_from_slice(&s.temperature.to_le_bytes());
                buf[5..9].copy_from_slice(&s.humidity.to_le_bytes());
            }
            _ => {}
        }
    }
}

impl ErrorType for FakeController {
    type Error = ErrorKind;
}

impl I2c for FakeController {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut s = lock(&self.0);
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let frame: [u8; 4] = (*bytes).try_into().map_err(|_| ErrorKind::Other)?;
                    s.last = frame;
                    s.frames.push(frame);
                }
                Operation::Read(buf) => Self::respond(&mut s, buf),
            }
        }
        Ok(())
    }
}
