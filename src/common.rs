use crate::error::DecodeError;

/// Default I2C address of the bus controller.
pub const DEFAULT_ADDRESS: u8 = 0x04;

/// A command frame is always four bytes: opcode followed by three arguments.
pub type Frame = [u8; 4];

/// Opcodes understood by the bus controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    ReadDigital = 1,
    WriteDigital = 2,
    ReadAnalog = 3,
    WriteAnalog = 4,
    SetPinMode = 5,
    ReadUltrasonic = 7,
    ReadDht = 40,
}

impl Command {
    /// Build the frame for this command, zero-filling unused arguments.
    pub fn frame(self, pin: u8, arg2: u8, arg3: u8) -> Frame {
        [self.into(), pin, arg2, arg3]
    }
}

impl From<Command> for u8 {
    fn from(c: Command) -> u8 {
        c as u8
    }
}

/// Direction a controller pin is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Argument byte used in a `SetPinMode` frame.
    pub(crate) fn mode_byte(self) -> u8 {
        match self {
            Direction::Input => 0,
            Direction::Output => 1,
        }
    }
}

/// Decoded response of a `ReadDht` command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureHumidity {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
}

/// Reinterpret four little-endian bytes as an IEEE-754 single.
///
/// This is a bit copy, not a numeric conversion.
pub fn decode_f32_le(bytes: &[u8]) -> Result<f32, DecodeError> {
    let raw: [u8; 4] = bytes.try_into().map_err(|_| DecodeError::PayloadLength {
        expected: 4,
        actual: bytes.len(),
    })?;
    Ok(f32::from_le_bytes(raw))
}

impl TemperatureHumidity {
    /// Length of the `ReadDht` response: status byte plus two floats.
    pub const PAYLOAD_LEN: usize = 9;

    /// Decode a `ReadDht` payload. The leading status byte is not checked.
    pub fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() != Self::PAYLOAD_LEN {
            return Err(DecodeError::PayloadLength {
                expected: Self::PAYLOAD_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            temperature: decode_f32_le(&payload[1..5])?,
            humidity: decode_f32_le(&payload[5..9])?,
        })
    }
}
