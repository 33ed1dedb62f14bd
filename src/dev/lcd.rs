//! Support for the Grove "LCD RGB Backlight" panel
//!
//! The panel sits directly on the I2C bus next to the controller; it is addressed through one
//! of the controller's `I2C-n` sockets rather than through command frames.
use crate::error::DecodeError;

const PREFIX: &str = "i2c-";

pub struct LcdPanel {
    name: String,
    address: u8,
}

impl LcdPanel {
    /// Create a panel from an `i2c-<digit>` socket identifier (a bare digit is accepted too).
    pub fn from_socket(socket: &str) -> Result<Self, DecodeError> {
        Ok(Self {
            name: "LcdPanel".into(),
            address: parse_socket(socket)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn address(&self) -> u8 {
        self.address
    }
}

fn parse_socket(socket: &str) -> Result<u8, DecodeError> {
    let digits = socket.strip_prefix(PREFIX).unwrap_or(socket);
    let mut chars = digits.chars();
    match (chars.next().and_then(|c| c.to_digit(10)), chars.next()) {
        (Some(d), None) => Ok(d as u8),
        _ => Err(DecodeError::InvalidI2cAddress(socket.to_owned())),
    }
}
