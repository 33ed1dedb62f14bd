use crate::error::DecodeError;
use core::fmt;
use core::str::FromStr;

/// Port class hinted by the leading letter of a pin identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinClass {
    Digital,
    Analog,
    /// No letter prefix was given.
    Unspecified,
}

/// Representation of a controller pin such as `D3` or `A1`.
///
/// The letter prefix is only a hint; frames carry the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinId {
    class: PinClass,
    number: u8,
}

impl PinId {
    pub fn digital(number: u8) -> Self {
        Self {
            class: PinClass::Digital,
            number,
        }
    }

    pub fn analog(number: u8) -> Self {
        Self {
            class: PinClass::Analog,
            number,
        }
    }

    pub fn class(&self) -> PinClass {
        self.class
    }

    /// Numeric pin as encoded in a command frame.
    pub fn number(&self) -> u8 {
        self.number
    }
}

impl FromStr for PinId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (class, digits) = split_prefix(s);
        let number = digits
            .parse::<u8>()
            .map_err(|_| DecodeError::InvalidPin(s.to_owned()))?;
        Ok(Self { class, number })
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            PinClass::Digital => write!(f, "D{}", self.number),
            PinClass::Analog => write!(f, "A{}", self.number),
            PinClass::Unspecified => write!(f, "{}", self.number),
        }
    }
}

/// Strip one leading `A`/`D` and parse the remainder as the numeric pin.
pub fn pin_number(pin: &str) -> Result<u8, DecodeError> {
    pin.parse::<PinId>().map(|p| p.number())
}

fn split_prefix(s: &str) -> (PinClass, &str) {
    // a lone letter is left alone so that it fails to parse
    if s.len() > 1 {
        match s.as_bytes()[0] {
            b'D' | b'd' => return (PinClass::Digital, &s[1..]),
            b'A' | b'a' => return (PinClass::Analog, &s[1..]),
            _ => {}
        }
    }
    (PinClass::Unspecified, s)
}
