//! Declarative board and device descriptions.
//!
//! These types only describe what to build; loading them from a file is left to the caller's
//! serde format of choice.
use crate::common::DEFAULT_ADDRESS;
use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Property overriding the polling interval of a sensor, e.g. `"500ms"`.
pub const SAMPLING_INTERVAL: &str = "samplingInterval";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// I2C bus the controller hangs off.  Only meaningful to whoever opens the transport.
    #[serde(default)]
    pub bus: u8,
    /// Controller address; `0` selects the default `0x04`.
    #[serde(default)]
    pub address: u8,
    #[serde(default)]
    pub devices: Vec<DeviceDescriptor>,
}

impl BoardConfig {
    pub fn controller_address(&self) -> u8 {
        match self.address {
            0 => DEFAULT_ADDRESS,
            a => a,
        }
    }
}

/// One device to register: a unique name, a driver kind, a pin and free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub driver: String,
    pub pin: String,
    #[serde(rename = "config", default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, Value>,
}

impl DeviceDescriptor {
    pub fn new(name: impl Into<String>, driver: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            pin: pin.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The `samplingInterval` property, if present.
    pub fn sampling_interval(&self) -> Result<Option<Duration>, DecodeError> {
        match self.properties.get(SAMPLING_INTERVAL) {
            None => Ok(None),
            Some(Value::String(s)) => parse_duration(s).map(Some),
            Some(other) => Err(DecodeError::InvalidProperty {
                key: SAMPLING_INTERVAL.to_owned(),
                reason: format!("expected a duration string, got {other}"),
            }),
        }
    }
}

/// Parse a duration such as `300ms`, `1.5s` or `1h2m3s`.
///
/// Accepted units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`; every number needs a unit
/// except a lone `0`.  Negative durations are rejected.
pub fn parse_duration(s: &str) -> Result<Duration, DecodeError> {
    let invalid = || DecodeError::InvalidDuration(s.to_owned());

    let mut rest = s.strip_prefix('+').unwrap_or(s);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut nanos = 0f64;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, tail) = rest.split_at(number_end);
        let value: f64 = number.parse().map_err(|_| invalid())?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        nanos += value * scale;
        rest = next;
    }

    if nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}
