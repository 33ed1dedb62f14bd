use core::fmt::Debug;

/// Errors raised while talking to the bus controller.
#[derive(Debug, thiserror::Error)]
pub enum Error<E>
where
    E: Debug,
{
    /// The underlying I2C write or read failed.
    #[error("bus transport error: {0:?}")]
    Transport(E),

    /// The first response byte did not echo the command opcode.
    #[error("response opcode {actual:#04x} does not echo command {expected:#04x}")]
    ProtocolMismatch { expected: u8, actual: u8 },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Malformed input: pin names, durations, addresses or response payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid pin identifier '{0}'")]
    InvalidPin(String),

    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    #[error("invalid I2C address '{0}'")]
    InvalidI2cAddress(String),

    #[error("invalid tone frequency {0} Hz")]
    InvalidFrequency(String),

    #[error("invalid value for property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },

    #[error("payload length mismatch: expected {expected}, got {actual}")]
    PayloadLength { expected: usize, actual: usize },
}

/// Violations of the registry invariants, fatal to device registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("pin '{0}' already in use")]
    PinInUse(String),

    #[error("name '{0}' already in use")]
    NameInUse(String),

    #[error("driver '{0}' not supported")]
    UnsupportedDriver(String),

    #[error("device '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },
}

/// Start/halt requests that do not match the poller state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("polling is already running")]
    AlreadyRunning,

    #[error("polling is already stopped")]
    AlreadyStopped,

    #[error("failed to spawn polling thread: {0}")]
    Spawn(String),

    #[error("polling thread panicked")]
    Panicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err: Error<()> = Error::ProtocolMismatch {
            expected: 0x03,
            actual: 0x01,
        };
        assert_eq!(
            err.to_string(),
            "response opcode 0x01 does not echo command 0x03"
        );

        let err: Error<()> = DecodeError::InvalidPin("Dx".into()).into();
        assert_eq!(err.to_string(), "invalid pin identifier 'Dx'");

        let err = RegistryError::Decode {
            name: "ranger".into(),
            source: DecodeError::InvalidDuration("10 parsecs".into()),
        };
        assert_eq!(err.to_string(), "device 'ranger': invalid duration '10 parsecs'");
    }
}
