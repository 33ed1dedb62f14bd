use crate::common::Frame;
use crate::error::Error;
use embedded_hal::i2c::I2c;

/// Frame-level helpers on top of a raw I2C bus.
pub(crate) trait I2cExt {
    type Error: core::fmt::Debug;

    fn write_frame(&mut self, addr: u8, frame: Frame) -> Result<(), Error<Self::Error>>;
    fn read_ack(&mut self, addr: u8) -> Result<u8, Error<Self::Error>>;
    fn read_payload<const N: usize>(&mut self, addr: u8) -> Result<[u8; N], Error<Self::Error>>;
}

impl<I2C: I2c> I2cExt for I2C {
    type Error = I2C::Error;

    fn write_frame(&mut self, addr: u8, frame: Frame) -> Result<(), Error<Self::Error>> {
        tracing::trace!(addr, ?frame, "write frame");
        self.write(addr, &frame).map_err(Error::Transport)
    }

    fn read_ack(&mut self, addr: u8) -> Result<u8, Error<Self::Error>> {
        let mut buf = [0x00];
        self.read(addr, &mut buf).map_err(Error::Transport)?;
        Ok(buf[0])
    }

    fn read_payload<const N: usize>(&mut self, addr: u8) -> Result<[u8; N], Error<Self::Error>> {
        let mut buf = [0x00; N];
        self.read(addr, &mut buf).map_err(Error::Transport)?;
        tracing::trace!(addr, payload = ?buf, "read payload");
        Ok(buf)
    }
}
