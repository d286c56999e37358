use core::fmt::Debug;

use embedded_hal::{digital::OutputPin, spi::SpiBus};
use embedded_io::{Error, ErrorKind, ErrorType, Read, Seek, SeekFrom, Write};

use crate::{driver, DriverError, SpiRam};

/// Cursor over the chip, reading and writing in stream mode.
pub struct StatefulDriver<Spi, Cs> {
    pub driver: SpiRam<Spi, Cs>,
    pub(crate) position: u32,
}

impl<Spi, Cs> SpiRam<Spi, Cs>
where
    Spi: SpiBus,
    Cs: OutputPin,
{
    pub fn into_stateful(self) -> StatefulDriver<Spi, Cs> {
        StatefulDriver {
            driver: self,
            position: 0,
        }
    }
}

impl<Spi, Cs> StatefulDriver<Spi, Cs>
where
    Spi: SpiBus,
    Cs: OutputPin,
{
    pub const fn position(&self) -> u32 {
        self.position
    }

    pub fn into_inner(self) -> SpiRam<Spi, Cs> {
        self.driver
    }

    fn remaining(&self) -> usize {
        (self.driver.capacity().bytes() - self.position) as usize
    }
}

impl<SpiError: Debug, PinError: Debug> Error for DriverError<SpiError, PinError> {
    fn kind(&self) -> ErrorKind {
        match self {
            DriverError::Capacity => ErrorKind::InvalidInput,
            _ => ErrorKind::Other,
        }
    }
}

impl<Spi, Cs> ErrorType for StatefulDriver<Spi, Cs>
where
    Spi: SpiBus,
    Cs: OutputPin,
{
    type Error = driver::Error<Spi, Cs>;
}

impl<Spi, Cs> Seek for StatefulDriver<Spi, Cs>
where
    Spi: SpiBus,
    Cs: OutputPin,
{
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        let capacity = self.driver.capacity().bytes() as i64;
        let pos = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).unwrap_or(i64::MAX),
            SeekFrom::End(offset) => capacity.saturating_add(offset),
            SeekFrom::Current(offset) => (self.position as i64).saturating_add(offset),
        };

        if !(0..=capacity).contains(&pos) {
            return Err(DriverError::Capacity);
        }

        self.position = pos as u32;
        Ok(pos as u64)
    }
}

impl<Spi, Cs> Read for StatefulDriver<Spi, Cs>
where
    Spi: SpiBus,
    Cs: OutputPin,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let length = usize::min(buf.len(), self.remaining());
        if length == 0 {
            return Ok(0);
        }

        self.driver.read_stream(self.position, &mut buf[..length])?;
        self.position += length as u32;
        Ok(length)
    }
}

impl<Spi, Cs> Write for StatefulDriver<Spi, Cs>
where
    Spi: SpiBus,
    Cs: OutputPin,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        let length = usize::min(buf.len(), self.remaining());
        if length == 0 {
            return Err(DriverError::Capacity);
        }

        self.driver.write_stream(self.position, &buf[..length])?;
        self.position += length as u32;
        Ok(length)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
