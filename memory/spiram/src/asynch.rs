use embedded_hal::digital::{self, OutputPin};
use embedded_hal_async::spi::{self, SpiBus};

use crate::{
    opcode::{Opcode, HEADER_MAX},
    Capacity, Config, DriverError, Mode, StatusRegister, DUMMY, PAGE_SIZE,
};

type Error<Spi, Cs> =
    DriverError<<Spi as spi::ErrorType>::Error, <Cs as digital::ErrorType>::Error>;

/// Async variant of [`crate::SpiRam`].
///
/// Dropping a returned future before it completes may leave the chip selected.
pub struct SpiRamAsync<Spi, Cs> {
    spi: Spi,
    cs: Cs,
    config: Config,
    mode: Option<Mode>,
}

impl<Spi, Cs> SpiRamAsync<Spi, Cs>
where
    Spi: SpiBus,
    Cs: OutputPin,
{
    pub fn new(spi: Spi, mut cs: Cs, config: Config) -> Result<Self, Error<Spi, Cs>> {
        cs.set_high().map_err(DriverError::Pin)?;

        Ok(Self {
            spi,
            cs,
            config,
            mode: None,
        })
    }

    pub fn release(self) -> (Spi, Cs) {
        (self.spi, self.cs)
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn capacity(&self) -> Capacity {
        self.config.capacity
    }

    pub const fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub async fn read_byte(&mut self, address: u32) -> Result<u8, Error<Spi, Cs>> {
        self.begin(Mode::Byte, Opcode::READ, address).await?;
        let mut word = [DUMMY];
        let result = self.spi.transfer_in_place(&mut word).await;
        self.end(result).await?;

        Ok(word[0])
    }

    pub async fn write_byte(&mut self, address: u32, value: u8) -> Result<u8, Error<Spi, Cs>> {
        self.begin(Mode::Byte, Opcode::WRITE, address).await?;
        let result = self.spi.write(&[value]).await;
        self.end(result).await?;

        Ok(value)
    }

    pub async fn read_int(&mut self, address: u32) -> Result<i16, Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::READ, address).await?;
        let mut word = [DUMMY; 2];
        let result = self.spi.transfer_in_place(&mut word).await;
        self.end(result).await?;

        Ok(i16::from_be_bytes(word))
    }

    pub async fn write_int(&mut self, address: u32, value: i16) -> Result<i16, Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::WRITE, address).await?;
        let result = self.spi.write(&value.to_be_bytes()).await;
        self.end(result).await?;

        Ok(value)
    }

    pub async fn read_ints(&mut self, address: u32, buffer: &mut [i16]) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::READ, address).await?;
        let result = read_words(&mut self.spi, buffer).await;
        self.end(result).await
    }

    pub async fn write_ints(&mut self, address: u32, buffer: &[i16]) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::WRITE, address).await?;
        let result = write_words(&mut self.spi, buffer).await;
        self.end(result).await
    }

    pub async fn read_page(
        &mut self,
        address: u32,
        buffer: &mut [u8; PAGE_SIZE],
    ) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Page, Opcode::READ, address).await?;
        buffer.fill(DUMMY);
        let result = self.spi.transfer_in_place(buffer).await;
        self.end(result).await
    }

    pub async fn write_page(
        &mut self,
        address: u32,
        buffer: &[u8; PAGE_SIZE],
    ) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Page, Opcode::WRITE, address).await?;
        let result = self.spi.write(buffer).await;
        self.end(result).await
    }

    pub async fn read_stream(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::READ, address).await?;
        buffer.fill(DUMMY);
        let result = self.spi.transfer_in_place(buffer).await;
        self.end(result).await
    }

    pub async fn write_stream(&mut self, address: u32, buffer: &[u8]) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::WRITE, address).await?;
        let result = self.spi.write(buffer).await;
        self.end(result).await
    }

    /// Read `len` bytes and hand each of them to `sink` together with its index,
    /// without buffering.
    pub async fn run_stream<F>(
        &mut self,
        address: u32,
        len: u32,
        mut sink: F,
    ) -> Result<(), Error<Spi, Cs>>
    where
        F: FnMut(u8, u32),
    {
        self.begin(Mode::Stream, Opcode::READ, address).await?;
        let result = run(&mut self.spi, len, &mut sink).await;
        self.end(result).await
    }

    pub async fn set_mode(&mut self, mode: Mode) -> Result<(), Error<Spi, Cs>> {
        if self.mode == Some(mode) {
            return Ok(());
        }

        self.mode = None;
        self.write_status_register(StatusRegister::from(mode)).await?;
        let sr = self.read_status_register().await?;

        if sr.mode() == Some(mode) {
            debug!("Mode changed to {:?}", mode);
            self.mode = Some(mode);
            return Ok(());
        }

        warn!("Requested mode {:?} but status is {:#x}", mode, sr.0);
        if self.config.verify_mode {
            return Err(DriverError::ModeMismatch {
                requested: mode,
                status: sr.0,
            });
        }

        Ok(())
    }

    pub async fn read_status_register(&mut self) -> Result<StatusRegister, Error<Spi, Cs>> {
        let mut buf = [Opcode::RDSR.as_u8(), DUMMY];

        self.select()?;
        let result = self.spi.transfer_in_place(&mut buf).await;
        self.end(result).await?;

        Ok(StatusRegister(buf[1]))
    }

    async fn write_status_register(&mut self, sr: StatusRegister) -> Result<(), Error<Spi, Cs>> {
        self.select()?;
        let result = self.spi.write(&[Opcode::WRSR.as_u8(), sr.0]).await;
        self.end(result).await
    }

    async fn begin(&mut self, mode: Mode, opcode: Opcode, address: u32) -> Result<(), Error<Spi, Cs>> {
        self.set_mode(mode).await?;

        let mut header = [0; HEADER_MAX];
        let len = opcode.assign(address, self.config.capacity.address_width(), &mut header);
        trace!("{:?} at {:#x}", opcode, address);

        self.select()?;
        if let Err(e) = self.spi.write(&header[..len]).await {
            return self.end(Err(e)).await;
        }

        Ok(())
    }

    fn select(&mut self) -> Result<(), Error<Spi, Cs>> {
        self.cs.set_low().map_err(DriverError::Pin)
    }

    async fn end<T>(&mut self, result: Result<T, Spi::Error>) -> Result<T, Error<Spi, Cs>> {
        let flushed = self.spi.flush().await;
        self.cs.set_high().map_err(DriverError::Pin)?;

        let value = result.map_err(DriverError::Spi)?;
        flushed.map_err(DriverError::Spi)?;
        Ok(value)
    }
}

async fn read_words<Spi: SpiBus>(spi: &mut Spi, buffer: &mut [i16]) -> Result<(), Spi::Error> {
    for value in buffer {
        let mut word = [DUMMY; 2];
        spi.transfer_in_place(&mut word).await?;
        *value = i16::from_be_bytes(word);
    }
    Ok(())
}

async fn write_words<Spi: SpiBus>(spi: &mut Spi, buffer: &[i16]) -> Result<(), Spi::Error> {
    for value in buffer {
        spi.write(&value.to_be_bytes()).await?;
    }
    Ok(())
}

async fn run<Spi: SpiBus, F: FnMut(u8, u32)>(
    spi: &mut Spi,
    len: u32,
    sink: &mut F,
) -> Result<(), Spi::Error> {
    for index in 0..len {
        let mut word = [DUMMY];
        spi.transfer_in_place(&mut word).await?;
        sink(word[0], index);
    }
    Ok(())
}
