use embedded_hal::{
    digital::{self, OutputPin},
    spi::{self, SpiBus},
};

use crate::{
    opcode::{Opcode, HEADER_MAX},
    Capacity, Config, DriverError, Mode, StatusRegister, DUMMY, PAGE_SIZE,
};

pub(crate) type Error<Spi, Cs> =
    DriverError<<Spi as spi::ErrorType>::Error, <Cs as digital::ErrorType>::Error>;

pub struct SpiRam<Spi, Cs> {
    spi: Spi,
    cs: Cs,
    config: Config,
    mode: Option<Mode>,
}

impl<Spi, Cs> SpiRam<Spi, Cs>
where
    Spi: SpiBus,
    Cs: OutputPin,
{
    /// Create a new driver.
    /// The select line is deasserted and the mode is left undefined until the first access.
    pub fn new(spi: Spi, mut cs: Cs, config: Config) -> Result<Self, Error<Spi, Cs>> {
        cs.set_high().map_err(DriverError::Pin)?;

        Ok(Self {
            spi,
            cs,
            config,
            mode: None,
        })
    }

    /// Release the bus and the select line.
    pub fn release(self) -> (Spi, Cs) {
        (self.spi, self.cs)
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn capacity(&self) -> Capacity {
        self.config.capacity
    }

    /// Get the mode the chip was last confirmed to be in.
    pub const fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Read a single byte.
    pub fn read_byte(&mut self, address: u32) -> Result<u8, Error<Spi, Cs>> {
        self.begin(Mode::Byte, Opcode::READ, address)?;
        let mut word = [DUMMY];
        let result = self.spi.transfer_in_place(&mut word);
        self.end(result)?;

        Ok(word[0])
    }

    /// Write a single byte and return it.
    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<u8, Error<Spi, Cs>> {
        self.begin(Mode::Byte, Opcode::WRITE, address)?;
        let result = self.spi.write(&[value]);
        self.end(result)?;

        Ok(value)
    }

    /// Read a big endian 16 bit integer.
    pub fn read_int(&mut self, address: u32) -> Result<i16, Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::READ, address)?;
        let mut word = [DUMMY; 2];
        let result = self.spi.transfer_in_place(&mut word);
        self.end(result)?;

        Ok(i16::from_be_bytes(word))
    }

    /// Write a big endian 16 bit integer and return it.
    pub fn write_int(&mut self, address: u32, value: i16) -> Result<i16, Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::WRITE, address)?;
        let result = self.spi.write(&value.to_be_bytes());
        self.end(result)?;

        Ok(value)
    }

    /// Read consecutive big endian 16 bit integers into `buffer`.
    pub fn read_ints(&mut self, address: u32, buffer: &mut [i16]) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::READ, address)?;
        let result = read_words(&mut self.spi, buffer);
        self.end(result)
    }

    /// Write consecutive big endian 16 bit integers from `buffer`.
    pub fn write_ints(&mut self, address: u32, buffer: &[i16]) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::WRITE, address)?;
        let result = write_words(&mut self.spi, buffer);
        self.end(result)
    }

    /// Read a page.
    /// The chip wraps to the start of the page when `address` is not page aligned.
    pub fn read_page(
        &mut self,
        address: u32,
        buffer: &mut [u8; PAGE_SIZE],
    ) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Page, Opcode::READ, address)?;
        buffer.fill(DUMMY);
        let result = self.spi.transfer_in_place(buffer);
        self.end(result)
    }

    /// Write a page.
    /// The chip wraps to the start of the page when `address` is not page aligned.
    pub fn write_page(&mut self, address: u32, buffer: &[u8; PAGE_SIZE]) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Page, Opcode::WRITE, address)?;
        let result = self.spi.write(buffer);
        self.end(result)
    }

    /// Read a sequence of bytes, ignoring page boundaries.
    pub fn read_stream(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::READ, address)?;
        buffer.fill(DUMMY);
        let result = self.spi.transfer_in_place(buffer);
        self.end(result)
    }

    /// Write a sequence of bytes, ignoring page boundaries.
    pub fn write_stream(&mut self, address: u32, buffer: &[u8]) -> Result<(), Error<Spi, Cs>> {
        self.begin(Mode::Stream, Opcode::WRITE, address)?;
        let result = self.spi.write(buffer);
        self.end(result)
    }

    /// Read `len` bytes and hand each of them to `sink` together with its index,
    /// without buffering. `sink` is called while the chip is selected.
    pub fn run_stream<F>(&mut self, address: u32, len: u32, mut sink: F) -> Result<(), Error<Spi, Cs>>
    where
        F: FnMut(u8, u32),
    {
        self.begin(Mode::Stream, Opcode::READ, address)?;
        let result = run(&mut self.spi, len, &mut sink);
        self.end(result)
    }

    /// Switch the chip operating mode, unless it is already known to be in `mode`.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error<Spi, Cs>> {
        if self.mode == Some(mode) {
            return Ok(());
        }

        // The chip mode is unknown until it is read back.
        self.mode = None;
        self.write_status_register(StatusRegister::from(mode))?;
        let sr = self.read_status_register()?;

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

    /// Read the status register.
    pub fn read_status_register(&mut self) -> Result<StatusRegister, Error<Spi, Cs>> {
        let mut buf = [Opcode::RDSR.as_u8(), DUMMY];

        self.select()?;
        let result = self.spi.transfer_in_place(&mut buf);
        self.end(result)?;

        Ok(StatusRegister(buf[1]))
    }

    fn write_status_register(&mut self, sr: StatusRegister) -> Result<(), Error<Spi, Cs>> {
        self.select()?;
        let result = self.spi.write(&[Opcode::WRSR.as_u8(), sr.0]);
        self.end(result)
    }

    /// Switch to `mode`, select the chip and send the opcode and address.
    /// The transaction is left open for the payload and must be closed with `end()`.
    fn begin(&mut self, mode: Mode, opcode: Opcode, address: u32) -> Result<(), Error<Spi, Cs>> {
        self.set_mode(mode)?;

        let mut header = [0; HEADER_MAX];
        let len = opcode.assign(address, self.config.capacity.address_width(), &mut header);
        trace!("{:?} at {:#x}", opcode, address);

        self.select()?;
        if let Err(e) = self.spi.write(&header[..len]) {
            return self.end(Err(e));
        }

        Ok(())
    }

    fn select(&mut self) -> Result<(), Error<Spi, Cs>> {
        self.cs.set_low().map_err(DriverError::Pin)
    }

    /// Flush the bus and deselect the chip, also if the payload transfer failed.
    fn end<T>(&mut self, result: Result<T, Spi::Error>) -> Result<T, Error<Spi, Cs>> {
        let flushed = self.spi.flush();
        self.cs.set_high().map_err(DriverError::Pin)?;

        let value = result.map_err(DriverError::Spi)?;
        flushed.map_err(DriverError::Spi)?;
        Ok(value)
    }
}

fn read_words<Spi: SpiBus>(spi: &mut Spi, buffer: &mut [i16]) -> Result<(), Spi::Error> {
    for value in buffer {
        let mut word = [DUMMY; 2];
        spi.transfer_in_place(&mut word)?;
        *value = i16::from_be_bytes(word);
    }
    Ok(())
}

fn write_words<Spi: SpiBus>(spi: &mut Spi, buffer: &[i16]) -> Result<(), Spi::Error> {
    for value in buffer {
        spi.write(&value.to_be_bytes())?;
    }
    Ok(())
}

fn run<Spi: SpiBus, F: FnMut(u8, u32)>(spi: &mut Spi, len: u32, sink: &mut F) -> Result<(), Spi::Error> {
    for index in 0..len {
        let mut word = [DUMMY];
        spi.transfer_in_place(&mut word)?;
        sink(word[0], index);
    }
    Ok(())
}
