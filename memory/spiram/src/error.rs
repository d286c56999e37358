use crate::Mode;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError<SpiError, PinError> {
    /// A bus transfer failed.
    Spi(SpiError),
    /// The select line could not be driven.
    Pin(PinError),
    /// The status register did not read back the requested mode.
    ModeMismatch { requested: Mode, status: u8 },
    /// Position is beyond the end of the chip.
    Capacity,
}
