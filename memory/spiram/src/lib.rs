//! Driver for the Microchip 23K256, 23LC512 and 23LC1024 serial SRAM chips (and
//! their V-series battery backed variants).
//!
//! Every access is a single chip-select framed transaction: opcode, a 2 or 3
//! byte address depending on the chip capacity, then the payload. The chip's
//! operating mode (byte, page or stream) is switched on demand before each
//! access and cached, so consecutive accesses of the same kind do not touch
//! the status register again.
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

#[cfg(feature = "async")]
mod asynch;
mod capacity;
mod config;
mod driver;
#[cfg(feature = "embedded-io")]
mod embeddedio;
mod error;
mod mode;
mod opcode;
#[cfg(test)]
mod sim;

/// Number of bytes in a page.
pub const PAGE_SIZE: usize = 32;

/// Byte clocked out on the bus while reading.
const DUMMY: u8 = 0xFF;

#[cfg(feature = "async")]
pub use asynch::SpiRamAsync;
pub use capacity::{AddressWidth, Capacity, UnsupportedCapacity};
pub use config::Config;
pub use driver::SpiRam;
#[cfg(feature = "embedded-io")]
pub use embeddedio::StatefulDriver;
pub use error::DriverError;
pub use mode::{Mode, StatusRegister};

#[cfg(all(test, feature = "defmt"))]
mod tests {
    //! This module is required in order to satisfy the requirements of defmt, while running tests.
    //! Note that this will cause all log `defmt::` log statements to be thrown away.

    #[defmt::global_logger]
    struct GlobalLogger;

    unsafe impl defmt::Logger for GlobalLogger {
        fn acquire() {}
        unsafe fn flush() {}
        unsafe fn release() {}
        unsafe fn write(_bytes: &[u8]) {}
    }

    defmt::timestamp!("");

    #[defmt::panic_handler]
    fn panic() -> ! {
        panic!()
    }
}
