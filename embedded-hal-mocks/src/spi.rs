use embedded_hal::spi;
use mockall::mock;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiError;

impl spi::Error for SpiError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

mock! {
    pub SpiBus {}

    impl spi::ErrorType for SpiBus {
        type Error = SpiError;
    }

    impl spi::SpiBus<u8> for SpiBus {
        fn read(&mut self, words: &mut [u8]) -> Result<(), SpiError>;
        fn write(&mut self, words: &[u8]) -> Result<(), SpiError>;
        fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), SpiError>;
        fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), SpiError>;
        fn flush(&mut self) -> Result<(), SpiError>;
    }
}
