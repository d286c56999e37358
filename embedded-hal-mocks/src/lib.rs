pub mod digital;
pub mod spi;
