use crate::Capacity;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub capacity: Capacity,
    /// Fail with [`crate::DriverError::ModeMismatch`] if the status register
    /// does not read back the mode that was just written.
    pub verify_mode: bool,
}

impl Config {
    pub const fn new(capacity: Capacity) -> Self {
        Self {
            capacity,
            verify_mode: false,
        }
    }

    pub const fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub const fn verify_mode(mut self, verify: bool) -> Self {
        self.verify_mode = verify;
        self
    }
}
