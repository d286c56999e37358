/// Chip capacity class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Capacity {
    /// 23K256 and 23A256.
    #[default]
    Kbit256,
    /// 23LC512, 23LCV512 and 23A512.
    Kbit512,
    /// 23LC1024, 23LCV1024 and 23A1024.
    Kbit1024,
}

/// Number of address bytes sent after the opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressWidth {
    Two,
    Three,
}

/// The kilobit count does not match a supported chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnsupportedCapacity(pub u16);

impl Capacity {
    /// Get the capacity in kilobits.
    pub const fn kbits(&self) -> u16 {
        match self {
            Capacity::Kbit256 => 256,
            Capacity::Kbit512 => 512,
            Capacity::Kbit1024 => 1024,
        }
    }

    /// Get the capacity in bytes.
    pub const fn bytes(&self) -> u32 {
        self.kbits() as u32 * 1024 / 8
    }

    pub const fn address_width(&self) -> AddressWidth {
        match self {
            Capacity::Kbit256 | Capacity::Kbit512 => AddressWidth::Two,
            Capacity::Kbit1024 => AddressWidth::Three,
        }
    }
}

impl AddressWidth {
    pub const fn len(&self) -> usize {
        match self {
            AddressWidth::Two => 2,
            AddressWidth::Three => 3,
        }
    }
}

impl TryFrom<u16> for Capacity {
    type Error = UnsupportedCapacity;

    fn try_from(kbits: u16) -> Result<Self, Self::Error> {
        match kbits {
            256 => Ok(Capacity::Kbit256),
            512 => Ok(Capacity::Kbit512),
            1024 => Ok(Capacity::Kbit1024),
            other => Err(UnsupportedCapacity(other)),
        }
    }
}
