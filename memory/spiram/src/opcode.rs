use crate::AddressWidth;

/// Opcode plus the widest address.
pub(crate) const HEADER_MAX: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Opcode {
    /// Read status register
    RDSR,
    /// Write status register
    WRSR,
    /// Read from memory array
    READ,
    /// Write to memory array
    WRITE,
}

impl Opcode {
    pub const fn as_u8(self) -> u8 {
        match self {
            Opcode::RDSR => 0x05,
            Opcode::WRSR => 0x01,
            Opcode::READ => 0x03,
            Opcode::WRITE => 0x02,
        }
    }

    /// Write the opcode followed by `address`, most significant byte first,
    /// and return the number of bytes assigned.
    pub fn assign(self, address: u32, width: AddressWidth, buffer: &mut [u8; HEADER_MAX]) -> usize {
        let [_, high, mid, low] = address.to_be_bytes();
        buffer[0] = self.as_u8();
        match width {
            AddressWidth::Two => {
                buffer[1] = mid;
                buffer[2] = low;
            }
            AddressWidth::Three => {
                buffer[1] = high;
                buffer[2] = mid;
                buffer[3] = low;
            }
        }
        1 + width.len()
    }
}
