use bitfield::bitfield;

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct StatusRegister(u8);
    impl Debug;
    /// Operating mode
    pub u8, mode_bits, set_mode_bits: 7, 6;
    /// Hold function disabled
    pub hold_disabled, set_hold_disabled: 0;
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusRegister {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "StatusRegister({=u8:#x})", self.0)
    }
}

/// Chip operating mode, selecting how the internal address pointer advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// A single byte per transaction.
    Byte,
    /// The address pointer wraps at the end of the 32 byte page.
    Page,
    /// The address pointer runs across the entire array.
    Stream,
}

impl Mode {
    const fn bits(&self) -> u8 {
        match self {
            Mode::Byte => 0b00,
            Mode::Page => 0b10,
            Mode::Stream => 0b01,
        }
    }

    /// Get the status register value selecting the mode, with the hold function disabled.
    pub const fn as_u8(&self) -> u8 {
        (self.bits() << 6) | 0x01
    }
}

impl StatusRegister {
    /// Get the decoded operating mode, or `None` for the reserved mode.
    pub fn mode(&self) -> Option<Mode> {
        match self.mode_bits() {
            0b00 => Some(Mode::Byte),
            0b10 => Some(Mode::Page),
            0b01 => Some(Mode::Stream),
            _ => None,
        }
    }
}

impl From<Mode> for StatusRegister {
    fn from(mode: Mode) -> Self {
        let mut sr = StatusRegister(0);
        sr.set_mode_bits(mode.bits());
        sr.set_hold_disabled(true);
        sr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_u8() {
        assert_eq!(0x01, Mode::Byte.as_u8());
        assert_eq!(0x81, Mode::Page.as_u8());
        assert_eq!(0x41, Mode::Stream.as_u8());
    }

    #[test]
    fn status_register_from_mode() {
        for mode in [Mode::Byte, Mode::Page, Mode::Stream] {
            let sr = StatusRegister::from(mode);
            assert_eq!(mode.as_u8(), sr.0);
            assert!(sr.hold_disabled());
            assert_eq!(Some(mode), sr.mode());
        }
    }

    #[test]
    fn mode_ignores_hold_and_reserved_bits() {
        assert_eq!(Some(Mode::Stream), StatusRegister(0x40).mode());
        assert_eq!(Some(Mode::Page), StatusRegister(0x83).mode());
        assert_eq!(None, StatusRegister(0xC1).mode());
        assert_eq!(None, StatusRegister(0xFF).mode());
    }
}
