//! A simulated 23x SRAM attached to a bus and a select line.

use std::{cell::RefCell, convert::Infallible, rc::Rc};

use embedded_hal::{digital, spi};

use crate::{opcode::Opcode, Capacity, Mode, StatusRegister, PAGE_SIZE};

/// Something observed on the wires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    Select,
    Deselect,
    /// A byte clocked out by the driver.
    Byte(u8),
}

#[derive(Clone, Copy)]
enum State {
    Opcode,
    Address { opcode: u8, received: usize, address: u32 },
    Data { opcode: u8, address: u32, count: usize },
    ReadStatus,
    WriteStatus,
    Ignore,
}

pub struct SimulatedChip {
    capacity: Capacity,
    memory: Vec<u8>,
    status: StatusRegister,
    selected: bool,
    state: State,
    events: Vec<Event>,
}

pub struct SimulatedBus(Rc<RefCell<SimulatedChip>>);

pub struct SimulatedSelect(Rc<RefCell<SimulatedChip>>);

impl SimulatedChip {
    pub fn shared(capacity: Capacity) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            capacity,
            memory: vec![0; capacity.bytes() as usize],
            status: StatusRegister(0x00),
            selected: false,
            state: State::Opcode,
            events: Vec::new(),
        }))
    }

    pub fn split(chip: &Rc<RefCell<Self>>) -> (SimulatedBus, SimulatedSelect) {
        (SimulatedBus(chip.clone()), SimulatedSelect(chip.clone()))
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        self.state = State::Opcode;
        self.events.push(if selected {
            Event::Select
        } else {
            Event::Deselect
        });
    }

    fn exchange(&mut self, tx: u8) -> u8 {
        assert!(self.selected, "bus clocked while chip is deselected");
        self.events.push(Event::Byte(tx));

        let (next, rx) = match self.state {
            State::Opcode => {
                let next = match tx {
                    x if x == Opcode::RDSR.as_u8() => State::ReadStatus,
                    x if x == Opcode::WRSR.as_u8() => State::WriteStatus,
                    x if x == Opcode::READ.as_u8() || x == Opcode::WRITE.as_u8() => State::Address {
                        opcode: x,
                        received: 0,
                        address: 0,
                    },
                    _ => State::Ignore,
                };
                (next, 0)
            }
            State::Address {
                opcode,
                received,
                address,
            } => {
                let address = address << 8 | tx as u32;
                let received = received + 1;
                let next = if received == self.capacity.address_width().len() {
                    State::Data {
                        opcode,
                        address: address % self.capacity.bytes(),
                        count: 0,
                    }
                } else {
                    State::Address {
                        opcode,
                        received,
                        address,
                    }
                };
                (next, 0)
            }
            State::Data {
                opcode,
                address,
                count,
            } => {
                let mode = self.status.mode();
                if mode == Some(Mode::Byte) && count > 0 {
                    return 0;
                }

                let index = address as usize;
                let rx = if opcode == Opcode::READ.as_u8() {
                    self.memory[index]
                } else {
                    self.memory[index] = tx;
                    0
                };

                let page_size = PAGE_SIZE as u32;
                let address = match mode {
                    Some(Mode::Page) => address / page_size * page_size + (address + 1) % page_size,
                    _ => (address + 1) % self.capacity.bytes(),
                };
                let next = State::Data {
                    opcode,
                    address,
                    count: count + 1,
                };
                (next, rx)
            }
            State::ReadStatus => (State::ReadStatus, self.status.0),
            State::WriteStatus => {
                self.status = StatusRegister(tx);
                (State::Ignore, 0)
            }
            State::Ignore => (State::Ignore, 0),
        };

        self.state = next;
        rx
    }
}

impl spi::ErrorType for SimulatedBus {
    type Error = Infallible;
}

impl spi::SpiBus for SimulatedBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        for word in words {
            *word = chip.exchange(0x00);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        for word in words {
            chip.exchange(*word);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        for i in 0..read.len().max(write.len()) {
            let rx = chip.exchange(write.get(i).copied().unwrap_or(0x00));
            if let Some(word) = read.get_mut(i) {
                *word = rx;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        for word in words {
            *word = chip.exchange(*word);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::spi::SpiBus for SimulatedBus {
    async fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        spi::SpiBus::read(self, words)
    }

    async fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        spi::SpiBus::write(self, words)
    }

    async fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        spi::SpiBus::transfer(self, read, write)
    }

    async fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        spi::SpiBus::transfer_in_place(self, words)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        spi::SpiBus::flush(self)
    }
}

impl digital::ErrorType for SimulatedSelect {
    type Error = Infallible;
}

impl digital::OutputPin for SimulatedSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_selected(true);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_selected(false);
        Ok(())
    }
}
