//! Sink that reconstructs timed spike and MADC events from a program.

use crate::address_map::SpikeAddressMap;
use crate::dispatch::InstructionSink;
use crate::instruction::{Instruction, MadcSample, Spike};

/// Follows the program clock and collects the events it stamps.
///
/// `set_time` and `wait_until` load the clock, the `wait_for` family
/// advances it, and every spike or MADC instruction emits events at the
/// clock value current at that point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpiketrainSink<M> {
    /// Clock value after the instructions seen so far.
    pub clock: u64,
    /// Spikes reconstructed so far, in wire order.
    pub spikes: Vec<Spike>,
    /// MADC samples reconstructed so far, in wire order.
    pub madc_samples: Vec<MadcSample>,
    /// Map from wire fields back to logical event addresses.
    pub addr_map: M,
}

impl<M: SpikeAddressMap> SpiketrainSink<M> {
    /// Creates an empty sink with the clock at zero.
    #[must_use]
    pub const fn new(addr_map: M) -> Self {
        Self {
            clock: 0,
            spikes: Vec::new(),
            madc_samples: Vec::new(),
            addr_map,
        }
    }

    fn spike_at(&mut self, address: u64) {
        self.spikes.push(Spike::new(self.clock, address));
    }

    fn on_fire_one_or_madc(&mut self, key: u8, payload: u32) {
        if key == 0 {
            let evaddr = ((!payload) & 0xFF) as u8;
            let address = self.addr_map.address_from_fire_one(0, evaddr);
            self.spike_at(address);
            return;
        }

        let samples = [
            (payload & 0x3FF) as u16,
            ((payload >> 10) & 0x3FF) as u16,
            ((payload >> 20) & 0x3FF) as u16,
        ];
        for &value in samples.iter().take(usize::from(key.min(3))) {
            self.madc_samples.push(MadcSample::new(self.clock, value));
        }
    }
}

impl<M: SpikeAddressMap> InstructionSink for SpiketrainSink<M> {
    fn on_instruction(&mut self, instruction: &Instruction) {
        match *instruction {
            Instruction::SetTime { time } | Instruction::WaitUntil { time } => self.clock = time,
            Instruction::WaitFor7 { delay } => {
                self.clock = self.clock.wrapping_add(u64::from(delay));
            }
            Instruction::WaitFor16 { delay } => {
                self.clock = self.clock.wrapping_add(u64::from(delay));
            }
            Instruction::WaitFor32 { delay } => {
                self.clock = self.clock.wrapping_add(u64::from(delay));
            }
            Instruction::Fire { mask, evaddr } => {
                for index in 0..64_u8 {
                    if (mask >> index) & 1 == 1 {
                        let address = self.addr_map.address_from_fire(index, evaddr);
                        self.spike_at(address);
                    }
                }
            }
            Instruction::FireOne { index, evaddr } => {
                let address = self.addr_map.address_from_fire_one(index, evaddr);
                self.spike_at(address);
            }
            Instruction::FireOneOrMadc { key, payload } => {
                self.on_fire_one_or_madc(key, payload);
            }
            _ => {}
        }
    }
}
