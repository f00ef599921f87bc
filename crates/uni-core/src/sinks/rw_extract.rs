//! Sink that collects the register accesses of a program.

use crate::dispatch::InstructionSink;
use crate::instruction::Instruction;

/// One register access lifted out of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RwEntry {
    /// A `read` instruction.
    Read {
        /// Register address.
        address: u32,
    },
    /// A `write` instruction.
    Write {
        /// Register address.
        address: u32,
        /// Value stored.
        data: u32,
    },
}

/// Collects `read` and `write` instructions in wire order, ignoring
/// everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RwExtractSink {
    /// Register accesses seen so far, in wire order.
    pub extracted: Vec<RwEntry>,
}

impl RwExtractSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstructionSink for RwExtractSink {
    fn on_instruction(&mut self, instruction: &Instruction) {
        match *instruction {
            Instruction::Read { address } => self.extracted.push(RwEntry::Read { address }),
            Instruction::Write { address, data } => {
                self.extracted.push(RwEntry::Write { address, data });
            }
            _ => {}
        }
    }
}
