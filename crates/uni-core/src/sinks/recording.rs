//! Sink that records every decoded instruction verbatim.

use crate::dispatch::InstructionSink;
use crate::instruction::Instruction;

/// Clones every instruction it is handed, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    /// Instructions seen so far, in wire order.
    pub instructions: Vec<Instruction>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstructionSink for RecordingSink {
    fn on_instruction(&mut self, instruction: &Instruction) {
        self.instructions.push(instruction.clone());
    }
}
