//! Core UNI wire-format crate: instruction model, codec, decode dispatch
//! and event reconstruction sinks.

/// Byte-granular cursors over byte and word buffers.
pub mod cursor;
pub use cursor::{
    ByteOrder, CursorFull, ReadCursor, SliceReader, SliceWriter, Word, WordReader, WordWriter,
    WriteCursor,
};

/// Error taxonomy of the encode and decode paths.
pub mod error;
pub use error::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};

/// Opcode table and leading-byte classification.
pub mod encoding;
pub use encoding::{
    classify, OpcodeKind, FIRE_ONE_BIT, OPCODE_FIRE, OPCODE_HALT, OPCODE_RAW, OPCODE_READ,
    OPCODE_REC_START, OPCODE_REC_STOP, OPCODE_SET_TIME, OPCODE_TABLE, OPCODE_WAIT_FOR_16,
    OPCODE_WAIT_FOR_32, OPCODE_WAIT_UNTIL, OPCODE_WRITE, WAIT_FOR_7_BIT,
};

/// Typed instruction model and event records.
pub mod instruction;
pub use instruction::{Instruction, MadcSample, Spike, WireVersion};

/// Instruction encode and decode primitives.
pub mod codec;
pub use codec::{decode_kind, encode, fits, MAX_RAW_LEN};

/// Decode loop driving an instruction sink.
pub mod dispatch;
pub use dispatch::{run, DecodeEnd, InstructionSink};

/// Logical event address translation.
pub mod address_map;
pub use address_map::{SpikeAddressMap, StandardMapV2, StandardMapV3};

/// Ready-made sinks for common reconstruction passes.
pub mod sinks;
pub use sinks::{
    RawExtractSink, RawReshapeSink, RecordingSink, RwEntry, RwExtractSink, SpiketrainSink,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
