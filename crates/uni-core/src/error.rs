//! Error taxonomy for the encode and decode paths.

use thiserror::Error;

use crate::instruction::WireVersion;

/// Reason an instruction could not be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeErrorKind {
    /// Raw payload does not fit the one-byte length prefix.
    #[error("payload of {len} bytes does not fit the length prefix")]
    RawTooLong {
        /// Number of payload bytes requested.
        len: usize,
    },
    /// Relative delay exceeds the widest wait encoding.
    #[error("delay {delay} exceeds wait_for_32, use wait_until instead")]
    DelayTooWide {
        /// Requested delay in timer ticks.
        delay: u64,
    },
    /// A field value does not fit its wire slot.
    #[error("field value does not fit its wire slot")]
    FieldRange,
    /// Instruction is not part of the active wire revision.
    #[error("instruction is not part of wire revision {version}")]
    WrongVersion {
        /// Revision the instruction was encoded for.
        version: WireVersion,
    },
    /// Target buffer has too few bytes left.
    #[error("target buffer has too few bytes left")]
    BufferFull,
}

/// Error raised when an instruction cannot be written to the wire.
///
/// Raised before any byte is committed, so the target buffer is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot encode '{instruction}': {kind}")]
pub struct EncodeError {
    /// Name of the instruction that failed to encode.
    pub instruction: &'static str,
    /// What went wrong.
    pub kind: EncodeErrorKind,
}

impl EncodeError {
    /// Creates an encode error for the named instruction.
    #[must_use]
    pub const fn new(instruction: &'static str, kind: EncodeErrorKind) -> Self {
        Self { instruction, kind }
    }
}

/// Reason a byte run could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    /// Leading byte does not select the instruction being read.
    #[error("wrong opcode")]
    WrongOpcode,
    /// Leading byte matches no instruction of the active wire revision.
    #[error("unknown opcode")]
    UnknownOpcode,
    /// Trailing sample index byte of a v3 fire instruction was not zero.
    #[error("the index of the spike/madc sample is supposed to be zero")]
    NonzeroSampleIndex,
    /// Byte run ended inside the instruction payload.
    #[error("byte run ends inside the instruction")]
    UnexpectedEnd,
}

/// Error raised when a byte run cannot be decoded.
///
/// Carries the byte under the cursor when the failure was detected; the
/// decode pass is abandoned, there is no resynchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot decode '{instruction}' (current byte 0x{byte:02x}): {kind}")]
pub struct DecodeError {
    /// Name of the instruction whose decode failed.
    pub instruction: &'static str,
    /// Byte under the cursor when the failure was detected.
    pub byte: u8,
    /// What went wrong.
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    /// Creates a decode error for the named instruction.
    #[must_use]
    pub const fn new(instruction: &'static str, byte: u8, kind: DecodeErrorKind) -> Self {
        Self {
            instruction,
            byte,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};

    #[test]
    fn encode_error_names_the_instruction() {
        let err = EncodeError::new("raw", EncodeErrorKind::RawTooLong { len: 300 });
        assert_eq!(
            err.to_string(),
            "cannot encode 'raw': payload of 300 bytes does not fit the length prefix"
        );
    }

    #[test]
    fn delay_error_points_at_wait_until() {
        let err = EncodeError::new(
            "wait_for_*",
            EncodeErrorKind::DelayTooWide {
                delay: 0x1_0000_0000,
            },
        );
        assert!(err.to_string().contains("use wait_until instead"));
    }

    #[test]
    fn decode_error_carries_the_offending_byte() {
        let err = DecodeError::new("unknown", 0x03, DecodeErrorKind::UnknownOpcode);
        assert_eq!(
            err.to_string(),
            "cannot decode 'unknown' (current byte 0x03): unknown opcode"
        );
    }
}
