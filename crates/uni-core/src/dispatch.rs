//! Decode loop that feeds a byte run through a sink, one instruction at a
//! time.

use crate::codec::{decode_kind, fits};
use crate::cursor::ReadCursor;
use crate::encoding::classify;
use crate::error::{DecodeError, DecodeErrorKind};
use crate::instruction::{Instruction, WireVersion};

/// Receiver of decoded instructions.
///
/// The dispatcher borrows each instruction to the sink in wire order; sinks
/// that need to keep one clone it.
pub trait InstructionSink {
    /// Called once per decoded instruction, in wire order.
    fn on_instruction(&mut self, instruction: &Instruction);
}

/// Why a decode pass came to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeEnd {
    /// A `halt` instruction was decoded and delivered.
    Halted,
    /// The byte run ended, or the bytes left are fewer than the next
    /// instruction needs.
    Exhausted,
}

/// Decodes instructions from `cursor` and delivers each to `sink` until the
/// program halts or the byte run is used up.
///
/// A trailing partial instruction ends the pass cleanly with
/// [`DecodeEnd::Exhausted`]; the cursor stays on its leading byte.
///
/// # Errors
///
/// Returns a [`DecodeError`] when a leading byte matches no instruction of
/// `version` or an instruction body is malformed. The pass is abandoned at
/// the offending instruction.
pub fn run<C, S>(
    cursor: &mut C,
    version: WireVersion,
    sink: &mut S,
) -> Result<DecodeEnd, DecodeError>
where
    C: ReadCursor,
    S: InstructionSink,
{
    while let Some(lead) = cursor.peek() {
        let Some(kind) = classify(version, lead) else {
            return Err(DecodeError::new(
                "unknown",
                lead,
                DecodeErrorKind::UnknownOpcode,
            ));
        };

        if !fits(cursor, kind) {
            return Ok(DecodeEnd::Exhausted);
        }

        let instruction = decode_kind(cursor, kind, version)?;
        let halted = matches!(instruction, Instruction::Halt);
        sink.on_instruction(&instruction);

        if halted {
            return Ok(DecodeEnd::Halted);
        }
    }

    Ok(DecodeEnd::Exhausted)
}

#[cfg(test)]
mod tests {
    use super::{run, DecodeEnd, InstructionSink};
    use crate::cursor::{ReadCursor, SliceReader};
    use crate::error::DecodeErrorKind;
    use crate::instruction::{Instruction, WireVersion};

    #[derive(Default)]
    struct Collect {
        seen: Vec<Instruction>,
    }

    impl InstructionSink for Collect {
        fn on_instruction(&mut self, instruction: &Instruction) {
            self.seen.push(instruction.clone());
        }
    }

    #[test]
    fn delivers_instructions_in_wire_order_until_halt() {
        let bytes = [
            0x00, 0, 0, 0, 0, 0, 0, 0, 9, // set_time 9
            0x81, // wait_for_7 1
            0x0e, // halt
            0x0b, 0, 0, 0, 0, // read, unreachable past halt
        ];
        let mut reader = SliceReader::new(&bytes);
        let mut sink = Collect::default();

        let end = run(&mut reader, WireVersion::V3, &mut sink).expect("valid program");

        assert_eq!(end, DecodeEnd::Halted);
        assert_eq!(
            sink.seen,
            vec![
                Instruction::SetTime { time: 9 },
                Instruction::WaitFor7 { delay: 1 },
                Instruction::Halt,
            ]
        );
        assert_eq!(reader.remaining(), 5);
    }

    #[test]
    fn exhausts_cleanly_at_the_end_of_the_run() {
        let bytes = [0x80, 0x80, 0x80];
        let mut reader = SliceReader::new(&bytes);
        let mut sink = Collect::default();

        let end = run(&mut reader, WireVersion::V2, &mut sink).expect("valid program");

        assert_eq!(end, DecodeEnd::Exhausted);
        assert_eq!(sink.seen.len(), 3);
    }

    #[test]
    fn trailing_partial_instruction_exhausts_without_error() {
        let bytes = [0x82, 0x00, 0, 0, 0]; // wait_for_7 then truncated set_time
        let mut reader = SliceReader::new(&bytes);
        let mut sink = Collect::default();

        let end = run(&mut reader, WireVersion::V3, &mut sink).expect("clean stop");

        assert_eq!(end, DecodeEnd::Exhausted);
        assert_eq!(sink.seen, vec![Instruction::WaitFor7 { delay: 2 }]);
        assert_eq!(reader.remaining(), 4);
    }

    #[test]
    fn unknown_leading_byte_is_fatal() {
        let bytes = [0x80, 0x03];
        let mut reader = SliceReader::new(&bytes);
        let mut sink = Collect::default();

        let err = run(&mut reader, WireVersion::V3, &mut sink).unwrap_err();

        assert_eq!(err.kind, DecodeErrorKind::UnknownOpcode);
        assert_eq!(err.byte, 0x03);
        assert_eq!(sink.seen, vec![Instruction::WaitFor7 { delay: 0 }]);
    }

    #[test]
    fn fire_one_bytes_decode_only_under_v2() {
        let bytes = [0x7F, 0xAF, 0x0e];
        let mut reader = SliceReader::new(&bytes);
        let mut sink = Collect::default();

        let end = run(&mut reader, WireVersion::V2, &mut sink).expect("valid v2 program");

        assert_eq!(end, DecodeEnd::Halted);
        assert_eq!(
            sink.seen,
            vec![
                Instruction::FireOne {
                    index: 0x3F,
                    evaddr: 0xAF
                },
                Instruction::Halt,
            ]
        );

        let mut reader = SliceReader::new(&bytes);
        let mut sink = Collect::default();
        let err = run(&mut reader, WireVersion::V3, &mut sink).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::UnknownOpcode);
    }

    #[test]
    fn empty_run_exhausts_immediately() {
        let mut reader = SliceReader::new(&[]);
        let mut sink = Collect::default();

        let end = run(&mut reader, WireVersion::V2, &mut sink).expect("empty program");

        assert_eq!(end, DecodeEnd::Exhausted);
        assert!(sink.seen.is_empty());
    }
}
