//! Bit-exact encode and decode of single instructions.
//!
//! Multi-byte fields travel most significant byte first. Encoding commits
//! nothing on failure; decoding validates the leading byte before touching
//! the payload.

use crate::cursor::{ReadCursor, WriteCursor};
use crate::encoding::{
    OpcodeKind, FIRE_ONE_BIT, OPCODE_FIRE, OPCODE_HALT, OPCODE_RAW, OPCODE_READ, OPCODE_REC_START,
    OPCODE_REC_STOP, OPCODE_SET_TIME, OPCODE_WAIT_FOR_16, OPCODE_WAIT_FOR_32, OPCODE_WAIT_UNTIL,
    OPCODE_WRITE, WAIT_FOR_7_BIT,
};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};
use crate::instruction::{Instruction, WireVersion};

/// Largest raw payload expressible in the one-byte length prefix.
pub const MAX_RAW_LEN: usize = 255;

fn put<C: WriteCursor>(cursor: &mut C, name: &'static str, byte: u8) -> Result<(), EncodeError> {
    cursor
        .write_byte(byte)
        .map_err(|_| EncodeError::new(name, EncodeErrorKind::BufferFull))
}

fn put_be<C: WriteCursor>(
    cursor: &mut C,
    name: &'static str,
    value: u64,
    width: usize,
) -> Result<(), EncodeError> {
    for i in 0..width {
        let shift = (width - i - 1) * 8;
        put(cursor, name, ((value >> shift) & 0xFF) as u8)?;
    }
    Ok(())
}

fn check_fields(instruction: &Instruction, version: WireVersion) -> Result<(), EncodeError> {
    let name = instruction.name();
    match *instruction {
        Instruction::Fire { .. } | Instruction::FireOne { .. }
            if version != WireVersion::V2 =>
        {
            Err(EncodeError::new(
                name,
                EncodeErrorKind::WrongVersion { version },
            ))
        }
        Instruction::FireOneOrMadc { .. } if version != WireVersion::V3 => Err(EncodeError::new(
            name,
            EncodeErrorKind::WrongVersion { version },
        )),
        Instruction::Raw { ref data } if data.len() > MAX_RAW_LEN => Err(EncodeError::new(
            name,
            EncodeErrorKind::RawTooLong { len: data.len() },
        )),
        Instruction::WaitFor7 { delay } if delay > 0x7F => {
            Err(EncodeError::new(name, EncodeErrorKind::FieldRange))
        }
        Instruction::FireOne { index, .. } if index > 0x3F => {
            Err(EncodeError::new(name, EncodeErrorKind::FieldRange))
        }
        Instruction::FireOneOrMadc { key, payload } if key > 0x3 || payload >= 1 << 30 => {
            Err(EncodeError::new(name, EncodeErrorKind::FieldRange))
        }
        _ => Ok(()),
    }
}

/// Writes one instruction at the cursor.
///
/// # Errors
///
/// Fails without writing anything when a field does not fit its wire slot,
/// when the instruction is not part of `version`, or when the cursor has
/// too few bytes left.
pub fn encode<C: WriteCursor>(
    cursor: &mut C,
    instruction: &Instruction,
    version: WireVersion,
) -> Result<(), EncodeError> {
    check_fields(instruction, version)?;

    let name = instruction.name();
    if cursor.remaining() < instruction.encoded_len() {
        return Err(EncodeError::new(name, EncodeErrorKind::BufferFull));
    }

    match *instruction {
        Instruction::SetTime { time } => {
            put(cursor, name, OPCODE_SET_TIME)?;
            put_be(cursor, name, time, 8)
        }
        Instruction::WaitUntil { time } => {
            put(cursor, name, OPCODE_WAIT_UNTIL)?;
            put_be(cursor, name, time, 8)
        }
        Instruction::WaitFor7 { delay } => put(cursor, name, WAIT_FOR_7_BIT | delay),
        Instruction::WaitFor16 { delay } => {
            put(cursor, name, OPCODE_WAIT_FOR_16)?;
            put_be(cursor, name, u64::from(delay), 2)
        }
        Instruction::WaitFor32 { delay } => {
            put(cursor, name, OPCODE_WAIT_FOR_32)?;
            put_be(cursor, name, u64::from(delay), 4)
        }
        Instruction::Read { address } => {
            put(cursor, name, OPCODE_READ)?;
            put_be(cursor, name, u64::from(address), 4)
        }
        Instruction::Write { address, data } => {
            put(cursor, name, OPCODE_WRITE)?;
            put_be(cursor, name, u64::from(address), 4)?;
            put_be(cursor, name, u64::from(data), 4)
        }
        Instruction::Raw { ref data } => {
            put(cursor, name, OPCODE_RAW)?;
            put(cursor, name, (data.len() & 0xFF) as u8)?;
            for byte in data {
                put(cursor, name, *byte)?;
            }
            Ok(())
        }
        Instruction::RecStart => put(cursor, name, OPCODE_REC_START),
        Instruction::RecStop => put(cursor, name, OPCODE_REC_STOP),
        Instruction::Halt => put(cursor, name, OPCODE_HALT),
        Instruction::Fire { mask, evaddr } => {
            put(cursor, name, OPCODE_FIRE)?;
            put_be(cursor, name, mask, 8)?;
            put(cursor, name, evaddr)
        }
        Instruction::FireOne { index, evaddr } => {
            put(cursor, name, FIRE_ONE_BIT | (index & 0x3F))?;
            put(cursor, name, evaddr)
        }
        Instruction::FireOneOrMadc { key, payload } => {
            put(cursor, name, OPCODE_FIRE)?;
            put_be(
                cursor,
                name,
                (u64::from(key) << 30) | u64::from(payload),
                8,
            )?;
            // The sample index is not transmitted; the wire slot stays zero.
            put(cursor, name, 0x00)
        }
    }
}

fn take<C: ReadCursor>(cursor: &mut C, name: &'static str, lead: u8) -> Result<u8, DecodeError> {
    cursor
        .read_byte()
        .ok_or(DecodeError::new(name, lead, DecodeErrorKind::UnexpectedEnd))
}

fn take_be<C: ReadCursor>(
    cursor: &mut C,
    name: &'static str,
    lead: u8,
    width: usize,
) -> Result<u64, DecodeError> {
    let mut value = 0u64;
    for _ in 0..width {
        value = (value << 8) | u64::from(take(cursor, name, lead)?);
    }
    Ok(value)
}

const fn expect_opcode(name: &'static str, lead: u8, opcode: u8) -> Result<(), DecodeError> {
    if lead == opcode {
        Ok(())
    } else {
        Err(DecodeError::new(name, lead, DecodeErrorKind::WrongOpcode))
    }
}

/// Reads one instruction of the given kind at the cursor.
///
/// # Errors
///
/// Fails when the leading byte does not select `kind` under `version`, when
/// the byte run ends inside the payload, or when a protocol-mandated-zero
/// field is not zero.
pub fn decode_kind<C: ReadCursor>(
    cursor: &mut C,
    kind: OpcodeKind,
    version: WireVersion,
) -> Result<Instruction, DecodeError> {
    let name = kind.name();
    let Some(lead) = cursor.read_byte() else {
        return Err(DecodeError::new(name, 0, DecodeErrorKind::UnexpectedEnd));
    };

    match kind {
        OpcodeKind::WaitFor7 => {
            if lead & WAIT_FOR_7_BIT == 0 {
                return Err(DecodeError::new(name, lead, DecodeErrorKind::WrongOpcode));
            }
            Ok(Instruction::WaitFor7 {
                delay: lead & 0x7F,
            })
        }
        OpcodeKind::FireOne => {
            if version != WireVersion::V2 || lead & FIRE_ONE_BIT == 0 {
                return Err(DecodeError::new(name, lead, DecodeErrorKind::WrongOpcode));
            }
            let evaddr = take(cursor, name, lead)?;
            Ok(Instruction::FireOne {
                index: lead & 0x3F,
                evaddr,
            })
        }
        OpcodeKind::SetTime => {
            expect_opcode(name, lead, OPCODE_SET_TIME)?;
            Ok(Instruction::SetTime {
                time: take_be(cursor, name, lead, 8)?,
            })
        }
        OpcodeKind::WaitUntil => {
            expect_opcode(name, lead, OPCODE_WAIT_UNTIL)?;
            Ok(Instruction::WaitUntil {
                time: take_be(cursor, name, lead, 8)?,
            })
        }
        OpcodeKind::WaitFor16 => {
            expect_opcode(name, lead, OPCODE_WAIT_FOR_16)?;
            Ok(Instruction::WaitFor16 {
                delay: (take_be(cursor, name, lead, 2)? & 0xFFFF) as u16,
            })
        }
        OpcodeKind::WaitFor32 => {
            expect_opcode(name, lead, OPCODE_WAIT_FOR_32)?;
            Ok(Instruction::WaitFor32 {
                delay: (take_be(cursor, name, lead, 4)? & 0xFFFF_FFFF) as u32,
            })
        }
        OpcodeKind::Read => {
            expect_opcode(name, lead, OPCODE_READ)?;
            Ok(Instruction::Read {
                address: (take_be(cursor, name, lead, 4)? & 0xFFFF_FFFF) as u32,
            })
        }
        OpcodeKind::Write => {
            expect_opcode(name, lead, OPCODE_WRITE)?;
            let address = (take_be(cursor, name, lead, 4)? & 0xFFFF_FFFF) as u32;
            let data = (take_be(cursor, name, lead, 4)? & 0xFFFF_FFFF) as u32;
            Ok(Instruction::Write { address, data })
        }
        OpcodeKind::Raw => {
            expect_opcode(name, lead, OPCODE_RAW)?;
            let len = take(cursor, name, lead)?;
            let mut data = Vec::with_capacity(usize::from(len));
            for _ in 0..len {
                data.push(take(cursor, name, lead)?);
            }
            Ok(Instruction::Raw { data })
        }
        OpcodeKind::RecStart => {
            expect_opcode(name, lead, OPCODE_REC_START)?;
            Ok(Instruction::RecStart)
        }
        OpcodeKind::RecStop => {
            expect_opcode(name, lead, OPCODE_REC_STOP)?;
            Ok(Instruction::RecStop)
        }
        OpcodeKind::Halt => {
            expect_opcode(name, lead, OPCODE_HALT)?;
            Ok(Instruction::Halt)
        }
        OpcodeKind::Fire => {
            if version != WireVersion::V2 {
                return Err(DecodeError::new(name, lead, DecodeErrorKind::WrongOpcode));
            }
            expect_opcode(name, lead, OPCODE_FIRE)?;
            let mask = take_be(cursor, name, lead, 8)?;
            let evaddr = take(cursor, name, lead)?;
            Ok(Instruction::Fire { mask, evaddr })
        }
        OpcodeKind::FireOneOrMadc => {
            if version != WireVersion::V3 {
                return Err(DecodeError::new(name, lead, DecodeErrorKind::WrongOpcode));
            }
            expect_opcode(name, lead, OPCODE_FIRE)?;
            let word = take_be(cursor, name, lead, 8)?;
            let index = take(cursor, name, lead)?;
            if index != 0 {
                return Err(DecodeError::new(
                    name,
                    index,
                    DecodeErrorKind::NonzeroSampleIndex,
                ));
            }
            Ok(Instruction::FireOneOrMadc {
                key: ((word >> 30) & 0x3) as u8,
                payload: (word & 0x3FFF_FFFF) as u32,
            })
        }
    }
}

/// Answers whether a full instruction of `kind` lies between the cursor and
/// the end of the buffer.
///
/// For `Raw` the length prefix is peeked without advancing. The dispatcher
/// uses this to tell a padded or truncated tail from a decode error; the
/// builder uses the same length accounting to decide when to open a new
/// page.
#[must_use]
pub fn fits<C: ReadCursor>(cursor: &C, kind: OpcodeKind) -> bool {
    kind.fixed_len().map_or_else(
        || {
            cursor
                .peek_at(1)
                .is_some_and(|len| cursor.remaining() >= 2 + usize::from(len))
        },
        |len| cursor.remaining() >= len,
    )
}

#[cfg(test)]
mod tests {
    use super::{decode_kind, encode, fits};
    use crate::cursor::{SliceReader, SliceWriter};
    use crate::encoding::OpcodeKind;
    use crate::error::{DecodeErrorKind, EncodeErrorKind};
    use crate::instruction::{Instruction, WireVersion};

    fn roundtrip(instruction: &Instruction, version: WireVersion) -> Instruction {
        let mut bytes = vec![0u8; 64];
        let mut writer = SliceWriter::new(&mut bytes);
        encode(&mut writer, instruction, version).expect("encodes");
        assert_eq!(writer.position(), instruction.encoded_len());

        let mut reader = SliceReader::new(&bytes);
        let decoded =
            decode_kind(&mut reader, instruction.kind(), version).expect("decodes");
        assert_eq!(reader.position(), instruction.encoded_len());
        decoded
    }

    #[test]
    fn fixed_width_instructions_round_trip() {
        let cases = [
            (Instruction::SetTime { time: 9 }, WireVersion::V3),
            (
                Instruction::WaitUntil {
                    time: u64::MAX,
                },
                WireVersion::V2,
            ),
            (Instruction::WaitFor7 { delay: 0x71 }, WireVersion::V3),
            (Instruction::WaitFor16 { delay: 0xFEEF }, WireVersion::V2),
            (
                Instruction::WaitFor32 {
                    delay: 0xDEAD_FACE,
                },
                WireVersion::V3,
            ),
            (Instruction::Read { address: 0 }, WireVersion::V2),
            (
                Instruction::Write {
                    address: 0x10,
                    data: 0xDEAD_FACE,
                },
                WireVersion::V3,
            ),
            (Instruction::RecStart, WireVersion::V2),
            (Instruction::RecStop, WireVersion::V3),
            (Instruction::Halt, WireVersion::V2),
            (
                Instruction::Fire {
                    mask: 0x8000_0000_0000_0001,
                    evaddr: 0x3F,
                },
                WireVersion::V2,
            ),
            (
                Instruction::FireOne {
                    index: 0x3F,
                    evaddr: 0xAF,
                },
                WireVersion::V2,
            ),
            (
                Instruction::FireOneOrMadc {
                    key: 3,
                    payload: 0x3FFF_FFFF,
                },
                WireVersion::V3,
            ),
        ];

        for (instruction, version) in cases {
            assert_eq!(roundtrip(&instruction, version), instruction);
        }
    }

    #[test]
    fn raw_round_trips_with_sixteen_payload_bytes() {
        let instruction = Instruction::Raw {
            data: vec![0xAA; 16],
        };
        assert_eq!(
            roundtrip(&instruction, WireVersion::V2),
            Instruction::Raw {
                data: vec![0xAA; 16]
            }
        );
    }

    #[test]
    fn raw_longer_than_the_length_prefix_is_rejected() {
        let mut bytes = vec![0u8; 512];
        let mut writer = SliceWriter::new(&mut bytes);
        let err = encode(
            &mut writer,
            &Instruction::Raw {
                data: vec![0; 256],
            },
            WireVersion::V2,
        )
        .expect_err("rejected");
        assert_eq!(err.kind, EncodeErrorKind::RawTooLong { len: 256 });
        assert_eq!(writer.position(), 0);
    }

    #[test]
    fn full_buffer_commits_nothing() {
        let mut bytes = [0u8; 4];
        let mut writer = SliceWriter::new(&mut bytes);
        let err = encode(
            &mut writer,
            &Instruction::SetTime { time: 1 },
            WireVersion::V2,
        )
        .expect_err("rejected");
        assert_eq!(err.kind, EncodeErrorKind::BufferFull);
        assert_eq!(bytes, [0u8; 4]);
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let mut bytes = [0u8; 16];

        for instruction in [
            Instruction::WaitFor7 { delay: 0x80 },
            Instruction::FireOne {
                index: 0x40,
                evaddr: 0,
            },
        ] {
            let mut writer = SliceWriter::new(&mut bytes);
            let err = encode(&mut writer, &instruction, WireVersion::V2).expect_err("rejected");
            assert_eq!(err.kind, EncodeErrorKind::FieldRange);
        }

        let mut writer = SliceWriter::new(&mut bytes);
        let err = encode(
            &mut writer,
            &Instruction::FireOneOrMadc {
                key: 0,
                payload: 1 << 30,
            },
            WireVersion::V3,
        )
        .expect_err("rejected");
        assert_eq!(err.kind, EncodeErrorKind::FieldRange);
    }

    #[test]
    fn fire_instructions_are_version_bound() {
        let mut bytes = [0u8; 16];

        let mut writer = SliceWriter::new(&mut bytes);
        let err = encode(
            &mut writer,
            &Instruction::Fire {
                mask: 1,
                evaddr: 0,
            },
            WireVersion::V3,
        )
        .expect_err("rejected");
        assert_eq!(
            err.kind,
            EncodeErrorKind::WrongVersion {
                version: WireVersion::V3
            }
        );

        let mut writer = SliceWriter::new(&mut bytes);
        let err = encode(
            &mut writer,
            &Instruction::FireOneOrMadc { key: 0, payload: 0 },
            WireVersion::V2,
        )
        .expect_err("rejected");
        assert_eq!(
            err.kind,
            EncodeErrorKind::WrongVersion {
                version: WireVersion::V2
            }
        );
    }

    #[test]
    fn wrong_leading_byte_is_reported_with_the_byte() {
        let bytes = [0x0B, 0, 0, 0, 0];
        let mut reader = SliceReader::new(&bytes);
        let err = decode_kind(&mut reader, OpcodeKind::SetTime, WireVersion::V2)
            .expect_err("rejected");
        assert_eq!(err.kind, DecodeErrorKind::WrongOpcode);
        assert_eq!(err.byte, 0x0B);
        assert_eq!(err.instruction, "set_time");
    }

    #[test]
    fn truncated_payload_is_an_unexpected_end() {
        let bytes = [0x00, 0x01, 0x02];
        let mut reader = SliceReader::new(&bytes);
        let err = decode_kind(&mut reader, OpcodeKind::SetTime, WireVersion::V2)
            .expect_err("rejected");
        assert_eq!(err.kind, DecodeErrorKind::UnexpectedEnd);
    }

    #[test]
    fn nonzero_sample_index_is_rejected() {
        let mut bytes = [0u8; 10];
        bytes[0] = 0x0F;
        bytes[9] = 0x07;
        let mut reader = SliceReader::new(&bytes);
        let err = decode_kind(&mut reader, OpcodeKind::FireOneOrMadc, WireVersion::V3)
            .expect_err("rejected");
        assert_eq!(err.kind, DecodeErrorKind::NonzeroSampleIndex);
        assert_eq!(err.byte, 0x07);
    }

    #[test]
    fn fits_is_exact_for_fixed_width_kinds() {
        let bytes = [0u8; 9];
        let reader = SliceReader::new(&bytes);
        assert!(fits(&reader, OpcodeKind::SetTime));
        assert!(fits(&reader, OpcodeKind::Read));

        let short = [0u8; 8];
        let reader = SliceReader::new(&short);
        assert!(!fits(&reader, OpcodeKind::SetTime));
        assert!(fits(&reader, OpcodeKind::Halt));
    }

    #[test]
    fn fits_peeks_the_raw_length_prefix() {
        let bytes = [0x02, 0x03, 0xAA, 0xBB, 0xCC];
        let reader = SliceReader::new(&bytes);
        assert!(fits(&reader, OpcodeKind::Raw));

        let truncated = [0x02, 0x04, 0xAA, 0xBB, 0xCC];
        let reader = SliceReader::new(&truncated);
        assert!(!fits(&reader, OpcodeKind::Raw));

        let missing_prefix = [0x02];
        let reader = SliceReader::new(&missing_prefix);
        assert!(!fits(&reader, OpcodeKind::Raw));
    }
}
