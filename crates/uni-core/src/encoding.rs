//! Opcode table and leading-byte classification for the UNI wire format.

use crate::instruction::WireVersion;

/// Opcode byte for `set_time`.
pub const OPCODE_SET_TIME: u8 = 0x00;
/// Opcode byte for `wait_until`.
pub const OPCODE_WAIT_UNTIL: u8 = 0x01;
/// Opcode byte for `raw`.
pub const OPCODE_RAW: u8 = 0x02;
/// Opcode byte for `wait_for_16`.
pub const OPCODE_WAIT_FOR_16: u8 = 0x04;
/// Opcode byte for `wait_for_32`.
pub const OPCODE_WAIT_FOR_32: u8 = 0x05;
/// Opcode byte for `write`.
pub const OPCODE_WRITE: u8 = 0x0a;
/// Opcode byte for `read`.
pub const OPCODE_READ: u8 = 0x0b;
/// Opcode byte for `rec_start`.
pub const OPCODE_REC_START: u8 = 0x0c;
/// Opcode byte for `rec_stop`.
pub const OPCODE_REC_STOP: u8 = 0x0d;
/// Opcode byte for `halt`.
pub const OPCODE_HALT: u8 = 0x0e;
/// Opcode byte for v2 `fire` and v3 `fire_one`/MADC.
pub const OPCODE_FIRE: u8 = 0x0f;

/// Marker bit of the self-describing `wait_for_7` byte.
pub const WAIT_FOR_7_BIT: u8 = 0x80;
/// Marker bit of the self-describing v2 `fire_one` byte.
pub const FIRE_ONE_BIT: u8 = 0x40;

/// Instruction kind selected by a leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum OpcodeKind {
    SetTime,
    WaitUntil,
    Raw,
    WaitFor7,
    WaitFor16,
    WaitFor32,
    Write,
    Read,
    RecStart,
    RecStop,
    Halt,
    Fire,
    FireOne,
    FireOneOrMadc,
}

impl OpcodeKind {
    /// Wire name of the kind, as used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SetTime => "set_time",
            Self::WaitUntil => "wait_until",
            Self::Raw => "raw",
            Self::WaitFor7 => "wait_for_7",
            Self::WaitFor16 => "wait_for_16",
            Self::WaitFor32 => "wait_for_32",
            Self::Write => "write",
            Self::Read => "read",
            Self::RecStart => "rec_start",
            Self::RecStop => "rec_stop",
            Self::Halt => "halt",
            Self::Fire => "fire",
            Self::FireOne | Self::FireOneOrMadc => "fire_one",
        }
    }

    /// Total encoded length in bytes, or `None` for `Raw` whose length
    /// follows from its length prefix.
    #[must_use]
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            Self::SetTime | Self::WaitUntil | Self::Write => Some(9),
            Self::WaitFor32 | Self::Read => Some(5),
            Self::WaitFor16 => Some(3),
            Self::WaitFor7 | Self::RecStart | Self::RecStop | Self::Halt => Some(1),
            Self::Fire | Self::FireOneOrMadc => Some(10),
            Self::FireOne => Some(2),
            Self::Raw => None,
        }
    }
}

/// Exact-match opcode assignments shared by both wire revisions.
///
/// `0x0f` resolves by revision and the self-describing `wait_for_7` and v2
/// `fire_one` patterns are matched on bits 7 and 6, so none of the three
/// appears here.
pub const OPCODE_TABLE: &[(u8, OpcodeKind)] = &[
    (OPCODE_SET_TIME, OpcodeKind::SetTime),
    (OPCODE_WAIT_UNTIL, OpcodeKind::WaitUntil),
    (OPCODE_RAW, OpcodeKind::Raw),
    (OPCODE_WAIT_FOR_16, OpcodeKind::WaitFor16),
    (OPCODE_WAIT_FOR_32, OpcodeKind::WaitFor32),
    (OPCODE_WRITE, OpcodeKind::Write),
    (OPCODE_READ, OpcodeKind::Read),
    (OPCODE_REC_START, OpcodeKind::RecStart),
    (OPCODE_REC_STOP, OpcodeKind::RecStop),
    (OPCODE_HALT, OpcodeKind::Halt),
];

/// Resolves a leading byte to the instruction kind it selects.
///
/// `None` means the byte matches no opcode of the given revision.
#[must_use]
pub fn classify(version: WireVersion, byte: u8) -> Option<OpcodeKind> {
    if byte & WAIT_FOR_7_BIT != 0 {
        return Some(OpcodeKind::WaitFor7);
    }

    if version == WireVersion::V2 && byte & FIRE_ONE_BIT != 0 {
        return Some(OpcodeKind::FireOne);
    }

    if byte == OPCODE_FIRE {
        return Some(match version {
            WireVersion::V2 => OpcodeKind::Fire,
            WireVersion::V3 => OpcodeKind::FireOneOrMadc,
        });
    }

    OPCODE_TABLE
        .iter()
        .find_map(|(opcode, kind)| (*opcode == byte).then_some(*kind))
}
