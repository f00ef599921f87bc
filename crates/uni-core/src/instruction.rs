//! Typed instruction model shared by the codec, dispatcher and sinks.

use std::fmt;

use crate::encoding::OpcodeKind;

/// Wire-format revision of the UNI protocol.
///
/// The two revisions share most opcodes but pack spike and MADC events
/// differently; the active revision is threaded explicitly through the
/// codec, the dispatcher and the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WireVersion {
    /// Revision with `fire`/`fire_one` spike instructions.
    V2,
    /// Revision with the multiplexed spike/MADC instruction.
    V3,
}

impl fmt::Display for WireVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V2 => f.write_str("v2"),
            Self::V3 => f.write_str("v3"),
        }
    }
}

/// Name column width used by the `Display` renderings.
const NAME_WIDTH: usize = 15;

/// One UNI instruction, decoded or to be encoded.
///
/// Every variant carries exactly the fields needed to re-encode it
/// bit-exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Instruction {
    /// Set the global system timer to an absolute value.
    SetTime {
        /// New timer value.
        time: u64,
    },
    /// Stall until the system timer reaches an absolute value.
    WaitUntil {
        /// Timer value to wait for.
        time: u64,
    },
    /// Stall for a relative delay of up to 7 bits, coded into the opcode
    /// byte itself.
    WaitFor7 {
        /// Delay in timer ticks, at most `0x7F`.
        delay: u8,
    },
    /// Stall for a relative 16-bit delay.
    WaitFor16 {
        /// Delay in timer ticks.
        delay: u16,
    },
    /// Stall for a relative 32-bit delay.
    WaitFor32 {
        /// Delay in timer ticks.
        delay: u32,
    },
    /// Read one register.
    Read {
        /// Register address.
        address: u32,
    },
    /// Write one register.
    Write {
        /// Register address.
        address: u32,
        /// Value to store.
        data: u32,
    },
    /// Pass a payload through to the link unchanged.
    Raw {
        /// Payload bytes, at most 255.
        data: Vec<u8>,
    },
    /// Start trace recording.
    RecStart,
    /// Stop trace recording.
    RecStop,
    /// End of program.
    Halt,
    /// Fire every event source selected by the mask (v2 only).
    Fire {
        /// One bit per event source.
        mask: u64,
        /// Event address sent with each spike.
        evaddr: u8,
    },
    /// Fire a single event source (v2 only), coded into the opcode byte.
    FireOne {
        /// Event source index, at most `0x3F`.
        index: u8,
        /// Event address sent with the spike.
        evaddr: u8,
    },
    /// Multiplexed spike or MADC sample record (v3 only).
    FireOneOrMadc {
        /// Selects spike (0) or the number of MADC samples (1 to 3).
        key: u8,
        /// 30-bit payload holding the samples or the inverted event address.
        payload: u32,
    },
}

impl Instruction {
    /// Wire name of the instruction, as used in error messages and the
    /// `Display` rendering.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetTime { .. } => "set_time",
            Self::WaitUntil { .. } => "wait_until",
            Self::WaitFor7 { .. } => "wait_for_7",
            Self::WaitFor16 { .. } => "wait_for_16",
            Self::WaitFor32 { .. } => "wait_for_32",
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::Raw { .. } => "raw",
            Self::RecStart => "rec_start",
            Self::RecStop => "rec_stop",
            Self::Halt => "halt",
            Self::Fire { .. } => "fire",
            Self::FireOne { .. } | Self::FireOneOrMadc { .. } => "fire_one",
        }
    }

    /// Opcode kind this instruction encodes as.
    #[must_use]
    pub const fn kind(&self) -> OpcodeKind {
        match self {
            Self::SetTime { .. } => OpcodeKind::SetTime,
            Self::WaitUntil { .. } => OpcodeKind::WaitUntil,
            Self::WaitFor7 { .. } => OpcodeKind::WaitFor7,
            Self::WaitFor16 { .. } => OpcodeKind::WaitFor16,
            Self::WaitFor32 { .. } => OpcodeKind::WaitFor32,
            Self::Read { .. } => OpcodeKind::Read,
            Self::Write { .. } => OpcodeKind::Write,
            Self::Raw { .. } => OpcodeKind::Raw,
            Self::RecStart => OpcodeKind::RecStart,
            Self::RecStop => OpcodeKind::RecStop,
            Self::Halt => OpcodeKind::Halt,
            Self::Fire { .. } => OpcodeKind::Fire,
            Self::FireOne { .. } => OpcodeKind::FireOne,
            Self::FireOneOrMadc { .. } => OpcodeKind::FireOneOrMadc,
        }
    }

    /// Number of bytes this instruction occupies on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Raw { data } => 2 + data.len(),
            other => other
                .kind()
                .fixed_len()
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::SetTime { time } | Self::WaitUntil { time } => {
                write!(f, "{name:>NAME_WIDTH$} {time}")
            }
            Self::WaitFor7 { delay } => write!(f, "{name:>NAME_WIDTH$} {delay}"),
            Self::WaitFor16 { delay } => write!(f, "{name:>NAME_WIDTH$} {delay}"),
            Self::WaitFor32 { delay } => write!(f, "{name:>NAME_WIDTH$} {delay}"),
            Self::Read { address } => write!(f, "{name:>NAME_WIDTH$} [{address:08x}]"),
            Self::Write { address, data } => {
                write!(f, "{name:>NAME_WIDTH$} [{address:08x}] = 0x{data:08x}")
            }
            Self::Raw { data } => {
                write!(f, "{name:>NAME_WIDTH$} x{} {{ ", data.len())?;
                for byte in data {
                    write!(f, "{byte:02x} ")?;
                }
                f.write_str("}")
            }
            Self::RecStart | Self::RecStop | Self::Halt => write!(f, "{name:>NAME_WIDTH$}"),
            Self::Fire { mask, evaddr } => {
                write!(f, "{name:>NAME_WIDTH$}  <{mask:064b}> addr={evaddr:x}")
            }
            Self::FireOne { index, evaddr } => {
                write!(f, "{name:>NAME_WIDTH$}  {index:>2} addr={evaddr:02x}")
            }
            Self::FireOneOrMadc { key, payload } => {
                write!(f, "{name:>NAME_WIDTH$} key={key} payload={payload:030b}")
            }
        }
    }
}

/// One spike event reconstructed from or destined for a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Spike {
    /// Absolute time of the event in timer ticks.
    pub time: u64,
    /// Logical event address.
    pub address: u64,
}

impl Spike {
    /// Creates a spike at the given time and logical address.
    #[must_use]
    pub const fn new(time: u64, address: u64) -> Self {
        Self { time, address }
    }
}

/// One MADC sample reconstructed from a v3 program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MadcSample {
    /// Absolute time of the sample in timer ticks.
    pub time: u64,
    /// 10-bit converter value.
    pub value: u16,
}

impl MadcSample {
    /// Creates a sample at the given time.
    #[must_use]
    pub const fn new(time: u64, value: u16) -> Self {
        Self { time, value }
    }
}
