//! Instruction-level program construction over fixed-capacity pages.

use std::mem;

use thiserror::Error;
use uni_core::address_map::SpikeAddressMap;
use uni_core::codec::encode;
use uni_core::error::{EncodeError, EncodeErrorKind};
use uni_core::instruction::{Instruction, Spike, WireVersion};
use uni_core::WriteCursor;

use crate::allocator::PageAllocator;

/// Padding written to the tail of a page before a new one is opened.
const PAD: Instruction = Instruction::WaitFor7 { delay: 0 };

/// Reason a program could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    /// An instruction could not be coded onto the wire.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// A spiketrain was not sorted by time.
    #[error("spiketrain spikes must be sorted by non-decreasing time")]
    SpiketrainOrder,
}

/// Builds programs out of UNI instructions.
///
/// Instructions are coded into pages handed out by the allocator. When an
/// instruction does not fit the page's tail, the tail is padded with
/// one-byte waits and a fresh page is opened, so no instruction straddles a
/// page boundary.
pub struct ProgramBuilder<A: PageAllocator> {
    version: WireVersion,
    alloc: A,
    full: Vec<A::Page>,
    current: A::Page,
    used: usize,
}

impl<A: PageAllocator> ProgramBuilder<A> {
    /// Creates a builder coding for `version` with one open page.
    #[must_use]
    pub fn new(version: WireVersion, alloc: A) -> Self {
        let current = alloc.allocate();
        Self {
            version,
            alloc,
            full: Vec::new(),
            current,
            used: 0,
        }
    }

    /// Wire revision the program is coded for.
    #[must_use]
    pub const fn version(&self) -> WireVersion {
        self.version
    }

    /// Number of pages allocated so far, the open one included.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.full.len() + 1
    }

    /// Bytes coded into the open page.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Codes one instruction, opening a new page when it does not fit.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] when the instruction's fields do not fit
    /// the wire, it is not part of the active revision, or it is larger
    /// than a whole page.
    pub fn push(&mut self, instruction: &Instruction) -> Result<(), BuildError> {
        if instruction.encoded_len() > self.alloc.block_size() - self.used {
            self.open_page()?;
        }

        let mut writer = self.alloc.writer(&mut self.current, self.used);
        encode(&mut writer, instruction, self.version)?;
        self.used += instruction.encoded_len();
        Ok(())
    }

    fn open_page(&mut self) -> Result<(), EncodeError> {
        let mut writer = self.alloc.writer(&mut self.current, self.used);
        while writer.remaining() > 0 {
            encode(&mut writer, &PAD, self.version)?;
        }
        drop(writer);

        let fresh = self.alloc.allocate();
        self.full.push(mem::replace(&mut self.current, fresh));
        self.used = 0;
        Ok(())
    }

    /// Codes a `set_time` instruction.
    ///
    /// # Errors
    ///
    /// See [`Self::push`].
    pub fn set_time(&mut self, time: u64) -> Result<(), BuildError> {
        self.push(&Instruction::SetTime { time })
    }

    /// Codes a `wait_until` instruction.
    ///
    /// # Errors
    ///
    /// See [`Self::push`].
    pub fn wait_until(&mut self, time: u64) -> Result<(), BuildError> {
        self.push(&Instruction::WaitUntil { time })
    }

    /// Codes the narrowest `wait_for` encoding that holds `delay`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeErrorKind::DelayTooWide`] when `delay` exceeds the
    /// 32-bit encoding; use [`Self::wait_until`] for longer stalls.
    pub fn wait_for(&mut self, delay: u64) -> Result<(), BuildError> {
        let instruction = if delay <= 0x7F {
            Instruction::WaitFor7 {
                delay: (delay & 0x7F) as u8,
            }
        } else if delay <= 0xFFFF {
            Instruction::WaitFor16 {
                delay: (delay & 0xFFFF) as u16,
            }
        } else if delay <= 0xFFFF_FFFF {
            Instruction::WaitFor32 {
                delay: (delay & 0xFFFF_FFFF) as u32,
            }
        } else {
            return Err(
                EncodeError::new("wait_for_*", EncodeErrorKind::DelayTooWide { delay }).into(),
            );
        };

        self.push(&instruction)
    }

    /// Codes a `read` instruction.
    ///
    /// # Errors
    ///
    /// See [`Self::push`].
    pub fn read(&mut self, address: u32) -> Result<(), BuildError> {
        self.push(&Instruction::Read { address })
    }

    /// Codes a `write` instruction.
    ///
    /// # Errors
    ///
    /// See [`Self::push`].
    pub fn write(&mut self, address: u32, data: u32) -> Result<(), BuildError> {
        self.push(&Instruction::Write { address, data })
    }

    /// Codes a `raw` passthrough instruction.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeErrorKind::RawTooLong`] for payloads over 255 bytes.
    pub fn raw(&mut self, data: &[u8]) -> Result<(), BuildError> {
        self.push(&Instruction::Raw {
            data: data.to_vec(),
        })
    }

    /// Codes a `rec_start` instruction.
    ///
    /// # Errors
    ///
    /// See [`Self::push`].
    pub fn rec_start(&mut self) -> Result<(), BuildError> {
        self.push(&Instruction::RecStart)
    }

    /// Codes a `rec_stop` instruction.
    ///
    /// # Errors
    ///
    /// See [`Self::push`].
    pub fn rec_stop(&mut self) -> Result<(), BuildError> {
        self.push(&Instruction::RecStop)
    }

    /// Codes a `halt` instruction.
    ///
    /// # Errors
    ///
    /// See [`Self::push`].
    pub fn halt(&mut self) -> Result<(), BuildError> {
        self.push(&Instruction::Halt)
    }

    /// Codes a `fire` instruction over a full event source mask.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeErrorKind::WrongVersion`] outside of v2.
    pub fn fire(&mut self, mask: u64, evaddr: u8) -> Result<(), BuildError> {
        self.push(&Instruction::Fire { mask, evaddr })
    }

    /// Codes a single-source spike in the revision's own encoding.
    ///
    /// v3 carries no source index on the wire, so `index` only reaches the
    /// program under v2.
    ///
    /// # Errors
    ///
    /// See [`Self::push`].
    pub fn fire_one(&mut self, index: u8, evaddr: u8) -> Result<(), BuildError> {
        let instruction = match self.version {
            WireVersion::V2 => Instruction::FireOne { index, evaddr },
            WireVersion::V3 => Instruction::FireOneOrMadc {
                key: 0,
                payload: !u32::from(evaddr) & 0x3FFF_FFFF,
            },
        };

        self.push(&instruction)
    }

    /// Codes a spiketrain as `wait_until`, `fire_one` and `wait_for`
    /// instructions.
    ///
    /// `addr_map` splits each spike's logical address into the wire fields.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SpiketrainOrder`] when a spike's time lies
    /// before its predecessor's. Spikes at equal times share one point on
    /// the clock.
    pub fn spiketrain<M: SpikeAddressMap>(
        &mut self,
        spikes: &[Spike],
        addr_map: &M,
    ) -> Result<(), BuildError> {
        let Some((first, rest)) = spikes.split_first() else {
            return Ok(());
        };

        let mut time = first.time;
        self.wait_until(time)?;
        self.fire_one(addr_map.index(first.address), addr_map.evaddr(first.address))?;

        for spike in rest {
            if spike.time > time {
                self.wait_for(spike.time - time)?;
                time = spike.time;
            } else if spike.time < time {
                return Err(BuildError::SpiketrainOrder);
            }

            self.fire_one(addr_map.index(spike.address), addr_map.evaddr(spike.address))?;
        }

        Ok(())
    }

    /// Closes the open page and returns every page in program order.
    #[must_use]
    pub fn finish(self) -> Vec<A::Page> {
        let Self {
            mut full, current, ..
        } = self;
        full.push(current);
        full
    }
}
