//! Program construction for the UNI wire format.

/// Page allocation strategies.
pub mod allocator;
pub use allocator::{ByteVecAllocator, PageAllocator, WordVecAllocator, DEFAULT_BLOCK_SIZE};

/// Instruction-level program builder.
pub mod builder;
pub use builder::{BuildError, ProgramBuilder};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
