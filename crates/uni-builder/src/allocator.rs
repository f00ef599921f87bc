//! Page allocation strategies for the program builder.
//!
//! A program is built into a sequence of fixed-capacity pages so that
//! back-ends with bounded transfer sizes can ship it without re-chunking.
//! The allocator decides the buffer type of a page and how the builder's
//! byte cursor runs over it.

use uni_core::cursor::{ByteOrder, SliceWriter, WordWriter};
use uni_core::WriteCursor;

/// Default page capacity in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Creates and fills the buffer pages a program is built into.
pub trait PageAllocator {
    /// Buffer type of one page.
    type Page;
    /// Cursor the builder uses to fill a page.
    type Writer<'a>: WriteCursor
    where
        Self: 'a;

    /// Capacity of a freshly allocated page in bytes.
    fn block_size(&self) -> usize;

    /// Allocates a zeroed page of [`Self::block_size`] bytes.
    fn allocate(&self) -> Self::Page;

    /// Creates a cursor positioned `offset` bytes into `page`.
    fn writer<'a>(&self, page: &'a mut Self::Page, offset: usize) -> Self::Writer<'a>;
}

/// Allocates plain byte vector pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteVecAllocator {
    block_size: usize,
}

impl ByteVecAllocator {
    /// Creates an allocator with pages of `block_size` bytes.
    #[must_use]
    pub const fn new(block_size: usize) -> Self {
        Self { block_size }
    }
}

impl Default for ByteVecAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl PageAllocator for ByteVecAllocator {
    type Page = Vec<u8>;
    type Writer<'a>
        = SliceWriter<'a>
    where
        Self: 'a;

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn allocate(&self) -> Self::Page {
        vec![0; self.block_size]
    }

    fn writer<'a>(&self, page: &'a mut Self::Page, offset: usize) -> Self::Writer<'a> {
        SliceWriter::new(&mut page[offset..])
    }
}

/// Allocates 32-bit word pages with an explicit byte order.
///
/// Programs coded into word pages land directly in the transport's native
/// element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordVecAllocator {
    block_words: usize,
    order: ByteOrder,
}

impl WordVecAllocator {
    /// Creates an allocator with pages of `block_words` 32-bit words.
    #[must_use]
    pub const fn new(block_words: usize, order: ByteOrder) -> Self {
        Self { block_words, order }
    }
}

impl Default for WordVecAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE / 4, ByteOrder::MsbFirst)
    }
}

impl PageAllocator for WordVecAllocator {
    type Page = Vec<u32>;
    type Writer<'a>
        = WordWriter<'a, u32>
    where
        Self: 'a;

    fn block_size(&self) -> usize {
        self.block_words * 4
    }

    fn allocate(&self) -> Self::Page {
        vec![0; self.block_words]
    }

    fn writer<'a>(&self, page: &'a mut Self::Page, offset: usize) -> Self::Writer<'a> {
        WordWriter::starting_at(page, self.order, offset)
    }
}
