// SPDX-License-Identifier: MIT
//
// FrameBuffer — the double-buffered output channel.
//
// Hosts queue an entire frame of text and escape sequences here, then flush
// once. The home-cursor sequence sits permanently in front of the content,
// so a flush is a single `write_all` of home + everything queued and the
// terminal never shows a half-drawn frame.
//
// Growth is fixed-step, not doubling: when an append doesn't fit, capacity
// increases by `growth_step` as many times as needed. Frames are roughly the
// same size from one to the next, so after the first few frames the buffer
// stops growing entirely and every flush reuses the same allocation.
//
// The stored bytes are always NUL-terminated. `length < capacity` holds at
// all times because one byte of capacity is kept for that terminator. The
// home prefix is not counted in either.

use std::io::{self, Write};

use crate::error::{Error, Result};
use crate::sequence::CURSOR_HOME;

/// Initial frame capacity used by [`ConsoleConfig::default`](crate::ConsoleConfig).
pub const DEFAULT_CAPACITY: usize = 100;

/// Capacity increment used by [`ConsoleConfig::default`](crate::ConsoleConfig).
pub const DEFAULT_GROWTH_STEP: usize = 100;

/// Bytes stored ahead of the content and written with every flush.
const PREFIX: &[u8] = CURSOR_HOME.as_bytes();

/// Growable accumulator of queued output.
#[derive(Debug)]
pub struct FrameBuffer {
    /// `ESC[H`, then the content, then exactly one NUL byte.
    buf: Vec<u8>,
    /// Logical allocation size. Only ever grows.
    capacity: usize,
    growth_step: usize,
}

impl FrameBuffer {
    /// Allocate an empty frame.
    ///
    /// Zero values for either argument are clamped to 1.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationExhausted`] if the initial allocation fails.
    pub fn with_capacity(initial_capacity: usize, growth_step: usize) -> Result<Self> {
        let capacity = initial_capacity.max(1);
        let exhausted = || Error::AllocationExhausted {
            requested: capacity,
        };
        let reserve = capacity.checked_add(PREFIX.len()).ok_or_else(exhausted)?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(reserve).map_err(|_| exhausted())?;
        buf.extend_from_slice(PREFIX);
        buf.push(0);

        Ok(Self {
            buf,
            capacity,
            growth_step: growth_step.max(1),
        })
    }

    /// Number of content bytes queued (terminator excluded).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len() - PREFIX.len() - 1
    }

    /// Whether nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated size in bytes, terminator slot included.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Capacity increment applied when an append doesn't fit.
    #[inline]
    #[must_use]
    pub const fn growth_step(&self) -> usize {
        self.growth_step
    }

    /// The queued content.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[PREFIX.len()..self.buf.len() - 1]
    }

    /// The queued content including its trailing NUL.
    #[inline]
    #[must_use]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf[PREFIX.len()..]
    }

    /// Queue raw bytes.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationExhausted`] if the buffer has to grow and the
    /// allocation fails. The queued content and capacity are unchanged.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        let required = self
            .len()
            .checked_add(bytes.len())
            .and_then(|n| n.checked_add(1))
            .ok_or(Error::AllocationExhausted {
                requested: usize::MAX,
            })?;

        if required > self.capacity {
            self.grow_to(required)?;
        }

        self.buf.pop();
        self.buf.extend_from_slice(bytes);
        self.buf.push(0);
        Ok(())
    }

    /// Queue text.
    ///
    /// # Errors
    ///
    /// Same as [`append`](Self::append).
    #[inline]
    pub fn append_str(&mut self, text: &str) -> Result<()> {
        self.append(text.as_bytes())
    }

    /// Drop the queued content, keeping capacity.
    pub fn clear(&mut self) {
        self.buf.truncate(PREFIX.len());
        self.buf.push(0);
    }

    /// Write `ESC[H` followed by the queued content to `w` in a single
    /// `write_all`, flush `w`, and clear the frame.
    ///
    /// An empty frame still writes the home sequence.
    ///
    /// # Errors
    ///
    /// [`Error::OutputFailed`] if writing fails. The frame is kept so the
    /// host can retry.
    pub fn flush_to(&mut self, w: &mut impl Write) -> Result<()> {
        let end = self.buf.len() - 1;
        w.write_all(&self.buf[..end])
            .and_then(|()| w.flush())
            .map_err(Error::OutputFailed)?;

        tracing::trace!(bytes = self.len(), capacity = self.capacity, "frame flushed");
        self.clear();
        Ok(())
    }

    /// Raise capacity by whole growth steps until it reaches `required`.
    fn grow_to(&mut self, required: usize) -> Result<()> {
        let steps = (required - self.capacity).div_ceil(self.growth_step);
        let capacity = steps
            .checked_mul(self.growth_step)
            .and_then(|extra| self.capacity.checked_add(extra))
            .ok_or(Error::AllocationExhausted {
                requested: required,
            })?;
        let reserve = capacity
            .checked_add(PREFIX.len())
            .ok_or(Error::AllocationExhausted {
                requested: capacity,
            })?;

        self.buf
            .try_reserve_exact(reserve - self.buf.len())
            .map_err(|_| Error::AllocationExhausted {
                requested: capacity,
            })?;

        tracing::trace!(from = self.capacity, to = capacity, "frame buffer grown");
        self.capacity = capacity;
        Ok(())
    }
}

impl Write for FrameBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Queued output only reaches the terminal via flush_to().
        Ok(())
    }
}
