// SPDX-License-Identifier: MIT
//
// Headless driver with scripted input, size, and failures.
//
// Stands in for a real console where there is none: tests, CI, or a host
// rendering into a pipe. Every capability call is recorded, input comes
// from a byte queue, the "terminal" size is whatever the script says, and
// one-shot faults make the next matching call fail the way an OS call would.

use std::collections::VecDeque;
use std::io;

use super::Driver;
use crate::error::{Error, Result};

/// A capability call observed by [`ScriptedDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCall {
    Capture,
    Restore,
    QuerySize,
    RawOn,
    RawOff,
    Poll,
    Read,
    Delay(u64),
}

/// A failure to inject into the next matching call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Capture,
    Restore,
    SizeQuery,
    RawToggle,
    Poll,
    Read,
}

/// Driver backed by in-memory state.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    width: usize,
    height: usize,
    input: VecDeque<u8>,
    captured: bool,
    raw: bool,
    restores: usize,
    faults: Vec<Fault>,
    calls: Vec<DriverCall>,
}

impl ScriptedDriver {
    /// A driver reporting `width × height` with no pending input.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Queue `bytes` as pending input.
    #[must_use]
    pub fn with_input(mut self, bytes: &[u8]) -> Self {
        self.push_input(bytes);
        self
    }

    /// Queue more input.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    /// Simulate a resize.
    pub const fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Make the next call matching `fault` fail.
    pub fn inject(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    /// Every capability call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    /// Whether input is currently in raw mode.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.raw
    }

    /// Whether a baseline is currently held.
    #[must_use]
    pub const fn is_captured(&self) -> bool {
        self.captured
    }

    /// How many times a held baseline was actually put back.
    #[must_use]
    pub const fn restore_count(&self) -> usize {
        self.restores
    }

    /// Bytes still waiting to be read.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    fn fail_if_injected(&mut self, fault: Fault, operation: &'static str) -> Result<()> {
        match self.faults.iter().position(|&f| f == fault) {
            Some(i) => {
                self.faults.remove(i);
                Err(Error::os(operation, io::Error::other("injected fault")))
            }
            None => Ok(()),
        }
    }
}

impl Driver for ScriptedDriver {
    fn capture(&mut self) -> Result<()> {
        self.calls.push(DriverCall::Capture);
        self.fail_if_injected(Fault::Capture, "capture")?;
        self.captured = true;
        self.raw = false;
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        self.calls.push(DriverCall::Restore);
        if !self.captured {
            return Ok(());
        }
        self.fail_if_injected(Fault::Restore, "restore")?;
        self.captured = false;
        self.raw = false;
        self.restores += 1;
        Ok(())
    }

    fn query_console_size(&mut self) -> Result<(usize, usize)> {
        self.calls.push(DriverCall::QuerySize);
        self.fail_if_injected(Fault::SizeQuery, "size query")?;
        Ok((self.width, self.height))
    }

    fn toggle_raw_mode(&mut self, raw: bool) -> Result<()> {
        self.calls
            .push(if raw { DriverCall::RawOn } else { DriverCall::RawOff });
        self.fail_if_injected(Fault::RawToggle, "raw mode toggle")?;
        if self.captured {
            self.raw = raw;
        }
        Ok(())
    }

    fn poll_input(&mut self) -> Result<bool> {
        self.calls.push(DriverCall::Poll);
        self.fail_if_injected(Fault::Poll, "poll")?;
        Ok(!self.input.is_empty())
    }

    fn read_raw_char(&mut self) -> Result<u8> {
        self.calls.push(DriverCall::Read);
        self.fail_if_injected(Fault::Read, "read")?;
        self.input
            .pop_front()
            .ok_or_else(|| Error::os("read", io::ErrorKind::UnexpectedEof.into()))
    }

    fn delay(&mut self, ms: u64) {
        self.calls.push(DriverCall::Delay(ms));
    }
}
