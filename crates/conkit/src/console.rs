// SPDX-License-Identifier: MIT
//
// Console — the lifecycle context that owns everything else.
//
// A console starts Uninitialized. `start()` captures the OS console
// baseline, allocates the frame buffer and sequence scratch, and moves to
// Active. `stop()` puts the baseline back, releases both buffers, and
// returns to Uninitialized. Anything else called while Uninitialized is an
// `InvalidLifecycleUse` error rather than a crash.
//
// All state that a console toolkit would traditionally keep in globals
// (buffers, last-known size, termios backup) lives here instead, so tests
// can run several consoles side by side against scripted drivers.
//
// Dropping an Active console stops it. A host that bails out early with `?`
// still hands the user back a working terminal.

use std::io::{self, Write};

use crate::config::ConsoleConfig;
use crate::driver::{self, Driver, NativeDriver};
use crate::error::{Error, Result};
use crate::frame::FrameBuffer;
use crate::sequence::{Sequence, SequenceScratch};
use crate::size::{ConsoleSize, SizeTracker};

/// Where a console is in its start/stop bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Active,
}

impl LifecycleState {
    /// Lowercase name, as used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
        }
    }
}

/// Buffers that exist only while the console is Active.
#[derive(Debug)]
struct Session {
    frame: FrameBuffer,
    scratch: SequenceScratch,
    size: SizeTracker,
}

impl Session {
    fn allocate(config: &ConsoleConfig) -> Result<Self> {
        Ok(Self {
            frame: FrameBuffer::with_capacity(config.initial_capacity, config.growth_step)?,
            scratch: SequenceScratch::new()?,
            size: SizeTracker::new(),
        })
    }
}

/// Borrow the session, or report that `operation` needs an Active console.
fn active<'a>(session: &'a mut Option<Session>, operation: &'static str) -> Result<&'a mut Session> {
    session.as_mut().ok_or(Error::InvalidLifecycleUse {
        operation,
        state: LifecycleState::Uninitialized.as_str(),
    })
}

/// A console: platform driver, output sink, and the buffers between them.
///
/// # Example
///
/// ```no_run
/// use conkit::{Console, ConsoleConfig, sequence};
///
/// let mut console = Console::open(ConsoleConfig::default())?;
/// console.append_str(sequence::CLEAR_CONSOLE)?;
/// console.append_str(conkit::fg_rgb!(255, 128, 0))?;
/// console.append_str("hello")?;
/// console.flush()?;
/// console.stop()?;
/// # Ok::<(), conkit::Error>(())
/// ```
pub struct Console<D: Driver = NativeDriver, W: Write = io::StdoutLock<'static>> {
    driver: D,
    sink: W,
    config: ConsoleConfig,
    session: Option<Session>,
}

impl Console {
    /// Build a console on the native driver and a locked stdout, and start
    /// it. The lock is held for the console's lifetime.
    ///
    /// # Errors
    ///
    /// Whatever [`start`](Self::start) returns.
    pub fn open(config: ConsoleConfig) -> Result<Self> {
        let mut console = Self::new(NativeDriver::new(), io::stdout().lock(), config);
        console.start()?;
        Ok(console)
    }
}

impl<D: Driver, W: Write> Console<D, W> {
    /// Build an Uninitialized console. Nothing touches the OS until
    /// [`start`](Self::start).
    #[must_use]
    pub const fn new(driver: D, sink: W, config: ConsoleConfig) -> Self {
        Self {
            driver,
            sink,
            config,
            session: None,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Uninitialized → Active.
    ///
    /// Captures the console baseline (enabling ANSI processing where the
    /// platform needs it), then allocates the frame buffer and scratch. If
    /// allocation fails the baseline is put back before returning.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLifecycleUse`] if already Active.
    /// - [`Error::OsQueryFailed`] if the baseline can't be captured.
    /// - [`Error::AllocationExhausted`] if the buffers can't be allocated.
    pub fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::InvalidLifecycleUse {
                operation: "start",
                state: LifecycleState::Active.as_str(),
            });
        }

        self.driver.capture()?;

        match Session::allocate(&self.config) {
            Ok(session) => self.session = Some(session),
            Err(err) => {
                if let Err(restore_err) = self.driver.restore() {
                    tracing::warn!(%restore_err, "baseline restore after failed start failed");
                }
                return Err(err);
            }
        }

        tracing::debug!(
            initial_capacity = self.config.initial_capacity,
            growth_step = self.config.growth_step,
            "console started"
        );
        Ok(())
    }

    /// Active → Uninitialized.
    ///
    /// Restores the captured baseline and releases the buffers. Any queued,
    /// unflushed frame content is discarded. The buffers are released even
    /// if the restore fails.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLifecycleUse`] if not Active.
    /// - [`Error::OsQueryFailed`] if the baseline can't be restored.
    pub fn stop(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Err(Error::InvalidLifecycleUse {
                operation: "stop",
                state: LifecycleState::Uninitialized.as_str(),
            });
        }

        let restored = self.driver.restore();
        self.session = None;
        tracing::debug!(ok = restored.is_ok(), "console stopped");
        restored
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        if self.session.is_some() {
            LifecycleState::Active
        } else {
            LifecycleState::Uninitialized
        }
    }

    /// Whether the console is Active.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The configuration buffers are allocated from.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    // ── Platform ────────────────────────────────────────────────────

    /// Query the console size and compare it with the last query.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycleUse`] if not Active, or
    /// [`Error::OsQueryFailed`] if the OS query fails. A failed query leaves
    /// the last-known size untouched.
    pub fn query_size(&mut self) -> Result<ConsoleSize> {
        let session = active(&mut self.session, "query size")?;
        let (width, height) = self.driver.query_console_size()?;
        Ok(session.size.observe(width, height))
    }

    /// Block until one input byte arrives, in raw mode for just this call.
    ///
    /// Multi-byte keys (UTF-8, escape sequences) arrive over successive
    /// calls.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycleUse`] if not Active, or
    /// [`Error::OsQueryFailed`] if a mode switch or the read fails.
    pub fn read_char(&mut self) -> Result<u8> {
        active(&mut self.session, "read char")?;
        driver::read_char(&mut self.driver)
    }

    /// Whether input is pending, without blocking or consuming it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycleUse`] if not Active, or
    /// [`Error::OsQueryFailed`] if a mode switch or the poll fails.
    pub fn key_available(&mut self) -> Result<bool> {
        active(&mut self.session, "check for input")?;
        driver::key_available(&mut self.driver)
    }

    /// Sleep for `ms` milliseconds.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycleUse`] if not Active.
    pub fn delay(&mut self, ms: u64) -> Result<()> {
        active(&mut self.session, "delay")?;
        self.driver.delay(ms);
        Ok(())
    }

    // ── Output ──────────────────────────────────────────────────────

    /// Queue bytes into the frame.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycleUse`] if not Active, or
    /// [`Error::AllocationExhausted`] if the frame can't grow.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        active(&mut self.session, "append")?.frame.append(bytes)
    }

    /// Queue text into the frame.
    ///
    /// # Errors
    ///
    /// Same as [`append`](Self::append).
    pub fn append_str(&mut self, text: &str) -> Result<()> {
        self.append(text.as_bytes())
    }

    /// Format `seq` in the scratch and queue it into the frame.
    ///
    /// # Errors
    ///
    /// Same as [`append`](Self::append).
    pub fn append_sequence(&mut self, seq: Sequence) -> Result<()> {
        let session = active(&mut self.session, "append sequence")?;
        let text = session.scratch.generate(seq);
        session.frame.append(text.as_bytes())
    }

    /// Format `seq` in the scratch and return a view of it. The view is
    /// overwritten by the next generated sequence.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycleUse`] if not Active.
    pub fn generate(&mut self, seq: Sequence) -> Result<&str> {
        Ok(active(&mut self.session, "generate sequence")?
            .scratch
            .generate(seq))
    }

    /// The shared sequence scratch.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycleUse`] if not Active.
    pub fn sequences(&mut self) -> Result<&mut SequenceScratch> {
        Ok(&mut active(&mut self.session, "generate sequence")?.scratch)
    }

    /// The frame buffer, for `write!` and inspection.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycleUse`] if not Active.
    pub fn frame(&mut self) -> Result<&mut FrameBuffer> {
        Ok(&mut active(&mut self.session, "access frame")?.frame)
    }

    /// Write `ESC[H` plus the queued frame to the sink, then clear the frame.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycleUse`] if not Active, or
    /// [`Error::OutputFailed`] if the sink rejects the write (the frame is
    /// kept).
    pub fn flush(&mut self) -> Result<()> {
        active(&mut self.session, "flush")?
            .frame
            .flush_to(&mut self.sink)
    }

    // ── Parts ───────────────────────────────────────────────────────

    /// The platform driver.
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The platform driver, mutably.
    pub const fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// The output sink.
    #[must_use]
    pub const fn sink(&self) -> &W {
        &self.sink
    }
}

impl<D: Driver, W: Write> Drop for Console<D, W> {
    fn drop(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Err(err) = self.stop() {
            tracing::warn!(%err, "console cleanup on drop failed");
        }
    }
}

impl<D: Driver, W: Write> std::fmt::Debug for Console<D, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
