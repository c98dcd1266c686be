// SPDX-License-Identifier: MIT
//
// Windows console driver — console mode flags and screen-buffer info.
//
// Safety: the console API is only reachable through FFI. Each unsafe block
// wraps one call on a handle from `GetStdHandle` and stack values we own.
#![allow(unsafe_code)]
//
// Two handles matter. The output handle gets ENABLE_VIRTUAL_TERMINAL_PROCESSING
// at capture so escape sequences are interpreted rather than printed; its
// previous mode word is put back verbatim at restore, not just with that bit
// cleared. The input handle's mode is the raw-mode baseline: raw clears
// ENABLE_ECHO_INPUT and ENABLE_LINE_INPUT.
//
// Size is the visible window (`srWindow`), not the scrollback buffer.

use std::io;
use std::ptr;

use windows_sys::Win32::Foundation::{HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::ReadFile;
use windows_sys::Win32::System::Console::{
    CONSOLE_MODE, CONSOLE_SCREEN_BUFFER_INFO, ENABLE_ECHO_INPUT, ENABLE_LINE_INPUT,
    ENABLE_VIRTUAL_TERMINAL_PROCESSING, GetConsoleMode, GetConsoleScreenBufferInfo,
    GetNumberOfConsoleInputEvents, GetStdHandle, INPUT_RECORD, KEY_EVENT, PeekConsoleInputW,
    STD_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE, SetConsoleMode,
};

use super::Driver;
use crate::error::{Error, Result};

/// Mode words captured at start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RawModeState {
    /// Input mode baseline, `None` when stdin is not a console.
    input_baseline: Option<CONSOLE_MODE>,
    /// Output mode before VT processing was enabled, `None` when stdout is
    /// not a console.
    output_baseline: Option<CONSOLE_MODE>,
}

/// Which standard handle a mode word belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Input,
    Output,
}

impl Stream {
    const fn handle(self) -> STD_HANDLE {
        match self {
            Self::Input => STD_INPUT_HANDLE,
            Self::Output => STD_OUTPUT_HANDLE,
        }
    }
}

impl RawModeState {
    const fn raw_input(baseline: CONSOLE_MODE) -> CONSOLE_MODE {
        baseline & !(ENABLE_ECHO_INPUT | ENABLE_LINE_INPUT)
    }

    /// Put back every baseline still held, through `apply`.
    ///
    /// Both streams are attempted even if the first fails. A baseline is
    /// forgotten only once its restore succeeded, so a later call retries
    /// just what is left. Returns the first failure.
    fn restore_with(
        &mut self,
        mut apply: impl FnMut(Stream, CONSOLE_MODE) -> Result<()>,
    ) -> Result<()> {
        let mut first_err = None;
        for (stream, slot) in [
            (Stream::Input, &mut self.input_baseline),
            (Stream::Output, &mut self.output_baseline),
        ] {
            let Some(mode) = *slot else {
                continue;
            };
            match apply(stream, mode) {
                Ok(()) => *slot = None,
                Err(err) => {
                    tracing::warn!(?stream, %err, "console mode restore failed");
                    first_err.get_or_insert(err);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    const fn is_restored(&self) -> bool {
        self.input_baseline.is_none() && self.output_baseline.is_none()
    }
}

/// Driver for the Windows console.
#[derive(Debug, Default)]
pub struct WindowsDriver {
    state: Option<RawModeState>,
}

impl WindowsDriver {
    /// A driver with no baseline captured yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: None }
    }

    /// Whether a console baseline is currently held.
    #[must_use]
    pub const fn has_baseline(&self) -> bool {
        self.state.is_some()
    }
}

fn std_handle(which: STD_HANDLE, operation: &'static str) -> Result<HANDLE> {
    let handle = unsafe { GetStdHandle(which) };
    if handle.is_null() || handle == INVALID_HANDLE_VALUE {
        return Err(Error::last_os_error(operation));
    }
    Ok(handle)
}

/// The handle's mode, or `None` if it isn't a console.
fn console_mode(handle: HANDLE) -> Option<CONSOLE_MODE> {
    let mut mode: CONSOLE_MODE = 0;
    (unsafe { GetConsoleMode(handle, &raw mut mode) } != 0).then_some(mode)
}

fn set_console_mode(handle: HANDLE, mode: CONSOLE_MODE, operation: &'static str) -> Result<()> {
    if unsafe { SetConsoleMode(handle, mode) } == 0 {
        return Err(Error::last_os_error(operation));
    }
    Ok(())
}

fn is_key_press(record: &INPUT_RECORD) -> bool {
    if u32::from(record.EventType) != KEY_EVENT {
        return false;
    }
    let key = unsafe { record.Event.KeyEvent };
    key.bKeyDown != 0 && unsafe { key.uChar.UnicodeChar } != 0
}

impl Driver for WindowsDriver {
    fn capture(&mut self) -> Result<()> {
        let output = std_handle(STD_OUTPUT_HANDLE, "capture")?;
        let input = std_handle(STD_INPUT_HANDLE, "capture")?;

        let state = RawModeState {
            input_baseline: console_mode(input),
            output_baseline: console_mode(output),
        };

        if let Some(mode) = state.output_baseline {
            set_console_mode(output, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING, "capture")?;
        }

        tracing::debug!(
            input_mode = ?state.input_baseline,
            output_mode = ?state.output_baseline,
            "console baseline captured"
        );
        self.state = Some(state);
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        let result = state.restore_with(|stream, mode| {
            set_console_mode(std_handle(stream.handle(), "restore")?, mode, "restore")
        });

        if state.is_restored() {
            self.state = None;
            tracing::debug!("console baseline restored");
        }
        result
    }

    fn query_console_size(&mut self) -> Result<(usize, usize)> {
        let output = std_handle(STD_OUTPUT_HANDLE, "size query")?;
        let mut info: CONSOLE_SCREEN_BUFFER_INFO = unsafe { std::mem::zeroed() };
        if unsafe { GetConsoleScreenBufferInfo(output, &raw mut info) } == 0 {
            return Err(Error::last_os_error("size query"));
        }

        let window = info.srWindow;
        let extent = |lo: i16, hi: i16| usize::try_from(i32::from(hi) - i32::from(lo) + 1).unwrap_or(0);
        Ok((
            extent(window.Left, window.Right),
            extent(window.Top, window.Bottom),
        ))
    }

    fn toggle_raw_mode(&mut self, raw: bool) -> Result<()> {
        let Some(baseline) = self.state.and_then(|s| s.input_baseline) else {
            return Ok(());
        };
        let mode = if raw {
            RawModeState::raw_input(baseline)
        } else {
            baseline
        };
        set_console_mode(
            std_handle(STD_INPUT_HANDLE, "raw mode toggle")?,
            mode,
            "raw mode toggle",
        )
    }

    fn poll_input(&mut self) -> Result<bool> {
        let input = std_handle(STD_INPUT_HANDLE, "poll")?;

        let mut pending = 0u32;
        if unsafe { GetNumberOfConsoleInputEvents(input, &raw mut pending) } == 0 {
            return Err(Error::last_os_error("poll"));
        }
        if pending == 0 {
            return Ok(false);
        }

        let mut records: Vec<INPUT_RECORD> = vec![unsafe { std::mem::zeroed() }; pending as usize];
        let mut peeked = 0u32;
        if unsafe { PeekConsoleInputW(input, records.as_mut_ptr(), pending, &raw mut peeked) } == 0 {
            return Err(Error::last_os_error("poll"));
        }

        Ok(records[..peeked as usize].iter().any(is_key_press))
    }

    fn read_raw_char(&mut self) -> Result<u8> {
        let input = std_handle(STD_INPUT_HANDLE, "read")?;

        let mut byte = 0u8;
        let mut read = 0u32;
        let ok = unsafe { ReadFile(input, &raw mut byte, 1, &raw mut read, ptr::null_mut()) };
        if ok == 0 {
            return Err(Error::last_os_error("read"));
        }
        if read == 0 {
            return Err(Error::os("read", io::ErrorKind::UnexpectedEof.into()));
        }
        Ok(byte)
    }
}
