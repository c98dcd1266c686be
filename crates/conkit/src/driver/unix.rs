// SPDX-License-Identifier: MIT
//
// POSIX console driver — termios, TIOCGWINSZ, poll(), read().
//
// Safety: termios (tcgetattr, tcsetattr), ioctl, isatty, poll, and read are
// the POSIX interfaces for terminal control and have no safe std
// equivalent. Each unsafe block wraps exactly one libc call on a stack
// value we own.
#![allow(unsafe_code)]
//
// Raw mode here means no echo and no line buffering: ECHO and ICANON are
// cleared, VMIN=1 / VTIME=0 so a read returns as soon as one byte is there.
// ISIG is left alone, so Ctrl-C still interrupts the host. Reads go straight
// to fd 0 rather than through `io::stdin()`, whose internal buffer would
// swallow bytes that `poll()` then can't see.

use std::io;

use super::Driver;
use crate::error::{Error, Result};

/// Baseline termios and the raw variant derived from it.
#[derive(Clone, Copy)]
struct RawModeState {
    baseline: libc::termios,
    raw: libc::termios,
}

impl RawModeState {
    fn derive(baseline: libc::termios) -> Self {
        let mut raw = baseline;
        raw.c_lflag &= !(libc::ECHO | libc::ICANON);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        Self { baseline, raw }
    }
}

/// Driver for unix-like systems.
///
/// When stdin is not a terminal, capture records no baseline and raw
/// toggles do nothing; polling and reading still work on the pipe.
#[derive(Default)]
pub struct UnixDriver {
    state: Option<RawModeState>,
}

impl UnixDriver {
    /// A driver with no baseline captured yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: None }
    }

    /// Whether a terminal baseline is currently held.
    #[must_use]
    pub const fn has_baseline(&self) -> bool {
        self.state.is_some()
    }
}

impl std::fmt::Debug for UnixDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixDriver")
            .field("has_baseline", &self.has_baseline())
            .finish()
    }
}

/// Whether stdin is connected to a terminal.
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

fn set_attrs(termios: &libc::termios) -> Result<()> {
    if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, termios) } != 0 {
        return Err(Error::last_os_error("raw mode toggle"));
    }
    Ok(())
}

fn window_size(fd: libc::c_int) -> Option<(usize, usize)> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &raw mut ws) };

    (result == 0).then(|| (usize::from(ws.ws_col), usize::from(ws.ws_row)))
}

impl Driver for UnixDriver {
    fn capture(&mut self) -> Result<()> {
        if !is_tty() {
            tracing::debug!("stdin is not a terminal; raw mode disabled");
            self.state = None;
            return Ok(());
        }

        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) } != 0 {
            return Err(Error::last_os_error("capture"));
        }

        self.state = Some(RawModeState::derive(termios));
        tracing::debug!("termios baseline captured");
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if let Some(state) = self.state {
            let rc = unsafe {
                libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw const state.baseline)
            };
            if rc != 0 {
                return Err(Error::last_os_error("restore"));
            }
            self.state = None;
            tracing::debug!("termios baseline restored");
        }
        Ok(())
    }

    fn query_console_size(&mut self) -> Result<(usize, usize)> {
        window_size(libc::STDOUT_FILENO)
            .or_else(|| window_size(libc::STDIN_FILENO))
            .ok_or_else(|| Error::last_os_error("size query"))
    }

    fn toggle_raw_mode(&mut self, raw: bool) -> Result<()> {
        match &self.state {
            Some(state) if raw => set_attrs(&state.raw),
            Some(state) => set_attrs(&state.baseline),
            None => Ok(()),
        }
    }

    fn poll_input(&mut self) -> Result<bool> {
        let mut pfd = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };

        let ready = unsafe { libc::poll(&raw mut pfd, 1, 0) };
        if ready < 0 {
            return Err(Error::last_os_error("poll"));
        }
        Ok(ready > 0 && pfd.revents & libc::POLLIN != 0)
    }

    fn read_raw_char(&mut self) -> Result<u8> {
        let mut byte = 0u8;
        loop {
            let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };
            match n {
                1 => return Ok(byte),
                0 => return Err(Error::os("read", io::ErrorKind::UnexpectedEof.into())),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() != io::ErrorKind::Interrupted {
                        return Err(Error::os("read", err));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_state_clears_echo_and_canonical() {
        let mut baseline: libc::termios = unsafe { std::mem::zeroed() };
        baseline.c_lflag = libc::ECHO | libc::ICANON | libc::ISIG;

        let state = RawModeState::derive(baseline);

        assert_eq!(state.raw.c_lflag & libc::ECHO, 0);
        assert_eq!(state.raw.c_lflag & libc::ICANON, 0);
        assert_ne!(state.raw.c_lflag & libc::ISIG, 0);
        assert_eq!(state.raw.c_cc[libc::VMIN], 1);
        assert_eq!(state.raw.c_cc[libc::VTIME], 0);
        assert_eq!(state.baseline.c_lflag, baseline.c_lflag);
    }

    #[test]
    fn is_tty_does_not_panic() {
        let _ = is_tty();
    }

    #[test]
    fn size_query_does_not_panic() {
        let _ = UnixDriver::new().query_console_size();
    }

    #[test]
    fn restore_without_capture_is_noop() {
        let mut d = UnixDriver::new();
        d.restore().unwrap();
        assert!(!d.has_baseline());
    }

    #[test]
    fn toggle_without_baseline_is_noop() {
        let mut d = UnixDriver::new();
        d.toggle_raw_mode(true).unwrap();
        d.toggle_raw_mode(false).unwrap();
    }

    #[test]
    fn capture_restore_cycle() {
        let mut d = UnixDriver::new();
        if d.capture().is_ok() {
            d.restore().unwrap();
            assert!(!d.has_baseline());
        }
    }
}
