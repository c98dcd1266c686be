// SPDX-License-Identifier: MIT
//
// Platform console drivers.
//
// Every OS exposes the same handful of console capabilities in its own way:
// POSIX has termios, `TIOCGWINSZ`, and `poll()`; Windows has console mode
// flags and screen-buffer info. The `Driver` trait is the one shape both
// backends fit, and the raw-mode bracket that `read_char` and
// `key_available` need is written once here, on top of it.
//
// The bracket is per call. Raw mode is entered right before the read or
// poll and left right after, even if the read fails, so between calls the
// terminal is always in its normal cooked mode. Each call pays for two
// mode switches; in exchange a host that crashes between calls never
// leaves the user's shell without echo.

use std::thread;
use std::time::Duration;

use crate::error::Result;

pub mod scripted;

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod windows;

/// The driver for the platform this crate was built for.
#[cfg(unix)]
pub type NativeDriver = unix::UnixDriver;

/// The driver for the platform this crate was built for.
#[cfg(windows)]
pub type NativeDriver = windows::WindowsDriver;

#[cfg(not(any(unix, windows)))]
compile_error!("conkit supports unix-like systems and Windows only");

/// OS console capabilities.
///
/// Implementations hold the captured baseline console state between
/// [`capture`](Self::capture) and [`restore`](Self::restore).
pub trait Driver {
    /// Record the current console configuration as the baseline and derive
    /// the raw configuration from it. Backends that need ANSI processing
    /// switched on do it here.
    ///
    /// # Errors
    ///
    /// [`Error::OsQueryFailed`](crate::Error::OsQueryFailed) if the
    /// configuration cannot be read or changed.
    fn capture(&mut self) -> Result<()>;

    /// Put the baseline back exactly as captured. A second call without a
    /// new capture does nothing.
    ///
    /// # Errors
    ///
    /// [`Error::OsQueryFailed`](crate::Error::OsQueryFailed) if the OS
    /// rejects the restore.
    fn restore(&mut self) -> Result<()>;

    /// Current console dimensions as `(width, height)` in cells.
    ///
    /// # Errors
    ///
    /// [`Error::OsQueryFailed`](crate::Error::OsQueryFailed) if the size
    /// cannot be read (for example, output is not a terminal).
    fn query_console_size(&mut self) -> Result<(usize, usize)>;

    /// Switch input into raw mode (`true`) or back to the baseline
    /// (`false`). A no-op when no baseline was captured.
    ///
    /// # Errors
    ///
    /// [`Error::OsQueryFailed`](crate::Error::OsQueryFailed) if the mode
    /// cannot be applied.
    fn toggle_raw_mode(&mut self, raw: bool) -> Result<()>;

    /// Whether an input byte is pending, without waiting or consuming it.
    ///
    /// # Errors
    ///
    /// [`Error::OsQueryFailed`](crate::Error::OsQueryFailed) if polling
    /// fails.
    fn poll_input(&mut self) -> Result<bool>;

    /// Block until one input byte arrives and return it.
    ///
    /// # Errors
    ///
    /// [`Error::OsQueryFailed`](crate::Error::OsQueryFailed) if the read
    /// fails or input is closed.
    fn read_raw_char(&mut self) -> Result<u8>;

    /// Sleep for `ms` milliseconds. Not interruptible.
    fn delay(&mut self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

impl<D: Driver + ?Sized> Driver for &mut D {
    fn capture(&mut self) -> Result<()> {
        (**self).capture()
    }

    fn restore(&mut self) -> Result<()> {
        (**self).restore()
    }

    fn query_console_size(&mut self) -> Result<(usize, usize)> {
        (**self).query_console_size()
    }

    fn toggle_raw_mode(&mut self, raw: bool) -> Result<()> {
        (**self).toggle_raw_mode(raw)
    }

    fn poll_input(&mut self) -> Result<bool> {
        (**self).poll_input()
    }

    fn read_raw_char(&mut self) -> Result<u8> {
        (**self).read_raw_char()
    }

    fn delay(&mut self, ms: u64) {
        (**self).delay(ms);
    }
}

/// Run `f` with the driver in raw mode, then switch back.
///
/// The switch back happens whether or not `f` succeeds. If both fail, the
/// error from `f` wins.
///
/// # Errors
///
/// Whatever entering raw mode, `f`, or leaving raw mode returns.
pub fn with_raw_mode<D, T, F>(driver: &mut D, f: F) -> Result<T>
where
    D: Driver + ?Sized,
    F: FnOnce(&mut D) -> Result<T>,
{
    driver.toggle_raw_mode(true)?;
    let result = f(driver);
    let restored = driver.toggle_raw_mode(false);

    let value = result?;
    restored?;
    Ok(value)
}

/// Read one byte inside a raw-mode bracket.
///
/// # Errors
///
/// See [`with_raw_mode`] and [`Driver::read_raw_char`].
pub fn read_char<D: Driver + ?Sized>(driver: &mut D) -> Result<u8> {
    with_raw_mode(driver, D::read_raw_char)
}

/// Poll for pending input inside a raw-mode bracket.
///
/// # Errors
///
/// See [`with_raw_mode`] and [`Driver::poll_input`].
pub fn key_available<D: Driver + ?Sized>(driver: &mut D) -> Result<bool> {
    with_raw_mode(driver, D::poll_input)
}

#[cfg(test)]
mod tests {
    use super::scripted::{DriverCall, Fault, ScriptedDriver};
    use super::*;
    use crate::error::Error;

    fn captured(input: &[u8]) -> ScriptedDriver {
        let mut d = ScriptedDriver::new(80, 24).with_input(input);
        d.capture().unwrap();
        d
    }

    #[test]
    fn read_char_brackets_raw_mode() {
        let mut d = captured(b"x");
        assert_eq!(read_char(&mut d).unwrap(), b'x');
        assert!(!d.is_raw());
        assert_eq!(
            d.calls(),
            &[
                DriverCall::Capture,
                DriverCall::RawOn,
                DriverCall::Read,
                DriverCall::RawOff,
            ]
        );
    }

    #[test]
    fn key_available_does_not_consume() {
        let mut d = captured(b"q");
        assert!(key_available(&mut d).unwrap());
        assert!(key_available(&mut d).unwrap());
        assert_eq!(read_char(&mut d).unwrap(), b'q');
        assert!(!key_available(&mut d).unwrap());
    }

    #[test]
    fn failed_read_still_leaves_raw_mode() {
        let mut d = captured(b"");
        let err = read_char(&mut d).unwrap_err();
        assert!(err.is_os_failure());
        assert!(!d.is_raw());
        assert_eq!(d.calls().last(), Some(&DriverCall::RawOff));
    }

    #[test]
    fn failed_raw_entry_skips_operation() {
        let mut d = captured(b"z");
        d.inject(Fault::RawToggle);
        assert!(read_char(&mut d).is_err());
        assert!(!d.calls().contains(&DriverCall::Read));
    }

    #[test]
    fn operation_error_wins_over_exit_error() {
        let mut d = captured(b"");
        d.inject(Fault::Read);
        let err = with_raw_mode(&mut d, |d| {
            d.inject(Fault::RawToggle);
            d.read_raw_char()
        })
        .unwrap_err();
        assert!(matches!(err, Error::OsQueryFailed { operation: "read", .. }));
    }

    #[test]
    fn delay_is_recorded() {
        let mut d = ScriptedDriver::new(1, 1);
        d.delay(15);
        assert_eq!(d.calls(), &[DriverCall::Delay(15)]);
    }
}
