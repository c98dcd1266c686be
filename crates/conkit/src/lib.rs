// SPDX-License-Identifier: MIT
//
// conkit — a small cross-platform console toolkit.
//
// Three things a console program needs and nothing more: a double-buffered
// output channel that turns a frame of scattered updates into one write,
// ANSI/VT escape sequences for color, cursor movement, and screen control,
// and raw keyboard input plus terminal-size queries that behave the same on
// POSIX terminals and the Windows console.
//
// Layout, widgets, Unicode width, and the event loop are the host's
// business. The host starts a `Console`, queues text and sequences, flushes
// once per frame, polls for keys or resizes when it wants to, and stops the
// console before exiting.

pub mod config;
pub mod console;
pub mod driver;
pub mod error;
pub mod frame;
pub mod sequence;
pub mod size;

pub use config::ConsoleConfig;
pub use console::{Console, LifecycleState};
pub use driver::{Driver, NativeDriver};
pub use error::{Error, Result};
pub use frame::FrameBuffer;
pub use sequence::{Direction, Layer, Sequence, SequenceScratch};
pub use size::ConsoleSize;
