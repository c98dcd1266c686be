// SPDX-License-Identifier: MIT
//
// ANSI/VT escape sequence generation.
//
// Two families:
//
//   Literal — everything known at compile time. Fixed commands are plain
//   constants; parameterized ones are macros that `concat!` their literal
//   arguments into a `&'static str`. No runtime cost, no shared state.
//
//   Generated — parameters known only at run time. These are formatted
//   into one scratch region owned by the console and handed back as a view
//   of that region. The next generated sequence overwrites it, so a result
//   must be consumed (queued, written, copied) before asking for another.
//   The view borrows the scratch mutably, so the compiler enforces that.
//
// Both families produce byte-identical output for the same parameters.
// Cursor coordinates are passed through verbatim: ANSI CUP is 1-based and
// so is this API.

use std::fmt::{self, Write as _};

use crate::error::{Error, Result};

// ─── Literal: fixed commands ─────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
pub const CLEAR_CONSOLE: &str = "\x1b[2J";

/// Reset all SGR attributes (SGR 0).
pub const RESET_FORMATTING: &str = "\x1b[0m";

/// Show the cursor (DECTCEM set).
pub const SHOW_CURSOR: &str = "\x1b[?25h";

/// Hide the cursor (DECTCEM reset).
pub const HIDE_CURSOR: &str = "\x1b[?25l";

/// Move the cursor to the top-left cell. Prefixes every frame flush.
pub const CURSOR_HOME: &str = "\x1b[H";

// ─── Literal: parameterized macros ───────────────────────────────────────────

/// Truecolor foreground from literal components.
///
/// ```
/// assert_eq!(conkit::fg_rgb!(255, 0, 0), "\x1b[38;2;255;0;0m");
/// ```
#[macro_export]
macro_rules! fg_rgb {
    ($r:literal, $g:literal, $b:literal) => {
        concat!("\x1b[38;2;", $r, ";", $g, ";", $b, "m")
    };
}

/// Truecolor background from literal components.
#[macro_export]
macro_rules! bg_rgb {
    ($r:literal, $g:literal, $b:literal) => {
        concat!("\x1b[48;2;", $r, ";", $g, ";", $b, "m")
    };
}

/// Absolute cursor position from a literal column and row (1-based).
///
/// ```
/// assert_eq!(conkit::cursor_goto!(10, 5), "\x1b[5;10H");
/// ```
#[macro_export]
macro_rules! cursor_goto {
    ($col:literal, $row:literal) => {
        concat!("\x1b[", $row, ";", $col, "H")
    };
}

/// Move the cursor up by a literal number of lines.
#[macro_export]
macro_rules! cursor_up {
    ($n:literal) => {
        concat!("\x1b[", $n, "A")
    };
}

/// Move the cursor down by a literal number of lines.
#[macro_export]
macro_rules! cursor_down {
    ($n:literal) => {
        concat!("\x1b[", $n, "B")
    };
}

/// Move the cursor right by a literal number of columns.
#[macro_export]
macro_rules! cursor_right {
    ($n:literal) => {
        concat!("\x1b[", $n, "C")
    };
}

/// Move the cursor left by a literal number of columns.
#[macro_export]
macro_rules! cursor_left {
    ($n:literal) => {
        concat!("\x1b[", $n, "D")
    };
}

// ─── Generated: sequence descriptions ────────────────────────────────────────

/// Which color a truecolor sequence sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Text color (SGR 38).
    Foreground,
    /// Cell background (SGR 48).
    Background,
}

impl Layer {
    /// The SGR selector for this layer.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Foreground => 38,
            Self::Background => 48,
        }
    }
}

/// Direction of a relative cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// CUU.
    Up,
    /// CUD.
    Down,
    /// CUF.
    Right,
    /// CUB.
    Left,
}

impl Direction {
    /// The final byte of the CSI sequence for this direction.
    #[inline]
    #[must_use]
    pub const fn final_byte(self) -> char {
        match self {
            Self::Up => 'A',
            Self::Down => 'B',
            Self::Right => 'C',
            Self::Left => 'D',
        }
    }
}

/// A runtime-parameterized escape sequence.
///
/// `Display` renders the exact bytes, so `seq.to_string()` gives an owned
/// copy when the shared scratch is inconvenient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sequence {
    /// `ESC[{38|48};2;R;G;Bm`
    Rgb { layer: Layer, r: u8, g: u8, b: u8 },
    /// `ESC[{row};{col}H`
    Goto { col: usize, row: usize },
    /// `ESC[{amount}{A|B|C|D}`
    Move { direction: Direction, amount: usize },
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Rgb { layer, r, g, b } => {
                write!(f, "\x1b[{};2;{r};{g};{b}m", layer.code())
            }
            Self::Goto { col, row } => write!(f, "\x1b[{row};{col}H"),
            Self::Move { direction, amount } => {
                write!(f, "\x1b[{amount}{}", direction.final_byte())
            }
        }
    }
}

// ─── Generated: scratch region ───────────────────────────────────────────────

/// Decimal digits in the widest `usize`.
const USIZE_DIGITS: usize = usize::MAX.ilog10() as usize + 1;

/// Fixed text allowance for the RGB template, the longest generated form.
const RGB_TEMPLATE_LEN: usize = 20;

/// Bytes reserved for the shared scratch: two widest decimal fields, the RGB
/// template, and a NUL terminator.
pub const SCRATCH_CAPACITY: usize = 2 * USIZE_DIGITS + RGB_TEMPLATE_LEN + 1;

/// The single region every generated sequence is formatted into.
///
/// Each call overwrites the previous result and returns a view of the new
/// one. Holding on to a result across the next call is a borrow error:
///
/// ```compile_fail
/// let mut scratch = conkit::SequenceScratch::new()?;
/// let red = scratch.fg_rgb(255, 0, 0);
/// let home = scratch.cursor_goto(1, 1);
/// println!("{red}{home}");
/// # Ok::<(), conkit::Error>(())
/// ```
///
/// Consume each result before generating the next:
///
/// ```
/// let mut scratch = conkit::SequenceScratch::new()?;
/// let mut line = String::new();
/// line.push_str(scratch.fg_rgb(255, 0, 0));
/// line.push_str(scratch.cursor_goto(1, 1));
/// assert_eq!(line, "\x1b[38;2;255;0;0m\x1b[1;1H");
/// # Ok::<(), conkit::Error>(())
/// ```
#[derive(Debug)]
pub struct SequenceScratch {
    region: Box<[u8]>,
    len: usize,
}

impl SequenceScratch {
    /// Allocate the scratch region.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationExhausted`] if the region cannot be allocated.
    pub fn new() -> Result<Self> {
        let mut region = Vec::new();
        region
            .try_reserve_exact(SCRATCH_CAPACITY)
            .map_err(|_| Error::AllocationExhausted {
                requested: SCRATCH_CAPACITY,
            })?;
        region.resize(SCRATCH_CAPACITY, 0);

        Ok(Self {
            region: region.into_boxed_slice(),
            len: 0,
        })
    }

    /// Format `seq` into the region and return a view of it.
    pub fn generate(&mut self, seq: Sequence) -> &str {
        let mut w = RegionWriter {
            region: &mut self.region[..SCRATCH_CAPACITY - 1],
            len: 0,
        };
        // Cannot overflow: SCRATCH_CAPACITY covers the widest sequence.
        write!(w, "{seq}").ok();
        let len = w.len;

        self.region[len] = 0;
        self.len = len;
        self.last()
    }

    /// The most recently generated sequence (empty before the first call).
    #[must_use]
    pub fn last(&self) -> &str {
        std::str::from_utf8(&self.region[..self.len]).unwrap_or_default()
    }

    /// Region size in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Truecolor sequence for either layer.
    pub fn rgb(&mut self, layer: Layer, r: u8, g: u8, b: u8) -> &str {
        self.generate(Sequence::Rgb { layer, r, g, b })
    }

    /// Truecolor foreground.
    pub fn fg_rgb(&mut self, r: u8, g: u8, b: u8) -> &str {
        self.rgb(Layer::Foreground, r, g, b)
    }

    /// Truecolor background.
    pub fn bg_rgb(&mut self, r: u8, g: u8, b: u8) -> &str {
        self.rgb(Layer::Background, r, g, b)
    }

    /// Absolute cursor position (1-based column and row).
    pub fn cursor_goto(&mut self, col: usize, row: usize) -> &str {
        self.generate(Sequence::Goto { col, row })
    }

    /// Relative cursor move.
    pub fn cursor_move(&mut self, direction: Direction, amount: usize) -> &str {
        self.generate(Sequence::Move { direction, amount })
    }

    /// Move up `amount` lines.
    pub fn cursor_up(&mut self, amount: usize) -> &str {
        self.cursor_move(Direction::Up, amount)
    }

    /// Move down `amount` lines.
    pub fn cursor_down(&mut self, amount: usize) -> &str {
        self.cursor_move(Direction::Down, amount)
    }

    /// Move right `amount` columns.
    pub fn cursor_right(&mut self, amount: usize) -> &str {
        self.cursor_move(Direction::Right, amount)
    }

    /// Move left `amount` columns.
    pub fn cursor_left(&mut self, amount: usize) -> &str {
        self.cursor_move(Direction::Left, amount)
    }
}

/// `fmt::Write` over a fixed byte region. Output past the end is dropped.
struct RegionWriter<'a> {
    region: &'a mut [u8],
    len: usize,
}

impl fmt::Write for RegionWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.region.len() - self.len;
        let n = s.len().min(room);
        self.region[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        if n == s.len() { Ok(()) } else { Err(fmt::Error) }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
