// SPDX-License-Identifier: MIT
//
// conkit-demo — a tiny host application for the conkit console toolkit.
//
// A colored block bounces around the terminal. `h/j/k/l` nudge it, space
// pauses, `q` quits. Every frame is queued into the console's frame buffer
// and written in one flush; the loop polls for keys and resizes between
// frames and never blocks on input.
//
//   ┌──────────────────────────────┐
//   │ status line                  │  ← row 1
//   ├──────────────────────────────┤
//   │                              │
//   │          ██                  │  ← rows 2..=height
//   │                              │
//   └──────────────────────────────┘

use std::io::Write;
use std::process;

use conkit::sequence::{CLEAR_CONSOLE, HIDE_CURSOR, RESET_FORMATTING, SHOW_CURSOR};
use conkit::{Console, ConsoleConfig, ConsoleSize, Direction, Driver, Layer, Sequence};

/// Delay between frames (~30 fps).
const FRAME_MS: u64 = 33;

/// First row the block may occupy; row 1 is the status line.
const TOP_ROW: usize = 2;

struct Demo {
    x: usize,
    y: usize,
    dx: isize,
    dy: isize,
    /// Where the block was drawn last frame, so it can be erased.
    drawn_at: Option<(usize, usize)>,
    paused: bool,
    size: ConsoleSize,
    frames: u64,
}

impl Demo {
    const fn new() -> Self {
        Self {
            x: 1,
            y: TOP_ROW,
            dx: 1,
            dy: 1,
            drawn_at: None,
            paused: false,
            size: ConsoleSize {
                width: 0,
                height: 0,
                changed: false,
            },
            frames: 0,
        }
    }

    fn bounds(&self) -> (usize, usize) {
        (self.size.width.max(1), self.size.height.max(TOP_ROW))
    }

    fn resize(&mut self, size: ConsoleSize) {
        self.size = size;
        let (w, h) = self.bounds();
        self.x = self.x.clamp(1, w);
        self.y = self.y.clamp(TOP_ROW, h);
        // The screen was cleared; nothing to erase.
        self.drawn_at = None;
    }

    fn step(&mut self) {
        let (w, h) = self.bounds();
        if self.x <= 1 {
            self.dx = 1;
        } else if self.x >= w {
            self.dx = -1;
        }
        if self.y <= TOP_ROW {
            self.dy = 1;
        } else if self.y >= h {
            self.dy = -1;
        }
        self.nudge(self.dx, self.dy);
    }

    fn nudge(&mut self, dx: isize, dy: isize) {
        let (w, h) = self.bounds();
        self.x = self.x.saturating_add_signed(dx).clamp(1, w);
        self.y = self.y.saturating_add_signed(dy).clamp(TOP_ROW, h);
    }

    /// Queue one frame: erase the old block, draw the new one, redraw the
    /// status line.
    fn paint<D: Driver, W: Write>(&mut self, console: &mut Console<D, W>) -> conkit::Result<()> {
        if let Some((x, y)) = self.drawn_at {
            console.append_sequence(Sequence::Goto { col: x, row: y })?;
            console.append_str(RESET_FORMATTING)?;
            console.append_str(" ")?;
        }

        let shade = u8::try_from(self.frames % 256).unwrap_or(u8::MAX);
        console.append_sequence(Sequence::Goto {
            col: self.x,
            row: self.y,
        })?;
        console.append_sequence(Sequence::Rgb {
            layer: Layer::Background,
            r: shade,
            g: 255 - shade,
            b: 160,
        })?;
        console.append_str(" ")?;
        console.append_str(RESET_FORMATTING)?;
        self.drawn_at = Some((self.x, self.y));

        console.append_str(conkit::cursor_goto!(1, 1))?;
        console.append_str(conkit::fg_rgb!(140, 200, 255))?;
        console.append_str(&format!(
            "conkit {}x{}  frame {:<8} [hjkl] move  [space] {}  [q] quit",
            self.size.width,
            self.size.height,
            self.frames,
            if self.paused { "resume" } else { "pause " },
        ))?;
        console.append_str(RESET_FORMATTING)?;

        self.frames += 1;
        Ok(())
    }
}

/// What a keypress asks the loop to do.
enum Action {
    Continue,
    Quit,
}

fn handle_key(demo: &mut Demo, key: u8) -> Action {
    let step = |d: Direction| match d {
        Direction::Left => (-1, 0),
        Direction::Right => (1, 0),
        Direction::Up => (0, -1),
        Direction::Down => (0, 1),
    };
    let direction = match key {
        b'q' | b'Q' => return Action::Quit,
        b' ' => {
            demo.paused = !demo.paused;
            return Action::Continue;
        }
        b'h' => Direction::Left,
        b'l' => Direction::Right,
        b'k' => Direction::Up,
        b'j' => Direction::Down,
        _ => return Action::Continue,
    };
    let (dx, dy) = step(direction);
    demo.nudge(dx, dy);
    Action::Continue
}

/// Frame loop. Returns when `q` is pressed or anything fails.
fn animate<D: Driver, W: Write>(console: &mut Console<D, W>) -> conkit::Result<()> {
    console.append_str(HIDE_CURSOR)?;

    let mut demo = Demo::new();
    loop {
        let size = console.query_size()?;
        if size.changed {
            console.append_str(CLEAR_CONSOLE)?;
            demo.resize(size);
        }

        while console.key_available()? {
            let key = console.read_char()?;
            if matches!(handle_key(&mut demo, key), Action::Quit) {
                return Ok(());
            }
        }

        if !demo.paused {
            demo.step();
        }
        demo.paint(console)?;
        console.flush()?;
        console.delay(FRAME_MS)?;
    }
}

/// Reset colors, clear, and show the cursor again.
fn restore_screen<D: Driver, W: Write>(console: &mut Console<D, W>) -> conkit::Result<()> {
    console.append_str(RESET_FORMATTING)?;
    console.append_str(CLEAR_CONSOLE)?;
    console.append_str(SHOW_CURSOR)?;
    console.flush()
}

/// Run the frame loop on a started console, then put the screen back and
/// stop it. The cursor comes back whether the loop quit or failed.
fn play<D: Driver, W: Write>(console: &mut Console<D, W>) -> conkit::Result<()> {
    let animated = animate(console);
    let restored = restore_screen(console);
    let stopped = console.stop();
    animated.and(restored).and(stopped)
}

fn run() -> conkit::Result<()> {
    let config = ConsoleConfig::default()
        .with_initial_capacity(16_384)
        .with_growth_step(4096);
    let mut console = Console::open(config)?;
    play(&mut console)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("conkit-demo: {err}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conkit::driver::scripted::{Fault, ScriptedDriver};

    fn console(driver: ScriptedDriver) -> Console<ScriptedDriver, Vec<u8>> {
        let mut console = Console::new(driver, Vec::new(), ConsoleConfig::default());
        console.start().unwrap();
        console
    }

    #[test]
    fn quit_shows_cursor_and_stops() {
        let mut c = console(ScriptedDriver::new(80, 24).with_input(b"jq"));
        play(&mut c).unwrap();

        assert!(!c.is_active());
        assert!(c.sink().ends_with(SHOW_CURSOR.as_bytes()));
        assert_eq!(c.driver().restore_count(), 1);
        assert_eq!(c.driver().pending_input(), 0);
    }

    #[test]
    fn failed_loop_still_shows_cursor() {
        let mut driver = ScriptedDriver::new(80, 24);
        driver.inject(Fault::SizeQuery);
        let mut c = console(driver);

        let err = play(&mut c).unwrap_err();
        assert!(err.is_os_failure());
        assert!(!c.is_active());

        let out = c.sink().as_slice();
        let hidden = out
            .windows(HIDE_CURSOR.len())
            .position(|w| w == HIDE_CURSOR.as_bytes());
        let shown = out
            .windows(SHOW_CURSOR.len())
            .rposition(|w| w == SHOW_CURSOR.as_bytes());
        assert!(hidden.is_some());
        assert!(hidden < shown);
        assert!(out.ends_with(SHOW_CURSOR.as_bytes()));
    }

    #[test]
    fn paint_queues_block_and_status_line() {
        let mut c = console(ScriptedDriver::new(80, 24));
        let mut demo = Demo::new();
        demo.resize(c.query_size().unwrap());
        demo.paint(&mut c).unwrap();

        let queued = String::from_utf8_lossy(c.frame().unwrap().as_bytes()).into_owned();
        assert!(queued.starts_with("\x1b[2;1H\x1b[48;2;0;255;160m "));
        assert!(queued.contains("conkit 80x24  frame 0 "));
        assert_eq!(demo.drawn_at, Some((1, TOP_ROW)));
        c.stop().unwrap();
    }

    #[test]
    fn space_toggles_pause() {
        let mut demo = Demo::new();
        assert!(matches!(handle_key(&mut demo, b' '), Action::Continue));
        assert!(demo.paused);
        assert!(matches!(handle_key(&mut demo, b'q'), Action::Quit));
    }
}
