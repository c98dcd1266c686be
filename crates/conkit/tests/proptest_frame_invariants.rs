//! Property-based invariant tests for the frame buffer and sequences.
//!
//! 1. Length equals the sum of appended lengths, and stays below capacity
//! 2. Capacity never decreases across appends, flushes, and clears
//! 3. Capacity only ever moves in whole growth steps
//! 4. A flush writes home + exactly the appended bytes, in order
//! 5. A flush right after a flush writes only the home sequence
//! 6. Generated sequences match their documented byte format

use conkit::driver::scripted::ScriptedDriver;
use conkit::{Console, ConsoleConfig, Direction, FrameBuffer, Layer, Sequence, SequenceScratch};
use proptest::prelude::*;

const HOME: &[u8] = b"\x1b[H";

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Append(Vec<u8>),
    Flush,
    Clear,
}

fn arb_chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 0..40)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::collection::vec(any::<u8>(), 0..500).prop_map(Op::Append),
        1 => Just(Op::Flush),
        1 => Just(Op::Clear),
    ]
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Up),
        Just(Direction::Down),
        Just(Direction::Right),
        Just(Direction::Left),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Length bookkeeping
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn length_is_sum_of_appends(
        initial in 1usize..256,
        step in 1usize..256,
        chunks in arb_chunks(),
    ) {
        let mut frame = FrameBuffer::with_capacity(initial, step).unwrap();
        let mut total = 0;
        for chunk in &chunks {
            frame.append(chunk).unwrap();
            total += chunk.len();
            prop_assert_eq!(frame.len(), total);
            prop_assert!(frame.capacity() > frame.len());
        }
        let expected = chunks.concat();
        prop_assert_eq!(frame.as_bytes(), expected.as_slice());
        prop_assert_eq!(frame.as_bytes_with_nul().last(), Some(&0));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Capacity monotonicity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn capacity_never_decreases(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut frame = FrameBuffer::with_capacity(100, 100).unwrap();
        let mut last = frame.capacity();
        for op in ops {
            match op {
                Op::Append(bytes) => frame.append(&bytes).unwrap(),
                Op::Flush => frame.flush_to(&mut Vec::new()).unwrap(),
                Op::Clear => frame.clear(),
            }
            prop_assert!(frame.capacity() >= last);
            prop_assert!(frame.capacity() > frame.len());
            last = frame.capacity();
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Fixed-step growth
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn growth_is_whole_steps(
        initial in 1usize..128,
        step in 1usize..128,
        chunks in arb_chunks(),
    ) {
        let mut frame = FrameBuffer::with_capacity(initial, step).unwrap();
        for chunk in &chunks {
            let before = frame.capacity();
            frame.append(chunk).unwrap();
            let grown = frame.capacity() - before;
            prop_assert_eq!(grown % step, 0);
            // Never more than one step beyond what was needed.
            if grown > 0 {
                prop_assert!(frame.capacity() - (frame.len() + 1) < step);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-5. Flush output
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn flush_writes_home_then_content(chunks in arb_chunks()) {
        let mut console = Console::new(
            ScriptedDriver::new(80, 24),
            Vec::<u8>::new(),
            ConsoleConfig::default(),
        );
        console.start().unwrap();
        for chunk in &chunks {
            console.append(chunk).unwrap();
        }
        console.flush().unwrap();

        let mut expected = HOME.to_vec();
        expected.extend(chunks.concat());
        prop_assert_eq!(console.sink().as_slice(), expected.as_slice());
        prop_assert!(console.frame().unwrap().is_empty());
    }

    #[test]
    fn second_flush_is_home_only(chunks in arb_chunks()) {
        let mut frame = FrameBuffer::with_capacity(100, 100).unwrap();
        for chunk in &chunks {
            frame.append(chunk).unwrap();
        }
        frame.flush_to(&mut Vec::new()).unwrap();

        let mut second = Vec::new();
        frame.flush_to(&mut second).unwrap();
        prop_assert_eq!(second.as_slice(), HOME);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Sequence formats
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn goto_format(col in any::<usize>(), row in any::<usize>()) {
        let mut scratch = SequenceScratch::new().unwrap();
        let expected = format!("\x1b[{row};{col}H");
        prop_assert_eq!(scratch.cursor_goto(col, row), expected.as_str());
    }

    #[test]
    fn rgb_format(r in any::<u8>(), g in any::<u8>(), b in any::<u8>(), fg in any::<bool>()) {
        let mut scratch = SequenceScratch::new().unwrap();
        let (layer, code) = if fg { (Layer::Foreground, 38) } else { (Layer::Background, 48) };
        let expected = format!("\x1b[{code};2;{r};{g};{b}m");
        prop_assert_eq!(scratch.rgb(layer, r, g, b), expected.as_str());
    }

    #[test]
    fn move_format(direction in arb_direction(), amount in any::<usize>()) {
        let mut scratch = SequenceScratch::new().unwrap();
        let expected = format!("\x1b[{amount}{}", direction.final_byte());
        let seq = Sequence::Move { direction, amount };
        prop_assert_eq!(scratch.generate(seq), expected.as_str());
        prop_assert_eq!(seq.to_string(), expected);
    }
}
