//! Injectable randomness for skill checks, drift and character generation.
//!
//! Every random draw in the engine goes through [`Dice`], so a seeded
//! generator replays a campaign exactly and tests can script outcomes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Source of uniform integers.
pub trait Dice {
    /// Uniform integer in `lo..=hi`. Returns `lo` when the range is empty.
    fn roll(&mut self, lo: i32, hi: i32) -> i32;

    /// A twenty-sided die.
    fn d20(&mut self) -> i32 {
        self.roll(1, 20)
    }

    /// Uniform index into a collection of `len` items.
    fn pick(&mut self, len: usize) -> usize {
        let hi = i32::try_from(len.saturating_sub(1)).unwrap_or(i32::MAX);
        usize::try_from(self.roll(0, hi)).unwrap_or(0)
    }

    /// Fair coin flip.
    fn coin(&mut self) -> bool {
        self.roll(0, 1) == 1
    }
}

/// Adapter turning any [`rand::Rng`] into [`Dice`].
#[derive(Clone, Debug)]
pub struct RngDice<R>(R);

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }

    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R: Rng> Dice for RngDice<R> {
    fn roll(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.0.gen_range(lo..=hi)
    }
}

/// Deterministic dice for replays.
pub type SeededDice = RngDice<ChaCha8Rng>;

impl RngDice<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

/// Replays a fixed sequence of values, each clamped into the requested range.
///
/// Once the script is exhausted every roll returns the low end of its range.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    script: VecDeque<i32>,
}

impl ScriptedDice {
    pub fn new<I: IntoIterator<Item = i32>>(values: I) -> Self {
        Self {
            script: values.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, lo: i32, hi: i32) -> i32 {
        match self.script.pop_front() {
            Some(v) if hi > lo => v.clamp(lo, hi),
            _ => lo,
        }
    }
}
