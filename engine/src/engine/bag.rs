// engine/src/engine/bag.rs
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use rand::prelude::*;

use crate::engine::pieces::Kind;

/// Seeded 7-bag piece generator.
///
/// Every block of seven consecutive draws starting at a bag boundary contains
/// each kind exactly once. Given the same seed the infinite stream is fixed;
/// `peek` materializes future bags without consuming them, so lookahead never
/// perturbs the stream.
#[derive(Clone)]
pub struct SevenBag {
    rng: StdRng,
    queue: VecDeque<Kind>,
}

impl SevenBag {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            queue: VecDeque::with_capacity(14),
        }
    }

    fn refill(&mut self) {
        let mut bag = *Kind::all();
        bag.shuffle(&mut self.rng);
        self.queue.extend(bag);
    }

    fn ensure(&mut self, n: usize) {
        while self.queue.len() < n {
            self.refill();
        }
    }

    pub fn next(&mut self) -> Kind {
        self.ensure(1);
        self.queue.pop_front().unwrap_or(Kind::I)
    }

    /// The next `n` kinds in draw order, without consuming them.
    pub fn peek(&mut self, n: usize) -> Vec<Kind> {
        self.ensure(n);
        self.queue.iter().take(n).copied().collect()
    }
}
