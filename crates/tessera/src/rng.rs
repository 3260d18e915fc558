use crate::components::{Rotation, Variant};

/// Seedable pseudo-random number generator (xorshift64).
/// Deterministic, so every random draw in the composer and puzzle can be
/// replayed from a seed.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        // Avoid zero state
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Generate next u64 using xorshift64.
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random number in [0, upper_bound). Returns 0 for an empty range.
    pub fn next_int(&mut self, upper_bound: u32) -> u32 {
        if upper_bound == 0 {
            return 0;
        }
        (self.next_u64() % upper_bound as u64) as u32
    }

    /// Uniform integer in the inclusive range [lo, hi].
    pub fn range_inclusive(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        lo + self.next_int((hi - lo + 1) as u32) as usize
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_int(items.len() as u32) as usize)
    }

    pub fn variant(&mut self) -> Variant {
        Variant::ALL[self.next_int(Variant::COUNT as u32) as usize]
    }

    pub fn rotation(&mut self) -> Rotation {
        Rotation::from_quarter_turns(self.next_int(4) as u8)
    }
}
