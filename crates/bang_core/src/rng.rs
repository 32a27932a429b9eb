//! Seeded deterministic random numbers.
//!
//! The board core never touches system randomness: spawn-spot shuffles
//! and procedural boards take an explicit seed so every client agrees.

/// Simple deterministic linear congruential generator.
#[derive(Debug, Clone)]
pub struct BoardRng {
    state: u64,
}

impl BoardRng {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        // The low bits of an LCG cycle quickly; hand out the high half.
        self.state >> 16
    }

    /// Uniform value in `min..max`; returns `min` for an empty range.
    pub fn next_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let range = u64::from(min.abs_diff(max));
        min + (self.next_u64() % range) as i32
    }

    /// Shuffle a slice in place (Fisher-Yates).
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_u64() % (i as u64 + 1)) as usize;
            items.swap(i, j);
        }
    }
}
