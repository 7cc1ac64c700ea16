//! A small PCG32 generator backing `Sampler::Independent`. It is a two-`u64`-word,
//! dependency-free, easily-seedable generator well suited to per-pixel reseeding, so this is
//! hand-rolled rather than pulling in the `rand` crate for it.

use crate::core::pbrt::{Float, ONE_MINUS_EPSILON};

const PCG32_DEFAULT_STATE: u64 = 0x853c_49e6_748f_ea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e_39cb_94b9_5bdb;
const PCG32_MULT: u64 = 0x5851_f42d_4c95_7f2d;

#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
    inc: u64,
}

impl Default for Rng {
    fn default() -> Self {
        Rng {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
}

impl Rng {
    pub fn new(seq_index: u64, offset: u64) -> Self {
        let mut rng = Rng { state: 0, inc: 0 };
        rng.set_sequence(seq_index, offset);
        rng
    }

    pub fn set_sequence(&mut self, seq_index: u64, offset: u64) {
        self.state = 0;
        self.inc = (seq_index << 1) | 1;
        self.next_u32();
        self.state = self.state.wrapping_add(offset);
        self.next_u32();
    }

    pub fn next_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state
            .wrapping_mul(PCG32_MULT)
            .wrapping_add(self.inc);
        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        (xor_shifted >> rot) | (xor_shifted << ((!rot).wrapping_add(1) & 31))
    }

    pub fn uniform_float(&mut self) -> Float {
        (self.next_u32() as Float * 2.328_306_4e-10).min(ONE_MINUS_EPSILON)
    }
}

/// Mixes a (pixel index, sample index) pair into a 64-bit seed for `Rng::new`, matching the
/// Independent sampler's `hash(pixel_index, sample_index)` requirement.
pub fn hash_pixel_sample(pixel_index: u64, sample_index: u64) -> u64 {
    let mut h = pixel_index
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(sample_index.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    h ^= h >> 30;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_float_in_unit_interval() {
        let mut rng = Rng::new(1, 2);
        for _ in 0..10_000 {
            let u = rng.uniform_float();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::new(7, 11);
        let mut b = Rng::new(7, 11);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }
}
