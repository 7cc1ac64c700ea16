//! The Independent sampler: every dimension is an uncorrelated PCG32 draw, reseeded per pixel
//! sample via `hash(pixel_index, sample_index)`.

use crate::core::geometry::Point2f;
use crate::core::pbrt::Float;
use crate::core::rng::{hash_pixel_sample, Rng};

#[derive(Debug, Clone)]
pub struct IndependentSampler {
    samples_per_pixel: u32,
    rng: Rng,
}

impl IndependentSampler {
    pub fn new(samples_per_pixel: u32) -> Self {
        IndependentSampler {
            samples_per_pixel,
            rng: Rng::default(),
        }
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    /// Reseeds the generator so every `(pixel, sample_index)` pair draws its own independent
    /// stream, regardless of call order or thread.
    pub fn start_pixel_sample(&mut self, pixel_index: u64, sample_index: u64) {
        let seed = hash_pixel_sample(pixel_index, sample_index);
        self.rng = Rng::new(seed, sample_index);
    }

    pub fn get_1d(&mut self) -> Float {
        self.rng.uniform_float()
    }

    pub fn get_2d(&mut self) -> Point2f {
        Point2f::new(self.rng.uniform_float(), self.rng.uniform_float())
    }

    /// No dedicated pixel-addressed dimensions here, every draw is an uncorrelated PCG32 pull,
    /// so pixel jitter is just an ordinary 2D draw.
    pub fn sample_pixel(&mut self) -> Point2f {
        self.get_2d()
    }
}
