//! The `Sampler` capability: per-pixel-sample dimension streams, either uncorrelated
//! (`Independent`) or low-discrepancy (`Halton`). A closed tagged enum, matching the dispatch
//! style used elsewhere in the crate (`core::spectrum::Spectrum`, `BxDF`).

pub mod halton;
pub mod independent;

pub use halton::HaltonSampler;
pub use independent::IndependentSampler;

use crate::core::geometry::Point2f;
use crate::core::pbrt::Float;

#[derive(Debug, Clone)]
pub enum Sampler {
    Independent(IndependentSampler),
    Halton(HaltonSampler),
}

impl Sampler {
    pub fn independent(samples_per_pixel: u32) -> Self {
        Sampler::Independent(IndependentSampler::new(samples_per_pixel))
    }

    pub fn halton(samples_per_pixel: u32, full_resolution: (u32, u32), seed: u32) -> Self {
        Sampler::Halton(HaltonSampler::new(samples_per_pixel, full_resolution, seed))
    }

    pub fn samples_per_pixel(&self) -> u32 {
        match self {
            Sampler::Independent(s) => s.samples_per_pixel(),
            Sampler::Halton(s) => s.samples_per_pixel(),
        }
    }

    /// Reseeds every per-dimension stream for a fresh `(pixel, sample_index)` pair.
    pub fn start_pixel_sample(&mut self, pixel: (u32, u32), pixel_index: u64, sample_index: u64) {
        match self {
            Sampler::Independent(s) => s.start_pixel_sample(pixel_index, sample_index),
            Sampler::Halton(s) => s.start_pixel_sample(pixel, sample_index),
        }
    }

    pub fn get_1d(&mut self) -> Float {
        match self {
            Sampler::Independent(s) => s.get_1d(),
            Sampler::Halton(s) => s.get_1d(),
        }
    }

    pub fn get_2d(&mut self) -> Point2f {
        match self {
            Sampler::Independent(s) => s.get_2d(),
            Sampler::Halton(s) => s.get_2d(),
        }
    }

    /// Pixel jitter, drawn from dimensions dedicated to pixel addressing rather than the
    /// ordinary counter `get_1d`/`get_2d` advance.
    pub fn sample_pixel(&mut self) -> Point2f {
        match self {
            Sampler::Independent(s) => s.sample_pixel(),
            Sampler::Halton(s) => s.sample_pixel(),
        }
    }
}
