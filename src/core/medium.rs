//! `HomogeneousMedium` scaffolding. Volumetric participating media are an explicit Non-goal beyond this
//! interface sketch; nothing in `scene` or `integrators` references this type.

use crate::core::pbrt::Float;
use crate::core::spectrum::Spectrum;

pub struct HomogeneousMedium {
    pub sigma_a: Spectrum,
    pub sigma_s: Spectrum,
    pub g: Float,
}

impl HomogeneousMedium {
    pub fn new(sigma_a: Spectrum, sigma_s: Spectrum, g: Float) -> Self {
        HomogeneousMedium { sigma_a, sigma_s, g }
    }

    /// Beer-Lambert transmittance over a segment of length `dist`, evaluated at `lambda`.
    pub fn tr(&self, dist: Float, lambda: Float) -> Float {
        let sigma_t = self.sigma_a.eval(lambda) + self.sigma_s.eval(lambda);
        (-sigma_t * dist).exp()
    }
}
