//! CIE 1931 color matching curves, an approximate D65 illuminant, and the `XYZ` tristimulus
//! type. Rather than carry the usual 471-point tabulations of the CIE curves and the D65
//! spectral power distribution, this module uses the published closed-form analytic fit to the
//! CIE curves (Wyman, Sloan & Shirley, "Simple Analytic Approximations to the CIE XYZ Color
//! Matching Functions", JCGT 2013) and approximates D65 by a ~6504K blackbody; see DESIGN.md for
//! the tradeoff.

use lazy_static::lazy_static;

use crate::core::pbrt::{Float, CIE_Y_INTEGRAL, N_SPECTRUM_SAMPLES};
use crate::core::spectrum::{Spectrum, SpectrumSample, WavelengthSample};

fn gaussian_piece(x: Float, mu: Float, sigma1: Float, sigma2: Float) -> Float {
    let sigma = if x < mu { sigma1 } else { sigma2 };
    let t = (x - mu) / sigma;
    (-0.5 * t * t).exp()
}

fn cie_x_bar(lambda: Float) -> Float {
    1.056 * gaussian_piece(lambda, 599.8, 37.9, 31.0)
        + 0.362 * gaussian_piece(lambda, 442.0, 16.0, 26.7)
        - 0.065 * gaussian_piece(lambda, 501.1, 20.4, 26.2)
}

fn cie_y_bar(lambda: Float) -> Float {
    0.821 * gaussian_piece(lambda, 568.8, 46.9, 40.5)
        + 0.286 * gaussian_piece(lambda, 530.9, 16.3, 31.1)
}

fn cie_z_bar(lambda: Float) -> Float {
    1.217 * gaussian_piece(lambda, 437.0, 11.8, 36.0) + 0.681 * gaussian_piece(lambda, 459.0, 26.0, 13.8)
}

lazy_static! {
    pub static ref CIE_X: Spectrum = Spectrum::densely_sampled_from_fn(360, 830, |l| cie_x_bar(l as Float));
    pub static ref CIE_Y: Spectrum = Spectrum::densely_sampled_from_fn(360, 830, |l| cie_y_bar(l as Float));
    pub static ref CIE_Z: Spectrum = Spectrum::densely_sampled_from_fn(360, 830, |l| cie_z_bar(l as Float));
    /// ~6504K blackbody approximation of the D65 illuminant, scaled to a conventional Y=100 at
    /// 560nm-ish normalization is not required here since callers apply their own scale.
    pub static ref ILLUM_D65: Spectrum = Spectrum::blackbody(6504.0);
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Xyz {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Xyz {
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Xyz { x, y, z }
    }

    /// Monte Carlo estimate of XYZ from one hero-wavelength sample.
    pub fn from_sample(sample: &SpectrumSample, wavelengths: &WavelengthSample) -> Self {
        let pdf = wavelengths.pdf_as_sample();
        let x_bar = CIE_X.sample(wavelengths);
        let y_bar = CIE_Y.sample(wavelengths);
        let z_bar = CIE_Z.sample(wavelengths);
        let weighted = |m: SpectrumSample| -> Float {
            let mut acc = 0.0;
            for i in 0..N_SPECTRUM_SAMPLES {
                if pdf.values[i] != 0.0 {
                    acc += m.values[i] * sample.values[i] / pdf.values[i];
                }
            }
            acc / N_SPECTRUM_SAMPLES as Float
        };
        Xyz::new(
            weighted(x_bar) / CIE_Y_INTEGRAL,
            weighted(y_bar) / CIE_Y_INTEGRAL,
            weighted(z_bar) / CIE_Y_INTEGRAL,
        )
    }

    /// Deterministic integral over the full curve, used when optimizing sigmoid-polynomial
    /// coefficients against a continuous `Spectrum` rather than a stochastic sample.
    pub fn from_spectrum(s: &Spectrum) -> Self {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut z = 0.0;
        let mut lambda = 360;
        while lambda <= 830 {
            let v = s.eval(lambda as Float);
            x += v * cie_x_bar(lambda as Float);
            y += v * cie_y_bar(lambda as Float);
            z += v * cie_z_bar(lambda as Float);
            lambda += 1;
        }
        Xyz::new(x / CIE_Y_INTEGRAL, y / CIE_Y_INTEGRAL, z / CIE_Y_INTEGRAL)
    }

    pub fn xy(&self) -> (Float, Float) {
        let sum = self.x + self.y + self.z;
        if sum == 0.0 {
            (0.0, 0.0)
        } else {
            (self.x / sum, self.y / sum)
        }
    }

    pub fn from_xy_y(x: Float, y: Float, big_y: Float) -> Self {
        if y == 0.0 {
            return Xyz::new(0.0, 0.0, 0.0);
        }
        Xyz::new(x * big_y / y, big_y, (1.0 - x - y) * big_y / y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_curves_are_nonnegative_and_bounded() {
        let mut l = 360;
        while l <= 830 {
            let x = cie_x_bar(l as Float);
            let y = cie_y_bar(l as Float);
            let z = cie_z_bar(l as Float);
            assert!(x >= -0.1 && x <= 2.5);
            assert!(y >= 0.0 && y <= 1.1);
            assert!(z >= 0.0 && z <= 2.5);
            l += 5;
        }
    }

    #[test]
    fn xy_round_trips_through_xyy() {
        let xyz = Xyz::new(0.3, 0.4, 0.2);
        let (x, y) = xyz.xy();
        let back = Xyz::from_xy_y(x, y, xyz.y);
        assert!((back.x - xyz.x).abs() < 1e-4);
        assert!((back.z - xyz.z).abs() < 1e-4);
    }
}
