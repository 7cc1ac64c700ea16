//! Wavelength samples, spectrum samples, and the `Spectrum` capability.

use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

use crate::core::pbrt::{Float, LAMBDA_MAX, LAMBDA_MIN, N_SPECTRUM_SAMPLES};
use crate::core::rgb::RGBSigmoidPolynomial;

/// N=4 hero wavelengths (nm) and their per-lane PDFs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WavelengthSample {
    pub lambda: [Float; N_SPECTRUM_SAMPLES],
    pub pdf: [Float; N_SPECTRUM_SAMPLES],
}

impl WavelengthSample {
    /// Stratified hero-wavelength sampling: the first wavelength is `(1-u)*lmin + u*lmax`; the
    /// rest are equal-stride rotations wrapping modulo the range. All four PDFs start uniform.
    pub fn uniform(u: Float) -> Self {
        let range = LAMBDA_MAX - LAMBDA_MIN;
        let mut lambda = [0.0; N_SPECTRUM_SAMPLES];
        lambda[0] = (1.0 - u) * LAMBDA_MIN + u * LAMBDA_MAX;
        let delta = range / N_SPECTRUM_SAMPLES as Float;
        for i in 1..N_SPECTRUM_SAMPLES {
            lambda[i] = lambda[i - 1] + delta;
            if lambda[i] > LAMBDA_MAX {
                lambda[i] = LAMBDA_MIN + (lambda[i] - LAMBDA_MAX);
            }
        }
        let uniform_pdf = 1.0 / range;
        WavelengthSample {
            lambda,
            pdf: [uniform_pdf; N_SPECTRUM_SAMPLES],
        }
    }

    pub fn is_secondary_terminated(&self) -> bool {
        self.pdf[1..].iter().all(|p| *p == 0.0)
    }

    /// Discards lanes 1..N after a wavelength-dependent event.
    /// Idempotent: calling it again on an already-terminated sample is a no-op.
    pub fn terminate_secondary(&mut self) {
        if self.is_secondary_terminated() {
            return;
        }
        for p in self.pdf.iter_mut().skip(1) {
            *p = 0.0;
        }
        self.pdf[0] /= N_SPECTRUM_SAMPLES as Float;
    }

    pub fn pdf_as_sample(&self) -> SpectrumSample {
        SpectrumSample {
            values: self.pdf,
            lambda: self.lambda,
        }
    }
}

/// N floats co-keyed to a `WavelengthSample`. Debug builds assert that two samples combined by
/// arithmetic share the same wavelengths.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpectrumSample {
    pub values: [Float; N_SPECTRUM_SAMPLES],
    pub lambda: [Float; N_SPECTRUM_SAMPLES],
}

impl SpectrumSample {
    pub fn constant(v: Float, lambda: [Float; N_SPECTRUM_SAMPLES]) -> Self {
        SpectrumSample {
            values: [v; N_SPECTRUM_SAMPLES],
            lambda,
        }
    }

    pub fn zero(lambda: [Float; N_SPECTRUM_SAMPLES]) -> Self {
        SpectrumSample::constant(0.0, lambda)
    }

    pub fn one(lambda: [Float; N_SPECTRUM_SAMPLES]) -> Self {
        SpectrumSample::constant(1.0, lambda)
    }

    pub fn from_wavelengths_pdf(wavelengths: &WavelengthSample) -> Self {
        wavelengths.pdf_as_sample()
    }

    pub fn average(&self) -> Float {
        self.values.iter().sum::<Float>() / N_SPECTRUM_SAMPLES as Float
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn max_component(&self) -> Float {
        self.values.iter().cloned().fold(Float::MIN, Float::max)
    }

    pub fn has_nan(&self) -> bool {
        self.values.iter().any(|v| v.is_nan())
    }

    fn assert_same_wavelengths(&self, other: &SpectrumSample) {
        debug_assert_eq!(
            self.lambda, other.lambda,
            "SpectrumSample arithmetic requires identical wavelengths"
        );
    }
}

impl Add for SpectrumSample {
    type Output = SpectrumSample;
    fn add(self, rhs: SpectrumSample) -> SpectrumSample {
        self.assert_same_wavelengths(&rhs);
        let mut values = self.values;
        for i in 0..N_SPECTRUM_SAMPLES {
            values[i] += rhs.values[i];
        }
        SpectrumSample { values, lambda: self.lambda }
    }
}

impl Sub for SpectrumSample {
    type Output = SpectrumSample;
    fn sub(self, rhs: SpectrumSample) -> SpectrumSample {
        self.assert_same_wavelengths(&rhs);
        let mut values = self.values;
        for i in 0..N_SPECTRUM_SAMPLES {
            values[i] -= rhs.values[i];
        }
        SpectrumSample { values, lambda: self.lambda }
    }
}

impl Mul for SpectrumSample {
    type Output = SpectrumSample;
    fn mul(self, rhs: SpectrumSample) -> SpectrumSample {
        self.assert_same_wavelengths(&rhs);
        let mut values = self.values;
        for i in 0..N_SPECTRUM_SAMPLES {
            values[i] *= rhs.values[i];
        }
        SpectrumSample { values, lambda: self.lambda }
    }
}

impl Div for SpectrumSample {
    type Output = SpectrumSample;
    fn div(self, rhs: SpectrumSample) -> SpectrumSample {
        self.assert_same_wavelengths(&rhs);
        let mut values = self.values;
        for i in 0..N_SPECTRUM_SAMPLES {
            values[i] = if rhs.values[i] == 0.0 { 0.0 } else { values[i] / rhs.values[i] };
        }
        SpectrumSample { values, lambda: self.lambda }
    }
}

impl Mul<Float> for SpectrumSample {
    type Output = SpectrumSample;
    fn mul(self, s: Float) -> SpectrumSample {
        let mut values = self.values;
        for v in values.iter_mut() {
            *v *= s;
        }
        SpectrumSample { values, lambda: self.lambda }
    }
}

impl Div<Float> for SpectrumSample {
    type Output = SpectrumSample;
    fn div(self, s: Float) -> SpectrumSample {
        let mut values = self.values;
        for v in values.iter_mut() {
            *v /= s;
        }
        SpectrumSample { values, lambda: self.lambda }
    }
}

impl Index<usize> for SpectrumSample {
    type Output = Float;
    fn index(&self, i: usize) -> &Float {
        &self.values[i]
    }
}

impl IndexMut<usize> for SpectrumSample {
    fn index_mut(&mut self, i: usize) -> &mut Float {
        &mut self.values[i]
    }
}

/// A function lambda -> value over [360,830]nm.
#[derive(Debug, Clone)]
pub enum Spectrum {
    Constant(Float),
    DenselySampled {
        /// one value per integer nm starting at `lambda_min`
        values: Vec<Float>,
        lambda_min: i32,
    },
    PiecewiseLinear {
        /// sorted (lambda, value) breakpoints
        points: Vec<(Float, Float)>,
    },
    Blackbody {
        temperature_kelvin: Float,
        normalization: Float,
    },
    RgbSigmoidPolynomial(RGBSigmoidPolynomial),
}

impl Spectrum {
    pub fn constant(v: Float) -> Self {
        Spectrum::Constant(v)
    }

    pub fn densely_sampled_from_fn<F: Fn(i32) -> Float>(
        lambda_min: i32,
        lambda_max: i32,
        f: F,
    ) -> Self {
        let values = (lambda_min..=lambda_max).map(f).collect();
        Spectrum::DenselySampled { values, lambda_min }
    }

    pub fn piecewise_linear(mut points: Vec<(Float, Float)>) -> Self {
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        Spectrum::PiecewiseLinear { points }
    }

    /// Planck's law, peak-normalized to 1.0 via Wien's displacement law.
    pub fn blackbody(temperature_kelvin: Float) -> Self {
        let lambda_max_nm = 2.897_772_1e-3 / temperature_kelvin * 1e9;
        let normalization = 1.0 / Self::blackbody_radiance(lambda_max_nm, temperature_kelvin);
        Spectrum::Blackbody {
            temperature_kelvin,
            normalization,
        }
    }

    fn blackbody_radiance(lambda_nm: Float, t: Float) -> Float {
        if t <= 0.0 {
            return 0.0;
        }
        const C: Float = 299_792_458.0;
        const H: Float = 6.626_070_15e-34;
        const KB: Float = 1.380_649e-23;
        let l = lambda_nm as f64 * 1e-9;
        let t = t as f64;
        let le = (2.0 * H as f64 * C as f64 * C as f64)
            / (l.powi(5) * ((H as f64 * C as f64 / (l * KB as f64 * t)).exp() - 1.0));
        le as Float
    }

    pub fn eval(&self, lambda: Float) -> Float {
        if !(LAMBDA_MIN..=LAMBDA_MAX).contains(&lambda) {
            return match self {
                Spectrum::Constant(_) | Spectrum::Blackbody { .. } => {
                    self.eval_unchecked(lambda)
                }
                _ => 0.0,
            };
        }
        self.eval_unchecked(lambda)
    }

    fn eval_unchecked(&self, lambda: Float) -> Float {
        match self {
            Spectrum::Constant(v) => *v,
            Spectrum::DenselySampled { values, lambda_min } => {
                let idx = lambda.round() as i32 - lambda_min;
                if idx < 0 || idx as usize >= values.len() {
                    0.0
                } else {
                    values[idx as usize]
                }
            }
            Spectrum::PiecewiseLinear { points } => {
                if points.is_empty() {
                    return 0.0;
                }
                if lambda <= points[0].0 || lambda >= points[points.len() - 1].0 {
                    return 0.0;
                }
                let pos = points.partition_point(|p| p.0 < lambda);
                let (l0, v0) = points[pos - 1];
                let (l1, v1) = points[pos];
                let t = (lambda - l0) / (l1 - l0);
                crate::core::pbrt::lerp(t, v0, v1)
            }
            Spectrum::Blackbody {
                temperature_kelvin,
                normalization,
            } => Self::blackbody_radiance(lambda, *temperature_kelvin) * normalization,
            Spectrum::RgbSigmoidPolynomial(poly) => poly.eval(lambda),
        }
    }

    pub fn sample(&self, wavelengths: &WavelengthSample) -> SpectrumSample {
        let mut values = [0.0; N_SPECTRUM_SAMPLES];
        for i in 0..N_SPECTRUM_SAMPLES {
            values[i] = self.eval(wavelengths.lambda[i]);
        }
        SpectrumSample {
            values,
            lambda: wavelengths.lambda,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_subtract_is_identity() {
        let lambda = [500.0, 520.0, 540.0, 560.0];
        let a = SpectrumSample { values: [0.2, 0.4, 0.6, 0.8], lambda };
        let b = SpectrumSample { values: [0.1, 0.1, 0.1, 0.1], lambda };
        let r = (a + b) - b;
        for i in 0..4 {
            assert!((r.values[i] - a.values[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn multiply_then_divide_is_identity_for_nonzero_lanes() {
        let lambda = [500.0, 520.0, 540.0, 560.0];
        let a = SpectrumSample { values: [0.2, 0.4, 0.6, 0.8], lambda };
        let b = SpectrumSample { values: [2.0, 3.0, 4.0, 5.0], lambda };
        let r = (a * b) / b;
        for i in 0..4 {
            assert!((r.values[i] - a.values[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn uniform_wavelength_sample_stays_in_range() {
        for i in 0..100 {
            let u = i as Float / 100.0;
            let ws = WavelengthSample::uniform(u);
            for l in ws.lambda {
                assert!((LAMBDA_MIN..=LAMBDA_MAX).contains(&l));
            }
            assert!(!ws.is_secondary_terminated());
        }
    }

    #[test]
    fn terminate_secondary_is_idempotent_and_preserves_unbiasedness_shape() {
        let mut ws = WavelengthSample::uniform(0.37);
        let original_pdf0 = ws.pdf[0];
        ws.terminate_secondary();
        assert!(ws.is_secondary_terminated());
        assert!((ws.pdf[0] - original_pdf0 / N_SPECTRUM_SAMPLES as Float).abs() < 1e-9);
        let pdf_after_first = ws.pdf;
        ws.terminate_secondary();
        assert_eq!(ws.pdf, pdf_after_first);
    }

    #[test]
    fn blackbody_peaks_near_one() {
        let bb = Spectrum::blackbody(6504.0);
        let lambda_max_nm = 2.897_772_1e-3 / 6504.0 * 1e9;
        let peak = bb.eval(lambda_max_nm);
        assert!((peak - 1.0).abs() < 1e-3);
    }
}
