//! `PixelSensor`: response spectra, white balance, sensor saturation clamp. The Bradford
//! matrices are the standard published chromatic-adaptation transform, reused verbatim rather
//! than re-derived.

use crate::core::cie::Xyz;
use crate::core::mat3::Matrix3;
use crate::core::pbrt::{Float, SENSOR_SATURATION};
use crate::core::rgb::{Rgb, RGBColorSpace};
use crate::core::spectrum::{Spectrum, SpectrumSample, WavelengthSample};

lazy_static::lazy_static! {
    pub static ref LMS_FROM_XYZ: Matrix3 = Matrix3::from_rows([
        [0.8951, 0.2664, -0.1614],
        [-0.7502, 1.7135, 0.0367],
        [0.0389, -0.0685, 1.0296],
    ]);
    pub static ref XYZ_FROM_LMS: Matrix3 = Matrix3::from_rows([
        [0.986993, -0.147054, 0.159963],
        [0.432305, 0.51836, 0.0492912],
        [-0.00852866, 0.0400428, 0.968487],
    ]);
}

/// Computes a von Kries chromatic-adaptation matrix (in LMS space) mapping the source
/// whitepoint chromaticity onto the target whitepoint.
pub fn white_balance(source_white: (Float, Float), target_white: (Float, Float)) -> Matrix3 {
    let source_xyz = Xyz::from_xy_y(source_white.0, source_white.1, 1.0);
    let target_xyz = Xyz::from_xy_y(target_white.0, target_white.1, 1.0);
    let source_lms = LMS_FROM_XYZ.mul_vec([source_xyz.x, source_xyz.y, source_xyz.z]);
    let target_lms = LMS_FROM_XYZ.mul_vec([target_xyz.x, target_xyz.y, target_xyz.z]);
    let ratio = Matrix3::diagonal([
        target_lms[0] / source_lms[0],
        target_lms[1] / source_lms[1],
        target_lms[2] / source_lms[2],
    ]);
    LMS_FROM_XYZ.mul(&ratio).mul(&XYZ_FROM_LMS)
}

pub struct PixelSensor {
    r: Spectrum,
    g: Spectrum,
    b: Spectrum,
    imaging_ratio: Float,
    xyz_from_sensor_rgb: Matrix3,
}

impl PixelSensor {
    pub fn with_response(
        r: Spectrum,
        g: Spectrum,
        b: Spectrum,
        cs: &RGBColorSpace,
        illuminant: &Spectrum,
        imaging_ratio: Float,
    ) -> Self {
        let source_white = Xyz::from_spectrum(illuminant).xy();
        let xyz_from_sensor_rgb = white_balance(source_white, cs.whitepoint);
        PixelSensor {
            r,
            g,
            b,
            imaging_ratio,
            xyz_from_sensor_rgb,
        }
    }

    /// A sensor whose response is the CIE XYZ matching curves themselves, i.e. an idealized
    /// sensor that measures XYZ directly.
    pub fn cie_xyz(imaging_ratio: Float) -> Self {
        let cs = RGBColorSpace::srgb();
        let illuminant = crate::core::cie::ILLUM_D65.clone();
        PixelSensor::with_response(
            crate::core::cie::CIE_X.clone(),
            crate::core::cie::CIE_Y.clone(),
            crate::core::cie::CIE_Z.clone(),
            &cs,
            &illuminant,
            imaging_ratio,
        )
    }

    /// Converts one spectral radiance sample to sensor RGB, applying the imaging ratio and
    /// clamping to the sensor's saturation limit.
    pub fn to_sensor_rgb(&self, sample: SpectrumSample, wavelengths: &WavelengthSample) -> Rgb {
        let l = sample / SpectrumSample::from_wavelengths_pdf(wavelengths);
        let r_bar = self.r.sample(wavelengths);
        let g_bar = self.g.sample(wavelengths);
        let b_bar = self.b.sample(wavelengths);
        let mut rgb = Rgb::new(
            (r_bar * l).average() * self.imaging_ratio,
            (g_bar * l).average() * self.imaging_ratio,
            (b_bar * l).average() * self.imaging_ratio,
        );
        let m = rgb.max_component();
        if m > SENSOR_SATURATION {
            rgb = rgb.scale(SENSOR_SATURATION / m);
        }
        rgb
    }

    pub fn white_balance_matrix(&self) -> &Matrix3 {
        &self.xyz_from_sensor_rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pbrt::N_SPECTRUM_SAMPLES;

    #[test]
    fn saturation_never_exceeds_clamp() {
        let sensor = PixelSensor::cie_xyz(1000.0);
        let lambda = [500.0, 550.0, 600.0, 650.0];
        let wavelengths = WavelengthSample {
            lambda,
            pdf: [1.0 / 470.0; N_SPECTRUM_SAMPLES],
        };
        let hot = SpectrumSample::constant(1e6, lambda);
        let rgb = sensor.to_sensor_rgb(hot, &wavelengths);
        assert!(rgb.r <= SENSOR_SATURATION + 1e-3);
        assert!(rgb.g <= SENSOR_SATURATION + 1e-3);
        assert!(rgb.b <= SENSOR_SATURATION + 1e-3);
    }
}
