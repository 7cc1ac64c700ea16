//! Spatially-varying reflectance sources a `Material` queries at a surface point. A closed
//! tagged enum over a small, fixed set of texture kinds, matching the dispatch style used by
//! `core::spectrum::Spectrum` and `core::reflection::BxDF` — a trait object would add
//! indirection without adding flexibility here.

use crate::core::geometry::Point2f;
use crate::core::rgb::{Rgb, SRGB};
use crate::core::spectrum::{Spectrum, SpectrumSample, WavelengthSample};

pub enum Texture {
    SolidColor(Spectrum),
    Checkerboard { white: Spectrum, black: Spectrum },
    Image(ImageTexture),
}

impl Texture {
    pub fn solid_rgb(rgb: Rgb) -> Self {
        Texture::SolidColor(SRGB.to_rgb_spectrum(rgb))
    }

    /// Checkerboard: `u*10 + v*10` parity selects the white or black spectrum.
    pub fn eval(&self, uv: Point2f, wavelengths: &WavelengthSample) -> SpectrumSample {
        match self {
            Texture::SolidColor(spectrum) => spectrum.sample(wavelengths),
            Texture::Checkerboard { white, black } => {
                let parity = (uv.x * 10.0).floor() as i64 + (uv.y * 10.0).floor() as i64;
                if parity.rem_euclid(2) == 0 {
                    white.sample(wavelengths)
                } else {
                    black.sample(wavelengths)
                }
            }
            Texture::Image(image) => image.eval(uv).sample(wavelengths),
        }
    }
}

/// Nearest-neighbor RGB texture decoded from a file via the `image` crate into a float buffer.
pub struct ImageTexture {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl ImageTexture {
    pub fn load(path: &str) -> Result<Self, crate::core::error::RenderError> {
        let img = image::open(path)
            .map_err(|e| crate::core::error::RenderError::Configuration(format!("{}: {}", path, e)))?
            .into_rgb32f();
        let (width, height) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| Rgb::new(p[0], p[1], p[2]))
            .collect();
        Ok(ImageTexture { width, height, pixels })
    }

    fn eval(&self, uv: Point2f) -> Spectrum {
        let x = (uv.x * self.width as f32) as i64;
        let y = ((1.0 - uv.y) * self.height as f32) as i64;
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        SRGB.to_rgb_spectrum(self.pixels[y * self.width as usize + x])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pbrt::Float;

    fn lam() -> WavelengthSample {
        WavelengthSample::uniform(0.4)
    }

    #[test]
    fn checkerboard_alternates_across_unit_squares() {
        let tex = Texture::Checkerboard {
            white: Spectrum::constant(1.0),
            black: Spectrum::constant(0.0),
        };
        let ws = lam();
        let a = tex.eval(Point2f::new(0.05, 0.05), &ws).average();
        let b = tex.eval(Point2f::new(0.15, 0.05), &ws).average();
        assert!((a - b).abs() > 0.5);
    }

    #[test]
    fn solid_color_is_uv_invariant() {
        let tex = Texture::solid_rgb(Rgb::new(0.5, 0.2, 0.2));
        let ws = lam();
        let a = tex.eval(Point2f::new(0.0, 0.0), &ws);
        let b = tex.eval(Point2f::new(0.9, 0.9), &ws);
        for i in 0..4 {
            assert!((a.values[i] - b.values[i]).abs() < 1e-6);
        }
        let _: Float = a.average();
    }
}
