//! `Film`, the per-pixel accumulator the integrator writes into, and `RenderResult`, the
//! finished color/albedo/normal triple a denoiser needs, encoded with the BGR, `p*255`
//! convention on save and written out through the `image` crate.

use crate::core::pbrt::{gamma_correct, Float};

/// Accumulates one pixel's running sum and sample count; each pixel is owned by exactly one
/// worker thread for its lifetime, so no synchronization is needed here.
#[derive(Debug, Default, Copy, Clone)]
struct Accumulator {
    color: [Float; 3],
    albedo: [Float; 3],
    normal: [Float; 3],
    n_samples: u32,
}

pub struct Film {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Accumulator>,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Self {
        Film { width, height, pixels: vec![Accumulator::default(); (width as usize) * (height as usize)] }
    }

    /// Elementwise-adds `other` into `self`. Each worker thread owns a disjoint set of pixels
    /// for the run, so at most one of the two films has a nonzero accumulator at any given
    /// pixel and this is a safe merge rather than a double-count.
    pub fn merge(&mut self, other: Film) {
        for (dst, src) in self.pixels.iter_mut().zip(other.pixels.into_iter()) {
            for c in 0..3 {
                dst.color[c] += src.color[c];
                dst.albedo[c] += src.albedo[c];
                dst.normal[c] += src.normal[c];
            }
            dst.n_samples += src.n_samples;
        }
    }

    /// Adds one sample's contribution at `(x, y)`. `normal`/`albedo` are only meaningful for the
    /// first non-specular bounce; later bounces pass `None`.
    pub fn add_sample(&mut self, x: u32, y: u32, color_bgr: [Float; 3], albedo_bgr: Option<[Float; 3]>, normal_bgr: Option<[Float; 3]>) {
        let index = (y as usize) * (self.width as usize) + (x as usize);
        let pixel = &mut self.pixels[index];
        for c in 0..3 {
            pixel.color[c] += color_bgr[c];
        }
        if let Some(a) = albedo_bgr {
            for c in 0..3 {
                pixel.albedo[c] += a[c];
            }
        }
        if let Some(n) = normal_bgr {
            for c in 0..3 {
                pixel.normal[c] += n[c];
            }
        }
        pixel.n_samples += 1;
    }

    /// Divides every accumulator by its sample count and applies `gamma` to color only.
    pub fn finish(self, gamma: Float) -> RenderResult {
        let mut color = Vec::with_capacity(self.pixels.len() * 3);
        let mut albedo = Vec::with_capacity(self.pixels.len() * 3);
        let mut normal = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in &self.pixels {
            let n = pixel.n_samples.max(1) as Float;
            for c in 0..3 {
                color.push(gamma_correct(pixel.color[c] / n, gamma));
                albedo.push(pixel.albedo[c] / n);
                normal.push(pixel.normal[c] / n);
            }
        }
        RenderResult { color, albedo, normal, width: self.width, height: self.height }
    }
}

/// The finished render: three `width*height*3` float buffers, rows top-to-bottom, channels
/// B,G,R.
pub struct RenderResult {
    pub color: Vec<Float>,
    pub albedo: Vec<Float>,
    pub normal: Vec<Float>,
    pub width: u32,
    pub height: u32,
}

impl RenderResult {
    fn to_rgb_image(buffer: &[Float], width: u32, height: u32) -> image::RgbImage {
        let mut img = image::RgbImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let i = ((y * width + x) * 3) as usize;
                let b = (buffer[i] * 255.0).clamp(0.0, 255.0) as u8;
                let g = (buffer[i + 1] * 255.0).clamp(0.0, 255.0) as u8;
                let r = (buffer[i + 2] * 255.0).clamp(0.0, 255.0) as u8;
                img.put_pixel(x, y, image::Rgb([r, g, b]));
            }
        }
        img
    }

    pub fn save_png(&self, path: &str) -> Result<(), crate::core::error::RenderError> {
        Self::to_rgb_image(&self.color, self.width, self.height)
            .save(path)
            .map_err(|e| crate::core::error::RenderError::Configuration(format!("{}: {}", path, e)))
    }

    /// Writes a standard little-endian color PFM (`PF` header, negative scale) as a gamma-free
    /// high-dynamic-range escape hatch. PFM stores rows bottom-to-top; the buffer is
    /// top-to-bottom, so rows are written in reverse order.
    pub fn save_pfm(&self, path: &str) -> Result<(), crate::core::error::RenderError> {
        use std::io::Write;
        let mut out = std::fs::File::create(path)
            .map_err(|e| crate::core::error::RenderError::Configuration(format!("{}: {}", path, e)))?;
        write!(out, "PF\n{} {}\n-1.0\n", self.width, self.height)
            .map_err(|e| crate::core::error::RenderError::Configuration(e.to_string()))?;
        let row_len = (self.width as usize) * 3;
        for y in (0..self.height as usize).rev() {
            let row = &self.color[y * row_len..(y + 1) * row_len];
            for chunk in row.chunks(3) {
                // PFM is RGB; our buffer is BGR.
                for &v in &[chunk[2], chunk[1], chunk[0]] {
                    out.write_all(&v.to_le_bytes())
                        .map_err(|e| crate::core::error::RenderError::Configuration(e.to_string()))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_multiple_samples_per_pixel() {
        let mut film = Film::new(2, 2);
        film.add_sample(0, 0, [0.0, 0.0, 1.0], None, None);
        film.add_sample(0, 0, [0.0, 0.0, 0.0], None, None);
        let result = film.finish(1.0);
        let i = 0;
        assert!((result.color[i + 2] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn gamma_is_not_applied_to_albedo_or_normal() {
        let mut film = Film::new(1, 1);
        film.add_sample(0, 0, [0.5, 0.5, 0.5], Some([0.25, 0.25, 0.25]), Some([0.0, 1.0, 0.0]));
        let result = film.finish(2.2);
        assert!((result.albedo[0] - 0.25).abs() < 1e-6);
        assert!((result.color[0] - gamma_correct(0.5, 2.2)).abs() < 1e-6);
    }

    #[test]
    fn merge_combines_disjoint_worker_films() {
        let mut a = Film::new(2, 1);
        let mut b = Film::new(2, 1);
        a.add_sample(0, 0, [0.0, 0.0, 1.0], None, None);
        b.add_sample(1, 0, [0.0, 1.0, 0.0], None, None);
        a.merge(b);
        let result = a.finish(1.0);
        assert!((result.color[2] - 1.0).abs() < 1e-6);
        assert!((result.color[4] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unvisited_pixels_stay_black_without_dividing_by_zero() {
        let film = Film::new(3, 3);
        let result = film.finish(1.0);
        assert_eq!(result.color.len(), 27);
        assert!(result.color.iter().all(|&c| c == 0.0));
    }
}
