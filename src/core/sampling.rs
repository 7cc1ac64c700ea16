//! Disk, hemisphere and sphere sampling warps: `sample_uniform_disk_concentric` (Shirley-Chiu
//! concentric map), `sample_cosine_hemisphere` (Malley's method), `sample_uniform_sphere`. No
//! piecewise-constant `Distribution1D`/`Distribution2D` importance-sampling machinery lives
//! here since nothing in this crate's light set needs image-based lighting.

use crate::core::geometry::Vector3f;
use crate::core::pbrt::{Float, PI};

/// Shirley-Chiu concentric square-to-disk mapping.
pub fn sample_uniform_disk_concentric(u1: Float, u2: Float) -> (Float, Float) {
    let offset_x = 2.0 * u1 - 1.0;
    let offset_y = 2.0 * u2 - 1.0;
    if offset_x == 0.0 && offset_y == 0.0 {
        return (0.0, 0.0);
    }
    let (r, theta) = if offset_x.abs() > offset_y.abs() {
        (offset_x, (PI / 4.0) * (offset_y / offset_x))
    } else {
        (offset_y, (PI / 2.0) - (PI / 4.0) * (offset_x / offset_y))
    };
    (r * theta.cos(), r * theta.sin())
}

/// Malley's method: concentric disk sample projected up onto the hemisphere.
pub fn sample_cosine_hemisphere(u1: Float, u2: Float) -> Vector3f {
    let (x, y) = sample_uniform_disk_concentric(u1, u2);
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    Vector3f::new(x, y, z)
}

pub fn pdf_cosine_hemisphere(cos_theta: Float) -> Float {
    cos_theta * crate::core::pbrt::INV_PI
}

/// Uniform sphere sampling, used for point-light direction sampling and light-sampler fallbacks.
pub fn sample_uniform_sphere(u1: Float, u2: Float) -> Vector3f {
    let z = 1.0 - 2.0 * u1;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u2;
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub const UNIFORM_SPHERE_PDF: Float = 1.0 / (4.0 * PI);

/// Uniform sampling over a triangle via Heitz's low-distortion square-to-triangle map, used by
/// `AreaLight::sample` and triangle-mesh emitter sampling.
pub fn sample_uniform_triangle(u1: Float, u2: Float) -> (Float, Float) {
    let (b0, b1) = if u1 < u2 {
        let b0 = u1 / 2.0;
        (b0, u2 - b0)
    } else {
        let b1 = u2 / 2.0;
        (u1 - b1, b1)
    };
    (b0, b1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_hemisphere_samples_stay_in_upper_hemisphere() {
        for i in 0..20 {
            for j in 0..20 {
                let u1 = (i as Float + 0.5) / 20.0;
                let u2 = (j as Float + 0.5) / 20.0;
                let w = sample_cosine_hemisphere(u1, u2);
                assert!(w.z >= 0.0);
                assert!((w.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn uniform_sphere_samples_are_unit_length() {
        let w = sample_uniform_sphere(0.3, 0.82);
        assert!((w.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn triangle_barycentrics_are_in_simplex() {
        for i in 0..10 {
            for j in 0..10 {
                let u1 = (i as Float + 0.5) / 10.0;
                let u2 = (j as Float + 0.5) / 10.0;
                let (b0, b1) = sample_uniform_triangle(u1, u2);
                assert!(b0 >= 0.0 && b1 >= 0.0 && b0 + b1 <= 1.0 + 1e-6);
            }
        }
    }
}
