//! The closed `Light` family: point, directional and area emitters, each producing a
//! `LightSample` for next-event estimation. A tagged enum, matching the dispatch convention
//! used by `materials::Material`/`textures::Texture`.

use crate::core::geometry::{vec3_dot_vec3f, Point3f, Vector3f};
use crate::core::pbrt::Float;
use crate::core::spectrum::{Spectrum, SpectrumSample, WavelengthSample};
use crate::shapes::Shape;

pub enum Light {
    Point {
        position: Point3f,
        spectrum: Spectrum,
        scale: Float,
    },
    Directional {
        direction: Vector3f,
        spectrum: Spectrum,
        scale: Float,
    },
    Area {
        shape: Shape,
        spectrum: Spectrum,
        scale: Float,
        two_sided: bool,
    },
}

/// A next-event-estimation draw: direction and distance to the sampled light point, the
/// radiance arriving along it, its solid-angle pdf, and whether it came from a delta light (no
/// BSDF-sampling counterpart, so MIS weight is 1 rather than balance-heuristic).
pub struct LightSample {
    pub wi: Vector3f,
    pub distance: Float,
    pub li: SpectrumSample,
    pub pdf_w: Float,
    pub is_delta: bool,
}

impl Light {
    pub fn is_delta(&self) -> bool {
        matches!(self, Light::Point { .. } | Light::Directional { .. })
    }

    /// `p` is the shading point; `u` drives `AreaLight`'s point-on-shape sampling.
    pub fn sample_li(
        &self,
        p: Point3f,
        wavelengths: &WavelengthSample,
        u: (Float, Float),
    ) -> Option<LightSample> {
        match self {
            Light::Point { position, spectrum, scale } => {
                let delta = *position - p;
                let distance = delta.length();
                if distance == 0.0 {
                    return None;
                }
                let wi = delta / distance;
                let li = spectrum.sample(wavelengths) * (*scale / (distance * distance));
                Some(LightSample { wi, distance, li, pdf_w: 1.0, is_delta: true })
            }
            Light::Directional { direction, spectrum, scale } => {
                let wi = -*direction;
                let li = spectrum.sample(wavelengths) * *scale;
                Some(LightSample {
                    wi,
                    distance: Float::INFINITY,
                    li,
                    pdf_w: 1.0,
                    is_delta: true,
                })
            }
            Light::Area { shape, spectrum, scale, two_sided } => {
                let (y, n_y) = shape.sample(u);
                let delta = y - p;
                let distance = delta.length();
                if distance == 0.0 {
                    return None;
                }
                let wi = delta / distance;
                let cos_theta_y = vec3_dot_vec3f(&-wi, &n_y);
                if cos_theta_y <= 0.0 && !two_sided {
                    return None;
                }
                let area = shape.area();
                if area <= 0.0 {
                    return None;
                }
                let pdf_a = 1.0 / area;
                let pdf_w = pdf_a * distance * distance / cos_theta_y.abs().max(1e-6);
                let li = spectrum.sample(wavelengths) * *scale;
                Some(LightSample { wi, distance, li, pdf_w, is_delta: false })
            }
        }
    }

    /// The light-sampling pdf (solid angle, at `p`) of having landed exactly on `hit_point` with
    /// surface normal `hit_normal` — used by the integrator's MIS weight when a BSDF-sampled ray
    /// directly strikes this emitter. Zero for delta lights: they have no BSDF-sampling
    /// counterpart to weight against.
    pub fn pdf_li(&self, p: Point3f, hit_point: Point3f, hit_normal: Vector3f) -> Float {
        match self {
            Light::Point { .. } | Light::Directional { .. } => 0.0,
            Light::Area { shape, .. } => {
                let area = shape.area();
                if area <= 0.0 {
                    return 0.0;
                }
                let delta = hit_point - p;
                let distance_sq = delta.length_squared();
                if distance_sq == 0.0 {
                    return 0.0;
                }
                let wi = delta / distance_sq.sqrt();
                let cos_theta_y = vec3_dot_vec3f(&-wi, &hit_normal).abs().max(1e-6);
                (1.0 / area) * distance_sq / cos_theta_y
            }
        }
    }

    /// Direct-hit emission for an `AreaLight` struck by a camera or BSDF-sampled ray.
    pub fn le(&self, wo: Vector3f, hit_normal: Vector3f, wavelengths: &WavelengthSample) -> SpectrumSample {
        match self {
            Light::Area { spectrum, scale, two_sided, .. } => {
                if vec3_dot_vec3f(&wo, &hit_normal) > 0.0 || *two_sided {
                    spectrum.sample(wavelengths) * *scale
                } else {
                    SpectrumSample::zero(wavelengths.lambda)
                }
            }
            Light::Point { .. } | Light::Directional { .. } => SpectrumSample::zero(wavelengths.lambda),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lam() -> WavelengthSample {
        WavelengthSample::uniform(0.5)
    }

    #[test]
    fn point_light_falls_off_with_inverse_square_distance() {
        let light = Light::Point {
            position: Point3f::new(0.0, 2.0, 0.0),
            spectrum: Spectrum::constant(1.0),
            scale: 1.0,
        };
        let ws = lam();
        let sample = light.sample_li(Point3f::new(0.0, 0.0, 0.0), &ws, (0.0, 0.0)).unwrap();
        assert!((sample.li.average() - 0.25).abs() < 1e-4);
        assert!(sample.is_delta);
    }

    #[test]
    fn directional_light_has_infinite_distance() {
        let light = Light::Directional {
            direction: Vector3f::new(0.0, -1.0, 0.0),
            spectrum: Spectrum::constant(2.0),
            scale: 1.0,
        };
        let ws = lam();
        let sample = light.sample_li(Point3f::new(0.0, 0.0, 0.0), &ws, (0.0, 0.0)).unwrap();
        assert!(sample.distance.is_infinite());
        assert!((sample.wi.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn one_sided_area_light_is_invisible_from_behind() {
        let shape = Shape::Quad {
            p0: Point3f::new(-1.0, 0.0, -1.0),
            p1: Point3f::new(1.0, 0.0, -1.0),
            p2: Point3f::new(1.0, 0.0, 1.0),
            p3: Point3f::new(-1.0, 0.0, 1.0),
        };
        let light = Light::Area {
            shape,
            spectrum: Spectrum::constant(3.0),
            scale: 1.0,
            two_sided: false,
        };
        let ws = lam();
        // cross(p1-p0, p2-p0) for this winding points toward -y, so a shading point above the
        // quad sees its back face and gets no contribution.
        let sample = light.sample_li(Point3f::new(0.0, 5.0, 0.0), &ws, (0.2, 0.3));
        assert!(sample.is_none());
    }
}
