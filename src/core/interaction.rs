//! `SurfaceInteraction`: the hit record the integrator threads through a bounce, carrying
//! back-pointers into the scene's owned material/light tables rather than owning them directly.

use crate::core::geometry::{Normal3f, Point2f, Point3f, Vector3f};
use crate::core::pbrt::Float;
use crate::core::reflection::Bsdf;
use crate::core::spectrum::WavelengthSample;
use crate::lights::Light;
use crate::materials::Material;

pub struct SurfaceInteraction<'a> {
    pub p: Point3f,
    pub t: Float,
    pub wo: Vector3f,
    pub n: Normal3f,
    pub shading_n: Normal3f,
    pub uv: Point2f,
    pub material: Option<&'a Material>,
    pub light: Option<&'a Light>,
}

impl<'a> SurfaceInteraction<'a> {
    pub fn is_emissive(&self) -> bool {
        self.light.is_some()
    }

    /// Builds a BSDF lazily from the interaction's material. `None` both when there is
    /// no material (e.g. an area light's back-facing geometry) and when the material is purely
    /// `Emissive`.
    pub fn bsdf(&self, wavelengths: &WavelengthSample, u: Point2f) -> Option<Bsdf> {
        self.material.and_then(|m| m.bsdf(self, wavelengths, u))
    }

    /// Nudges a spawned-ray origin off the surface along the outgoing hemisphere normal to
    /// avoid self-intersection.
    pub fn spawn_ray_origin(&self, direction: Vector3f) -> Point3f {
        const EPSILON: Float = 1e-4;
        let n = if crate::core::geometry::vec3_dot_vec3f(&self.n.into(), &direction) < 0.0 {
            -Vector3f::from(self.n)
        } else {
            self.n.into()
        };
        self.p + n * EPSILON
    }
}
