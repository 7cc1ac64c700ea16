//! The closed `Material` family: each variant knows how to build a `Bsdf` at a
//! surface interaction, querying its `Texture`(s) for spatially-varying reflectance. A tagged
//! enum, matching the dispatch convention used throughout `core::reflection` and `textures`.

use crate::core::geometry::Vector3f;
use crate::core::interaction::SurfaceInteraction;
use crate::core::pbrt::Float;
use crate::core::reflection::{Bsdf, BxDF, TrowbridgeReitzDistribution};
use crate::core::spectrum::WavelengthSample;
use crate::textures::Texture;

pub enum Material {
    Diffuse(Texture),
    Conductor {
        ior: Texture,
        absorption: Texture,
        roughness: Float,
    },
    Dielectric {
        ior: Float,
    },
    ThinDielectric {
        ior: Float,
    },
    /// A `Vec<(Material, f32)>` of arbitrary length rather than a fixed-arity template.
    Mixed(Vec<(Material, Float)>),
}

impl Material {
    /// Builds a `Bsdf` at `si`. `u.x` selects the `Mixed` child by the normalized weight
    /// vector; `u.y` is reserved for the chosen child's own directional sampling needs further
    /// down the BxDF, so `Mixed` only consumes `u.x` here.
    pub fn bsdf(
        &self,
        si: &SurfaceInteraction,
        wavelengths: &WavelengthSample,
        u: crate::core::geometry::Point2f,
    ) -> Option<Bsdf> {
        let n: Vector3f = si.shading_n.into();
        match self {
            Material::Diffuse(texture) => {
                let reflectance = texture.eval(si.uv, wavelengths);
                Some(Bsdf::new(n, BxDF::Diffuse { reflectance }))
            }
            Material::Conductor { ior, absorption, roughness } => {
                let eta = ior.eval(si.uv, wavelengths);
                let k = absorption.eval(si.uv, wavelengths);
                let dist = TrowbridgeReitzDistribution::new(*roughness, *roughness);
                Some(Bsdf::new(n, BxDF::Conductor { eta, k, dist }))
            }
            Material::Dielectric { ior } => Some(Bsdf::new(n, BxDF::Dielectric { eta: *ior })),
            Material::ThinDielectric { ior } => {
                Some(Bsdf::new(n, BxDF::ThinDielectric { eta: *ior }))
            }
            Material::Mixed(children) => {
                let total: Float = children.iter().map(|(_, w)| *w).sum();
                if total <= 0.0 || children.is_empty() {
                    return None;
                }
                let index = ((u.x * children.len() as Float) as usize).min(children.len() - 1);
                children[index].0.bsdf(si, wavelengths, u)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{Normal3f, Point2f, Point3f};
    use crate::core::rgb::Rgb;

    fn interaction() -> SurfaceInteraction<'static> {
        SurfaceInteraction {
            p: Point3f::new(0.0, 0.0, 0.0),
            t: 1.0,
            wo: Vector3f::new(0.0, 0.0, 1.0),
            n: Normal3f::new(0.0, 0.0, 1.0),
            shading_n: Normal3f::new(0.0, 0.0, 1.0),
            uv: Point2f::new(0.5, 0.5),
            material: None,
            light: None,
        }
    }

    #[test]
    fn diffuse_material_builds_a_non_specular_bsdf() {
        let material = Material::Diffuse(Texture::solid_rgb(Rgb::new(0.8, 0.2, 0.2)));
        let ws = WavelengthSample::uniform(0.5);
        let si = interaction();
        let bsdf = material.bsdf(&si, &ws, Point2f::new(0.1, 0.1)).unwrap();
        assert!(!bsdf.is_specular());
    }

    #[test]
    fn mixed_material_selects_a_child_without_panicking() {
        let a = Material::Diffuse(Texture::solid_rgb(Rgb::new(0.9, 0.1, 0.1)));
        let b = Material::Dielectric { ior: 1.5 };
        let material = Material::Mixed(vec![(a, 0.5), (b, 0.5)]);
        let ws = WavelengthSample::uniform(0.5);
        let si = interaction();
        assert!(material.bsdf(&si, &ws, Point2f::new(0.9, 0.1)).is_some());
    }
}
