//! The path tracer: next-event estimation with balance-heuristic MIS against BSDF sampling,
//! an iterative bounce loop carrying a `beta` throughput term and terminating via Russian
//! roulette.

use crate::core::geometry::{vec3_dot_vec3f, Point2f, Ray, Vector3f};
use crate::core::pbrt::Float;
use crate::core::spectrum::{SpectrumSample, WavelengthSample};
use crate::samplers::Sampler;
use crate::scene::Scene;

/// One pixel sample's radiance plus the auxiliary albedo/normal recorded at the first
/// non-specular bounce.
pub struct SampleResult {
    pub l: SpectrumSample,
    pub albedo: Option<SpectrumSample>,
    pub normal: Option<Vector3f>,
}

/// Traces one camera ray to completion. `sampler` supplies every random number the bounce loop
/// needs; `max_bounces` bounds the loop.
pub fn sample_path(scene: &Scene, mut ray: Ray, wavelengths: &WavelengthSample, sampler: &mut Sampler, max_bounces: u32) -> SampleResult {
    let lambda = wavelengths.lambda;
    let mut beta = SpectrumSample::one(lambda);
    let mut l = SpectrumSample::zero(lambda);
    let mut eta_scale: Float = 1.0;
    let mut specular_bounce = true;
    let mut last_pdf: Float = 1.0;
    let mut prev_p = ray.o;
    let mut albedo = None;
    let mut normal = None;

    for bounce in 0..max_bounces {
        let si = match scene.ray_intersect(&ray) {
            Some(si) => si,
            None => break,
        };

        if let Some(light) = si.light {
            let le = light.le(si.wo, Vector3f::from(si.n), wavelengths);
            if !le.is_zero() {
                if specular_bounce {
                    l = l + beta * le;
                } else {
                    let p_light = light.pdf_li(prev_p, si.p, Vector3f::from(si.n));
                    let w_mis = if p_light <= 0.0 && last_pdf <= 0.0 {
                        0.0
                    } else {
                        (last_pdf * last_pdf) / (last_pdf * last_pdf + p_light * p_light)
                    };
                    l = l + beta * le * w_mis;
                }
            }
        }

        let u_bsdf = Point2f::new(sampler.get_1d(), sampler.get_1d());
        let bsdf = match si.bsdf(wavelengths, u_bsdf) {
            Some(bsdf) => bsdf,
            None => break,
        };

        if albedo.is_none() && !bsdf.is_specular() {
            let u1: Vec<Float> = (0..4).map(|_| sampler.get_1d()).collect();
            let u2: Vec<(Float, Float)> = (0..4)
                .map(|_| {
                    let p = sampler.get_2d();
                    (p.x, p.y)
                })
                .collect();
            albedo = Some(bsdf.rho_hd(&si.wo, &u1, &u2, lambda));
            normal = Some(Vector3f::from(si.shading_n));
        }

        if !bsdf.is_specular() {
            let (sample, p_select) = scene.sample_lights(&si, wavelengths, sampler);
            if let Some((_light, light_sample)) = sample {
                if !light_sample.li.is_zero() && light_sample.pdf_w > 0.0 {
                    let shadow_distance = light_sample.distance.min(1e7);
                    let target = si.p + light_sample.wi * shadow_distance;
                    if !scene.occluded(si.spawn_ray_origin(light_sample.wi), target) {
                        let f = bsdf.f(&si.wo, &light_sample.wi) * vec3_dot_vec3f(&light_sample.wi, &Vector3f::from(si.shading_n)).abs();
                        if !f.is_zero() {
                            let w_mis = if light_sample.is_delta {
                                1.0
                            } else {
                                let p_bsdf = bsdf.pdf(&si.wo, &light_sample.wi);
                                let p_l = light_sample.pdf_w;
                                (p_l * p_l) / (p_l * p_l + p_bsdf * p_bsdf)
                            };
                            l = l + beta * f * light_sample.li * (w_mis / (light_sample.pdf_w * p_select));
                        }
                    }
                }
            }
        }

        let u1 = sampler.get_1d();
        let u2 = sampler.get_2d();
        let bsdf_sample = match bsdf.sample(&si.wo, u1, (u2.x, u2.y), lambda) {
            Some(s) => s,
            None => break,
        };
        if bsdf_sample.pdf <= 0.0 || bsdf_sample.spec.is_zero() {
            break;
        }

        let cos_theta_i = vec3_dot_vec3f(&bsdf_sample.wi, &Vector3f::from(si.shading_n)).abs();
        beta = beta * bsdf_sample.spec * (cos_theta_i / bsdf_sample.pdf);
        if bsdf_sample.is_transmission() {
            eta_scale *= bsdf_sample.eta * bsdf_sample.eta;
        }
        specular_bounce = bsdf_sample.is_specular();
        last_pdf = bsdf_sample.pdf;
        prev_p = si.p;

        if bounce > 0 {
            let rr_beta = (beta * SpectrumSample::constant(eta_scale, lambda)).max_component();
            let q = (1.0 - rr_beta).max(0.0);
            if sampler.get_1d() < q {
                break;
            }
            beta = beta / (1.0 - q);
        }

        let origin = si.spawn_ray_origin(bsdf_sample.wi);
        ray = Ray::new(origin, bsdf_sample.wi, Float::INFINITY);
    }

    SampleResult { l, albedo, normal }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Point3f;
    use crate::core::rgb::Rgb;
    use crate::core::spectrum::Spectrum;
    use crate::lights::Light;
    use crate::materials::Material;
    use crate::textures::Texture;

    #[test]
    fn a_ray_that_misses_everything_returns_zero_radiance() {
        let mut scene = Scene::new();
        scene.commit().unwrap();
        let ws = WavelengthSample::uniform(0.5);
        let mut sampler = Sampler::independent(4);
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY);
        let result = sample_path(&scene, ray, &ws, &mut sampler, 8);
        assert!(result.l.is_zero());
    }

    #[test]
    fn a_ray_that_directly_hits_an_emitter_sees_its_radiance() {
        let mut scene = Scene::new();
        scene.add_light(Light::Area {
            shape: crate::shapes::Shape::Quad {
                p0: Point3f::new(-1.0, -1.0, 2.0),
                p1: Point3f::new(1.0, -1.0, 2.0),
                p2: Point3f::new(1.0, 1.0, 2.0),
                p3: Point3f::new(-1.0, 1.0, 2.0),
            },
            spectrum: Spectrum::constant(4.0),
            scale: 1.0,
            two_sided: true,
        });
        scene.commit().unwrap();
        let ws = WavelengthSample::uniform(0.5);
        let mut sampler = Sampler::independent(4);
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY);
        let result = sample_path(&scene, ray, &ws, &mut sampler, 8);
        assert!(result.l.average() > 0.0);
    }

    #[test]
    fn a_diffuse_surface_lit_by_a_point_light_accumulates_radiance() {
        let mut scene = Scene::new();
        scene.add_light(Light::Point {
            position: Point3f::new(0.0, 0.0, 1.0),
            spectrum: Spectrum::constant(10.0),
            scale: 1.0,
        });
        scene.add_triangle(
            Point3f::new(-1.0, -1.0, 2.0),
            Point3f::new(1.0, -1.0, 2.0),
            Point3f::new(0.0, 1.0, 2.0),
            Material::Diffuse(Texture::solid_rgb(Rgb::new(0.8, 0.8, 0.8))),
        );
        scene.commit().unwrap();
        let ws = WavelengthSample::uniform(0.5);
        let mut sampler = Sampler::independent(16);
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY);
        let result = sample_path(&scene, ray, &ws, &mut sampler, 8);
        assert!(result.l.average() > 0.0);
        assert!(result.albedo.is_some());
        assert!(result.normal.is_some());
    }
}
