//! The scene façade: owns every piece of geometry, material and light, and is the
//! only thing the integrator talks to. Wraps a `Box<dyn accelerators::SceneHandle>` over a flat
//! primitive list, paired with a `geom_id`-indexed side table since `accelerators::bvh` knows
//! nothing about materials or lights.

use crate::accelerators::{new_device, Device, SceneHandle};
use crate::core::error::RenderError;
use crate::core::geometry::{vec3_cross_vec3, Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::interaction::SurfaceInteraction;
use crate::core::pbrt::{Float, ONE_MINUS_EPSILON, PI, SHADOW_EPSILON};
use crate::core::spectrum::WavelengthSample;
use crate::lights::{Light, LightSample};
use crate::materials::Material;
use crate::samplers::Sampler;
use crate::shapes::Shape;

/// Everything the scene façade needs to look up once the BVH hands back a bare `geom_id`: the
/// surface's material (if any) and, for emitters, a back-pointer to the `Light` registered for
/// that same piece of geometry.
struct GeomData {
    material: Option<Material>,
    light: Option<Light>,
    is_sphere: bool,
}

pub struct Scene {
    handle: Box<dyn SceneHandle>,
    geoms: Vec<GeomData>,
    /// `geoms` indices that carry a light, for uniform area-light selection.
    area_lights: Vec<usize>,
    /// Delta lights (point/directional) have no geometry, so they live outside `geoms`.
    delta_lights: Vec<Light>,
    committed: bool,
}

impl Scene {
    pub fn new() -> Self {
        Scene::with_device(&new_device())
    }

    pub fn with_device(device: &dyn Device) -> Self {
        Scene {
            handle: device.new_scene(),
            geoms: Vec::new(),
            area_lights: Vec::new(),
            delta_lights: Vec::new(),
            committed: false,
        }
    }

    fn push_geom(&mut self, geom_id: u32, material: Option<Material>, light: Option<Light>, is_sphere: bool) {
        let index = geom_id as usize;
        if self.geoms.len() <= index {
            self.geoms.resize_with(index + 1, || GeomData { material: None, light: None, is_sphere: false });
        }
        let has_light = light.is_some();
        self.geoms[index] = GeomData { material, light, is_sphere };
        if has_light {
            self.area_lights.push(index);
        }
    }

    pub fn add_triangle(&mut self, a: Point3f, b: Point3f, c: Point3f, material: Material) {
        let geom_id = self.handle.attach_triangles(&[(a, b, c)]);
        self.push_geom(geom_id, Some(material), None, false);
    }

    /// Four vertices wound clockwise around the outward face.
    pub fn add_quad(&mut self, a: Point3f, b: Point3f, c: Point3f, d: Point3f, material: Material) {
        let geom_id = self.handle.attach_quads(&[[a, b, c, d]]);
        self.push_geom(geom_id, Some(material), None, false);
    }

    pub fn add_sphere(&mut self, center: Point3f, radius: Float, material: Material) {
        let geom_id = self.handle.attach_spheres(&[(center, radius)]);
        self.push_geom(geom_id, Some(material), None, true);
    }

    /// A large quad aligned to `n`'s basis, centered on `p`.
    pub fn add_plane(&mut self, p: Point3f, n: Vector3f, half_size: Float, material: Material) {
        let n = n.normalize();
        let helper = if n.x.abs() < 0.9 { Vector3f::new(1.0, 0.0, 0.0) } else { Vector3f::new(0.0, 1.0, 0.0) };
        let tangent = vec3_cross_vec3(&helper, &n).normalize();
        let bitangent = vec3_cross_vec3(&n, &tangent);
        let a = p - tangent * half_size - bitangent * half_size;
        let b = p + tangent * half_size - bitangent * half_size;
        let c = p + tangent * half_size + bitangent * half_size;
        let d = p - tangent * half_size + bitangent * half_size;
        self.add_quad(a, b, c, d, material);
    }

    /// `vertices`/`face_indices` already triangulated by the caller.
    pub fn add_mesh(&mut self, vertices: Vec<Point3f>, face_indices: Vec<[u32; 3]>, material: Material) {
        let geom_id = self.handle.attach_mesh(&vertices, &face_indices);
        self.push_geom(geom_id, Some(material), None, false);
    }

    /// If `light` is an `AreaLight`, also registers its shape as geometry with `material=None`
    /// and the geom-data's light set to this light, so a camera ray that lands on the emitter's
    /// surface sees it. Delta lights carry no geometry and are tracked separately.
    pub fn add_light(&mut self, light: Light) {
        match &light {
            Light::Area { shape, .. } => {
                let is_sphere = shape.is_sphere();
                let geom_id = match shape {
                    Shape::Triangle { p0, p1, p2 } => self.handle.attach_triangles(&[(*p0, *p1, *p2)]),
                    Shape::Quad { p0, p1, p2, p3 } => self.handle.attach_quads(&[[*p0, *p1, *p2, *p3]]),
                    Shape::Sphere { center, radius } => self.handle.attach_spheres(&[(*center, *radius)]),
                    Shape::TriangleMesh { vertices, indices } => self.handle.attach_mesh(vertices, indices),
                };
                self.push_geom(geom_id, None, Some(light), is_sphere);
            }
            Light::Point { .. } | Light::Directional { .. } => {
                self.delta_lights.push(light);
            }
        }
    }

    pub fn commit(&mut self) -> Result<(), RenderError> {
        self.handle.commit()?;
        self.committed = true;
        Ok(())
    }

    /// Nearest hit with `t > 1e-4` along `ray`, or `None`.
    pub fn ray_intersect<'a>(&'a self, ray: &Ray) -> Option<SurfaceInteraction<'a>> {
        debug_assert!(self.committed, "ray_intersect called before commit()");
        let hit = self.handle.intersect1(ray);
        if !hit.is_hit() {
            return None;
        }
        let geom = &self.geoms[hit.geom_id as usize];
        let p = ray.at(hit.t);
        let n = hit.ng.normalize();
        let uv = if geom.is_sphere {
            // Spheres derive UV from the geometric normal, not the intersector.
            let u = (n.z.atan2(n.x) + PI) / (2.0 * PI);
            let v = n.y.clamp(-1.0, 1.0).acos() / PI;
            Point2f::new(u.min(ONE_MINUS_EPSILON), v.min(ONE_MINUS_EPSILON))
        } else {
            Point2f::new(hit.uv.0, hit.uv.1)
        };
        Some(SurfaceInteraction {
            p,
            t: hit.t,
            wo: -ray.d,
            n: Normal3f::from(n),
            shading_n: Normal3f::from(n),
            uv,
            material: geom.material.as_ref(),
            light: geom.light.as_ref(),
        })
    }

    /// Any hit with `t ∈ (ε, 1)` along `a → b`.
    pub fn occluded(&self, a: Point3f, b: Point3f) -> bool {
        let d = b - a;
        let distance = d.length();
        if distance < SHADOW_EPSILON {
            return false;
        }
        let dir = d / distance;
        let ray = Ray::new(a + dir * SHADOW_EPSILON, dir, distance * (1.0 - 2.0 * SHADOW_EPSILON));
        self.handle.occluded1(&ray)
    }

    /// Picks a light uniformly at random; returns the light and its `sample_li` draw plus the
    /// `1/N` selection pdf. `None` if the scene has no lights.
    pub fn sample_lights(
        &self,
        si: &SurfaceInteraction,
        wavelengths: &WavelengthSample,
        sampler: &mut Sampler,
    ) -> (Option<(&Light, LightSample)>, Float) {
        let n = self.area_lights.len() + self.delta_lights.len();
        if n == 0 {
            return (None, 0.0);
        }
        let pdf = 1.0 / n as Float;
        let pick = ((sampler.get_1d() * n as Float) as usize).min(n - 1);
        let light = if pick < self.area_lights.len() {
            self.geoms[self.area_lights[pick]].light.as_ref().expect("area_lights only indexes lit geoms")
        } else {
            &self.delta_lights[pick - self.area_lights.len()]
        };
        let u = {
            let p = sampler.get_2d();
            (p.x, p.y)
        };
        match light.sample_li(si.p, wavelengths, u) {
            Some(sample) => (Some((light, sample)), pdf),
            None => (None, pdf),
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rgb::Rgb;
    use crate::core::spectrum::Spectrum;
    use crate::textures::Texture;

    fn lam() -> WavelengthSample {
        WavelengthSample::uniform(0.5)
    }

    #[test]
    fn ray_intersect_finds_a_triangle_head_on() {
        let mut scene = Scene::new();
        scene.add_triangle(
            Point3f::new(-1.0, -1.0, 2.0),
            Point3f::new(1.0, -1.0, 2.0),
            Point3f::new(0.0, 1.0, 2.0),
            Material::Diffuse(Texture::solid_rgb(Rgb::new(0.5, 0.5, 0.5))),
        );
        scene.commit().unwrap();
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY);
        let si = scene.ray_intersect(&ray).unwrap();
        assert!((si.t - 2.0).abs() < 1e-4);
        assert!(si.material.is_some());
    }

    #[test]
    fn sphere_uv_matches_closed_form_at_the_pole() {
        let mut scene = Scene::new();
        scene.add_sphere(
            Point3f::new(0.0, 0.0, 0.0),
            1.0,
            Material::Diffuse(Texture::solid_rgb(Rgb::new(0.5, 0.5, 0.5))),
        );
        scene.commit().unwrap();
        let ray = Ray::new(Point3f::new(0.0, 5.0, 0.0), Vector3f::new(0.0, -1.0, 0.0), Float::INFINITY);
        let si = scene.ray_intersect(&ray).unwrap();
        assert!((si.uv.y - 0.0).abs() < 1e-3);
    }

    #[test]
    fn occluded_detects_a_blocker_between_two_points() {
        let mut scene = Scene::new();
        scene.add_sphere(
            Point3f::new(0.0, 0.0, 2.0),
            0.5,
            Material::Diffuse(Texture::solid_rgb(Rgb::new(0.5, 0.5, 0.5))),
        );
        scene.commit().unwrap();
        assert!(scene.occluded(Point3f::new(0.0, 0.0, 0.0), Point3f::new(0.0, 0.0, 4.0)));
        assert!(!scene.occluded(Point3f::new(0.0, 0.0, 0.0), Point3f::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn sample_lights_picks_among_registered_lights() {
        let mut scene = Scene::new();
        scene.add_light(Light::Point {
            position: Point3f::new(0.0, 5.0, 0.0),
            spectrum: Spectrum::constant(1.0),
            scale: 1.0,
        });
        scene.add_triangle(
            Point3f::new(-1.0, -1.0, 2.0),
            Point3f::new(1.0, -1.0, 2.0),
            Point3f::new(0.0, 1.0, 2.0),
            Material::Diffuse(Texture::solid_rgb(Rgb::new(0.5, 0.5, 0.5))),
        );
        scene.commit().unwrap();
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY);
        let si = scene.ray_intersect(&ray).unwrap();
        let ws = lam();
        let mut sampler = Sampler::independent(4);
        let (sample, pdf) = scene.sample_lights(&si, &ws, &mut sampler);
        assert!(sample.is_some());
        assert!((pdf - 1.0).abs() < 1e-6);
    }
}
