//! The geometry backend contract: `Device`/`SceneHandle` describe a ray-tracing library
//! abstractly enough that the shipped `typed_arena`-allocated BVH could in principle be swapped
//! for a different one, across the four geometry kinds the scene façade attaches
//! (triangle/quad/sphere/mesh).

pub mod bvh;

use crate::core::geometry::{Point3f, Ray};
use crate::core::pbrt::Float;

pub const GEOM_ID_INVALID: u32 = u32::MAX;

#[derive(Debug, Copy, Clone)]
pub struct RayHit {
    pub t: Float,
    pub uv: (Float, Float),
    pub ng: crate::core::geometry::Vector3f,
    pub geom_id: u32,
}

impl RayHit {
    pub fn miss() -> Self {
        RayHit {
            t: Float::INFINITY,
            uv: (0.0, 0.0),
            ng: crate::core::geometry::Vector3f::new(0.0, 0.0, 1.0),
            geom_id: GEOM_ID_INVALID,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.geom_id != GEOM_ID_INVALID
    }
}

/// Each `attach_*` call returns the `geom_id` that `intersect1`/`occluded1` later report for
/// hits against that primitive; the scene façade keeps its own `Vec<GeomData>` indexed the same
/// way to look up material/light.
pub trait SceneHandle: Send + Sync {
    fn attach_triangles(&mut self, triangles: &[(Point3f, Point3f, Point3f)]) -> u32;
    fn attach_quads(&mut self, quads: &[[Point3f; 4]]) -> u32;
    fn attach_spheres(&mut self, spheres: &[(Point3f, Float)]) -> u32;
    fn attach_mesh(&mut self, vertices: &[Point3f], indices: &[[u32; 3]]) -> u32;
    fn commit(&mut self) -> Result<(), crate::core::error::RenderError>;
    fn intersect1(&self, ray: &Ray) -> RayHit;
    fn occluded1(&self, ray: &Ray) -> bool;
}

pub trait Device {
    fn new_scene(&self) -> Box<dyn SceneHandle>;
}

pub struct BvhDevice;

impl Device for BvhDevice {
    fn new_scene(&self) -> Box<dyn SceneHandle> {
        Box::new(bvh::BvhScene::new())
    }
}

pub fn new_device() -> BvhDevice {
    BvhDevice
}
