//! A median-split bounding volume hierarchy over the four geometry kinds the scene façade
//! attaches (triangle, quad, sphere, indexed mesh), all reduced to a flat `Primitive` list
//! tagged with the `geom_id` their `attach_*` call was given. Builds in two passes: a recursive
//! build into a `typed_arena::Arena`, then a flatten into a linear node array for stackless
//! traversal. The split rule is a plain median split on the centroid bounds' widest axis rather
//! than a SAH bucket scan.

use typed_arena::Arena;

use crate::core::geometry::{Bounds3f, Point3f, Ray, Vector3f, XYZEnum};
use crate::core::pbrt::Float;

use super::{RayHit, SceneHandle, GEOM_ID_INVALID};

#[derive(Debug, Copy, Clone)]
enum Primitive {
    Triangle {
        p0: Point3f,
        p1: Point3f,
        p2: Point3f,
        geom_id: u32,
    },
    Sphere {
        center: Point3f,
        radius: Float,
        geom_id: u32,
    },
}

impl Primitive {
    fn geom_id(&self) -> u32 {
        match self {
            Primitive::Triangle { geom_id, .. } => *geom_id,
            Primitive::Sphere { geom_id, .. } => *geom_id,
        }
    }

    fn bounds(&self) -> Bounds3f {
        match self {
            Primitive::Triangle { p0, p1, p2, .. } => {
                Bounds3f::from_point(*p0).union_point(*p1).union_point(*p2)
            }
            Primitive::Sphere { center, radius, .. } => Bounds3f {
                p_min: Point3f::new(center.x - radius, center.y - radius, center.z - radius),
                p_max: Point3f::new(center.x + radius, center.y + radius, center.z + radius),
            },
        }
    }

    /// Möller-Trumbore for triangles, analytic quadratic for spheres. Returns the hit distance,
    /// barycentric/parametric `uv` and geometric normal.
    fn intersect(&self, ray: &Ray, t_max: Float) -> Option<(Float, (Float, Float), Vector3f)> {
        match self {
            Primitive::Triangle { p0, p1, p2, .. } => {
                let e1 = *p1 - *p0;
                let e2 = *p2 - *p0;
                let pvec = crate::core::geometry::vec3_cross_vec3(&ray.d, &e2);
                let det = crate::core::geometry::vec3_dot_vec3f(&e1, &pvec);
                if det.abs() < 1e-12 {
                    return None;
                }
                let inv_det = 1.0 / det;
                let tvec = ray.o - *p0;
                let u = crate::core::geometry::vec3_dot_vec3f(&tvec, &pvec) * inv_det;
                if !(0.0..=1.0).contains(&u) {
                    return None;
                }
                let qvec = crate::core::geometry::vec3_cross_vec3(&tvec, &e1);
                let v = crate::core::geometry::vec3_dot_vec3f(&ray.d, &qvec) * inv_det;
                if v < 0.0 || u + v > 1.0 {
                    return None;
                }
                let t = crate::core::geometry::vec3_dot_vec3f(&e2, &qvec) * inv_det;
                if t <= 1e-7 || t >= t_max {
                    return None;
                }
                let ng = crate::core::geometry::vec3_cross_vec3(&e1, &e2).normalize();
                Some((t, (u, v), ng))
            }
            Primitive::Sphere { center, radius, .. } => {
                let oc = ray.o - *center;
                let a = ray.d.length_squared();
                let b = 2.0 * crate::core::geometry::vec3_dot_vec3f(&oc, &ray.d);
                let c = oc.length_squared() - radius * radius;
                let disc = b * b - 4.0 * a * c;
                if disc < 0.0 {
                    return None;
                }
                let sqrt_disc = disc.sqrt();
                let t0 = (-b - sqrt_disc) / (2.0 * a);
                let t1 = (-b + sqrt_disc) / (2.0 * a);
                let t = if t0 > 1e-7 {
                    t0
                } else if t1 > 1e-7 {
                    t1
                } else {
                    return None;
                };
                if t >= t_max {
                    return None;
                }
                let p = ray.at(t);
                let n = (p - *center).normalize();
                Some((t, (0.0, 0.0), n))
            }
        }
    }

    fn occluded(&self, ray: &Ray, t_max: Float) -> bool {
        self.intersect(ray, t_max).is_some()
    }
}

#[derive(Debug, Copy, Clone)]
struct PrimitiveInfo {
    primitive_number: usize,
    bounds: Bounds3f,
    centroid: Point3f,
}

impl PrimitiveInfo {
    fn new(primitive_number: usize, bounds: Bounds3f) -> Self {
        PrimitiveInfo {
            primitive_number,
            bounds,
            centroid: bounds.centroid(),
        }
    }
}

struct BuildNode<'a> {
    bounds: Bounds3f,
    child1: Option<&'a BuildNode<'a>>,
    child2: Option<&'a BuildNode<'a>>,
    split_axis: u8,
    first_prim_offset: usize,
    n_primitives: usize,
}

impl<'a> BuildNode<'a> {
    fn leaf(bounds: Bounds3f, first_prim_offset: usize, n_primitives: usize) -> Self {
        BuildNode {
            bounds,
            child1: None,
            child2: None,
            split_axis: 0,
            first_prim_offset,
            n_primitives,
        }
    }

    fn interior(axis: u8, c0: &'a BuildNode<'a>, c1: &'a BuildNode<'a>) -> Self {
        BuildNode {
            bounds: c0.bounds.union(&c1.bounds),
            child1: Some(c0),
            child2: Some(c1),
            split_axis: axis,
            first_prim_offset: 0,
            n_primitives: 0,
        }
    }
}

const MAX_PRIMS_IN_LEAF: usize = 4;

#[derive(Debug, Default, Clone, Copy)]
struct LinearNode {
    bounds: Bounds3f,
    offset: u32,
    n_primitives: u16,
    axis: u8,
}

fn recursive_build<'a>(
    arena: &'a Arena<BuildNode<'a>>,
    primitives: &[Primitive],
    primitive_info: &mut [PrimitiveInfo],
    start: usize,
    end: usize,
    total_nodes: &mut usize,
    ordered_prims: &mut Vec<Primitive>,
) -> &'a BuildNode<'a> {
    *total_nodes += 1;
    let mut bounds = Bounds3f::default();
    for info in &primitive_info[start..end] {
        bounds = bounds.union(&info.bounds);
    }
    let n_primitives = end - start;

    let make_leaf = |primitive_info: &[PrimitiveInfo], ordered_prims: &mut Vec<Primitive>| {
        let first_prim_offset = ordered_prims.len();
        for info in primitive_info {
            ordered_prims.push(primitives[info.primitive_number]);
        }
        BuildNode::leaf(bounds, first_prim_offset, n_primitives)
    };

    if n_primitives <= MAX_PRIMS_IN_LEAF {
        return arena.alloc(make_leaf(&primitive_info[start..end], ordered_prims));
    }

    let mut centroid_bounds = Bounds3f::default();
    for info in &primitive_info[start..end] {
        centroid_bounds = centroid_bounds.union_point(info.centroid);
    }
    let dim = centroid_bounds.max_extent();
    if centroid_bounds.p_max[dim] == centroid_bounds.p_min[dim] {
        return arena.alloc(make_leaf(&primitive_info[start..end], ordered_prims));
    }

    let mid = (start + end) / 2;
    primitive_info[start..end].select_nth_unstable_by(mid - start, |a, b| {
        a.centroid[dim].partial_cmp(&b.centroid[dim]).unwrap()
    });

    let c0 = recursive_build(arena, primitives, primitive_info, start, mid, total_nodes, ordered_prims);
    let c1 = recursive_build(arena, primitives, primitive_info, mid, end, total_nodes, ordered_prims);
    let axis = match dim {
        XYZEnum::X => 0,
        XYZEnum::Y => 1,
        XYZEnum::Z => 2,
    };
    arena.alloc(BuildNode::interior(axis, c0, c1))
}

fn flatten(node: &BuildNode, nodes: &mut Vec<LinearNode>, offset: &mut usize) -> usize {
    let my_offset = *offset;
    *offset += 1;
    nodes.push(LinearNode::default());
    if node.n_primitives > 0 {
        nodes[my_offset] = LinearNode {
            bounds: node.bounds,
            offset: node.first_prim_offset as u32,
            n_primitives: node.n_primitives as u16,
            axis: 0,
        };
    } else {
        flatten(node.child1.unwrap(), nodes, offset);
        let second_child_offset = flatten(node.child2.unwrap(), nodes, offset);
        nodes[my_offset] = LinearNode {
            bounds: node.bounds,
            offset: second_child_offset as u32,
            n_primitives: 0,
            axis: node.split_axis,
        };
    }
    my_offset
}

pub struct BvhScene {
    next_geom_id: u32,
    primitives: Vec<Primitive>,
    nodes: Vec<LinearNode>,
}

impl BvhScene {
    pub fn new() -> Self {
        BvhScene {
            next_geom_id: 0,
            primitives: Vec::new(),
            nodes: Vec::new(),
        }
    }

    fn allocate_geom_id(&mut self) -> u32 {
        let id = self.next_geom_id;
        self.next_geom_id += 1;
        id
    }

    fn traverse<'a>(&'a self, ray: &Ray, mut visit: impl FnMut(&'a Primitive) -> bool) {
        if self.nodes.is_empty() {
            return;
        }
        let inv_dir = Vector3f::new(1.0 / ray.d.x, 1.0 / ray.d.y, 1.0 / ray.d.z);
        let dir_is_neg = [inv_dir.x < 0.0, inv_dir.y < 0.0, inv_dir.z < 0.0];
        let mut to_visit_offset = 0usize;
        let mut current = 0usize;
        let mut stack = [0usize; 64];
        loop {
            let node = &self.nodes[current];
            if node.bounds.intersect_p(ray) {
                if node.n_primitives > 0 {
                    let mut stop = false;
                    for i in 0..node.n_primitives as usize {
                        if visit(&self.primitives[node.offset as usize + i]) {
                            stop = true;
                        }
                    }
                    if stop {
                        return;
                    }
                    if to_visit_offset == 0 {
                        break;
                    }
                    to_visit_offset -= 1;
                    current = stack[to_visit_offset];
                } else if dir_is_neg[node.axis as usize] {
                    stack[to_visit_offset] = current + 1;
                    to_visit_offset += 1;
                    current = node.offset as usize;
                } else {
                    stack[to_visit_offset] = node.offset as usize;
                    to_visit_offset += 1;
                    current += 1;
                }
            } else {
                if to_visit_offset == 0 {
                    break;
                }
                to_visit_offset -= 1;
                current = stack[to_visit_offset];
            }
        }
    }
}

impl SceneHandle for BvhScene {
    fn attach_triangles(&mut self, triangles: &[(Point3f, Point3f, Point3f)]) -> u32 {
        let geom_id = self.allocate_geom_id();
        for &(p0, p1, p2) in triangles {
            self.primitives.push(Primitive::Triangle { p0, p1, p2, geom_id });
        }
        geom_id
    }

    fn attach_quads(&mut self, quads: &[[Point3f; 4]]) -> u32 {
        let geom_id = self.allocate_geom_id();
        for quad in quads {
            self.primitives.push(Primitive::Triangle {
                p0: quad[0],
                p1: quad[1],
                p2: quad[2],
                geom_id,
            });
            self.primitives.push(Primitive::Triangle {
                p0: quad[0],
                p1: quad[2],
                p2: quad[3],
                geom_id,
            });
        }
        geom_id
    }

    fn attach_spheres(&mut self, spheres: &[(Point3f, Float)]) -> u32 {
        let geom_id = self.allocate_geom_id();
        for &(center, radius) in spheres {
            self.primitives.push(Primitive::Sphere { center, radius, geom_id });
        }
        geom_id
    }

    fn attach_mesh(&mut self, vertices: &[Point3f], indices: &[[u32; 3]]) -> u32 {
        let geom_id = self.allocate_geom_id();
        for tri in indices {
            self.primitives.push(Primitive::Triangle {
                p0: vertices[tri[0] as usize],
                p1: vertices[tri[1] as usize],
                p2: vertices[tri[2] as usize],
                geom_id,
            });
        }
        geom_id
    }

    fn commit(&mut self) -> Result<(), crate::core::error::RenderError> {
        self.nodes.clear();
        if self.primitives.is_empty() {
            return Ok(());
        }
        let mut primitive_info: Vec<PrimitiveInfo> = self
            .primitives
            .iter()
            .enumerate()
            .map(|(i, p)| PrimitiveInfo::new(i, p.bounds()))
            .collect();
        let arena: Arena<BuildNode> = Arena::new();
        let mut total_nodes = 0usize;
        let mut ordered_prims = Vec::with_capacity(self.primitives.len());
        let n = primitive_info.len();
        let root = recursive_build(
            &arena,
            &self.primitives,
            &mut primitive_info,
            0,
            n,
            &mut total_nodes,
            &mut ordered_prims,
        );
        let mut nodes = Vec::with_capacity(total_nodes);
        let mut offset = 0usize;
        flatten(root, &mut nodes, &mut offset);
        self.nodes = nodes;
        self.primitives = ordered_prims;
        Ok(())
    }

    fn intersect1(&self, ray: &Ray) -> RayHit {
        let mut best = RayHit::miss();
        let mut t_max = ray.t_max;
        self.traverse(ray, |prim| {
            if let Some((t, uv, ng)) = prim.intersect(ray, t_max) {
                t_max = t;
                best = RayHit {
                    t,
                    uv,
                    ng,
                    geom_id: prim.geom_id(),
                };
            }
            false
        });
        best
    }

    fn occluded1(&self, ray: &Ray) -> bool {
        let mut hit = false;
        self.traverse(ray, |prim| {
            if prim.occluded(ray, ray.t_max) {
                hit = true;
                true
            } else {
                false
            }
        });
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_triangle_is_hit_head_on() {
        let mut scene = BvhScene::new();
        scene.attach_triangles(&[(
            Point3f::new(-1.0, -1.0, 0.0),
            Point3f::new(1.0, -1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        )]);
        scene.commit().unwrap();
        let ray = Ray::new(Point3f::new(0.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY);
        let hit = scene.intersect1(&ray);
        assert!(hit.is_hit());
        assert!((hit.t - 5.0).abs() < 1e-4);
    }

    #[test]
    fn miss_reports_invalid_geom_id() {
        let mut scene = BvhScene::new();
        scene.attach_spheres(&[(Point3f::new(10.0, 10.0, 10.0), 1.0)]);
        scene.commit().unwrap();
        let ray = Ray::new(Point3f::new(0.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY);
        let hit = scene.intersect1(&ray);
        assert!(!hit.is_hit());
        assert_eq!(hit.geom_id, GEOM_ID_INVALID);
    }

    #[test]
    fn sphere_is_occluded_but_not_distant_sphere() {
        let mut scene = BvhScene::new();
        scene.attach_spheres(&[(Point3f::new(0.0, 0.0, 0.0), 1.0)]);
        scene.commit().unwrap();
        let near = Ray::new(Point3f::new(0.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY);
        assert!(scene.occluded1(&near));
        let away = Ray::new(Point3f::new(0.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, -1.0), Float::INFINITY);
        assert!(!scene.occluded1(&away));
    }

    #[test]
    fn many_primitives_build_without_panicking() {
        let mut scene = BvhScene::new();
        let spheres: Vec<(Point3f, Float)> = (0..200)
            .map(|i| (Point3f::new(i as Float, 0.0, 0.0), 0.1))
            .collect();
        scene.attach_spheres(&spheres);
        scene.commit().unwrap();
        let ray = Ray::new(Point3f::new(100.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), Float::INFINITY);
        assert!(scene.intersect1(&ray).is_hit());
    }
}
