//! The `Shape` capability: purely a surface for the external intersector — ray intersection
//! itself lives in `accelerators::bvh`. What `Shape` owns is everything the scene façade and
//! `AreaLight` need *without* a ray: surface area (for `pdf_a = 1/area`), uniform point sampling
//! (for NEE), and a bounding box. A closed enum over the four shape kinds.

use crate::core::geometry::{vec3_cross_vec3, Bounds3f, Point3f, Vector3f};
use crate::core::pbrt::Float;
use crate::core::sampling::sample_uniform_triangle;

#[derive(Debug, Clone)]
pub enum Shape {
    Triangle {
        p0: Point3f,
        p1: Point3f,
        p2: Point3f,
    },
    /// Four vertices wound clockwise around the outward face, treated as two triangles.
    Quad {
        p0: Point3f,
        p1: Point3f,
        p2: Point3f,
        p3: Point3f,
    },
    Sphere {
        center: Point3f,
        radius: Float,
    },
    TriangleMesh {
        vertices: Vec<Point3f>,
        indices: Vec<[u32; 3]>,
    },
}

fn triangle_area(p0: Point3f, p1: Point3f, p2: Point3f) -> Float {
    0.5 * vec3_cross_vec3(&(p1 - p0), &(p2 - p0)).length()
}

fn triangle_normal(p0: Point3f, p1: Point3f, p2: Point3f) -> Vector3f {
    vec3_cross_vec3(&(p1 - p0), &(p2 - p0)).normalize()
}

fn sample_triangle_point(p0: Point3f, p1: Point3f, p2: Point3f, u1: Float, u2: Float) -> Point3f {
    let (b0, b1) = sample_uniform_triangle(u1, u2);
    let b2 = 1.0 - b0 - b1;
    Point3f::new(
        b0 * p0.x + b1 * p1.x + b2 * p2.x,
        b0 * p0.y + b1 * p1.y + b2 * p2.y,
        b0 * p0.z + b1 * p1.z + b2 * p2.z,
    )
}

impl Shape {
    pub fn area(&self) -> Float {
        match self {
            Shape::Triangle { p0, p1, p2 } => triangle_area(*p0, *p1, *p2),
            Shape::Quad { p0, p1, p2, p3 } => {
                triangle_area(*p0, *p1, *p2) + triangle_area(*p0, *p2, *p3)
            }
            Shape::Sphere { radius, .. } => 4.0 * crate::core::pbrt::PI * radius * radius,
            Shape::TriangleMesh { vertices, indices } => indices
                .iter()
                .map(|tri| {
                    triangle_area(
                        vertices[tri[0] as usize],
                        vertices[tri[1] as usize],
                        vertices[tri[2] as usize],
                    )
                })
                .sum(),
        }
    }

    pub fn bounds(&self) -> Bounds3f {
        match self {
            Shape::Triangle { p0, p1, p2 } => {
                Bounds3f::from_point(*p0).union_point(*p1).union_point(*p2)
            }
            Shape::Quad { p0, p1, p2, p3 } => Bounds3f::from_point(*p0)
                .union_point(*p1)
                .union_point(*p2)
                .union_point(*p3),
            Shape::Sphere { center, radius } => Bounds3f {
                p_min: Point3f::new(center.x - radius, center.y - radius, center.z - radius),
                p_max: Point3f::new(center.x + radius, center.y + radius, center.z + radius),
            },
            Shape::TriangleMesh { vertices, .. } => vertices
                .iter()
                .fold(Bounds3f::default(), |b, p| b.union_point(*p)),
        }
    }

    /// Uniformly samples a point and the outward normal there, for `AreaLight` NEE.
    /// `u` is `(u1, u2)`; an additional third coordinate selects among sub-triangles for `Quad`
    /// and `TriangleMesh`, threaded through `u.0`'s fractional remainder after the selection so
    /// the caller only needs to supply two numbers.
    pub fn sample(&self, u: (Float, Float)) -> (Point3f, Vector3f) {
        match self {
            Shape::Triangle { p0, p1, p2 } => {
                (sample_triangle_point(*p0, *p1, *p2, u.0, u.1), triangle_normal(*p0, *p1, *p2))
            }
            Shape::Quad { p0, p1, p2, p3 } => {
                let area_a = triangle_area(*p0, *p1, *p2);
                let area_b = triangle_area(*p0, *p2, *p3);
                let total = area_a + area_b;
                if total <= 0.0 || u.0 * total < area_a {
                    (
                        sample_triangle_point(*p0, *p1, *p2, u.0, u.1),
                        triangle_normal(*p0, *p1, *p2),
                    )
                } else {
                    (
                        sample_triangle_point(*p0, *p2, *p3, u.0, u.1),
                        triangle_normal(*p0, *p2, *p3),
                    )
                }
            }
            Shape::Sphere { center, radius } => {
                let n = crate::core::sampling::sample_uniform_sphere(u.0, u.1);
                (*center + n * *radius, n)
            }
            Shape::TriangleMesh { vertices, indices } => {
                let areas: Vec<Float> = indices
                    .iter()
                    .map(|tri| {
                        triangle_area(
                            vertices[tri[0] as usize],
                            vertices[tri[1] as usize],
                            vertices[tri[2] as usize],
                        )
                    })
                    .collect();
                let total: Float = areas.iter().sum();
                let mut target = u.0 * total.max(1e-12);
                let mut chosen = indices.len().saturating_sub(1);
                for (i, a) in areas.iter().enumerate() {
                    if target < *a {
                        chosen = i;
                        break;
                    }
                    target -= a;
                }
                let tri = indices[chosen];
                let (p0, p1, p2) = (
                    vertices[tri[0] as usize],
                    vertices[tri[1] as usize],
                    vertices[tri[2] as usize],
                );
                (sample_triangle_point(p0, p1, p2, u.0, u.1), triangle_normal(p0, p1, p2))
            }
        }
    }

    /// Spheres derive UV from the geometric normal rather than the intersector; not needed by
    /// `Triangle`/`Quad`/`TriangleMesh`, whose UV comes straight from barycentric coordinates.
    pub fn is_sphere(&self) -> bool {
        matches!(self, Shape::Sphere { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_area_matches_known_right_triangle() {
        let shape = Shape::Triangle {
            p0: Point3f::new(0.0, 0.0, 0.0),
            p1: Point3f::new(1.0, 0.0, 0.0),
            p2: Point3f::new(0.0, 1.0, 0.0),
        };
        assert!((shape.area() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sphere_area_matches_formula() {
        let shape = Shape::Sphere { center: Point3f::new(0.0, 0.0, 0.0), radius: 2.0 };
        let expected = 4.0 * crate::core::pbrt::PI * 4.0;
        assert!((shape.area() - expected).abs() < 1e-3);
    }

    #[test]
    fn sampled_sphere_points_lie_on_the_sphere() {
        let shape = Shape::Sphere { center: Point3f::new(1.0, 2.0, 3.0), radius: 2.0 };
        for i in 0..20 {
            let u = (i as Float / 20.0, (i * 7 % 20) as Float / 20.0);
            let (p, n) = shape.sample(u);
            let d = (p - Point3f::new(1.0, 2.0, 3.0)).length();
            assert!((d - 2.0).abs() < 1e-4);
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn quad_sample_lands_within_bounds() {
        let shape = Shape::Quad {
            p0: Point3f::new(-1.0, -1.0, 0.0),
            p1: Point3f::new(1.0, -1.0, 0.0),
            p2: Point3f::new(1.0, 1.0, 0.0),
            p3: Point3f::new(-1.0, 1.0, 0.0),
        };
        let (p, n) = shape.sample((0.3, 0.6));
        assert!(p.x >= -1.0 && p.x <= 1.0 && p.y >= -1.0 && p.y <= 1.0);
        assert!((n.z.abs() - 1.0).abs() < 1e-4);
    }
}
