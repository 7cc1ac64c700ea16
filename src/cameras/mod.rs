//! The perspective pinhole camera. The constructor computes `viewport_bottom_left` and
//! `pixel_delta_u`/`pixel_delta_v` once from the camera-to-world transform; `cast_ray(u, v)` is
//! then just a weighted sum of those.

use crate::core::geometry::{vec3_cross_vec3, Point3f, Ray, Vector3f};
use crate::core::pbrt::Float;
use crate::core::transform::Transform;

pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,
    pos: Point3f,
    viewport_bottom_left: Point3f,
    pixel_delta_u: Vector3f,
    pixel_delta_v: Vector3f,
}

impl Camera {
    /// `fov` is the full vertical field of view, in radians. `transform` places the camera in
    /// world space: its origin becomes the eye, `-z` becomes the look direction, `+y` becomes
    /// up, matching the original's right-handed, camera-looks-down-−z convention.
    pub fn new(image_width: u32, image_height: u32, fov: Float, transform: &Transform) -> Self {
        let viewport_height = 2.0 * (fov * 0.5).tan();
        let viewport_width = viewport_height * image_width as Float / image_height as Float;

        let pos = transform.apply_point(Point3f::new(0.0, 0.0, 0.0));
        let look_at = transform.apply_vector(Vector3f::new(0.0, 0.0, -1.0)).normalize();
        let up = transform.apply_vector(Vector3f::new(0.0, 1.0, 0.0)).normalize();
        let right = vec3_cross_vec3(&look_at, &up);

        let viewport_u = right * viewport_width;
        let viewport_v = up * viewport_height;

        let pixel_delta_u = viewport_u / image_width as Float;
        let pixel_delta_v = viewport_v / image_height as Float;

        let viewport_bottom_left = pos + look_at - viewport_u * 0.5 - viewport_v * 0.5;

        Camera { image_width, image_height, pos, viewport_bottom_left, pixel_delta_u, pixel_delta_v }
    }

    /// `(u, v)` are continuous pixel coordinates with `v = 0` at the bottom row.
    pub fn cast_ray(&self, u: Float, v: Float) -> Ray {
        let target = self.viewport_bottom_left + self.pixel_delta_u * u + self.pixel_delta_v * v;
        Ray::new(self.pos, target - self.pos, Float::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_looks_down_negative_z() {
        let camera = Camera::new(100, 100, std::f32::consts::FRAC_PI_2, &Transform::identity());
        let ray = camera.cast_ray(50.0, 50.0);
        assert!(ray.d.z < 0.0);
        assert!(ray.d.x.abs() < 1e-3);
        assert!(ray.d.y.abs() < 1e-3);
    }

    #[test]
    fn corners_diverge_symmetrically_from_center() {
        let camera = Camera::new(100, 100, std::f32::consts::FRAC_PI_2, &Transform::identity());
        let center = camera.cast_ray(50.0, 50.0).d;
        let left = camera.cast_ray(0.0, 50.0).d;
        let right = camera.cast_ray(100.0, 50.0).d;
        assert!(left.x < center.x);
        assert!(right.x > center.x);
    }

    #[test]
    fn translated_camera_moves_the_ray_origin() {
        let transform = Transform::translate(Vector3f::new(0.0, 0.0, 5.0));
        let camera = Camera::new(10, 10, std::f32::consts::FRAC_PI_2, &transform);
        let ray = camera.cast_ray(5.0, 5.0);
        assert!((ray.o.z - 5.0).abs() < 1e-4);
    }
}
