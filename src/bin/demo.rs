//! A minimal end-to-end example: a single sphere and a quad light, rendered to `demo.png`.

use prism_render::cameras::Camera;
use prism_render::core::geometry::{Point3f, Vector3f};
use prism_render::core::rgb::Rgb;
use prism_render::core::spectrum::Spectrum;
use prism_render::core::transform::Transform;
use prism_render::lights::Light;
use prism_render::materials::Material;
use prism_render::render::{render, RenderConfig};
use prism_render::scene::Scene;
use prism_render::shapes::Shape;
use prism_render::textures::Texture;

fn main() {
    let mut scene = Scene::new();

    scene.add_sphere(
        Point3f::new(0.0, 0.0, -2.0),
        0.5,
        Material::Diffuse(Texture::solid_rgb(Rgb::new(0.6, 0.2, 0.2))),
    );
    scene.add_plane(
        Point3f::new(0.0, -0.5, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        5.0,
        Material::Diffuse(Texture::solid_rgb(Rgb::new(0.7, 0.7, 0.7))),
    );
    scene.add_light(Light::Area {
        shape: Shape::Quad {
            p0: Point3f::new(-1.0, 2.0, -3.0),
            p1: Point3f::new(1.0, 2.0, -3.0),
            p2: Point3f::new(1.0, 2.0, -1.0),
            p3: Point3f::new(-1.0, 2.0, -1.0),
        },
        spectrum: Spectrum::constant(8.0),
        scale: 1.0,
        two_sided: true,
    });

    scene.commit().expect("failed to build acceleration structure");

    let camera = Camera::new(320, 240, std::f32::consts::FRAC_PI_3, &Transform::identity());
    let config = RenderConfig { width: 320, height: 240, samples_per_pixel: 32, max_bounces: 6, ..RenderConfig::default() };

    let result = render(&camera, &scene, &config).expect("render failed");
    result.save_png("demo.png").expect("failed to write demo.png");
    eprintln!("wrote demo.png ({}x{})", result.width, result.height);
}
