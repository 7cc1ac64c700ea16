//! The public driver: validates `RenderConfig`, spawns the worker pool,
//! drives each thread's tile loop over `blockqueue::BlockQueue`'s lock-free cursor, and runs
//! the denoiser once after `join`.

use std::thread;

use crate::blockqueue::BlockQueue;
use crate::cameras::Camera;
use crate::core::error::RenderError;
use crate::core::pbrt::Float;
use crate::core::sensor::PixelSensor;
use crate::core::spectrum::WavelengthSample;
use crate::denoise::{Denoiser, NoopDenoiser};
use crate::film::{Film, RenderResult};
use crate::integrators::sample_path;
use crate::samplers::Sampler;
use crate::scene::Scene;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub max_bounces: u32,
    pub scrambling_seed: u32,
    pub tile_size: usize,
    pub imaging_ratio: Float,
    pub gamma: Float,
    pub use_halton: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 640,
            height: 480,
            samples_per_pixel: 16,
            max_bounces: 8,
            scrambling_seed: 0,
            tile_size: crate::blockqueue::TILE,
            imaging_ratio: 1.0,
            gamma: 1.0,
            use_halton: true,
        }
    }
}

fn validate(config: &RenderConfig) -> Result<(), RenderError> {
    if config.width == 0 || config.height == 0 {
        return Err(RenderError::Configuration("image dimensions must be nonzero".into()));
    }
    if config.samples_per_pixel == 0 {
        return Err(RenderError::Configuration("samples_per_pixel must be nonzero".into()));
    }
    if config.max_bounces == 0 {
        return Err(RenderError::Configuration("max_bounces must be nonzero".into()));
    }
    Ok(())
}

/// Renders `scene` as seen by `camera` under `config`. Validates configuration before
/// spawning any worker thread; geometry-backend `commit()` must already have been called on
/// `scene`.
pub fn render(camera: &Camera, scene: &Scene, config: &RenderConfig) -> Result<RenderResult, RenderError> {
    validate(config)?;

    let width = config.width;
    let height = config.height;
    let total_pixels = (width as usize) * (height as usize);
    let queue = BlockQueue::with_tile(total_pixels, config.tile_size);
    let sensor = PixelSensor::cie_xyz(config.imaging_ratio);

    let tile_size = config.tile_size.max(1);
    let tile_count = (total_pixels + tile_size - 1) / tile_size;
    let n_threads = thread::available_parallelism().map(|n| n.get()).unwrap_or(1).min(tile_count.max(1));

    eprintln!("rendering {}x{} at {} spp across {} threads", width, height, config.samples_per_pixel, n_threads);

    let film = thread::scope(|scope| {
        let mut films: Vec<Film> = Vec::new();
        let handles: Vec<_> = (0..n_threads)
            .map(|_| {
                let queue = &queue;
                let sensor = &sensor;
                scope.spawn(move || render_worker(queue, camera, scene, sensor, config))
            })
            .collect();
        for handle in handles {
            films.push(handle.join().expect("render worker panicked"));
        }
        merge_films(films, width, height)
    });

    let mut result = film.finish(config.gamma);
    let denoiser: &dyn Denoiser = &NoopDenoiser;
    denoiser.denoise(&mut result.color, Some(&result.normal), Some(&result.albedo), width, height);
    Ok(result)
}

fn merge_films(films: Vec<Film>, width: u32, height: u32) -> Film {
    let mut merged = Film::new(width, height);
    for film in films {
        merged.merge(film);
    }
    merged
}

fn render_worker(queue: &BlockQueue, camera: &Camera, scene: &Scene, sensor: &PixelSensor, config: &RenderConfig) -> Film {
    let mut film = Film::new(config.width, config.height);
    let mut sampler = if config.use_halton {
        Sampler::halton(config.samples_per_pixel, (config.width, config.height), config.scrambling_seed)
    } else {
        Sampler::independent(config.samples_per_pixel)
    };

    while let Some(block) = queue.next() {
        for pixel_index in block.start..block.end {
            let x = (pixel_index % config.width as usize) as u32;
            let y = (pixel_index / config.width as usize) as u32;
            let flipped_y = config.height - 1 - y;

            for sample_index in 0..config.samples_per_pixel {
                sampler.start_pixel_sample((x, y), pixel_index as u64, sample_index as u64);
                let jitter = sampler.sample_pixel();
                let wavelength_u = sampler.get_1d();
                let wavelengths = WavelengthSample::uniform(wavelength_u);
                let u = x as Float + jitter.x;
                let v = flipped_y as Float + jitter.y;
                let ray = camera.cast_ray(u, v);

                let sample = sample_path(scene, ray, &wavelengths, &mut sampler, config.max_bounces);
                let color = sensor.to_sensor_rgb(sample.l, &wavelengths);
                let albedo = sample.albedo.map(|a| {
                    let rgb = sensor.to_sensor_rgb(a, &wavelengths);
                    [rgb.b, rgb.g, rgb.r]
                });
                let normal = sample.normal.map(|n| [n.z, n.y, n.x]);
                film.add_sample(x, flipped_y, [color.b, color.g, color.r], albedo, normal);
            }
        }
    }

    film
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_are_rejected_before_any_thread_spawns() {
        let config = RenderConfig { width: 0, ..RenderConfig::default() };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_samples_are_rejected() {
        let config = RenderConfig { samples_per_pixel: 0, ..RenderConfig::default() };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&RenderConfig::default()).is_ok());
    }

    #[test]
    fn renders_a_tiny_empty_scene_without_panicking() {
        let mut scene = Scene::new();
        scene.commit().unwrap();
        let camera = Camera::new(4, 4, std::f32::consts::FRAC_PI_2, &crate::core::transform::Transform::identity());
        let config = RenderConfig { width: 4, height: 4, samples_per_pixel: 2, max_bounces: 2, ..RenderConfig::default() };
        let result = render(&camera, &scene, &config).unwrap();
        assert_eq!(result.width, 4);
        assert_eq!(result.height, 4);
        assert_eq!(result.color.len(), 48);
    }

    #[test]
    fn a_single_worker_matches_the_merged_multi_worker_film() {
        let mut scene = Scene::new();
        scene.commit().unwrap();
        let camera = Camera::new(4, 4, std::f32::consts::FRAC_PI_2, &crate::core::transform::Transform::identity());
        let config = RenderConfig { width: 4, height: 4, samples_per_pixel: 4, max_bounces: 2, ..RenderConfig::default() };
        let sensor = PixelSensor::cie_xyz(config.imaging_ratio);

        let queue = BlockQueue::with_tile(16, config.tile_size);
        let single = render_worker(&queue, &camera, &scene, &sensor, &config);

        let queue = BlockQueue::with_tile(16, 1);
        let merged = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let queue = &queue;
                    let sensor = &sensor;
                    let camera = &camera;
                    let scene = &scene;
                    let config = &config;
                    scope.spawn(move || render_worker(queue, camera, scene, sensor, config))
                })
                .collect();
            let films: Vec<Film> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            merge_films(films, 4, 4)
        });

        let a = single.finish(config.gamma);
        let b = merged.finish(config.gamma);
        assert_eq!(a.color, b.color);
    }
}
