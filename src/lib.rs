#[macro_use]
extern crate impl_ops;

pub mod accelerators;
pub mod blockqueue;
pub mod cameras;
pub mod core;
pub mod denoise;
pub mod film;
pub mod integrators;
pub mod lights;
pub mod materials;
pub mod obj;
pub mod render;
pub mod samplers;
pub mod scene;
pub mod shapes;
pub mod textures;
