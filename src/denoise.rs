//! The denoiser interface: takes `(color, normal?, albedo?)` buffers and overwrites color,
//! run once serially after all tiles join. Shaped as a trait so an Open Image Denoise binding
//! stays swappable — this crate ships only the identity denoiser, since linking against OIDN
//! is an external dependency left to the embedder.

use crate::core::pbrt::Float;

pub trait Denoiser {
    /// `color` is `width*height*3` floats, BGR, gamma-free; overwritten in place. `normal`/
    /// `albedo` are the same shape, read-only auxiliary hints.
    fn denoise(&self, color: &mut [Float], normal: Option<&[Float]>, albedo: Option<&[Float]>, width: u32, height: u32);
}

/// Leaves `color` untouched; the default when no external denoiser is wired in.
pub struct NoopDenoiser;

impl Denoiser for NoopDenoiser {
    fn denoise(&self, _color: &mut [Float], _normal: Option<&[Float]>, _albedo: Option<&[Float]>, _width: u32, _height: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_denoiser_leaves_color_unchanged() {
        let denoiser = NoopDenoiser;
        let mut color = vec![0.1, 0.2, 0.3, 0.4];
        let before = color.clone();
        denoiser.denoise(&mut color, None, None, 2, 1);
        assert_eq!(color, before);
    }
}
