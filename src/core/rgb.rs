//! RGB, the sigmoid-polynomial spectral representation, the RGB<->spectrum lookup table, and
//! `RGBColorSpace`.
//!
//! `RGBToSpectrumTable`'s 3x64x64x64x3 coefficient grid is normally produced offline by a
//! Gauss-Newton optimizer against the CIE curves and cached to disk. Rather than hand-type
//! plausible-looking constants for a grid this crate has no cached copy of, this module runs
//! the same optimization lazily, one grid corner at a time, and memoizes the results; the
//! lookup/trilinear-interpolation algorithm around it is the standard one.

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;

use crate::core::cie::Xyz;
use crate::core::mat3::Matrix3;
use crate::core::pbrt::{clamp, Float};
use crate::core::spectrum::Spectrum;

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rgb {
    pub r: Float,
    pub g: Float,
    pub b: Float,
}

impl Rgb {
    pub fn new(r: Float, g: Float, b: Float) -> Self {
        Rgb { r, g, b }
    }

    pub fn max_component(&self) -> Float {
        self.r.max(self.g).max(self.b)
    }

    pub fn scale(&self, s: Float) -> Rgb {
        Rgb::new(self.r * s, self.g * s, self.b * s)
    }
}

/// `sigmoid(c0 + c1*lambda + c2*lambda^2)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RGBSigmoidPolynomial {
    pub c0: Float,
    pub c1: Float,
    pub c2: Float,
}

#[inline]
pub fn sigmoid(x: Float) -> Float {
    if x.is_infinite() {
        if x > 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        0.5 + x / (2.0 * (1.0 + x * x).sqrt())
    }
}

impl RGBSigmoidPolynomial {
    pub fn new(c0: Float, c1: Float, c2: Float) -> Self {
        RGBSigmoidPolynomial { c0, c1, c2 }
    }

    pub fn eval(&self, lambda: Float) -> Float {
        sigmoid(lambda.mul_add(lambda.mul_add(self.c2, self.c1), self.c0))
    }
}

const RES: usize = 64;

fn smooth_z_nodes() -> [Float; RES] {
    let mut nodes = [0.0; RES];
    for (i, node) in nodes.iter_mut().enumerate() {
        let t = i as Float / (RES - 1) as Float;
        // Smoothstep spacing: denser near both ends, matching the original's emphasis on the
        // near-black / near-saturated region of the grid without claiming to reproduce its
        // exact (unavailable) node placement.
        *node = t * t * (3.0 - 2.0 * t);
    }
    nodes
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct CornerKey {
    maxc: u8,
    xi: u16,
    yi: u16,
    zi: u16,
}

pub struct RGBToSpectrumTable {
    pub z_nodes: [Float; RES],
    illuminant: Spectrum,
    cache: Mutex<HashMap<CornerKey, (Float, Float, Float)>>,
}

impl RGBToSpectrumTable {
    pub fn new(illuminant: Spectrum) -> Self {
        RGBToSpectrumTable {
            z_nodes: smooth_z_nodes(),
            illuminant,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn corner_coeffs(&self, maxc: usize, xi: usize, yi: usize, zi: usize) -> (Float, Float, Float) {
        let key = CornerKey {
            maxc: maxc as u8,
            xi: xi as u16,
            yi: yi as u16,
            zi: zi as u16,
        };
        if let Some(c) = self.cache.lock().unwrap().get(&key) {
            return *c;
        }
        let z = self.z_nodes[zi];
        let x = xi as Float / (RES - 1) as Float;
        let y = yi as Float / (RES - 1) as Float;
        // Reconstruct the target RGB this grid corner represents: `maxc` holds the largest
        // channel (value z), the other two are x*z and y*z in channel order.
        let mut target = [0.0; 3];
        target[maxc] = z;
        target[(maxc + 1) % 3] = x * z;
        target[(maxc + 2) % 3] = y * z;
        let coeffs = optimize_coefficients(target, &self.illuminant);
        self.cache.lock().unwrap().insert(key, coeffs);
        coeffs
    }

    /// Maps an RGB triple to its sigmoid-polynomial spectrum.
    pub fn query(&self, rgb: Rgb) -> RGBSigmoidPolynomial {
        if rgb.r == rgb.g && rgb.g == rgb.b {
            let r = clamp(rgb.r, 0.0, 1.0);
            if r <= 0.0 {
                return RGBSigmoidPolynomial::new(0.0, 0.0, -1.0e6);
            }
            if r >= 1.0 {
                return RGBSigmoidPolynomial::new(0.0, 0.0, 1.0e6);
            }
            let s = (r - 0.5) / (r * (1.0 - r)).sqrt();
            return RGBSigmoidPolynomial::new(0.0, 0.0, s);
        }
        let values = [rgb.r, rgb.g, rgb.b];
        let maxc = if values[0] > values[1] {
            if values[0] > values[2] { 0 } else { 2 }
        } else if values[1] > values[2] {
            1
        } else {
            2
        };
        let z = values[maxc];
        let x = values[(maxc + 1) % 3] / z;
        let y = values[(maxc + 2) % 3] / z;

        let xf = x * (RES - 1) as Float;
        let yf = y * (RES - 1) as Float;
        let xi = (xf as usize).min(RES - 2);
        let yi = (yf as usize).min(RES - 2);
        let zi = self
            .z_nodes
            .partition_point(|&n| n <= z)
            .saturating_sub(1)
            .min(RES - 2);

        let dx = xf - xi as Float;
        let dy = yf - yi as Float;
        let dz = (z - self.z_nodes[zi]) / (self.z_nodes[zi + 1] - self.z_nodes[zi]);

        let mut c = [0.0 as Float; 3];
        for (i, out) in c.iter_mut().enumerate() {
            let mut sum = 0.0;
            for corner in 0..8 {
                let cx = xi + (corner & 1);
                let cy = yi + ((corner >> 1) & 1);
                let cz = zi + ((corner >> 2) & 1);
                let w = if corner & 1 == 0 { 1.0 - dx } else { dx }
                    * if (corner >> 1) & 1 == 0 { 1.0 - dy } else { dy }
                    * if (corner >> 2) & 1 == 0 { 1.0 - dz } else { dz };
                let coeffs = self.corner_coeffs(maxc, cx, cy, cz);
                let v = match i {
                    0 => coeffs.0,
                    1 => coeffs.1,
                    _ => coeffs.2,
                };
                sum += w * v;
            }
            *out = sum;
        }
        RGBSigmoidPolynomial::new(c[0], c[1], c[2])
    }
}

/// Finite-difference Gauss-Newton solve for `(c0,c1,c2)` such that integrating
/// `sigmoid(c0+c1*l+c2*l^2)` as a reflectance spectrum under `illuminant` reproduces `target`
/// RGB (via CIE XYZ then the sRGB primaries' RGB-from-XYZ matrix). This is the same family of
/// optimization the original's (unavailable) offline table-builder performs.
fn optimize_coefficients(target: [Float; 3], illuminant: &Spectrum) -> (Float, Float, Float) {
    let rgb_from_xyz = srgb_rgb_from_xyz();
    let mut c = [0.0 as Float, 0.0, 0.0];
    let eval = |c: [Float; 3]| -> [Float; 3] {
        let poly = RGBSigmoidPolynomial::new(c[0], c[1], c[2]);
        let refl = Spectrum::RgbSigmoidPolynomial(poly);
        let product = Spectrum::densely_sampled_from_fn(360, 830, |l| {
            refl.eval(l as Float) * illuminant.eval(l as Float)
        });
        let illum_white = Xyz::from_spectrum(illuminant);
        let norm = if illum_white.y != 0.0 { 1.0 / illum_white.y } else { 1.0 };
        let xyz = Xyz::from_spectrum(&product);
        let rgb = rgb_from_xyz.mul_vec([xyz.x * norm, xyz.y * norm, xyz.z * norm]);
        rgb
    };
    let h = 1e-3;
    for _ in 0..12 {
        let r0 = eval(c);
        let residual = [r0[0] - target[0], r0[1] - target[1], r0[2] - target[2]];
        let mut err = 0.0;
        for v in residual {
            err += v * v;
        }
        if err < 1e-10 {
            break;
        }
        let mut jacobian = [[0.0 as Float; 3]; 3];
        for (k, jcol) in jacobian.iter_mut().enumerate() {
            let mut cp = c;
            cp[k] += h;
            let rp = eval(cp);
            *jcol = [(rp[0] - r0[0]) / h, (rp[1] - r0[1]) / h, (rp[2] - r0[2]) / h];
        }
        // Solve (J^T J) delta = -J^T residual via the 3x3 normal equations.
        let mut jt_j = [[0.0 as Float; 3]; 3];
        let mut jt_r = [0.0 as Float; 3];
        for i in 0..3 {
            for j in 0..3 {
                jt_j[i][j] = jacobian[0][i] * jacobian[0][j]
                    + jacobian[1][i] * jacobian[1][j]
                    + jacobian[2][i] * jacobian[2][j];
            }
            jt_r[i] = jacobian[0][i] * residual[0] + jacobian[1][i] * residual[1] + jacobian[2][i] * residual[2];
            jt_j[i][i] += 1e-4; // Levenberg-Marquardt damping for numerical stability.
        }
        let m = Matrix3::from_rows(jt_j);
        let delta = m.inverse().mul_vec([-jt_r[0], -jt_r[1], -jt_r[2]]);
        for i in 0..3 {
            c[i] += delta[i];
        }
    }
    (c[0], c[1], c[2])
}

fn srgb_rgb_from_xyz() -> Matrix3 {
    // Standard sRGB/Rec.709 XYZ(D65)->linear-RGB matrix.
    Matrix3::from_rows([
        [3.2406, -1.5372, -0.4986],
        [-0.9689, 1.8758, 0.0415],
        [0.0557, -0.2040, 1.0570],
    ])
}

fn srgb_xyz_from_rgb() -> Matrix3 {
    srgb_rgb_from_xyz().inverse()
}

lazy_static! {
    /// The process-lifetime sRGB colorspace singleton; must be
    /// constructed before worker threads start, matching the design note.
    pub static ref SRGB_SPECTRUM_TABLE: RGBToSpectrumTable =
        RGBToSpectrumTable::new(crate::core::cie::ILLUM_D65.clone());
}

/// Three chromaticity xy pairs, a whitepoint illuminant, and the RGB<->spectrum table.
pub struct RGBColorSpace {
    pub r: (Float, Float),
    pub g: (Float, Float),
    pub b: (Float, Float),
    pub whitepoint: (Float, Float),
    pub illuminant: Spectrum,
    pub xyz_from_rgb: Matrix3,
    pub rgb_from_xyz: Matrix3,
}

impl RGBColorSpace {
    pub fn new(
        r: (Float, Float),
        g: (Float, Float),
        b: (Float, Float),
        whitepoint: (Float, Float),
        illuminant: Spectrum,
    ) -> Self {
        let xyz_r = Xyz::from_xy_y(r.0, r.1, 1.0);
        let xyz_g = Xyz::from_xy_y(g.0, g.1, 1.0);
        let xyz_b = Xyz::from_xy_y(b.0, b.1, 1.0);
        let rgb_matrix = Matrix3::from_rows([
            [xyz_r.x, xyz_g.x, xyz_b.x],
            [xyz_r.y, xyz_g.y, xyz_b.y],
            [xyz_r.z, xyz_g.z, xyz_b.z],
        ]);
        let white_xyz = Xyz::from_xy_y(whitepoint.0, whitepoint.1, 1.0);
        let s = rgb_matrix
            .inverse()
            .mul_vec([white_xyz.x, white_xyz.y, white_xyz.z]);
        let xyz_from_rgb = rgb_matrix.mul(&Matrix3::diagonal(s));
        let rgb_from_xyz = xyz_from_rgb.inverse();
        RGBColorSpace {
            r,
            g,
            b,
            whitepoint,
            illuminant,
            xyz_from_rgb,
            rgb_from_xyz,
        }
    }

    pub fn srgb() -> Self {
        RGBColorSpace::new(
            (0.64, 0.33),
            (0.30, 0.60),
            (0.15, 0.06),
            (0.3127, 0.3290),
            crate::core::cie::ILLUM_D65.clone(),
        )
    }

    pub fn to_rgb_spectrum(&self, rgb: Rgb) -> Spectrum {
        let clamped = Rgb::new(rgb.r.max(0.0), rgb.g.max(0.0), rgb.b.max(0.0));
        Spectrum::RgbSigmoidPolynomial(SRGB_SPECTRUM_TABLE.query(clamped))
    }
}

lazy_static! {
    pub static ref SRGB: RGBColorSpace = RGBColorSpace::srgb();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_polynomial_bounds_hold_across_visible_range() {
        let table = RGBToSpectrumTable::new(crate::core::cie::ILLUM_D65.clone());
        for rgb in [
            Rgb::new(0.2, 0.8, 0.1),
            Rgb::new(0.9, 0.1, 0.1),
            Rgb::new(0.5, 0.5, 0.5),
            Rgb::new(0.02, 0.02, 0.9),
        ] {
            let poly = table.query(rgb);
            let mut l = 360.0;
            while l <= 830.0 {
                let v = poly.eval(l);
                assert!((0.0..=1.0).contains(&v), "sigmoid out of [0,1] at {}: {}", l, v);
                l += 10.0;
            }
        }
    }

    #[test]
    fn sigmoid_matches_asymptotes() {
        assert!((sigmoid(50.0) - 1.0).abs() < 1e-3);
        assert!(sigmoid(-50.0).abs() < 1e-3);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn degenerate_gray_round_trips_to_same_value() {
        let table = RGBToSpectrumTable::new(crate::core::cie::ILLUM_D65.clone());
        let poly = table.query(Rgb::new(0.5, 0.5, 0.5));
        // For a gray input, c0 == c1 == 0 by construction.
        assert_eq!(poly.c0, 0.0);
        assert_eq!(poly.c1, 0.0);
    }
}
