//! The BxDF family: Diffuse, Conductor, Dielectric, ThinDielectric; Fresnel (real & complex);
//! the Trowbridge-Reitz microfacet distribution with visible-normal sampling; and the `Bsdf`
//! wrapper that translates between render space and the BxDF's local frame. Dispatch is a
//! tagged `BxDF` enum of structs sharing a small set of methods; see DESIGN.md for why the
//! Fourier-BSDF-table machinery this family once carried was cut.

use num::complex::Complex32;

use crate::core::geometry::{vec3_cross_vec3, vec3_dot_vec3f, OrthonormalBasis, Vector3f};
use crate::core::pbrt::{clamp, Float, INV_PI, N_SPECTRUM_SAMPLES, PI};
use crate::core::sampling::{sample_cosine_hemisphere, sample_uniform_disk_concentric};
use crate::core::spectrum::SpectrumSample;

pub const BSDF_REFLECTION: u8 = 1 << 0;
pub const BSDF_TRANSMISSION: u8 = 1 << 1;
pub const BSDF_SPECULAR: u8 = 1 << 2;
pub const BSDF_DIFFUSE: u8 = 1 << 3;
pub const BSDF_GLOSSY: u8 = 1 << 4;

#[inline]
pub fn cos_theta(w: &Vector3f) -> Float {
    w.z
}
#[inline]
pub fn abs_cos_theta(w: &Vector3f) -> Float {
    w.z.abs()
}
#[inline]
pub fn cos2_theta(w: &Vector3f) -> Float {
    w.z * w.z
}
#[inline]
pub fn sin2_theta(w: &Vector3f) -> Float {
    (1.0 - cos2_theta(w)).max(0.0)
}
#[inline]
pub fn tan2_theta(w: &Vector3f) -> Float {
    sin2_theta(w) / cos2_theta(w)
}
#[inline]
pub fn cos_phi(w: &Vector3f) -> Float {
    let sin_theta = sin2_theta(w).sqrt();
    if sin_theta == 0.0 {
        1.0
    } else {
        clamp(w.x / sin_theta, -1.0, 1.0)
    }
}
#[inline]
pub fn sin_phi(w: &Vector3f) -> Float {
    let sin_theta = sin2_theta(w).sqrt();
    if sin_theta == 0.0 {
        0.0
    } else {
        clamp(w.y / sin_theta, -1.0, 1.0)
    }
}
#[inline]
pub fn same_hemisphere(a: &Vector3f, b: &Vector3f) -> bool {
    a.z * b.z > 0.0
}

pub fn reflect(wo: &Vector3f, n: &Vector3f) -> Vector3f {
    -*wo + *n * (2.0 * vec3_dot_vec3f(wo, n))
}

/// Snell's-law refraction through a macroscopic normal. Returns `(wt, etap)` where `etap` is
/// the relative IOR to report on the `BsdfSample`.
pub fn refract(wi: &Vector3f, n: &Vector3f, eta: Float) -> Option<(Vector3f, Float)> {
    let mut cos_theta_i = vec3_dot_vec3f(n, wi);
    let (mut eta, mut n) = (eta, *n);
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
        n = -n;
    }
    let sin2_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0);
    let sin2_theta_t = sin2_theta_i / (eta * eta);
    if sin2_theta_t >= 1.0 {
        return None; // total internal reflection
    }
    let cos_theta_t = (1.0 - sin2_theta_t).max(0.0).sqrt();
    let wt = -*wi / eta + n * (cos_theta_i / eta - cos_theta_t);
    Some((wt, eta))
}

/// The standard unpolarized Fresnel reflectance for a real (dielectric) IOR.
pub fn fr_dielectric(cos_theta_i: Float, eta: Float) -> Float {
    let mut cos_theta_i = clamp(cos_theta_i, -1.0, 1.0);
    let mut eta = eta;
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
    }
    let sin2_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0);
    let sin2_theta_t = sin2_theta_i / (eta * eta);
    if sin2_theta_t >= 1.0 {
        return 1.0;
    }
    let cos_theta_t = (1.0 - sin2_theta_t).max(0.0).sqrt();
    let r_parl = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    let r_perp = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);
    (r_parl * r_parl + r_perp * r_perp) / 2.0
}

/// The same Fresnel formulas with complex arithmetic for a conductor's complex IOR.
pub fn fr_complex(cos_theta_i: Float, eta: Complex32) -> Float {
    let cos_theta_i = clamp(cos_theta_i, 0.0, 1.0);
    let sin2_theta_i = 1.0 - cos_theta_i * cos_theta_i;
    let sin2_theta_t = Complex32::new(sin2_theta_i, 0.0) / (eta * eta);
    let cos_theta_t = (Complex32::new(1.0, 0.0) - sin2_theta_t).sqrt();
    let r_parl = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    let r_perp = (Complex32::new(cos_theta_i, 0.0) - eta * cos_theta_t)
        / (Complex32::new(cos_theta_i, 0.0) + eta * cos_theta_t);
    (r_parl.norm_sqr() + r_perp.norm_sqr()) / 2.0
}

/// Channel-wise complex Fresnel across the four hero wavelengths' `(eta, k)` spectra.
pub fn fr_complex_spectrum(cos_theta_i: Float, eta: &SpectrumSample, k: &SpectrumSample) -> SpectrumSample {
    let mut values = [0.0; N_SPECTRUM_SAMPLES];
    for i in 0..N_SPECTRUM_SAMPLES {
        values[i] = fr_complex(cos_theta_i, Complex32::new(eta.values[i], k.values[i]));
    }
    SpectrumSample {
        values,
        lambda: eta.lambda,
    }
}

/// Anisotropic Trowbridge-Reitz (GGX) microfacet distribution.
#[derive(Debug, Copy, Clone)]
pub struct TrowbridgeReitzDistribution {
    pub alpha_x: Float,
    pub alpha_y: Float,
}

impl TrowbridgeReitzDistribution {
    pub fn new(alpha_x: Float, alpha_y: Float) -> Self {
        TrowbridgeReitzDistribution { alpha_x, alpha_y }
    }

    pub fn is_smooth(&self) -> bool {
        self.alpha_x.max(self.alpha_y) < 1e-3
    }

    pub fn d(&self, wm: &Vector3f) -> Float {
        let tan2_theta_m = tan2_theta(wm);
        if tan2_theta_m.is_infinite() {
            return 0.0;
        }
        let cos4_theta_m = cos2_theta(wm) * cos2_theta(wm);
        if cos4_theta_m < 1e-16 {
            return 0.0;
        }
        let e = tan2_theta_m
            * ((cos_phi(wm) / self.alpha_x).powi(2) + (sin_phi(wm) / self.alpha_y).powi(2));
        let denom = PI * self.alpha_x * self.alpha_y * cos4_theta_m * (1.0 + e) * (1.0 + e);
        1.0 / denom
    }

    fn lambda(&self, w: &Vector3f) -> Float {
        let tan2_theta_w = tan2_theta(w);
        if tan2_theta_w.is_infinite() {
            return 0.0;
        }
        let alpha2 = cos_phi(w).powi(2) * self.alpha_x * self.alpha_x
            + sin_phi(w).powi(2) * self.alpha_y * self.alpha_y;
        ((1.0 + alpha2 * tan2_theta_w).sqrt() - 1.0) / 2.0
    }

    pub fn g1(&self, w: &Vector3f) -> Float {
        1.0 / (1.0 + self.lambda(w))
    }

    pub fn g(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
    }

    pub fn d_visible(&self, w: &Vector3f, wm: &Vector3f) -> Float {
        self.g1(w) / abs_cos_theta(w) * self.d(wm) * vec3_dot_vec3f(w, wm).abs()
    }

    pub fn pdf(&self, w: &Vector3f, wm: &Vector3f) -> Float {
        self.d_visible(w, wm)
    }

    /// Heitz's visible-normal sampling routine, in the distribution's own stretched space.
    pub fn sample_wm(&self, w: &Vector3f, u: (Float, Float)) -> Vector3f {
        let wh = Vector3f::new(self.alpha_x * w.x, self.alpha_y * w.y, w.z).normalize();
        let wh = if wh.z < 0.0 { -wh } else { wh };

        let t1 = if wh.z < 0.999 {
            vec3_cross_vec3(&Vector3f::new(0.0, 0.0, 1.0), &wh).normalize()
        } else {
            Vector3f::new(1.0, 0.0, 0.0)
        };
        let t2 = vec3_cross_vec3(&wh, &t1);

        let (px, mut py) = sample_uniform_disk_concentric(u.0, u.1);
        let h = (1.0 - px * px).max(0.0).sqrt();
        py = crate::core::pbrt::lerp((1.0 + wh.z) / 2.0, h, py);

        let pz = (1.0 - px * px - py * py).max(0.0).sqrt();
        let nh = t1 * px + t2 * py + wh * pz;

        Vector3f::new(self.alpha_x * nh.x, self.alpha_y * nh.y, nh.z.max(1e-6)).normalize()
    }
}

#[derive(Debug, Clone)]
pub enum BxDF {
    Diffuse {
        reflectance: SpectrumSample,
    },
    Conductor {
        eta: SpectrumSample,
        k: SpectrumSample,
        dist: TrowbridgeReitzDistribution,
    },
    Dielectric {
        eta: Float,
    },
    ThinDielectric {
        eta: Float,
    },
}

pub struct BsdfSample {
    pub wi: Vector3f,
    pub spec: SpectrumSample,
    pub pdf: Float,
    pub eta: Float,
    pub pdf_is_proportional: bool,
    pub flags: u8,
}

impl BsdfSample {
    pub fn is_specular(&self) -> bool {
        self.flags & BSDF_SPECULAR != 0
    }
    pub fn is_transmission(&self) -> bool {
        self.flags & BSDF_TRANSMISSION != 0
    }
}

fn uniform_spectrum(v: Float, lambda: [Float; N_SPECTRUM_SAMPLES]) -> SpectrumSample {
    SpectrumSample::constant(v, lambda)
}

impl BxDF {
    pub fn is_specular(&self) -> bool {
        match self {
            BxDF::Diffuse { .. } => false,
            BxDF::Conductor { dist, .. } => dist.is_smooth(),
            BxDF::Dielectric { .. } | BxDF::ThinDielectric { .. } => true,
        }
    }

    pub fn eval(&self, wo: &Vector3f, wi: &Vector3f) -> SpectrumSample {
        match self {
            BxDF::Diffuse { reflectance } => {
                if !same_hemisphere(wo, wi) {
                    SpectrumSample::zero(reflectance.lambda)
                } else {
                    *reflectance * INV_PI
                }
            }
            BxDF::Conductor { eta, k, dist } => {
                if dist.is_smooth() || !same_hemisphere(wo, wi) {
                    return SpectrumSample::zero(eta.lambda);
                }
                let cos_theta_o = abs_cos_theta(wo);
                let cos_theta_i = abs_cos_theta(wi);
                if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
                    return SpectrumSample::zero(eta.lambda);
                }
                let mut wm = *wi + *wo;
                if wm.length_squared() == 0.0 {
                    return SpectrumSample::zero(eta.lambda);
                }
                wm = wm.normalize();
                let f = fr_complex_spectrum(vec3_dot_vec3f(wo, &wm).abs(), eta, k);
                f * (dist.d(&wm) * dist.g(wo, wi) / (4.0 * cos_theta_o * cos_theta_i))
            }
            BxDF::Dielectric { .. } | BxDF::ThinDielectric { .. } => {
                SpectrumSample::zero([0.0; N_SPECTRUM_SAMPLES])
            }
        }
    }

    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        match self {
            BxDF::Diffuse { .. } => {
                if same_hemisphere(wo, wi) {
                    abs_cos_theta(wi) * INV_PI
                } else {
                    0.0
                }
            }
            BxDF::Conductor { dist, .. } => {
                if dist.is_smooth() || !same_hemisphere(wo, wi) {
                    return 0.0;
                }
                let mut wm = *wi + *wo;
                if wm.length_squared() == 0.0 {
                    return 0.0;
                }
                wm = wm.normalize();
                let wm = if wm.z < 0.0 { -wm } else { wm };
                dist.pdf(wo, &wm) / (4.0 * vec3_dot_vec3f(wo, &wm).abs())
            }
            BxDF::Dielectric { .. } | BxDF::ThinDielectric { .. } => 0.0,
        }
    }

    /// `u1` selects the lobe (reflection vs transmission for dielectrics), `u2` is the
    /// 2D direction sample. `lambda` threads the caller's wavelengths through for the returned
    /// spectrum's co-keying (variants with no wavelength dependence still need it to build a
    /// `SpectrumSample`).
    pub fn sample(
        &self,
        wo: &Vector3f,
        u1: Float,
        u2: (Float, Float),
        lambda: [Float; N_SPECTRUM_SAMPLES],
    ) -> Option<BsdfSample> {
        match self {
            BxDF::Diffuse { reflectance } => {
                let mut wi = sample_cosine_hemisphere(u2.0, u2.1);
                if wo.z < 0.0 {
                    wi.z *= -1.0;
                }
                let pdf = abs_cos_theta(&wi) * INV_PI;
                if pdf == 0.0 {
                    return None;
                }
                Some(BsdfSample {
                    wi,
                    spec: *reflectance * INV_PI,
                    pdf,
                    eta: 1.0,
                    pdf_is_proportional: false,
                    flags: BSDF_REFLECTION | BSDF_DIFFUSE,
                })
            }
            BxDF::Conductor { eta, k, dist } => {
                if dist.is_smooth() {
                    let wi = Vector3f::new(-wo.x, -wo.y, wo.z);
                    let cos_theta_i = abs_cos_theta(&wi);
                    if cos_theta_i == 0.0 {
                        return None;
                    }
                    let f = fr_complex_spectrum(abs_cos_theta(wo), eta, k) / cos_theta_i;
                    return Some(BsdfSample {
                        wi,
                        spec: f,
                        pdf: 1.0,
                        eta: 1.0,
                        pdf_is_proportional: false,
                        flags: BSDF_REFLECTION | BSDF_SPECULAR,
                    });
                }
                if wo.z == 0.0 {
                    return None;
                }
                let wm = dist.sample_wm(wo, u2);
                let wi = reflect(wo, &wm);
                if !same_hemisphere(wo, &wi) {
                    return None;
                }
                let cos_theta_o = abs_cos_theta(wo);
                let cos_theta_i = abs_cos_theta(&wi);
                if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
                    return None;
                }
                let f = fr_complex_spectrum(vec3_dot_vec3f(wo, &wm).abs(), eta, k)
                    * (dist.d(&wm) * dist.g(wo, &wi) / (4.0 * cos_theta_o * cos_theta_i));
                let pdf = dist.pdf(wo, &wm) / (4.0 * vec3_dot_vec3f(wo, &wm).abs());
                if pdf == 0.0 {
                    return None;
                }
                Some(BsdfSample {
                    wi,
                    spec: f,
                    pdf,
                    eta: 1.0,
                    pdf_is_proportional: false,
                    flags: BSDF_REFLECTION | BSDF_GLOSSY,
                })
            }
            BxDF::Dielectric { eta } => {
                if *eta == 1.0 {
                    let wi = Vector3f::new(-wo.x, -wo.y, wo.z);
                    return Some(BsdfSample {
                        wi,
                        spec: uniform_spectrum(1.0 / abs_cos_theta(&wi), lambda),
                        pdf: 1.0,
                        eta: 1.0,
                        pdf_is_proportional: false,
                        flags: BSDF_REFLECTION | BSDF_SPECULAR | BSDF_TRANSMISSION,
                    });
                }
                let r = fr_dielectric(cos_theta(wo), *eta);
                let t = 1.0 - r;
                if u1 < r / (r + t) {
                    let wi = Vector3f::new(-wo.x, -wo.y, wo.z);
                    let pdf = r / (r + t);
                    Some(BsdfSample {
                        wi,
                        spec: uniform_spectrum(r / abs_cos_theta(&wi), lambda),
                        pdf,
                        eta: 1.0,
                        pdf_is_proportional: false,
                        flags: BSDF_REFLECTION | BSDF_SPECULAR,
                    })
                } else {
                    let n = Vector3f::new(0.0, 0.0, 1.0);
                    let (wi, etap) = refract(wo, &n, *eta)?;
                    let pdf = t / (r + t);
                    Some(BsdfSample {
                        wi,
                        spec: uniform_spectrum(t / abs_cos_theta(&wi), lambda),
                        pdf,
                        eta: etap,
                        pdf_is_proportional: false,
                        flags: BSDF_TRANSMISSION | BSDF_SPECULAR,
                    })
                }
            }
            BxDF::ThinDielectric { eta } => {
                let mut r = fr_dielectric(cos_theta(wo), *eta);
                let mut t = 1.0 - r;
                if r < 1.0 {
                    r += t * t * r / (1.0 - r * r);
                    t = 1.0 - r;
                }
                if u1 < r / (r + t) {
                    let wi = Vector3f::new(-wo.x, -wo.y, wo.z);
                    Some(BsdfSample {
                        wi,
                        spec: uniform_spectrum(r / abs_cos_theta(&wi), lambda),
                        pdf: r / (r + t),
                        eta: 1.0,
                        pdf_is_proportional: false,
                        flags: BSDF_REFLECTION | BSDF_SPECULAR,
                    })
                } else {
                    let wi = -*wo;
                    Some(BsdfSample {
                        wi,
                        spec: uniform_spectrum(t / abs_cos_theta(&wi), lambda),
                        pdf: t / (r + t),
                        eta: 1.0,
                        pdf_is_proportional: false,
                        flags: BSDF_TRANSMISSION | BSDF_SPECULAR,
                    })
                }
            }
        }
    }
}

/// Wraps a `BxDF` with an orthonormal basis built from the shading normal.
pub struct Bsdf {
    bxdf: BxDF,
    basis: OrthonormalBasis,
}

impl Bsdf {
    pub fn new(shading_normal: Vector3f, bxdf: BxDF) -> Self {
        Bsdf {
            bxdf,
            basis: OrthonormalBasis::from_normal(shading_normal.normalize()),
        }
    }

    pub fn is_specular(&self) -> bool {
        self.bxdf.is_specular()
    }

    fn world_to_local(&self, v: &Vector3f) -> Vector3f {
        self.basis.to_local(v)
    }
    fn local_to_world(&self, v: &Vector3f) -> Vector3f {
        self.basis.from_local(v)
    }

    pub fn f(&self, wo_world: &Vector3f, wi_world: &Vector3f) -> SpectrumSample {
        let wo = self.world_to_local(wo_world);
        let wi = self.world_to_local(wi_world);
        self.bxdf.eval(&wo, &wi)
    }

    pub fn pdf(&self, wo_world: &Vector3f, wi_world: &Vector3f) -> Float {
        let wo = self.world_to_local(wo_world);
        let wi = self.world_to_local(wi_world);
        self.bxdf.pdf(&wo, &wi)
    }

    pub fn sample(
        &self,
        wo_world: &Vector3f,
        u1: Float,
        u2: (Float, Float),
        lambda: [Float; N_SPECTRUM_SAMPLES],
    ) -> Option<BsdfSample> {
        let wo = self.world_to_local(wo_world);
        if wo.z == 0.0 {
            return None;
        }
        let mut sample = self.bxdf.sample(&wo, u1, u2, lambda)?;
        if sample.pdf == 0.0 {
            return None;
        }
        sample.wi = self.local_to_world(&sample.wi);
        Some(sample)
    }

    /// Hemispherical-directional reflectance estimated with cosine-hemisphere draws; used by
    /// the integrator for the denoiser's albedo auxiliary buffer.
    pub fn rho_hd(
        &self,
        wo_world: &Vector3f,
        u1: &[Float],
        u2: &[(Float, Float)],
        lambda: [Float; N_SPECTRUM_SAMPLES],
    ) -> SpectrumSample {
        let wo = self.world_to_local(wo_world);
        if wo.z == 0.0 {
            return SpectrumSample::zero(lambda);
        }
        let n = u1.len().min(u2.len());
        if n == 0 {
            return SpectrumSample::zero(lambda);
        }
        let mut acc = SpectrumSample::zero(lambda);
        for i in 0..n {
            if let Some(s) = self.bxdf.sample(&wo, u1[i], u2[i], lambda) {
                if s.pdf > 0.0 {
                    acc = acc + s.spec * (abs_cos_theta(&s.wi) / s.pdf);
                }
            }
        }
        acc / n as Float
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lam() -> [Float; 4] {
        [500.0, 550.0, 600.0, 650.0]
    }

    #[test]
    fn fresnel_symmetry() {
        let eta = 1.5;
        let cos_theta = 0.6;
        let a = fr_dielectric(cos_theta, eta);
        let b = fr_dielectric(-cos_theta, 1.0 / eta);
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn diffuse_sample_throughput_matches_integrator_identity() {
        let reflectance = SpectrumSample::constant(0.8, lam());
        let bxdf = BxDF::Diffuse { reflectance };
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        if let Some(s) = bxdf.sample(&wo, 0.3, (0.4, 0.6), lam()) {
            let cos_theta = abs_cos_theta(&s.wi);
            for i in 0..4 {
                let beta_update = s.spec.values[i] * cos_theta / s.pdf;
                assert!((beta_update - reflectance.values[i]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn smooth_conductor_is_specular_mirror() {
        let eta = SpectrumSample::constant(0.2, lam());
        let k = SpectrumSample::constant(3.0, lam());
        let dist = TrowbridgeReitzDistribution::new(0.0, 0.0);
        assert!(dist.is_smooth());
        let bxdf = BxDF::Conductor { eta, k, dist };
        let wo = Vector3f::new(0.3, 0.0, 0.95).normalize();
        let s = bxdf.sample(&wo, 0.5, (0.1, 0.1), lam()).unwrap();
        assert!((s.wi.x + wo.x).abs() < 1e-5);
        assert!((s.wi.z - wo.z).abs() < 1e-5);
        assert!(s.is_specular());
    }

    #[test]
    fn rough_conductor_g_never_exceeds_one() {
        let dist = TrowbridgeReitzDistribution::new(0.3, 0.3);
        let wo = Vector3f::new(0.2, 0.1, 0.96).normalize();
        let wi = Vector3f::new(-0.1, 0.3, 0.94).normalize();
        assert!(dist.g(&wo, &wi) <= 1.0);
        assert!(dist.g1(&wo) <= 1.0);
    }
}
