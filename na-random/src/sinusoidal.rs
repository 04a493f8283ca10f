use nd::{Array, Axis, Ix1, Ix2, Zip};
use rand::{Rng, RngCore};

use nac::{Error, Result};

use std::f64::consts::PI;

use crate::covariance::Covariance;
use crate::model::RandomVectorModel;
use crate::stats::anomalies;

/// `2 * wnum + 1`, the number of functions spanning fields up to `wnum`.
fn basis_size(wnum: usize) -> Result<usize> {
  wnum.checked_mul(2)
    .and_then(|n| n.checked_add(1))
    .ok_or_else(|| Error::invalid(format!("wavenumber {} is too large", wnum)))
}

/// Band-limited random fields on the periodic grid `x_j = j / m`.
///
/// Each row is `sum_{k=0..=wnum} a_k sin(2 pi (k x + phi_k))` with
/// `a_k, phi_k ~ U(0, 1)` drawn per row. The rows live in the span of
/// `2 * wnum + 1` functions: the constant plus a cosine/sine pair for each
/// wavenumber up to `wnum`.
#[derive(Debug, Clone)]
pub struct SinusoidalSampler {
  m: usize,
  wnum: usize,
  basis: usize,
  grid: Array<f64, Ix1>,
}

impl SinusoidalSampler {
  pub fn new(m: usize, wnum: usize) -> Result<SinusoidalSampler> {
    if m == 0 {
      return Err(Error::invalid("field dimension must be positive"));
    }
    let basis = basis_size(wnum)?;
    if basis > m {
      return Err(Error::invalid(format!("wavenumber {} is not resolved by {} grid points",
                                        wnum, m)));
    }
    let grid = Array::from_shape_fn(m, |j| j as f64 / m as f64);
    Ok(SinusoidalSampler {
      m: m,
      wnum: wnum,
      basis: basis,
      grid: grid,
    })
  }

  pub fn dim(&self) -> usize { self.m }
  pub fn wnum(&self) -> usize { self.wnum }
  /// Upper bound on the rank of any sample.
  pub fn basis_dim(&self) -> usize { self.basis }

  pub fn sample<R>(&self, n: usize, rng: &mut R) -> Result<Array<f64, Ix2>>
    where R: Rng + ?Sized,
  {
    if n == 0 {
      return Err(Error::invalid("sample count must be positive"));
    }
    Ok(self.draw(n, rng))
  }

  fn draw<R>(&self, n: usize, rng: &mut R) -> Array<f64, Ix2>
    where R: Rng + ?Sized,
  {
    let mut out = Array::zeros((n, self.m));
    for mut row in out.axis_iter_mut(Axis(0)) {
      for k in 0..self.wnum + 1 {
        let a: f64 = rng.gen();
        let phi: f64 = rng.gen();
        let k = k as f64;
        Zip::from(&mut row)
          .and(&self.grid)
          .for_each(|out, &x| {
            *out += a * (2.0 * PI * (k * x + phi)).sin();
          });
      }
    }
    out
  }

  /// A custom-sampling random vector drawing `scale` times these fields.
  pub fn into_model(self, scale: f64) -> Result<RandomVectorModel> {
    let m = self.m;
    RandomVectorModel::custom(m, move |n, rng: &mut dyn RngCore| {
      let mut x = self.draw(n, rng);
      x *= scale;
      x
    })
  }
}

/// Explicit low-rank covariance built from a finite sinusoidal sample.
///
/// `N` fields are drawn, centered across the sample, divided by
/// `sqrt(N)` and used as the factor `A` of `C = scale * A^T A`.
///
/// Centering is on unless `uncentered()` is called. Without it, the
/// sample mean survives as a strong spurious direction in `C`, which is
/// what breaks filters run on shift models with integer `dt / dx`. The
/// rank of the result is reported by `Covariance::rank`; with the default
/// `N = 2 * wnum + 1` centering leaves `2 * wnum` directions.
#[derive(Debug, Clone)]
pub struct SpectralCovariance {
  m: usize,
  wnum: usize,
  samples: Option<usize>,
  centered: bool,
  scale: f64,
}

impl SpectralCovariance {
  pub fn new(m: usize, wnum: usize) -> SpectralCovariance {
    SpectralCovariance {
      m: m,
      wnum: wnum,
      samples: None,
      centered: true,
      scale: 1.0,
    }
  }

  /// Sample count, at least `2 * wnum + 1`.
  pub fn samples(mut self, n: usize) -> SpectralCovariance {
    self.samples = Some(n);
    self
  }
  pub fn scale(mut self, k: f64) -> SpectralCovariance {
    self.scale = k;
    self
  }
  /// Skips the centering step. Only useful to reproduce the degenerate
  /// structure it guards against.
  pub fn uncentered(mut self) -> SpectralCovariance {
    self.centered = false;
    self
  }

  /// The explicit sample count, or `2 * wnum + 1`. Fails only when that
  /// default overflows.
  pub fn sample_count(&self) -> Result<usize> {
    match self.samples {
      Some(n) => Ok(n),
      None => basis_size(self.wnum),
    }
  }
  pub fn is_centered(&self) -> bool { self.centered }

  /// The factor `A` (N x m), before `scale` is applied.
  pub fn factor<R>(&self, rng: &mut R) -> Result<Array<f64, Ix2>>
    where R: Rng + ?Sized,
  {
    let sampler = SinusoidalSampler::new(self.m, self.wnum)?;
    let n = self.sample_count()?;
    if n < sampler.basis_dim() {
      return Err(Error::invalid(format!("{} samples can't carry {} basis functions (wnum = {})",
                                        n, sampler.basis_dim(), self.wnum)));
    }

    let x = sampler.sample(n, rng)?;
    let mut a = if self.centered {
      anomalies(x.view()).0
    } else {
      x
    };
    a /= (n as f64).sqrt();
    Ok(a)
  }

  pub fn build<R>(&self, rng: &mut R) -> Result<Covariance>
    where R: Rng + ?Sized,
  {
    Covariance::low_rank(self.factor(rng)?)?.scaled(self.scale)
  }
}
