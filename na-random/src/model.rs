use nd::{Array, ArrayView, Axis, Ix1, Ix2};
use nd_rand::RandomExt;
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use rayon::prelude::*;

use nac::{rng, Error, Result};

use std::fmt;
use std::sync::Arc;

use crate::covariance::Covariance;

/// A user supplied sampler: `n` draws as the rows of an `n x m` matrix.
pub type SamplingFn = dyn Fn(usize, &mut dyn RngCore) -> Array<f64, Ix2> + Send + Sync;

/// Rows per sub-stream in `RandomVectorModel::sample_par`.
const PAR_CHUNK: usize = 64;

#[derive(Clone)]
pub enum Sampling {
  /// Mean-zero Gaussian with the given covariance.
  Covariance(Covariance),
  /// Anything else; the model only checks the shape of what comes back.
  Custom(Arc<SamplingFn>),
}
impl fmt::Debug for Sampling {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      &Sampling::Covariance(ref c) => f.debug_tuple("Covariance").field(c).finish(),
      &Sampling::Custom(_) => f.write_str("Custom(..)"),
    }
  }
}

/// A random vector of dimension `m` that can be drawn from in batches.
#[derive(Debug, Clone)]
pub struct RandomVectorModel {
  m: usize,
  mean: Option<Array<f64, Ix1>>,
  sampling: Sampling,
}

impl RandomVectorModel {
  pub fn gaussian(covariance: Covariance) -> RandomVectorModel {
    RandomVectorModel {
      m: covariance.dim(),
      mean: None,
      sampling: Sampling::Covariance(covariance),
    }
  }

  pub fn custom<F>(m: usize, f: F) -> Result<RandomVectorModel>
    where F: Fn(usize, &mut dyn RngCore) -> Array<f64, Ix2> + Send + Sync + 'static,
  {
    if m == 0 {
      return Err(Error::invalid("random vector dimension must be positive"));
    }
    Ok(RandomVectorModel {
      m: m,
      mean: None,
      sampling: Sampling::Custom(Arc::new(f)),
    })
  }

  /// Shifts every draw by `mean`.
  pub fn with_mean(mut self, mean: Array<f64, Ix1>) -> Result<RandomVectorModel> {
    if mean.len() != self.m {
      return Err(Error::config(format!("mean has length {}, random vector has dimension {}",
                                       mean.len(), self.m)));
    }
    self.mean = Some(mean);
    Ok(self)
  }

  pub fn dim(&self) -> usize { self.m }
  pub fn sampling(&self) -> &Sampling { &self.sampling }
  pub fn mean(&self) -> Option<ArrayView<f64, Ix1>> {
    self.mean.as_ref().map(|m| m.view())
  }
  pub fn covariance(&self) -> Option<&Covariance> {
    match self.sampling {
      Sampling::Covariance(ref c) => Some(c),
      Sampling::Custom(_) => None,
    }
  }

  /// `n` independent draws, one per row.
  pub fn sample<R>(&self, n: usize, rng: &mut R) -> Result<Array<f64, Ix2>>
    where R: Rng + ?Sized,
  {
    if n == 0 {
      return Err(Error::invalid("sample count must be positive"));
    }

    let mut x = match self.sampling {
      Sampling::Covariance(ref c) => {
        let z = Array::random_using((n, c.white_noise_dim()), StandardNormal, rng);
        c.color(z)
      },
      Sampling::Custom(ref f) => {
        let mut r = rng;
        let r: &mut dyn RngCore = &mut r;
        let x = f(n, r);
        if x.dim() != (n, self.m) {
          return Err(Error::config(format!("custom sampler returned {:?}, expected ({}, {})",
                                           x.dim(), n, self.m)));
        }
        x
      },
    };

    if let Some(ref mean) = self.mean {
      x += mean;
    }
    Ok(x)
  }

  pub fn sample_one<R>(&self, rng: &mut R) -> Result<Array<f64, Ix1>>
    where R: Rng + ?Sized,
  {
    Ok(self.sample(1, rng)?.index_axis_move(Axis(0), 0))
  }

  /// Like `sample`, but rows are drawn in parallel. Each block of rows has
  /// its own generator derived from `seed`, so the result depends only on
  /// `seed` and `n`, not on the thread count.
  pub fn sample_par(&self, n: usize, seed: u64) -> Result<Array<f64, Ix2>> {
    if n == 0 {
      return Err(Error::invalid("sample count must be positive"));
    }
    let blocks = (n + PAR_CHUNK - 1) / PAR_CHUNK;
    let streams = rng::substreams(seed, blocks);

    let parts = streams
      .into_par_iter()
      .enumerate()
      .map(|(i, mut r)| {
        let rows = ::std::cmp::min(PAR_CHUNK, n - i * PAR_CHUNK);
        self.sample(rows, &mut r)
      })
      .collect::<Result<Vec<_>>>()?;

    let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
    Ok(nd::concatenate(Axis(0), &views[..])?)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use nac::rng::seeded;
  use nd::{arr1, arr2};
  use crate::stats::{empirical_covariance, sample_mean};

  fn frobenius(a: ArrayView<f64, Ix2>) -> f64 {
    a.iter().map(|v| v * v).sum::<f64>().sqrt()
  }

  #[test]
  fn zero_samples_is_invalid() {
    let m = RandomVectorModel::gaussian(Covariance::scalar(2, 1.0).unwrap());
    assert!(m.sample(0, &mut seeded(1)).unwrap_err().is_invalid_argument());
    assert!(m.sample_par(0, 1).unwrap_err().is_invalid_argument());
  }

  #[test]
  fn dense_covariance_is_reproduced() {
    let c = arr2(&[[2.0, 0.8, 0.0],
                   [0.8, 1.0, -0.3],
                   [0.0, -0.3, 0.5]]);
    let model = RandomVectorModel::gaussian(Covariance::dense(c.view()).unwrap());
    let x = model.sample(100_000, &mut seeded(3)).unwrap();
    assert_eq!(x.dim(), (100_000, 3));

    let emp = empirical_covariance(x.view()).unwrap();
    let err = frobenius((&emp - &c).view()) / frobenius(c.view());
    assert!(err < 0.05, "relative error {}", err);
    for v in sample_mean(x.view()).iter() {
      assert!(v.abs() < 0.02, "mean {}", v);
    }
  }

  #[test]
  fn low_rank_covariance_is_reproduced() {
    let a = arr2(&[[1.0, 0.5, 0.0, -0.5],
                   [0.0, 1.0, 1.0, 0.0]]);
    let c = a.t().dot(&a);
    let model = RandomVectorModel::gaussian(Covariance::low_rank(a).unwrap());
    let x = model.sample(100_000, &mut seeded(4)).unwrap();
    let emp = empirical_covariance(x.view()).unwrap();
    let err = frobenius((&emp - &c).view()) / frobenius(c.view());
    assert!(err < 0.05, "relative error {}", err);
  }

  #[test]
  fn per_coordinate_variances_are_reproduced() {
    let v = arr1(&[0.5, 2.0, 0.0]);
    let model = RandomVectorModel::gaussian(Covariance::diagonal(v.clone()).unwrap());
    let x = model.sample(100_000, &mut seeded(6)).unwrap();
    let emp = empirical_covariance(x.view()).unwrap();
    for i in 0..2 {
      let err = (emp[[i, i]] - v[i]).abs() / v[i];
      assert!(err < 0.03, "variance {} off by {}", i, err);
    }
    assert!(emp[[0, 1]].abs() < 0.03);
    assert!(x.column(2).iter().all(|&z| z == 0.0));
  }

  #[test]
  fn same_seed_same_draws() {
    let model = RandomVectorModel::gaussian(Covariance::scalar(5, 0.01).unwrap());
    let a = model.sample(4, &mut seeded(9)).unwrap();
    let b = model.sample(4, &mut seeded(9)).unwrap();
    let c = model.sample(4, &mut seeded(10)).unwrap();
    assert_eq!(a, b);
    assert!(a != c);
  }

  #[test]
  fn mean_shifts_draws() {
    let model = RandomVectorModel::gaussian(Covariance::scalar(2, 0.0).unwrap())
      .with_mean(arr1(&[1.0, -2.0]))
      .unwrap();
    let x = model.sample_one(&mut seeded(1)).unwrap();
    assert_eq!(x, arr1(&[1.0, -2.0]));
    assert!(RandomVectorModel::gaussian(Covariance::scalar(2, 1.0).unwrap())
            .with_mean(arr1(&[1.0]))
            .unwrap_err()
            .is_configuration());
  }

  #[test]
  fn custom_sampler_is_delegated_and_checked() {
    let model = RandomVectorModel::custom(3, |n, rng: &mut dyn RngCore| {
      let v = (rng.next_u32() % 7) as f64;
      Array::from_elem((n, 3), v)
    }).unwrap();
    let x = model.sample(2, &mut seeded(5)).unwrap();
    assert_eq!(x.dim(), (2, 3));
    assert_eq!(x[[0, 0]], x[[1, 2]]);
    assert!(model.covariance().is_none());

    let bad = RandomVectorModel::custom(3, |n, _: &mut dyn RngCore| Array::zeros((n, 2))).unwrap();
    assert!(bad.sample(2, &mut seeded(5)).unwrap_err().is_configuration());
  }

  #[test]
  fn parallel_sampling_is_deterministic() {
    let model = RandomVectorModel::gaussian(Covariance::scalar(4, 1.0).unwrap());
    let a = model.sample_par(200, 11).unwrap();
    let b = model.sample_par(200, 11).unwrap();
    assert_eq!(a.dim(), (200, 4));
    assert_eq!(a, b);
    assert!(a != model.sample_par(200, 12).unwrap());
    // distinct sub-streams per block
    assert!(a.row(0) != a.row(PAR_CHUNK));
  }
}
