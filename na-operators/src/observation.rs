use nd::{Array, ArrayView, Axis, Ix1, Ix2};
use rand::Rng;

use nac::{Error, Operator, Result};
use na_rand::RandomVectorModel;

/// Rounds to the nearest integer, ties to even.
fn round_half_even(v: f64) -> f64 {
  if (v - v.trunc()).abs() == 0.5 {
    2.0 * (v / 2.0).round()
  } else {
    v.round()
  }
}

/// `p` integers spread evenly over `0..m`, each sitting roughly in the
/// middle of its own `m / p` wide cell. For `m = 1000, p = 40` these are
/// `12, 37, 62, ..., 987`.
pub fn equi_spaced_integers(m: usize, p: usize) -> Result<Vec<usize>> {
  if p == 0 {
    return Err(Error::invalid("need at least one index"));
  }
  if p > m {
    return Err(Error::invalid(format!("can't pick {} distinct indices out of {}", p, m)));
  }

  let half = m as f64 / p as f64 / 2.0;
  let start = half.floor();
  let end = (m as f64 - half - 1.0).ceil();

  let mut out = Vec::with_capacity(p);
  if p == 1 {
    out.push(start as usize);
  } else {
    let step = (end - start) / (p - 1) as f64;
    for i in 0..p - 1 {
      out.push(round_half_even(start + step * i as f64) as usize);
    }
    out.push(end as usize);
  }

  if out.windows(2).any(|w| w[0] >= w[1]) {
    return Err(Error::invalid(format!("{} points over {} can't be spaced without repeats", p, m)));
  }
  if out.iter().any(|&i| i >= m) {
    return Err(Error::invalid(format!("equi-spaced index out of range for m = {}", m)));
  }
  Ok(out)
}

/// Direct observation of a subset of the state, `y = x[indices] + noise`.
#[derive(Debug, Clone)]
pub struct ObservationOperator {
  m: usize,
  indices: Vec<usize>,
  noise: RandomVectorModel,
}

impl ObservationOperator {
  pub fn new(m: usize, indices: Vec<usize>, noise: RandomVectorModel) -> Result<ObservationOperator> {
    if indices.is_empty() {
      return Err(Error::invalid("need at least one observed index"));
    }
    if indices.len() > m {
      return Err(Error::invalid(format!("{} indices for a state of dimension {}",
                                        indices.len(), m)));
    }
    if indices.windows(2).any(|w| w[0] >= w[1]) {
      return Err(Error::invalid("observed indices must be strictly increasing"));
    }
    if let Some(&i) = indices.iter().find(|&&i| i >= m) {
      return Err(Error::invalid(format!("observed index {} out of range for m = {}", i, m)));
    }
    if noise.dim() != indices.len() {
      return Err(Error::config(format!("observation noise has dimension {}, {} points are observed",
                                       noise.dim(), indices.len())));
    }

    Ok(ObservationOperator {
      m: m,
      indices: indices,
      noise: noise,
    })
  }

  /// Observes `p` equi-spaced grid points, see `equi_spaced_integers`.
  pub fn equi_spaced(m: usize, p: usize, noise: RandomVectorModel) -> Result<ObservationOperator> {
    ObservationOperator::new(m, equi_spaced_integers(m, p)?, noise)
  }

  pub fn state_dim(&self) -> usize { self.m }
  pub fn obs_dim(&self) -> usize { self.indices.len() }
  pub fn indices(&self) -> &[usize] { &self.indices[..] }
  pub fn noise(&self) -> &RandomVectorModel { &self.noise }

  /// Noise free observation of every member.
  pub fn observe(&self, x: ArrayView<f64, Ix2>) -> Result<Array<f64, Ix2>> {
    self.check_input(&x)?;
    Ok(x.select(Axis(1), &self.indices[..]))
  }

  pub fn observe_one(&self, x: ArrayView<f64, Ix1>) -> Result<Array<f64, Ix1>> {
    if x.len() != self.m {
      return Err(Error::config(format!("state has length {}, operator expects {}",
                                       x.len(), self.m)));
    }
    Ok(x.select(Axis(0), &self.indices[..]))
  }

  /// `observe` plus an independent noise draw for every row.
  pub fn observe_noisy<R>(&self, x: ArrayView<f64, Ix2>, rng: &mut R) -> Result<Array<f64, Ix2>>
    where R: Rng + ?Sized,
  {
    let mut y = self.observe(x)?;
    y += &self.noise.sample(y.nrows(), rng)?;
    Ok(y)
  }

  /// The p x m selection matrix `H`.
  pub fn linear_matrix(&self) -> Array<f64, Ix2> {
    let mut h = Array::zeros((self.obs_dim(), self.m));
    for (row, &col) in self.indices.iter().enumerate() {
      h[[row, col]] = 1.0;
    }
    h
  }
}

impl Operator<f64> for ObservationOperator {
  fn operator_input_dim(&self) -> usize { self.m }
  fn operator_output_dim(&self) -> usize { self.obs_dim() }
  fn eval_at(&self, x: ArrayView<f64, Ix2>) -> Result<Array<f64, Ix2>> {
    self.observe(x)
  }
}
