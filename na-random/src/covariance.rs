use nd::{Array, ArrayView, Ix1, Ix2};
use nla::{Cholesky, STD_PIVOT_TOL};

use nac::{Error, Result};

use std::ops::Index;

/// Per-coordinate variances.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagonal {
  /// The same variance on every coordinate.
  Single(f64),
  Multiple(Array<f64, Ix1>),
}
impl Index<usize> for Diagonal {
  type Output = f64;
  fn index(&self, idx: usize) -> &f64 {
    match self {
      &Diagonal::Single(ref e) => e,
      &Diagonal::Multiple(ref v) => &v[idx],
    }
  }
}
impl From<f64> for Diagonal {
  fn from(v: f64) -> Diagonal {
    Diagonal::Single(v)
  }
}
impl From<Array<f64, Ix1>> for Diagonal {
  fn from(v: Array<f64, Ix1>) -> Diagonal {
    Diagonal::Multiple(v)
  }
}

#[derive(Debug, Clone, PartialEq)]
enum Repr {
  Diagonal(Diagonal),
  /// `F` (rank x m) with `C = F^T F`.
  Factor(Array<f64, Ix2>),
}

/// A covariance matrix kept in whatever form is cheapest to sample from.
///
/// Dense matrices are reduced once, at construction, to a rank-revealing
/// factor; low-rank factors are kept as given and the full m x m matrix is
/// never formed unless `full()` asks for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance {
  m: usize,
  repr: Repr,
}

impl Covariance {
  /// `variance * I` of size `m`.
  pub fn scalar(m: usize, variance: f64) -> Result<Covariance> {
    if m == 0 {
      return Err(Error::invalid("covariance dimension must be positive"));
    }
    if !(variance >= 0.0) || !variance.is_finite() {
      return Err(Error::invalid(format!("variance must be non-negative, got {}", variance)));
    }
    Ok(Covariance {
      m: m,
      repr: Repr::Diagonal(Diagonal::Single(variance)),
    })
  }

  pub fn diagonal(variances: Array<f64, Ix1>) -> Result<Covariance> {
    if variances.is_empty() {
      return Err(Error::invalid("covariance dimension must be positive"));
    }
    if let Some(i) = variances.iter().position(|&v| !(v >= 0.0) || !v.is_finite()) {
      return Err(Error::invalid(format!("variance {} is {}", i, variances[i])));
    }
    Ok(Covariance {
      m: variances.len(),
      repr: Repr::Diagonal(Diagonal::Multiple(variances)),
    })
  }

  /// A symmetric positive semi-definite matrix, e.g. an empirical
  /// covariance computed elsewhere. Rank deficiency is fine; the factor
  /// keeps only the numerically non-zero directions.
  pub fn dense(c: ArrayView<f64, Ix2>) -> Result<Covariance> {
    if c.nrows() == 0 {
      return Err(Error::invalid("covariance dimension must be positive"));
    }
    if c.iter().any(|v| !v.is_finite()) {
      return Err(Error::invalid("covariance has non-finite entries"));
    }
    let f = c.pivoted(STD_PIVOT_TOL)?;
    Ok(Covariance {
      m: c.ncols(),
      repr: Repr::Factor(f.factor),
    })
  }

  /// `C = A^T A` for a factor `A` with one row per rank direction.
  pub fn low_rank(a: Array<f64, Ix2>) -> Result<Covariance> {
    if a.ncols() == 0 {
      return Err(Error::invalid("covariance dimension must be positive"));
    }
    if a.iter().any(|v| !v.is_finite()) {
      return Err(Error::invalid("covariance factor has non-finite entries"));
    }
    Ok(Covariance {
      m: a.ncols(),
      repr: Repr::Factor(a),
    })
  }

  pub fn dim(&self) -> usize { self.m }

  /// Number of independent normals one draw consumes; for a factor this
  /// is its row count, i.e. the rank of the covariance.
  pub fn rank(&self) -> usize {
    match self.repr {
      Repr::Diagonal(Diagonal::Single(v)) => if v > 0.0 { self.m } else { 0 },
      Repr::Diagonal(Diagonal::Multiple(ref v)) => v.iter().filter(|&&v| v > 0.0).count(),
      Repr::Factor(ref f) => f.nrows(),
    }
  }
  fn noise_dim(&self) -> usize {
    match self.repr {
      Repr::Diagonal(_) => self.m,
      Repr::Factor(ref f) => f.nrows(),
    }
  }

  pub fn factor(&self) -> Option<ArrayView<f64, Ix2>> {
    match self.repr {
      Repr::Factor(ref f) => Some(f.view()),
      _ => None,
    }
  }

  pub fn variances(&self) -> Array<f64, Ix1> {
    match self.repr {
      Repr::Diagonal(ref d) => Array::from_shape_fn(self.m, |i| d[i]),
      Repr::Factor(ref f) => f.map_axis(nd::Axis(0), |col| col.dot(&col)),
    }
  }

  /// The full m x m matrix.
  pub fn full(&self) -> Array<f64, Ix2> {
    match self.repr {
      Repr::Diagonal(ref d) => {
        let mut c = Array::zeros((self.m, self.m));
        for i in 0..self.m {
          c[[i, i]] = d[i];
        }
        c
      },
      Repr::Factor(ref f) => f.t().dot(f),
    }
  }

  /// Multiplies the covariance (not the factor) by `k`.
  pub fn scaled(&self, k: f64) -> Result<Covariance> {
    if !(k >= 0.0) || !k.is_finite() {
      return Err(Error::invalid(format!("covariance scale must be non-negative, got {}", k)));
    }
    let repr = match self.repr {
      Repr::Diagonal(Diagonal::Single(v)) => Repr::Diagonal(Diagonal::Single(k * v)),
      Repr::Diagonal(Diagonal::Multiple(ref v)) => Repr::Diagonal(Diagonal::Multiple(v * k)),
      Repr::Factor(ref f) => Repr::Factor(f * k.sqrt()),
    };
    Ok(Covariance {
      m: self.m,
      repr: repr,
    })
  }

  /// Turns `n` rows of white noise into `n` rows with this covariance.
  pub(crate) fn color(&self, z: Array<f64, Ix2>) -> Array<f64, Ix2> {
    debug_assert_eq!(z.ncols(), self.noise_dim());
    match self.repr {
      Repr::Diagonal(Diagonal::Single(v)) => {
        let s = v.sqrt();
        z.mapv_into(|x| x * s)
      },
      Repr::Diagonal(Diagonal::Multiple(ref v)) => {
        let s = v.mapv(f64::sqrt);
        z * &s
      },
      Repr::Factor(ref f) => z.dot(f),
    }
  }

  pub(crate) fn white_noise_dim(&self) -> usize { self.noise_dim() }
}
