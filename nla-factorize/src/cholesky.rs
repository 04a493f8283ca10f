use nd::{Array2, ArrayBase, Data, Ix2};
use num_traits::Float;
use thiserror::Error;

/// Relative pivot threshold below which a remaining diagonal entry is
/// treated as numerically zero.
pub const STD_PIVOT_TOL: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CholeskyError {
  #[error("matrix is {rows}x{cols}, expected a square matrix")]
  NotSquare { rows: usize, cols: usize },
  #[error("matrix is not symmetric at ({row}, {col})")]
  NotSymmetric { row: usize, col: usize },
  #[error("matrix is not positive semi-definite (diagonal {index})")]
  NotPositiveSemiDefinite { index: usize },
}

/// Rank-revealing factor `F` (rank x n) with `A ~= F^T F`.
#[derive(Debug, Clone)]
pub struct PivotedFactor<A> {
  pub factor: Array2<A>,
  /// Columns chosen as pivots, in elimination order.
  pub pivots: Vec<usize>,
}
impl<A> PivotedFactor<A> {
  pub fn rank(&self) -> usize { self.pivots.len() }
}

pub trait Cholesky {
  type Elem;
  /// Diagonally pivoted factorization of a positive semi-definite matrix.
  /// Stops once every remaining diagonal entry is below `rel_tol` times
  /// the largest diagonal entry, so the row count of the factor is the
  /// numerical rank.
  fn pivoted(&self, rel_tol: Self::Elem)
    -> Result<PivotedFactor<Self::Elem>, CholeskyError>;
}

fn square_dim<S, A>(a: &ArrayBase<S, Ix2>) -> Result<usize, CholeskyError>
  where S: Data<Elem = A>,
{
  let (rows, cols) = a.dim();
  if rows != cols {
    return Err(CholeskyError::NotSquare { rows, cols, });
  }
  Ok(rows)
}

impl<S, A> Cholesky for ArrayBase<S, Ix2>
  where S: Data<Elem = A>,
        A: Float + 'static,
{
  type Elem = A;

  fn pivoted(&self, rel_tol: A) -> Result<PivotedFactor<A>, CholeskyError> {
    let m = square_dim(self)?;

    let scale = (0..m)
      .map(|i| self[[i, i]].abs())
      .fold(A::zero(), |acc, v| if v > acc { v } else { acc });
    let sym_tol = A::epsilon().sqrt() * scale;
    for i in 0..m {
      for j in i + 1..m {
        if (self[[i, j]] - self[[j, i]]).abs() > sym_tol {
          return Err(CholeskyError::NotSymmetric { row: i, col: j, });
        }
      }
    }

    let tol = rel_tol * scale;
    let mut d: Vec<A> = (0..m).map(|i| self[[i, i]]).collect();
    if let Some(index) = d.iter().position(|&v| v < -tol) {
      return Err(CholeskyError::NotPositiveSemiDefinite { index });
    }

    let mut chosen = vec![false; m];
    let mut pivots = Vec::new();
    let mut rows: Vec<Vec<A>> = Vec::new();

    while pivots.len() < m {
      let mut j = m;
      let mut dj = A::zero();
      for (i, &v) in d.iter().enumerate() {
        if !chosen[i] && (j == m || v > dj) {
          j = i;
          dj = v;
        }
      }
      if j == m || scale == A::zero() || dj <= tol { break; }

      let mut row: Vec<A> = self.row(j).to_vec();
      for prev in rows.iter() {
        let c = prev[j];
        if c == A::zero() { continue; }
        for (r, &p) in row.iter_mut().zip(prev.iter()) {
          *r = *r - c * p;
        }
      }

      let s = dj.sqrt();
      for r in row.iter_mut() {
        *r = *r / s;
      }
      for &p in pivots.iter() {
        row[p] = A::zero();
      }
      row[j] = s;

      for (di, &r) in d.iter_mut().zip(row.iter()) {
        *di = *di - r * r;
      }
      d[j] = A::zero();
      chosen[j] = true;

      pivots.push(j);
      rows.push(row);
    }

    // A semi-definite input can't leave a large negative Schur complement.
    for (i, &v) in d.iter().enumerate() {
      if !chosen[i] && v < -tol.sqrt() * scale.sqrt() {
        return Err(CholeskyError::NotPositiveSemiDefinite { index: i });
      }
    }

    let factor = Array2::from_shape_fn((rows.len(), m), |(i, j)| rows[i][j]);
    Ok(PivotedFactor {
      factor,
      pivots,
    })
  }
}
