use nd::{Array, ArrayView, Ix1, Ix2, Zip};
use nd::linalg::general_mat_vec_mul;

use nac::{Error, Operator, Result};

/// One step of first order upwind advection on a periodic grid of `m`
/// points, Courant number `nu = wave_speed * dt / dx`.
///
/// For `wave_speed <= 0` the stencil looks right:
/// `x'_i = (1 + nu) x_i - nu x_{i+1}`; otherwise it looks left:
/// `x'_i = (1 - nu) x_i + nu x_{i-1}`. At `|nu| = 1` the step is an exact
/// circular shift, below it the scheme also diffuses.
pub fn build_matrix(m: usize, wave_speed: f64, dx: f64, dt: f64) -> Result<Array<f64, Ix2>> {
  if m == 0 {
    return Err(Error::config("state dimension must be positive"));
  }
  if !(dx > 0.0) || !dx.is_finite() {
    return Err(Error::config(format!("grid spacing must be positive, got {}", dx)));
  }
  if !(dt > 0.0) || !dt.is_finite() {
    return Err(Error::config(format!("dt must be positive, got {}", dt)));
  }
  if !wave_speed.is_finite() {
    return Err(Error::config("wave speed must be finite"));
  }

  let nu = wave_speed * dt / dx;
  if nu.abs() > 1.0 {
    return Err(Error::config(format!("Courant number {} violates the CFL condition", nu)));
  }

  let mut f = Array::zeros((m, m));
  for i in 0..m {
    if wave_speed <= 0.0 {
      f[[i, i]] += 1.0 + nu;
      f[[i, (i + 1) % m]] -= nu;
    } else {
      f[[i, i]] += 1.0 - nu;
      f[[i, (i + m - 1) % m]] += nu;
    }
  }
  Ok(f)
}

/// The damped forecast `x -> damping * F x`, F fixed for one `dt`.
#[derive(Debug, Clone)]
pub struct LinearForecastOperator {
  wave_speed: f64,
  dx: f64,
  dt: f64,
  damping: f64,
  matrix: Array<f64, Ix2>,
}

impl LinearForecastOperator {
  pub fn new(m: usize, wave_speed: f64, dx: f64, dt: f64,
             damping: f64) -> Result<LinearForecastOperator> {
    if !damping.is_finite() {
      return Err(Error::config("damping must be finite"));
    }
    let matrix = build_matrix(m, wave_speed, dx, dt)?;
    Ok(LinearForecastOperator {
      wave_speed: wave_speed,
      dx: dx,
      dt: dt,
      damping: damping,
      matrix: matrix,
    })
  }

  /// Same operator for a different step size.
  pub fn rebuilt(&self, dt: f64) -> Result<LinearForecastOperator> {
    LinearForecastOperator::new(self.dim(), self.wave_speed, self.dx, dt, self.damping)
  }

  pub fn dim(&self) -> usize { self.matrix.nrows() }
  pub fn dt(&self) -> f64 { self.dt }
  pub fn damping(&self) -> f64 { self.damping }
  pub fn courant(&self) -> f64 { self.wave_speed * self.dt / self.dx }
  /// The undamped transition matrix F.
  pub fn matrix(&self) -> ArrayView<f64, Ix2> { self.matrix.view() }

  /// `damping * x F^T` for every row of `x`.
  pub fn apply(&self, x: ArrayView<f64, Ix2>) -> Result<Array<f64, Ix2>> {
    self.check_input(&x)?;

    let mut out = Array::zeros(x.raw_dim());
    let f = &self.matrix;
    let damping = self.damping;
    Zip::from(out.rows_mut())
      .and(x.rows())
      .par_for_each(|mut out, x| {
        general_mat_vec_mul(damping, f, &x, 0.0, &mut out);
      });

    Ok(out)
  }

  pub fn apply_one(&self, x: ArrayView<f64, Ix1>) -> Result<Array<f64, Ix1>> {
    if x.len() != self.dim() {
      return Err(Error::config(format!("state has length {}, operator expects {}",
                                       x.len(), self.dim())));
    }
    let mut out = self.matrix.dot(&x);
    out *= self.damping;
    Ok(out)
  }

  /// The model step. Time invariant, so `t` is ignored, but `dt` has to be
  /// the one the matrix was built for.
  pub fn step(&self, x: ArrayView<f64, Ix2>, _t: f64, dt: f64) -> Result<Array<f64, Ix2>> {
    if (dt - self.dt).abs() > ::std::f64::EPSILON * self.dt.max(1.0) {
      return Err(Error::config(format!("forecast matrix was built for dt = {}, called with dt = {}",
                                       self.dt, dt)));
    }
    self.apply(x)
  }
}

impl Operator<f64> for LinearForecastOperator {
  fn operator_input_dim(&self) -> usize { self.dim() }
  fn operator_output_dim(&self) -> usize { self.dim() }
  fn eval_at(&self, x: ArrayView<f64, Ix2>) -> Result<Array<f64, Ix2>> {
    self.apply(x)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::{arr1, arr2, Array};
  use proptest::prelude::*;

  #[test]
  fn unit_courant_is_a_shift() {
    let op = LinearForecastOperator::new(5, -1.0, 1.0, 1.0, 1.0).unwrap();
    assert_eq!(op.courant(), -1.0);
    let x = arr2(&[[0.0, 1.0, 2.0, 3.0, 4.0]]);
    let y = op.apply(x.view()).unwrap();
    assert_eq!(y, arr2(&[[1.0, 2.0, 3.0, 4.0, 0.0]]));

    let op = LinearForecastOperator::new(5, 1.0, 1.0, 1.0, 1.0).unwrap();
    let y = op.apply(x.view()).unwrap();
    assert_eq!(y, arr2(&[[4.0, 0.0, 1.0, 2.0, 3.0]]));
  }

  #[test]
  fn damping_and_diffusion() {
    let op = LinearForecastOperator::new(4, -1.0, 1.0, 0.5, 0.98).unwrap();
    let y = op.apply_one(arr1(&[1.0, 0.0, 0.0, 0.0]).view()).unwrap();
    // x'_0 = 0.5 x_0 + 0.5 x_1, x'_3 = 0.5 x_3 + 0.5 x_0
    assert_relative_eq!(y[0], 0.49, epsilon = 1e-12);
    assert_relative_eq!(y[3], 0.49, epsilon = 1e-12);
    assert_relative_eq!(y[1], 0.0, epsilon = 1e-12);
    // rows of F sum to one
    for row in op.matrix().rows() {
      assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn rejects_bad_configuration() {
    assert!(LinearForecastOperator::new(5, -1.0, 1.0, 2.0, 1.0).unwrap_err().is_configuration());
    assert!(LinearForecastOperator::new(0, -1.0, 1.0, 1.0, 1.0).unwrap_err().is_configuration());
    assert!(LinearForecastOperator::new(5, -1.0, 0.0, 1.0, 1.0).unwrap_err().is_configuration());
    assert!(LinearForecastOperator::new(5, -1.0, 1.0, 0.0, 1.0).unwrap_err().is_configuration());

    let op = LinearForecastOperator::new(5, -1.0, 1.0, 1.0, 1.0).unwrap();
    let x: Array<f64, Ix2> = Array::zeros((2, 4));
    assert!(op.apply(x.view()).unwrap_err().is_configuration());
  }

  #[test]
  fn step_is_tied_to_dt() {
    let op = LinearForecastOperator::new(6, -1.0, 1.0, 1.0, 0.98).unwrap();
    let x: Array<f64, Ix2> = Array::ones((3, 6));
    assert!(op.step(x.view(), 0.0, 0.5).unwrap_err().is_configuration());
    let y = op.step(x.view(), 7.0, 1.0).unwrap();
    assert_eq!(y, op.apply(x.view()).unwrap());

    let half = op.rebuilt(0.5).unwrap();
    assert_eq!(half.dt(), 0.5);
    assert!(half.step(x.view(), 0.0, 0.5).is_ok());
    assert!(half.step(x.view(), 0.0, 1.0).is_err());
  }

  #[test]
  fn same_input_same_output() {
    let a = build_matrix(7, -0.7, 1.0, 1.0).unwrap();
    let b = build_matrix(7, -0.7, 1.0, 1.0).unwrap();
    assert_eq!(a, b);
  }

  proptest! {
    #[test]
    fn apply_is_linear(x in proptest::collection::vec(-10.0f64..10.0, 8),
                       y in proptest::collection::vec(-10.0f64..10.0, 8),
                       a in -3.0f64..3.0,
                       b in -3.0f64..3.0) {
      let op = LinearForecastOperator::new(8, -0.6, 1.0, 1.0, 0.98).unwrap();
      let x = Array::from(x).into_shape((1, 8)).unwrap();
      let y = Array::from(y).into_shape((1, 8)).unwrap();

      let combined = &x * a + &y * b;
      let lhs = op.apply(combined.view()).unwrap();
      let rhs = op.apply(x.view()).unwrap() * a + op.apply(y.view()).unwrap() * b;
      for (l, r) in lhs.iter().zip(rhs.iter()) {
        prop_assert!((l - r).abs() <= 1e-9);
      }
    }
  }
}
