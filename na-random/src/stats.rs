use nd::{Array, ArrayView, Axis, Ix1, Ix2};

use nac::{Error, Result};

/// Column means of a sample (one draw per row).
pub fn sample_mean(x: ArrayView<f64, Ix2>) -> Array<f64, Ix1> {
  match x.mean_axis(Axis(0)) {
    Some(m) => m,
    None => Array::zeros(x.ncols()),
  }
}

/// The sample with its mean row removed, and that mean.
pub fn anomalies(x: ArrayView<f64, Ix2>) -> (Array<f64, Ix2>, Array<f64, Ix1>) {
  let mean = sample_mean(x);
  let a = &x - &mean;
  (a, mean)
}

/// Unbiased sample covariance, m x m. This is how a precomputed covariance
/// is produced from one very large sample.
pub fn empirical_covariance(x: ArrayView<f64, Ix2>) -> Result<Array<f64, Ix2>> {
  let n = x.nrows();
  if n < 2 {
    return Err(Error::invalid(format!("need at least 2 samples for a covariance, got {}", n)));
  }
  let (a, _) = anomalies(x);
  let mut c = a.t().dot(&a);
  c /= (n - 1) as f64;
  Ok(c)
}
