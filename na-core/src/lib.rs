
extern crate ndarray as nd;
extern crate rand;
extern crate rand_isaac;
extern crate nla_factorize;
extern crate thiserror;

use nd::prelude::*;
use nd::{Data, LinalgScalar};

pub use error::{Result, Error};

pub mod error;
pub mod rng;

/// A map from `operator_input_dim` to `operator_output_dim`, evaluated on
/// every row of an ensemble at once (one member per row).
pub trait Operator<E>: Send + Sync {
  fn operator_input_dim(&self) -> usize;
  fn operator_output_dim(&self) -> usize;
  fn eval_at(&self, x: ArrayView<E, Ix2>) -> Result<Array<E, Ix2>>;

  fn check_input(&self, x: &ArrayView<E, Ix2>) -> Result<()> {
    if x.ncols() != self.operator_input_dim() {
      return Err(Error::config(format!("operator expects {} columns, got {}",
                                       self.operator_input_dim(), x.ncols())));
    }
    Ok(())
  }
}

impl<D, E> Operator<E> for ArrayBase<D, Ix2>
  where D: Data<Elem = E> + Send + Sync,
        E: LinalgScalar + Send + Sync,
{
  fn operator_input_dim(&self) -> usize { self.ncols() }
  fn operator_output_dim(&self) -> usize { self.nrows() }
  fn eval_at(&self, x: ArrayView<E, Ix2>) -> Result<Array<E, Ix2>> {
    self.check_input(&x)?;
    Ok(x.dot(&self.t()))
  }
}
